//! Interchange-document boundary behavior: what a GUI host sends back,
//! including malformed documents.

use procscript::procscript::definitions::DefinitionTable;
use procscript::procscript::document::{from_document, from_document_str, to_document};
use procscript::procscript::encoding::encode;
use procscript::procscript::parsing::parse;

fn definitions() -> DefinitionTable {
    let doc = r#"{
        "definitions": [
            { "match": "print", "identifier": "print", "parameters": ["expression"] },
            { "match": "send_message", "identifier": "send_message",
              "parameters": ["message", "recipient"] }
        ]
    }"#;
    DefinitionTable::from_sources(&[("defs.json", doc)]).unwrap()
}

#[test]
fn test_editor_rewrites_a_parameter_through_the_document() {
    let defs = definitions();
    let forest = parse("send_message(\"hi\", eva)\n", &defs).unwrap();
    let mut document = to_document(&forest).unwrap();

    // The editor changes the recipient and drops the node's raw cache, the
    // signal that this node must be resynthesized.
    let node = &mut document.as_array_mut().unwrap()[0];
    node["parameters"]["recipient"] = serde_json::json!("board");
    node.as_object_mut().unwrap().remove("raw");

    let edited = from_document(&document).unwrap();
    let encoded = encode(&edited, &defs);
    assert_eq!(encoded.text, "send_message(\"hi\", board)\n");
}

#[test]
fn test_document_from_hand_written_json() {
    let text = r#"[
        {
            "identifier": "if",
            "parameters": { "condition": "ready" },
            "children": [
                { "identifier": "print",
                  "parameters": { "expression": "\"go\"" },
                  "children": [] }
            ]
        }
    ]"#;
    let forest = from_document_str(text).unwrap();
    let encoded = encode(&forest, &definitions());
    assert_eq!(encoded.text, "if ready:\n    print(\"go\")\n");
}

#[test]
fn test_malformed_document_is_recoverable_per_document() {
    let defs = definitions();
    let healthy = parse("print(\"a\")\n", &defs).unwrap();

    let missing_children = serde_json::json!([
        { "identifier": "print", "parameters": {} }
    ]);
    assert!(from_document(&missing_children).is_err());

    // The failure is local: the earlier forest still encodes fine.
    let encoded = encode(&healthy, &defs);
    assert_eq!(encoded.text, "print(\"a\")\n");
}

#[test]
fn test_description_survives_the_document() {
    let defs = definitions();
    let forest = parse("\"\"\"Say hi\"\"\"\nprint(\"a\")\n", &defs).unwrap();
    let document = to_document(&forest).unwrap();
    assert_eq!(document[0]["description"], "Say hi");

    let decoded = from_document(&document).unwrap();
    assert_eq!(decoded.verbs[0].description.as_deref(), Some("Say hi"));
}
