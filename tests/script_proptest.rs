//! Property-based tests over generated process scripts
//!
//! Scripts are drawn from a constrained statement grammar (recognizable
//! calls, assignments, imports, loops) with varying blank-line separation.
//! Whatever comes out must round-trip byte-identically, map one statement
//! to one verb, and survive the document and resynthesis cycles.

use procscript::procscript::definitions::DefinitionTable;
use procscript::procscript::document::{from_document, to_document};
use procscript::procscript::encoding::encode;
use procscript::procscript::parsing::parse;
use proptest::prelude::*;

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

#[derive(Debug, Clone)]
enum Item {
    Simple(String),
    Loop(Vec<String>),
}

fn literal_text() -> impl Strategy<Value = String> {
    "[a-z ]{0,12}"
}

fn name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,5}"
}

fn simple_statement() -> impl Strategy<Value = String> {
    prop_oneof![
        literal_text().prop_map(|text| format!("print(\"{}\")", text)),
        (literal_text(), name())
            .prop_map(|(text, who)| format!("send_message(\"{}\", {})", text, who)),
        (name(), 0u32..100).prop_map(|(target, value)| format!("{} = {}", target, value)),
        name().prop_map(|module| format!("import {}", module)),
    ]
}

fn item() -> impl Strategy<Value = Item> {
    prop_oneof![
        3 => simple_statement().prop_map(Item::Simple),
        1 => proptest::collection::vec(simple_statement(), 1..3).prop_map(Item::Loop),
    ]
}

/// A script plus the number of statements it contains.
fn script() -> impl Strategy<Value = (String, usize)> {
    proptest::collection::vec((0usize..3, item()), 1..6).prop_map(|items| {
        let mut text = String::new();
        let mut statements = 0;
        for (blanks, item) in items {
            for _ in 0..blanks {
                text.push('\n');
            }
            match item {
                Item::Simple(statement) => {
                    text.push_str(&statement);
                    text.push('\n');
                    statements += 1;
                }
                Item::Loop(body) => {
                    text.push_str("for i in range(0, 3):\n");
                    statements += 1;
                    for statement in body {
                        text.push_str("    ");
                        text.push_str(&statement);
                        text.push('\n');
                        statements += 1;
                    }
                }
            }
        }
        (text, statements)
    })
}

proptest! {
    #[test]
    fn test_identity_round_trip((source, _count) in script()) {
        let defs = definitions();
        let forest = parse(&source, &defs).unwrap();
        let encoded = encode(&forest, &defs);
        prop_assert_eq!(encoded.text, source);
    }

    #[test]
    fn test_one_verb_per_statement((source, count) in script()) {
        let defs = definitions();
        let forest = parse(&source, &defs).unwrap();
        prop_assert_eq!(forest.verb_count(), count);
    }

    #[test]
    fn test_document_cycle_preserves_structure((source, _count) in script()) {
        let defs = definitions();
        let forest = parse(&source, &defs).unwrap();
        let decoded = from_document(&to_document(&forest).unwrap()).unwrap();
        prop_assert!(forest.structurally_equal(&decoded));
    }

    #[test]
    fn test_resynthesis_reparses_equal((source, _count) in script()) {
        let defs = definitions();
        let mut forest = parse(&source, &defs).unwrap();
        forest.clear_raw();
        let encoded = encode(&forest, &defs);
        let reparsed = parse(&encoded.text, &defs).unwrap();
        prop_assert!(forest.structurally_equal(&reparsed));
    }
}
