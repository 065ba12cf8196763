//! Interchange document serialization
//!
//! The interchange document is the sole format a verb forest travels in
//! across process or transport boundaries: an ordered JSON array of node
//! objects, each carrying `identifier`, optional `description`, `parameters`
//! (string to string, order preserved), `children`, and optional `raw`.
//! Spans never cross this boundary; they are advisory diagnostics only.
//!
//! Decoding failures are local: a malformed document yields a
//! [`DocumentError`] and has no effect on any other forest.

use crate::procscript::error::DocumentError;
use crate::procscript::verb::{Forest, Verb};
use serde_json::Value;

/// Serialize a forest to its interchange document.
pub fn to_document(forest: &Forest) -> Result<Value, DocumentError> {
    serde_json::to_value(&forest.verbs).map_err(|err| DocumentError::new(err.to_string()))
}

/// Serialize a forest to pretty-printed interchange JSON.
pub fn to_document_string(forest: &Forest) -> Result<String, DocumentError> {
    serde_json::to_string_pretty(&forest.verbs).map_err(|err| DocumentError::new(err.to_string()))
}

/// Decode an interchange document back into a forest.
///
/// Required fields (`identifier`, `parameters`, `children`) must be present
/// and well-shaped on every node; `description` and `raw` are optional.
pub fn from_document(document: &Value) -> Result<Forest, DocumentError> {
    let verbs: Vec<Verb> = serde_json::from_value(document.clone())
        .map_err(|err| DocumentError::new(err.to_string()))?;
    Ok(Forest::from_verbs(verbs))
}

/// Decode interchange JSON text back into a forest.
pub fn from_document_str(text: &str) -> Result<Forest, DocumentError> {
    let verbs: Vec<Verb> =
        serde_json::from_str(text).map_err(|err| DocumentError::new(err.to_string()))?;
    Ok(Forest::from_verbs(verbs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procscript::verb::Verb;

    fn sample_forest() -> Forest {
        Forest::from_verbs(vec![
            Verb::new("for")
                .with_parameter("target", "a")
                .with_parameter("iterable", "range(0, 3)")
                .with_raw("for a in range(0, 3):\n    print(\"x\")\n")
                .with_children(vec![Verb::new("print")
                    .with_description("Say it")
                    .with_parameter("expression", "\"x\"")
                    .with_raw("    print(\"x\")\n")]),
            Verb::raw_statement("import os\n"),
        ])
    }

    #[test]
    fn test_round_trip_is_structural_identity() {
        let forest = sample_forest();
        let document = to_document(&forest).unwrap();
        let decoded = from_document(&document).unwrap();

        assert!(forest.structurally_equal(&decoded));
        // Raw caches survive the boundary too.
        assert_eq!(decoded.verbs[0].raw, forest.verbs[0].raw);
        assert_eq!(decoded.verbs[0].children[0].raw, forest.verbs[0].children[0].raw);
    }

    #[test]
    fn test_document_shape() {
        let document = to_document(&sample_forest()).unwrap();
        let nodes = document.as_array().unwrap();
        assert_eq!(nodes.len(), 2);

        let first = &nodes[0];
        assert_eq!(first["identifier"], "for");
        assert_eq!(first["parameters"]["target"], "a");
        assert_eq!(first["children"][0]["description"], "Say it");
        // Absent options are omitted entirely, not serialized as null.
        assert!(first.get("description").is_none());
    }

    #[test]
    fn test_parameter_order_survives() {
        let document = to_document(&sample_forest()).unwrap();
        let text = serde_json::to_string(&document).unwrap();
        let target = text.find("\"target\"").unwrap();
        let iterable = text.find("\"iterable\"").unwrap();
        assert!(target < iterable);
    }

    #[test]
    fn test_string_round_trip() {
        let forest = sample_forest();
        let text = to_document_string(&forest).unwrap();
        let decoded = from_document_str(&text).unwrap();
        assert!(forest.structurally_equal(&decoded));
    }

    #[test]
    fn test_missing_identifier_is_document_error() {
        let document = serde_json::json!([
            { "parameters": {}, "children": [] }
        ]);
        let err = from_document(&document).unwrap_err();
        assert!(err.message.contains("identifier"));
    }

    #[test]
    fn test_wrong_parameter_shape_is_document_error() {
        let document = serde_json::json!([
            { "identifier": "print", "parameters": ["not", "a", "map"], "children": [] }
        ]);
        assert!(from_document(&document).is_err());
    }

    #[test]
    fn test_malformed_child_is_document_error() {
        let document = serde_json::json!([
            { "identifier": "if", "parameters": {}, "children": [ { "parameters": {} } ] }
        ]);
        assert!(from_document(&document).is_err());
    }

    #[test]
    fn test_failed_decode_leaves_other_forests_intact() {
        let healthy = from_document(&to_document(&sample_forest()).unwrap()).unwrap();
        let bad = serde_json::json!([{ "no": "fields" }]);
        assert!(from_document(&bad).is_err());
        assert!(healthy.structurally_equal(&sample_forest()));
    }

    #[test]
    fn test_non_array_document_is_error() {
        let document = serde_json::json!({ "identifier": "print" });
        assert!(from_document(&document).is_err());
    }
}
