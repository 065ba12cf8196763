//! The verb forest: the editable tree form of a process script
//!
//! A [`Verb`] is one recognized (or raw/opaque) action or block in the
//! source. Branch constructs produce one verb per branch keyword, with the
//! keyword itself as the identifier; unrecognized statements produce a verb
//! with the sentinel `raw` identifier. Each verb owns its children
//! exclusively — the forest is a plain tree, no sharing, no cycles.
//!
//! `raw` caches the exact source slice for the node and, transitively, its
//! children. While present it is authoritative for byte-identical
//! re-emission; clearing it (see [`Verb::clear_raw`]) forces the encoder to
//! resynthesize the subtree from the structured fields.

use crate::procscript::span::Span;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the generic fallback verb for unrecognized statements.
pub const RAW_IDENTIFIER: &str = "raw";

/// Identifiers reserved for branch verbs; the identifier doubles as the
/// branch discriminator, so the definition loader refuses them.
pub const STRUCTURAL_IDENTIFIERS: [&str; 9] = [
    "if", "elif", "else", "for", "while", "try", "except", "finally", "def",
];

/// One node of the verb forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verb {
    pub identifier: String,

    /// Documentation attached from a preceding standalone string literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Parameter values as they appeared in source, insertion-ordered.
    pub parameters: IndexMap<String, String>,

    /// Block bodies, in source order. Empty for simple statements.
    pub children: Vec<Verb>,

    /// Exact source slice for this node and its children, when cached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,

    /// Source location, advisory only; not part of the interchange format.
    #[serde(skip)]
    pub span: Option<Span>,
}

impl Verb {
    pub fn new<S: Into<String>>(identifier: S) -> Self {
        Self {
            identifier: identifier.into(),
            description: None,
            parameters: IndexMap::new(),
            children: Vec::new(),
            raw: None,
            span: None,
        }
    }

    /// A fallback verb for an unrecognized statement: empty parameters,
    /// exact statement text cached in `raw`.
    pub fn raw_statement<S: Into<String>>(raw: S) -> Self {
        Self::new(RAW_IDENTIFIER).with_raw(raw)
    }

    pub fn with_parameter<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Verb>) -> Self {
        self.children = children;
        self
    }

    pub fn with_raw<S: Into<String>>(mut self, raw: S) -> Self {
        self.raw = Some(raw.into());
        self
    }

    pub fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }

    pub fn is_raw(&self) -> bool {
        self.identifier == RAW_IDENTIFIER
    }

    pub fn is_structural(&self) -> bool {
        STRUCTURAL_IDENTIFIERS.contains(&self.identifier.as_str())
    }

    /// Clear `raw` on this verb and every descendant, depth-first.
    ///
    /// The forest owns its nodes parent-to-child, so a plain owned traversal
    /// covers the whole subtree.
    pub fn clear_raw(&mut self) {
        self.raw = None;
        for child in &mut self.children {
            child.clear_raw();
        }
    }

    /// Structural equality: identifier, parameters, description and children,
    /// ignoring `raw` caches and spans.
    pub fn structurally_equal(&self, other: &Verb) -> bool {
        self.identifier == other.identifier
            && self.description == other.description
            && self.parameters == other.parameters
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.structurally_equal(b))
    }

    /// Number of verbs in this subtree, itself included.
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(Verb::subtree_size).sum::<usize>()
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Verb('{}', {} params, {} children)",
            self.identifier,
            self.parameters.len(),
            self.children.len()
        )
    }
}

/// The top-level result of parsing one script.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Forest {
    /// File-level description from a leading literal with no following
    /// statement in its block.
    pub description: Option<String>,

    /// Top-level verbs in source order.
    pub verbs: Vec<Verb>,

    /// Source text not covered by any verb; only non-empty for scripts with
    /// no statements at all (comments and whitespace only).
    pub trailing: String,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_verbs(verbs: Vec<Verb>) -> Self {
        Self {
            description: None,
            verbs,
            trailing: String::new(),
        }
    }

    /// Clear every `raw` cache in the forest, forcing full resynthesis.
    pub fn clear_raw(&mut self) {
        for verb in &mut self.verbs {
            verb.clear_raw();
        }
    }

    /// Structural equality over the verb forest; see
    /// [`Verb::structurally_equal`].
    ///
    /// The file-level description and trailing text are file-boundary
    /// attachments, not part of the tree: they do not travel through the
    /// interchange document and are not compared here.
    pub fn structurally_equal(&self, other: &Forest) -> bool {
        self.verbs.len() == other.verbs.len()
            && self
                .verbs
                .iter()
                .zip(&other.verbs)
                .all(|(a, b)| a.structurally_equal(b))
    }

    /// Total number of verbs in the forest.
    pub fn verb_count(&self) -> usize {
        self.verbs.iter().map(Verb::subtree_size).sum()
    }
}

impl fmt::Display for Forest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Forest({} top-level verbs)", self.verbs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Verb {
        Verb::new("for")
            .with_parameter("target", "a")
            .with_parameter("iterable", "range(0, 3)")
            .with_raw("for a in range(0, 3):\n    print(\"x\")\n")
            .with_children(vec![Verb::new("print")
                .with_parameter("expression", "\"x\"")
                .with_raw("    print(\"x\")\n")])
    }

    #[test]
    fn test_raw_statement_shape() {
        let verb = Verb::raw_statement("import os\n");
        assert!(verb.is_raw());
        assert!(verb.parameters.is_empty());
        assert_eq!(verb.raw.as_deref(), Some("import os\n"));
    }

    #[test]
    fn test_parameter_order_preserved() {
        let verb = Verb::new("send_message")
            .with_parameter("message", "\"hi\"")
            .with_parameter("recipient", "sender");
        let keys: Vec<&String> = verb.parameters.keys().collect();
        assert_eq!(keys, vec!["message", "recipient"]);
    }

    #[test]
    fn test_clear_raw_is_recursive() {
        let mut verb = sample_tree();
        verb.clear_raw();
        assert!(verb.raw.is_none());
        assert!(verb.children[0].raw.is_none());
    }

    #[test]
    fn test_structural_equality_ignores_raw() {
        let a = sample_tree();
        let mut b = sample_tree();
        b.clear_raw();
        assert!(a.structurally_equal(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_structural_equality_sees_children() {
        let a = sample_tree();
        let mut b = sample_tree();
        b.children[0].identifier = "send_message".to_string();
        assert!(!a.structurally_equal(&b));
    }

    #[test]
    fn test_forest_verb_count() {
        let forest = Forest::from_verbs(vec![sample_tree(), Verb::raw_statement("x = 1\n")]);
        assert_eq!(forest.verb_count(), 3);
    }

    #[test]
    fn test_structural_identifiers_cover_branches() {
        for kw in ["if", "else", "except", "def"] {
            assert!(STRUCTURAL_IDENTIFIERS.contains(&kw));
        }
        assert!(!STRUCTURAL_IDENTIFIERS.contains(&RAW_IDENTIFIER));
    }
}
