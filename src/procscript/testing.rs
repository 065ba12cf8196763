//! Fluent assertion helpers for verb forests
//!
//! Used by the integration tests to express expectations about parsed
//! structure without hand-rolled index juggling at every call site. Panics
//! carry the path to the offending node (`verbs[6].children[1]`), so a
//! failing scenario points at the exact verb.

use crate::procscript::verb::{Forest, Verb};

/// Entry point: assert over a whole forest.
pub fn assert_forest(forest: &Forest) -> ForestAssert<'_> {
    ForestAssert { forest }
}

pub struct ForestAssert<'a> {
    forest: &'a Forest,
}

impl<'a> ForestAssert<'a> {
    /// Number of top-level verbs.
    pub fn verb_count(self, expected: usize) -> Self {
        assert_eq!(
            self.forest.verbs.len(),
            expected,
            "expected {} top-level verbs, found {}",
            expected,
            self.forest.verbs.len()
        );
        self
    }

    /// Total number of verbs in the forest.
    pub fn total_verbs(self, expected: usize) -> Self {
        assert_eq!(
            self.forest.verb_count(),
            expected,
            "expected {} verbs in total, found {}",
            expected,
            self.forest.verb_count()
        );
        self
    }

    pub fn description(self, expected: &str) -> Self {
        assert_eq!(
            self.forest.description.as_deref(),
            Some(expected),
            "file description mismatch"
        );
        self
    }

    pub fn verb(self, index: usize, check: impl FnOnce(VerbAssert<'_>)) -> Self {
        let verb = self
            .forest
            .verbs
            .get(index)
            .unwrap_or_else(|| panic!("no verb at verbs[{}]", index));
        check(VerbAssert {
            verb,
            path: format!("verbs[{}]", index),
        });
        self
    }
}

pub struct VerbAssert<'a> {
    verb: &'a Verb,
    path: String,
}

impl<'a> VerbAssert<'a> {
    pub fn identifier(self, expected: &str) -> Self {
        assert_eq!(
            self.verb.identifier, expected,
            "{}: expected identifier '{}', found '{}'",
            self.path, expected, self.verb.identifier
        );
        self
    }

    pub fn parameter(self, key: &str, expected: &str) -> Self {
        match self.verb.parameters.get(key) {
            Some(value) => assert_eq!(
                value, expected,
                "{}: parameter '{}' mismatch",
                self.path, key
            ),
            None => panic!("{}: no parameter '{}'", self.path, key),
        }
        self
    }

    pub fn parameter_count(self, expected: usize) -> Self {
        assert_eq!(
            self.verb.parameters.len(),
            expected,
            "{}: expected {} parameters, found {}",
            self.path,
            expected,
            self.verb.parameters.len()
        );
        self
    }

    pub fn description(self, expected: &str) -> Self {
        assert_eq!(
            self.verb.description.as_deref(),
            Some(expected),
            "{}: description mismatch",
            self.path
        );
        self
    }

    pub fn no_description(self) -> Self {
        assert!(
            self.verb.description.is_none(),
            "{}: expected no description, found {:?}",
            self.path,
            self.verb.description
        );
        self
    }

    pub fn child_count(self, expected: usize) -> Self {
        assert_eq!(
            self.verb.children.len(),
            expected,
            "{}: expected {} children, found {}",
            self.path,
            expected,
            self.verb.children.len()
        );
        self
    }

    pub fn child(self, index: usize, check: impl FnOnce(VerbAssert<'_>)) -> Self {
        let child = self
            .verb
            .children
            .get(index)
            .unwrap_or_else(|| panic!("{}: no child at index {}", self.path, index));
        check(VerbAssert {
            verb: child,
            path: format!("{}.children[{}]", self.path, index),
        });
        self
    }

    pub fn is_raw_verb(self) -> Self {
        assert!(
            self.verb.is_raw(),
            "{}: expected the raw fallback verb, found '{}'",
            self.path,
            self.verb.identifier
        );
        self
    }

    pub fn has_raw(self) -> Self {
        assert!(self.verb.raw.is_some(), "{}: expected a raw cache", self.path);
        self
    }

    pub fn raw_eq(self, expected: &str) -> Self {
        assert_eq!(
            self.verb.raw.as_deref(),
            Some(expected),
            "{}: raw cache mismatch",
            self.path
        );
        self
    }
}
