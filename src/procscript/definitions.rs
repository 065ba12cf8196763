//! The pattern library: definitions mapping code shapes to verbs
//!
//! A definition source is a JSON or YAML document with an ordered list of
//! pattern entries. Each entry names a match target (a dotted call target or
//! a dotted assignment target), the verb identifier to emit, and the ordered
//! parameter keys that call arguments bind to.
//!
//! Loading is pure: it returns an immutable [`DefinitionTable`] value and
//! touches no global state, so a table can be shared read-only across
//! concurrent translations. Malformed entries fail the whole load — a bad
//! pattern library is a session-level fault, never silently skipped.

use crate::procscript::error::DefinitionError;
use crate::procscript::verb::{RAW_IDENTIFIER, STRUCTURAL_IDENTIFIERS};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;

static DOTTED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("dotted-name pattern is valid")
});

/// What kind of statement shape a definition matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// A call statement: `target(args...)`
    Call,
    /// An assignment statement: `target = value`
    Assign,
}

/// The merged-table key: kind, dotted target, and declared parameter count.
///
/// Keeping the parameter count in the key lets definitions for the same
/// target coexist at different arities, which is what makes the
/// "most argument positions bound wins" tie-break observable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey {
    pub kind: MatchKind,
    pub target: String,
    pub arity: usize,
}

/// One pattern rule from a definition source.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub kind: MatchKind,
    pub target: String,
    pub identifier: String,
    /// Ordered semantic parameter keys; positional arguments bind in this
    /// order, keyword arguments bind by key name.
    pub parameters: Vec<String>,
    /// Name of the definition source this entry came from, for diagnostics.
    pub source_name: String,
}

impl Definition {
    pub fn key(&self) -> MatchKey {
        MatchKey {
            kind: self.kind,
            target: self.target.clone(),
            arity: self.parameters.len(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DefinitionDocument {
    definitions: Vec<DefinitionEntry>,
}

#[derive(Debug, Deserialize)]
struct DefinitionEntry {
    #[serde(rename = "match")]
    target: String,
    kind: Option<MatchKind>,
    identifier: String,
    #[serde(default)]
    parameters: Vec<String>,
}

/// The merged, read-only pattern table.
///
/// Entries keep the order their keys were first registered in; a later
/// source redefining an existing key replaces the entry in place
/// (last-wins), so "earliest-loaded" tie-breaks refer to first registration.
#[derive(Debug, Clone, Default)]
pub struct DefinitionTable {
    entries: IndexMap<MatchKey, Definition>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and merge definition sources from files, in order.
    ///
    /// The format is chosen by extension: `.json` for JSON, `.yaml`/`.yml`
    /// for YAML.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, DefinitionError> {
        let mut table = Self::new();
        for path in paths {
            let path = path.as_ref();
            let source_name = path.display().to_string();
            let text = fs::read_to_string(path).map_err(|err| DefinitionError::Io {
                source_name: source_name.clone(),
                message: err.to_string(),
            })?;
            table.merge_source(&source_name, &text)?;
        }
        Ok(table)
    }

    /// Build a table from in-memory sources, in order. Source names decide
    /// the format the same way file extensions do.
    pub fn from_sources(sources: &[(&str, &str)]) -> Result<Self, DefinitionError> {
        let mut table = Self::new();
        for (source_name, text) in sources {
            table.merge_source(source_name, text)?;
        }
        Ok(table)
    }

    fn merge_source(&mut self, source_name: &str, text: &str) -> Result<(), DefinitionError> {
        let document: DefinitionDocument = if source_name.ends_with(".yaml")
            || source_name.ends_with(".yml")
        {
            serde_yaml::from_str(text).map_err(|err| DefinitionError::Parse {
                source_name: source_name.to_string(),
                message: err.to_string(),
            })?
        } else {
            serde_json::from_str(text).map_err(|err| DefinitionError::Parse {
                source_name: source_name.to_string(),
                message: err.to_string(),
            })?
        };

        for entry in document.definitions {
            let definition = Self::validate(source_name, entry)?;
            self.insert(definition);
        }
        Ok(())
    }

    fn validate(
        source_name: &str,
        entry: DefinitionEntry,
    ) -> Result<Definition, DefinitionError> {
        let invalid = |reason: &str| DefinitionError::InvalidEntry {
            source_name: source_name.to_string(),
            target: entry.target.clone(),
            reason: reason.to_string(),
        };

        if !DOTTED_NAME.is_match(&entry.target) {
            return Err(invalid("match target is not a dotted name"));
        }
        if entry.identifier.is_empty() {
            return Err(invalid("identifier is empty"));
        }
        if entry.identifier == RAW_IDENTIFIER
            || STRUCTURAL_IDENTIFIERS.contains(&entry.identifier.as_str())
        {
            return Err(invalid("identifier is reserved for structural verbs"));
        }
        for (i, key) in entry.parameters.iter().enumerate() {
            if key.is_empty() {
                return Err(invalid("parameter key is empty"));
            }
            if entry.parameters[..i].contains(key) {
                return Err(invalid("duplicate parameter key"));
            }
        }

        Ok(Definition {
            kind: entry.kind.unwrap_or(MatchKind::Call),
            target: entry.target,
            identifier: entry.identifier,
            parameters: entry.parameters,
            source_name: source_name.to_string(),
        })
    }

    fn insert(&mut self, definition: Definition) {
        // IndexMap keeps the original position on re-insert, which is
        // exactly the override semantics the table needs.
        self.entries.insert(definition.key(), definition);
    }

    /// Definitions matching a statement shape, in table order.
    pub fn candidates(&self, kind: MatchKind, target: &str) -> Vec<&Definition> {
        self.entries
            .values()
            .filter(|def| def.kind == kind && def.target == target)
            .collect()
    }

    /// Reverse lookup for the encoder: the definition that would have
    /// produced this identifier, preferring one whose declared parameters
    /// are all present among `keys`, then the one binding the most of them,
    /// then table order.
    pub fn definition_for_identifier(
        &self,
        identifier: &str,
        keys: &[&str],
    ) -> Option<&Definition> {
        let mut best: Option<(bool, usize, &Definition)> = None;
        for def in self.entries.values() {
            if def.identifier != identifier {
                continue;
            }
            let bound = def
                .parameters
                .iter()
                .filter(|p| keys.contains(&p.as_str()))
                .count();
            let complete = bound == def.parameters.len();
            let better = match &best {
                None => true,
                Some((best_complete, best_bound, _)) => {
                    (complete, bound) > (*best_complete, *best_bound)
                }
            };
            if better {
                best = Some((complete, bound, def));
            }
        }
        best.map(|(_, _, def)| def)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.entries.values()
    }
}
