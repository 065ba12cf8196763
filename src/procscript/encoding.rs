//! The encoder: verb forest back to source text
//!
//! Depth-first in child order. A verb with a `raw` cache is emitted
//! verbatim, which reproduces all original whitespace, comments and nested
//! text for that subtree and short-circuits recursion. A verb without `raw`
//! is resynthesized from its structured fields: the description as a
//! preceding literal, the statement rebuilt through the definition that
//! would have produced its identifier, children re-indented one level.
//!
//! Encoding never aborts a file. A verb that can be neither replayed nor
//! properly synthesized gets a best-effort literal form, and the problem is
//! flagged to the caller through the collected warnings.

use crate::procscript::definitions::{DefinitionTable, MatchKind};
use crate::procscript::error::EncodeWarning;
use crate::procscript::verb::{Forest, Verb};

const INDENT: &str = "    ";

/// The encoder's output: the regenerated text plus anything it had to
/// degrade along the way.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub text: String,
    pub warnings: Vec<EncodeWarning>,
}

impl Encoded {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Encode a forest to source text.
///
/// Encoding a freshly parsed, unmodified forest reproduces the input
/// byte-for-byte; after `clear_raw` the output is structurally equivalent
/// instead of identical.
pub fn encode(forest: &Forest, definitions: &DefinitionTable) -> Encoded {
    let mut encoder = Encoder {
        definitions,
        out: String::new(),
        warnings: Vec::new(),
    };

    // The file-level description is already embedded in the first verb's raw
    // prefix (or in the trailing text) whenever those were kept; only a
    // fully resynthesized file needs it re-emitted.
    if let Some(description) = &forest.description {
        let first_is_synthesized = forest.verbs.first().map_or(true, |verb| verb.raw.is_none());
        if forest.trailing.is_empty() && first_is_synthesized {
            encoder.emit_description(description, 0);
        }
    }

    encoder.emit_verbs(&forest.verbs, 0);
    encoder.out.push_str(&forest.trailing);

    Encoded {
        text: encoder.out,
        warnings: encoder.warnings,
    }
}

struct Encoder<'a> {
    definitions: &'a DefinitionTable,
    out: String,
    warnings: Vec<EncodeWarning>,
}

impl<'a> Encoder<'a> {
    fn emit_verbs(&mut self, verbs: &[Verb], level: usize) {
        for verb in verbs {
            self.emit_verb(verb, level);
        }
    }

    fn emit_verb(&mut self, verb: &Verb, level: usize) {
        if let Some(raw) = &verb.raw {
            self.ensure_line_start();
            self.out.push_str(raw);
            return;
        }

        if let Some(description) = &verb.description {
            self.emit_description(description, level);
        }

        if verb.is_structural() {
            self.emit_branch(verb, level);
        } else if verb.is_raw() {
            self.warn(verb, "raw statement has no cached source text");
            if verb.parameters.is_empty() {
                self.emit_line("pass", level);
            } else {
                let values: Vec<&str> =
                    verb.parameters.values().map(String::as_str).collect();
                self.emit_line(&values.join(", "), level);
            }
        } else {
            self.emit_statement(verb, level);
        }
    }

    /// A description literal, re-emitted as a preceding triple-quoted block.
    fn emit_description(&mut self, text: &str, level: usize) {
        let double_safe = !text.contains("\"\"\"") && !text.ends_with('"');
        let delimiter = if double_safe { "\"\"\"" } else { "'''" };
        self.emit_line(&format!("{}{}{}", delimiter, text, delimiter), level);
    }

    fn emit_branch(&mut self, verb: &Verb, level: usize) {
        let header = match verb.identifier.as_str() {
            "if" | "elif" | "while" => match verb.parameters.get("condition") {
                Some(condition) => format!("{} {}:", verb.identifier, condition),
                None => {
                    self.warn(verb, "branch is missing its condition");
                    format!("{} True:", verb.identifier)
                }
            },
            "for" => {
                let target = verb.parameters.get("target");
                let iterable = verb.parameters.get("iterable");
                match (target, iterable) {
                    (Some(target), Some(iterable)) => {
                        format!("for {} in {}:", target, iterable)
                    }
                    _ => match verb.parameters.get("expression") {
                        Some(expression) => format!("for {}:", expression),
                        None => {
                            self.warn(verb, "loop is missing its header expression");
                            "for _ in []:".to_string()
                        }
                    },
                }
            }
            "except" => match verb.parameters.get("expression") {
                Some(expression) => format!("except {}:", expression),
                None => "except:".to_string(),
            },
            "def" => {
                let name = match verb.parameters.get("name") {
                    Some(name) => name.clone(),
                    None => {
                        self.warn(verb, "function definition is missing its name");
                        "unnamed".to_string()
                    }
                };
                let signature = verb
                    .parameters
                    .get("signature")
                    .map(String::as_str)
                    .unwrap_or("");
                format!("def {}({}):", name, signature)
            }
            // else / finally / try
            other => format!("{}:", other),
        };

        self.emit_line(&header, level);
        if verb.children.is_empty() {
            self.emit_line("pass", level + 1);
        } else {
            self.emit_verbs(&verb.children, level + 1);
        }
    }

    /// Rebuild a recognized statement through its definition, the inverse of
    /// pattern matching at parse time.
    fn emit_statement(&mut self, verb: &Verb, level: usize) {
        let keys: Vec<&str> = verb.parameters.keys().map(String::as_str).collect();
        let definition = self
            .definitions
            .definition_for_identifier(&verb.identifier, &keys);

        let definition = match definition {
            Some(definition) => definition,
            None => {
                self.warn(verb, "no definition available for structural synthesis");
                let arguments: Vec<String> = verb
                    .parameters
                    .iter()
                    .map(|(key, value)| format!("{}={}", key, value))
                    .collect();
                self.emit_line(
                    &format!("{}({})", verb.identifier, arguments.join(", ")),
                    level,
                );
                return;
            }
        };

        for key in &definition.parameters {
            if !verb.parameters.contains_key(key.as_str()) {
                self.warn(verb, &format!("parameter '{}' has no value", key));
            }
        }

        match definition.kind {
            MatchKind::Call => {
                let arguments: Vec<&str> = definition
                    .parameters
                    .iter()
                    .filter_map(|key| verb.parameters.get(key.as_str()))
                    .map(String::as_str)
                    .collect();
                self.emit_line(
                    &format!("{}({})", definition.target, arguments.join(", ")),
                    level,
                );
            }
            MatchKind::Assign => {
                let value = definition
                    .parameters
                    .first()
                    .and_then(|key| verb.parameters.get(key.as_str()))
                    .map(String::as_str)
                    .unwrap_or("None");
                self.emit_line(&format!("{} = {}", definition.target, value), level);
            }
        }
    }

    fn emit_line(&mut self, text: &str, level: usize) {
        self.ensure_line_start();
        for _ in 0..level {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn ensure_line_start(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn warn(&mut self, verb: &Verb, reason: &str) {
        self.warnings.push(EncodeWarning {
            identifier: verb.identifier.clone(),
            reason: reason.to_string(),
            span: verb.span,
        });
    }
}
