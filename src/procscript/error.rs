//! Error types for the translation pipeline
//!
//! One enum per concern: lexing/parsing failures, pattern-library loading
//! failures, interchange-document decoding failures, and the file-boundary
//! umbrella used by the loader and the CLI. Encoding problems are not fatal
//! and are reported as collected warnings instead (see
//! [`EncodeWarning`]).

use crate::procscript::span::{Position, Span};
use std::fmt;
use std::path::PathBuf;

/// Errors raised while tokenizing or parsing a single script.
///
/// These abort translation of the offending file only; other files and the
/// shared definition table are unaffected.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxError {
    /// A string literal with no closing delimiter
    UnterminatedString { position: Position },
    /// A dedent that does not return to any enclosing indentation level
    InconsistentDedent { position: Position },
    /// A compound statement header with no indented block after it
    ExpectedBlock { position: Position, keyword: String },
    /// A character sequence the lexer cannot tokenize
    UnexpectedToken { position: Position, text: String },
}

impl SyntaxError {
    pub fn position(&self) -> Position {
        match self {
            SyntaxError::UnterminatedString { position }
            | SyntaxError::InconsistentDedent { position }
            | SyntaxError::ExpectedBlock { position, .. }
            | SyntaxError::UnexpectedToken { position, .. } => *position,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxError::UnterminatedString { position } => {
                write!(f, "{}: unterminated string literal", position)
            }
            SyntaxError::InconsistentDedent { position } => {
                write!(
                    f,
                    "{}: dedent does not match any enclosing indentation level",
                    position
                )
            }
            SyntaxError::ExpectedBlock { position, keyword } => {
                write!(f, "{}: expected an indented block after '{}'", position, keyword)
            }
            SyntaxError::UnexpectedToken { position, text } => {
                write!(f, "{}: unexpected input {:?}", position, text)
            }
        }
    }
}

impl std::error::Error for SyntaxError {}

/// Errors raised while loading definition sources.
///
/// Fatal at load time: a malformed entry aborts the session before any
/// parsing, it is never silently skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum DefinitionError {
    /// Could not read a definition source
    Io { source_name: String, message: String },
    /// A definition document that does not deserialize
    Parse { source_name: String, message: String },
    /// A definition entry that deserialized but is not usable
    InvalidEntry {
        source_name: String,
        target: String,
        reason: String,
    },
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionError::Io { source_name, message } => {
                write!(f, "cannot read definition source '{}': {}", source_name, message)
            }
            DefinitionError::Parse { source_name, message } => {
                write!(f, "malformed definition source '{}': {}", source_name, message)
            }
            DefinitionError::InvalidEntry {
                source_name,
                target,
                reason,
            } => {
                write!(
                    f,
                    "invalid definition entry '{}' in '{}': {}",
                    target, source_name, reason
                )
            }
        }
    }
}

impl std::error::Error for DefinitionError {}

/// An interchange document that cannot be decoded back into a forest.
///
/// Local to one document: callers are expected to log and skip, previously
/// decoded forests are unaffected.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentError {
    pub message: String,
}

impl DocumentError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed interchange document: {}", self.message)
    }
}

impl std::error::Error for DocumentError {}

/// A non-fatal problem met while encoding a forest back to source.
///
/// The encoder recovers by emitting a best-effort literal form; the warning
/// records what was degraded and where.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeWarning {
    pub identifier: String,
    pub reason: String,
    pub span: Option<Span>,
}

impl fmt::Display for EncodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some(span) => write!(f, "{} ({}): {}", self.identifier, span, self.reason),
            None => write!(f, "{}: {}", self.identifier, self.reason),
        }
    }
}

/// Umbrella error for the file boundary and the CLI.
#[derive(Debug)]
pub enum TranslationError {
    Syntax(SyntaxError),
    Definition(DefinitionError),
    Document(DocumentError),
    Io { path: PathBuf, message: String },
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationError::Syntax(err) => write!(f, "syntax error: {}", err),
            TranslationError::Definition(err) => write!(f, "definition error: {}", err),
            TranslationError::Document(err) => write!(f, "{}", err),
            TranslationError::Io { path, message } => {
                write!(f, "io error on {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for TranslationError {}

impl From<SyntaxError> for TranslationError {
    fn from(err: SyntaxError) -> Self {
        TranslationError::Syntax(err)
    }
}

impl From<DefinitionError> for TranslationError {
    fn from(err: DefinitionError) -> Self {
        TranslationError::Definition(err)
    }
}

impl From<DocumentError> for TranslationError {
    fn from(err: DocumentError) -> Self {
        TranslationError::Document(err)
    }
}

/// Format source code context around an error location
///
/// Shows 2 lines before the error, the error line with a >> marker, and 2
/// lines after. All lines are numbered for easy reference.
pub fn format_source_context(source: &str, position: Position) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let error_line = position.line.saturating_sub(1);

    let start_line = error_line.saturating_sub(2);
    let end_line = (error_line + 3).min(lines.len());

    let mut context = String::new();
    for line_num in start_line..end_line {
        let marker = if line_num == error_line { ">>" } else { "  " };
        context.push_str(&format!("{} {:3} | {}\n", marker, line_num + 1, lines[line_num]));
    }
    context
}
