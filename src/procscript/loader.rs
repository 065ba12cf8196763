//! Script loading utilities and the file boundary
//!
//! `ScriptLoader` loads source text from files or strings and runs the
//! translation stages on it; `parse_file`/`encode_to_file` are the two
//! operations host systems call with a path. File handles are scoped to the
//! read or write and released on every exit path, including failures.
//!
//! # Example
//!
//! ```ignore
//! let defs = DefinitionTable::load(&["bpm_lib.json"])?;
//! let forest = ScriptLoader::from_path("process.py")?.parse(&defs)?;
//! encode_to_file(&forest, &defs, "process_out.py")?;
//! ```

use crate::procscript::definitions::DefinitionTable;
use crate::procscript::encoding::{encode, Encoded};
use crate::procscript::error::TranslationError;
use crate::procscript::lexing;
use crate::procscript::parsing;
use crate::procscript::token::Token;
use crate::procscript::verb::Forest;
use std::fs;
use std::ops::Range;
use std::path::Path;

/// Script loader with translation shortcuts.
pub struct ScriptLoader {
    source: String,
}

impl ScriptLoader {
    /// Load from a file path. The file must be UTF-8 text.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TranslationError> {
        let source = fs::read_to_string(path.as_ref()).map_err(|err| TranslationError::Io {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        })?;
        Ok(ScriptLoader { source })
    }

    /// Load from a string.
    pub fn from_string<S: Into<String>>(source: S) -> Self {
        ScriptLoader {
            source: source.into(),
        }
    }

    /// Tokenize the source with full lexing, including semantic indentation.
    pub fn tokenize(&self) -> Result<Vec<(Token, Range<usize>)>, TranslationError> {
        Ok(lexing::tokenize(&self.source)?)
    }

    /// Parse the source into a verb forest.
    pub fn parse(&self, definitions: &DefinitionTable) -> Result<Forest, TranslationError> {
        Ok(parsing::parse(&self.source, definitions)?)
    }

    /// A reference to the raw source text.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Read a script file and parse it into a verb forest.
pub fn parse_file<P: AsRef<Path>>(
    path: P,
    definitions: &DefinitionTable,
) -> Result<Forest, TranslationError> {
    ScriptLoader::from_path(path)?.parse(definitions)
}

/// Encode a forest and write the text to a file, overwriting the target.
pub fn encode_to_file<P: AsRef<Path>>(
    forest: &Forest,
    definitions: &DefinitionTable,
    path: P,
) -> Result<Encoded, TranslationError> {
    let encoded = encode(forest, definitions);
    fs::write(path.as_ref(), &encoded.text).map_err(|err| TranslationError::Io {
        path: path.as_ref().to_path_buf(),
        message: err.to_string(),
    })?;
    Ok(encoded)
}
