//! # procscript
//!
//! A bidirectional translator between process scripts and verb forests.
//!
//! Process scripts are ordinary procedural source files. This crate tokenizes
//! them with full fidelity, recognizes known code idioms as semantic verbs via
//! a configurable pattern library, builds an ordered forest of verbs mirroring
//! the block structure of the source, serializes that forest to and from an
//! interchange document, and regenerates source text from the forest —
//! byte-identical when nothing changed, structurally equivalent after edits.
//!
//! The typical flow:
//!
//! ```ignore
//! use procscript::{encode, parse_file, DefinitionTable};
//!
//! let defs = DefinitionTable::load(&["bpm_lib.json"])?;
//! let forest = parse_file("process.py", &defs)?;
//! let encoded = encode(&forest, &defs);
//! assert_eq!(encoded.text, std::fs::read_to_string("process.py")?);
//! ```

#![allow(rustdoc::invalid_html_tags)]

pub mod procscript;

pub use procscript::definitions::{Definition, DefinitionTable, MatchKind};
pub use procscript::document::{from_document, to_document};
pub use procscript::encoding::{encode, Encoded};
pub use procscript::error::{
    DefinitionError, DocumentError, EncodeWarning, SyntaxError, TranslationError,
};
pub use procscript::loader::{encode_to_file, parse_file, ScriptLoader};
pub use procscript::parsing::parse;
pub use procscript::verb::{Forest, Verb};
