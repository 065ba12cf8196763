//! Base tokenization for process scripts
//!
//! This module is the entry point where source strings become token streams.
//! Raw tokenization is handled by logos; the indentation transformation in
//! [`indentation`] then turns leading whitespace into semantic
//! `Indent`/`Dedent` markers.
//!
//! Lexer failures are the only fatal outcome here: an input the token
//! patterns cannot cover surfaces as a [`SyntaxError`] carrying line and
//! column, and translation of that one file stops.

pub mod indentation;

use crate::procscript::error::SyntaxError;
use crate::procscript::span::LineIndex;
use crate::procscript::token::{RawToken, Token};
use logos::Logos;
use std::ops::Range;

/// Tokenize source text into raw tokens with byte spans.
///
/// The tokens cover the entire input; concatenating their payloads
/// reproduces it exactly. An untokenizable region fails the pass: a region
/// starting with a quote is an unterminated literal, anything else is
/// unexpected input.
pub fn tokenize_raw(source: &str) -> Result<Vec<(RawToken, Range<usize>)>, SyntaxError> {
    let index = LineIndex::new(source);
    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let position = index.position(span.start);
                let text = &source[span.clone()];
                return Err(if text.starts_with('"') || text.starts_with('\'') {
                    SyntaxError::UnterminatedString { position }
                } else {
                    SyntaxError::UnexpectedToken {
                        position,
                        text: text.to_string(),
                    }
                });
            }
        }
    }

    Ok(tokens)
}

/// Full lexing: base tokenization plus semantic indentation.
///
/// The resulting stream ends with closing `Dedent`s and an `Eof` marker and
/// is what the verb parser consumes.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Range<usize>)>, SyntaxError> {
    let raw = tokenize_raw(source)?;
    indentation::transform(source, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procscript::span::Position;
    use crate::procscript::token::detokenize;

    #[test]
    fn test_tokenize_raw_covers_input() {
        let source = "counter = 0\nwhile counter < 6:\n    counter += 1\n";
        let tokens = tokenize_raw(source).unwrap();

        let rebuilt: String = tokens
            .iter()
            .map(|(_, span)| &source[span.clone()])
            .collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_tokenize_raw_empty_input() {
        assert_eq!(tokenize_raw("").unwrap(), vec![]);
    }

    #[test]
    fn test_unterminated_string_position() {
        let err = tokenize_raw("x = 1\ny = \"oops\n").unwrap_err();
        assert_eq!(
            err,
            SyntaxError::UnterminatedString {
                position: Position::new(2, 5)
            }
        );
    }

    #[test]
    fn test_unexpected_input() {
        let err = tokenize_raw("x = 1 $ 2\n").unwrap_err();
        match err {
            SyntaxError::UnexpectedToken { position, .. } => {
                assert_eq!(position, Position::new(1, 7));
            }
            other => panic!("expected UnexpectedToken, got {:?}", other),
        }
    }

    #[test]
    fn test_tokenize_ends_with_eof() {
        let tokens = tokenize("x = 1\n").unwrap();
        assert_eq!(tokens.last().map(|(t, _)| t.clone()), Some(Token::Eof));
    }

    #[test]
    fn test_tokenize_detokenize_round_trip() {
        let source = "a = 1\nif a == 1:\n    print(\"one\")\n\n# done\n";
        let tokens = tokenize(source).unwrap();
        let stream: Vec<Token> = tokens.into_iter().map(|(t, _)| t).collect();
        assert_eq!(detokenize(&stream), source);
    }
}
