//! Semantic indentation transformation
//!
//! Converts the raw token stream into one where changes of leading
//! whitespace at logical line starts appear as explicit `Indent`/`Dedent`
//! tokens. The raw whitespace tokens stay in the stream untouched, so the
//! transformation loses nothing: detokenizing the output reproduces the
//! source.
//!
//! Indentation is tracked as a stack of whitespace prefixes rather than a
//! fixed step width, so scripts indented with tabs, two spaces or four
//! spaces all work, as long as every dedent returns to some enclosing
//! level. A dedent that matches no enclosing level is a syntax error.
//!
//! Blank lines and comment-only lines never change the indentation level,
//! and newlines inside brackets do not end the logical line.

use crate::procscript::error::SyntaxError;
use crate::procscript::span::LineIndex;
use crate::procscript::token::{RawToken, Token};
use std::ops::Range;

/// Apply the indentation transformation to a raw token stream.
///
/// Synthetic tokens get zero-width spans at the point they were detected;
/// they are markers, not source text.
pub fn transform(
    source: &str,
    raw: Vec<(RawToken, Range<usize>)>,
) -> Result<Vec<(Token, Range<usize>)>, SyntaxError> {
    let index = LineIndex::new(source);
    let mut out: Vec<(Token, Range<usize>)> = Vec::new();
    let mut stack: Vec<String> = vec![String::new()];
    let mut bracket_depth: usize = 0;
    let mut at_line_start = true;
    let mut i = 0;

    while i < raw.len() {
        if at_line_start {
            let (ws_text, ws_count) = match &raw[i].0 {
                RawToken::Whitespace(s) => (s.clone(), 1),
                _ => (String::new(), 0),
            };
            let j = i + ws_count;

            // Blank and comment-only lines pass through without touching the
            // indentation stack.
            let insignificant = match raw.get(j).map(|(t, _)| t) {
                None => true,
                Some(RawToken::Newline(_)) | Some(RawToken::Comment(_)) => true,
                Some(_) => false,
            };
            if insignificant {
                let mut k = i;
                while k < raw.len() {
                    let is_newline = matches!(raw[k].0, RawToken::Newline(_));
                    out.push((Token::from(raw[k].0.clone()), raw[k].1.clone()));
                    k += 1;
                    if is_newline {
                        break;
                    }
                }
                i = k;
                continue;
            }

            let line_start = raw[j].1.start;
            let top = stack.last().cloned().unwrap_or_default();
            if ws_text != top {
                if ws_text.len() > top.len() && ws_text.starts_with(top.as_str()) {
                    stack.push(ws_text.clone());
                    out.push((Token::Indent(ws_text.clone()), line_start..line_start));
                } else {
                    loop {
                        stack.pop();
                        out.push((Token::Dedent, line_start..line_start));
                        match stack.last() {
                            Some(enclosing) if *enclosing == ws_text => break,
                            Some(enclosing)
                                if ws_text.len() > enclosing.len()
                                    && ws_text.starts_with(enclosing.as_str()) =>
                            {
                                return Err(SyntaxError::InconsistentDedent {
                                    position: index.position(line_start),
                                });
                            }
                            Some(_) => {}
                            // The root level always compares equal eventually;
                            // an empty stack means the dedent matched nothing.
                            None => {
                                return Err(SyntaxError::InconsistentDedent {
                                    position: index.position(line_start),
                                });
                            }
                        }
                    }
                }
            }
            at_line_start = false;
            continue;
        }

        let (token, span) = &raw[i];
        match token {
            RawToken::Op(s) if s == "(" || s == "[" || s == "{" => bracket_depth += 1,
            RawToken::Op(s) if s == ")" || s == "]" || s == "}" => {
                bracket_depth = bracket_depth.saturating_sub(1)
            }
            RawToken::Newline(_) if bracket_depth == 0 => at_line_start = true,
            _ => {}
        }
        out.push((Token::from(token.clone()), span.clone()));
        i += 1;
    }

    let end = source.len();
    for _ in 1..stack.len() {
        out.push((Token::Dedent, end..end));
    }
    out.push((Token::Eof, end..end));

    Ok(out)
}
