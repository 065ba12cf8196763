//! Token definitions for process-script source
//!
//! Raw tokens are produced by the logos lexer and carry the exact source
//! text they matched — string literals keep their delimiters, whitespace
//! keeps its width, comments keep their leading hash. Nothing is normalized,
//! because the encoder must be able to reproduce the input byte-for-byte.
//!
//! Semantic tokens extend the raw set with the synthetic `Indent`/`Dedent`/
//! `Eof` markers emitted by the indentation transformation.

use logos::{Lexer, Logos};

/// Scan the remainder for a closing triple-quote delimiter, escape-aware.
///
/// The opening delimiter has already been consumed by the matched token;
/// on success the lexer is bumped past the closing delimiter and the full
/// literal text (delimiters included) is returned. `None` marks the literal
/// unterminated, which logos surfaces as an error at the token's span.
fn scan_triple(lex: &mut Lexer<RawToken>, delimiter: &[u8; 3]) -> Option<String> {
    let bytes = lex.remainder().as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i..].starts_with(delimiter) {
            lex.bump(i + 3);
            return Some(lex.slice().to_string());
        }
        i += 1;
    }
    None
}

fn scan_triple_double(lex: &mut Lexer<RawToken>) -> Option<String> {
    scan_triple(lex, b"\"\"\"")
}

fn scan_triple_single(lex: &mut Lexer<RawToken>) -> Option<String> {
    scan_triple(lex, b"'''")
}

/// All tokens produced by base tokenization, payloads holding exact text.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum RawToken {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Name(String),

    #[regex(r"[0-9][0-9A-Za-z_.]*", |lex| lex.slice().to_string())]
    Number(String),

    // Triple-quoted literals are matched by their opening delimiter and
    // completed by a remainder scan; single-line literals by regex. All four
    // forms keep their exact delimiters and body.
    #[token("\"\"\"", scan_triple_double)]
    #[token("'''", scan_triple_single)]
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| lex.slice().to_string())]
    #[regex(r"'([^'\\\n]|\\.)*'", |lex| lex.slice().to_string())]
    Str(String),

    #[regex(r"#[^\n]*", |lex| lex.slice().to_string())]
    Comment(String),

    // A backslash-newline continuation is whitespace: it joins physical
    // lines without ending the logical line.
    #[regex(r"[ \t]+|\\\r?\n", |lex| lex.slice().to_string())]
    Whitespace(String),

    #[regex(r"\r?\n", |lex| lex.slice().to_string())]
    Newline(String),

    #[regex(r"\*\*=?|//=?|<<=?|>>=?|<=|>=|==|!=|->|:=|[+\-*/%&|^@]=?|[=<>(){}\[\],:.;~!]", |lex| lex.slice().to_string())]
    Op(String),
}

/// Semantic token stream: raw tokens plus block-structure markers.
///
/// `Indent` carries the full leading whitespace of the line that opened the
/// level; `Dedent` and `Eof` are purely synthetic. The original whitespace
/// tokens stay in the stream, so concatenating the payloads of every
/// non-synthetic token reproduces the source exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Name(String),
    Number(String),
    Str(String),
    Comment(String),
    Whitespace(String),
    Newline(String),
    Op(String),
    Indent(String),
    Dedent,
    Eof,
}

impl From<RawToken> for Token {
    fn from(raw: RawToken) -> Self {
        match raw {
            RawToken::Name(s) => Token::Name(s),
            RawToken::Number(s) => Token::Number(s),
            RawToken::Str(s) => Token::Str(s),
            RawToken::Comment(s) => Token::Comment(s),
            RawToken::Whitespace(s) => Token::Whitespace(s),
            RawToken::Newline(s) => Token::Newline(s),
            RawToken::Op(s) => Token::Op(s),
        }
    }
}

impl Token {
    /// Tokens that never start or shape a statement
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace(_) | Token::Comment(_) | Token::Newline(_)
        )
    }

    /// Synthetic tokens with no text of their own
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Token::Indent(_) | Token::Dedent | Token::Eof)
    }

    pub fn is_newline(&self) -> bool {
        matches!(self, Token::Newline(_))
    }

    /// True for an operator token with exactly this text
    pub fn is_op(&self, text: &str) -> bool {
        matches!(self, Token::Op(s) if s == text)
    }

    /// True for a name token with exactly this text
    pub fn is_name(&self, text: &str) -> bool {
        matches!(self, Token::Name(s) if s == text)
    }

    /// The exact source text of this token; empty for synthetic tokens.
    pub fn to_source_string(&self) -> &str {
        match self {
            Token::Name(s)
            | Token::Number(s)
            | Token::Str(s)
            | Token::Comment(s)
            | Token::Whitespace(s)
            | Token::Newline(s)
            | Token::Op(s) => s,
            Token::Indent(_) | Token::Dedent | Token::Eof => "",
        }
    }
}

/// Detokenize a semantic token stream back into source text.
///
/// Synthetic tokens contribute nothing: the original whitespace tokens are
/// still present in the stream, so this is a plain payload concatenation.
/// Used by lexer round-trip tests.
pub fn detokenize(tokens: &[Token]) -> String {
    let mut result = String::new();
    for token in tokens {
        result.push_str(token.to_source_string());
    }
    result
}
