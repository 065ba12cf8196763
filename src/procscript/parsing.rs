//! The verb parser: token stream to verb forest
//!
//! A single pass over the semantic token stream, driven by the
//! `Indent`/`Dedent` structure. Statements at one level are walked in source
//! order; compound constructs emit one verb per branch keyword, each owning
//! the forest of its indented block; simple statements are matched against
//! the definition table; anything unrecognized degrades to a raw verb, so no
//! statement is ever lost.
//!
//! Raw tiling: the parser keeps a byte cursor, and every verb's `raw` is the
//! slice from the cursor to the end of the statement (compound: the end of
//! its block). Interstitial whitespace, comments and preceding description
//! literals thereby land in the next verb's `raw` prefix, and concatenating
//! the top-level `raw`s reproduces the file byte-for-byte.

use crate::procscript::definitions::{Definition, DefinitionTable, MatchKind};
use crate::procscript::error::SyntaxError;
use crate::procscript::lexing;
use crate::procscript::span::{LineIndex, Span};
use crate::procscript::token::Token;
use crate::procscript::verb::{Forest, Verb, STRUCTURAL_IDENTIFIERS};
use indexmap::IndexMap;
use std::ops::Range;

/// Parse source text into a verb forest.
pub fn parse(source: &str, definitions: &DefinitionTable) -> Result<Forest, SyntaxError> {
    let tokens = lexing::tokenize(source)?;
    let mut parser = VerbParser {
        source,
        tokens,
        definitions,
        index: LineIndex::new(source),
        pos: 0,
        cursor: 0,
        consumed_end: 0,
    };

    let (mut verbs, description) = parser.parse_block(true)?;

    // Anything after the last statement (trailing blank lines, comments)
    // stays attached to the file: appended to the final verb's raw slice, or
    // kept as forest trailing text when there are no statements at all.
    let mut trailing = String::new();
    if parser.cursor < source.len() {
        let rest = &source[parser.cursor..];
        if let Some(last) = verbs.last_mut() {
            if let Some(raw) = &mut last.raw {
                raw.push_str(rest);
            }
        } else {
            trailing = rest.to_string();
        }
    }

    Ok(Forest {
        description,
        verbs,
        trailing,
    })
}

/// One collected logical line: its significant tokens with byte spans.
struct Statement {
    toks: Vec<(Token, Range<usize>)>,
    start: usize,
    end: usize,
}

impl Statement {
    /// The literal text when this statement is a lone string literal.
    fn standalone_literal(&self) -> Option<&str> {
        match self.toks.as_slice() {
            [(Token::Str(text), _)] => Some(text.as_str()),
            _ => None,
        }
    }

    fn last_is_colon(&self) -> bool {
        matches!(self.toks.last(), Some((tok, _)) if tok.is_op(":"))
    }
}

struct VerbParser<'a> {
    source: &'a str,
    tokens: Vec<(Token, Range<usize>)>,
    definitions: &'a DefinitionTable,
    index: LineIndex,
    pos: usize,
    /// Byte tiling cursor: start of the next verb's raw slice.
    cursor: usize,
    /// Furthest byte position any consumed token reached.
    consumed_end: usize,
}

impl<'a> VerbParser<'a> {
    fn current(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    fn advance(&mut self) {
        let end = self.tokens[self.pos].1.end;
        if end > self.consumed_end {
            self.consumed_end = end;
        }
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn skip_trivia(&mut self) {
        while self.current().is_trivia() {
            self.advance();
        }
    }

    /// Index of the next non-trivia token, without consuming anything.
    fn peek_non_trivia(&self) -> usize {
        let mut i = self.pos;
        while self.tokens[i].0.is_trivia() {
            i += 1;
        }
        i
    }

    fn position_at(&self, offset: usize) -> crate::procscript::span::Position {
        self.index.position(offset)
    }

    /// Parse statements at the current level until the closing dedent (or
    /// end of input). Returns the verbs and, at top level, the file-level
    /// description harvested from leading literals.
    fn parse_block(&mut self, top_level: bool) -> Result<(Vec<Verb>, Option<String>), SyntaxError> {
        let mut verbs: Vec<Verb> = Vec::new();
        let mut pending: Option<String> = None;
        let mut file_description: Option<String> = None;

        loop {
            self.skip_trivia();
            let current = self.tokens[self.pos].0.clone();
            match current {
                Token::Eof => break,
                Token::Dedent => {
                    if !top_level {
                        self.advance();
                    }
                    break;
                }
                Token::Indent(_) => {
                    let offset = self.tokens[self.pos].1.start;
                    return Err(SyntaxError::UnexpectedToken {
                        position: self.position_at(offset),
                        text: "unexpected indentation".to_string(),
                    });
                }
                _ => {}
            }

            let stmt = self.collect_statement();

            if let Some(literal) = stmt.standalone_literal() {
                let text = strip_quotes(literal);
                // The module docstring position: a leading literal displaced
                // by a second one before any statement describes the file.
                if top_level && verbs.is_empty() && file_description.is_none() {
                    if let Some(displaced) = pending.take() {
                        file_description = Some(displaced);
                    }
                }
                pending = Some(text);
                continue;
            }

            let verb = self.build_verb(stmt, pending.take())?;
            verbs.push(verb);
        }

        if let Some(text) = pending {
            if top_level {
                if file_description.is_none() {
                    file_description = Some(text);
                }
            } else {
                // A trailing literal in a nested block precedes nothing; it
                // stays a raw statement so the block keeps its body.
                let raw = self.source[self.cursor..self.consumed_end].to_string();
                self.cursor = self.consumed_end;
                verbs.push(Verb::raw_statement(raw));
            }
        }

        Ok((verbs, file_description))
    }

    /// Collect the significant tokens of one logical line. Newlines inside
    /// brackets do not end the statement; comments and whitespace are
    /// consumed but not kept (they live on in the raw slice).
    fn collect_statement(&mut self) -> Statement {
        let start = self.tokens[self.pos].1.start;
        let mut toks = Vec::new();
        let mut depth: usize = 0;

        loop {
            let token = self.tokens[self.pos].0.clone();
            match token {
                Token::Eof | Token::Dedent | Token::Indent(_) => break,
                Token::Newline(_) => {
                    self.advance();
                    if depth == 0 {
                        break;
                    }
                }
                Token::Whitespace(_) | Token::Comment(_) => self.advance(),
                other => {
                    if let Token::Op(op) = &other {
                        match op.as_str() {
                            "(" | "[" | "{" => depth += 1,
                            ")" | "]" | "}" => depth = depth.saturating_sub(1),
                            _ => {}
                        }
                    }
                    toks.push((other, self.tokens[self.pos].1.clone()));
                    self.advance();
                }
            }
        }

        Statement {
            toks,
            start,
            end: self.consumed_end,
        }
    }

    fn build_verb(&mut self, stmt: Statement, description: Option<String>) -> Result<Verb, SyntaxError> {
        if stmt.last_is_colon() {
            if let Some((Token::Name(kw), _)) = stmt.toks.first() {
                if STRUCTURAL_IDENTIFIERS.contains(&kw.as_str()) {
                    let keyword = kw.clone();
                    return self.build_branch(keyword, stmt, description);
                }
            }
            // An unknown compound construct: swallow header and block whole.
            return Ok(self.build_raw_block(stmt, description));
        }

        let span = self.statement_span(&stmt);
        let raw = self.take_raw(stmt.end);

        let matched = self
            .match_call_statement(&stmt)
            .or_else(|| self.match_assign_statement(&stmt));

        let mut verb = match matched {
            Some((identifier, parameters)) => {
                let mut verb = Verb::new(identifier);
                verb.parameters = parameters;
                verb
            }
            None => Verb::new(crate::procscript::verb::RAW_IDENTIFIER),
        };
        verb.description = description;
        verb.raw = Some(raw);
        verb.span = Some(span);
        Ok(verb)
    }

    /// A branch verb: header parameters plus the forest of its block.
    fn build_branch(
        &mut self,
        keyword: String,
        stmt: Statement,
        description: Option<String>,
    ) -> Result<Verb, SyntaxError> {
        let raw_start = self.cursor;
        let parameters = self.branch_parameters(&keyword, &stmt);

        let next = self.peek_non_trivia();
        if !matches!(self.tokens[next].0, Token::Indent(_)) {
            return Err(SyntaxError::ExpectedBlock {
                position: self.position_at(stmt.start),
                keyword,
            });
        }
        // Children tile from the end of the header line.
        self.cursor = stmt.end;
        while self.pos <= next {
            self.advance();
        }
        let (children, _) = self.parse_block(false)?;

        let end = self.consumed_end;
        let raw = self.source[raw_start..end].to_string();
        self.cursor = end;

        let mut verb = Verb::new(keyword);
        verb.parameters = parameters;
        verb.children = children;
        verb.description = description;
        verb.raw = Some(raw);
        verb.span = Some(Span::new(
            self.position_at(stmt.start),
            self.position_at(end),
        ));
        Ok(verb)
    }

    /// An unrecognized construct ending in a colon: consume its block, if
    /// any, into one opaque raw verb.
    fn build_raw_block(&mut self, stmt: Statement, description: Option<String>) -> Verb {
        let span = self.statement_span(&stmt);
        let next = self.peek_non_trivia();
        if matches!(self.tokens[next].0, Token::Indent(_)) {
            while self.pos <= next {
                self.advance();
            }
            let mut depth = 1usize;
            loop {
                let current = self.tokens[self.pos].0.clone();
                match current {
                    Token::Eof => break,
                    Token::Indent(_) => {
                        depth += 1;
                        self.advance();
                    }
                    Token::Dedent => {
                        depth -= 1;
                        self.advance();
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => self.advance(),
                }
            }
        }
        let raw = self.take_raw(self.consumed_end);
        let mut verb = Verb::raw_statement(raw);
        verb.description = description;
        verb.span = Some(span);
        verb
    }

    fn take_raw(&mut self, end: usize) -> String {
        let raw = self.source[self.cursor..end].to_string();
        self.cursor = end;
        raw
    }

    fn statement_span(&self, stmt: &Statement) -> Span {
        let last_end = stmt
            .toks
            .last()
            .map(|(_, span)| span.end)
            .unwrap_or(stmt.start);
        Span::new(self.position_at(stmt.start), self.position_at(last_end))
    }

    /// Header parameters for a branch keyword, sliced verbatim from source.
    fn branch_parameters(&self, keyword: &str, stmt: &Statement) -> IndexMap<String, String> {
        let mut parameters = IndexMap::new();
        let toks = &stmt.toks;
        let colon = toks.len() - 1;

        let slice = |from: usize, to: usize| -> Option<String> {
            if from > to || to >= toks.len() {
                return None;
            }
            let start = toks[from].1.start;
            let end = toks[to].1.end;
            Some(self.source[start..end].to_string())
        };

        match keyword {
            "if" | "elif" | "while" => {
                if let Some(condition) = slice(1, colon - 1) {
                    parameters.insert("condition".to_string(), condition);
                }
            }
            "for" => {
                let mut depth = 0usize;
                let mut split = None;
                for (i, (tok, _)) in toks.iter().enumerate().take(colon).skip(1) {
                    if let Token::Op(op) = tok {
                        match op.as_str() {
                            "(" | "[" | "{" => depth += 1,
                            ")" | "]" | "}" => depth = depth.saturating_sub(1),
                            _ => {}
                        }
                    }
                    if depth == 0 && tok.is_name("in") {
                        split = Some(i);
                        break;
                    }
                }
                match split {
                    Some(i) => {
                        if let Some(target) = slice(1, i - 1) {
                            parameters.insert("target".to_string(), target);
                        }
                        if let Some(iterable) = slice(i + 1, colon - 1) {
                            parameters.insert("iterable".to_string(), iterable);
                        }
                    }
                    None => {
                        if let Some(expression) = slice(1, colon - 1) {
                            parameters.insert("expression".to_string(), expression);
                        }
                    }
                }
            }
            "except" => {
                if let Some(expression) = slice(1, colon - 1) {
                    parameters.insert("expression".to_string(), expression);
                }
            }
            "def" => {
                let name = match toks.get(1) {
                    Some((Token::Name(name), _)) => Some(name.clone()),
                    _ => None,
                };
                let opens = toks.get(2).map(|(t, _)| t.is_op("(")).unwrap_or(false);
                let closes = colon >= 3 && toks[colon - 1].0.is_op(")");
                match (name, opens, closes) {
                    (Some(name), true, true) => {
                        parameters.insert("name".to_string(), name);
                        let signature = slice(3, colon - 2).unwrap_or_default();
                        parameters.insert("signature".to_string(), signature);
                    }
                    _ => {
                        if let Some(expression) = slice(1, colon - 1) {
                            parameters.insert("expression".to_string(), expression);
                        }
                    }
                }
            }
            // else / finally / try carry no header data
            _ => {}
        }

        parameters
    }

    /// Match a call-shaped statement against the definition table.
    fn match_call_statement(&self, stmt: &Statement) -> Option<(String, IndexMap<String, String>)> {
        let toks = &stmt.toks;
        let (target, open) = dotted_target(toks)?;
        if !matches!(toks.get(open), Some((tok, _)) if tok.is_op("(")) {
            return None;
        }
        // The call's closing paren must be the statement's last token.
        let mut depth = 0usize;
        let mut close = None;
        for (i, (tok, _)) in toks.iter().enumerate().skip(open) {
            if let Token::Op(op) = tok {
                match op.as_str() {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => {
                        depth -= 1;
                        if depth == 0 {
                            close = Some(i);
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
        let close = close?;
        if close != toks.len() - 1 {
            return None;
        }

        let args = self.collect_arguments(toks, open + 1, close);
        self.best_match(MatchKind::Call, &target, &args)
    }

    /// Match an assignment to a dotted target against the definition table.
    fn match_assign_statement(
        &self,
        stmt: &Statement,
    ) -> Option<(String, IndexMap<String, String>)> {
        let toks = &stmt.toks;
        let (target, eq) = dotted_target(toks)?;
        if !matches!(toks.get(eq), Some((tok, _)) if tok.is_op("=")) {
            return None;
        }
        if eq + 1 >= toks.len() {
            return None;
        }
        let value_start = toks[eq + 1].1.start;
        let value_end = toks[toks.len() - 1].1.end;
        let args = vec![Argument {
            name: None,
            value: self.source[value_start..value_end].to_string(),
        }];
        self.best_match(MatchKind::Assign, &target, &args)
    }

    /// Split the tokens between a call's parens into arguments.
    fn collect_arguments(
        &self,
        toks: &[(Token, Range<usize>)],
        from: usize,
        to: usize,
    ) -> Vec<Argument> {
        let mut args = Vec::new();
        let mut depth = 0usize;
        let mut arg_start = from;
        let mut i = from;
        while i <= to {
            let at_end = i == to;
            let splits = at_end
                || (depth == 0 && matches!(&toks[i].0, Token::Op(op) if op == ","));
            if splits {
                if i > arg_start {
                    args.push(self.argument(toks, arg_start, i - 1));
                }
                arg_start = i + 1;
            } else if let Token::Op(op) = &toks[i].0 {
                match op.as_str() {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
            i += 1;
        }
        args
    }

    fn argument(&self, toks: &[(Token, Range<usize>)], from: usize, to: usize) -> Argument {
        if from + 1 < to && toks[from + 1].0.is_op("=") {
            if let Token::Name(name) = &toks[from].0 {
                let start = toks[from + 2].1.start;
                let end = toks[to].1.end;
                return Argument {
                    name: Some(name.clone()),
                    value: self.source[start..end].to_string(),
                };
            }
        }
        let start = toks[from].1.start;
        let end = toks[to].1.end;
        Argument {
            name: None,
            value: self.source[start..end].to_string(),
        }
    }

    /// Pick the winning definition for a statement shape.
    ///
    /// A candidate matches only when every declared parameter binds —
    /// positionally by index or by keyword name. The candidate binding the
    /// most argument positions wins; remaining ties go to the
    /// earliest-loaded table entry.
    fn best_match(
        &self,
        kind: MatchKind,
        target: &str,
        args: &[Argument],
    ) -> Option<(String, IndexMap<String, String>)> {
        let positional: Vec<&Argument> = args.iter().filter(|a| a.name.is_none()).collect();
        let keywords: Vec<&Argument> = args.iter().filter(|a| a.name.is_some()).collect();

        let mut best: Option<(usize, &Definition, IndexMap<String, String>)> = None;
        for definition in self.definitions.candidates(kind, target) {
            let mut values: IndexMap<String, String> = IndexMap::new();
            for (i, key) in definition.parameters.iter().enumerate() {
                if let Some(arg) = positional.get(i) {
                    values.insert(key.clone(), arg.value.clone());
                }
            }
            let mut usable = true;
            for arg in &keywords {
                let name = match arg.name.as_deref() {
                    Some(name) => name,
                    None => continue,
                };
                if !definition.parameters.iter().any(|p| p == name)
                    || values.contains_key(name)
                {
                    usable = false;
                    break;
                }
                values.insert(name.to_string(), arg.value.clone());
            }
            if !usable || values.len() != definition.parameters.len() {
                continue;
            }

            let score = definition.parameters.len();
            let better = match &best {
                None => true,
                Some((best_score, _, _)) => score > *best_score,
            };
            if better {
                // Re-emit in declared order for deterministic synthesis.
                let ordered: IndexMap<String, String> = definition
                    .parameters
                    .iter()
                    .map(|p| (p.clone(), values[p.as_str()].clone()))
                    .collect();
                best = Some((score, definition, ordered));
            }
        }

        best.map(|(_, definition, parameters)| (definition.identifier.clone(), parameters))
    }
}

struct Argument {
    name: Option<String>,
    value: String,
}

/// A dotted name prefix: `name(.name)*`. Returns the joined target and the
/// index of the first token after it.
fn dotted_target(toks: &[(Token, Range<usize>)]) -> Option<(String, usize)> {
    let mut target = match toks.first() {
        Some((Token::Name(name), _)) => name.clone(),
        _ => return None,
    };
    let mut i = 1;
    while i + 1 < toks.len() && toks[i].0.is_op(".") {
        match &toks[i + 1].0 {
            Token::Name(name) => {
                target.push('.');
                target.push_str(name);
                i += 2;
            }
            _ => break,
        }
    }
    Some((target, i))
}

/// Strip the delimiters off a string literal, keeping the body exact.
fn strip_quotes(text: &str) -> String {
    for delim in ["\"\"\"", "'''"] {
        if text.len() >= 6 && text.starts_with(delim) && text.ends_with(delim) {
            return text[3..text.len() - 3].to_string();
        }
    }
    if text.len() >= 2 && (text.starts_with('"') || text.starts_with('\'')) {
        return text[1..text.len() - 1].to_string();
    }
    text.to_string()
}
