//! Pull-based scanner.
//!
//! The lexer owns a mode stack and decides every character-level ambiguity from the
//! previous token kind plus a few characters of lookahead:
//!
//! | mode              | entered by                     | left by                        |
//! |-------------------|--------------------------------|--------------------------------|
//! | `Normal`          | start of input                 | never                          |
//! | `TagAttributes`   | `<name`                        | `>` or `/>`                    |
//! | `TagContent(n)`   | `>` of an ordinary tag         | `</name>`                      |
//! | `RawText(name)`   | `>` of a raw-text tag          | `</name>`                      |
//! | `Interpolation`   | a `{` / `@{` hole              | the `}` that balances it       |
//! | `Template`        | `` ` ``, `'..@{`, `@(`         | the matching closing delimiter |
//! | `DslBody`         | `@query` and friends before `(`| the balanced `)`               |
//!
//! Tag content lexes exactly like normal source.

mod at_literals;
mod markup;
mod money;


use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::diagnostics::{Diagnostic, Position, Span};
use crate::syntax::{self, is_ident_continue, is_ident_start};
use crate::token::{Token, TokenKind};
use crate::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TemplateKind {
    Backtick,
    Raw,
    Path,
    Url,
    Datetime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexMode {
    Normal,
    TagAttributes { tag: String },
    TagContent { depth: usize },
    RawText { tag: String },
    Interpolation { braces: usize },
    Template { kind: TemplateKind, parens: usize },
    DslBody,
}

#[derive(Debug, Clone, Copy)]
struct Mark {
    pos: usize,
    line: usize,
    column: usize,
}

/// Saved cursor state; restoring it replays the same tokens.
#[derive(Debug, Clone)]
pub struct LexerCheckpoint {
    pos: usize,
    line: usize,
    column: usize,
    last_char: Position,
    modes: Vec<LexMode>,
    last_kind: Option<TokenKind>,
    diagnostic_count: usize,
}

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    last_char: Position,
    modes: Vec<LexMode>,
    last_kind: Option<TokenKind>,
    diagnostics: Vec<Diagnostic>,
    raw_text_tags: Vec<String>,
    trace: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_raw_text_tags(source, default_raw_text_tags())
    }

    pub fn with_raw_text_tags(source: &'a str, raw_text_tags: Vec<String>) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            last_char: Position { line: 1, column: 1 },
            modes: vec![LexMode::Normal],
            last_kind: None,
            diagnostics: Vec::new(),
            raw_text_tags,
            trace: trace::enabled(trace::LEXER),
        }
    }

    pub fn mode(&self) -> &LexMode {
        self.modes.last().unwrap_or(&LexMode::Normal)
    }

    pub fn mode_depth(&self) -> usize {
        self.modes.len()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn checkpoint(&self) -> LexerCheckpoint {
        LexerCheckpoint {
            pos: self.pos,
            line: self.line,
            column: self.column,
            last_char: self.last_char,
            modes: self.modes.clone(),
            last_kind: self.last_kind,
            diagnostic_count: self.diagnostics.len(),
        }
    }

    pub fn restore(&mut self, checkpoint: LexerCheckpoint) {
        self.pos = checkpoint.pos;
        self.line = checkpoint.line;
        self.column = checkpoint.column;
        self.last_char = checkpoint.last_char;
        self.modes = checkpoint.modes;
        self.last_kind = checkpoint.last_kind;
        self.diagnostics.truncate(checkpoint.diagnostic_count);
    }

    /// Character `n` positions ahead of the cursor.
    pub fn peek_char(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn next_token(&mut self) -> Token {
        let token = self.scan();
        if token.kind != TokenKind::Eof {
            self.last_kind = Some(token.kind);
        }
        if self.trace {
            eprintln!(
                "[PARSLEY_TRACE_LEXER] {}:{} {:?} {:?}",
                token.span.start.line, token.span.start.column, token.kind, token.text
            );
        }
        token
    }

    fn scan(&mut self) -> Token {
        match self.mode().clone() {
            LexMode::TagAttributes { tag } => self.scan_tag_attribute(&tag),
            LexMode::RawText { tag } => self.scan_raw_text(&tag),
            LexMode::Template { kind, .. } => self.scan_template(kind),
            LexMode::DslBody => self.scan_dsl_body(),
            LexMode::Normal | LexMode::TagContent { .. } | LexMode::Interpolation { .. } => {
                self.scan_code()
            }
        }
    }

    fn scan_code(&mut self) -> Token {
        self.skip_trivia();
        let start = self.mark();
        let Some(ch) = self.current() else {
            return self.token(TokenKind::Eof, String::new(), start);
        };
        match ch {
            '"' => self.scan_string(start),
            '\'' => self.scan_raw_string(start),
            '`' => {
                self.bump();
                self.modes.push(LexMode::Template {
                    kind: TemplateKind::Backtick,
                    parens: 0,
                });
                self.token(TokenKind::BacktickStart, "`".to_string(), start)
            }
            '@' => self.scan_at_literal(start),
            '<' => self.scan_angle(start),
            '/' if self.regex_allowed() => self.scan_regex(start),
            '{' => {
                self.bump();
                if let Some(LexMode::Interpolation { braces }) = self.modes.last_mut() {
                    *braces += 1;
                }
                self.token(TokenKind::LBrace, "{".to_string(), start)
            }
            '}' => {
                self.bump();
                match self.modes.last_mut() {
                    Some(LexMode::Interpolation { braces }) if *braces == 0 => {
                        self.modes.pop();
                        self.token(TokenKind::HoleEnd, "}".to_string(), start)
                    }
                    Some(LexMode::Interpolation { braces }) => {
                        *braces -= 1;
                        self.token(TokenKind::RBrace, "}".to_string(), start)
                    }
                    _ => self.token(TokenKind::RBrace, "}".to_string(), start),
                }
            }
            c if c.is_ascii_digit() => self.scan_number(start),
            _ if self.money_prefix().is_some() => self.scan_money(start),
            c if is_ident_start(c) => self.scan_ident(start),
            _ => self.scan_operator(start),
        }
    }

    fn regex_allowed(&self) -> bool {
        self.last_kind.map_or(true, |kind| !kind.ends_operand())
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.current() {
                Some(ch) if ch.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_char(1) == Some('/') => {
                    while let Some(ch) = self.current() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('<') if self.rest().starts_with("<!--") => {
                    let start = self.mark();
                    match self.rest().find("-->") {
                        Some(offset) => {
                            let target = self.pos + offset + 3;
                            self.bump_to(target);
                        }
                        None => {
                            self.bump_to(self.source.len());
                            let span = self.span_from(start);
                            self.diagnostics.push(Diagnostic::error(
                                "E1007",
                                "unterminated comment: expected '-->'",
                                span,
                            ));
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_ident(&mut self, start: Mark) -> Token {
        while self.current().is_some_and(is_ident_continue) {
            self.bump();
        }
        let text = self.slice_from(start).to_string();
        let kind = syntax::lookup_keyword(&text).unwrap_or(TokenKind::Ident);
        self.token(kind, text, start)
    }

    fn scan_number(&mut self, start: Mark) -> Token {
        self.eat_digits();
        let mut kind = TokenKind::Int;
        if self.current() == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.eat_digits();
            kind = TokenKind::Float;
        }
        let text = self.slice_from(start).to_string();
        self.token(kind, text, start)
    }

    fn eat_digits(&mut self) {
        while self.current().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn scan_operator(&mut self, start: Mark) -> Token {
        if let Some((op, kind)) = syntax::match_operator(self.rest()) {
            self.bump_to(self.pos + op.len());
            return self.token(kind, op.to_string(), start);
        }
        let ch = self.bump().unwrap_or('\0');
        self.illegal("E1000", format!("unexpected character '{ch}'"), start)
    }

    fn scan_string(&mut self, start: Mark) -> Token {
        self.bump();
        let mut value = String::new();
        loop {
            match self.current() {
                None | Some('\n') => {
                    let message = format!(
                        "Unterminated string starting with \"{}\"",
                        truncate_fragment(&value, 20)
                    );
                    return self.illegal_with_hint(
                        "E1001",
                        message,
                        "strings cannot span lines; use a `backtick` template for multi-line text",
                        start,
                    );
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.current() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        Some('\n') | None => {
                            value.push('\\');
                            continue;
                        }
                        Some(other) => {
                            value.push('\\');
                            value.push(other);
                        }
                    }
                    self.bump();
                }
                Some(ch) => {
                    value.push(ch);
                    self.bump();
                }
            }
        }
        self.token(TokenKind::String, value, start)
    }

    fn scan_raw_string(&mut self, start: Mark) -> Token {
        if self.raw_string_has_hole() {
            self.bump();
            self.modes.push(LexMode::Template {
                kind: TemplateKind::Raw,
                parens: 0,
            });
            return self.token(TokenKind::RawTemplateStart, "'".to_string(), start);
        }
        self.bump();
        let mut value = String::new();
        loop {
            match self.current() {
                None | Some('\n') => {
                    let message = format!(
                        "Unterminated raw string starting with '{}'",
                        truncate_fragment(&value, 20)
                    );
                    return self.illegal("E1001", message, start);
                }
                Some('\'') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.current() {
                        Some(c @ ('\'' | '\\' | '@')) => {
                            value.push(c);
                            self.bump();
                        }
                        _ => value.push('\\'),
                    }
                }
                Some(ch) => {
                    value.push(ch);
                    self.bump();
                }
            }
        }
        self.token(TokenKind::RawString, value, start)
    }

    fn raw_string_has_hole(&self) -> bool {
        let mut chars = self.rest().chars().skip(1).peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '\\' => {
                    chars.next();
                }
                '\'' | '\n' => return false,
                '@' if chars.peek() == Some(&'{') => return true,
                _ => {}
            }
        }
        false
    }

    fn scan_template(&mut self, kind: TemplateKind) -> Token {
        let start = self.mark();
        let mut text = String::new();
        loop {
            let Some(ch) = self.current() else {
                self.modes.pop();
                return self.illegal_with_hint(
                    "E1002",
                    "unterminated template literal".to_string(),
                    match kind {
                        TemplateKind::Backtick => "close the template with '`'",
                        TemplateKind::Raw => "close the string with '",
                        _ => "close the template with ')'",
                    },
                    start,
                );
            };
            let closes = match kind {
                TemplateKind::Backtick => ch == '`',
                TemplateKind::Raw => ch == '\'',
                TemplateKind::Path | TemplateKind::Url | TemplateKind::Datetime => {
                    ch == ')' && self.template_parens() == 0
                }
            };
            if closes {
                if !text.is_empty() {
                    return self.token(TokenKind::TemplateText, text, start);
                }
                self.bump();
                self.modes.pop();
                return self.token(TokenKind::TemplateEnd, ch.to_string(), start);
            }
            if kind == TemplateKind::Raw && ch == '\n' {
                self.modes.pop();
                return self.illegal("E1002", "unterminated raw template".to_string(), start);
            }
            let opens_hole = match kind {
                TemplateKind::Raw => ch == '@' && self.peek_char(1) == Some('{'),
                _ => ch == '{',
            };
            if opens_hole {
                if !text.is_empty() {
                    return self.token(TokenKind::TemplateText, text, start);
                }
                let opener = if kind == TemplateKind::Raw { "@{" } else { "{" };
                self.bump_to(self.pos + opener.len());
                self.modes.push(LexMode::Interpolation { braces: 0 });
                return self.token(TokenKind::HoleStart, opener.to_string(), start);
            }
            if ch == '\\' {
                self.bump();
                let escaped = match (kind, self.current()) {
                    (TemplateKind::Backtick, Some(c @ ('`' | '{' | '}'))) => Some(c),
                    (TemplateKind::Raw, Some(c @ ('\'' | '\\' | '@'))) => Some(c),
                    (
                        TemplateKind::Path | TemplateKind::Url | TemplateKind::Datetime,
                        Some(c @ ('{' | '}' | '(' | ')')),
                    ) => Some(c),
                    _ => None,
                };
                match escaped {
                    Some(c) => {
                        text.push(c);
                        self.bump();
                    }
                    None => text.push('\\'),
                }
                continue;
            }
            if matches!(
                kind,
                TemplateKind::Path | TemplateKind::Url | TemplateKind::Datetime
            ) {
                if ch == '(' {
                    self.adjust_template_parens(true);
                } else if ch == ')' {
                    self.adjust_template_parens(false);
                }
            }
            text.push(ch);
            self.bump();
        }
    }

    fn template_parens(&self) -> usize {
        match self.mode() {
            LexMode::Template { parens, .. } => *parens,
            _ => 0,
        }
    }

    fn adjust_template_parens(&mut self, open: bool) {
        if let Some(LexMode::Template { parens, .. }) = self.modes.last_mut() {
            if open {
                *parens += 1;
            } else {
                *parens = parens.saturating_sub(1);
            }
        }
    }

    fn scan_regex(&mut self, start: Mark) -> Token {
        self.bump();
        let mut pattern = String::new();
        loop {
            match self.current() {
                None | Some('\n') => {
                    return self.illegal_with_hint(
                        "E1003",
                        format!("unterminated regex literal /{}", truncate_fragment(&pattern, 20)),
                        "a regex literal ends with '/' on the same line",
                        start,
                    );
                }
                Some('\\') => {
                    pattern.push('\\');
                    self.bump();
                    if let Some(next) = self.current().filter(|c| *c != '\n') {
                        pattern.push(next);
                        self.bump();
                    }
                }
                Some('/') => {
                    self.bump();
                    break;
                }
                Some(ch) => {
                    pattern.push(ch);
                    self.bump();
                }
            }
        }
        let mut flags = String::new();
        while let Some(ch) = self.current().filter(|c| c.is_ascii_alphabetic()) {
            flags.push(ch);
            self.bump();
        }
        self.token(TokenKind::Regex, format!("/{pattern}/{flags}"), start)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn current(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.last_char = Position {
            line: self.line,
            column: self.column,
        };
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Advances to byte offset `target`, which must sit on a char boundary.
    fn bump_to(&mut self, target: usize) {
        while self.pos < target {
            if self.bump().is_none() {
                break;
            }
        }
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    fn slice_from(&self, start: Mark) -> &'a str {
        &self.source[start.pos..self.pos]
    }

    fn span_from(&self, start: Mark) -> Span {
        let begin = Position {
            line: start.line,
            column: start.column,
        };
        if self.pos == start.pos {
            return Span::new(begin, begin);
        }
        Span::new(begin, self.last_char)
    }

    fn token(&self, kind: TokenKind, text: String, start: Mark) -> Token {
        Token {
            kind,
            text,
            span: self.span_from(start),
            start: start.pos,
            end: self.pos,
        }
    }

    fn illegal(&mut self, code: &str, message: String, start: Mark) -> Token {
        let span = self.span_from(start);
        self.diagnostics
            .push(Diagnostic::error(code, message.clone(), span));
        self.token(TokenKind::Illegal, message, start)
    }

    fn illegal_with_hint(&mut self, code: &str, message: String, hint: &str, start: Mark) -> Token {
        let span = self.span_from(start);
        self.diagnostics
            .push(Diagnostic::error(code, message.clone(), span).with_hint(hint));
        self.token(TokenKind::Illegal, message, start)
    }
}

/// Lexes the whole source eagerly, without the trailing end-of-input token.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    tokenize_with_raw_text_tags(source, default_raw_text_tags())
}

fn default_raw_text_tags() -> Vec<String> {
    syntax::DEFAULT_RAW_TEXT_TAGS
        .iter()
        .map(|tag| tag.to_string())
        .collect()
}

/// Every token before end of input, lexed with `raw_text_tags` as the raw-text elements.
pub fn tokenize_with_raw_text_tags(
    source: &str,
    raw_text_tags: Vec<String>,
) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut lexer = Lexer::with_raw_text_tags(source, raw_text_tags);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        if token.kind == TokenKind::Eof {
            break;
        }
        tokens.push(token);
    }
    (tokens, lexer.into_diagnostics())
}

fn truncate_fragment(text: &str, max: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max).collect();
    if graphemes.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
