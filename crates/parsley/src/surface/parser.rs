//! Statement dispatcher over a Pratt expression core.
//!
//! Tokens are pulled lazily from the lexer into a small lookahead queue. A trial
//! parse saves a [`Checkpoint`] and restores it when the attempt fails; any other
//! failure records a diagnostic and resynchronizes at the next statement boundary.

mod expressions;
mod literals;
mod patterns;
mod schema;
mod statements;
mod tags;

use std::collections::VecDeque;

use super::ast::{Program, Stmt};
use crate::config::ParseOptions;
use crate::diagnostics::{cap_diagnostics, Diagnostic, Span};
use crate::lexer::{Lexer, LexerCheckpoint};
use crate::token::{Token, TokenKind};
use crate::trace;

/// Statement, expression and pattern levels open at once. Every level costs several
/// stack frames, so deeper input is reported instead of parsed.
const MAX_NESTING_DEPTH: usize = 128;

pub fn parse_program(source: &str) -> Program {
    parse_program_with_options(source, &ParseOptions::default())
}

pub fn parse_program_with_options(source: &str, options: &ParseOptions) -> Program {
    Parser::new(source, options.clone()).parse()
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: VecDeque<Token>,
    /// Span of the last consumed token; node spans end here.
    previous: Span,
    consumed: usize,
    nesting_depth: usize,
    diagnostics: Vec<Diagnostic>,
    options: ParseOptions,
    trace: bool,
}

struct Checkpoint {
    lexer: LexerCheckpoint,
    lookahead: VecDeque<Token>,
    previous: Span,
    consumed: usize,
    diagnostic_count: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, options: ParseOptions) -> Self {
        Self {
            lexer: Lexer::with_raw_text_tags(source, options.raw_text_tags.clone()),
            lookahead: VecDeque::new(),
            previous: Span::point(1, 1),
            consumed: 0,
            nesting_depth: 0,
            diagnostics: Vec::new(),
            options,
            trace: trace::enabled(trace::PARSER),
        }
    }

    pub fn parse(mut self) -> Program {
        let statements = self.parse_statements_until(|kind| kind == TokenKind::Eof);
        let Parser {
            lexer,
            mut diagnostics,
            options,
            ..
        } = self;
        let mut all = lexer.into_diagnostics();
        all.append(&mut diagnostics);
        all.sort_by_key(|diagnostic| diagnostic.span.start);
        cap_diagnostics(&mut all, options.max_diagnostics);
        Program {
            statements,
            diagnostics: all,
        }
    }

    /// Statements up to (not including) the first token accepted by `stop` or end of input.
    fn parse_statements_until(&mut self, stop: fn(TokenKind) -> bool) -> Vec<Stmt> {
        let mut statements = Vec::new();
        loop {
            let kind = self.peek_kind();
            if kind == TokenKind::Eof || stop(kind) {
                break;
            }
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            let before = self.consumed;
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronize(),
            }
            if self.consumed == before {
                self.advance();
            }
        }
        statements
    }

    /// Skips to the next statement boundary: after a `;`, before a closer or a
    /// statement keyword, or before the first token on a later line than the last
    /// consumed one. Brace-delimited groups are skipped whole.
    fn synchronize(&mut self) {
        let start = self.peek_span();
        let error_line = self.previous.end.line;
        let mut skipped = 0usize;
        let mut depth = 0usize;
        loop {
            let kind = self.peek_kind();
            match kind {
                TokenKind::Eof => break,
                TokenKind::LBrace | TokenKind::HoleStart => depth += 1,
                TokenKind::RBrace | TokenKind::HoleEnd if depth > 0 => depth -= 1,
                TokenKind::RBrace | TokenKind::HoleEnd | TokenKind::TagClose => break,
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    skipped += 1;
                    break;
                }
                _ if depth == 0 && resumes_statement(kind) => break,
                _ if depth == 0 && self.peek_span().start.line > error_line => break,
                _ => {}
            }
            self.advance();
            skipped += 1;
        }
        if self.trace && skipped > 0 {
            eprintln!(
                "[PARSLEY_TRACE_PARSER] resync from {}:{} skipped {skipped} tokens",
                start.start.line, start.start.column
            );
        }
    }

    /// Runs `parse` one nesting level deeper. Past [`MAX_NESTING_DEPTH`] the construct
    /// at the cursor is reported and skipped without running `parse`, and its span is
    /// returned as the error.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Option<T>,
    ) -> Result<Option<T>, Span> {
        if self.nesting_depth >= MAX_NESTING_DEPTH {
            let span = self.skip_nested_run();
            self.error(
                "E1518",
                format!("nesting is too deep (maximum {MAX_NESTING_DEPTH} levels)"),
                span,
            );
            return Err(span);
        }
        self.nesting_depth += 1;
        let parsed = parse(self);
        self.nesting_depth = self.nesting_depth.saturating_sub(1);
        Ok(parsed)
    }

    /// Consumes tokens up to the closer of the enclosing level, keeping brackets, tags,
    /// templates and holes balanced. At balance zero it also stops at `;` or a line break.
    fn skip_nested_run(&mut self) -> Span {
        let start = self.peek_span();
        let mut balance = 0usize;
        let mut skipped = 0usize;
        loop {
            let kind = self.peek_kind();
            if kind == TokenKind::Eof {
                break;
            }
            if balance == 0
                && skipped > 0
                && (kind == TokenKind::Semicolon
                    || self.peek_span().start.line > self.previous.end.line)
            {
                break;
            }
            if opens_nested_run(kind) {
                balance += 1;
            } else if closes_nested_run(kind) {
                if balance == 0 {
                    break;
                }
                balance -= 1;
            }
            self.advance();
            skipped += 1;
        }
        if skipped == 0 {
            start
        } else {
            start.merge(self.previous)
        }
    }

    fn fill(&mut self, n: usize) {
        while self.lookahead.len() <= n {
            let token = self.lexer.next_token();
            self.lookahead.push_back(token);
        }
    }

    fn peek(&mut self) -> &Token {
        self.fill(0);
        &self.lookahead[0]
    }

    fn peek_kind(&mut self) -> TokenKind {
        self.peek().kind
    }

    fn peek_nth_kind(&mut self, n: usize) -> TokenKind {
        self.fill(n);
        self.lookahead[n].kind
    }

    fn peek_span(&mut self) -> Span {
        self.peek().span
    }

    fn advance(&mut self) -> Token {
        let token = self
            .lookahead
            .pop_front()
            .unwrap_or_else(|| self.lexer.next_token());
        if token.kind != TokenKind::Eof {
            self.previous = token.span;
            self.consumed += 1;
        }
        token
    }

    fn check(&mut self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consumes a token of `kind` or records `expected <kind> <context>, got ...`.
    fn expect(&mut self, kind: TokenKind, context: &str) -> Option<Token> {
        if self.check(kind) {
            return Some(self.advance());
        }
        self.expected(&format!("{} {context}", kind.describe()));
        None
    }

    /// Records E1501 at the next token. Illegal tokens were already reported by the lexer.
    fn expected(&mut self, what: &str) {
        let token = self.peek().clone();
        if token.kind == TokenKind::Illegal {
            return;
        }
        let message = format!("expected {what}, got {}", describe_token(&token));
        self.error("E1501", message, token.span);
    }

    fn expect_name(&mut self, context: &str) -> Option<super::ast::SpannedName> {
        let token = self.expect(TokenKind::Ident, context)?;
        Some(super::ast::SpannedName {
            name: token.text,
            span: token.span,
        })
    }

    fn error(&mut self, code: &str, message: impl Into<String>, span: Span) {
        self.push_diagnostic(Diagnostic::error(code, message, span));
    }

    fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        if self.trace {
            eprintln!(
                "[PARSLEY_TRACE_PARSER] {} at {}:{}: {}",
                diagnostic.code,
                diagnostic.line(),
                diagnostic.column(),
                diagnostic.message
            );
        }
        self.diagnostics.push(diagnostic);
    }

    fn span_from(&self, start: Span) -> Span {
        start.merge(self.previous)
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            lexer: self.lexer.checkpoint(),
            lookahead: self.lookahead.clone(),
            previous: self.previous,
            consumed: self.consumed,
            diagnostic_count: self.diagnostics.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        if self.trace {
            eprintln!(
                "[PARSLEY_TRACE_PARSER] trial parse rolled back to {}:{}",
                self.previous.end.line, self.previous.end.column
            );
        }
        self.lexer.restore(checkpoint.lexer);
        self.lookahead = checkpoint.lookahead;
        self.previous = checkpoint.previous;
        self.consumed = checkpoint.consumed;
        self.diagnostics.truncate(checkpoint.diagnostic_count);
    }
}

/// Keywords that can only begin a statement; an error never consumes them.
fn starts_statement(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Let | TokenKind::Export | TokenKind::Return | TokenKind::Check
    )
}

/// Leading keywords resynchronization stops in front of.
fn resumes_statement(kind: TokenKind) -> bool {
    starts_statement(kind)
        || matches!(
            kind,
            TokenKind::If
                | TokenKind::For
                | TokenKind::Function
                | TokenKind::Import
                | TokenKind::Try
                | TokenKind::Stop
                | TokenKind::Skip
        )
}

fn opens_nested_run(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::LBrace
            | TokenKind::HoleStart
            | TokenKind::TagOpen
            | TokenKind::BacktickStart
            | TokenKind::RawTemplateStart
            | TokenKind::PathTemplateStart
            | TokenKind::UrlTemplateStart
            | TokenKind::DatetimeTemplateStart
    )
}

fn closes_nested_run(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::RBrace
            | TokenKind::HoleEnd
            | TokenKind::TagClose
            | TokenKind::TagSelfClose
            | TokenKind::TemplateEnd
    )
}

/// Tokens an error never consumes, so the enclosing construct can still see them.
fn is_boundary(kind: TokenKind) -> bool {
    starts_statement(kind)
        || matches!(
            kind,
            TokenKind::Eof
                | TokenKind::Semicolon
                | TokenKind::RBrace
                | TokenKind::HoleEnd
                | TokenKind::TagClose
        )
}

fn describe_token(token: &Token) -> String {
    match token.kind {
        TokenKind::Ident | TokenKind::Int | TokenKind::Float => format!("'{}'", token.text),
        TokenKind::String => format!("string \"{}\"", token.text),
        TokenKind::TagOpen => format!("<{}>", token.text),
        TokenKind::TagClose => format!("</{}>", token.text),
        kind => kind.describe().to_string(),
    }
}
