//! `@` literal families.
//!
//! Detection runs in a fixed order over the text after `@`; the first family that
//! claims the lookahead wins. Keywords only match when no identifier character follows.

use super::{LexMode, Lexer, Mark, TemplateKind};
use crate::syntax::{
    is_ident_continue, CONNECTION_KEYWORDS, CONTEXT_KEYWORDS, DSL_KEYWORDS, NOW_KEYWORDS,
    STDIO_ALIASES, STDLIB_ROOTS,
};
use crate::token::{Token, TokenKind};

const SCHEME_LOOKAHEAD: usize = 20;

fn is_literal_delimiter(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, ')' | ']' | '}' | ',' | ';')
}

/// True when `text` starts with `keyword` and no identifier character follows it.
fn keyword_at(text: &str, keyword: &str) -> bool {
    text.starts_with(keyword)
        && !text[keyword.len()..]
            .chars()
            .next()
            .is_some_and(is_ident_continue)
}

/// True when a `scheme://` marker appears within the first few characters.
fn has_scheme(text: &str, allow_path_chars: bool) -> bool {
    for (index, ch) in text.char_indices().take(SCHEME_LOOKAHEAD) {
        if ch == ':' {
            return index > 0 && text[index..].starts_with("://");
        }
        let scheme_char = ch.is_ascii_alphabetic() || ch == '+' || ch == '-';
        let path_char = allow_path_chars && matches!(ch, '.' | '/' | '~');
        if !scheme_char && !path_char {
            return false;
        }
    }
    false
}

fn leading_digits(text: &str) -> (usize, Option<char>) {
    let count = text.chars().take_while(|c| c.is_ascii_digit()).count();
    (count, text[count..].chars().next())
}

fn looks_like_datetime(text: &str) -> bool {
    match leading_digits(text) {
        (4, Some('-')) => true,
        (1 | 2, Some(':')) => true,
        _ => false,
    }
}

impl<'a> Lexer<'a> {
    pub(super) fn scan_at_literal(&mut self, start: Mark) -> Token {
        let after = &self.rest()[1..];

        if after.starts_with('(') {
            return self.scan_at_template(start, &after[1..]);
        }
        for root in STDLIB_ROOTS {
            if after.starts_with(&format!("{root}/")) || keyword_at(after, root) {
                self.bump();
                let text = self.read_literal_body();
                return self.token(TokenKind::StdlibPath, text, start);
            }
        }
        for (keyword, kind) in NOW_KEYWORDS {
            if keyword_at(after, keyword) {
                return self.keyword_literal(start, keyword, *kind);
            }
        }
        for keyword in CONNECTION_KEYWORDS {
            if keyword_at(after, keyword) {
                return self.keyword_literal(start, keyword, TokenKind::Connection);
            }
        }
        for keyword in CONTEXT_KEYWORDS {
            if keyword_at(after, keyword) {
                return self.keyword_literal(start, keyword, TokenKind::Context);
            }
        }
        for (keyword, kind) in DSL_KEYWORDS {
            if keyword_at(after, keyword) {
                let token = self.keyword_literal(start, keyword, *kind);
                let takes_body = matches!(
                    kind,
                    TokenKind::Query | TokenKind::Insert | TokenKind::Update | TokenKind::Delete
                );
                if takes_body && self.rest().trim_start().starts_with('(') {
                    self.modes.push(LexMode::DslBody);
                }
                return token;
            }
        }

        if let Some(rest) = after.strip_prefix('-') {
            let next = rest.chars().next();
            if !next.is_some_and(|c| c.is_alphanumeric() || matches!(c, '/' | '-' | '_' | '~')) {
                return self.keyword_literal(start, "-", TokenKind::Path);
            }
        }
        for alias in STDIO_ALIASES {
            if keyword_at(after, alias) {
                return self.keyword_literal(start, alias, TokenKind::Path);
            }
        }

        if has_scheme(after, false) {
            self.bump();
            let text = self.read_literal_body();
            return self.token(TokenKind::Url, text, start);
        }

        if after.starts_with('/') || after.starts_with('.') || after.starts_with("~/") {
            self.bump();
            let text = self.read_literal_body();
            return self.token(TokenKind::Path, text, start);
        }

        if after.starts_with('-') && after[1..].starts_with(|c: char| c.is_ascii_digit()) {
            return self.scan_duration(start);
        }
        if looks_like_datetime(after) {
            return self.scan_datetime(start);
        }
        if after.starts_with(|c: char| c.is_ascii_digit()) {
            return self.scan_duration(start);
        }

        self.bump();
        let word_start = self.pos;
        while self.current().is_some_and(is_ident_continue) {
            self.bump();
        }
        if self.pos == word_start {
            return self.illegal_with_hint(
                "E1005",
                "expected a literal after '@'".to_string(),
                "write a path like @./file, a URL like @https://..., a date like @2024-01-31 or a duration like @2h",
                start,
            );
        }
        let word = self.source[word_start..self.pos].to_string();
        self.illegal("E1005", format!("unrecognized @-literal '@{word}'"), start)
    }

    fn keyword_literal(&mut self, start: Mark, keyword: &str, kind: TokenKind) -> Token {
        self.bump_to(self.pos + 1 + keyword.len());
        self.token(kind, keyword.to_string(), start)
    }

    /// Reads the rest of a path, URL or stdlib literal after `@`.
    fn read_literal_body(&mut self) -> String {
        let body_start = self.pos;
        while self.current().is_some_and(|ch| !is_literal_delimiter(ch)) {
            self.bump();
        }
        self.source[body_start..self.pos].to_string()
    }

    /// Balanced `( ... )` after a query keyword, kept verbatim as one `RawText` token
    /// holding the text between the parentheses. Quoted text may contain parentheses.
    pub(super) fn scan_dsl_body(&mut self) -> Token {
        self.modes.pop();
        while self.current().is_some_and(char::is_whitespace) {
            self.bump();
        }
        let start = self.mark();
        self.bump();
        let body_start = self.pos;
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        while let Some(ch) = self.current() {
            match (quote, ch) {
                (Some(_), '\\') => {
                    self.bump();
                }
                (Some(open), c) if c == open => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'' | '`') => quote = Some(ch),
                (None, '(') => depth += 1,
                (None, ')') if depth == 0 => {
                    let body = self.source[body_start..self.pos].to_string();
                    self.bump();
                    return self.token(TokenKind::RawText, body, start);
                }
                (None, ')') => depth -= 1,
                (None, _) => {}
            }
            self.bump();
        }
        self.illegal_with_hint(
            "E1009",
            "unterminated query body".to_string(),
            "close the body with ')'",
            start,
        )
    }

    /// `@(` opens a URL, datetime or path template depending on its first characters.
    fn scan_at_template(&mut self, start: Mark, inner: &str) -> Token {
        let kind = if has_scheme(inner, true) {
            TemplateKind::Url
        } else if looks_like_datetime(inner) || hole_then_date_separator(inner) {
            TemplateKind::Datetime
        } else {
            TemplateKind::Path
        };
        self.bump_to(self.pos + 2);
        self.modes.push(LexMode::Template { kind, parens: 0 });
        let token_kind = match kind {
            TemplateKind::Url => TokenKind::UrlTemplateStart,
            TemplateKind::Datetime => TokenKind::DatetimeTemplateStart,
            TemplateKind::Path | TemplateKind::Backtick | TemplateKind::Raw => {
                TokenKind::PathTemplateStart
            }
        };
        self.token(token_kind, "@(".to_string(), start)
    }

    fn scan_duration(&mut self, start: Mark) -> Token {
        self.bump();
        let body_start = self.pos;
        if self.current() == Some('-') {
            self.bump();
        }
        while self.current().is_some_and(|c| c.is_ascii_digit()) {
            self.eat_digits();
            if self.rest().starts_with("mo") {
                self.bump();
                self.bump();
                continue;
            }
            match self.current() {
                Some('y' | 'w' | 'd' | 'h' | 'm' | 's') => {
                    self.bump();
                }
                Some(c) if c.is_alphabetic() => {
                    self.bump();
                    return self.illegal(
                        "E1005",
                        format!("invalid duration unit '{c}'"),
                        start,
                    );
                }
                _ => {
                    let message = format!(
                        "duration '@{}' is missing a unit",
                        &self.source[body_start..self.pos]
                    );
                    return self.illegal_with_hint(
                        "E1005",
                        message,
                        "units are y, mo, w, d, h, m and s, e.g. @1h30m",
                        start,
                    );
                }
            }
        }
        if let Some(c) = self.current().filter(|c| c.is_alphabetic()) {
            while self.current().is_some_and(is_ident_continue) {
                self.bump();
            }
            return self.illegal("E1005", format!("invalid duration unit '{c}'"), start);
        }
        let text = self.source[body_start..self.pos].to_string();
        self.token(TokenKind::Duration, text, start)
    }

    fn scan_datetime(&mut self, start: Mark) -> Token {
        self.bump();
        let body_start = self.pos;
        let (digits, next) = leading_digits(self.rest());
        self.eat_digits();
        if digits <= 2 && next == Some(':') {
            self.bump();
            self.eat_digits();
            if self.current() == Some(':') {
                self.bump();
                self.eat_digits();
            }
        } else {
            while self
                .current()
                .is_some_and(|c| c == '-' || c.is_ascii_digit())
            {
                self.bump();
            }
            if self.current() == Some('T') {
                self.bump();
                while self
                    .current()
                    .is_some_and(|c| c == ':' || c.is_ascii_digit())
                {
                    self.bump();
                }
            }
            if self.current() == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                self.bump();
                self.eat_digits();
            }
            match self.current() {
                Some('Z') => {
                    self.bump();
                }
                Some('+' | '-') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.bump();
                    while self
                        .current()
                        .is_some_and(|c| c == ':' || c.is_ascii_digit())
                    {
                        self.bump();
                    }
                }
                _ => {}
            }
        }
        let text = self.source[body_start..self.pos].to_string();
        self.token(TokenKind::Datetime, text, start)
    }
}

/// `@({year}-12-25)` style: a leading hole directly followed by a date or time separator.
fn hole_then_date_separator(inner: &str) -> bool {
    inner.starts_with('{')
        && inner
            .find('}')
            .and_then(|close| inner[close + 1..].chars().next())
            .is_some_and(|c| c == '-' || c == ':')
}
