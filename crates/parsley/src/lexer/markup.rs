use super::{LexMode, Lexer, Mark};
use crate::token::{Token, TokenKind};

fn is_tag_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '-' | '_' | ':' | '.')
}

fn is_attr_name_start(ch: char) -> bool {
    ch.is_alphabetic() || matches!(ch, '_' | '@' | ':')
}

fn is_attr_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '-' | '_' | ':' | '.' | '@')
}

impl<'a> Lexer<'a> {
    /// `<` in code position: comparison, arrow, markup declaration or a tag.
    pub(super) fn scan_angle(&mut self, start: Mark) -> Token {
        let rest = self.rest();
        if rest.starts_with("<!DOCTYPE") || rest.starts_with("<!doctype") {
            return self.scan_passthrough(start, ">");
        }
        if rest.starts_with("<![CDATA[") {
            return self.scan_passthrough(start, "]]>");
        }
        if rest.starts_with("<?") {
            return self.scan_passthrough(start, "?>");
        }
        match self.peek_char(1) {
            Some('/') if self.peek_char(2).is_some_and(|c| c.is_alphabetic() || c == '>') => {
                self.scan_close_tag(start)
            }
            Some(c) if c.is_alphabetic() => self.scan_open_tag(start),
            Some('>') => {
                self.bump();
                self.push_tag_attributes(String::new());
                self.token(TokenKind::TagOpen, String::new(), start)
            }
            _ => self.scan_operator(start),
        }
    }

    fn scan_passthrough(&mut self, start: Mark, terminator: &str) -> Token {
        match self.rest().find(terminator) {
            Some(offset) => {
                let target = self.pos + offset + terminator.len();
                self.bump_to(target);
                let text = self.slice_from(start).to_string();
                self.token(TokenKind::String, text, start)
            }
            None => {
                self.bump_to(self.source.len());
                self.illegal(
                    "E1006",
                    format!("unterminated markup declaration: expected '{terminator}'"),
                    start,
                )
            }
        }
    }

    fn scan_open_tag(&mut self, start: Mark) -> Token {
        self.bump();
        let name_start = self.pos;
        while self.current().is_some_and(is_tag_name_char) {
            self.bump();
        }
        let name = self.source[name_start..self.pos].to_string();
        self.push_tag_attributes(name.clone());
        self.token(TokenKind::TagOpen, name, start)
    }

    fn push_tag_attributes(&mut self, tag: String) {
        self.modes.push(LexMode::TagAttributes { tag });
    }

    fn scan_close_tag(&mut self, start: Mark) -> Token {
        self.bump();
        self.bump();
        let name_start = self.pos;
        while self.current().is_some_and(is_tag_name_char) {
            self.bump();
        }
        let name = self.source[name_start..self.pos].to_string();
        while self.current().is_some_and(|c| c == ' ' || c == '\t') {
            self.bump();
        }
        if self.current() != Some('>') {
            return self.illegal(
                "E1006",
                format!("malformed closing tag </{name}: expected '>'"),
                start,
            );
        }
        self.bump();
        match self.modes.last() {
            Some(LexMode::TagContent { .. }) => {
                self.modes.pop();
                self.token(TokenKind::TagClose, name, start)
            }
            _ => self.illegal("E1006", format!("unexpected closing tag </{name}>"), start),
        }
    }

    pub(super) fn scan_tag_attribute(&mut self, tag: &str) -> Token {
        while self.current().is_some_and(char::is_whitespace) {
            self.bump();
        }
        let start = self.mark();
        let Some(ch) = self.current() else {
            self.modes.pop();
            let label = if tag.is_empty() { "<>" } else { tag };
            return self.illegal("E1006", format!("unterminated tag <{label}"), start);
        };
        match ch {
            '>' => {
                self.bump();
                self.modes.pop();
                if self.raw_text_tags.iter().any(|raw| raw == tag) {
                    self.modes.push(LexMode::RawText {
                        tag: tag.to_string(),
                    });
                } else {
                    let depth = self
                        .modes
                        .iter()
                        .filter(|mode| matches!(mode, LexMode::TagContent { .. }))
                        .count()
                        + 1;
                    self.modes.push(LexMode::TagContent { depth });
                }
                self.token(TokenKind::TagOpenEnd, ">".to_string(), start)
            }
            '/' if self.peek_char(1) == Some('>') => {
                self.bump();
                self.bump();
                self.modes.pop();
                self.token(TokenKind::TagSelfClose, "/>".to_string(), start)
            }
            '=' => {
                self.bump();
                self.token(TokenKind::Assign, "=".to_string(), start)
            }
            '"' => self.scan_string(start),
            '\'' => self.scan_raw_string(start),
            '{' => {
                self.bump();
                self.modes.push(LexMode::Interpolation { braces: 0 });
                self.token(TokenKind::HoleStart, "{".to_string(), start)
            }
            '.' if self.rest().starts_with("...") => {
                self.bump_to(self.pos + 3);
                self.token(TokenKind::DotDotDot, "...".to_string(), start)
            }
            c if is_attr_name_start(c) => {
                while self.current().is_some_and(is_attr_name_char) {
                    self.bump();
                }
                let name = self.slice_from(start).to_string();
                self.token(TokenKind::AttrName, name, start)
            }
            other => {
                self.bump();
                self.illegal(
                    "E1000",
                    format!("unexpected character '{other}' in tag <{tag}>"),
                    start,
                )
            }
        }
    }

    /// Body of a raw-text element: verbatim text, `@{` holes and the closing tag.
    pub(super) fn scan_raw_text(&mut self, tag: &str) -> Token {
        let start = self.mark();
        let closer = format!("</{tag}");
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                if self.pos > start.pos {
                    return self.text_token(start);
                }
                self.modes.pop();
                return self.illegal_with_hint(
                    "E1008",
                    format!("unterminated <{tag}> element"),
                    &format!("close the element with </{tag}>"),
                    start,
                );
            }
            if rest.starts_with("@{") {
                if self.pos > start.pos {
                    return self.text_token(start);
                }
                self.bump_to(self.pos + 2);
                self.modes.push(LexMode::Interpolation { braces: 0 });
                return self.token(TokenKind::HoleStart, "@{".to_string(), start);
            }
            if rest.starts_with(&closer)
                && rest[closer.len()..]
                    .chars()
                    .next()
                    .is_some_and(|c| c == '>' || c.is_whitespace())
            {
                if self.pos > start.pos {
                    return self.text_token(start);
                }
                self.bump_to(self.pos + closer.len());
                while self.current().is_some_and(char::is_whitespace) {
                    self.bump();
                }
                if self.current() == Some('>') {
                    self.bump();
                    self.modes.pop();
                    return self.token(TokenKind::TagClose, tag.to_string(), start);
                }
                self.modes.pop();
                return self.illegal(
                    "E1006",
                    format!("malformed closing tag </{tag}: expected '>'"),
                    start,
                );
            }
            self.bump();
        }
    }

    fn text_token(&self, start: Mark) -> Token {
        let text = self.slice_from(start).to_string();
        self.token(TokenKind::RawText, text, start)
    }
}

