use super::Parser;
use crate::diagnostics::Diagnostic;
use crate::surface::ast::{DictPatternEntry, Param, Pattern, SpannedName};
use crate::syntax::Precedence;
use crate::token::TokenKind;

impl Parser<'_> {
    /// Binding target shared by `let`, assignment, `for` headers and parameters.
    pub(super) fn parse_pattern(&mut self) -> Option<Pattern> {
        match self.peek_kind() {
            TokenKind::Ident => {
                let token = self.advance();
                if token.text == "_" {
                    return Some(Pattern::Wildcard(token.span));
                }
                Some(Pattern::Ident(SpannedName {
                    name: token.text,
                    span: token.span,
                }))
            }
            TokenKind::LBracket => self.nested(Self::parse_array_pattern).ok().flatten(),
            TokenKind::LBrace => self.nested(Self::parse_dict_pattern).ok().flatten(),
            _ => {
                self.expected("a name or destructuring pattern");
                None
            }
        }
    }

    fn parse_array_pattern(&mut self) -> Option<Pattern> {
        let open = self.advance();
        if self.check(TokenKind::RBracket) {
            let span = self.peek_span();
            self.error("E1513", "empty array destructuring pattern", span);
            return None;
        }
        let mut elements = Vec::new();
        let mut rest = None;
        while !self.check(TokenKind::RBracket) && !self.check(TokenKind::Eof) {
            if self.check(TokenKind::DotDotDot) {
                rest = Some(self.parse_rest_capture(TokenKind::RBracket)?);
                break;
            }
            elements.push(self.parse_pattern()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RBracket, "to close the array pattern")?;
        Some(Pattern::Array {
            elements,
            rest,
            span: self.span_from(open.span),
        })
    }

    fn parse_dict_pattern(&mut self) -> Option<Pattern> {
        let open = self.advance();
        if self.check(TokenKind::RBrace) {
            let span = self.peek_span();
            self.error("E1513", "empty dictionary destructuring pattern", span);
            return None;
        }
        let mut entries = Vec::new();
        let mut rest = None;
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            if self.check(TokenKind::DotDotDot) {
                rest = Some(self.parse_rest_capture(TokenKind::RBrace)?);
                break;
            }
            let key = self.expect_name("as a dictionary pattern key")?;
            let alias = if self.eat(TokenKind::As).is_some() {
                Some(self.expect_name("after 'as'")?)
            } else {
                None
            };
            let nested = if alias.is_none() && self.eat(TokenKind::Colon).is_some() {
                if !matches!(self.peek_kind(), TokenKind::LBrace | TokenKind::LBracket) {
                    self.expected("a nested pattern after ':'");
                    return None;
                }
                Some(self.parse_pattern()?)
            } else {
                None
            };
            entries.push(DictPatternEntry {
                span: self.span_from(key.span),
                key,
                alias,
                nested,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "to close the dictionary pattern")?;
        Some(Pattern::Dict {
            entries,
            rest,
            span: self.span_from(open.span),
        })
    }

    /// `...name`, which must be the last element before `close`.
    fn parse_rest_capture(&mut self, close: TokenKind) -> Option<SpannedName> {
        let dots = self.advance();
        let name = self.expect_name("after '...'")?;
        self.eat(TokenKind::Comma);
        if !self.check(close) {
            self.push_diagnostic(
                Diagnostic::error("E1513", "rest element must be last in a destructuring pattern", dots.span)
                    .with_hint(format!("move ...{} to the end", name.name)),
            );
            return None;
        }
        Some(name)
    }

    /// Parameter list after `fn(`, through the closing `)`.
    pub(super) fn parse_params(&mut self) -> Option<Vec<Param>> {
        let mut params: Vec<Param> = Vec::new();
        while !self.check(TokenKind::RParen) && !self.check(TokenKind::Eof) {
            if params.last().is_some_and(|param| param.rest) {
                let span = self.peek_span();
                self.push_diagnostic(
                    Diagnostic::error("E1513", "rest parameter must be the last parameter", span)
                        .with_hint("move the ...rest parameter to the end of the list"),
                );
                return None;
            }
            params.push(self.parse_param()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen, "to close the parameter list")?;
        Some(params)
    }

    fn parse_param(&mut self) -> Option<Param> {
        let start = self.peek_span();
        if self.eat(TokenKind::DotDotDot).is_some() {
            let name = self.expect_name("after '...'")?;
            if self.check(TokenKind::Assign) {
                let span = self.peek_span();
                self.error("E1513", "rest parameter cannot have a default value", span);
                return None;
            }
            return Some(Param {
                pattern: Pattern::Ident(name),
                default: None,
                rest: true,
                span: self.span_from(start),
            });
        }
        let pattern = self.parse_pattern()?;
        let default = if self.eat(TokenKind::Assign).is_some() {
            Some(self.parse_expression(Precedence::Lowest)?)
        } else {
            None
        };
        Some(Param {
            pattern,
            default,
            rest: false,
            span: self.span_from(start),
        })
    }
}
