use super::Parser;
use crate::diagnostics::Diagnostic;
use crate::surface::ast::{AttrValue, Attribute, Expr, SpannedName, Stmt, TagNode};
use crate::syntax::{is_void_element, Precedence};
use crate::token::{Token, TokenKind};

impl Parser<'_> {
    /// A tag from its `TagOpen` token through `/>` or the matching close tag.
    pub(super) fn parse_tag(&mut self) -> Option<TagNode> {
        let open = self.advance();
        let mut attributes = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::AttrName => attributes.push(self.parse_attribute()?),
                TokenKind::DotDotDot => attributes.push(self.parse_spread_attribute()?),
                TokenKind::TagSelfClose => {
                    self.advance();
                    return Some(TagNode {
                        name: open.text.clone(),
                        attributes,
                        children: None,
                        span: self.span_from(open.span),
                    });
                }
                TokenKind::TagOpenEnd => {
                    self.advance();
                    break;
                }
                TokenKind::Illegal => {
                    self.advance();
                }
                // Unterminated tag, reported by the lexer.
                TokenKind::Eof => {
                    return Some(TagNode {
                        name: open.text.clone(),
                        attributes,
                        children: None,
                        span: self.span_from(open.span),
                    });
                }
                _ => {
                    self.expected("an attribute, '>' or '/>'");
                    return None;
                }
            }
        }

        let raw = self.options.raw_text_tags.iter().any(|tag| *tag == open.text);
        let children = if raw {
            self.parse_raw_children()
        } else {
            self.parse_statements_until(|kind| kind == TokenKind::TagClose)
        };
        self.close_tag(&open);
        Some(TagNode {
            name: open.text.clone(),
            attributes,
            children: Some(children),
            span: self.span_from(open.span),
        })
    }

    fn parse_attribute(&mut self) -> Option<Attribute> {
        let token = self.advance();
        let name = SpannedName {
            name: token.text,
            span: token.span,
        };
        let value = if self.eat(TokenKind::Assign).is_some() {
            Some(match self.peek_kind() {
                TokenKind::String | TokenKind::RawString => AttrValue::Literal(self.parse_literal()),
                TokenKind::RawTemplateStart => AttrValue::Literal(self.parse_template()?),
                TokenKind::HoleStart => AttrValue::Hole(self.parse_hole("attribute expression")?),
                _ => {
                    self.expected("an attribute value");
                    return None;
                }
            })
        } else {
            None
        };
        Some(Attribute::Named {
            span: self.span_from(name.span),
            name,
            value,
        })
    }

    /// `...props` or `...{expr}` inside an opening tag.
    fn parse_spread_attribute(&mut self) -> Option<Attribute> {
        let dots = self.advance();
        let expr = match self.peek_kind() {
            TokenKind::AttrName => {
                let token = self.advance();
                Expr::Ident(SpannedName {
                    name: token.text,
                    span: token.span,
                })
            }
            TokenKind::HoleStart => self.parse_hole("spread expression")?,
            _ => {
                self.expected("a name or {expression} after '...'");
                return None;
            }
        };
        Some(Attribute::Spread {
            expr,
            span: self.span_from(dots.span),
        })
    }

    fn parse_hole(&mut self, what: &str) -> Option<Expr> {
        self.advance();
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::HoleEnd, &format!("to close the {what}"))?;
        Some(expr)
    }

    /// Body of a raw-text element: text chunks and `@{ ... }` interpolations.
    fn parse_raw_children(&mut self) -> Vec<Stmt> {
        let mut children = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::RawText => {
                    let token = self.advance();
                    children.push(Stmt::Expr(Expr::Text {
                        value: token.text,
                        span: token.span,
                    }));
                }
                TokenKind::HoleStart => {
                    let open = self.advance();
                    let statements = self.parse_statements_until(|kind| kind == TokenKind::HoleEnd);
                    if self.expect(TokenKind::HoleEnd, "to close the interpolation").is_none() {
                        break;
                    }
                    children.push(Stmt::Expr(Expr::Interpolation {
                        statements,
                        span: self.span_from(open.span),
                    }));
                }
                _ => break,
            }
        }
        children
    }

    /// Consumes the close tag for `open` or reports why it is missing.
    fn close_tag(&mut self, open: &Token) {
        let name = open.text.as_str();
        let label = if name.is_empty() { "<>" } else { name };
        match self.peek_kind() {
            TokenKind::TagClose if self.peek().text == name => {
                self.advance();
            }
            // A void element left open: the close tag belongs to an enclosing element.
            TokenKind::TagClose if is_void_element(name) => self.void_not_closed(open),
            TokenKind::TagClose => {
                let close = self.advance();
                let found = if close.text.is_empty() { "</>".to_string() } else { format!("</{}>", close.text) };
                self.push_diagnostic(
                    Diagnostic::error(
                        "E1502",
                        format!("mismatched tags: opening <{label}> but closing {found}"),
                        close.span,
                    )
                    .with_label(format!("<{label}> opened here"), open.span),
                );
            }
            // Unterminated raw-text body, reported by the lexer.
            TokenKind::Illegal => {
                self.advance();
            }
            _ if is_void_element(name) => self.void_not_closed(open),
            _ => {
                let found = self.peek().clone();
                self.push_diagnostic(
                    Diagnostic::error(
                        "E1503",
                        format!(
                            "expected closing tag </{}>, got {}",
                            name,
                            found.kind.describe()
                        ),
                        found.span,
                    )
                    .with_label(format!("<{label}> opened here"), open.span),
                );
            }
        }
    }

    fn void_not_closed(&mut self, open: &Token) {
        let name = &open.text;
        self.push_diagnostic(
            Diagnostic::error(
                "E1504",
                format!("<{name}> is a void element and must be self-closing"),
                open.span,
            )
            .with_hint(format!("write <{name}/>")),
        );
    }
}
