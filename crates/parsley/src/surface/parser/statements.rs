use super::Parser;
use crate::diagnostics::{Diagnostic, Span};
use crate::surface::ast::{AssignTarget, ComputedBody, Expr, ExportItem, Pattern, SpannedName, Stmt, WriteMode};
use crate::syntax::{keyword_typo, Precedence};
use crate::token::TokenKind;

impl Parser<'_> {
    pub(super) fn parse_statement(&mut self) -> Option<Stmt> {
        self.nested(Self::parse_statement_at)
            .unwrap_or_else(|span| Some(Stmt::Expr(Expr::Error(span))))
    }

    fn parse_statement_at(&mut self) -> Option<Stmt> {
        let stmt = match self.peek_kind() {
            TokenKind::Let => self.parse_let(),
            TokenKind::Export => self.parse_export(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Check => self.parse_check(),
            TokenKind::Stop => Some(Stmt::Stop(self.advance().span)),
            TokenKind::Skip => Some(Stmt::Skip(self.advance().span)),
            TokenKind::LBrace => self.parse_brace_statement(),
            TokenKind::LBracket => self.parse_bracket_statement(),
            TokenKind::Ident => self.parse_ident_statement(),
            _ => self.parse_expression_statement(),
        }?;
        self.eat(TokenKind::Semicolon);
        Some(stmt)
    }

    fn parse_let(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        let pattern = self.parse_pattern()?;
        if !matches!(self.peek_kind(), TokenKind::ReadFrom | TokenKind::FetchFrom) {
            self.expect(TokenKind::Assign, "after the binding")?;
        }
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Stmt::Let {
            pattern,
            value,
            span: self.span_from(start),
        })
    }

    fn parse_ident_statement(&mut self) -> Option<Stmt> {
        match self.peek_nth_kind(1) {
            TokenKind::Assign | TokenKind::ReadFrom | TokenKind::FetchFrom => {
                let token = self.advance();
                let pattern = if token.text == "_" {
                    Pattern::Wildcard(token.span)
                } else {
                    Pattern::Ident(SpannedName {
                        name: token.text,
                        span: token.span,
                    })
                };
                self.finish_pattern_assignment(pattern)
            }
            TokenKind::Ident => {
                let typo = self.peek().text.clone();
                match keyword_typo(&typo) {
                    Some(keyword) => {
                        let span = self.advance().span;
                        self.report_keyword_typo(&typo, keyword, span);
                        None
                    }
                    None => self.parse_expression_statement(),
                }
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn report_keyword_typo(&mut self, typo: &str, keyword: &str, span: Span) {
        let hint = if keyword == "null" {
            format!("'{typo}' is not a Parsley keyword; the empty value is written null")
        } else {
            format!("did you mean '{keyword}'?")
        };
        self.push_diagnostic(
            Diagnostic::error("E1506", format!("unknown keyword '{typo}'"), span).with_hint(hint),
        );
    }

    /// `pattern = value`, `pattern <== source` or `pattern <=/= url`.
    fn finish_pattern_assignment(&mut self, pattern: Pattern) -> Option<Stmt> {
        let start = pattern.span();
        if !matches!(self.peek_kind(), TokenKind::ReadFrom | TokenKind::FetchFrom) {
            self.expect(TokenKind::Assign, "after the assignment target")?;
        }
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Stmt::Assign {
            target: AssignTarget::Pattern(pattern),
            value,
            span: self.span_from(start),
        })
    }

    /// A pattern followed by an assignment token, or `None` with the cursor untouched.
    fn try_pattern_assignment(&mut self) -> Option<Stmt> {
        let checkpoint = self.checkpoint();
        if let Some(pattern) = self.parse_pattern() {
            if matches!(
                self.peek_kind(),
                TokenKind::Assign | TokenKind::ReadFrom | TokenKind::FetchFrom
            ) {
                return self.finish_pattern_assignment(pattern);
            }
        }
        self.restore(checkpoint);
        None
    }

    /// `{` at statement start: destructuring target, dictionary literal or block.
    fn parse_brace_statement(&mut self) -> Option<Stmt> {
        if let Some(stmt) = self.try_pattern_assignment() {
            return Some(stmt);
        }
        if self.brace_starts_dict() {
            return self.parse_expression_statement();
        }
        let (statements, span) = self.parse_block("to open the block")?;
        Some(Stmt::Block { statements, span })
    }

    fn brace_starts_dict(&mut self) -> bool {
        match self.peek_nth_kind(1) {
            TokenKind::RBrace | TokenKind::LBracket => true,
            TokenKind::Ident | TokenKind::String | TokenKind::RawString => {
                self.peek_nth_kind(2) == TokenKind::Colon
            }
            kind if kind.is_keyword() => self.peek_nth_kind(2) == TokenKind::Colon,
            _ => false,
        }
    }

    fn parse_bracket_statement(&mut self) -> Option<Stmt> {
        if let Some(stmt) = self.try_pattern_assignment() {
            return Some(stmt);
        }
        self.parse_expression_statement()
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        let start = expr.span();
        let mode = match self.peek_kind() {
            TokenKind::Assign => return self.finish_place_assignment(expr),
            TokenKind::WriteTo => WriteMode::Write,
            TokenKind::AppendTo => WriteMode::Append,
            TokenKind::RemoteWrite => WriteMode::RemoteWrite,
            TokenKind::RemoteAppend => WriteMode::RemoteAppend,
            _ => return Some(Stmt::Expr(expr)),
        };
        self.advance();
        let target = self.parse_expression(Precedence::Lowest)?;
        Some(Stmt::Write {
            value: expr,
            target,
            mode,
            span: self.span_from(start),
        })
    }

    fn finish_place_assignment(&mut self, target: Expr) -> Option<Stmt> {
        let start = target.span();
        self.advance();
        if matches!(target, Expr::Index { .. } | Expr::Member { .. }) {
            let value = self.parse_expression(Precedence::Lowest)?;
            return Some(Stmt::Assign {
                target: AssignTarget::Place(target),
                value,
                span: self.span_from(start),
            });
        }
        self.push_diagnostic(
            Diagnostic::error("E1505", "invalid assignment target", start)
                .with_hint("assign to a name, a destructuring pattern, an index or a member"),
        );
        self.parse_expression(Precedence::Lowest)?;
        Some(Stmt::Expr(Expr::Error(self.span_from(start))))
    }

    fn parse_export(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        let item = match self.peek_kind() {
            TokenKind::Let => ExportItem::Binding(Box::new(self.parse_let()?)),
            TokenKind::Computed => self.parse_computed_export()?,
            TokenKind::Schema => {
                ExportItem::Schema(Box::new(self.parse_expression(Precedence::Lowest)?))
            }
            TokenKind::Ident => match self.peek_nth_kind(1) {
                TokenKind::Assign | TokenKind::ReadFrom | TokenKind::FetchFrom => {
                    ExportItem::Binding(Box::new(self.parse_ident_statement()?))
                }
                _ => ExportItem::Name(self.expect_name("after 'export'")?),
            },
            TokenKind::LBrace | TokenKind::LBracket => {
                let pattern = self.parse_pattern()?;
                ExportItem::Binding(Box::new(self.finish_pattern_assignment(pattern)?))
            }
            _ => {
                self.expected("'let', 'computed', a name or a pattern after 'export'");
                return None;
            }
        };
        Some(Stmt::Export {
            item,
            span: self.span_from(start),
        })
    }

    fn parse_computed_export(&mut self) -> Option<ExportItem> {
        self.advance();
        let name = self.expect_name("after 'computed'")?;
        let body = if self.eat(TokenKind::Assign).is_some() {
            ComputedBody::Expr(Box::new(self.parse_expression(Precedence::Lowest)?))
        } else if self.check(TokenKind::LBrace) {
            ComputedBody::Block(self.parse_block("to open the computed body")?.0)
        } else {
            self.expected("'=' or '{' after the computed name");
            return None;
        };
        Some(ExportItem::Computed { name, body })
    }

    fn parse_return(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        let value = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_expression(Precedence::Lowest)?)
        };
        Some(Stmt::Return {
            value,
            span: self.span_from(start),
        })
    }

    /// True when nothing on the current line can continue the statement.
    fn at_statement_end(&mut self) -> bool {
        let line = self.previous.end.line;
        let next = self.peek().clone();
        next.span.start.line != line
            || matches!(
                next.kind,
                TokenKind::Eof
                    | TokenKind::Semicolon
                    | TokenKind::RBrace
                    | TokenKind::HoleEnd
                    | TokenKind::TagClose
                    | TokenKind::Else
            )
    }

    fn parse_check(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::Else, "after the check condition")?;
        let fallback = self.parse_expression(Precedence::Lowest)?;
        Some(Stmt::Check {
            condition,
            fallback,
            span: self.span_from(start),
        })
    }

    /// `{ statements }`, returning the statements and the span including both braces.
    pub(super) fn parse_block(&mut self, context: &str) -> Option<(Vec<Stmt>, Span)> {
        let open = self.expect(TokenKind::LBrace, context)?;
        let statements = self.parse_statements_until(|kind| kind == TokenKind::RBrace);
        self.expect(TokenKind::RBrace, "to close the block")?;
        Some((statements, self.span_from(open.span)))
    }
}
