use super::{describe_token, is_boundary, Parser};
use crate::diagnostics::Diagnostic;
use crate::surface::ast::{
    Branch, DictEntry, DictKey, Expr, InfixOp, Pattern, PrefixOp, SpannedName,
};
use crate::syntax::{infix_precedence, Precedence};
use crate::token::TokenKind;

fn binary_op(kind: TokenKind) -> Option<InfixOp> {
    Some(match kind {
        TokenKind::Plus => InfixOp::Add,
        TokenKind::Minus => InfixOp::Sub,
        TokenKind::Asterisk => InfixOp::Mul,
        TokenKind::Slash => InfixOp::Div,
        TokenKind::Percent => InfixOp::Mod,
        TokenKind::Eq => InfixOp::Eq,
        TokenKind::NotEq => InfixOp::NotEq,
        TokenKind::Lt => InfixOp::Lt,
        TokenKind::Gt => InfixOp::Gt,
        TokenKind::LtEq => InfixOp::LtEq,
        TokenKind::GtEq => InfixOp::GtEq,
        TokenKind::And => InfixOp::And,
        TokenKind::Or => InfixOp::Or,
        TokenKind::Nullish => InfixOp::Nullish,
        TokenKind::Match => InfixOp::Match,
        TokenKind::NotMatch => InfixOp::NotMatch,
        TokenKind::In => InfixOp::In,
        TokenKind::PlusPlus => InfixOp::Concat,
        TokenKind::Range => InfixOp::Range,
        TokenKind::QueryOne => InfixOp::QueryOne,
        TokenKind::QueryMany => InfixOp::QueryMany,
        TokenKind::Execute => InfixOp::Execute,
        TokenKind::ExecuteWith => InfixOp::ExecuteWith,
        _ => return None,
    })
}

impl Parser<'_> {
    /// Precedence climbing: one prefix expression, then every infix continuation that
    /// binds tighter than `min`. Too deep a nesting yields [`Expr::Error`].
    pub(super) fn parse_expression(&mut self, min: Precedence) -> Option<Expr> {
        self.nested(|parser| parser.parse_expression_at(min))
            .unwrap_or_else(|span| Some(Expr::Error(span)))
    }

    fn parse_expression_at(&mut self, min: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;
        loop {
            let kind = self.peek_kind();
            let Some(precedence) = infix_precedence(kind) else {
                break;
            };
            if precedence <= min || !self.continues_expression(kind, &left) {
                break;
            }
            left = self.parse_infix(left, precedence)?;
        }
        Some(left)
    }

    fn continues_expression(&mut self, kind: TokenKind, left: &Expr) -> bool {
        match kind {
            TokenKind::LParen => left.is_callable(),
            TokenKind::Dot => {
                let next = self.peek_nth_kind(1);
                next == TokenKind::Ident || next.is_keyword()
            }
            // `not` on a new line starts a new statement unless it reads `not in`.
            TokenKind::Bang => {
                self.peek_nth_kind(1) == TokenKind::In
                    || self.peek_span().start.line == self.previous.end.line
            }
            _ => true,
        }
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        use TokenKind::*;
        match self.peek_kind() {
            Ident => {
                let token = self.advance();
                Some(Expr::Ident(SpannedName {
                    name: token.text,
                    span: token.span,
                }))
            }
            Int | Float | String | RawString | Regex | Money | Datetime | DatetimeNow
            | TimeNow | DateNow | Duration | Path | Url | StdlibPath | Connection | Context
            | True | False => Some(self.parse_literal()),
            BacktickStart | RawTemplateStart | PathTemplateStart | UrlTemplateStart
            | DatetimeTemplateStart => self.parse_template(),
            Schema => self.parse_schema().map(Expr::Schema),
            Table => self.parse_table(),
            Query | Insert | Update | Delete => self.parse_dsl(),
            Transaction => self.parse_transaction(),
            TagOpen => self.parse_tag().map(Expr::Tag),
            Bang | Minus => self.parse_prefix_operator(),
            ReadFrom | FetchFrom => self.parse_io_prefix(),
            LParen => self.parse_group(),
            LBracket => self.parse_array(),
            LBrace => self.parse_dict(),
            If => self.parse_if(),
            Function => self.parse_function(),
            For => self.parse_for(),
            Try => self.parse_try(),
            Import => self.parse_import(),
            Stop => Some(Expr::Stop(self.advance().span)),
            Skip => Some(Expr::Skip(self.advance().span)),
            Illegal => Some(Expr::Error(self.advance().span)),
            Eof | TemplateText | TemplateEnd | HoleStart | HoleEnd | TagOpenEnd | TagSelfClose
            | TagClose | AttrName | RawText => self.unexpected(),
            Let | In | As | Else | Return | Export | Check | Via | Is | Computed => {
                self.unexpected()
            }
            Assign | Plus | Asterisk | Slash | Percent | Lt | Gt | LtEq | GtEq | Eq | NotEq
            | And | Or | Nullish | Question | Match | NotMatch | PlusPlus | Range | DotDotDot => {
                self.unexpected()
            }
            WriteTo | AppendTo | RemoteWrite | RemoteAppend | QueryOne | QueryMany | Execute
            | ExecuteWith | PipeWrite | ReturnOne | ReturnMany | ReturnOneExplicit
            | ReturnManyExplicit | ExecCount | ArrowPull => self.unexpected(),
            Comma | Semicolon | Colon | Dot | RParen | RBrace | RBracket => self.unexpected(),
        }
    }

    /// E1500 at a token no expression can start with. Boundary tokens stay in place.
    fn unexpected(&mut self) -> Option<Expr> {
        let token = self.peek().clone();
        self.error(
            "E1500",
            format!("unexpected {}", describe_token(&token)),
            token.span,
        );
        if !is_boundary(token.kind) {
            self.advance();
        }
        None
    }

    fn parse_infix(&mut self, left: Expr, precedence: Precedence) -> Option<Expr> {
        let operator = self.advance();
        let start = left.span();
        match operator.kind {
            TokenKind::LParen => {
                let args = self.parse_comma_list(TokenKind::RParen, "to close the arguments")?;
                Some(Expr::Call {
                    callee: Box::new(left),
                    args,
                    span: self.span_from(start),
                })
            }
            TokenKind::LBracket => self.parse_index(left),
            TokenKind::Dot => {
                let name = self.advance();
                Some(Expr::Member {
                    target: Box::new(left),
                    property: SpannedName {
                        name: name.text,
                        span: name.span,
                    },
                    span: self.span_from(start),
                })
            }
            TokenKind::Bang => {
                if self.eat(TokenKind::In).is_none() {
                    self.push_diagnostic(
                        Diagnostic::error("E1508", "'not' here must be followed by 'in'", operator.span)
                            .with_hint("use `x not in xs` or start a new statement with `not`"),
                    );
                    return None;
                }
                self.finish_infix(InfixOp::NotIn, left, precedence)
            }
            TokenKind::Is => {
                let op = if self.eat(TokenKind::Bang).is_some() {
                    InfixOp::IsNot
                } else {
                    InfixOp::Is
                };
                self.finish_infix(op, left, precedence)
            }
            kind => match binary_op(kind) {
                Some(op) => self.finish_infix(op, left, precedence),
                None => {
                    self.error(
                        "E1500",
                        format!("unexpected {} after an expression", kind.describe()),
                        operator.span,
                    );
                    None
                }
            },
        }
    }

    fn finish_infix(&mut self, op: InfixOp, left: Expr, precedence: Precedence) -> Option<Expr> {
        let right = self.parse_expression(precedence)?;
        let span = left.span().merge(right.span());
        Some(Expr::Infix {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        })
    }

    /// `[i]`, `[?i]`, `[i:j]`, `[:j]` and `[i:]` after `target`; the `[` is consumed.
    fn parse_index(&mut self, target: Expr) -> Option<Expr> {
        let start = target.span();
        let optional = self.eat(TokenKind::Question).is_some();
        let first = if self.check(TokenKind::Colon) {
            None
        } else {
            Some(self.parse_expression(Precedence::Lowest)?)
        };
        if !optional && self.eat(TokenKind::Colon).is_some() {
            let end = if self.check(TokenKind::RBracket) {
                None
            } else {
                Some(Box::new(self.parse_expression(Precedence::Lowest)?))
            };
            self.expect(TokenKind::RBracket, "to close the slice")?;
            return Some(Expr::Slice {
                target: Box::new(target),
                start: first.map(Box::new),
                end,
                span: self.span_from(start),
            });
        }
        let Some(index) = first else {
            self.expected("an index expression");
            return None;
        };
        self.expect(TokenKind::RBracket, "to close the index")?;
        Some(Expr::Index {
            target: Box::new(target),
            index: Box::new(index),
            optional,
            span: self.span_from(start),
        })
    }

    /// Comma separated expressions up to `close`; a trailing comma is allowed.
    fn parse_comma_list(&mut self, close: TokenKind, context: &str) -> Option<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.check(close) && !self.check(TokenKind::Eof) {
            items.push(self.parse_expression(Precedence::Lowest)?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(close, context)?;
        Some(items)
    }

    fn parse_prefix_operator(&mut self) -> Option<Expr> {
        let token = self.advance();
        let op = if token.kind == TokenKind::Bang {
            PrefixOp::Not
        } else {
            PrefixOp::Neg
        };
        let operand = self.parse_expression(Precedence::Prefix)?;
        let span = token.span.merge(operand.span());
        Some(Expr::Prefix {
            op,
            operand: Box::new(operand),
            span,
        })
    }

    /// `<== source` reads a file, `<=/= url` fetches over the network.
    fn parse_io_prefix(&mut self) -> Option<Expr> {
        let token = self.advance();
        let source = Box::new(self.parse_expression(Precedence::Prefix)?);
        let span = self.span_from(token.span);
        Some(if token.kind == TokenKind::ReadFrom {
            Expr::Read { source, span }
        } else {
            Expr::Fetch { source, span }
        })
    }

    fn parse_group(&mut self) -> Option<Expr> {
        let open = self.advance();
        let inner = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::RParen, "to close the group")?;
        Some(Expr::Group {
            inner: Box::new(inner),
            span: self.span_from(open.span),
        })
    }

    fn parse_array(&mut self) -> Option<Expr> {
        let open = self.advance();
        let items = self.parse_comma_list(TokenKind::RBracket, "to close the array")?;
        Some(Expr::Array {
            items,
            span: self.span_from(open.span),
        })
    }

    pub(super) fn parse_dict(&mut self) -> Option<Expr> {
        let open = self.advance();
        let mut entries = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            entries.push(self.parse_dict_entry()?);
            if self.eat(TokenKind::Comma).is_none() && self.eat(TokenKind::Semicolon).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "to close the dictionary")?;
        Some(Expr::Dict {
            entries,
            span: self.span_from(open.span),
        })
    }

    fn parse_dict_entry(&mut self) -> Option<DictEntry> {
        let token = self.peek().clone();
        let key = match token.kind {
            TokenKind::Ident => {
                self.advance();
                DictKey::Ident(SpannedName {
                    name: token.text,
                    span: token.span,
                })
            }
            kind if kind.is_keyword() => {
                self.advance();
                DictKey::Ident(SpannedName {
                    name: token.text,
                    span: token.span,
                })
            }
            TokenKind::String | TokenKind::RawString => {
                self.advance();
                DictKey::String {
                    value: token.text,
                    span: token.span,
                }
            }
            TokenKind::LBracket => {
                self.advance();
                let key = self.parse_expression(Precedence::Lowest)?;
                self.expect(TokenKind::RBracket, "to close the computed key")?;
                DictKey::Computed(Box::new(key))
            }
            _ => {
                self.expected("a dictionary key");
                return None;
            }
        };
        self.expect(TokenKind::Colon, "after the dictionary key")?;
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(DictEntry {
            key,
            value,
            span: self.span_from(token.span),
        })
    }

    fn parse_if(&mut self) -> Option<Expr> {
        let start = self.advance().span;
        let parenthesized = self.eat(TokenKind::LParen).is_some();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if let Some(assign) = self.eat(TokenKind::Assign) {
            self.push_diagnostic(
                Diagnostic::error("E1510", "assignment in condition; did you mean '=='?", assign.span)
                    .with_hint("compare with '==' inside an if condition"),
            );
            self.parse_expression(Precedence::Lowest)?;
        }
        if parenthesized {
            self.expect(TokenKind::RParen, "to close the if condition")?;
        } else if !self.check(TokenKind::LBrace) {
            let span = self.peek_span();
            self.push_diagnostic(
                Diagnostic::error("E1509", "if without parentheses requires braces", span)
                    .with_hint("write `if (cond) expr` or `if cond { ... }`"),
            );
            return None;
        }
        let consequence = self.parse_branch()?;
        let alternative = if self.eat(TokenKind::Else).is_some() {
            if self.check(TokenKind::If) {
                let chained = self
                    .nested(Self::parse_if)
                    .unwrap_or_else(|span| Some(Expr::Error(span)))?;
                Some(Branch::Expr(Box::new(chained)))
            } else {
                Some(self.parse_branch()?)
            }
        } else {
            None
        };
        Some(Expr::If {
            condition: Box::new(condition),
            consequence,
            alternative,
            span: self.span_from(start),
        })
    }

    fn parse_branch(&mut self) -> Option<Branch> {
        match self.peek_kind() {
            TokenKind::LBrace => Some(Branch::Block(self.parse_block("to open the branch")?.0)),
            TokenKind::Return | TokenKind::Check => {
                Some(Branch::Stmt(Box::new(self.parse_statement()?)))
            }
            _ => Some(Branch::Expr(Box::new(
                self.parse_expression(Precedence::Lowest)?,
            ))),
        }
    }

    fn parse_function(&mut self) -> Option<Expr> {
        let start = self.advance().span;
        let params = if self.eat(TokenKind::LParen).is_some() {
            self.parse_params()?
        } else {
            Vec::new()
        };
        let (body, _) = self.parse_block("to open the function body")?;
        Some(Expr::Function {
            params,
            body,
            span: self.span_from(start),
        })
    }

    fn parse_for(&mut self) -> Option<Expr> {
        let start = self.advance().span;
        let parenthesized = self.eat(TokenKind::LParen).is_some();
        let checkpoint = self.checkpoint();
        let Some((key, value)) = self.parse_for_binding() else {
            self.restore(checkpoint);
            if !parenthesized {
                self.expected("'(' or a loop variable after 'for'");
                return None;
            }
            let iterable = self.parse_expression(Precedence::Lowest)?;
            self.expect(TokenKind::RParen, "to close the for source")?;
            let mapper = self.parse_expression(Precedence::Lowest)?;
            return Some(Expr::ForMap {
                iterable: Box::new(iterable),
                mapper: Box::new(mapper),
                span: self.span_from(start),
            });
        };
        let iterable = self.parse_expression(Precedence::Lowest)?;
        if parenthesized {
            self.expect(TokenKind::RParen, "to close the for header")?;
        }
        let (body, _) = self.parse_block("to open the loop body")?;
        Some(Expr::For {
            key,
            value,
            iterable: Box::new(iterable),
            body,
            span: self.span_from(start),
        })
    }

    /// `x in`, `k, v in`; `None` when the header is not a binding form.
    fn parse_for_binding(&mut self) -> Option<(Option<Pattern>, Pattern)> {
        let first = self.parse_pattern()?;
        if self.eat(TokenKind::Comma).is_some() {
            let second = self.parse_pattern()?;
            self.eat(TokenKind::In)?;
            return Some((Some(first), second));
        }
        self.eat(TokenKind::In)?;
        Some((None, first))
    }

    fn parse_try(&mut self) -> Option<Expr> {
        let start = self.advance().span;
        let call = self.parse_expression(Precedence::Prefix)?;
        if !call.is_call() {
            self.push_diagnostic(
                Diagnostic::error("E1507", "try requires a function or method call", call.span())
                    .with_hint("write `try f(x)` or `try obj.method(x)`"),
            );
        }
        Some(Expr::Try {
            call: Box::new(call),
            span: self.span_from(start),
        })
    }

    fn parse_import(&mut self) -> Option<Expr> {
        let start = self.advance().span;
        let source = match self.peek_kind() {
            TokenKind::StdlibPath | TokenKind::Path | TokenKind::Url => self.parse_literal(),
            TokenKind::PathTemplateStart => self.parse_template()?,
            _ => {
                self.expected("a module path after 'import'");
                return None;
            }
        };
        let alias = if self.eat(TokenKind::As).is_some() {
            Some(self.expect_name("after 'as'")?)
        } else {
            None
        };
        Some(Expr::Import {
            source: Box::new(source),
            alias,
            span: self.span_from(start),
        })
    }
}
