use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use rust_decimal::Decimal;

use super::Parser;
use crate::diagnostics::Diagnostic;
use crate::surface::ast::{DatetimeKind, Expr, Literal, NowKind, TemplateKind, TemplatePart};
use crate::syntax::Precedence;
use crate::token::{Token, TokenKind};

impl Parser<'_> {
    /// Converts the literal token at the cursor. Values that fail validation still
    /// produce a node; values that cannot be represented become [`Expr::Error`].
    pub(super) fn parse_literal(&mut self) -> Expr {
        let token = self.advance();
        let span = token.span;
        let literal = match token.kind {
            TokenKind::Int => match token.text.parse::<i64>() {
                Ok(value) => Literal::Int { value, span },
                Err(_) => {
                    self.error(
                        "E1514",
                        format!("integer literal {} is out of range", token.text),
                        span,
                    );
                    return Expr::Error(span);
                }
            },
            TokenKind::Float => match token.text.parse::<f64>() {
                Ok(value) => Literal::Float { value, span },
                Err(_) => return Expr::Error(span),
            },
            TokenKind::String | TokenKind::RawString => Literal::String {
                value: token.text,
                raw: token.kind == TokenKind::RawString,
                span,
            },
            TokenKind::True | TokenKind::False => Literal::Bool {
                value: token.kind == TokenKind::True,
                span,
            },
            TokenKind::Regex => self.regex_literal(&token),
            TokenKind::Money => match money_parts(&token.text) {
                Some((currency, amount)) => Literal::Money {
                    currency,
                    amount,
                    span,
                },
                None => return Expr::Error(span),
            },
            TokenKind::Datetime => {
                if !datetime_is_valid(&token.text) {
                    self.error(
                        "E1512",
                        format!("invalid datetime literal @{}", token.text),
                        span,
                    );
                }
                Literal::Datetime {
                    kind: DatetimeKind::classify(&token.text),
                    value: token.text,
                    span,
                }
            }
            TokenKind::DatetimeNow => Literal::Now {
                kind: NowKind::DateTime,
                span,
            },
            TokenKind::TimeNow => Literal::Now {
                kind: NowKind::Time,
                span,
            },
            TokenKind::DateNow => Literal::Now {
                kind: NowKind::Date {
                    today: token.text == "today",
                },
                span,
            },
            TokenKind::Duration => Literal::Duration {
                value: token.text,
                span,
            },
            TokenKind::Path => Literal::Path {
                value: token.text,
                span,
            },
            TokenKind::Url => {
                if let Err(err) = url::Url::parse(&token.text) {
                    self.push_diagnostic(Diagnostic::warning(
                        "E1517",
                        format!("URL literal @{} does not parse: {err}", token.text),
                        span,
                    ));
                }
                Literal::Url {
                    value: token.text,
                    span,
                }
            }
            TokenKind::StdlibPath => Literal::StdlibPath {
                value: token.text,
                span,
            },
            TokenKind::Connection => Literal::Connection {
                name: token.text,
                span,
            },
            TokenKind::Context => Literal::Context {
                name: token.text,
                span,
            },
            other => {
                self.error(
                    "E1500",
                    format!("expected a literal, got {}", other.describe()),
                    span,
                );
                return Expr::Error(span);
            }
        };
        Expr::Literal(literal)
    }

    fn regex_literal(&mut self, token: &Token) -> Literal {
        let body = token.text.strip_prefix('/').unwrap_or(&token.text);
        let (pattern, flags) = body.rsplit_once('/').unwrap_or((body, ""));
        if let Err(message) = compile_regex(pattern, flags) {
            self.error("E1511", message, token.span);
        }
        Literal::Regex {
            pattern: pattern.to_string(),
            flags: flags.to_string(),
            span: token.span,
        }
    }

    /// Template literal of any kind; the opening token is at the cursor.
    pub(super) fn parse_template(&mut self) -> Option<Expr> {
        let open = self.advance();
        let kind = match open.kind {
            TokenKind::BacktickStart => TemplateKind::Backtick,
            TokenKind::RawTemplateStart => TemplateKind::Raw,
            TokenKind::UrlTemplateStart => TemplateKind::Url,
            TokenKind::DatetimeTemplateStart => TemplateKind::Datetime,
            _ => TemplateKind::Path,
        };
        let mut parts = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::TemplateText => parts.push(TemplatePart::Text(self.advance().text)),
                TokenKind::HoleStart => {
                    self.advance();
                    let expr = self.parse_expression(Precedence::Lowest)?;
                    self.expect(TokenKind::HoleEnd, "to close the interpolation")?;
                    parts.push(TemplatePart::Hole(Box::new(expr)));
                }
                TokenKind::TemplateEnd => {
                    self.advance();
                    break;
                }
                // Unterminated template, already reported by the lexer.
                TokenKind::Illegal => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => break,
                _ => {
                    self.expected("template text or an interpolation");
                    return None;
                }
            }
        }
        Some(Expr::Template {
            kind,
            parts,
            span: self.span_from(open.span),
        })
    }
}

/// Splits normalized `CODE#amount` money text.
fn money_parts(text: &str) -> Option<(String, Decimal)> {
    let (currency, amount) = text.split_once('#')?;
    let amount = Decimal::from_str(amount).ok()?;
    Some((currency.to_string(), amount))
}

/// Compiles `pattern` with `flags` mapped to inline flags; `g` is accepted and ignored.
fn compile_regex(pattern: &str, flags: &str) -> Result<Regex, String> {
    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 's' => {
                if !inline.contains(flag) {
                    inline.push(flag);
                }
            }
            'g' => {}
            other => return Err(format!("unknown regex flag '{other}' in /{pattern}/{flags}")),
        }
    }
    let source = if inline.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{inline}){pattern}")
    };
    Regex::new(&source).map_err(|err| {
        let detail = err.to_string();
        let reason = detail
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("invalid pattern")
            .trim()
            .trim_start_matches("error: ")
            .to_string();
        format!("invalid regex /{pattern}/: {reason}")
    })
}

fn datetime_is_valid(text: &str) -> bool {
    match DatetimeKind::classify(text) {
        DatetimeKind::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok(),
        DatetimeKind::Time => ["%H:%M:%S", "%H:%M"]
            .iter()
            .any(|format| NaiveTime::parse_from_str(text, format).is_ok()),
        DatetimeKind::DateTime => {
            DateTime::parse_from_rfc3339(text).is_ok()
                || DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M%:z").is_ok()
                || [
                    "%Y-%m-%dT%H:%M:%S%.f",
                    "%Y-%m-%dT%H:%M:%S%.fZ",
                    "%Y-%m-%dT%H:%M",
                    "%Y-%m-%dT%H:%MZ",
                ]
                .iter()
                .any(|format| NaiveDateTime::parse_from_str(text, format).is_ok())
        }
    }
}
