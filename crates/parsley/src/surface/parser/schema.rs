//! Data-layer forms introduced by `@`: schemas, tables, query bodies and transactions.

use super::Parser;
use crate::surface::ast::{DictKey, DslKind, Expr, SchemaDecl, SchemaField, SpannedName};
use crate::syntax::Precedence;
use crate::token::TokenKind;

impl Parser<'_> {
    pub(super) fn parse_schema(&mut self) -> Option<SchemaDecl> {
        let start = self.advance().span;
        let name = self.expect_name("after @schema")?;
        self.expect(TokenKind::LBrace, "to open the schema body")?;
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            fields.push(self.parse_schema_field(&name.name)?);
            self.eat(TokenKind::Comma);
        }
        self.expect(TokenKind::RBrace, "to close the schema body")?;
        Some(SchemaDecl {
            name,
            fields,
            span: self.span_from(start),
        })
    }

    /// `name: type? enum[..] (options) = default | {meta} via fk`, every part after the
    /// type optional but in this order.
    fn parse_schema_field(&mut self, schema: &str) -> Option<SchemaField> {
        let Some(name) = self.word() else {
            self.schema_error(format!("expected a field name in @schema {schema}"));
            return None;
        };
        self.expect(TokenKind::Colon, "after the field name")?;
        let is_array = self.eat(TokenKind::LBracket).is_some();
        let Some(type_name) = self.word() else {
            self.schema_error(format!(
                "expected a type for field '{}' in @schema {schema}",
                name.name
            ));
            return None;
        };
        if is_array {
            self.expect(TokenKind::RBracket, "to close the array type")?;
        }
        let nullable = self.eat(TokenKind::Question).is_some();

        let mut enum_values = Vec::new();
        if type_name.name == "enum" && self.eat(TokenKind::LBracket).is_some() {
            while !self.check(TokenKind::RBracket) && !self.check(TokenKind::Eof) {
                let Some(value) = self.eat(TokenKind::String) else {
                    self.schema_error(format!(
                        "enum values of field '{}' must be strings",
                        name.name
                    ));
                    return None;
                };
                enum_values.push(value.text);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.expect(TokenKind::RBracket, "to close the enum values")?;
        }

        let mut options = Vec::new();
        if self.eat(TokenKind::LParen).is_some() {
            while !self.check(TokenKind::RParen) && !self.check(TokenKind::Eof) {
                let Some(option) = self.word() else {
                    self.schema_error(format!("expected a type option for field '{}'", name.name));
                    return None;
                };
                let value = if self.eat(TokenKind::Colon).is_some() {
                    Some(self.parse_expression(Precedence::Lowest)?)
                } else {
                    None
                };
                options.push((option, value));
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "to close the type options")?;
        }

        let default = if self.eat(TokenKind::Assign).is_some() {
            Some(self.parse_expression(Precedence::LogicOr)?)
        } else {
            None
        };
        let metadata = if self.check(TokenKind::Or) && self.peek().text == "|" {
            self.advance();
            if !self.check(TokenKind::LBrace) {
                self.schema_error(format!(
                    "expected a {{...}} metadata dictionary after '|' on field '{}'",
                    name.name
                ));
                return None;
            }
            Some(self.parse_dict()?)
        } else {
            None
        };
        let via = if self.eat(TokenKind::Via).is_some() {
            Some(self.expect_name("after 'via'")?)
        } else {
            None
        };
        Some(SchemaField {
            span: self.span_from(name.span),
            name,
            type_name,
            is_array,
            nullable,
            enum_values,
            options,
            default,
            metadata,
            via,
        })
    }

    /// An identifier or keyword used as a name.
    fn word(&mut self) -> Option<SpannedName> {
        let kind = self.peek_kind();
        if kind != TokenKind::Ident && !kind.is_keyword() {
            return None;
        }
        let token = self.advance();
        Some(SpannedName {
            name: token.text,
            span: token.span,
        })
    }

    fn schema_error(&mut self, message: String) {
        let span = self.peek_span();
        self.error("E1516", message, span);
    }

    pub(super) fn parse_table(&mut self) -> Option<Expr> {
        let start = self.advance().span;
        let schema = if self.eat(TokenKind::LParen).is_some() {
            let name = self.expect_name("as the @table schema")?;
            self.expect(TokenKind::RParen, "after the @table schema")?;
            Some(name)
        } else {
            None
        };
        self.expect(TokenKind::LBracket, "to open the @table rows")?;
        let mut rows = Vec::new();
        let mut columns: Vec<String> = Vec::new();
        while !self.check(TokenKind::RBracket) && !self.check(TokenKind::Eof) {
            let index = rows.len() + 1;
            if !self.check(TokenKind::LBrace) {
                let found = self.peek().clone();
                self.error(
                    "E1515",
                    format!(
                        "@table row {index}: expected dictionary literal, got {}",
                        found.kind.describe()
                    ),
                    found.span,
                );
                return None;
            }
            let row = self.parse_dict()?;
            let keys = row_keys(&row);
            if index == 1 {
                columns = keys;
            } else {
                let missing: Vec<&str> = columns
                    .iter()
                    .filter(|column| !keys.contains(*column))
                    .map(String::as_str)
                    .collect();
                if !missing.is_empty() {
                    self.error(
                        "E1515",
                        format!("@table row {index}: missing columns: {}", missing.join(", ")),
                        row.span(),
                    );
                }
                let extra: Vec<&str> = keys
                    .iter()
                    .filter(|key| !columns.contains(*key))
                    .map(String::as_str)
                    .collect();
                if !extra.is_empty() {
                    self.error(
                        "E1515",
                        format!(
                            "@table row {index}: extra columns not in first row: {}",
                            extra.join(", ")
                        ),
                        row.span(),
                    );
                }
            }
            rows.push(row);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RBracket, "to close the @table rows")?;
        Some(Expr::Table {
            schema,
            rows,
            span: self.span_from(start),
        })
    }

    /// `@query(...)` and the mutation forms; the lexer hands over the body verbatim.
    pub(super) fn parse_dsl(&mut self) -> Option<Expr> {
        let keyword = self.advance();
        let kind = match keyword.kind {
            TokenKind::Query => DslKind::Query,
            TokenKind::Insert => DslKind::Insert,
            TokenKind::Update => DslKind::Update,
            _ => DslKind::Delete,
        };
        let body = self.expect(
            TokenKind::RawText,
            &format!("(query body) after @{}", kind.keyword()),
        )?;
        Some(Expr::Dsl {
            kind,
            body: body.text.trim().to_string(),
            span: self.span_from(keyword.span),
        })
    }

    pub(super) fn parse_transaction(&mut self) -> Option<Expr> {
        let start = self.advance().span;
        let (statements, _) = self.parse_block("after @transaction")?;
        Some(Expr::Transaction {
            statements,
            span: self.span_from(start),
        })
    }
}

/// Column names of a table row in source order; computed keys have no static name.
fn row_keys(row: &Expr) -> Vec<String> {
    let Expr::Dict { entries, .. } = row else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match &entry.key {
            DictKey::Ident(name) => Some(name.name.clone()),
            DictKey::String { value, .. } => Some(value.clone()),
            DictKey::Computed(_) => None,
        })
        .collect()
}
