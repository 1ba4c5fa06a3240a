//! Print back: renders a parsed [`Program`] as source text that reparses to the same tree.
//!
//! Layout is one statement per line with blocks indented by `indent_width`. Spans are
//! ignored; comments are not part of the tree and are dropped.

use crate::config::FormatOptions;
use crate::surface::{
    AssignTarget, AttrValue, Attribute, Branch, ComputedBody,
    DictKey, ExportItem, Expr, Literal, NowKind, Param, Pattern, PrefixOp, Program, SchemaDecl,
    SchemaField, Stmt, TagNode, TemplateKind, TemplatePart,
};

pub fn format_program(program: &Program, options: &FormatOptions) -> String {
    let printer = Printer {
        indent_width: options.indent_width,
    };
    let mut output = printer.statements(&program.statements, 0);
    if !output.is_empty() {
        output.push('\n');
    }
    output
}

struct Printer {
    indent_width: usize,
}

impl Printer {
    fn pad(&self, level: usize) -> String {
        " ".repeat(level * self.indent_width)
    }

    fn statements(&self, statements: &[Stmt], level: usize) -> String {
        let mut lines: Vec<String> = Vec::with_capacity(statements.len());
        for stmt in statements {
            let text = self.stmt(stmt, level);
            if let Some(previous) = lines.last_mut() {
                if continues_previous_line(&text) {
                    previous.push(';');
                }
            }
            lines.push(text);
        }
        let pad = self.pad(level);
        lines
            .iter()
            .map(|line| format!("{pad}{line}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn block(&self, statements: &[Stmt], level: usize) -> String {
        if statements.is_empty() {
            return "{}".to_string();
        }
        format!(
            "{{\n{}\n{}}}",
            self.statements(statements, level + 1),
            self.pad(level)
        )
    }

    fn stmt(&self, stmt: &Stmt, level: usize) -> String {
        match stmt {
            Stmt::Let { pattern, value, .. } => {
                format!("let {}{}", self.pattern(pattern, level), self.assigned(value, level))
            }
            Stmt::Assign { target, value, .. } => {
                let target = match target {
                    AssignTarget::Pattern(pattern) => self.pattern(pattern, level),
                    AssignTarget::Place(expr) => self.expr(expr, level),
                };
                format!("{target}{}", self.assigned(value, level))
            }
            Stmt::Export { item, .. } => match item {
                ExportItem::Binding(stmt) => format!("export {}", self.stmt(stmt, level)),
                ExportItem::Name(name) => format!("export {}", name.name),
                ExportItem::Computed { name, body } => match body {
                    ComputedBody::Expr(expr) => {
                        format!("export computed {} = {}", name.name, self.expr(expr, level))
                    }
                    ComputedBody::Block(statements) => {
                        format!("export computed {} {}", name.name, self.block(statements, level))
                    }
                },
                ExportItem::Schema(expr) => format!("export {}", self.expr(expr, level)),
            },
            Stmt::Return { value: None, .. } => "return".to_string(),
            Stmt::Return {
                value: Some(value), ..
            } => format!("return {}", self.expr(value, level)),
            Stmt::Check {
                condition,
                fallback,
                ..
            } => format!(
                "check {} else {}",
                self.expr(condition, level),
                self.expr(fallback, level)
            ),
            Stmt::Stop(_) => "stop".to_string(),
            Stmt::Skip(_) => "skip".to_string(),
            Stmt::Block { statements, .. } => self.block(statements, level),
            Stmt::Write {
                value,
                target,
                mode,
                ..
            } => format!(
                "{} {} {}",
                self.expr(value, level),
                mode.symbol(),
                self.expr(target, level)
            ),
            Stmt::Expr(expr) => self.expr(expr, level),
        }
    }

    /// Right-hand side of `let` and assignment, keeping the `<==` / `<=/=` sugar.
    fn assigned(&self, value: &Expr, level: usize) -> String {
        match value {
            Expr::Read { source, .. } => format!(" <== {}", self.expr(source, level)),
            Expr::Fetch { source, .. } => format!(" <=/= {}", self.expr(source, level)),
            other => format!(" = {}", self.expr(other, level)),
        }
    }

    fn pattern(&self, pattern: &Pattern, level: usize) -> String {
        match pattern {
            Pattern::Ident(name) => name.name.clone(),
            Pattern::Wildcard(_) => "_".to_string(),
            Pattern::Array { elements, rest, .. } => {
                let mut parts: Vec<String> = elements
                    .iter()
                    .map(|element| self.pattern(element, level))
                    .collect();
                if let Some(rest) = rest {
                    parts.push(format!("...{}", rest.name));
                }
                format!("[{}]", parts.join(", "))
            }
            Pattern::Dict { entries, rest, .. } => {
                let mut parts: Vec<String> = entries
                    .iter()
                    .map(|entry| match (&entry.alias, &entry.nested) {
                        (Some(alias), _) => format!("{} as {}", entry.key.name, alias.name),
                        (None, Some(nested)) => {
                            format!("{}: {}", entry.key.name, self.pattern(nested, level))
                        }
                        (None, None) => entry.key.name.clone(),
                    })
                    .collect();
                if let Some(rest) = rest {
                    parts.push(format!("...{}", rest.name));
                }
                format!("{{{}}}", parts.join(", "))
            }
        }
    }

    fn param(&self, param: &Param, level: usize) -> String {
        if param.rest {
            return format!("...{}", self.pattern(&param.pattern, level));
        }
        match &param.default {
            Some(default) => format!(
                "{} = {}",
                self.pattern(&param.pattern, level),
                self.expr(default, level)
            ),
            None => self.pattern(&param.pattern, level),
        }
    }

    fn list(&self, items: &[Expr], level: usize) -> String {
        items
            .iter()
            .map(|item| self.expr(item, level))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn expr(&self, expr: &Expr, level: usize) -> String {
        match expr {
            Expr::Ident(name) => name.name.clone(),
            Expr::Literal(literal) => literal_text(literal),
            Expr::Template { kind, parts, .. } => self.template(*kind, parts, level),
            Expr::Schema(schema) => self.schema(schema, level),
            Expr::Table { schema, rows, .. } => {
                let schema = schema
                    .as_ref()
                    .map(|name| format!("({})", name.name))
                    .unwrap_or_default();
                format!("@table{schema} [{}]", self.list(rows, level))
            }
            Expr::Dsl { kind, body, .. } => format!("@{}({body})", kind.keyword()),
            Expr::Transaction { statements, .. } => {
                format!("@transaction {}", self.block(statements, level))
            }
            Expr::Array { items, .. } => format!("[{}]", self.list(items, level)),
            Expr::Dict { entries, .. } => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|entry| {
                        let key = match &entry.key {
                            DictKey::Ident(name) => name.name.clone(),
                            DictKey::String { value, .. } => quote_string(value),
                            DictKey::Computed(expr) => format!("[{}]", self.expr(expr, level)),
                        };
                        format!("{key}: {}", self.expr(&entry.value, level))
                    })
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }
            Expr::Prefix { op, operand, .. } => {
                let symbol = match op {
                    PrefixOp::Not => "!",
                    PrefixOp::Neg => "-",
                };
                format!("{symbol}{}", self.expr(operand, level))
            }
            Expr::Infix {
                op, left, right, ..
            } => format!(
                "{} {} {}",
                self.expr(left, level),
                op.symbol(),
                self.expr(right, level)
            ),
            Expr::Read { source, .. } => format!("<== {}", self.expr(source, level)),
            Expr::Fetch { source, .. } => format!("<=/= {}", self.expr(source, level)),
            Expr::Call { callee, args, .. } => {
                format!("{}({})", self.expr(callee, level), self.list(args, level))
            }
            Expr::Index {
                target,
                index,
                optional,
                ..
            } => format!(
                "{}[{}{}]",
                self.expr(target, level),
                if *optional { "?" } else { "" },
                self.expr(index, level)
            ),
            Expr::Slice {
                target, start, end, ..
            } => {
                let bound = |value: &Option<Box<Expr>>| {
                    value
                        .as_ref()
                        .map(|value| self.expr(value, level))
                        .unwrap_or_default()
                };
                format!("{}[{}:{}]", self.expr(target, level), bound(start), bound(end))
            }
            Expr::Member {
                target, property, ..
            } => format!("{}.{}", self.expr(target, level), property.name),
            Expr::Group { inner, .. } => format!("({})", self.expr(inner, level)),
            Expr::Function { params, body, .. } => {
                let params: Vec<String> =
                    params.iter().map(|param| self.param(param, level)).collect();
                format!("fn({}) {}", params.join(", "), self.block(body, level))
            }
            Expr::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                let mut text = format!(
                    "if ({}) {}",
                    self.expr(condition, level),
                    self.branch(consequence, level)
                );
                if let Some(alternative) = alternative {
                    text.push_str(" else ");
                    text.push_str(&self.branch(alternative, level));
                }
                text
            }
            Expr::For {
                key,
                value,
                iterable,
                body,
                ..
            } => {
                let binding = match key {
                    Some(key) => format!(
                        "{}, {}",
                        self.pattern(key, level),
                        self.pattern(value, level)
                    ),
                    None => self.pattern(value, level),
                };
                format!(
                    "for ({binding} in {}) {}",
                    self.expr(iterable, level),
                    self.block(body, level)
                )
            }
            Expr::ForMap {
                iterable, mapper, ..
            } => format!(
                "for ({}) {}",
                self.expr(iterable, level),
                self.expr(mapper, level)
            ),
            Expr::Try { call, .. } => format!("try {}", self.expr(call, level)),
            Expr::Import { source, alias, .. } => match alias {
                Some(alias) => format!("import {} as {}", self.expr(source, level), alias.name),
                None => format!("import {}", self.expr(source, level)),
            },
            Expr::Tag(tag) => self.tag(tag, level),
            Expr::Text { value, .. } => value.clone(),
            Expr::Interpolation { statements, .. } => {
                let statements: Vec<String> = statements
                    .iter()
                    .map(|stmt| self.stmt(stmt, level))
                    .collect();
                format!("@{{{}}}", statements.join("; "))
            }
            Expr::Stop(_) => "stop".to_string(),
            Expr::Skip(_) => "skip".to_string(),
            Expr::Error(_) => "_".to_string(),
        }
    }

    fn branch(&self, branch: &Branch, level: usize) -> String {
        match branch {
            Branch::Block(statements) => self.block(statements, level),
            Branch::Expr(expr) => self.expr(expr, level),
            Branch::Stmt(stmt) => self.stmt(stmt, level),
        }
    }

    fn template(&self, kind: TemplateKind, parts: &[TemplatePart], level: usize) -> String {
        let (open, close, hole) = match kind {
            TemplateKind::Backtick => ("`", "`", "{"),
            TemplateKind::Raw => ("'", "'", "@{"),
            TemplateKind::Path | TemplateKind::Url | TemplateKind::Datetime => ("@(", ")", "{"),
        };
        let mut text = open.to_string();
        for part in parts {
            match part {
                TemplatePart::Text(value) => text.push_str(&escape_template_text(kind, value)),
                TemplatePart::Hole(expr) => {
                    text.push_str(hole);
                    text.push_str(&self.expr(expr, level));
                    text.push('}');
                }
            }
        }
        text.push_str(close);
        text
    }

    fn tag(&self, tag: &TagNode, level: usize) -> String {
        let mut open = format!("<{}", tag.name);
        for attribute in &tag.attributes {
            open.push(' ');
            open.push_str(&self.attribute(attribute, level));
        }
        let Some(children) = &tag.children else {
            return format!("{open}/>");
        };
        let close = format!("</{}>", tag.name);
        let raw = !children.is_empty()
            && children.iter().all(|child| {
                matches!(
                    child,
                    Stmt::Expr(Expr::Text { .. } | Expr::Interpolation { .. })
                )
            });
        if raw {
            let body: String = children.iter().map(|child| self.stmt(child, level)).collect();
            return format!("{open}>{body}{close}");
        }
        match children.as_slice() {
            [] => format!("{open}>{close}"),
            [only] => {
                let child = self.stmt(only, level);
                if child.contains('\n') {
                    format!(
                        "{open}>\n{}\n{}{close}",
                        self.statements(children, level + 1),
                        self.pad(level)
                    )
                } else {
                    format!("{open}>{child}{close}")
                }
            }
            _ => format!(
                "{open}>\n{}\n{}{close}",
                self.statements(children, level + 1),
                self.pad(level)
            ),
        }
    }

    fn attribute(&self, attribute: &Attribute, level: usize) -> String {
        match attribute {
            Attribute::Named { name, value, .. } => match value {
                None => name.name.clone(),
                Some(AttrValue::Literal(expr)) => format!("{}={}", name.name, self.expr(expr, level)),
                Some(AttrValue::Hole(expr)) => format!("{}={{{}}}", name.name, self.expr(expr, level)),
            },
            Attribute::Spread { expr, .. } => match expr {
                Expr::Ident(name) => format!("...{}", name.name),
                other => format!("...{{{}}}", self.expr(other, level)),
            },
        }
    }

    fn schema(&self, schema: &SchemaDecl, level: usize) -> String {
        if schema.fields.is_empty() {
            return format!("@schema {} {{}}", schema.name.name);
        }
        let inner = self.pad(level + 1);
        let fields: Vec<String> = schema
            .fields
            .iter()
            .map(|field| format!("{inner}{}", self.schema_field(field, level + 1)))
            .collect();
        format!(
            "@schema {} {{\n{}\n{}}}",
            schema.name.name,
            fields.join("\n"),
            self.pad(level)
        )
    }

    fn schema_field(&self, field: &SchemaField, level: usize) -> String {
        let mut text = format!("{}: ", field.name.name);
        if field.is_array {
            text.push_str(&format!("[{}]", field.type_name.name));
        } else {
            text.push_str(&field.type_name.name);
        }
        if field.nullable {
            text.push('?');
        }
        if !field.enum_values.is_empty() {
            let values: Vec<String> = field.enum_values.iter().map(|v| quote_string(v)).collect();
            text.push_str(&format!("[{}]", values.join(", ")));
        }
        if !field.options.is_empty() {
            let options: Vec<String> = field
                .options
                .iter()
                .map(|(name, value)| match value {
                    Some(value) => format!("{}: {}", name.name, self.expr(value, level)),
                    None => name.name.clone(),
                })
                .collect();
            text.push_str(&format!("({})", options.join(", ")));
        }
        if let Some(default) = &field.default {
            text.push_str(&format!(" = {}", self.expr(default, level)));
        }
        if let Some(metadata) = &field.metadata {
            text.push_str(&format!(" | {}", self.expr(metadata, level)));
        }
        if let Some(via) = &field.via {
            text.push_str(&format!(" via {}", via.name));
        }
        text
    }
}

/// A statement starting with one of these would continue the previous line's
/// expression, so the previous statement gets an explicit `;`.
fn continues_previous_line(statement: &str) -> bool {
    matches!(
        statement.chars().next(),
        Some('/' | '(' | '[' | '-' | '+')
    )
}

fn literal_text(literal: &Literal) -> String {
    match literal {
        Literal::Int { value, .. } => value.to_string(),
        Literal::Float { value, .. } => {
            if value.fract() == 0.0 {
                format!("{value:.1}")
            } else {
                value.to_string()
            }
        }
        Literal::Bool { value, .. } => value.to_string(),
        Literal::String { value, raw: false, .. } => quote_string(value),
        Literal::String { value, raw: true, .. } => quote_raw(value),
        Literal::Regex { pattern, flags, .. } => format!("/{pattern}/{flags}"),
        Literal::Money {
            currency, amount, ..
        } => format!("{currency}#{amount}"),
        Literal::Datetime { value, .. } | Literal::Duration { value, .. } => format!("@{value}"),
        Literal::Now { kind, .. } => match kind {
            NowKind::DateTime => "@now".to_string(),
            NowKind::Time => "@timeNow".to_string(),
            NowKind::Date { today: true } => "@today".to_string(),
            NowKind::Date { today: false } => "@dateNow".to_string(),
        },
        Literal::Path { value, .. }
        | Literal::Url { value, .. }
        | Literal::StdlibPath { value, .. } => format!("@{value}"),
        Literal::Connection { name, .. } | Literal::Context { name, .. } => format!("@{name}"),
    }
}

fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn quote_raw(value: &str) -> String {
    format!("'{}'", escape_raw(value))
}

/// Single-quoted text: `\`, `'` and an `@` that would open a hole are escaped.
fn escape_raw(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '@' if chars.peek() == Some(&'{') => out.push_str("\\@"),
            other => out.push(other),
        }
    }
    out
}

fn escape_template_text(kind: TemplateKind, value: &str) -> String {
    match kind {
        TemplateKind::Raw => escape_raw(value),
        TemplateKind::Backtick => {
            let mut out = String::with_capacity(value.len());
            for ch in value.chars() {
                if matches!(ch, '`' | '{' | '}') {
                    out.push('\\');
                }
                out.push(ch);
            }
            out
        }
        TemplateKind::Path | TemplateKind::Url | TemplateKind::Datetime => {
            let escape_parens = !parens_balanced(value);
            let mut out = String::with_capacity(value.len());
            for ch in value.chars() {
                let escaped = match ch {
                    '{' | '}' => true,
                    '(' | ')' => escape_parens,
                    _ => false,
                };
                if escaped {
                    out.push('\\');
                }
                out.push(ch);
            }
            out
        }
    }
}

fn parens_balanced(text: &str) -> bool {
    let mut depth = 0usize;
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(next) => depth = next,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}
