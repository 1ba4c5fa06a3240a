use rust_decimal::Decimal;
use serde::Serialize;

use crate::diagnostics::{has_errors, Diagnostic, Span};

pub use crate::lexer::TemplateKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpannedName {
    pub name: String,
    pub span: Span,
}

/// One parsed source unit: the statements plus every diagnostic raised on the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Program {
    pub fn has_errors(&self) -> bool {
        has_errors(&self.diagnostics)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    Let {
        pattern: Pattern,
        value: Expr,
        span: Span,
    },
    Assign {
        target: AssignTarget,
        value: Expr,
        span: Span,
    },
    Export {
        item: ExportItem,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    /// `check cond else fallback`; the fallback is mandatory.
    Check {
        condition: Expr,
        fallback: Expr,
        span: Span,
    },
    Stop(Span),
    Skip(Span),
    Block {
        statements: Vec<Stmt>,
        span: Span,
    },
    Write {
        value: Expr,
        target: Expr,
        mode: WriteMode,
        span: Span,
    },
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AssignTarget {
    Pattern(Pattern),
    /// `xs[i] = v` and `obj.field = v`.
    Place(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExportItem {
    /// `export let ...`, `export x = ...`, `export {a} = ...`.
    Binding(Box<Stmt>),
    /// `export Name` of an existing binding.
    Name(SpannedName),
    Computed {
        name: SpannedName,
        body: ComputedBody,
    },
    Schema(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ComputedBody {
    Expr(Box<Expr>),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WriteMode {
    Write,
    Append,
    RemoteWrite,
    RemoteAppend,
}

impl WriteMode {
    pub fn symbol(self) -> &'static str {
        match self {
            WriteMode::Write => "==>",
            WriteMode::Append => "==>>",
            WriteMode::RemoteWrite => "=/=>",
            WriteMode::RemoteAppend => "=/=>>",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Pattern {
    Ident(SpannedName),
    Wildcard(Span),
    Array {
        elements: Vec<Pattern>,
        rest: Option<SpannedName>,
        span: Span,
    },
    Dict {
        entries: Vec<DictPatternEntry>,
        rest: Option<SpannedName>,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DictPatternEntry {
    pub key: SpannedName,
    pub alias: Option<SpannedName>,
    pub nested: Option<Pattern>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub pattern: Pattern,
    pub default: Option<Expr>,
    pub rest: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Int {
        value: i64,
        span: Span,
    },
    Float {
        value: f64,
        span: Span,
    },
    Bool {
        value: bool,
        span: Span,
    },
    String {
        value: String,
        raw: bool,
        span: Span,
    },
    Regex {
        pattern: String,
        flags: String,
        span: Span,
    },
    Money {
        currency: String,
        amount: Decimal,
        span: Span,
    },
    Datetime {
        value: String,
        kind: DatetimeKind,
        span: Span,
    },
    Now {
        kind: NowKind,
        span: Span,
    },
    Duration {
        value: String,
        span: Span,
    },
    Path {
        value: String,
        span: Span,
    },
    Url {
        value: String,
        span: Span,
    },
    StdlibPath {
        value: String,
        span: Span,
    },
    Connection {
        name: String,
        span: Span,
    },
    Context {
        name: String,
        span: Span,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DatetimeKind {
    Date,
    DateTime,
    Time,
}

impl DatetimeKind {
    pub fn classify(text: &str) -> Self {
        if text.contains('T') {
            DatetimeKind::DateTime
        } else if text.len() >= 5 && text.as_bytes().get(4) == Some(&b'-') {
            DatetimeKind::Date
        } else {
            DatetimeKind::Time
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NowKind {
    DateTime,
    Time,
    /// `@dateNow` and `@today`.
    Date { today: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TemplatePart {
    Text(String),
    Hole(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrefixOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
    Nullish,
    Match,
    NotMatch,
    In,
    NotIn,
    Is,
    IsNot,
    Concat,
    Range,
    QueryOne,
    QueryMany,
    Execute,
    ExecuteWith,
}

impl InfixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::Mod => "%",
            InfixOp::Eq => "==",
            InfixOp::NotEq => "!=",
            InfixOp::Lt => "<",
            InfixOp::Gt => ">",
            InfixOp::LtEq => "<=",
            InfixOp::GtEq => ">=",
            InfixOp::And => "and",
            InfixOp::Or => "or",
            InfixOp::Nullish => "??",
            InfixOp::Match => "~",
            InfixOp::NotMatch => "!~",
            InfixOp::In => "in",
            InfixOp::NotIn => "not in",
            InfixOp::Is => "is",
            InfixOp::IsNot => "is not",
            InfixOp::Concat => "++",
            InfixOp::Range => "..",
            InfixOp::QueryOne => "<=?=>",
            InfixOp::QueryMany => "<=??=>",
            InfixOp::Execute => "<=!=>",
            InfixOp::ExecuteWith => "<=#=>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DslKind {
    Query,
    Insert,
    Update,
    Delete,
}

impl DslKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DslKind::Query => "query",
            DslKind::Insert => "insert",
            DslKind::Update => "update",
            DslKind::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DictKey {
    Ident(SpannedName),
    String { value: String, span: Span },
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DictEntry {
    pub key: DictKey,
    pub value: Expr,
    pub span: Span,
}

/// Body of an `if` arm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Branch {
    Block(Vec<Stmt>),
    Expr(Box<Expr>),
    Stmt(Box<Stmt>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagNode {
    /// Empty for the `<>...</>` grouping tag.
    pub name: String,
    pub attributes: Vec<Attribute>,
    /// `None` for self-closing tags.
    pub children: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Attribute {
    Named {
        name: SpannedName,
        value: Option<AttrValue>,
        span: Span,
    },
    Spread {
        expr: Expr,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AttrValue {
    Literal(Expr),
    Hole(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDecl {
    pub name: SpannedName,
    pub fields: Vec<SchemaField>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaField {
    pub name: SpannedName,
    pub type_name: SpannedName,
    pub is_array: bool,
    pub nullable: bool,
    pub enum_values: Vec<String>,
    /// `type(min: 1, unique)`; a bare option has no value.
    pub options: Vec<(SpannedName, Option<Expr>)>,
    pub default: Option<Expr>,
    pub metadata: Option<Expr>,
    pub via: Option<SpannedName>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Ident(SpannedName),
    Literal(Literal),
    Template {
        kind: TemplateKind,
        parts: Vec<TemplatePart>,
        span: Span,
    },
    Schema(SchemaDecl),
    Table {
        schema: Option<SpannedName>,
        rows: Vec<Expr>,
        span: Span,
    },
    /// Query-layer body kept verbatim between the parentheses.
    Dsl {
        kind: DslKind,
        body: String,
        span: Span,
    },
    Transaction {
        statements: Vec<Stmt>,
        span: Span,
    },
    Array {
        items: Vec<Expr>,
        span: Span,
    },
    Dict {
        entries: Vec<DictEntry>,
        span: Span,
    },
    Prefix {
        op: PrefixOp,
        operand: Box<Expr>,
        span: Span,
    },
    Infix {
        op: InfixOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Read {
        source: Box<Expr>,
        span: Span,
    },
    Fetch {
        source: Box<Expr>,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
        span: Span,
    },
    Slice {
        target: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
        span: Span,
    },
    Member {
        target: Box<Expr>,
        property: SpannedName,
        span: Span,
    },
    Group {
        inner: Box<Expr>,
        span: Span,
    },
    Function {
        params: Vec<Param>,
        body: Vec<Stmt>,
        span: Span,
    },
    If {
        condition: Box<Expr>,
        consequence: Branch,
        alternative: Option<Branch>,
        span: Span,
    },
    For {
        key: Option<Pattern>,
        value: Pattern,
        iterable: Box<Expr>,
        body: Vec<Stmt>,
        span: Span,
    },
    /// `for (xs) fn`: maps `fn` over `xs`.
    ForMap {
        iterable: Box<Expr>,
        mapper: Box<Expr>,
        span: Span,
    },
    Try {
        call: Box<Expr>,
        span: Span,
    },
    Import {
        source: Box<Expr>,
        alias: Option<SpannedName>,
        span: Span,
    },
    Tag(TagNode),
    /// Verbatim chunk of a raw-text element body.
    Text {
        value: String,
        span: Span,
    },
    /// `@{ ... }` inside a raw-text element.
    Interpolation {
        statements: Vec<Stmt>,
        span: Span,
    },
    Stop(Span),
    Skip(Span),
    /// Placeholder for an expression that failed to parse.
    Error(Span),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(name) => name.span,
            Expr::Literal(literal) => literal.span(),
            Expr::Schema(schema) => schema.span,
            Expr::Tag(tag) => tag.span,
            Expr::Stop(span) | Expr::Skip(span) | Expr::Error(span) => *span,
            Expr::Template { span, .. }
            | Expr::Table { span, .. }
            | Expr::Dsl { span, .. }
            | Expr::Transaction { span, .. }
            | Expr::Array { span, .. }
            | Expr::Dict { span, .. }
            | Expr::Prefix { span, .. }
            | Expr::Infix { span, .. }
            | Expr::Read { span, .. }
            | Expr::Fetch { span, .. }
            | Expr::Call { span, .. }
            | Expr::Index { span, .. }
            | Expr::Slice { span, .. }
            | Expr::Member { span, .. }
            | Expr::Group { span, .. }
            | Expr::Function { span, .. }
            | Expr::If { span, .. }
            | Expr::For { span, .. }
            | Expr::ForMap { span, .. }
            | Expr::Try { span, .. }
            | Expr::Import { span, .. }
            | Expr::Text { span, .. }
            | Expr::Interpolation { span, .. } => *span,
        }
    }

    /// Heads that a following `(` may call.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Expr::Ident(_)
                | Expr::Member { .. }
                | Expr::Index { .. }
                | Expr::Call { .. }
                | Expr::Function { .. }
                | Expr::Group { .. }
                | Expr::Import { .. }
                | Expr::Literal(Literal::Connection { .. } | Literal::Context { .. })
        )
    }

    pub fn is_call(&self) -> bool {
        matches!(self, Expr::Call { .. })
    }
}

impl Literal {
    pub fn span(&self) -> Span {
        match self {
            Literal::Int { span, .. }
            | Literal::Float { span, .. }
            | Literal::Bool { span, .. }
            | Literal::String { span, .. }
            | Literal::Regex { span, .. }
            | Literal::Money { span, .. }
            | Literal::Datetime { span, .. }
            | Literal::Now { span, .. }
            | Literal::Duration { span, .. }
            | Literal::Path { span, .. }
            | Literal::Url { span, .. }
            | Literal::StdlibPath { span, .. }
            | Literal::Connection { span, .. }
            | Literal::Context { span, .. } => *span,
        }
    }
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(expr) => expr.span(),
            Stmt::Stop(span) | Stmt::Skip(span) => *span,
            Stmt::Let { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::Export { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Check { span, .. }
            | Stmt::Block { span, .. }
            | Stmt::Write { span, .. } => *span,
        }
    }
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Ident(name) => name.span,
            Pattern::Wildcard(span) => *span,
            Pattern::Array { span, .. } | Pattern::Dict { span, .. } => *span,
        }
    }
}

/// Name an `import` binds: the alias, else the last path segment without extension.
pub fn import_binding(source: &Expr, alias: Option<&SpannedName>) -> Option<String> {
    if let Some(alias) = alias {
        return Some(alias.name.clone());
    }
    let path = match source {
        Expr::Literal(Literal::StdlibPath { value, .. } | Literal::Path { value, .. }) => value,
        _ => return None,
    };
    let segment = path.rsplit('/').find(|segment| !segment.is_empty())?;
    let stem = match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => segment,
    };
    Some(stem.to_string())
}
