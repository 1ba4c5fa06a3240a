use serde::Serialize;

use crate::diagnostics::Span;

/// Every token the lexer can produce.
///
/// The set is closed: parse-rule lookup and operand classification match over it
/// exhaustively, so a new kind has to be classified everywhere before the crate builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Illegal,
    Eof,

    Ident,
    Int,
    Float,
    String,
    RawString,
    Regex,
    Money,

    BacktickStart,
    RawTemplateStart,
    PathTemplateStart,
    UrlTemplateStart,
    DatetimeTemplateStart,
    TemplateText,
    TemplateEnd,
    HoleStart,
    HoleEnd,

    Datetime,
    DatetimeNow,
    TimeNow,
    DateNow,
    Duration,
    Connection,
    Context,
    Schema,
    Table,
    Query,
    Insert,
    Update,
    Delete,
    Transaction,
    Path,
    Url,
    StdlibPath,

    TagOpen,
    TagOpenEnd,
    TagSelfClose,
    TagClose,
    AttrName,
    RawText,

    Function,
    Let,
    For,
    In,
    As,
    True,
    False,
    If,
    Else,
    Return,
    Export,
    Try,
    Import,
    Check,
    Stop,
    Skip,
    Via,
    Is,
    Computed,

    Assign,
    Plus,
    Minus,
    Bang,
    Asterisk,
    Slash,
    Percent,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Eq,
    NotEq,
    And,
    Or,
    Nullish,
    Question,
    Match,
    NotMatch,
    PlusPlus,
    Range,
    DotDotDot,
    ReadFrom,
    FetchFrom,
    WriteTo,
    AppendTo,
    RemoteWrite,
    RemoteAppend,
    QueryOne,
    QueryMany,
    Execute,
    ExecuteWith,
    PipeWrite,
    ReturnOne,
    ReturnMany,
    ReturnOneExplicit,
    ReturnManyExplicit,
    ExecCount,
    ArrowPull,

    Comma,
    Semicolon,
    Colon,
    Dot,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
}

impl TokenKind {
    /// True when a token of this kind can be the last token of an operand.
    ///
    /// A `/` after such a token is division; anywhere else it opens a regex literal.
    pub fn ends_operand(self) -> bool {
        use TokenKind::*;
        match self {
            Ident | Int | Float | String | RawString | Regex | Money | TemplateEnd | HoleEnd => {
                true
            }
            Datetime | DatetimeNow | TimeNow | DateNow | Duration | Connection | Context
            | Path | Url | StdlibPath => true,
            True | False | Stop | Skip => true,
            RParen | RBracket | RBrace => true,
            TagClose | TagSelfClose => true,
            Illegal | Eof => false,
            BacktickStart | RawTemplateStart | PathTemplateStart | UrlTemplateStart
            | DatetimeTemplateStart | TemplateText | HoleStart => false,
            Schema | Table | Query | Insert | Update | Delete | Transaction => false,
            TagOpen | TagOpenEnd | AttrName | RawText => false,
            Function | Let | For | In | As | If | Else | Return | Export | Try | Import
            | Check | Via | Is | Computed => false,
            Assign | Plus | Minus | Bang | Asterisk | Slash | Percent | Lt | Gt | LtEq | GtEq
            | Eq | NotEq | And | Or | Nullish | Question | Match | NotMatch | PlusPlus | Range
            | DotDotDot => false,
            ReadFrom | FetchFrom | WriteTo | AppendTo | RemoteWrite | RemoteAppend | QueryOne
            | QueryMany | Execute | ExecuteWith => false,
            PipeWrite | ReturnOne | ReturnMany | ReturnOneExplicit | ReturnManyExplicit
            | ExecCount | ArrowPull => false,
            Comma | Semicolon | Colon | Dot | LParen | LBrace | LBracket => false,
        }
    }

    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Function
                | Let
                | For
                | In
                | As
                | True
                | False
                | If
                | Else
                | Return
                | Export
                | Try
                | Import
                | Check
                | Stop
                | Skip
                | Via
                | Is
                | Computed
        )
    }

    /// Human readable name used in "expected X, got Y" messages.
    pub fn describe(self) -> &'static str {
        use TokenKind::*;
        match self {
            Illegal => "invalid token",
            Eof => "end of input",
            Ident => "identifier",
            Int => "integer",
            Float => "number",
            String => "string",
            RawString => "raw string",
            Regex => "regex",
            Money => "money literal",
            BacktickStart => "'`'",
            RawTemplateStart => "raw template",
            PathTemplateStart => "path template",
            UrlTemplateStart => "URL template",
            DatetimeTemplateStart => "datetime template",
            TemplateText => "template text",
            TemplateEnd => "end of template",
            HoleStart => "'{'",
            HoleEnd => "'}'",
            Datetime => "datetime literal",
            DatetimeNow => "@now",
            TimeNow => "@timeNow",
            DateNow => "@today",
            Duration => "duration literal",
            Connection => "connection literal",
            Context => "context literal",
            Schema => "@schema",
            Table => "@table",
            Query => "@query",
            Insert => "@insert",
            Update => "@update",
            Delete => "@delete",
            Transaction => "@transaction",
            Path => "path literal",
            Url => "URL literal",
            StdlibPath => "stdlib path",
            TagOpen => "opening tag",
            TagOpenEnd => "'>'",
            TagSelfClose => "'/>'",
            TagClose => "closing tag",
            AttrName => "attribute name",
            RawText => "text",
            Function => "'fn'",
            Let => "'let'",
            For => "'for'",
            In => "'in'",
            As => "'as'",
            True => "'true'",
            False => "'false'",
            If => "'if'",
            Else => "'else'",
            Return => "'return'",
            Export => "'export'",
            Try => "'try'",
            Import => "'import'",
            Check => "'check'",
            Stop => "'stop'",
            Skip => "'skip'",
            Via => "'via'",
            Is => "'is'",
            Computed => "'computed'",
            Assign => "'='",
            Plus => "'+'",
            Minus => "'-'",
            Bang => "'!'",
            Asterisk => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            Lt => "'<'",
            Gt => "'>'",
            LtEq => "'<='",
            GtEq => "'>='",
            Eq => "'=='",
            NotEq => "'!='",
            And => "'and'",
            Or => "'or'",
            Nullish => "'??'",
            Question => "'?'",
            Match => "'~'",
            NotMatch => "'!~'",
            PlusPlus => "'++'",
            Range => "'..'",
            DotDotDot => "'...'",
            ReadFrom => "'<=='",
            FetchFrom => "'<=/='",
            WriteTo => "'==>'",
            AppendTo => "'==>>'",
            RemoteWrite => "'=/=>'",
            RemoteAppend => "'=/=>>'",
            QueryOne => "'<=?=>'",
            QueryMany => "'<=??=>'",
            Execute => "'<=!=>'",
            ExecuteWith => "'<=#=>'",
            PipeWrite => "'|<'",
            ReturnOne => "'?->'",
            ReturnMany => "'??->'",
            ReturnOneExplicit => "'?!->'",
            ReturnManyExplicit => "'??!->'",
            ExecCount => "'.->'",
            ArrowPull => "'<-'",
            Comma => "','",
            Semicolon => "';'",
            Colon => "':'",
            Dot => "'.'",
            LParen => "'('",
            RParen => "')'",
            LBrace => "'{'",
            RBrace => "'}'",
            LBracket => "'['",
            RBracket => "']'",
        }
    }
}

/// A classified lexical unit. `text` holds the decoded value for literals, the
/// tag name for tag tokens and the message for [`TokenKind::Illegal`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
    /// Byte range in the source, used to recover verbatim DSL bodies.
    pub start: usize,
    pub end: usize,
}
