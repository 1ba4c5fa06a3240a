use crate::token::TokenKind;

pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("fn", TokenKind::Function),
    ("function", TokenKind::Function),
    ("let", TokenKind::Let),
    ("for", TokenKind::For),
    ("in", TokenKind::In),
    ("as", TokenKind::As),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("return", TokenKind::Return),
    ("export", TokenKind::Export),
    ("and", TokenKind::And),
    ("or", TokenKind::Or),
    ("not", TokenKind::Bang),
    ("try", TokenKind::Try),
    ("import", TokenKind::Import),
    ("check", TokenKind::Check),
    ("stop", TokenKind::Stop),
    ("skip", TokenKind::Skip),
    ("via", TokenKind::Via),
    ("is", TokenKind::Is),
    ("computed", TokenKind::Computed),
];

pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(word, _)| *word == ident)
        .map(|(_, kind)| *kind)
}

/// Operators ordered longest first so a prefix scan always takes the longest match.
pub const OPERATORS: &[(&str, TokenKind)] = &[
    ("<=??=>", TokenKind::QueryMany),
    ("<=?=>", TokenKind::QueryOne),
    ("<=!=>", TokenKind::Execute),
    ("<=#=>", TokenKind::ExecuteWith),
    ("=/=>>", TokenKind::RemoteAppend),
    ("??!->", TokenKind::ReturnManyExplicit),
    ("<=/=", TokenKind::FetchFrom),
    ("==>>", TokenKind::AppendTo),
    ("=/=>", TokenKind::RemoteWrite),
    ("??->", TokenKind::ReturnMany),
    ("?!->", TokenKind::ReturnOneExplicit),
    ("<==", TokenKind::ReadFrom),
    ("==>", TokenKind::WriteTo),
    ("?->", TokenKind::ReturnOne),
    (".->", TokenKind::ExecCount),
    ("...", TokenKind::DotDotDot),
    ("==", TokenKind::Eq),
    ("!=", TokenKind::NotEq),
    ("!~", TokenKind::NotMatch),
    ("<=", TokenKind::LtEq),
    (">=", TokenKind::GtEq),
    ("&&", TokenKind::And),
    ("||", TokenKind::Or),
    ("??", TokenKind::Nullish),
    ("++", TokenKind::PlusPlus),
    ("..", TokenKind::Range),
    ("|<", TokenKind::PipeWrite),
    ("<-", TokenKind::ArrowPull),
    ("=", TokenKind::Assign),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("!", TokenKind::Bang),
    ("*", TokenKind::Asterisk),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("&", TokenKind::And),
    ("|", TokenKind::Or),
    ("?", TokenKind::Question),
    ("~", TokenKind::Match),
    (",", TokenKind::Comma),
    (";", TokenKind::Semicolon),
    (":", TokenKind::Colon),
    (".", TokenKind::Dot),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
];

pub fn match_operator(rest: &str) -> Option<(&'static str, TokenKind)> {
    OPERATORS
        .iter()
        .find(|(op, _)| rest.starts_with(op))
        .map(|(op, kind)| (*op, *kind))
}

/// Binding strength of infix continuations, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Comma,
    LogicOr,
    LogicAnd,
    Equals,
    LessGreater,
    Sum,
    Concat,
    Product,
    Prefix,
    Index,
    Call,
}

/// Precedence of `kind` when it continues an expression, `None` when it cannot.
pub fn infix_precedence(kind: TokenKind) -> Option<Precedence> {
    use TokenKind::*;
    match kind {
        Or | Nullish => Some(Precedence::LogicOr),
        And => Some(Precedence::LogicAnd),
        Eq | NotEq | Match | NotMatch | In | Bang | Is | QueryOne | QueryMany | Execute
        | ExecuteWith => Some(Precedence::Equals),
        Lt | Gt | LtEq | GtEq => Some(Precedence::LessGreater),
        Plus | Minus | Range => Some(Precedence::Sum),
        PlusPlus => Some(Precedence::Concat),
        Asterisk | Slash | Percent => Some(Precedence::Product),
        LBracket | Dot => Some(Precedence::Index),
        LParen => Some(Precedence::Call),
        Illegal | Eof | Ident | Int | Float | String | RawString | Regex | Money => None,
        BacktickStart | RawTemplateStart | PathTemplateStart | UrlTemplateStart
        | DatetimeTemplateStart | TemplateText | TemplateEnd | HoleStart | HoleEnd => None,
        Datetime | DatetimeNow | TimeNow | DateNow | Duration | Connection | Context | Schema
        | Table | Query | Insert | Update | Delete | Transaction | Path | Url | StdlibPath => None,
        TagOpen | TagOpenEnd | TagSelfClose | TagClose | AttrName | RawText => None,
        Function | Let | For | As | True | False | If | Else | Return | Export | Try | Import
        | Check | Stop | Skip | Via | Computed => None,
        Assign | Question | DotDotDot | ReadFrom | FetchFrom | WriteTo | AppendTo
        | RemoteWrite | RemoteAppend => None,
        PipeWrite | ReturnOne | ReturnMany | ReturnOneExplicit | ReturnManyExplicit
        | ExecCount | ArrowPull => None,
        Comma | Semicolon | Colon | RParen | LBrace | RBrace | RBracket => None,
    }
}

pub const DEFAULT_RAW_TEXT_TAGS: &[&str] = &["style", "script"];

pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

pub const NOW_KEYWORDS: &[(&str, TokenKind)] = &[
    ("now", TokenKind::DatetimeNow),
    ("timeNow", TokenKind::TimeNow),
    ("dateNow", TokenKind::DateNow),
    ("today", TokenKind::DateNow),
];

pub const CONNECTION_KEYWORDS: &[&str] =
    &["sqlite", "postgres", "mysql", "sftp", "shell", "DB", "SEARCH"];

pub const CONTEXT_KEYWORDS: &[&str] = &["env", "args", "params"];

pub const DSL_KEYWORDS: &[(&str, TokenKind)] = &[
    ("schema", TokenKind::Schema),
    ("table", TokenKind::Table),
    ("query", TokenKind::Query),
    ("insert", TokenKind::Insert),
    ("update", TokenKind::Update),
    ("delete", TokenKind::Delete),
    ("transaction", TokenKind::Transaction),
];

pub const STDIO_ALIASES: &[&str] = &["stdin", "stdout", "stderr"];

pub const STDLIB_ROOTS: &[&str] = &["std", "basil"];

/// Duration units; `mo` must be tried before `m`.
pub const DURATION_UNITS: &[&str] = &["mo", "y", "w", "d", "h", "m", "s"];

/// Currency markers that are not a plain `CODE#` prefix, longest first.
pub const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("CA$", "CAD"),
    ("AU$", "AUD"),
    ("HK$", "HKD"),
    ("CN¥", "CNY"),
    ("S$", "SGD"),
    ("$", "USD"),
    ("£", "GBP"),
    ("€", "EUR"),
    ("¥", "JPY"),
];

pub const CURRENCY_SCALES: &[(&str, u32)] = &[
    ("USD", 2),
    ("EUR", 2),
    ("GBP", 2),
    ("JPY", 0),
    ("CHF", 2),
    ("CAD", 2),
    ("AUD", 2),
    ("CNY", 2),
    ("HKD", 2),
    ("SGD", 2),
    ("KRW", 0),
    ("INR", 2),
    ("BRL", 2),
    ("KWD", 3),
    ("BHD", 3),
    ("OMR", 3),
    ("JOD", 3),
    ("MXN", 2),
    ("NZD", 2),
    ("SEK", 2),
    ("NOK", 2),
    ("DKK", 2),
    ("ZAR", 2),
    ("RUB", 2),
    ("PLN", 2),
    ("THB", 2),
    ("MYR", 2),
    ("PHP", 2),
    ("IDR", 2),
    ("VND", 0),
    ("CLP", 0),
    ("COP", 2),
    ("PEN", 2),
    ("ARS", 2),
    ("CZK", 2),
    ("HUF", 2),
    ("ILS", 2),
    ("TRY", 2),
    ("TWD", 2),
    ("AED", 2),
    ("SAR", 2),
    ("QAR", 2),
    ("EGP", 2),
    ("PKR", 2),
    ("NGN", 2),
];

pub const DEFAULT_CURRENCY_SCALE: u32 = 2;

pub fn currency_scale(code: &str) -> Option<u32> {
    CURRENCY_SCALES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, scale)| *scale)
}

pub fn currency_display(code: &str) -> &str {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(symbol, _)| *symbol)
        .unwrap_or(code)
}

/// Misspellings reported when an identifier is directly followed by another identifier.
pub const KEYWORD_TYPOS: &[(&str, &str)] = &[
    ("fucntion", "function"),
    ("funtion", "function"),
    ("functon", "function"),
    ("fnuction", "function"),
    ("func", "fn"),
    ("def", "fn"),
    ("retrun", "return"),
    ("reutrn", "return"),
    ("retun", "return"),
    ("improt", "import"),
    ("imoprt", "import"),
    ("exprot", "export"),
    ("exoprt", "export"),
    ("lte", "let"),
    ("elt", "let"),
    ("var", "let"),
    ("const", "let"),
    ("fro", "for"),
    ("ofr", "for"),
    ("ture", "true"),
    ("treu", "true"),
    ("flase", "false"),
    ("fasle", "false"),
    ("nil", "null"),
    ("undefined", "null"),
    ("None", "null"),
];

pub fn keyword_typo(ident: &str) -> Option<&'static str> {
    KEYWORD_TYPOS
        .iter()
        .find(|(typo, _)| *typo == ident)
        .map(|(_, keyword)| *keyword)
}

pub fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

pub fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_table_prefers_longest_match() {
        assert_eq!(match_operator("<=??=> db"), Some(("<=??=>", TokenKind::QueryMany)));
        assert_eq!(match_operator("<== file"), Some(("<==", TokenKind::ReadFrom)));
        assert_eq!(match_operator("<= 3"), Some(("<=", TokenKind::LtEq)));
        assert_eq!(match_operator("==>> log"), Some(("==>>", TokenKind::AppendTo)));
        assert_eq!(match_operator("...rest"), Some(("...", TokenKind::DotDotDot)));
    }

    #[test]
    fn operator_table_is_sorted_longest_first() {
        let lengths: Vec<usize> = OPERATORS.iter().map(|(op, _)| op.len()).collect();
        let mut sorted = lengths.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(lengths, sorted);
    }

    #[test]
    fn keyword_aliases_share_a_kind() {
        assert_eq!(lookup_keyword("fn"), lookup_keyword("function"));
        assert_eq!(lookup_keyword("not"), Some(TokenKind::Bang));
        assert_eq!(lookup_keyword("and"), Some(TokenKind::And));
        assert_eq!(lookup_keyword("null"), None);
    }

    #[test]
    fn precedence_levels_climb_from_comma_to_call() {
        assert!(Precedence::Comma < Precedence::LogicOr);
        assert!(infix_precedence(TokenKind::Plus) < infix_precedence(TokenKind::Asterisk));
        assert!(infix_precedence(TokenKind::And) > infix_precedence(TokenKind::Or));
        assert_eq!(infix_precedence(TokenKind::Assign), None);
        assert_eq!(infix_precedence(TokenKind::LParen), Some(Precedence::Call));
    }
}
