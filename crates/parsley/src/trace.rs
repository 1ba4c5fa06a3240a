//! Environment-gated stderr tracing.
//!
//! `PARSLEY_TRACE_LEXER=1` echoes every token, `PARSLEY_TRACE_PARSER=1` echoes
//! recovery events. Both are read once per lexer/parser instance.

pub const LEXER: &str = "PARSLEY_TRACE_LEXER";
pub const PARSER: &str = "PARSLEY_TRACE_PARSER";

pub fn enabled(var: &str) -> bool {
    std::env::var(var).is_ok_and(|v| v == "1")
}
