use serde::Serialize;

use crate::diagnostics::{Diagnostic, Span};
use crate::surface::Program;
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, Serialize)]
pub struct CstToken {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl From<Token> for CstToken {
    fn from(token: Token) -> Self {
        Self {
            kind: token.kind,
            text: token.text,
            span: token.span,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenFile {
    pub path: String,
    pub tokens: Vec<CstToken>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Serialize)]
pub struct ParsedFile {
    pub path: String,
    pub byte_count: usize,
    pub line_count: usize,
    pub program: Program,
}

impl ParsedFile {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.program.diagnostics
    }
}

#[derive(Debug, Serialize)]
pub struct ParseBundle {
    pub files: Vec<ParsedFile>,
}

impl ParseBundle {
    pub fn has_errors(&self) -> bool {
        self.files.iter().any(|file| file.program.has_errors())
    }
}
