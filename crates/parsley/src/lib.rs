pub mod config;
pub mod cst;
pub mod diagnostics;
pub mod formatter;
pub mod lexer;
pub mod surface;
pub mod syntax;
pub mod token;
mod trace;

use std::fs;
use std::path::{Path, PathBuf};

pub use config::{load_config, FormatOptions, ParseOptions, ParsleyConfig, CONFIG_FILE_NAME};
pub use cst::{CstToken, ParseBundle, ParsedFile, TokenFile};
pub use diagnostics::{
    render_diagnostic, render_diagnostics, Diagnostic, DiagnosticSeverity, FileDiagnostic,
    Position, Span,
};
pub use formatter::format_program;
pub use lexer::{tokenize, tokenize_with_raw_text_tags, Lexer};
pub use surface::{parse_program, parse_program_with_options, Program};
pub use token::{Token, TokenKind};

pub const SOURCE_EXTENSION: &str = "pars";

#[derive(Debug, thiserror::Error)]
pub enum ParsleyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Invalid config: {0}")]
    Config(String),
    #[error("{path} is {size} bytes, over the limit of {limit} bytes")]
    SourceTooLarge {
        path: String,
        size: usize,
        limit: usize,
    },
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    /// Error diagnostics were produced and already reported.
    #[error("diagnostics reported")]
    Diagnostics,
}

/// Parses `source`, refusing input over `max_source_bytes`. `label` names the source in errors.
pub fn parse_source_with_options(
    label: &str,
    source: &str,
    options: &ParseOptions,
) -> Result<Program, ParsleyError> {
    check_size(label, source, options)?;
    Ok(parse_program_with_options(source, options))
}

/// Lexes `source` with the raw-text tags from `options`, without the end-of-input token.
pub fn tokenize_source(
    label: &str,
    source: &str,
    options: &ParseOptions,
) -> Result<(Vec<Token>, Vec<Diagnostic>), ParsleyError> {
    check_size(label, source, options)?;
    Ok(tokenize_with_raw_text_tags(
        source,
        options.raw_text_tags.clone(),
    ))
}

fn check_size(label: &str, source: &str, options: &ParseOptions) -> Result<(), ParsleyError> {
    if source.len() > options.max_source_bytes {
        return Err(ParsleyError::SourceTooLarge {
            path: label.to_string(),
            size: source.len(),
            limit: options.max_source_bytes,
        });
    }
    Ok(())
}

pub fn parse_target(target: &str, options: &ParseOptions) -> Result<ParseBundle, ParsleyError> {
    let mut files = Vec::new();
    for path in expand_target(target)? {
        files.push(parse_file(&path, options)?);
    }
    Ok(ParseBundle { files })
}

pub fn parse_file(path: &Path, options: &ParseOptions) -> Result<ParsedFile, ParsleyError> {
    let content = fs::read_to_string(path)?;
    let label = path.display().to_string();
    let program = parse_source_with_options(&label, &content, options)?;
    Ok(ParsedFile {
        path: label,
        byte_count: content.len(),
        line_count: content.lines().count(),
        program,
    })
}

pub fn tokenize_file(path: &Path, options: &ParseOptions) -> Result<TokenFile, ParsleyError> {
    let content = fs::read_to_string(path)?;
    let label = path.display().to_string();
    let (tokens, diagnostics) = tokenize_source(&label, &content, options)?;
    Ok(TokenFile {
        path: label,
        tokens: tokens.into_iter().map(CstToken::from).collect(),
        diagnostics,
    })
}

/// Every diagnostic of every file in `target`, in file order.
pub fn check_target(
    target: &str,
    options: &ParseOptions,
) -> Result<Vec<FileDiagnostic>, ParsleyError> {
    let bundle = parse_target(target, options)?;
    Ok(bundle
        .files
        .into_iter()
        .flat_map(|file| {
            let path = file.path;
            file.program
                .diagnostics
                .into_iter()
                .map(move |diagnostic| FileDiagnostic {
                    path: path.clone(),
                    diagnostic,
                })
        })
        .collect())
}

/// Expands a file, a directory of `*.pars` files, or `dir/...` for a recursive walk.
pub fn expand_target(target: &str) -> Result<Vec<PathBuf>, ParsleyError> {
    let mut paths = Vec::new();
    let (base, recursive) = match target.strip_suffix("/...") {
        Some(base) => (if base.is_empty() { "." } else { base }, true),
        None if target == "..." => (".", true),
        None => (target, false),
    };

    let Some(path) = resolve_target_path(base) else {
        return Err(ParsleyError::InvalidPath(target.to_string()));
    };

    if path.is_file() {
        return Ok(vec![path]);
    }

    if path.is_dir() {
        if recursive {
            collect_files(&path, &mut paths)?;
        } else {
            for entry in fs::read_dir(&path)? {
                let entry_path = entry?.path();
                if entry_path.is_file() && is_source_file(&entry_path) {
                    paths.push(entry_path);
                }
            }
        }
    }

    paths.sort();
    if paths.is_empty() {
        return Err(ParsleyError::InvalidPath(target.to_string()));
    }
    Ok(paths)
}

/// Relative targets that do not exist are retried against each ancestor holding a
/// `parsley.toml`.
fn resolve_target_path(target: &str) -> Option<PathBuf> {
    let target_path = Path::new(target);
    if target_path.exists() {
        return Some(target_path.to_path_buf());
    }
    if target_path.is_absolute() {
        return None;
    }

    let mut dir = std::env::current_dir().ok()?;
    loop {
        if dir.join(CONFIG_FILE_NAME).exists() {
            let candidate = dir.join(target);
            if candidate.exists() {
                return Some(candidate);
            }
        }
        dir = dir.parent()?.to_path_buf();
    }
}

fn collect_files(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<(), ParsleyError> {
    for entry in fs::read_dir(dir)? {
        let entry_path = entry?.path();
        if entry_path.is_dir() {
            collect_files(&entry_path, paths)?;
        } else if is_source_file(&entry_path) {
            paths.push(entry_path);
        }
    }
    Ok(())
}

fn is_source_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(SOURCE_EXTENSION)
}
