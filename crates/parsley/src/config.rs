use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::syntax::DEFAULT_RAW_TEXT_TAGS;
use crate::ParsleyError;

pub const CONFIG_FILE_NAME: &str = "parsley.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsleyConfig {
    #[serde(default)]
    pub parse: ParseConfig,
    #[serde(default)]
    pub format: FormatConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParseConfig {
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: usize,
    #[serde(default = "default_max_diagnostics")]
    pub max_diagnostics: usize,
    #[serde(default = "default_raw_text_tags")]
    pub raw_text_tags: Vec<String>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            max_source_bytes: default_max_source_bytes(),
            max_diagnostics: default_max_diagnostics(),
            raw_text_tags: default_raw_text_tags(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormatConfig {
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent_width: default_indent_width(),
        }
    }
}

fn default_max_source_bytes() -> usize {
    1024 * 1024
}

fn default_max_diagnostics() -> usize {
    200
}

fn default_raw_text_tags() -> Vec<String> {
    DEFAULT_RAW_TEXT_TAGS.iter().map(|t| t.to_string()).collect()
}

fn default_indent_width() -> usize {
    4
}

/// Options threaded through the lexer and parser.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub max_source_bytes: usize,
    pub max_diagnostics: usize,
    pub raw_text_tags: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseConfig::default().into()
    }
}

impl From<ParseConfig> for ParseOptions {
    fn from(config: ParseConfig) -> Self {
        Self {
            max_source_bytes: config.max_source_bytes,
            max_diagnostics: config.max_diagnostics,
            raw_text_tags: config.raw_text_tags,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub indent_width: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatConfig::default().into()
    }
}

impl From<FormatConfig> for FormatOptions {
    fn from(config: FormatConfig) -> Self {
        Self {
            indent_width: config.indent_width,
        }
    }
}

impl ParsleyConfig {
    pub fn parse_options(&self) -> ParseOptions {
        self.parse.clone().into()
    }

    pub fn format_options(&self) -> FormatOptions {
        self.format.clone().into()
    }
}

pub fn read_config(path: &Path) -> Result<ParsleyConfig, ParsleyError> {
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text)
        .map_err(|err| ParsleyError::Config(format!("failed to parse {}: {err}", path.display())))
}

/// Reads `explicit` when given, else `parsley.toml` in `dir` if present, else defaults.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<ParsleyConfig, ParsleyError> {
    if let Some(path) = explicit {
        return read_config(path);
    }
    let candidate: PathBuf = dir.join(CONFIG_FILE_NAME);
    if candidate.is_file() {
        return read_config(&candidate);
    }
    Ok(ParsleyConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: ParsleyConfig = toml::from_str("").expect("parse");
        assert_eq!(config.parse.max_source_bytes, 1048576);
        assert_eq!(config.parse.max_diagnostics, 200);
        assert_eq!(config.parse.raw_text_tags, vec!["style", "script"]);
        assert_eq!(config.format.indent_width, 4);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: ParsleyConfig = toml::from_str(
            "[parse]\nmax_diagnostics = 5\n\n[format]\nindent_width = 2\n",
        )
        .expect("parse");
        let options = config.parse_options();
        assert_eq!(options.max_diagnostics, 5);
        assert_eq!(options.max_source_bytes, 1048576);
        assert_eq!(config.format_options().indent_width, 2);
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("parsley-config-test-missing");
        let config = load_config(None, &dir).expect("defaults");
        assert_eq!(config.format.indent_width, 4);
    }

    #[test]
    fn malformed_config_reports_the_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[parse]\nmax_diagnostics = \"many\"\n").expect("write");
        let err = load_config(None, dir.path()).expect_err("bad config");
        assert!(matches!(err, ParsleyError::Config(ref msg) if msg.contains("parsley.toml")));
    }
}
