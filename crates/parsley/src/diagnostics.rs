use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn point(line: usize, column: usize) -> Self {
        let pos = Position { line, column };
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticLabel {
    pub message: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub labels: Vec<DiagnosticLabel>,
}

impl Diagnostic {
    pub fn error(code: &str, message: impl Into<String>, span: Span) -> Self {
        Self {
            code: code.to_string(),
            severity: DiagnosticSeverity::Error,
            message: message.into(),
            span,
            hint: None,
            labels: Vec::new(),
        }
    }

    pub fn warning(code: &str, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            ..Self::error(code, message, span)
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_label(mut self, message: impl Into<String>, span: Span) -> Self {
        self.labels.push(DiagnosticLabel {
            message: message.into(),
            span,
        });
        self
    }

    pub fn line(&self) -> usize {
        self.span.start.line
    }

    pub fn column(&self) -> usize {
        self.span.start.column
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileDiagnostic {
    pub path: String,
    pub diagnostic: Diagnostic,
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Truncates a position-sorted list to `max` entries. If the cut would remove every
/// error, the first error takes the last kept slot, so a capped list still fails.
pub fn cap_diagnostics(diagnostics: &mut Vec<Diagnostic>, max: usize) {
    if diagnostics.len() <= max {
        return;
    }
    let first_error = if has_errors(&diagnostics[..max]) {
        None
    } else {
        diagnostics.iter().find(|d| d.is_error()).cloned()
    };
    diagnostics.truncate(max);
    if let Some(error) = first_error {
        diagnostics.pop();
        diagnostics.push(error);
    }
}

pub fn render_diagnostics(path: &str, diagnostics: &[Diagnostic]) -> String {
    let mut output = String::new();
    for (index, diagnostic) in diagnostics.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }
        output.push_str(&render_diagnostic(path, diagnostic));
    }
    output
}

pub fn render_diagnostic(path: &str, diagnostic: &Diagnostic) -> String {
    let mut output = String::new();
    let start = &diagnostic.span.start;
    let severity = match diagnostic.severity {
        DiagnosticSeverity::Error => "error",
        DiagnosticSeverity::Warning => "warning",
    };
    output.push_str(&format!(
        "{severity}[{}] {}:{}:{} {}\n",
        diagnostic.code, path, start.line, start.column, diagnostic.message
    ));
    if let Some(hint) = &diagnostic.hint {
        output.push_str(&format!("  hint: {hint}\n"));
    }
    for label in &diagnostic.labels {
        let pos = &label.span.start;
        output.push_str(&format!(
            "  note: {} at {}:{}:{}\n",
            label.message, path, pos.line, pos.column
        ));
    }
    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_hint_and_labels_under_the_headline() {
        let diag = Diagnostic::error("E1502", "mismatched tags", Span::point(3, 7))
            .with_hint("close <Foo> with </Foo>")
            .with_label("opened here", Span::point(1, 1));
        let rendered = render_diagnostic("page.pars", &diag);
        assert_eq!(
            rendered,
            "error[E1502] page.pars:3:7 mismatched tags\n  hint: close <Foo> with </Foo>\n  note: opened here at page.pars:1:1"
        );
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let diags = vec![Diagnostic::warning("E1517", "odd url", Span::point(1, 1))];
        assert!(!has_errors(&diags));
        assert!(render_diagnostics("a.pars", &diags).starts_with("warning[E1517]"));
    }

    #[test]
    fn capping_keeps_an_error_behind_leading_warnings() {
        let mut diags = vec![
            Diagnostic::warning("E1517", "odd url", Span::point(1, 1)),
            Diagnostic::warning("E1517", "odd url", Span::point(2, 1)),
            Diagnostic::error("E1500", "unexpected ')'", Span::point(3, 1)),
        ];
        cap_diagnostics(&mut diags, 2);
        let codes: Vec<&str> = diags.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["E1517", "E1500"]);
        assert!(has_errors(&diags));
    }

    #[test]
    fn zero_cap_still_reports_one_error() {
        let mut diags = vec![
            Diagnostic::error("E1501", "expected '='", Span::point(1, 5)),
            Diagnostic::error("E1500", "unexpected ')'", Span::point(2, 1)),
        ];
        cap_diagnostics(&mut diags, 0);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "E1501");

        let mut warnings = vec![Diagnostic::warning("E1517", "odd url", Span::point(1, 1))];
        cap_diagnostics(&mut warnings, 0);
        assert!(warnings.is_empty());
    }
}
