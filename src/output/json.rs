//! JSON output formatter

use super::OutputFormatter;
use crate::diagnostic::Diagnostic;
use crate::host::ScanReport;
use serde::Serialize;
use std::path::Path;

/// JSON formatter for machine-readable output
#[derive(Default)]
pub struct JsonFormatter {
    /// Pretty print with indentation
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| {
            log::error!("Failed to serialize output: {}", e);
            String::new()
        })
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    diagnostics: Vec<JsonDiagnostic<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    file: String,
    code: &'a str,
    severity: String,
    category: &'static str,
    message: &'a str,
    line: usize,
    column: usize,
    start: usize,
    end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<&'a str>,
}

impl<'a> JsonDiagnostic<'a> {
    fn new(path: &Path, d: &'a Diagnostic) -> Self {
        Self {
            file: path.display().to_string(),
            code: &d.code,
            severity: d.severity.to_string(),
            category: d.category.as_str(),
            message: &d.message,
            line: d.position.line,
            column: d.position.column,
            start: d.span.start,
            end: d.span.end,
            help: d.help.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct JsonSummary {
    files_scanned: usize,
    files_skipped: usize,
    files_failed: usize,
    error_count: usize,
    warning_count: usize,
    info_count: usize,
    duration_ms: u128,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &ScanReport) -> String {
        let diagnostics = report
            .results
            .iter()
            .flat_map(|r| r.diagnostics.iter().map(move |d| JsonDiagnostic::new(&r.path, d)))
            .collect();

        let output = JsonOutput {
            diagnostics,
            summary: JsonSummary {
                files_scanned: report.files_scanned,
                files_skipped: report.files_skipped,
                files_failed: report.files_failed,
                error_count: report.error_count,
                warning_count: report.warning_count,
                info_count: report.info_count,
                duration_ms: report.duration.as_millis(),
            },
        };

        self.render(&output)
    }

    fn format_diagnostic(&self, path: &Path, diagnostic: &Diagnostic) -> String {
        self.render(&JsonDiagnostic::new(path, diagnostic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{RuleCategory, Span};
    use crate::host::FileReport;
    use std::path::PathBuf;

    fn diagnostic() -> Diagnostic {
        Diagnostic::warning(
            "SEO_TITLE_LENGTH",
            RuleCategory::Seo,
            "Title is 5 characters; keep it between 30 and 60",
            Span::new(6, 26),
        )
    }

    #[test]
    fn test_json_format_diagnostic() {
        let output = JsonFormatter::new().format_diagnostic(Path::new("index.html"), &diagnostic());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["code"], "SEO_TITLE_LENGTH");
        assert_eq!(value["severity"], "warning");
        assert_eq!(value["category"], "seo");
        assert_eq!(value["file"], "index.html");
        assert_eq!(value["start"], 6);
        assert!(value.get("help").is_none());
    }

    #[test]
    fn test_json_format_report() {
        let mut report = ScanReport::default();
        report.record(FileReport {
            path: PathBuf::from("index.html"),
            diagnostics: vec![diagnostic()],
        });
        report.files_skipped = 2;

        let output = JsonFormatter::new().format(&report);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["diagnostics"].as_array().unwrap().len(), 1);
        assert_eq!(value["summary"]["files_scanned"], 1);
        assert_eq!(value["summary"]["files_skipped"], 2);
        assert_eq!(value["summary"]["warning_count"], 1);
    }

    #[test]
    fn test_json_pretty() {
        let output = JsonFormatter::new().pretty().format(&ScanReport::default());
        assert!(output.contains('\n'));
        assert!(output.contains("  "));
    }
}
