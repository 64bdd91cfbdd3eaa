//! Human-readable text output formatter

use super::OutputFormatter;
use crate::diagnostic::{Diagnostic, Severity};
use crate::host::ScanReport;
use colored::*;
use std::path::Path;

/// Text formatter with optional color support
pub struct TextFormatter {
    /// Enable colored output
    pub colored: bool,

    /// Show help text
    pub show_help: bool,

    /// Show the summary line
    pub show_stats: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            colored: true,
            show_help: true,
            show_stats: true,
        }
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn severity_str(&self, severity: Severity) -> ColoredString {
        let s = severity.to_string();
        if !self.colored {
            return s.normal();
        }
        match severity {
            Severity::Error => s.red().bold(),
            Severity::Warning => s.yellow().bold(),
            Severity::Info => s.blue(),
        }
    }

    fn paint(&self, text: String, color: Color) -> String {
        if self.colored {
            text.color(color).to_string()
        } else {
            text
        }
    }

    fn count(&self, n: usize, singular: &str, plural: &str, color: Color) -> Option<String> {
        (n > 0).then(|| self.paint(format!("{} {}", n, if n == 1 { singular } else { plural }), color))
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &ScanReport) -> String {
        let mut output = String::new();

        for file in report.results.iter().filter(|r| !r.diagnostics.is_empty()) {
            let name = file.path.display().to_string();
            if self.colored {
                output.push_str(&format!("{}\n", name.underline()));
            } else {
                output.push_str(&format!("{}\n", name));
            }

            for diag in &file.diagnostics {
                output.push_str(&self.format_diagnostic(&file.path, diag));
            }
            output.push('\n');
        }

        if self.show_stats {
            output.push_str(&format!(
                "{} {} scanned",
                report.files_scanned,
                if report.files_scanned == 1 { "file" } else { "files" }
            ));
            if report.files_skipped > 0 {
                output.push_str(&format!(", {} skipped", report.files_skipped));
            }
            if report.files_failed > 0 {
                output.push_str(&format!(", {} failed", report.files_failed));
            }

            let counts: Vec<String> = [
                self.count(report.error_count, "error", "errors", Color::Red),
                self.count(report.warning_count, "warning", "warnings", Color::Yellow),
                self.count(report.info_count, "info", "infos", Color::Blue),
            ]
            .into_iter()
            .flatten()
            .collect();

            if !counts.is_empty() {
                output.push_str(&format!(": {}", counts.join(", ")));
            }
            output.push('\n');

            output.push_str(&format!(
                "Finished in {:.2}s\n",
                report.duration.as_secs_f64()
            ));
        }

        output
    }

    fn format_diagnostic(&self, path: &Path, diag: &Diagnostic) -> String {
        let mut output = format!(
            "{}:{}:{}: {}[{}]: {}\n",
            path.display(),
            diag.position.line,
            diag.position.column,
            self.severity_str(diag.severity),
            self.paint(diag.code.clone(), Color::Cyan),
            diag.message
        );

        if self.show_help {
            if let Some(help) = &diag.help {
                output.push_str(&format!(
                    "   {} help: {}\n",
                    self.paint("=".to_string(), Color::Blue),
                    help
                ));
            }
        }

        output
    }
}
