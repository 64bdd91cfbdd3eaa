//! Output formatters for scan reports

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::diagnostic::Diagnostic;
use crate::host::ScanReport;
use std::path::Path;

/// Output formatter trait
pub trait OutputFormatter: Send + Sync {
    /// Format a whole batch report
    fn format(&self, report: &ScanReport) -> String;

    /// Format a single diagnostic of `path`
    fn format_diagnostic(&self, path: &Path, diagnostic: &Diagnostic) -> String;
}
