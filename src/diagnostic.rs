//! Diagnostic types for scan results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level for diagnostics
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational hint
    Info,
    /// Warning - likely SEO or performance risk
    #[default]
    Warning,
    /// Error - exceeds a hard budget
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" | "hint" | "note" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" | "err" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

/// Rule category for grouping related rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleCategory {
    /// Search-engine metadata and head structure
    Seo,
    /// Loading performance of scripts, images and fonts
    Performance,
    /// Limits of a crawler's rendering pipeline
    RenderBudget,
    /// Estimated script bundle weight
    Bundle,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Seo => "seo",
            RuleCategory::Performance => "performance",
            RuleCategory::RenderBudget => "render-budget",
            RuleCategory::Bundle => "bundle",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte range in the source text (`start..end`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Empty span at the start of the document
    pub fn document_start() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Clamp both ends into `text`, snapping back to char boundaries
    pub fn clamp_to(self, text: &str) -> Self {
        let snap = |mut offset: usize| {
            offset = offset.min(text.len());
            while !text.is_char_boundary(offset) {
                offset -= 1;
            }
            offset
        };
        Self::new(snap(self.start), snap(self.end))
    }
}

/// Line/column position (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Line start offsets of a document, for resolving byte offsets to positions
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { line_starts }
    }

    /// 1-based line and column (in chars) of a byte offset
    pub fn position(&self, text: &str, offset: usize) -> Position {
        let offset = offset.min(text.len());
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .max(1);
        let line_start = self.line_starts[line - 1];
        let column = text
            .get(line_start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(0);
        Position::new(line, column + 1)
    }
}

/// A scan diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable rule code (e.g. `SEO_TITLE_LENGTH`)
    pub code: String,
    /// Severity level
    pub severity: Severity,
    /// Rule category
    pub category: RuleCategory,
    /// Human-readable message
    pub message: String,
    /// Byte range of the offending construct
    pub span: Span,
    /// Start position of `span`, filled in by the engine
    #[serde(default)]
    pub position: Position,
    /// Help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(
        code: &str,
        severity: Severity,
        category: RuleCategory,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            code: code.to_string(),
            severity,
            category,
            message: message.into(),
            span,
            position: Position::default(),
            help: None,
        }
    }

    pub fn error(
        code: &str,
        category: RuleCategory,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self::new(code, Severity::Error, category, message, span)
    }

    pub fn warning(
        code: &str,
        category: RuleCategory,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self::new(code, Severity::Warning, category, message, span)
    }

    pub fn info(
        code: &str,
        category: RuleCategory,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self::new(code, Severity::Info, category, message, span)
    }

    /// Add help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Check if this is a warning
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}
