//! Seoscan - SEO and Render-Budget Linter
//!
//! Fast static checks for HTML and component files (JSX, TSX, Vue, Svelte,
//! Astro): search metadata, loading performance, the crawler's rendering
//! budgets and the weight of heavy imports.
//!
//! # Architecture
//!
//! ```text
//! CLI -> Host -> Engine -> tokenize -> StructuralMetrics -> RuleRegistry -> Vec<Diagnostic>
//! ```
//!
//! The engine is a pure function of `(text, file name, policy)`: it tokenizes
//! the document once, computes its structural metrics, runs every rule in
//! registry order and attaches line/column positions. The host walks
//! directories, applies the size gate and runs the engine over files in
//! parallel.
//!
//! # Example
//!
//! ```
//! use seoscan::{scan, Policy};
//!
//! let diagnostics = scan("<head><title>Short</title></head>", "index.html", &Policy::default());
//! assert!(diagnostics.iter().any(|d| d.code == "SEO_TITLE_LENGTH"));
//! ```

pub mod deps;
pub mod diagnostic;
pub mod engine;
pub mod host;
pub mod output;
pub mod policy;
pub mod rules;
pub mod scanner;

// Re-export main types
pub use deps::{DependencyTable, HeavyDependency, HeavyImportsRule};
pub use diagnostic::{Diagnostic, LineIndex, Position, RuleCategory, Severity, Span};
pub use engine::{scan, Engine, Tables};
pub use host::{FileReport, Host, HostOptions, ScanError, ScanReport};
pub use output::{JsonFormatter, OutputFormatter, TextFormatter};
pub use policy::{resolve, Policy, PolicyError, ProjectConfig};
pub use rules::{Rule, RuleRegistry, ScanContext};
pub use scanner::{StructuralMetrics, Tag, TagKind, VoidElements};
