//! Dependency cost model
//!
//! Import and require statements are matched against a small table of packages
//! known to be heavy. This is a lookup, not a resolver: only exact package names
//! in the table are recognized, and the weights are rough minified estimates.

use crate::diagnostic::{Diagnostic, RuleCategory, Span};
use crate::rules::{Rule, ScanContext};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Total estimated weight above which a warning is emitted
pub const BUNDLE_SIZE_LARGE_KB: usize = 500;
/// Total estimated weight above which an error is emitted
pub const BUNDLE_SIZE_EXCESSIVE_KB: usize = 1000;

/// `from "x"`, `import("x")`, `import "x"`, `require("x")`; group 2 is the specifier
static IMPORT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:\bfrom\s+|\bimport\s*\(\s*|\bimport\s+|\brequire\s*\(\s*)(["'`])([^"'`\s]+)["'`]"#,
    )
    .unwrap()
});

/// One table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeavyDependency {
    pub package: String,
    /// Estimated minified weight in KB
    pub estimated_kb: usize,
    /// Lighter replacement, when there is an obvious one
    pub alternative: Option<String>,
}

impl HeavyDependency {
    pub fn new(package: &str, estimated_kb: usize, alternative: Option<&str>) -> Self {
        Self {
            package: package.to_string(),
            estimated_kb,
            alternative: alternative.map(str::to_string),
        }
    }
}

/// Package name to cost
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTable {
    entries: BTreeMap<String, HeavyDependency>,
}

impl Default for DependencyTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DependencyTable {
    pub fn new<I: IntoIterator<Item = HeavyDependency>>(entries: I) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|dep| (dep.package.clone(), dep))
                .collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::new([
            HeavyDependency::new("moment", 290, Some("dayjs or date-fns")),
            HeavyDependency::new("lodash", 530, Some("lodash-es with per-method imports")),
            HeavyDependency::new("jquery", 87, Some("native DOM APIs")),
            HeavyDependency::new("@material-ui/core", 330, Some("@mui/material with path imports")),
            HeavyDependency::new("@mui/material", 310, Some("path imports (@mui/material/Button)")),
            HeavyDependency::new("antd", 420, None),
            HeavyDependency::new("rxjs", 150, None),
            HeavyDependency::new("d3", 280, Some("individual d3-* modules")),
            HeavyDependency::new("three", 600, None),
            HeavyDependency::new("chart.js", 200, Some("uPlot")),
            HeavyDependency::new("aws-sdk", 900, Some("@aws-sdk/client-* (v3)")),
            HeavyDependency::new("core-js", 240, None),
            HeavyDependency::new("xlsx", 430, None),
        ])
    }

    pub fn lookup(&self, package: &str) -> Option<&HeavyDependency> {
        self.entries.get(package)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Package identity of an import specifier.
///
/// `@scope/name/deep/path` collapses to `@scope/name`, `name/deep` to `name`.
/// Relative paths and `node:` builtins have no package identity.
pub fn package_identity(specifier: &str) -> Option<&str> {
    let specifier = specifier.trim();
    if specifier.is_empty()
        || specifier.starts_with('.')
        || specifier.starts_with('/')
        || specifier.starts_with("node:")
    {
        return None;
    }

    let segments = if specifier.starts_with('@') { 2 } else { 1 };
    let end = specifier
        .match_indices('/')
        .nth(segments - 1)
        .map(|(i, _)| i)
        .unwrap_or(specifier.len());
    Some(&specifier[..end])
}

/// An import statement that resolved to a package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportRef<'a> {
    pub package: &'a str,
    /// Span of the specifier inside its quotes
    pub span: Span,
}

/// Every package-level import in `text`, in source order
pub fn scan_imports(text: &str) -> Vec<ImportRef<'_>> {
    IMPORT_REGEX
        .captures_iter(text)
        .filter_map(|caps| {
            let specifier = caps.get(2)?;
            let package = package_identity(specifier.as_str())?;
            Some(ImportRef {
                package,
                span: Span::new(specifier.start(), specifier.end()),
            })
        })
        .collect()
}

/// Heavy imports and the estimated bundle total
pub struct HeavyImportsRule;

impl Rule for HeavyImportsRule {
    fn id(&self) -> &'static str {
        "heavy-imports"
    }

    fn description(&self) -> &'static str {
        "Imports of known heavy packages and their estimated bundle weight"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Bundle
    }

    fn codes(&self) -> &'static [&'static str] {
        &[
            "BUNDLE_HEAVY_DEPENDENCY",
            "BUNDLE_SIZE_LARGE",
            "BUNDLE_SIZE_EXCESSIVE",
        ]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        let table = &ctx.tables.dependencies;
        let mut diagnostics = Vec::new();
        let mut total_kb = 0;

        for import in scan_imports(ctx.text) {
            let Some(dep) = table.lookup(import.package) else {
                continue;
            };
            total_kb += dep.estimated_kb;

            let message = match &dep.alternative {
                Some(alt) => format!(
                    "'{}' adds about {}KB; consider {}",
                    dep.package, dep.estimated_kb, alt
                ),
                None => format!("'{}' adds about {}KB", dep.package, dep.estimated_kb),
            };
            diagnostics.push(Diagnostic::info(
                "BUNDLE_HEAVY_DEPENDENCY",
                RuleCategory::Bundle,
                message,
                import.span,
            ));
        }

        if total_kb > BUNDLE_SIZE_LARGE_KB {
            diagnostics.push(
                Diagnostic::warning(
                    "BUNDLE_SIZE_LARGE",
                    RuleCategory::Bundle,
                    format!(
                        "Heavy dependencies add about {}KB (more than {}KB)",
                        total_kb, BUNDLE_SIZE_LARGE_KB
                    ),
                    Span::document_start(),
                )
                .with_help("Code-split heavy packages or replace them with lighter ones"),
            );
        }

        if total_kb > BUNDLE_SIZE_EXCESSIVE_KB {
            diagnostics.push(Diagnostic::error(
                "BUNDLE_SIZE_EXCESSIVE",
                RuleCategory::Bundle,
                format!(
                    "Heavy dependencies add about {}KB (more than {}KB)",
                    total_kb, BUNDLE_SIZE_EXCESSIVE_KB
                ),
                Span::document_start(),
            ));
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{codes, run_default};

    #[test]
    fn test_package_identity() {
        assert_eq!(package_identity("@material-ui/core/Button"), Some("@material-ui/core"));
        assert_eq!(package_identity("@mui/material"), Some("@mui/material"));
        assert_eq!(package_identity("lodash/debounce"), Some("lodash"));
        assert_eq!(package_identity("moment"), Some("moment"));
        assert_eq!(package_identity("@scope"), Some("@scope"));
        assert_eq!(package_identity("./local"), None);
        assert_eq!(package_identity("../up/one"), None);
        assert_eq!(package_identity("node:fs"), None);
    }

    #[test]
    fn test_scan_imports_forms() {
        let text = r#"import Button from "@material-ui/core/Button";
import 'core-js/stable';
const _ = require('lodash');
const chart = await import("chart.js/auto");
export { x } from './x';"#;
        let packages: Vec<_> = scan_imports(text).iter().map(|i| i.package).collect();
        assert_eq!(
            packages,
            vec!["@material-ui/core", "core-js", "lodash", "chart.js"]
        );
    }

    #[test]
    fn test_scoped_import_attributed_to_package() {
        let text = "import Button from '@material-ui/core/Button';";
        let diags = run_default(&HeavyImportsRule, text, "App.jsx");
        assert_eq!(codes(&diags), vec!["BUNDLE_HEAVY_DEPENDENCY"]);
        assert!(diags[0].message.starts_with("'@material-ui/core' adds about 330KB"));
        assert_eq!(
            &text[diags[0].span.start..diags[0].span.end],
            "@material-ui/core/Button"
        );
    }

    #[test]
    fn test_unknown_packages_ignored() {
        let text = "import React from 'react';\nimport dayjs from 'dayjs';";
        assert!(run_default(&HeavyImportsRule, text, "App.jsx").is_empty());
    }

    #[test]
    fn test_warning_tier() {
        let text = "import moment from 'moment';\nimport $ from 'jquery';\nimport * as d3 from 'd3';";
        let diags = run_default(&HeavyImportsRule, text, "App.jsx");
        assert_eq!(
            codes(&diags),
            vec![
                "BUNDLE_HEAVY_DEPENDENCY",
                "BUNDLE_HEAVY_DEPENDENCY",
                "BUNDLE_HEAVY_DEPENDENCY",
                "BUNDLE_SIZE_LARGE"
            ]
        );
    }

    #[test]
    fn test_six_heavy_packages_yield_error() {
        let text = r#"import moment from 'moment';
import _ from 'lodash';
import $ from 'jquery';
import { Button } from '@material-ui/core';
import * as d3 from 'd3';
import { of } from 'rxjs';"#;
        let diags = run_default(&HeavyImportsRule, text, "App.jsx");
        let codes = codes(&diags);
        assert_eq!(codes.iter().filter(|c| **c == "BUNDLE_HEAVY_DEPENDENCY").count(), 6);
        assert!(codes.contains(&"BUNDLE_SIZE_LARGE"));
        assert_eq!(codes.last(), Some(&"BUNDLE_SIZE_EXCESSIVE"));
        assert!(diags.last().unwrap().message.contains("1667KB"));
    }

    #[test]
    fn test_each_import_statement_counts() {
        let text = "import map from 'lodash/map';\nimport filter from 'lodash/filter';";
        let diags = run_default(&HeavyImportsRule, text, "App.jsx");
        assert_eq!(
            codes(&diags),
            vec![
                "BUNDLE_HEAVY_DEPENDENCY",
                "BUNDLE_HEAVY_DEPENDENCY",
                "BUNDLE_SIZE_LARGE",
                "BUNDLE_SIZE_EXCESSIVE"
            ]
        );
        assert!(diags[3].message.contains("1060KB"));
        assert_ne!(diags[0].span, diags[1].span);
    }

    #[test]
    fn test_custom_table() {
        let table = DependencyTable::new([HeavyDependency::new("tiny", 1, None)]);
        assert_eq!(table.len(), 1);
        assert!(table.lookup("moment").is_none());
        assert_eq!(DependencyTable::builtin().lookup("three").map(|d| d.estimated_kb), Some(600));
    }
}
