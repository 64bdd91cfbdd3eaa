//! Render-budget rules - payload size, element count and nesting depth
//!
//! A crawler renders pages with finite budgets. Thresholds here are additive: a
//! document past the higher threshold also reports the lower one (except for the
//! exclusive payload bands, where only the 14MB critical check stacks).

use super::{Rule, ScanContext};
use crate::diagnostic::{Diagnostic, RuleCategory, Span};
use crate::scanner::DepthTracker;

pub const KB: usize = 1024;
pub const MB: usize = 1024 * 1024;

pub const HTML_SIZE_LARGE: usize = 100 * KB;
pub const HTML_SIZE_EXCESSIVE: usize = 150 * KB;
pub const HTML_SIZE_LIMIT: usize = 10 * MB;
pub const HTML_SIZE_CRITICAL: usize = 14 * MB;
/// Payload ceiling of the rendering service
pub const RENDER_CEILING_MB: usize = 15;

pub const DOM_SIZE_LARGE: usize = 800;
pub const DOM_SIZE_EXCESSIVE: usize = 1500;

pub const DOM_DEPTH_DEEP: usize = 25;
pub const DOM_DEPTH_EXCESSIVE: usize = 32;

fn format_size(bytes: usize) -> String {
    if bytes >= MB {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    } else {
        format!("{}KB", bytes / KB)
    }
}

/// HTML payload size bands
pub struct HtmlSizeRule;

impl Rule for HtmlSizeRule {
    fn id(&self) -> &'static str {
        "html-size"
    }

    fn description(&self) -> &'static str {
        "HTML payload stays within the crawler's rendering budget"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::RenderBudget
    }

    fn codes(&self) -> &'static [&'static str] {
        &[
            "RENDER_HTML_SIZE_LARGE",
            "RENDER_HTML_SIZE_EXCESSIVE",
            "RENDER_HTML_SIZE_LIMIT",
            "RENDER_HTML_SIZE_CRITICAL",
        ]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        let size = ctx.metrics.byte_size;
        let shown = format_size(size);
        let mut diagnostics = Vec::new();

        if size > HTML_SIZE_LIMIT {
            diagnostics.push(
                Diagnostic::warning(
                    "RENDER_HTML_SIZE_LIMIT",
                    RuleCategory::RenderBudget,
                    format!(
                        "HTML is {}; content past {}MB is not rendered",
                        shown, RENDER_CEILING_MB
                    ),
                    Span::document_start(),
                )
                .with_help("Split the page or move data out of the markup"),
            );
        } else if size > HTML_SIZE_EXCESSIVE {
            diagnostics.push(
                Diagnostic::error(
                    "RENDER_HTML_SIZE_EXCESSIVE",
                    RuleCategory::RenderBudget,
                    format!(
                        "HTML is {} (more than {}KB)",
                        shown,
                        HTML_SIZE_EXCESSIVE / KB
                    ),
                    Span::document_start(),
                )
                .with_help("Paginate long lists and avoid inlining large data"),
            );
        } else if size > HTML_SIZE_LARGE {
            diagnostics.push(Diagnostic::warning(
                "RENDER_HTML_SIZE_LARGE",
                RuleCategory::RenderBudget,
                format!("HTML is {} (more than {}KB)", shown, HTML_SIZE_LARGE / KB),
                Span::document_start(),
            ));
        }

        if size > HTML_SIZE_CRITICAL {
            diagnostics.push(Diagnostic::error(
                "RENDER_HTML_SIZE_CRITICAL",
                RuleCategory::RenderBudget,
                format!(
                    "HTML is {}, close to the {}MB rendering ceiling",
                    shown, RENDER_CEILING_MB
                ),
                Span::document_start(),
            ));
        }

        diagnostics
    }
}

/// Span of the tag that takes the element count past `threshold`
fn element_crossing(ctx: &ScanContext<'_>, threshold: usize) -> Span {
    let void = &ctx.tables.void_elements;
    ctx.tags
        .iter()
        .filter(|t| void.opens_element(t))
        .nth(threshold)
        .map(|t| t.span)
        .unwrap_or_else(Span::document_start)
}

/// Span of the tag that takes the nesting depth past `threshold`
fn depth_crossing(ctx: &ScanContext<'_>, threshold: usize) -> Span {
    let void = &ctx.tables.void_elements;
    let mut tracker = DepthTracker::new();
    ctx.tags
        .iter()
        .find(|t| {
            tracker.feed(t, void);
            tracker.depth() > threshold
        })
        .map(|t| t.span)
        .unwrap_or_else(Span::document_start)
}

/// Element count budget
pub struct DomSizeRule;

impl Rule for DomSizeRule {
    fn id(&self) -> &'static str {
        "dom-size"
    }

    fn description(&self) -> &'static str {
        "Element count stays within the rendering budget"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::RenderBudget
    }

    fn codes(&self) -> &'static [&'static str] {
        &["RENDER_DOM_SIZE_LARGE", "RENDER_DOM_SIZE_EXCESSIVE"]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        let count = ctx.metrics.element_count;
        let mut diagnostics = Vec::new();

        if count > DOM_SIZE_LARGE {
            diagnostics.push(Diagnostic::info(
                "RENDER_DOM_SIZE_LARGE",
                RuleCategory::RenderBudget,
                format!("{} elements (more than {})", count, DOM_SIZE_LARGE),
                element_crossing(ctx, DOM_SIZE_LARGE),
            ));
        }

        if count > DOM_SIZE_EXCESSIVE {
            diagnostics.push(
                Diagnostic::error(
                    "RENDER_DOM_SIZE_EXCESSIVE",
                    RuleCategory::RenderBudget,
                    format!("{} elements (more than {})", count, DOM_SIZE_EXCESSIVE),
                    element_crossing(ctx, DOM_SIZE_EXCESSIVE),
                )
                .with_help("Virtualize long lists and remove wrapper elements"),
            );
        }

        diagnostics
    }
}

/// Nesting depth budget
pub struct DomDepthRule;

impl Rule for DomDepthRule {
    fn id(&self) -> &'static str {
        "dom-depth"
    }

    fn description(&self) -> &'static str {
        "Nesting depth stays within the rendering budget"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::RenderBudget
    }

    fn codes(&self) -> &'static [&'static str] {
        &["RENDER_DOM_DEPTH_DEEP", "RENDER_DOM_DEPTH_EXCESSIVE"]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        let depth = ctx.metrics.max_depth;
        let mut diagnostics = Vec::new();

        if depth > DOM_DEPTH_DEEP {
            diagnostics.push(Diagnostic::info(
                "RENDER_DOM_DEPTH_DEEP",
                RuleCategory::RenderBudget,
                format!("Elements nest {} levels deep (more than {})", depth, DOM_DEPTH_DEEP),
                depth_crossing(ctx, DOM_DEPTH_DEEP),
            ));
        }

        if depth > DOM_DEPTH_EXCESSIVE {
            diagnostics.push(
                Diagnostic::error(
                    "RENDER_DOM_DEPTH_EXCESSIVE",
                    RuleCategory::RenderBudget,
                    format!(
                        "Elements nest {} levels deep (more than {})",
                        depth, DOM_DEPTH_EXCESSIVE
                    ),
                    depth_crossing(ctx, DOM_DEPTH_EXCESSIVE),
                )
                .with_help("Flatten wrapper elements"),
            );
        }

        diagnostics
    }
}
