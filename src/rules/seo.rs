//! SEO rules - title, meta description, canonical, structured data, Open Graph, head order

use super::{Rule, ScanContext};
use crate::diagnostic::{Diagnostic, RuleCategory, Span};
use crate::scanner::{is_dynamic_value, Tag};
use regex::Regex;
use std::sync::LazyLock;

/// Charset declarations further than this into the head are reported
pub const CHARSET_NEAR_START_BYTES: usize = 100;

/// Open Graph properties checked for coverage
pub const OPEN_GRAPH_TAGS: [&str; 4] = ["og:title", "og:description", "og:image", "og:url"];

/// Missing Open Graph tags needed before the page is reported
pub const OPEN_GRAPH_MISSING_THRESHOLD: usize = 3;

static PRODUCT_HINTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:products?|pdp|sku|price|add[-_ ]?to[-_ ]?cart)\b").unwrap()
});

static ARTICLE_HINTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:blog|articles?|news|posts?)\b").unwrap());

/// Span of the head's opening tag, or the document start
fn head_anchor(ctx: &ScanContext<'_>) -> Span {
    ctx.metrics
        .head
        .map(|h| h.open_tag)
        .unwrap_or_else(Span::document_start)
}

/// Text between an opening tag and its matching close (or the next tag)
fn element_text<'a>(ctx: &ScanContext<'a>, open_index: usize) -> (&'a str, Span) {
    let open = &ctx.tags[open_index];
    let close = ctx.tags[open_index + 1..]
        .iter()
        .find(|t| t.closes(&open.name));
    let end = close
        .map(|c| c.span.start)
        .or_else(|| ctx.tags.get(open_index + 1).map(|t| t.span.start))
        .unwrap_or(ctx.text.len());
    let span_end = close.map(|c| c.span.end).unwrap_or(end);
    let content = ctx.text.get(open.span.end..end).unwrap_or_default();
    (content, Span::new(open.span.start, span_end))
}

/// Title presence and length
pub struct TitleRule;

impl Rule for TitleRule {
    fn id(&self) -> &'static str {
        "title"
    }

    fn description(&self) -> &'static str {
        "Pages need a <title> whose length fits the configured range"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Seo
    }

    fn codes(&self) -> &'static [&'static str] {
        &["SEO_TITLE_LENGTH", "SEO_TITLE_MISSING"]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let policy = ctx.policy;

        match ctx.tags.iter().position(|t| t.opens("title")) {
            Some(index) => {
                let (content, span) = element_text(ctx, index);
                let title = content.trim();
                if is_dynamic_value(title) {
                    return diagnostics;
                }

                let length = title.chars().count();
                if length < policy.title_min || length > policy.title_max {
                    diagnostics.push(
                        Diagnostic::warning(
                            "SEO_TITLE_LENGTH",
                            RuleCategory::Seo,
                            format!(
                                "Title is {} characters; keep it between {} and {}",
                                length, policy.title_min, policy.title_max
                            ),
                            span,
                        )
                        .with_help("Search results truncate long titles and undervalue short ones"),
                    );
                }
            }
            None => {
                let metrics = ctx.metrics;
                if metrics.has_head() && !metrics.head_managed && !metrics.component_file {
                    diagnostics.push(
                        Diagnostic::warning(
                            "SEO_TITLE_MISSING",
                            RuleCategory::Seo,
                            "Document head has no <title> element",
                            head_anchor(ctx),
                        )
                        .with_help("Add a descriptive <title> inside <head>"),
                    );
                }
            }
        }

        diagnostics
    }
}

/// Meta description presence and length
pub struct MetaDescriptionRule;

impl Rule for MetaDescriptionRule {
    fn id(&self) -> &'static str {
        "meta-description"
    }

    fn description(&self) -> &'static str {
        "Pages need a meta description whose length fits the configured range"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Seo
    }

    fn codes(&self) -> &'static [&'static str] {
        &["SEO_META_DESCRIPTION_LENGTH", "SEO_META_DESCRIPTION_MISSING"]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        let policy = ctx.policy;
        let meta = ctx.opening("meta").find(|t| {
            t.attr("name")
                .is_some_and(|n| n.eq_ignore_ascii_case("description"))
        });

        match meta {
            Some(tag) => {
                let content = tag.attr("content").unwrap_or_default().trim();
                if is_dynamic_value(content) {
                    return Vec::new();
                }

                let length = content.chars().count();
                if length < policy.meta_description_min || length > policy.meta_description_max {
                    return vec![Diagnostic::warning(
                        "SEO_META_DESCRIPTION_LENGTH",
                        RuleCategory::Seo,
                        format!(
                            "Meta description is {} characters; keep it between {} and {}",
                            length, policy.meta_description_min, policy.meta_description_max
                        ),
                        tag.span,
                    )];
                }
                Vec::new()
            }
            None if ctx.metrics.has_head() => vec![Diagnostic::warning(
                "SEO_META_DESCRIPTION_MISSING",
                RuleCategory::Seo,
                "Document head has no meta description",
                head_anchor(ctx),
            )
            .with_help("Add <meta name=\"description\" content=\"...\">")],
            None => Vec::new(),
        }
    }
}

/// Canonical link
pub struct CanonicalRule;

impl Rule for CanonicalRule {
    fn id(&self) -> &'static str {
        "canonical"
    }

    fn description(&self) -> &'static str {
        "Pages declare a canonical URL when the policy requires it"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Seo
    }

    fn codes(&self) -> &'static [&'static str] {
        &["SEO_CANONICAL_MISSING"]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        if !ctx.policy.require_canonical {
            return Vec::new();
        }

        let has_canonical = ctx
            .opening("link")
            .any(|t| t.attr_has_token("rel", "canonical"));
        if has_canonical {
            return Vec::new();
        }

        vec![Diagnostic::warning(
            "SEO_CANONICAL_MISSING",
            RuleCategory::Seo,
            "No canonical link found",
            Span::document_start(),
        )
        .with_help("Add <link rel=\"canonical\" href=\"...\"> to avoid duplicate-content splits")]
    }
}

/// JSON-LD hints for product and article pages
pub struct StructuredDataRule;

impl StructuredDataRule {
    fn has_json_ld(ctx: &ScanContext<'_>) -> bool {
        ctx.opening("script").any(|t| {
            t.attr("type")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("application/ld+json"))
        })
    }

    /// Anchor of the first keyword hit; `None` when neither text nor file name matches
    fn hint_span(ctx: &ScanContext<'_>, hints: &Regex) -> Option<Span> {
        if let Some(m) = hints.find(ctx.text) {
            return Some(Span::new(m.start(), m.end()));
        }
        hints
            .is_match(ctx.file_name)
            .then(Span::document_start)
    }
}

impl Rule for StructuredDataRule {
    fn id(&self) -> &'static str {
        "structured-data"
    }

    fn description(&self) -> &'static str {
        "Product and article pages should embed JSON-LD structured data"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Seo
    }

    fn codes(&self) -> &'static [&'static str] {
        &["SEO_JSONLD_PRODUCT_MISSING", "SEO_JSONLD_ARTICLE_MISSING"]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        if Self::has_json_ld(ctx) {
            return Vec::new();
        }

        let checks: [(&str, &Regex, &str); 2] = [
            ("Product", &*PRODUCT_HINTS, "SEO_JSONLD_PRODUCT_MISSING"),
            ("Article", &*ARTICLE_HINTS, "SEO_JSONLD_ARTICLE_MISSING"),
        ];

        checks
            .into_iter()
            .filter(|(page_type, _, _)| ctx.policy.requires_json_ld(page_type))
            .filter_map(|(page_type, hints, code)| {
                let span = Self::hint_span(ctx, hints)?;
                Some(
                    Diagnostic::info(
                        code,
                        RuleCategory::Seo,
                        format!(
                            "Looks like a {} page but has no JSON-LD structured data",
                            page_type.to_lowercase()
                        ),
                        span,
                    )
                    .with_help(format!(
                        "Add <script type=\"application/ld+json\"> with a schema.org {} object",
                        page_type
                    )),
                )
            })
            .collect()
    }
}

/// Open Graph coverage
pub struct OpenGraphRule;

impl OpenGraphRule {
    fn declares(tag: &Tag, property: &str) -> bool {
        ["property", "name"].iter().any(|attr| {
            tag.attr(attr)
                .is_some_and(|v| v.trim().eq_ignore_ascii_case(property))
        })
    }
}

impl Rule for OpenGraphRule {
    fn id(&self) -> &'static str {
        "open-graph"
    }

    fn description(&self) -> &'static str {
        "Pages should declare og:title, og:description, og:image and og:url"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Seo
    }

    fn codes(&self) -> &'static [&'static str] {
        &["SEO_OPEN_GRAPH_MISSING"]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        if !ctx.metrics.has_head() {
            return Vec::new();
        }

        let missing: Vec<&str> = OPEN_GRAPH_TAGS
            .iter()
            .copied()
            .filter(|property| !ctx.opening("meta").any(|t| Self::declares(t, property)))
            .collect();

        if missing.len() < OPEN_GRAPH_MISSING_THRESHOLD {
            return Vec::new();
        }

        vec![Diagnostic::info(
            "SEO_OPEN_GRAPH_MISSING",
            RuleCategory::Seo,
            format!("Missing Open Graph tags: {}", missing.join(", ")),
            head_anchor(ctx),
        )
        .with_help("Open Graph tags control how the page looks when shared")]
    }
}

/// Ordering of charset, title, stylesheets and scripts inside the head
pub struct HeadOrderRule;

impl HeadOrderRule {
    fn anchor(ctx: &ScanContext<'_>, absolute: usize) -> Span {
        ctx.tag_at(absolute)
            .map(|t| t.span)
            .unwrap_or_else(|| Span::new(absolute, absolute))
    }
}

impl Rule for HeadOrderRule {
    fn id(&self) -> &'static str {
        "head-order"
    }

    fn description(&self) -> &'static str {
        "Charset comes first in <head>, and <title> precedes stylesheets and scripts"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Seo
    }

    fn codes(&self) -> &'static [&'static str] {
        &[
            "SEO_HEAD_CHARSET_ORDER",
            "SEO_HEAD_TITLE_AFTER_STYLESHEET",
            "SEO_HEAD_TITLE_AFTER_SCRIPT",
        ]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        let Some(head) = ctx.metrics.head else {
            return Vec::new();
        };
        let mut diagnostics = Vec::new();

        if let Some(charset) = head.charset {
            if charset > CHARSET_NEAR_START_BYTES {
                diagnostics.push(
                    Diagnostic::warning(
                        "SEO_HEAD_CHARSET_ORDER",
                        RuleCategory::Seo,
                        format!(
                            "Charset declaration is {} bytes into <head>; it should be the first element",
                            charset
                        ),
                        Self::anchor(ctx, head.absolute(charset)),
                    )
                    .with_help("Browsers may re-parse the page when the charset is declared late"),
                );
            }
        }

        if let Some(title) = head.title {
            let title_span = Self::anchor(ctx, head.absolute(title));

            if head.first_stylesheet.is_some_and(|css| title > css) {
                diagnostics.push(Diagnostic::info(
                    "SEO_HEAD_TITLE_AFTER_STYLESHEET",
                    RuleCategory::Seo,
                    "<title> appears after a stylesheet link; move it above",
                    title_span,
                ));
            }

            if head.first_script.is_some_and(|script| title > script) {
                diagnostics.push(Diagnostic::info(
                    "SEO_HEAD_TITLE_AFTER_SCRIPT",
                    RuleCategory::Seo,
                    "<title> appears after a script tag; move it above",
                    title_span,
                ));
            }
        }

        diagnostics
    }
}
