//! Performance rules - scripts, images, fonts and resource hints

use super::{Rule, ScanContext};
use crate::diagnostic::{Diagnostic, RuleCategory, Span};
use crate::scanner::{is_dynamic_value, is_stylesheet, Tag, TagKind};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Framework image components (`next/image`, `@nuxt/image`)
pub const IMAGE_COMPONENTS: [&str; 3] = ["Image", "NuxtImg", "NuxtImage"];

/// `src` fragments that mark a likely largest-contentful-paint image
pub const LCP_HINTS: [&str; 3] = ["hero", "banner", "masthead"];

/// Font preloads allowed before the page is reported
pub const MAX_FONT_PRELOADS: usize = 4;

/// Origins listed in the preconnect finding
pub const MAX_LISTED_ORIGINS: usize = 3;

static FONT_FACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)@font-face\s*\{[^}]*\}").unwrap());

static FONT_DISPLAY_SWAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)font-display\s*:\s*swap\b").unwrap());

/// `<script src=...>` in any casing, including `<Script>` components
fn is_external_script(tag: &Tag) -> bool {
    tag.opens("script")
        && tag
            .attr("src")
            .is_some_and(|src| !src.trim().is_empty())
}

fn is_plain_img(tag: &Tag) -> bool {
    tag.opens("img") && !tag.is_component()
}

fn is_image_component(tag: &Tag) -> bool {
    tag.kind != TagKind::Close
        && tag.is_component()
        && IMAGE_COMPONENTS.contains(&tag.name.as_str())
}

/// Render-blocking external scripts; `type="module"` scripts and `<Script>` components are exempt
pub struct BlockingScriptRule;

impl Rule for BlockingScriptRule {
    fn id(&self) -> &'static str {
        "blocking-scripts"
    }

    fn description(&self) -> &'static str {
        "External scripts should load with async or defer"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Performance
    }

    fn codes(&self) -> &'static [&'static str] {
        &["PERF_BLOCKING_SCRIPT"]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        ctx.tags
            .iter()
            .filter(|t| is_external_script(t) && !t.is_component())
            .filter(|t| !t.flag("async") && !t.flag("defer"))
            // module scripts are deferred by the browser
            .filter(|t| !t.attr("type").is_some_and(|v| v.eq_ignore_ascii_case("module")))
            .map(|t| {
                Diagnostic::warning(
                    "PERF_BLOCKING_SCRIPT",
                    RuleCategory::Performance,
                    format!(
                        "Script '{}' blocks rendering",
                        t.attr("src").unwrap_or_default()
                    ),
                    t.span,
                )
                .with_help("Add async or defer, or move the script to the end of <body>")
            })
            .collect()
    }
}

/// Budget on external script tags per page
pub struct ThirdPartyScriptRule;

impl Rule for ThirdPartyScriptRule {
    fn id(&self) -> &'static str {
        "third-party-scripts"
    }

    fn description(&self) -> &'static str {
        "Pages should stay within the external script budget"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Performance
    }

    fn codes(&self) -> &'static [&'static str] {
        &["PERF_THIRD_PARTY_SCRIPTS"]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        let limit = ctx.policy.max_third_party_scripts_per_page;
        let scripts: Vec<&Tag> = ctx.tags.iter().filter(|t| is_external_script(t)).collect();

        if scripts.len() <= limit {
            return Vec::new();
        }

        vec![Diagnostic::warning(
            "PERF_THIRD_PARTY_SCRIPTS",
            RuleCategory::Performance,
            format!(
                "Page loads {} external scripts (limit {})",
                scripts.len(),
                limit
            ),
            scripts[limit].span,
        )
        .with_help("Bundle, lazy-load or drop scripts that are not needed for first render")]
    }
}

/// `alt`, dimensions and `loading` on plain `<img>` tags
pub struct ImageAttributesRule;

impl Rule for ImageAttributesRule {
    fn id(&self) -> &'static str {
        "img-attributes"
    }

    fn description(&self) -> &'static str {
        "Images need alt text, explicit width and height, and a loading attribute"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Performance
    }

    fn codes(&self) -> &'static [&'static str] {
        &[
            "PERF_IMG_MISSING_ALT",
            "PERF_IMG_MISSING_DIMENSIONS",
            "PERF_IMG_MISSING_LOADING",
        ]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for img in ctx.tags.iter().filter(|t| is_plain_img(t)) {
            if !img.has_attr("alt") {
                diagnostics.push(
                    Diagnostic::warning(
                        "PERF_IMG_MISSING_ALT",
                        RuleCategory::Performance,
                        "Image has no alt attribute",
                        img.span,
                    )
                    .with_help("Describe the image, or use alt=\"\" for decorative images"),
                );
            }

            if !img.has_attr("width") || !img.has_attr("height") {
                diagnostics.push(
                    Diagnostic::warning(
                        "PERF_IMG_MISSING_DIMENSIONS",
                        RuleCategory::Performance,
                        "Image has no explicit width and height",
                        img.span,
                    )
                    .with_help("Set width and height to reserve space and avoid layout shift"),
                );
            }

            if !img.has_attr("loading") {
                diagnostics.push(Diagnostic::info(
                    "PERF_IMG_MISSING_LOADING",
                    RuleCategory::Performance,
                    "Image has no loading attribute",
                    img.span,
                ));
            }
        }

        diagnostics
    }
}

/// `sizes` and priority on framework image components
pub struct ImageComponentRule;

impl ImageComponentRule {
    fn is_lcp_candidate(tag: &Tag) -> bool {
        let src_hint = tag.attr("src").is_some_and(|src| {
            let src = src.to_ascii_lowercase();
            LCP_HINTS.iter().any(|hint| src.contains(hint))
        });
        let high_priority = tag
            .attr("fetchpriority")
            .is_some_and(|v| v.eq_ignore_ascii_case("high"));
        src_hint || high_priority
    }

    fn is_prioritized(tag: &Tag) -> bool {
        tag.flag("priority") || tag.flag("preload")
    }
}

impl Rule for ImageComponentRule {
    fn id(&self) -> &'static str {
        "image-component"
    }

    fn description(&self) -> &'static str {
        "Image components need sizes, and likely LCP images need priority"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Performance
    }

    fn codes(&self) -> &'static [&'static str] {
        &["PERF_IMAGE_COMPONENT_SIZES", "PERF_IMAGE_COMPONENT_PRIORITY"]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for image in ctx.tags.iter().filter(|t| is_image_component(t)) {
            if !image.has_attr("sizes") {
                diagnostics.push(
                    Diagnostic::warning(
                        "PERF_IMAGE_COMPONENT_SIZES",
                        RuleCategory::Performance,
                        format!("<{}> has no sizes attribute", image.name),
                        image.span,
                    )
                    .with_help("Without sizes the largest srcset candidate is downloaded"),
                );
            }

            if Self::is_lcp_candidate(image) && !Self::is_prioritized(image) {
                diagnostics.push(
                    Diagnostic::info(
                        "PERF_IMAGE_COMPONENT_PRIORITY",
                        RuleCategory::Performance,
                        format!("<{}> looks like the largest contentful paint image", image.name),
                        image.span,
                    )
                    .with_help("Add the priority attribute so it is preloaded"),
                );
            }
        }

        diagnostics
    }
}

/// Decoded size of a `data:` URI payload in bytes
pub fn data_uri_bytes(src: &str) -> Option<usize> {
    let rest = src.trim().strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let size = if meta.to_ascii_lowercase().ends_with(";base64") {
        let encoded = payload.trim_end_matches('=').len();
        encoded * 3 / 4
    } else {
        payload.len()
    };
    Some(size)
}

/// Inline `data:` images over the LCP image budget
pub struct InlineImageRule;

impl Rule for InlineImageRule {
    fn id(&self) -> &'static str {
        "inline-image-size"
    }

    fn description(&self) -> &'static str {
        "Inline data URI images should stay under the LCP image budget"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Performance
    }

    fn codes(&self) -> &'static [&'static str] {
        &["PERF_INLINE_IMAGE_SIZE"]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        let budget_kb = ctx.policy.lcp_image_kb;

        ctx.tags
            .iter()
            .filter(|t| is_plain_img(t) || is_image_component(t))
            .filter_map(|t| {
                let bytes = data_uri_bytes(t.attr("src")?)?;
                let kb = bytes / 1024;
                (kb > budget_kb).then(|| {
                    Diagnostic::warning(
                        "PERF_INLINE_IMAGE_SIZE",
                        RuleCategory::Performance,
                        format!("Inline image is about {}KB (budget {}KB)", kb, budget_kb),
                        t.span,
                    )
                    .with_help("Serve large images as separate, cacheable files")
                })
            })
            .collect()
    }
}

/// `font-display: swap` and font preload count
pub struct FontLoadingRule;

impl Rule for FontLoadingRule {
    fn id(&self) -> &'static str {
        "font-loading"
    }

    fn description(&self) -> &'static str {
        "@font-face rules use font-display: swap and font preloads stay few"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Performance
    }

    fn codes(&self) -> &'static [&'static str] {
        &["PERF_FONT_DISPLAY_SWAP", "PERF_FONT_PRELOAD_EXCESS"]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if ctx.policy.require_font_display_swap {
            for block in FONT_FACE.find_iter(ctx.text) {
                if !FONT_DISPLAY_SWAP.is_match(block.as_str()) {
                    diagnostics.push(
                        Diagnostic::warning(
                            "PERF_FONT_DISPLAY_SWAP",
                            RuleCategory::Performance,
                            "@font-face has no font-display: swap",
                            Span::new(block.start(), block.end()),
                        )
                        .with_help("Text stays invisible until the font loads without it"),
                    );
                }
            }
        }

        let preloads: Vec<&Tag> = ctx
            .opening("link")
            .filter(|t| {
                t.attr_has_token("rel", "preload")
                    && t.attr("as").is_some_and(|v| v.eq_ignore_ascii_case("font"))
            })
            .collect();

        if preloads.len() > MAX_FONT_PRELOADS {
            diagnostics.push(
                Diagnostic::info(
                    "PERF_FONT_PRELOAD_EXCESS",
                    RuleCategory::Performance,
                    format!(
                        "{} fonts are preloaded (more than {})",
                        preloads.len(),
                        MAX_FONT_PRELOADS
                    ),
                    preloads[MAX_FONT_PRELOADS].span,
                )
                .with_help("Preload only the fonts used above the fold"),
            );
        }

        diagnostics
    }
}

/// Origin of an absolute or protocol-relative URL
pub fn external_origin(reference: &str) -> Option<String> {
    let reference = reference.trim();
    if is_dynamic_value(reference) {
        return None;
    }

    let url = if reference.starts_with("//") {
        Url::parse(&format!("https:{}", reference)).ok()?
    } else {
        Url::parse(reference).ok()?
    };

    match url.scheme() {
        "http" | "https" => Some(url.origin().ascii_serialization()),
        _ => None,
    }
}

/// Preconnect hints for external origins
pub struct ResourceHintRule;

impl Rule for ResourceHintRule {
    fn id(&self) -> &'static str {
        "resource-hints"
    }

    fn description(&self) -> &'static str {
        "Pages that load from external origins should preconnect to them"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Performance
    }

    fn codes(&self) -> &'static [&'static str] {
        &["PERF_PRECONNECT_MISSING"]
    }

    fn evaluate(&self, ctx: &ScanContext<'_>) -> Vec<Diagnostic> {
        let has_preconnect = ctx
            .opening("link")
            .any(|t| t.attr_has_token("rel", "preconnect"));
        if has_preconnect {
            return Vec::new();
        }

        let mut origins: Vec<String> = Vec::new();
        let mut anchor = None;

        for tag in ctx.tags {
            let reference = if is_external_script(tag) {
                tag.attr("src")
            } else if is_stylesheet(tag) {
                tag.attr("href")
            } else {
                None
            };

            if let Some(origin) = reference.and_then(external_origin) {
                anchor.get_or_insert(tag.span);
                if !origins.contains(&origin) {
                    origins.push(origin);
                }
            }
        }

        let Some(anchor) = anchor else {
            return Vec::new();
        };

        let listed: Vec<&str> = origins
            .iter()
            .take(MAX_LISTED_ORIGINS)
            .map(String::as_str)
            .collect();

        vec![Diagnostic::info(
            "PERF_PRECONNECT_MISSING",
            RuleCategory::Performance,
            format!(
                "No preconnect hint for external origins: {}",
                listed.join(", ")
            ),
            anchor,
        )
        .with_help("Add <link rel=\"preconnect\" href=\"...\"> for critical origins")]
    }
}
