//! End-to-end scans through the public library API

use pretty_assertions::assert_eq;
use seoscan::{resolve, scan, Diagnostic, Engine, Policy, ProjectConfig, Severity};
use std::fs;
use tempfile::TempDir;

fn codes(diagnostics: &[Diagnostic]) -> Vec<&str> {
    diagnostics.iter().map(|d| d.code.as_str()).collect()
}

fn count(diagnostics: &[Diagnostic], code: &str) -> usize {
    diagnostics.iter().filter(|d| d.code == code).count()
}

const STORE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Blue Widget | Acme Store</title>
  <meta charset="utf-8">
  <link rel="stylesheet" href="https://fonts.example.com/css?family=Inter">
  <script src="https://cdn.example.com/analytics.js"></script>
  <style>
    @font-face { font-family: Inter; src: url(/inter.woff2); }
  </style>
</head>
<body>
  <div class="price">$10</div>
  <img src="/widget.png">
  <script>
    import("lodash").then(() => {});
  </script>
</body>
</html>"#;

#[test]
fn test_short_title_scenario() {
    let diags = scan("<head><title>Short</title></head>", "index.html", &Policy::default());
    assert_eq!(count(&diags, "SEO_TITLE_LENGTH"), 1);
    assert_eq!(count(&diags, "SEO_TITLE_MISSING"), 0);
}

#[test]
fn test_title_length_boundaries() {
    let policy = Policy::default();
    let page = |n: usize| format!("<head><title>{}</title></head>", "a".repeat(n));

    for n in [policy.title_min, policy.title_max] {
        assert_eq!(count(&scan(&page(n), "index.html", &policy), "SEO_TITLE_LENGTH"), 0);
    }
    for n in [policy.title_min - 1, policy.title_max + 1] {
        assert_eq!(count(&scan(&page(n), "index.html", &policy), "SEO_TITLE_LENGTH"), 1);
    }
}

#[test]
fn test_dom_size_scenario() {
    let text = format!("<body>{}</body>", "<span>".repeat(1600));
    let diags = scan(&text, "index.html", &Policy::default());
    assert_eq!(count(&diags, "RENDER_DOM_SIZE_LARGE"), 1);
    assert_eq!(count(&diags, "RENDER_DOM_SIZE_EXCESSIVE"), 1);
    assert!(diags.iter().any(|d| d.severity == Severity::Error));
}

#[test]
fn test_depth_equals_unclosed_nesting() {
    let text = "<div>".repeat(30);
    let diags = scan(&text, "index.html", &Policy::default());
    let deep = diags.iter().find(|d| d.code == "RENDER_DOM_DEPTH_DEEP").unwrap();
    assert!(deep.message.starts_with("Elements nest 30 levels deep"));
    assert_eq!(count(&diags, "RENDER_DOM_DEPTH_EXCESSIVE"), 0);
}

#[test]
fn test_managed_head_component_scenario() {
    let text = r#"import Head from 'next/head';

export default function Page() {
  return (
    <>
      <Head>
        <meta name="viewport" content="width=device-width" />
      </Head>
      <main>Hello</main>
    </>
  );
}"#;
    let diags = scan(text, "pages/index.jsx", &Policy::default());
    assert_eq!(count(&diags, "SEO_TITLE_MISSING"), 0);
}

#[test]
fn test_managed_head_marker_is_policy() {
    let text = "import { useSeoMeta } from 'custom-head';\n<html><head></head></html>";
    let default = scan(text, "page.html", &Policy::default());
    assert_eq!(count(&default, "SEO_TITLE_MISSING"), 1);

    let policy = Policy {
        head_managed_markers: vec!["custom-head".to_string()],
        ..Policy::default()
    };
    assert_eq!(count(&scan(text, "page.html", &policy), "SEO_TITLE_MISSING"), 0);
}

#[test]
fn test_open_graph_scenarios() {
    let two_present = r#"<head>
<meta property="og:title" content="A">
<meta property="og:url" content="https://example.com/">
</head>"#;
    let diags = scan(two_present, "index.html", &Policy::default());
    assert_eq!(count(&diags, "SEO_OPEN_GRAPH_MISSING"), 0);

    let one_present = r#"<head><meta property="og:image" content="a.png"></head>"#;
    let diags = scan(one_present, "index.html", &Policy::default());
    let og = diags.iter().find(|d| d.code == "SEO_OPEN_GRAPH_MISSING").unwrap();
    assert_eq!(og.message, "Missing Open Graph tags: og:title, og:description, og:url");
}

#[test]
fn test_heavy_dependencies_scenario() {
    let text = r#"import moment from 'moment';
import debounce from 'lodash/debounce';
import $ from 'jquery';
import Button from '@material-ui/core/Button';
import * as d3 from 'd3';
import { map } from 'rxjs';
"#;
    let diags = scan(text, "src/app.js", &Policy::default());
    assert_eq!(count(&diags, "BUNDLE_HEAVY_DEPENDENCY"), 6);
    assert_eq!(count(&diags, "BUNDLE_SIZE_LARGE"), 1);
    assert_eq!(count(&diags, "BUNDLE_SIZE_EXCESSIVE"), 1);
    assert!(diags
        .iter()
        .any(|d| d.message.starts_with("'@material-ui/core' adds about")));
}

#[test]
fn test_store_page_findings() {
    let diags = scan(STORE_PAGE, "store/widget.html", &Policy::default());
    assert_eq!(
        codes(&diags),
        vec![
            "SEO_TITLE_LENGTH",
            "SEO_META_DESCRIPTION_MISSING",
            "SEO_CANONICAL_MISSING",
            "SEO_JSONLD_PRODUCT_MISSING",
            "SEO_OPEN_GRAPH_MISSING",
            "PERF_BLOCKING_SCRIPT",
            "PERF_IMG_MISSING_ALT",
            "PERF_IMG_MISSING_DIMENSIONS",
            "PERF_IMG_MISSING_LOADING",
            "PERF_FONT_DISPLAY_SWAP",
            "PERF_PRECONNECT_MISSING",
            "BUNDLE_HEAVY_DEPENDENCY",
            "BUNDLE_SIZE_LARGE",
        ]
    );
}

#[test]
fn test_scan_is_pure() {
    let policy = Policy::default();
    let runs: Vec<_> = (0..3)
        .map(|_| scan(STORE_PAGE, "store/widget.html", &policy))
        .collect();
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[1], runs[2]);

    let engine = Engine::new(policy);
    assert_eq!(engine.scan(STORE_PAGE, "store/widget.html"), runs[0]);
}

#[test]
fn test_spans_and_positions_are_consistent() {
    let diags = scan(STORE_PAGE, "store/widget.html", &Policy::default());
    for diag in &diags {
        assert!(diag.span.end <= STORE_PAGE.len());
        let line = STORE_PAGE[..diag.span.start].matches('\n').count() + 1;
        assert_eq!(diag.position.line, line, "{}", diag.code);
    }
}

#[test]
fn test_policy_file_drives_engine() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(".seoscanrc.yaml"),
        "seo:\n  titleMin: 3\n  titleMax: oops\n  requireCanonical: false\nrules:\n  disabled: [SEO_OPEN_GRAPH_MISSING]\n",
    )
    .unwrap();

    let config = ProjectConfig::discover(temp.path());
    assert_eq!(config.policy.title_min, 3);
    assert_eq!(config.policy.title_max, 60);
    assert!(config.is_rule_disabled("SEO_OPEN_GRAPH_MISSING"));

    let diags = scan("<head><title>Short</title></head>", "index.html", &config.policy);
    assert_eq!(count(&diags, "SEO_TITLE_LENGTH"), 0);
    assert_eq!(count(&diags, "SEO_CANONICAL_MISSING"), 0);
}

#[test]
fn test_unparsable_policy_falls_back() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".seoscanrc.json"), "{ not json").unwrap();
    assert_eq!(ProjectConfig::discover(temp.path()).policy, resolve(None));
}
