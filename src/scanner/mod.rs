//! Structural scanners
//!
//! Everything the rules need to know about a document's shape is computed here
//! once per scan: the tag stream, element count, nesting depth, byte size, the
//! head section and framework flags.

mod head;
mod tokens;

pub use head::{is_charset, is_stylesheet, HeadSection};
pub use tokens::{is_dynamic_value, tokenize, Attribute, Tag, TagKind};

use crate::policy::Policy;
use std::collections::BTreeSet;
use std::path::Path;

/// Extensions of files that are scanned
pub const SUPPORTED_EXTENSIONS: [&str; 10] = [
    "html", "htm", "jsx", "tsx", "js", "ts", "mjs", "vue", "svelte", "astro",
];

/// Extensions of component files whose head is usually injected at runtime
pub const COMPONENT_EXTENSIONS: [&str; 5] = ["jsx", "tsx", "vue", "svelte", "astro"];

/// The HTML void elements
pub const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Whether a file name has a scanned extension
pub fn is_supported_file(file_name: &str) -> bool {
    extension_of(file_name).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether a file name has a component extension
pub fn is_component_file(file_name: &str) -> bool {
    extension_of(file_name).is_some_and(|ext| COMPONENT_EXTENSIONS.contains(&ext.as_str()))
}

/// Set of element names that never nest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoidElements {
    names: BTreeSet<String>,
}

impl Default for VoidElements {
    fn default() -> Self {
        Self::new(VOID_ELEMENTS)
    }
}

impl VoidElements {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Components (`<Link>`) are never void even when their name matches
    pub fn is_void(&self, tag: &Tag) -> bool {
        !tag.is_component() && self.names.contains(&tag.name.to_ascii_lowercase())
    }

    /// Opening tag that contributes to nesting
    pub fn opens_element(&self, tag: &Tag) -> bool {
        tag.kind == TagKind::Open && !self.is_void(tag)
    }
}

/// Number of non-void opening tags
pub fn element_count(tags: &[Tag], void: &VoidElements) -> usize {
    tags.iter().filter(|t| void.opens_element(t)).count()
}

/// Streaming depth counter over a tag stream.
///
/// Opening non-void tags push, closing tags pop (never below zero), void and
/// self-closing tags are ignored. Tag names are not matched against each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthTracker {
    depth: usize,
    max: usize,
}

impl DepthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, tag: &Tag, void: &VoidElements) {
        match tag.kind {
            TagKind::Open if !void.is_void(tag) => {
                self.depth += 1;
                self.max = self.max.max(self.depth);
            }
            TagKind::Close if !void.is_void(tag) => {
                self.depth = self.depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max
    }
}

/// Maximum nesting depth of a tag stream
pub fn max_depth(tags: &[Tag], void: &VoidElements) -> usize {
    let mut tracker = DepthTracker::new();
    for tag in tags {
        tracker.feed(tag, void);
    }
    tracker.max_depth()
}

/// Whether the text uses a component library to manage its head
pub fn is_head_managed(text: &str, markers: &[String]) -> bool {
    markers
        .iter()
        .any(|marker| !marker.is_empty() && text.contains(marker.as_str()))
}

/// Shape of one document, computed once per scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralMetrics {
    /// Non-void opening tags
    pub element_count: usize,
    pub max_depth: usize,
    /// UTF-8 byte length of the text
    pub byte_size: usize,
    pub head: Option<HeadSection>,
    /// Head is managed by a component library (`next/head`, `react-helmet`, ...)
    pub head_managed: bool,
    /// File has a component extension (`.jsx`, `.vue`, ...)
    pub component_file: bool,
}

impl StructuralMetrics {
    pub fn compute(
        text: &str,
        file_name: &str,
        tags: &[Tag],
        void: &VoidElements,
        policy: &Policy,
    ) -> Self {
        Self {
            element_count: element_count(tags, void),
            max_depth: max_depth(tags, void),
            byte_size: text.len(),
            head: HeadSection::locate(tags, text.len()),
            head_managed: is_head_managed(text, &policy.head_managed_markers),
            component_file: is_component_file(file_name),
        }
    }

    pub fn has_head(&self) -> bool {
        self.head.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(text: &str, file_name: &str) -> StructuralMetrics {
        let tags = tokenize(text);
        StructuralMetrics::compute(
            text,
            file_name,
            &tags,
            &VoidElements::default(),
            &Policy::default(),
        )
    }

    #[test]
    fn test_element_count_skips_void_and_self_closing() {
        let m = metrics("<div><img src=a><br/><input><span></span><Widget /></div>", "a.html");
        assert_eq!(m.element_count, 2);
    }

    #[test]
    fn test_depth_of_nested_elements() {
        let m = metrics("<div><section><p><span>x</span></p></section></div>", "a.html");
        assert_eq!(m.max_depth, 4);
    }

    #[test]
    fn test_depth_without_closing_tags_equals_count() {
        let text = "<div>".repeat(40);
        let m = metrics(&text, "a.html");
        assert_eq!(m.max_depth, 40);
        assert_eq!(m.element_count, 40);
    }

    #[test]
    fn test_depth_never_negative() {
        let void = VoidElements::default();
        let mut tracker = DepthTracker::new();
        for tag in tokenize("</div></div></p><div></span></span></span><p>") {
            tracker.feed(&tag, &void);
        }
        assert_eq!(tracker.depth(), 1);
        assert_eq!(tracker.max_depth(), 1);
    }

    #[test]
    fn test_mismatched_tags_absorbed() {
        let m = metrics("<a><b></a><c></c>", "a.html");
        assert_eq!(m.max_depth, 2);
    }

    #[test]
    fn test_void_closing_tag_ignored() {
        let m = metrics("<div><br></br><p></p></div>", "a.html");
        assert_eq!(m.max_depth, 2);
    }

    #[test]
    fn test_component_named_like_void() {
        let m = metrics("<nav><Link href='/'><span>x</span></Link></nav>", "a.tsx");
        assert_eq!(m.max_depth, 3);
    }

    #[test]
    fn test_framework_flags() {
        let m = metrics("import Head from 'next/head';\n<Head></Head>", "page.tsx");
        assert!(m.head_managed);
        assert!(m.component_file);
        assert!(m.has_head());

        let m = metrics("<html><head></head></html>", "index.html");
        assert!(!m.head_managed);
        assert!(!m.component_file);
    }

    #[test]
    fn test_byte_size() {
        assert_eq!(metrics("héllo", "a.html").byte_size, 6);
    }

    #[test]
    fn test_supported_files() {
        assert!(is_supported_file("index.HTML"));
        assert!(is_supported_file("src/App.tsx"));
        assert!(!is_supported_file("style.css"));
        assert!(!is_supported_file("README"));
        assert!(is_component_file("App.vue"));
        assert!(!is_component_file("main.js"));
    }

    #[test]
    fn test_custom_void_set() {
        let void = VoidElements::new(["div"]);
        let tags = tokenize("<div><p></p></div>");
        assert_eq!(element_count(&tags, &void), 1);
    }
}
