//! Lexical tag scanner
//!
//! Produces a flat stream of open/close/self-closing tags from raw text. It does not
//! build a tree and never fails: text that does not look like a tag is skipped.
//! Comments are skipped and the bodies of `script`/`style` elements are treated
//! as raw text so that `a < b` in inline code does not open a tag.

use crate::diagnostic::Span;
use regex::Regex;
use std::sync::LazyLock;

/// A tag: `<`, optional `/`, a name, then attributes (quoted strings and JSX
/// expressions may contain `>`), up to the closing `>`
static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(/?)([A-Za-z][A-Za-z0-9:._-]*)((?:[^>"'{]|"[^"]*"|'[^']*'|\{[^}]*\})*)>"#)
        .unwrap()
});

/// One attribute: name, then an optional double-quoted, single-quoted, `{expr}` or bare value
static ATTR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"([A-Za-z_:@][A-Za-z0-9_:.@-]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|\{((?:[^{}]|\{[^{}]*\})*)\}|([^\s"'=<>`]+)))?"#,
    )
    .unwrap()
});

/// Elements whose content is raw text
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

/// Syntactic kind of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `<div>`
    Open,
    /// `</div>`
    Close,
    /// `<br />`
    SelfClosing,
}

/// A parsed attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// `None` for bare attributes such as `async`
    pub value: Option<String>,
}

/// A tag token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub kind: TagKind,
    /// Name as written (case preserved)
    pub name: String,
    /// Span of the whole tag, `<` to `>`
    pub span: Span,
    pub attributes: Vec<Attribute>,
}

impl Tag {
    /// Build a tag directly, without scanning text
    pub fn new(kind: TagKind, name: &str, span: Span, attributes: Vec<Attribute>) -> Self {
        Self {
            kind,
            name: name.to_string(),
            span,
            attributes,
        }
    }

    /// Case-insensitive name comparison
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Opening or self-closing tag with this name
    pub fn opens(&self, name: &str) -> bool {
        self.kind != TagKind::Close && self.is(name)
    }

    /// Closing tag with this name
    pub fn closes(&self, name: &str) -> bool {
        self.kind == TagKind::Close && self.is(name)
    }

    /// PascalCase names are framework components (`<Image>`, `<Head>`), not HTML
    pub fn is_component(&self) -> bool {
        let mut chars = self.name.chars();
        chars.next().is_some_and(|c| c.is_ascii_uppercase())
            && chars.any(|c| c.is_ascii_lowercase())
    }

    /// Attribute value; bare attributes yield an empty string
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Attribute present and not explicitly `false`
    pub fn flag(&self, name: &str) -> bool {
        self.attr(name)
            .is_some_and(|v| !v.trim().eq_ignore_ascii_case("false"))
    }

    /// Whether a whitespace-separated attribute (e.g. `rel`) contains `token`
    pub fn attr_has_token(&self, name: &str, token: &str) -> bool {
        self.attr(name).is_some_and(|v| {
            v.split_ascii_whitespace()
                .any(|t| t.eq_ignore_ascii_case(token))
        })
    }
}

/// Scan `text` into a flat tag stream
pub fn tokenize(text: &str) -> Vec<Tag> {
    let mut tags = Vec::new();
    let mut pos = 0;
    let mut next_comment = find_from(text, 0, "<!--");

    while pos < text.len() {
        let Some(caps) = TAG_REGEX.captures_at(text, pos) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };

        // Skip comments that start before this tag
        if let Some(comment) = next_comment {
            if comment < whole.start() {
                pos = find_from(text, comment + 4, "-->")
                    .map(|end| end + 3)
                    .unwrap_or(text.len());
                next_comment = find_from(text, pos, "<!--");
                continue;
            }
        }

        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let name = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let raw_attrs = caps.get(3).map(|m| m.as_str()).unwrap_or_default();

        let kind = if closing {
            TagKind::Close
        } else if raw_attrs.trim_end().ends_with('/') {
            TagKind::SelfClosing
        } else {
            TagKind::Open
        };

        let attributes = if kind == TagKind::Close {
            Vec::new()
        } else {
            parse_attributes(raw_attrs)
        };

        let tag = Tag {
            kind,
            name: name.to_string(),
            span: Span::new(whole.start(), whole.end()),
            attributes,
        };

        pos = whole.end();
        if tag.kind == TagKind::Open {
            if let Some(raw) = RAW_TEXT_ELEMENTS.iter().find(|raw| tag.is(raw)) {
                pos = find_raw_text_end(text, pos, raw).unwrap_or(text.len());
            }
        }
        if next_comment.is_some_and(|c| c < pos) {
            next_comment = find_from(text, pos, "<!--");
        }

        tags.push(tag);
    }

    tags
}

fn parse_attributes(raw: &str) -> Vec<Attribute> {
    ATTR_REGEX
        .captures_iter(raw)
        .filter_map(|caps| {
            let raw_name = caps.get(1)?.as_str();
            let quoted = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(5))
                .map(|m| m.as_str());

            // Vue bindings (`:width`, `v-bind:width`) hold an expression, like JSX braces
            if let Some(name) = strip_binding(raw_name) {
                return Some(Attribute {
                    name: name.to_string(),
                    value: quoted
                        .or_else(|| caps.get(4).map(|m| m.as_str()))
                        .map(unquote_expression),
                });
            }

            let value = quoted
                .map(str::to_string)
                .or_else(|| caps.get(4).map(|m| unquote_expression(m.as_str())));
            Some(Attribute {
                name: raw_name.to_string(),
                value,
            })
        })
        .collect()
}

fn strip_binding(name: &str) -> Option<&str> {
    name.strip_prefix("v-bind:")
        .or_else(|| name.strip_prefix(':'))
        .filter(|n| !n.is_empty())
}

/// `{"hero.jpg"}`, `{800}` and `{false}` carry a literal; any other expression is
/// kept with its braces so rules can tell it is computed at runtime
fn unquote_expression(expr: &str) -> String {
    let trimmed = expr.trim();
    for quote in ['"', '\'', '`'] {
        if trimmed.len() >= 2
            && trimmed.starts_with(quote)
            && trimmed.ends_with(quote)
            && !trimmed.contains("${")
        {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    if trimmed == "true" || trimmed == "false" || trimmed.parse::<f64>().is_ok() {
        return trimmed.to_string();
    }
    format!("{{{}}}", trimmed)
}

/// Value computed at runtime (`{expr}`), not measurable statically
pub fn is_dynamic_value(value: &str) -> bool {
    let value = value.trim();
    value.starts_with('{') || value.contains("{{") || value.contains("${")
}

fn find_from(text: &str, from: usize, needle: &str) -> Option<usize> {
    text.get(from..)?.find(needle).map(|i| from + i)
}

/// Offset of the `</name` that ends a raw-text element
fn find_raw_text_end(text: &str, from: usize, name: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut pos = from;
    while let Some(at) = find_from(text, pos, "</") {
        let rest = &bytes[at + 2..];
        if rest.len() >= name.len() && rest[..name.len()].eq_ignore_ascii_case(name.as_bytes()) {
            return Some(at);
        }
        pos = at + 2;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_stream() {
        let tags = tokenize("<div class=\"a\"><br/><p>x</p></div>");
        let kinds: Vec<_> = tags.iter().map(|t| (t.kind, t.name.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (TagKind::Open, "div"),
                (TagKind::SelfClosing, "br"),
                (TagKind::Open, "p"),
                (TagKind::Close, "p"),
                (TagKind::Close, "div"),
            ]
        );
        assert_eq!(tags[0].attr("class"), Some("a"));
    }

    #[test]
    fn test_spans_cover_tag() {
        let text = "ab<img src='x.png'>cd";
        let tags = tokenize(text);
        assert_eq!(tags.len(), 1);
        assert_eq!(&text[tags[0].span.start..tags[0].span.end], "<img src='x.png'>");
    }

    #[test]
    fn test_attribute_forms() {
        let tags = tokenize(r#"<Image src={"/hero.jpg"} width={800} priority alt='' loading=lazy />"#);
        let tag = &tags[0];
        assert_eq!(tag.kind, TagKind::SelfClosing);
        assert_eq!(tag.attr("src"), Some("/hero.jpg"));
        assert_eq!(tag.attr("width"), Some("800"));
        assert_eq!(tag.attr("priority"), Some(""));
        assert_eq!(tag.attr("alt"), Some(""));
        assert_eq!(tag.attr("loading"), Some("lazy"));
        assert!(tag.flag("priority"));
        assert!(tag.is_component());
    }

    #[test]
    fn test_quoted_gt_inside_attribute() {
        let tags = tokenize(r#"<a title="a > b" href="/">x</a>"#);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].attr("href"), Some("/"));
    }

    #[test]
    fn test_comments_are_skipped() {
        let tags = tokenize("<!-- <div><div> --><p></p>");
        assert_eq!(tags.len(), 2);
        assert!(tags[0].opens("p"));
    }

    #[test]
    fn test_script_body_is_raw_text() {
        let tags = tokenize("<script>if (a<b && c>d) { x = '<div>'; }</script><p>");
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["script", "script", "p"]);
    }

    #[test]
    fn test_unterminated_script_consumes_rest() {
        let tags = tokenize("<script>let a = '<div>';");
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn test_doctype_ignored() {
        let tags = tokenize("<!DOCTYPE html><html></html>");
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_component_detection() {
        let tags = tokenize("<Head><IMG src=a><Link href='/'></Link></Head>");
        assert!(tags[0].is_component());
        assert!(!tags[1].is_component());
        assert!(tags[2].is_component());
    }

    #[test]
    fn test_rel_tokens() {
        let tags = tokenize(r#"<link rel="preload stylesheet" href="a.css">"#);
        assert!(tags[0].attr_has_token("rel", "stylesheet"));
        assert!(!tags[0].attr_has_token("rel", "preconnect"));
    }

    #[test]
    fn test_dynamic_expression_keeps_braces() {
        let tags = tokenize("<meta name=\"description\" content={page.description} />");
        let content = tags[0].attr("content").unwrap();
        assert_eq!(content, "{page.description}");
        assert!(is_dynamic_value(content));
        assert!(!is_dynamic_value("A plain description"));
    }

    #[test]
    fn test_vue_bindings_drop_prefix() {
        let tags = tokenize(
            r#"<img :src="'/hero.jpg'" v-bind:alt="item.alt" :width="w" :height="600" :priority="false">"#,
        );
        let tag = &tags[0];
        assert_eq!(tag.attr("src"), Some("/hero.jpg"));
        assert_eq!(tag.attr("alt"), Some("{item.alt}"));
        assert!(is_dynamic_value(tag.attr("width").unwrap()));
        assert_eq!(tag.attr("height"), Some("600"));
        assert!(!tag.flag("priority"));
    }

    #[test]
    fn test_flag_false() {
        let tags = tokenize("<Image priority={false} />");
        assert!(tags[0].has_attr("priority"));
        assert!(!tags[0].flag("priority"));
    }
}
