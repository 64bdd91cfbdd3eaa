//! Head section locator

use super::tokens::{Tag, TagKind};
use crate::diagnostic::Span;

/// The first `<head>` section and the offsets of the elements whose order matters.
///
/// Offsets are relative to `content.start` (the byte after the opening tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadSection {
    /// The opening `<head>` tag
    pub open_tag: Span,
    /// Content between the opening tag and `</head>` (or end of text when unclosed)
    pub content: Span,
    pub charset: Option<usize>,
    pub title: Option<usize>,
    pub first_stylesheet: Option<usize>,
    pub first_script: Option<usize>,
}

impl HeadSection {
    /// Locate the first head section in a tag stream
    pub fn locate(tags: &[Tag], text_len: usize) -> Option<Self> {
        let open_index = tags
            .iter()
            .position(|t| t.kind == TagKind::Open && t.is("head"))?;
        let open_tag = tags[open_index].span;

        let inner = &tags[open_index + 1..];
        let close_index = inner.iter().position(|t| t.closes("head"));
        let end = close_index
            .map(|i| inner[i].span.start)
            .unwrap_or(text_len);
        let inner = &inner[..close_index.unwrap_or(inner.len())];

        let base = open_tag.end;
        let relative = |tag: &Tag| tag.span.start - base;

        Some(Self {
            open_tag,
            content: Span::new(base, end),
            charset: inner.iter().find(|t| is_charset(t)).map(relative),
            title: inner.iter().find(|t| t.opens("title")).map(relative),
            first_stylesheet: inner.iter().find(|t| is_stylesheet(t)).map(relative),
            first_script: inner.iter().find(|t| t.opens("script")).map(relative),
        })
    }

    /// Absolute offset of a relative position
    pub fn absolute(&self, relative: usize) -> usize {
        self.content.start + relative
    }
}

/// `<meta charset>` or `<meta http-equiv="Content-Type" content="...charset=...">`
pub fn is_charset(tag: &Tag) -> bool {
    if !tag.opens("meta") {
        return false;
    }
    tag.has_attr("charset")
        || (tag
            .attr("http-equiv")
            .is_some_and(|v| v.eq_ignore_ascii_case("content-type"))
            && tag
                .attr("content")
                .is_some_and(|v| v.to_ascii_lowercase().contains("charset")))
}

/// `<link rel="stylesheet">`
pub fn is_stylesheet(tag: &Tag) -> bool {
    tag.opens("link") && tag.attr_has_token("rel", "stylesheet")
}
