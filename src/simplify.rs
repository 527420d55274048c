//! Reduces a page to compact HTML for an external schema-inference step.
//!
//! Only structure survives: non-structural elements and comments are dropped,
//! attributes are pruned to the ones a selector author needs, whitespace is
//! collapsed and the result is capped at a fixed size.

use crate::dom::HtmlDocument;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Node};

/// Elements removed together with their whole subtree
pub const REMOVED_ELEMENTS: &[&str] = &[
    "script", "style", "svg", "img", "noscript", "iframe", "video", "audio", "canvas", "link",
    "meta",
];

/// Attributes kept on surviving elements
pub const ALLOWED_ATTRIBUTES: &[&str] = &["class", "id", "href", "data-id"];

/// Default output ceiling, in characters
pub const DEFAULT_MAX_LENGTH: usize = 8000;

/// Appended when the output was cut at the ceiling
pub const TRUNCATION_MARKER: &str = "\n<!-- ... HTML truncated ... -->";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static INTER_TAG_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r">\s+<").unwrap());

/// Configuration options for simplification
#[derive(Debug, Clone, Copy)]
pub struct SimplifyOptions {
    /// Maximum number of characters before the truncation marker
    pub max_length: usize,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

/// Simplifies the body of `doc` with default options
pub fn simplify(doc: &HtmlDocument) -> String {
    simplify_with_options(doc, &SimplifyOptions::default())
}

/// Simplifies the body of `doc`.
///
/// The document itself is never modified; the output is rebuilt from a walk
/// over the parsed tree. Never fails: a document without a body yields an
/// empty string.
pub fn simplify_with_options(doc: &HtmlDocument, options: &SimplifyOptions) -> String {
    let Some(body) = doc.body() else {
        return String::new();
    };

    let mut html = String::new();
    write_children(body, &mut html);

    let html = WHITESPACE_RUN.replace_all(&html, " ");
    let html = INTER_TAG_WHITESPACE.replace_all(&html, "><").into_owned();

    truncate(html, options.max_length)
}

/// Parses `source` and simplifies it with default options
pub fn simplify_html(source: &str) -> String {
    simplify(&HtmlDocument::parse(source))
}

fn truncate(html: String, max_length: usize) -> String {
    match html.char_indices().nth(max_length) {
        Some((cut, _)) => {
            ::log::debug!(
                "Simplified HTML truncated to {} characters (from {} bytes)",
                max_length,
                html.len()
            );
            let mut truncated = html[..cut].to_string();
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => html,
    }
}

fn write_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            write_element(child_element, out);
            continue;
        }
        if let Node::Text(text) = child.value() {
            escape_into(text, out, false);
        }
        // comments, doctypes and processing instructions are dropped
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if REMOVED_ELEMENTS.contains(&name) {
        return;
    }

    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        if !ALLOWED_ATTRIBUTES.contains(&attr.to_ascii_lowercase().as_str()) {
            continue;
        }
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        escape_into(value, out, true);
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    write_children(element, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn escape_into(raw: &str, out: &mut String, attribute: bool) {
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
