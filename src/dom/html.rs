use crate::dom::{Document, Element, SelectorError};
use scraper::{ElementRef, Html, Selector};

/// A detached document parsed from an HTML string.
///
/// Parsing never fails; malformed markup is repaired the way browsers do.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parses a full HTML document
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// Trimmed text of the `<title>` element, or an empty string
    pub fn title(&self) -> String {
        self.select_first("title")
            .ok()
            .flatten()
            .map(|e| Element::text(&e).trim().to_string())
            .unwrap_or_default()
    }

    /// The `<body>` element; the parser always synthesizes one for documents
    pub fn body(&self) -> Option<ElementRef<'_>> {
        self.select_first("body").ok().flatten()
    }

    /// Access to the underlying parsed tree
    pub fn html(&self) -> &Html {
        &self.html
    }
}

/// Compiles a selector, keeping the offending input for the error message
pub fn compile(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|e| SelectorError {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

impl<'a> Element for ElementRef<'a> {
    fn select_all(&self, selector: &str) -> Result<Vec<Self>, SelectorError> {
        let selector = compile(selector)?;
        Ok(self.select(&selector).collect())
    }

    fn text(&self) -> String {
        ElementRef::text(self).collect()
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(|s| s.to_string())
    }
}

impl Document for HtmlDocument {
    type Element<'a> = ElementRef<'a>;

    fn select_all(&self, selector: &str) -> Result<Vec<ElementRef<'_>>, SelectorError> {
        let selector = compile(selector)?;
        let found = self.html.select(&selector).collect::<Vec<_>>();
        ::log::trace!("Selector {:?} matched {} elements", selector, found.len());
        Ok(found)
    }
}
