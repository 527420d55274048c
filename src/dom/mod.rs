//! Minimal DOM capability interface the extraction engine runs against.
//!
//! The engine only ever needs four things from a document: select all matches
//! of a CSS selector, select the first match, read an element's text and read
//! one of its attributes. Keeping it to that lets the same engine run over a
//! parsed HTML string, a snapshot of a live page, or a synthetic fixture.

pub mod html;

pub use html::HtmlDocument;

use thiserror::Error;

/// A CSS selector that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid selector \"{selector}\": {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

/// Handle to one element of a document.
pub trait Element: Sized {
    /// All descendants matching `selector`, in document order
    fn select_all(&self, selector: &str) -> Result<Vec<Self>, SelectorError>;

    /// First descendant matching `selector`
    fn select_first(&self, selector: &str) -> Result<Option<Self>, SelectorError> {
        Ok(self.select_all(selector)?.into_iter().next())
    }

    /// Concatenated text of the element and all its descendants, untrimmed
    fn text(&self) -> String;

    /// Raw attribute value
    fn attr(&self, name: &str) -> Option<String>;
}

/// A queryable document.
pub trait Document {
    type Element<'a>: Element
    where
        Self: 'a;

    /// All elements matching `selector`, in document order
    fn select_all(&self, selector: &str) -> Result<Vec<Self::Element<'_>>, SelectorError>;

    fn select_first(&self, selector: &str) -> Result<Option<Self::Element<'_>>, SelectorError> {
        Ok(self.select_all(selector)?.into_iter().next())
    }
}
