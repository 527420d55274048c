use crate::dom::{Document, Element, HtmlDocument};
use async_trait::async_trait;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

/// Failure reported by a live page implementation
#[derive(Error, Debug)]
#[error("{0}")]
pub struct PageError(pub String);

/// The page the user is currently looking at.
///
/// Extraction never runs on the page directly: it runs on an `html()`
/// snapshot, so the engine never assumes it is looking at the live view.
#[async_trait]
pub trait LivePage: Send + Sync {
    async fn url(&self) -> Result<String, PageError>;

    async fn title(&self) -> Result<String, PageError>;

    /// Serialized current DOM
    async fn html(&self) -> Result<String, PageError>;

    /// Sets the text colour of every h1/h2/h3, or restores the original colour
    /// when `color` is `None`. Returns how many headings were restyled.
    async fn set_heading_color(&self, color: Option<&str>) -> Result<usize, PageError>;
}

/// Browser-internal pages no content script can run on
pub fn is_special_page(url: &str) -> bool {
    url.is_empty()
        || ["chrome://", "chrome-extension://", "edge://", "about:"]
            .iter()
            .any(|prefix| url.starts_with(prefix))
}

/// An in-memory page built from an HTML string.
///
/// Heading colour changes are recorded rather than rendered.
pub struct StaticPage {
    url: String,
    html: String,
    heading_color: Mutex<Option<String>>,
}

impl StaticPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            heading_color: Mutex::new(None),
        }
    }

    /// Colour most recently applied to the headings
    pub async fn heading_color(&self) -> Option<String> {
        self.heading_color.lock().await.clone()
    }
}

#[async_trait]
impl LivePage for StaticPage {
    async fn url(&self) -> Result<String, PageError> {
        Ok(self.url.clone())
    }

    async fn title(&self) -> Result<String, PageError> {
        Ok(HtmlDocument::parse(&self.html).title())
    }

    async fn html(&self) -> Result<String, PageError> {
        Ok(self.html.clone())
    }

    async fn set_heading_color(&self, color: Option<&str>) -> Result<usize, PageError> {
        let count = count_headings(&self.html);
        *self.heading_color.lock().await = color.map(|c| c.to_string());
        Ok(count)
    }
}

fn count_headings(html: &str) -> usize {
    HtmlDocument::parse(html)
        .select_all("h1, h2, h3")
        .map(|found| found.len())
        .unwrap_or_default()
}

/// One heading of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub text: String,
    pub html: String,
}

/// Title and h1/h2/h3 headings of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageHeadings {
    pub page_title: String,
    pub h1_titles: Vec<Heading>,
    pub h2_titles: Vec<Heading>,
    pub h3_titles: Vec<Heading>,
    pub url: String,
}

/// Collects the headings of an HTML snapshot
pub fn collect_headings(html: &str, url: &str) -> PageHeadings {
    let doc = HtmlDocument::parse(html);
    let level = |tag: &str| -> Vec<Heading> {
        doc.select_all(tag)
            .unwrap_or_default()
            .into_iter()
            .map(|h: ElementRef<'_>| Heading {
                text: Element::text(&h).trim().to_string(),
                html: h.inner_html(),
            })
            .collect()
    };

    PageHeadings {
        page_title: doc.title(),
        h1_titles: level("h1"),
        h2_titles: level("h2"),
        h3_titles: level("h3"),
        url: url.to_string(),
    }
}
