use serde::{Deserialize, Serialize};

/// One author of a record; `url` is empty when the listing has no link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub url: String,
}

impl Author {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Represents one scraped item from a result listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub title: String,

    /// Link as found on the page, not resolved against the page URL
    pub url: String,

    /// Bare four-digit year, or empty
    pub date: String,

    pub authors: Vec<Author>,

    /// Decimal citation count, "0" when unknown
    #[serde(rename = "citations")]
    pub citation_count: String,

    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

impl Default for ExtractedRecord {
    fn default() -> Self {
        Self {
            title: String::new(),
            url: String::new(),
            date: String::new(),
            authors: Vec::new(),
            citation_count: "0".to_string(),
            abstract_text: String::new(),
        }
    }
}

/// Records extracted from one page with the schema that produced them.
///
/// Built fresh on every extraction and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Name of the schema used
    pub source: String,

    /// Domain tag of the schema used
    pub domain: String,

    /// URL of the page the records came from
    pub url: String,

    /// Search query recovered or supplied for the page
    pub query: String,

    #[serde(rename = "totalResults")]
    pub total_results: usize,

    #[serde(rename = "results")]
    pub records: Vec<ExtractedRecord>,

    pub semantic_type: String,
}
