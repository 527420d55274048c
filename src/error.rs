use thiserror::Error;

use crate::dom::SelectorError;
use crate::page::PageError;
use crate::store::StoreError;

/// Errors surfaced to the caller of an extraction or a dispatched command.
///
/// Resolution misses carry the list of known schema names so the message can
/// guide the user towards a valid choice.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("schema \"{name}\" has no result container selector")]
    SchemaInvalid { name: String },

    #[error("no results matched \"{selector}\" on {site}; the page may be empty or its layout changed")]
    NoResultsFound { selector: String, site: String },

    #[error("no schema is configured for this page. Configured sites: {available}")]
    NoSchemaForPage { available: String },

    #[error("no schema found for \"{site}\". Available sites: {available}")]
    UnknownSite { site: String, available: String },

    #[error("schema \"{name}\" not found. Available sites: {available}")]
    SchemaNotFound { name: String, available: String },

    #[error("schema \"{name}\" has no search URL configured")]
    NoSearchUrl { name: String },

    #[error("schema inference failed: {0}")]
    SchemaInferenceFailed(String),

    #[error("{0}")]
    FetchFailed(String),

    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("page does not have enough HTML content to analyze ({len} characters)")]
    InsufficientContent { len: usize },

    #[error("browser-internal pages are not supported: {0}")]
    UnsupportedPage(String),

    #[error(transparent)]
    InvalidSelector(#[from] SelectorError),

    #[error("page error: {0}")]
    Page(#[from] PageError),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("command rejected: {0}")]
    CommandRejected(String),
}

/// Joins schema names the way resolution-miss messages list them.
pub fn join_names(names: &[String]) -> String {
    names.join(", ")
}
