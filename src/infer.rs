//! Contract with the external collaborator that proposes a schema for a page.

use crate::command::json_span;
use crate::error::ScrapeError;
use crate::schema::{SemanticStructure, SiteSchema, SiteSelectors};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("{0}")]
    Failed(String),

    #[error("unreadable inference response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the collaborator gets to look at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
    pub simplified_html: String,
    pub source_url: String,
    pub page_title: String,
}

/// Selectors as proposed; anything may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InferredSelectors {
    pub result_container: Option<String>,
    pub title: Option<String>,
    pub title_link: Option<String>,
    pub authors: Option<String>,
    pub author_links: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub citations: Option<String>,
}

/// A schema as proposed by the collaborator, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InferredSchema {
    pub name: Option<String>,
    pub url: Option<String>,
    pub domain: Option<String>,
    pub search_url: Option<String>,
    pub search_params: Option<IndexMap<String, String>>,
    pub selectors: Option<InferredSelectors>,
    pub semantic_structure: Option<SemanticStructure>,
}

#[async_trait]
pub trait SchemaInferrer: Send + Sync {
    async fn infer(&self, request: &InferenceRequest) -> Result<InferredSchema, InferenceError>;
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl InferredSchema {
    /// Validates the proposal and fills every missing field.
    ///
    /// Only a non-empty result container is required. The name defaults to
    /// one derived from the page hostname and the URL to the page origin.
    pub fn into_schema(self, page_url: &str) -> Result<SiteSchema, ScrapeError> {
        let selectors = self.selectors.unwrap_or_default();
        let Some(result_container) = non_empty(selectors.result_container) else {
            return Err(ScrapeError::SchemaInferenceFailed(
                "no result container could be identified on this page; \
                 make sure it shows a list of search results"
                    .to_string(),
            ));
        };

        Ok(SiteSchema {
            name: non_empty(self.name).unwrap_or_else(|| site_name_from_url(page_url)),
            origin_url: non_empty(self.url).unwrap_or_else(|| page_origin(page_url)),
            domain_tag: non_empty(self.domain).unwrap_or_else(|| "general".to_string()),
            search_url_template: self.search_url.unwrap_or_default(),
            search_param_names: self.search_params.unwrap_or_default(),
            selectors: SiteSelectors {
                result_container,
                title: selectors.title.unwrap_or_default(),
                title_link: selectors.title_link.unwrap_or_default(),
                authors: selectors.authors.unwrap_or_default(),
                author_links: selectors.author_links.unwrap_or_default(),
                date: selectors.date.unwrap_or_default(),
                abstract_text: selectors.abstract_text.unwrap_or_default(),
                citations: selectors.citations.unwrap_or_default(),
            },
            semantic_structure: self
                .semantic_structure
                .filter(|s| !s.kind.is_empty())
                .unwrap_or_default(),
        })
    }
}

/// Readable site name from a page URL: `www.` and the top-level domain are
/// dropped and the remaining labels title-cased ("https://www.link.springer.com"
/// becomes "Link Springer").
pub fn site_name_from_url(page_url: &str) -> String {
    let Some(hostname) = Url::parse(page_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
    else {
        return "Unknown site".to_string();
    };

    let bare = hostname.strip_prefix("www.").unwrap_or(&hostname);
    let labels: Vec<&str> = bare.split('.').collect();
    if labels.len() < 2 {
        return hostname;
    }

    labels[..labels.len() - 1]
        .iter()
        .map(|label| capitalize(label))
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn page_origin(page_url: &str) -> String {
    match Url::parse(page_url) {
        Ok(url) if url.origin().is_tuple() => url.origin().ascii_serialization(),
        _ => page_url.to_string(),
    }
}

/// Replays a response produced elsewhere (a model run outside this process,
/// or a hand-written schema). The surrounding text of a chat answer is ignored.
pub struct PreparedInferrer {
    response: InferredSchema,
}

impl PreparedInferrer {
    pub fn new(response: InferredSchema) -> Self {
        Self { response }
    }

    pub fn from_json(text: &str) -> Result<Self, InferenceError> {
        let span = json_span(text)
            .ok_or_else(|| InferenceError::Failed("response contains no JSON object".to_string()))?;
        Ok(Self::new(serde_json::from_str(span)?))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[async_trait]
impl SchemaInferrer for PreparedInferrer {
    async fn infer(&self, request: &InferenceRequest) -> Result<InferredSchema, InferenceError> {
        ::log::debug!(
            "Using prepared schema for {} ({} chars of simplified HTML)",
            request.source_url,
            request.simplified_html.chars().count()
        );
        Ok(self.response.clone())
    }
}
