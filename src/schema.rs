use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// Placeholder substituted with the encoded query in a search URL template.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// CSS selectors describing where each field lives on a result listing page.
///
/// `result_container` selects the repeated record root; every other selector is
/// evaluated inside one container. An empty string means the field does not
/// exist on the site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSelectors {
    pub result_container: String,
    pub title: String,
    pub title_link: String,
    pub authors: String,
    pub author_links: String,
    pub date: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub citations: String,
}

/// Classification of the records a site lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticStructure {
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl Default for SemanticStructure {
    fn default() -> Self {
        Self {
            kind: "General".to_string(),
        }
    }
}

/// Everything needed to scrape one site.
///
/// The name is the repository key and compares case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSchema {
    /// Human-readable identifier
    pub name: String,

    /// Base URL; its hostname matches pages to this schema
    #[serde(rename = "url")]
    pub origin_url: String,

    /// Topical label, e.g. "academic"
    #[serde(rename = "domain", default)]
    pub domain_tag: String,

    /// Search URL containing `{query}`; empty when search is unsupported
    #[serde(rename = "search_url", default)]
    pub search_url_template: String,

    /// Query parameter name to logical role, in declaration order
    #[serde(rename = "search_params", default)]
    pub search_param_names: IndexMap<String, String>,

    #[serde(default)]
    pub selectors: SiteSelectors,

    #[serde(default)]
    pub semantic_structure: SemanticStructure,
}

impl SiteSchema {
    /// Case-insensitive name comparison used for every repository lookup
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    /// Hostname of the origin URL, if it parses
    pub fn hostname(&self) -> Option<String> {
        Url::parse(&self.origin_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
    }

    pub fn semantic_type(&self) -> &str {
        &self.semantic_structure.kind
    }

    /// Whether the schema can be used for extraction at all
    pub fn is_usable(&self) -> bool {
        !self.selectors.result_container.is_empty()
    }

    /// Builds the search URL for `query`, percent-encoding the term
    pub fn build_search_url(&self, query: &str) -> String {
        self.search_url_template
            .replacen(QUERY_PLACEHOLDER, &urlencoding::encode(query), 1)
    }
}

/// The schema seeded into an empty repository.
pub fn default_schema() -> SiteSchema {
    let mut search_params = IndexMap::new();
    search_params.insert("q".to_string(), "query".to_string());

    SiteSchema {
        name: "Google Scholar".to_string(),
        origin_url: "https://scholar.google.com".to_string(),
        domain_tag: "academic".to_string(),
        search_url_template: "https://scholar.google.com/scholar?q={query}".to_string(),
        search_param_names: search_params,
        selectors: SiteSelectors {
            result_container: ".gs_r.gs_or.gs_scl".to_string(),
            title: ".gs_rt".to_string(),
            title_link: ".gs_rt a".to_string(),
            authors: ".gs_a".to_string(),
            author_links: ".gs_a a".to_string(),
            date: ".gs_a".to_string(),
            abstract_text: ".gs_rs".to_string(),
            citations: ".gs_fl.gs_flb a".to_string(),
        },
        semantic_structure: SemanticStructure {
            kind: "ArticleScientific".to_string(),
        },
    }
}
