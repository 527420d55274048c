//! Routes a command to the orchestration that carries it out.

use crate::colors::resolve_color;
use crate::command::{Command, CommandParser};
use crate::config::ScraperConfig;
use crate::dom::{Document, HtmlDocument};
use crate::error::{ScrapeError, join_names};
use crate::extract::{extract_from_html, extract_query_from_url};
use crate::fetch::Fetcher;
use crate::infer::{InferenceRequest, SchemaInferrer};
use crate::page::{LivePage, PageError, PageHeadings, collect_headings, is_special_page};
use crate::results::ExtractionResult;
use crate::schema::SiteSchema;
use crate::simplify::{SimplifyOptions, simplify_with_options};
use crate::store::SchemaRepository;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

/// What a successfully executed command produced
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Outcome {
    ColorChanged {
        color: Option<String>,
        headings: usize,
    },
    Headings(PageHeadings),
    Extraction(ExtractionResult),
    SchemaCreated {
        schema: SiteSchema,
        /// Containers the new selector matches on the page right now
        matched: usize,
        message: String,
    },
    SchemaList {
        schemas: Vec<SiteSchema>,
        total: usize,
    },
    SchemaDeleted {
        name: String,
        message: String,
    },
}

/// Sole entry point for commands.
///
/// Collaborators are injected; a command whose collaborator is missing fails
/// with a descriptive error instead of panicking.
pub struct Dispatcher {
    repository: Arc<SchemaRepository>,
    page: Option<Arc<dyn LivePage>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    inferrer: Option<Arc<dyn SchemaInferrer>>,
    simplify: SimplifyOptions,
    min_simplified_len: usize,
}

impl Dispatcher {
    pub fn new(repository: Arc<SchemaRepository>) -> Self {
        let config = ScraperConfig::default();
        Self {
            repository,
            page: None,
            fetcher: None,
            inferrer: None,
            simplify: SimplifyOptions {
                max_length: config.max_simplified_len,
            },
            min_simplified_len: config.min_simplified_len,
        }
    }

    /// Set the page commands act on
    pub fn with_page(mut self, page: Arc<dyn LivePage>) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the collaborator used to fetch remote search pages
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Set the collaborator that proposes schemas
    pub fn with_inferrer(mut self, inferrer: Arc<dyn SchemaInferrer>) -> Self {
        self.inferrer = Some(inferrer);
        self
    }

    /// Apply the simplification limits from the configuration
    pub fn with_config(mut self, config: &ScraperConfig) -> Self {
        self.simplify.max_length = config.max_simplified_len;
        self.min_simplified_len = config.min_simplified_len;
        self
    }

    /// Parses `input` with `parser` and executes the result
    pub async fn run_input(
        &self,
        parser: &dyn CommandParser,
        input: &str,
    ) -> Result<Outcome, ScrapeError> {
        match parser.parse(input).await? {
            Some(command) => self.execute(command).await,
            None => Err(ScrapeError::CommandRejected(format!(
                "could not understand \"{}\"",
                input
            ))),
        }
    }

    pub async fn execute(&self, command: Command) -> Result<Outcome, ScrapeError> {
        ::log::debug!("Dispatching {}", command.action());
        match command {
            Command::ChangeColor { color } => self.change_color(color.as_deref()).await,
            Command::GetHeadings => self.get_headings().await,
            Command::ScrapeCurrentPage => self.scrape_current_page().await,
            Command::SearchSite { site, query } => {
                self.search_site(site.as_deref(), query.as_deref()).await
            }
            Command::CreateSchema => self.create_schema().await,
            Command::ListSchemas => self.list_schemas().await,
            Command::DeleteSchema { name } => self.delete_schema(name.as_deref()).await,
        }
    }

    async fn change_color(&self, color: Option<&str>) -> Result<Outcome, ScrapeError> {
        let color = resolve_color(color);
        let headings = self.page()?.set_heading_color(color.as_deref()).await?;
        ::log::debug!("Recoloured {} headings to {:?}", headings, color);
        Ok(Outcome::ColorChanged { color, headings })
    }

    async fn get_headings(&self) -> Result<Outcome, ScrapeError> {
        let page = self.page()?;
        let url = page.url().await?;
        let html = page.html().await?;
        Ok(Outcome::Headings(collect_headings(&html, &url)))
    }

    async fn scrape_current_page(&self) -> Result<Outcome, ScrapeError> {
        let page = self.page()?;
        let url = page.url().await?;
        if is_special_page(&url) {
            return Err(ScrapeError::UnsupportedPage(url));
        }

        let hostname = Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_default();
        let Some(schema) = self.repository.find_by_hostname(&hostname).await else {
            return Err(ScrapeError::NoSchemaForPage {
                available: self.available_names().await,
            });
        };
        ::log::debug!("Scraping {} with schema {}", url, schema.name);

        let query = extract_query_from_url(&url, &schema);
        let html = page.html().await?;
        extract_from_html(&html, &schema, &query, &url).map(Outcome::Extraction)
    }

    async fn search_site(
        &self,
        site: Option<&str>,
        query: Option<&str>,
    ) -> Result<Outcome, ScrapeError> {
        let site = required(site, "site")?;
        let query = required(query, "query")?;

        let Some(schema) = self.repository.find_by_name_fuzzy(site).await else {
            return Err(ScrapeError::UnknownSite {
                site: site.to_string(),
                available: self.available_names().await,
            });
        };
        if schema.search_url_template.is_empty() {
            return Err(ScrapeError::NoSearchUrl { name: schema.name });
        }

        let search_url = schema.build_search_url(query);
        ::log::info!("Searching {} for {:?}: {}", schema.name, query, search_url);

        let fetcher = self.fetcher.as_ref().ok_or_else(|| {
            ScrapeError::FetchFailed("no fetcher is configured for remote pages".to_string())
        })?;
        let html = fetcher
            .fetch(&search_url)
            .await
            .map_err(|e| ScrapeError::FetchFailed(e.0))?;

        extract_from_html(&html, &schema, query, &search_url).map(Outcome::Extraction)
    }

    async fn create_schema(&self) -> Result<Outcome, ScrapeError> {
        let page = self.page()?;
        let url = page.url().await?;
        let page_title = page.title().await?;
        let html = page.html().await?;

        let simplified = simplify_with_options(&HtmlDocument::parse(&html), &self.simplify);
        let len = simplified.chars().count();
        if len < self.min_simplified_len {
            return Err(ScrapeError::InsufficientContent { len });
        }

        let inferrer = self.inferrer.as_ref().ok_or_else(|| {
            ScrapeError::SchemaInferenceFailed("no schema inference is configured".to_string())
        })?;
        let request = InferenceRequest {
            simplified_html: simplified,
            source_url: url.clone(),
            page_title,
        };
        let inferred = inferrer
            .infer(&request)
            .await
            .map_err(|e| ScrapeError::SchemaInferenceFailed(e.to_string()))?;

        let schema = inferred.into_schema(&url)?;
        self.repository.save(schema.clone()).await?;

        let current = page.html().await?;
        let matched = count_matches(&current, &schema.selectors.result_container);
        ::log::info!(
            "Created schema {}; its container selector matches {} elements",
            schema.name,
            matched
        );

        let message = format!(
            "Schema created for \"{}\". {} results detected on this page. \
             Scrape this page or search \"{}\" to use it.",
            schema.name, matched, schema.name
        );
        Ok(Outcome::SchemaCreated {
            schema,
            matched,
            message,
        })
    }

    async fn list_schemas(&self) -> Result<Outcome, ScrapeError> {
        let schemas = self.repository.get_all().await;
        Ok(Outcome::SchemaList {
            total: schemas.len(),
            schemas,
        })
    }

    async fn delete_schema(&self, name: Option<&str>) -> Result<Outcome, ScrapeError> {
        let name = required(name, "name")?;

        let Some(schema) = self.repository.get_by_name(name).await else {
            return Err(ScrapeError::SchemaNotFound {
                name: name.to_string(),
                available: self.available_names().await,
            });
        };

        self.repository.delete(&schema.name).await?;
        Ok(Outcome::SchemaDeleted {
            message: format!("Schema \"{}\" deleted.", schema.name),
            name: schema.name,
        })
    }

    fn page(&self) -> Result<&Arc<dyn LivePage>, ScrapeError> {
        self.page
            .as_ref()
            .ok_or_else(|| PageError("no page is open".to_string()).into())
    }

    async fn available_names(&self) -> String {
        join_names(&self.repository.site_names().await)
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ScrapeError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ScrapeError::MissingParameter(name))
}

/// Number of elements `selector` matches in `html`; 0 for an unusable selector
fn count_matches(html: &str, selector: &str) -> usize {
    match HtmlDocument::parse(html).select_all(selector) {
        Ok(found) => found.len(),
        Err(e) => {
            ::log::warn!("{}", e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use crate::infer::{InferenceError, InferredSchema, PreparedInferrer};
    use crate::page::StaticPage;
    use crate::schema::default_schema;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    const SCHOLAR_RESULTS: &str = r#"<html><head><title>iot - Google Scholar</title></head><body>
        <h1>Scholar</h1>
        <div class="gs_r gs_or gs_scl"><h3 class="gs_rt"><a href="https://a.example/1">First</a></h3>
          <div class="gs_a">A Author, B Author - Venue, 2018</div>
          <div class="gs_fl gs_flb"><a>Cited by 5</a></div></div>
        <div class="gs_r gs_or gs_scl"><h3 class="gs_rt"><a href="https://a.example/2">Second</a></h3>
          <div class="gs_a">C Author - Venue, 2021</div></div>
    </body></html>"#;

    const DBLP_RESULTS: &str = r#"<html><head><title>dblp: graphs</title></head><body>
        <nav class="menu"><a href="/">home</a><a href="/faq">faq</a></nav>
        <ul class="publ-list">
          <li class="entry"><span class="title">Graph neural networks: a review</span>
              <span itemprop="author">Jie Zhou</span><span class="year">2020</span></li>
          <li class="entry"><span class="title">Spectral networks on graphs</span>
              <span itemprop="author">Joan Bruna</span><span class="year">2014</span></li>
          <li class="entry"><span class="title">Inductive representation learning</span>
              <span itemprop="author">Will Hamilton</span><span class="year">2017</span></li>
        </ul>
    </body></html>"#;

    /// Serves canned responses and records what was requested
    struct ScriptedFetcher {
        response: Result<String, FetchError>,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(response: Result<&str, &str>) -> Arc<Self> {
            Arc::new(Self {
                response: response.map(str::to_string).map_err(|e| FetchError(e.to_string())),
                requested: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requested.lock().await.push(url.to_string());
            self.response.clone()
        }
    }

    struct FailingInferrer;

    #[async_trait]
    impl SchemaInferrer for FailingInferrer {
        async fn infer(&self, _: &InferenceRequest) -> Result<InferredSchema, InferenceError> {
            Err(InferenceError::Failed("model unavailable".to_string()))
        }
    }

    fn repository() -> Arc<SchemaRepository> {
        Arc::new(SchemaRepository::new(Arc::new(MemoryStore::new())))
    }

    fn dblp_inferrer() -> Arc<PreparedInferrer> {
        Arc::new(
            PreparedInferrer::from_json(
                r#"{"search_url": "https://dblp.org/search?q={query}",
                    "search_params": {"q": "query"},
                    "selectors": {"resultContainer": "li.entry", "title": "span.title",
                                  "authors": "span[itemprop=author]", "date": "span.year"}}"#,
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_scrape_current_page() {
        let page = Arc::new(StaticPage::new(
            "https://scholar.google.com/scholar?hl=en&q=iot",
            SCHOLAR_RESULTS,
        ));
        let dispatcher = Dispatcher::new(repository()).with_page(page);

        let Outcome::Extraction(result) = dispatcher.execute(Command::ScrapeCurrentPage).await.unwrap() else {
            panic!("expected an extraction");
        };
        assert_eq!(result.source, "Google Scholar");
        assert_eq!(result.query, "iot");
        assert_eq!(result.total_results, 2);
        assert_eq!(result.records[0].citation_count, "5");
        assert_eq!(result.records[1].date, "2021");
    }

    #[tokio::test]
    async fn test_scrape_current_page_without_schema() {
        let page = Arc::new(StaticPage::new("https://dblp.org/search?q=x", DBLP_RESULTS));
        let dispatcher = Dispatcher::new(repository()).with_page(page);

        let err = dispatcher.execute(Command::ScrapeCurrentPage).await.unwrap_err();
        assert!(matches!(err, ScrapeError::NoSchemaForPage { .. }));
        assert!(err.to_string().contains("Google Scholar"));
    }

    #[tokio::test]
    async fn test_scrape_special_page() {
        let page = Arc::new(StaticPage::new("chrome://newtab", "<p>x</p>"));
        let dispatcher = Dispatcher::new(repository()).with_page(page);
        assert!(matches!(
            dispatcher.execute(Command::ScrapeCurrentPage).await,
            Err(ScrapeError::UnsupportedPage(_))
        ));
    }

    #[tokio::test]
    async fn test_search_site_fetches_and_extracts() {
        let fetcher = ScriptedFetcher::new(Ok(SCHOLAR_RESULTS));
        let dispatcher = Dispatcher::new(repository()).with_fetcher(fetcher.clone());

        let outcome = dispatcher
            .execute(Command::SearchSite {
                site: Some("scholar".to_string()),
                query: Some("smart cities".to_string()),
            })
            .await
            .unwrap();
        let Outcome::Extraction(result) = outcome else {
            panic!("expected an extraction");
        };

        let expected_url = "https://scholar.google.com/scholar?q=smart%20cities";
        assert_eq!(*fetcher.requested.lock().await, vec![expected_url.to_string()]);
        assert_eq!(result.url, expected_url);
        assert_eq!(result.query, "smart cities");
        assert_eq!(result.total_results, 2);
    }

    #[tokio::test]
    async fn test_search_site_validation() {
        let fetcher = ScriptedFetcher::new(Ok(SCHOLAR_RESULTS));
        let repository = repository();
        let mut no_search = default_schema();
        no_search.name = "Local Catalog".to_string();
        no_search.search_url_template = String::new();
        repository.save(no_search).await.unwrap();
        let dispatcher = Dispatcher::new(repository).with_fetcher(fetcher.clone());

        let search = |site: Option<&str>, query: Option<&str>| Command::SearchSite {
            site: site.map(str::to_string),
            query: query.map(str::to_string),
        };

        assert!(matches!(
            dispatcher.execute(search(Some("scholar"), None)).await,
            Err(ScrapeError::MissingParameter("query"))
        ));
        assert!(matches!(
            dispatcher.execute(search(Some(""), Some("iot"))).await,
            Err(ScrapeError::MissingParameter("site"))
        ));

        let err = dispatcher.execute(search(Some("arxiv"), Some("iot"))).await.unwrap_err();
        assert!(matches!(err, ScrapeError::UnknownSite { .. }));
        assert!(err.to_string().contains("Google Scholar, Local Catalog"));

        assert!(matches!(
            dispatcher.execute(search(Some("local catalog"), Some("iot"))).await,
            Err(ScrapeError::NoSearchUrl { .. })
        ));
        assert!(fetcher.requested.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_search_site_surfaces_fetch_error_verbatim() {
        let fetcher = ScriptedFetcher::new(Err("HTTP 429: Too Many Requests"));
        let dispatcher = Dispatcher::new(repository()).with_fetcher(fetcher);

        let err = dispatcher
            .execute(Command::SearchSite {
                site: Some("Google Scholar".to_string()),
                query: Some("iot".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::FetchFailed(_)));
        assert_eq!(err.to_string(), "HTTP 429: Too Many Requests");
    }

    #[tokio::test]
    async fn test_create_schema_then_scrape() {
        let repository = repository();
        let page = Arc::new(StaticPage::new("https://dblp.org/search?q=graphs", DBLP_RESULTS));
        let dispatcher = Dispatcher::new(repository.clone())
            .with_page(page)
            .with_inferrer(dblp_inferrer())
            .with_config(&ScraperConfig {
                min_simplified_len: 50,
                ..ScraperConfig::default()
            });

        let Outcome::SchemaCreated { schema, matched, message } =
            dispatcher.execute(Command::CreateSchema).await.unwrap()
        else {
            panic!("expected a created schema");
        };
        assert_eq!(schema.name, "Dblp");
        assert_eq!(schema.origin_url, "https://dblp.org");
        assert_eq!(schema.domain_tag, "general");
        assert_eq!(matched, 3);
        assert!(message.contains("3 results"));
        assert_eq!(repository.get_by_name("dblp").await, Some(schema));

        let Outcome::Extraction(result) = dispatcher.execute(Command::ScrapeCurrentPage).await.unwrap() else {
            panic!("expected an extraction");
        };
        assert_eq!(result.source, "Dblp");
        assert_eq!(result.query, "graphs");
        assert_eq!(result.total_results, 3);
        assert_eq!(result.records[1].title, "Spectral networks on graphs");
        assert_eq!(result.records[1].authors[0].name, "Joan Bruna");
        assert_eq!(result.records[1].date, "2014");
    }

    #[tokio::test]
    async fn test_create_schema_failures() {
        let small = Arc::new(StaticPage::new("https://tiny.example/", "<p>hi</p>"));
        let dispatcher = Dispatcher::new(repository())
            .with_page(small)
            .with_inferrer(dblp_inferrer());
        assert!(matches!(
            dispatcher.execute(Command::CreateSchema).await,
            Err(ScrapeError::InsufficientContent { .. })
        ));

        let page = Arc::new(StaticPage::new("https://dblp.org/", DBLP_RESULTS));
        let dispatcher = Dispatcher::new(repository())
            .with_page(page.clone())
            .with_inferrer(Arc::new(FailingInferrer))
            .with_config(&ScraperConfig {
                min_simplified_len: 10,
                ..ScraperConfig::default()
            });
        let err = dispatcher.execute(Command::CreateSchema).await.unwrap_err();
        assert!(matches!(err, ScrapeError::SchemaInferenceFailed(_)));
        assert!(err.to_string().contains("model unavailable"));

        let no_container = Arc::new(PreparedInferrer::new(InferredSchema::default()));
        let repository = repository();
        let dispatcher = Dispatcher::new(repository.clone())
            .with_page(page)
            .with_inferrer(no_container)
            .with_config(&ScraperConfig {
                min_simplified_len: 10,
                ..ScraperConfig::default()
            });
        assert!(matches!(
            dispatcher.execute(Command::CreateSchema).await,
            Err(ScrapeError::SchemaInferenceFailed(_))
        ));
        assert_eq!(repository.get_all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_list_and_delete_schemas() {
        let dispatcher = Dispatcher::new(repository());

        let Outcome::SchemaList { total, .. } = dispatcher.execute(Command::ListSchemas).await.unwrap() else {
            panic!("expected a schema list");
        };
        assert_eq!(total, 1);

        let err = dispatcher
            .execute(Command::DeleteSchema { name: Some("DBLP".to_string()) })
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::SchemaNotFound { .. }));
        assert!(err.to_string().contains("Available sites: Google Scholar"));

        assert!(matches!(
            dispatcher.execute(Command::DeleteSchema { name: None }).await,
            Err(ScrapeError::MissingParameter("name"))
        ));

        let Outcome::SchemaDeleted { name, .. } = dispatcher
            .execute(Command::DeleteSchema { name: Some("google scholar".to_string()) })
            .await
            .unwrap()
        else {
            panic!("expected a deletion");
        };
        assert_eq!(name, "Google Scholar");
    }

    #[tokio::test]
    async fn test_change_color_and_headings() {
        let page = Arc::new(StaticPage::new("https://scholar.google.com/", SCHOLAR_RESULTS));
        let dispatcher = Dispatcher::new(repository()).with_page(page.clone());

        let Outcome::ColorChanged { color, headings } = dispatcher
            .execute(Command::ChangeColor { color: Some("green".to_string()) })
            .await
            .unwrap()
        else {
            panic!("expected a colour change");
        };
        assert_eq!(color.as_deref(), Some("#00aa00"));
        assert_eq!(headings, 3);
        assert_eq!(page.heading_color().await.as_deref(), Some("#00aa00"));

        let Outcome::Headings(found) = dispatcher.execute(Command::GetHeadings).await.unwrap() else {
            panic!("expected headings");
        };
        assert_eq!(found.page_title, "iot - Google Scholar");
        assert_eq!(found.h1_titles.len(), 1);
        assert_eq!(found.h3_titles[1].text, "Second");
    }

    #[tokio::test]
    async fn test_page_commands_without_page() {
        let dispatcher = Dispatcher::new(repository());
        assert!(matches!(
            dispatcher.execute(Command::GetHeadings).await,
            Err(ScrapeError::Page(_))
        ));
    }

    #[tokio::test]
    async fn test_run_input() {
        let dispatcher = Dispatcher::new(repository());
        let parser = crate::command::JsonCommandParser;

        let outcome = dispatcher
            .run_input(&parser, r#"{"action": "listStructures", "params": {}}"#)
            .await
            .unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["action"], "schemaList");
        assert_eq!(json["total"], 1);

        assert!(matches!(
            dispatcher.run_input(&parser, r#"{"action": null}"#).await,
            Err(ScrapeError::CommandRejected(_))
        ));
    }
}
