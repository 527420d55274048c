//! Live pages and fetching through a WebDriver session.

use crate::fetch::{FetchError, Fetcher};
use crate::page::{LivePage, PageError};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use serde_json::Value;

/// Tried in order when the configured WebDriver URL refuses the session
const FALLBACK_WEBDRIVER_URLS: &[&str] = &[
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444",
];

const SET_HEADING_COLOR_SCRIPT: &str = r#"
const color = arguments[0];
const headings = document.querySelectorAll('h1, h2, h3');
headings.forEach(h => { h.style.color = color === null ? '' : color; });
return headings.length;
"#;

/// Connects to the WebDriver instance, falling back to common local ports
pub async fn connect_to_webdriver(webdriver_url: &str) -> Option<Client> {
    match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Some(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
        }
    }

    for url in FALLBACK_WEBDRIVER_URLS.iter().filter(|url| **url != webdriver_url) {
        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Some(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    None
}

fn page_error(context: &str, error: fantoccini::error::CmdError) -> PageError {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost WebDriver session while {}", context);
    }
    PageError(format!("Failed {}: {}", context, error))
}

/// The page currently open in a WebDriver-controlled browser
pub struct WebDriverPage {
    client: Client,
}

impl WebDriverPage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connects and navigates to `url`
    pub async fn open(webdriver_url: &str, url: &str) -> Result<Self, PageError> {
        let client = connect_to_webdriver(webdriver_url)
            .await
            .ok_or_else(|| PageError("no WebDriver server reachable".to_string()))?;
        client
            .goto(url)
            .await
            .map_err(|e| page_error("navigating", e))?;
        Ok(Self::new(client))
    }

    /// Ends the WebDriver session
    pub async fn close(&self) {
        if let Err(e) = self.client.clone().close().await {
            ::log::warn!("Failed to close WebDriver client: {}", e);
        }
    }
}

#[async_trait]
impl LivePage for WebDriverPage {
    async fn url(&self) -> Result<String, PageError> {
        self.client
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(|e| page_error("reading the page URL", e))
    }

    async fn title(&self) -> Result<String, PageError> {
        self.client
            .title()
            .await
            .map_err(|e| page_error("reading the page title", e))
    }

    async fn html(&self) -> Result<String, PageError> {
        self.client
            .source()
            .await
            .map_err(|e| page_error("getting the page source", e))
    }

    async fn set_heading_color(&self, color: Option<&str>) -> Result<usize, PageError> {
        let arg = color.map_or(Value::Null, |c| Value::String(c.to_string()));
        let count = self
            .client
            .execute(SET_HEADING_COLOR_SCRIPT, vec![arg])
            .await
            .map_err(|e| page_error("changing heading colors", e))?;
        Ok(count.as_u64().unwrap_or_default() as usize)
    }
}

/// Fetches pages by navigating a dedicated WebDriver session
pub struct WebDriverFetcher {
    client: Client,
}

impl WebDriverFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Ends the WebDriver session
    pub async fn close(&self) {
        if let Err(e) = self.client.clone().close().await {
            ::log::warn!("Failed to close WebDriver client: {}", e);
        }
    }
}

#[async_trait]
impl Fetcher for WebDriverFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.client
            .goto(url)
            .await
            .map_err(|e| FetchError(format!("Failed to open {}: {}", url, e)))?;
        self.client
            .source()
            .await
            .map_err(|e| FetchError(format!("Failed to get source for {}: {}", url, e)))
    }
}
