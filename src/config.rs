use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Configuration for the scraper front end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// JSON file holding the schema collection and provider config
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// URL for the WebDriver instance used for live pages
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// User-Agent sent by the HTTP fetcher
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept-Language sent by the HTTP fetcher
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Pages simplifying to fewer characters are rejected for schema creation
    #[serde(default = "default_min_simplified_len")]
    pub min_simplified_len: usize,

    /// Ceiling on the simplified HTML handed to schema inference
    #[serde(default = "default_max_simplified_len")]
    pub max_simplified_len: usize,
}

impl ScraperConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Override the WebDriver URL with the `WEBDRIVER_URL` environment variable if set
    pub fn apply_env(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            webdriver_url: default_webdriver_url(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            min_simplified_len: default_min_simplified_len(),
            max_simplified_len: default_max_simplified_len(),
        }
    }
}

fn default_store_path() -> String {
    "schema-scraper.json".to_string()
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_min_simplified_len() -> usize {
    100
}

fn default_max_simplified_len() -> usize {
    crate::simplify::DEFAULT_MAX_LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ScraperConfig =
            serde_json::from_str(r#"{"store_path": "/tmp/schemas.json"}"#).unwrap();
        assert_eq!(config.store_path, "/tmp/schemas.json");
        assert_eq!(config.webdriver_url, "http://localhost:4444");
        assert_eq!(config.min_simplified_len, 100);
        assert_eq!(config.max_simplified_len, 8000);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("schema-scraper-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"accept_language": "es-ES,es;q=0.9"}"#).unwrap();

        let config = ScraperConfig::from_file(&path).unwrap();
        assert_eq!(config.accept_language, "es-ES,es;q=0.9");
        assert_eq!(config.store_path, "schema-scraper.json");

        let _ = std::fs::remove_file(&path);
        assert!(ScraperConfig::from_file(&path).is_err());
    }
}
