use crate::store::{KeyValueStore, StoreError};
use serde::{Deserialize, Serialize};

/// Store key holding the provider configuration blob
pub const PROVIDER_CONFIG_KEY: &str = "ai_config";

/// Credentials for whichever model provider backs the external collaborators.
///
/// The scraper core never interprets these; it only keeps them next to the
/// schemas so every front end reads the same values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: String,

    #[serde(rename = "apiKey")]
    pub api_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ProviderConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Stored provider configuration; absent or unreadable reads as `None`
pub async fn get_provider_config(store: &dyn KeyValueStore) -> Option<ProviderConfig> {
    match store.get(PROVIDER_CONFIG_KEY).await {
        Ok(Some(value)) => serde_json::from_value(value)
            .map_err(|e| ::log::warn!("Ignoring malformed provider config: {}", e))
            .ok(),
        Ok(None) => None,
        Err(e) => {
            ::log::warn!("Failed to read provider config: {}", e);
            None
        }
    }
}

pub async fn save_provider_config(
    store: &dyn KeyValueStore,
    config: &ProviderConfig,
) -> Result<(), StoreError> {
    store
        .set(PROVIDER_CONFIG_KEY, serde_json::to_value(config)?)
        .await
}

pub async fn clear_provider_config(store: &dyn KeyValueStore) -> Result<(), StoreError> {
    store.remove(PROVIDER_CONFIG_KEY).await
}
