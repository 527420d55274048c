use crate::schema::{SiteSchema, default_schema};
use crate::store::{KeyValueStore, StoreError};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Store key holding the full ordered list of schemas
pub const SCHEMAS_KEY: &str = "site_structures";

/// Durable, ordered collection of site schemas keyed by case-insensitive name.
///
/// Every mutation is a read-modify-write of the whole collection, so writes
/// (including the first-use seeding) are serialized through one async mutex.
pub struct SchemaRepository {
    store: Arc<dyn KeyValueStore>,
    writes: Mutex<()>,
}

impl SchemaRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            writes: Mutex::new(()),
        }
    }

    /// All schemas in insertion order.
    ///
    /// An empty store is seeded with the built-in default. When the store
    /// cannot be read the default is returned without being persisted.
    pub async fn get_all(&self) -> Vec<SiteSchema> {
        if let Ok(Some(schemas)) = self.read().await {
            return schemas;
        }
        let _guard = self.writes.lock().await;
        match self.load_locked().await {
            Ok(schemas) => schemas,
            Err(e) => {
                ::log::warn!("Schema store unreadable, serving built-in default: {}", e);
                vec![default_schema()]
            }
        }
    }

    /// Exact case-insensitive name match
    pub async fn get_by_name(&self, name: &str) -> Option<SiteSchema> {
        self.get_all().await.into_iter().find(|s| s.has_name(name))
    }

    /// Exact name first, then a case-insensitive substring match in either
    /// direction ("scholar" finds "Google Scholar", and vice versa).
    pub async fn find_by_name_fuzzy(&self, name: &str) -> Option<SiteSchema> {
        let schemas = self.get_all().await;
        if let Some(exact) = schemas.iter().find(|s| s.has_name(name)) {
            return Some(exact.clone());
        }

        let wanted = name.to_lowercase();
        schemas.into_iter().find(|s| {
            let candidate = s.name.to_lowercase();
            candidate.contains(&wanted) || wanted.contains(&candidate)
        })
    }

    /// First schema, in insertion order, whose origin hostname contains or is
    /// contained in `hostname`. Tolerates `www.` and subdomain variants.
    pub async fn find_by_hostname(&self, hostname: &str) -> Option<SiteSchema> {
        if hostname.is_empty() {
            return None;
        }

        for schema in self.get_all().await {
            let Some(site_host) = schema.hostname() else {
                continue;
            };
            if hostname.contains(&site_host) || site_host.contains(hostname) {
                ::log::debug!("Hostname {} matched schema {}", hostname, schema.name);
                return Some(schema);
            }
        }
        None
    }

    /// Names of all schemas, in insertion order
    pub async fn site_names(&self) -> Vec<String> {
        self.get_all().await.into_iter().map(|s| s.name).collect()
    }

    /// Replaces the schema with the same name in place, or appends it
    pub async fn save(&self, schema: SiteSchema) -> Result<(), StoreError> {
        let _guard = self.writes.lock().await;
        let mut schemas = self.load_locked().await?;

        match schemas.iter().position(|s| s.has_name(&schema.name)) {
            Some(index) => {
                ::log::info!("Updating schema {}", schema.name);
                schemas[index] = schema;
            }
            None => {
                ::log::info!("Adding schema {}", schema.name);
                schemas.push(schema);
            }
        }

        self.persist(&schemas).await
    }

    /// Removes the schema with this name; absent names are not an error
    pub async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let _guard = self.writes.lock().await;
        let mut schemas = self.load_locked().await?;
        let before = schemas.len();
        schemas.retain(|s| !s.has_name(name));
        ::log::info!("Deleted {} schema(s) named {}", before - schemas.len(), name);
        self.persist(&schemas).await
    }

    /// Reads the stored collection. `Ok(None)` means "nothing usable stored":
    /// the key is missing, not a list, or an empty list.
    async fn read(&self) -> Result<Option<Vec<SiteSchema>>, StoreError> {
        match self.store.get(SCHEMAS_KEY).await? {
            Some(serde_json::Value::Array(items)) if !items.is_empty() => {
                let schemas = serde_json::from_value(serde_json::Value::Array(items))?;
                Ok(Some(schemas))
            }
            _ => Ok(None),
        }
    }

    /// Loads the collection, seeding the default when empty.
    /// A collection that cannot be read is an error, never replaced.
    /// Callers must hold the write lock.
    async fn load_locked(&self) -> Result<Vec<SiteSchema>, StoreError> {
        if let Some(schemas) = self.read().await? {
            return Ok(schemas);
        }
        let defaults = vec![default_schema()];
        self.persist(&defaults).await?;
        ::log::info!("Seeded schema store with the built-in default");
        Ok(defaults)
    }

    async fn persist(&self, schemas: &[SiteSchema]) -> Result<(), StoreError> {
        let value = serde_json::to_value(schemas)?;
        self.store.set(SCHEMAS_KEY, value).await
    }
}
