pub mod colors;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod dom;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod infer;
pub mod page;
pub mod results;
pub mod schema;
pub mod simplify;
pub mod store;
pub mod webdriver;

// Re-export commonly used types for convenience
pub use command::{Command, CommandParser, JsonCommandParser};
pub use config::ScraperConfig;
pub use dispatch::{Dispatcher, Outcome};
pub use error::ScrapeError;
pub use results::{Author, ExtractedRecord, ExtractionResult};
pub use schema::{SiteSchema, SiteSelectors};
pub use store::{FileStore, KeyValueStore, MemoryStore, SchemaRepository};
