//! The closed command vocabulary and the boundary that produces it.

use crate::error::ScrapeError;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Everything the dispatcher can be asked to do.
///
/// Parameters stay optional here; each dispatch branch validates what it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Recolour the page headings; `None` restores them
    ChangeColor { color: Option<String> },
    GetHeadings,
    ScrapeCurrentPage,
    SearchSite {
        site: Option<String>,
        query: Option<String>,
    },
    CreateSchema,
    ListSchemas,
    DeleteSchema { name: Option<String> },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChangeColorParams {
    color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchSiteParams {
    site: Option<String>,
    query: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DeleteSchemaParams {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCommand {
    action: Option<String>,
    #[serde(default)]
    params: Value,
}

impl Command {
    /// Tag used on the wire
    pub fn action(&self) -> &'static str {
        match self {
            Command::ChangeColor { .. } => "changeColor",
            Command::GetHeadings => "getHeadings",
            Command::ScrapeCurrentPage => "scrapeCurrentPage",
            Command::SearchSite { .. } => "searchSite",
            Command::CreateSchema => "createSchema",
            Command::ListSchemas => "listSchemas",
            Command::DeleteSchema { .. } => "deleteSchema",
        }
    }

    /// Parses `{"action": ..., "params": {...}}`.
    ///
    /// A null action means the input was not understood and yields `Ok(None)`.
    /// Unknown actions and malformed parameters are rejected here, before
    /// anything is dispatched.
    pub fn from_json(text: &str) -> Result<Option<Command>, ScrapeError> {
        let raw: RawCommand = serde_json::from_str(text)
            .map_err(|e| ScrapeError::CommandRejected(format!("malformed command: {}", e)))?;
        let Some(action) = raw.action else {
            return Ok(None);
        };
        let params = raw.params;

        let command = match action.as_str() {
            "changeColor" => {
                let p: ChangeColorParams = params_of(&action, params)?;
                Command::ChangeColor { color: p.color }
            }
            "getHeadings" | "getTitles" => Command::GetHeadings,
            "scrapeCurrentPage" | "scrapeResults" => Command::ScrapeCurrentPage,
            "searchSite" => {
                let p: SearchSiteParams = params_of(&action, params)?;
                Command::SearchSite {
                    site: p.site,
                    query: p.query,
                }
            }
            "createSchema" | "createStructure" => Command::CreateSchema,
            "listSchemas" | "listStructures" => Command::ListSchemas,
            "deleteSchema" | "deleteStructure" => {
                let p: DeleteSchemaParams = params_of(&action, params)?;
                Command::DeleteSchema { name: p.name }
            }
            other => {
                return Err(ScrapeError::CommandRejected(format!("unknown action \"{}\"", other)));
            }
        };
        Ok(Some(command))
    }
}

fn params_of<T: DeserializeOwned + Default>(action: &str, params: Value) -> Result<T, ScrapeError> {
    if params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(params)
        .map_err(|e| ScrapeError::CommandRejected(format!("bad parameters for {}: {}", action, e)))
}

/// The outermost `{ ... }` span of a model answer, if any
pub fn json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Turns user input into a command; `Ok(None)` when nothing was understood
#[async_trait]
pub trait CommandParser: Send + Sync {
    async fn parse(&self, input: &str) -> Result<Option<Command>, ScrapeError>;
}

/// Accepts commands already written as JSON, optionally wrapped in prose
#[derive(Debug, Default)]
pub struct JsonCommandParser;

#[async_trait]
impl CommandParser for JsonCommandParser {
    async fn parse(&self, input: &str) -> Result<Option<Command>, ScrapeError> {
        match json_span(input) {
            Some(span) => Command::from_json(span),
            None => Ok(None),
        }
    }
}
