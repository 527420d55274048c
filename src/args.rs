use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "schema-scraper")]
#[command(about = "Extracts structured records from search result pages using per-site schemas")]
#[command(version)]
pub struct Args {
    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Store file holding schemas and provider settings (overrides the config)
    #[arg(long)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Where the page a command acts on comes from
#[derive(ClapArgs, Debug, Clone)]
pub struct PageArgs {
    /// Saved HTML of the page
    #[arg(long, conflicts_with = "live")]
    pub page: Option<PathBuf>,

    /// Address of the page
    #[arg(long)]
    pub url: Option<String>,

    /// Open `--url` in a WebDriver-controlled browser instead of reading a file
    #[arg(long, requires = "url")]
    pub live: bool,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// List the stored schemas
    List,

    /// Delete a schema by name
    Delete { name: String },

    /// Search a configured site and extract its results
    Search {
        site: String,
        query: String,

        /// Fetch through WebDriver rather than plain HTTP
        #[arg(long)]
        webdriver: bool,
    },

    /// Extract results from a page using the schema matching its hostname
    Scrape {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Print the simplified HTML of a saved page
    Simplify { file: PathBuf },

    /// Create a schema for a page from an inference response
    Create {
        #[command(flatten)]
        page: PageArgs,

        /// File holding the inferred schema (model answer or raw JSON)
        #[arg(long)]
        response: PathBuf,
    },

    /// List the title and headings of a page
    Headings {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Recolour the headings of a page; "restore" undoes it
    Color {
        color: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Execute a JSON command such as '{"action": "listSchemas"}'
    Run {
        input: String,

        #[command(flatten)]
        page: PageArgs,

        /// Inference response used when the command creates a schema
        #[arg(long)]
        response: Option<PathBuf>,
    },

    /// Store or clear the schema-inference provider settings
    Configure {
        #[arg(long, required_unless_present = "clear")]
        provider: Option<String>,

        #[arg(long, required_unless_present = "clear")]
        api_key: Option<String>,

        #[arg(long)]
        model: Option<String>,

        #[arg(long, conflicts_with_all = ["provider", "api_key", "model"])]
        clear: bool,
    },
}
