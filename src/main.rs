use clap::Parser;
use schema_scraper::dom::HtmlDocument;
use schema_scraper::fetch::HttpFetcher;
use schema_scraper::infer::PreparedInferrer;
use schema_scraper::page::{LivePage, StaticPage};
use schema_scraper::simplify::{SimplifyOptions, simplify_with_options};
use schema_scraper::store::{KeyValueStore, ProviderConfig};
use schema_scraper::store::settings::{
    clear_provider_config, get_provider_config, save_provider_config,
};
use schema_scraper::webdriver::{WebDriverFetcher, WebDriverPage, connect_to_webdriver};
use schema_scraper::{
    Command, Dispatcher, FileStore, JsonCommandParser, Outcome, SchemaRepository, ScraperConfig,
};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

mod args;
use args::{Args, CliCommand, PageArgs};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        ::log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => ScraperConfig::from_file(path)?,
        None => ScraperConfig::default(),
    }
    .apply_env();

    let store_path = args
        .store
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.store_path));
    let store = Arc::new(FileStore::new(&store_path));
    ::log::info!("Using schema store at {}", store.path().display());

    let repository = Arc::new(SchemaRepository::new(store.clone()));
    let dispatcher = Dispatcher::new(repository).with_config(&config);

    match args.command {
        CliCommand::List => print(&dispatcher.execute(Command::ListSchemas).await?),
        CliCommand::Delete { name } => {
            let outcome = dispatcher
                .execute(Command::DeleteSchema { name: Some(name) })
                .await?;
            print(&outcome)
        }
        CliCommand::Search {
            site,
            query,
            webdriver,
        } => {
            let command = Command::SearchSite {
                site: Some(site),
                query: Some(query),
            };
            if webdriver {
                let client = connect_to_webdriver(&config.webdriver_url)
                    .await
                    .ok_or("no WebDriver server reachable")?;
                let fetcher = Arc::new(WebDriverFetcher::new(client));
                let outcome = dispatcher
                    .with_fetcher(fetcher.clone())
                    .execute(command)
                    .await;
                fetcher.close().await;
                print(&outcome?)
            } else {
                let fetcher = Arc::new(HttpFetcher::new(&config)?);
                print(&dispatcher.with_fetcher(fetcher).execute(command).await?)
            }
        }
        CliCommand::Scrape { page } => {
            let outcome = on_page(dispatcher, &page, &config, Command::ScrapeCurrentPage).await?;
            print(&outcome)
        }
        CliCommand::Simplify { file } => {
            let html = std::fs::read_to_string(&file)?;
            let options = SimplifyOptions {
                max_length: config.max_simplified_len,
            };
            println!("{}", simplify_with_options(&HtmlDocument::parse(&html), &options));
            Ok(())
        }
        CliCommand::Create { page, response } => {
            log_provider(store.as_ref()).await;
            let inferrer = Arc::new(PreparedInferrer::from_file(&response)?);
            let dispatcher = dispatcher.with_inferrer(inferrer);
            let outcome = on_page(dispatcher, &page, &config, Command::CreateSchema).await?;
            print(&outcome)
        }
        CliCommand::Headings { page } => {
            let outcome = on_page(dispatcher, &page, &config, Command::GetHeadings).await?;
            print(&outcome)
        }
        CliCommand::Color { color, page } => {
            let command = Command::ChangeColor { color: Some(color) };
            let outcome = on_page(dispatcher, &page, &config, command).await?;
            print(&outcome)
        }
        CliCommand::Run {
            input,
            page,
            response,
        } => {
            let mut dispatcher = dispatcher.with_fetcher(Arc::new(HttpFetcher::new(&config)?));
            if let Some(path) = response {
                log_provider(store.as_ref()).await;
                dispatcher = dispatcher.with_inferrer(Arc::new(PreparedInferrer::from_file(&path)?));
            }

            let opened = if page.page.is_some() || page.live {
                Some(open_page(&page, &config).await?)
            } else {
                None
            };
            if let Some(opened) = &opened {
                dispatcher = dispatcher.with_page(opened.page.clone());
            }

            let outcome = dispatcher.run_input(&JsonCommandParser, &input).await;
            if let Some(opened) = opened {
                opened.close().await;
            }
            print(&outcome?)
        }
        CliCommand::Configure {
            provider,
            api_key,
            model,
            clear,
        } => {
            if clear {
                clear_provider_config(store.as_ref()).await?;
                println!("Provider configuration cleared");
                return Ok(());
            }

            let provider_config = ProviderConfig {
                provider: provider.unwrap_or_default(),
                api_key: api_key.unwrap_or_default(),
                model,
            };
            save_provider_config(store.as_ref(), &provider_config).await?;
            println!(
                "Saved configuration for provider {}",
                provider_config.provider
            );
            Ok(())
        }
    }
}

/// A page opened for one command, with the live session to close afterwards
struct OpenedPage {
    page: Arc<dyn LivePage>,
    live: Option<Arc<WebDriverPage>>,
}

impl OpenedPage {
    async fn close(self) {
        if let Some(live) = self.live {
            live.close().await;
        }
    }
}

async fn open_page(args: &PageArgs, config: &ScraperConfig) -> Result<OpenedPage, Box<dyn Error>> {
    if args.live {
        let url = args.url.as_deref().ok_or("--live needs --url")?;
        ::log::info!("Opening {} through WebDriver at {}", url, config.webdriver_url);
        let live = Arc::new(WebDriverPage::open(&config.webdriver_url, url).await?);
        return Ok(OpenedPage {
            page: live.clone(),
            live: Some(live),
        });
    }

    let path = args
        .page
        .as_ref()
        .ok_or("a page is required: pass --page FILE or --live --url URL")?;
    let html = std::fs::read_to_string(path)?;
    let url = args
        .url
        .clone()
        .unwrap_or_else(|| format!("file://{}", path.display()));
    Ok(OpenedPage {
        page: Arc::new(StaticPage::new(url, html)),
        live: None,
    })
}

async fn on_page(
    dispatcher: Dispatcher,
    args: &PageArgs,
    config: &ScraperConfig,
    command: Command,
) -> Result<Outcome, Box<dyn Error>> {
    let opened = open_page(args, config).await?;
    let outcome = dispatcher
        .with_page(opened.page.clone())
        .execute(command)
        .await;
    opened.close().await;
    Ok(outcome?)
}

/// Reports which provider stands behind the inference response being replayed
async fn log_provider(store: &dyn KeyValueStore) {
    match get_provider_config(store).await {
        Some(provider) if provider.is_configured() => ::log::info!(
            "Schema inference provider: {} ({})",
            provider.provider,
            provider.model.as_deref().unwrap_or("default model")
        ),
        _ => ::log::warn!(
            "No inference provider configured; run `configure` to record the one that produced the response"
        ),
    }
}

fn print(outcome: &Outcome) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}
