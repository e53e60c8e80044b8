//! Site Search Sync Entry Point
//!
//! Operator commands for the hosted search index: rebuild it from a site
//! export, report its size, or run a query against it.

use dotenv::dotenv;
use site_search_shared::{SearchQuery, SearchResultSet};
use site_search_sync::{Dependencies, IndexingError, SyncError};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "usage: site-search-sync <reindex | count | search <query> [page]>";

/// A parsed command line.
#[derive(Debug, PartialEq)]
enum Command {
    Reindex,
    Count,
    Search { query: String, page: u32 },
}

impl Command {
    fn parse(args: &[String]) -> Result<Self, IndexingError> {
        match args {
            [cmd] if cmd == "reindex" => Ok(Self::Reindex),
            [cmd] if cmd == "count" => Ok(Self::Count),
            [cmd, query] if cmd == "search" => Ok(Self::Search {
                query: query.clone(),
                page: 1,
            }),
            [cmd, query, page] if cmd == "search" => {
                let page = page
                    .parse::<u32>()
                    .ok()
                    .filter(|p| *p > 0)
                    .ok_or_else(|| IndexingError::usage(format!("invalid page '{}'", page)))?;
                Ok(Self::Search {
                    query: query.clone(),
                    page,
                })
            }
            _ => Err(IndexingError::usage(USAGE)),
        }
    }
}

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), IndexingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("site_search_sync=info,site_search_repository=info")
    });

    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "site-search-sync",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "site-search-sync",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}

fn render_results(results: &SearchResultSet) -> Result<String, IndexingError> {
    let body = serde_json::to_string_pretty(results).map_err(SyncError::from)?;
    Ok(body)
}

async fn run(deps: &Dependencies, command: Command) -> Result<(), IndexingError> {
    match command {
        Command::Reindex => {
            let widget = deps.widget.as_ref().ok_or_else(|| {
                IndexingError::config(
                    "manual reindex is disabled (set ALGOLIA_WIDGET and SITE_EXPORT_PATH)",
                )
            })?;
            let ack = widget.trigger_reindex().await?;
            println!("{}", ack.message);
        }
        Command::Count => {
            let count = deps.service.object_count().await?;
            println!("{}", count);
        }
        Command::Search { query, page } => {
            let results = deps
                .service
                .search(&SearchQuery::new(query).with_page(page))
                .await?;
            println!("{}", render_results(&results)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    let args: Vec<String> = env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    let deps = match Dependencies::new() {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match run(&deps, command).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(error = %e, "Command failed");
            Err(e)
        }
    }
}
