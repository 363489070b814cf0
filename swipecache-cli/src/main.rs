use std::{sync::Arc, time::Duration};

use clap::Parser;
use error::AppError;
use swipecache_engine::{CacheConfig, DiskCache, DownloadCoordinator, FetchConfig, HttpFetcher};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::writer::MakeWriterExt;

mod cli;
mod commands;
mod error;
mod utils;

use cli::{CliArgs, Command};
use utils::parse_header;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        // Log the full error for debugging
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    // Parse command-line arguments
    let args = CliArgs::parse();

    init_logging(&args)?;

    let cache_config = CacheConfig {
        root_dir: args.cache_dir.clone(),
        key_strategy: args.key_strategy,
        ..CacheConfig::default()
    };
    let cache = Arc::new(DiskCache::new(&cache_config));
    info!(dir = ?cache.root(), strategy = ?args.key_strategy, "Using video cache");

    match &args.command {
        Command::Resolve { urls } => {
            let coordinator = build_coordinator(&args, Arc::clone(&cache))?;
            commands::resolve(&coordinator, urls.clone()).await
        }
        Command::Source { url } => {
            let coordinator = build_coordinator(&args, Arc::clone(&cache))?;
            commands::source(coordinator, url).await
        }
        Command::Lookup { url } => commands::lookup(&cache, url).await,
        Command::Import { url, file } => commands::import(&cache, url, file).await,
        Command::Remove { url } => commands::remove(&cache, url).await,
        Command::Clear => commands::clear(&cache).await,
    }
}

fn init_logging(args: &CliArgs) -> Result<(), AppError> {
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let builder = FmtSubscriber::builder().with_max_level(log_level);

    let result = match &args.log_file {
        Some(path) => {
            let log_file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let subscriber = builder
                .with_writer(MakeWriterExt::and(std::io::stderr, Arc::new(log_file)))
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
        None => {
            let subscriber = builder.with_writer(std::io::stderr).finish();
            tracing::subscriber::set_global_default(subscriber)
        }
    };

    result.map_err(|e| AppError::Initialization(e.to_string()))
}

fn build_coordinator(
    args: &CliArgs,
    cache: Arc<DiskCache>,
) -> Result<DownloadCoordinator, AppError> {
    let mut builder = FetchConfig::builder()
        .with_timeout(Duration::from_secs(args.timeout))
        .with_connect_timeout(Duration::from_secs(args.connect_timeout));

    if let Some(user_agent) = &args.user_agent {
        builder = builder.with_user_agent(user_agent);
    }

    for header in &args.headers {
        if let Some((name, value)) = parse_header(header) {
            info!("Adding header: {}: {}", name, value);
            builder = builder.with_header(name, value);
        }
    }

    let fetcher = Arc::new(HttpFetcher::new(&builder.build())?);
    Ok(DownloadCoordinator::new(cache, fetcher))
}
