// src/main.rs

//! fundwatch CLI
//!
//! Watches a support-measures listing page and announces newly published
//! entries to a Telegram chat, once each.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;

use fundwatch::{
    error::Result,
    models::Config,
    pipeline::{Watcher, run_responder},
    services::{MeasureExtractor, Notifier, PageFetcher, PageSource, TelegramNotifier},
    storage::{MeasureStore, SqliteStore},
    telegram::TelegramBot,
    utils::http,
};

/// fundwatch - Support measure watcher
#[derive(Parser, Debug)]
#[command(
    name = "fundwatch",
    version,
    about = "Watches a support-measures page and announces new entries"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the watcher loop and the message responder
    Run,

    /// Execute a single watch cycle and exit
    Once,

    /// Validate the configuration file
    Validate,

    /// Show store and configuration summary
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Assemble the watcher from its collaborators.
fn build_watcher(
    config: &Config,
    bot: &Arc<TelegramBot>,
    client: reqwest::Client,
    store: Arc<SqliteStore>,
) -> Result<Watcher> {
    let fetcher = PageFetcher::new(client, config.watcher.source_url.clone());
    let extractor = MeasureExtractor::new(&config.selectors, &config.watcher.source_url)?;
    let notifier = TelegramNotifier::new(Arc::clone(bot), config.telegram.chat_id);

    Ok(Watcher::new(
        Arc::new(fetcher) as Arc<dyn PageSource>,
        extractor,
        store as Arc<dyn MeasureStore>,
        Arc::new(notifier) as Arc<dyn Notifier>,
        Duration::from_secs(config.watcher.poll_interval_secs),
    ))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("fundwatch starting...");

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Run => {
            config.validate()?;

            let store = Arc::new(SqliteStore::open(&config.storage.db_path)?);
            let client = http::create_client(&config.watcher)?;
            let bot = Arc::new(TelegramBot::new(config.telegram.bot_token.clone()));

            match bot.get_me().await {
                Ok(me) => log::info!(
                    "Bot connected: @{}",
                    me.username.as_deref().unwrap_or(&me.first_name)
                ),
                Err(e) => log::warn!("Could not confirm bot identity: {e}"),
            }

            log::info!(
                "Watching {} every {}s ({} measures recorded)",
                config.watcher.source_url,
                config.watcher.poll_interval_secs,
                store.count().await?
            );

            let watcher = build_watcher(&config, &bot, client, Arc::clone(&store))?;
            let (shutdown_tx, shutdown_rx) = watch::channel(false);

            let watcher_task = tokio::spawn(watcher.run(shutdown_rx.clone()));
            let responder_task = tokio::spawn(run_responder(Arc::clone(&bot), shutdown_rx));

            tokio::signal::ctrl_c().await?;
            log::info!("Shutting down...");
            let _ = shutdown_tx.send(true);
            let _ = watcher_task.await;
            let _ = responder_task.await;
        }

        Command::Once => {
            config.validate()?;

            let store = Arc::new(SqliteStore::open(&config.storage.db_path)?);
            let client = http::create_client(&config.watcher)?;
            let bot = Arc::new(TelegramBot::new(config.telegram.bot_token.clone()));

            let watcher = build_watcher(&config, &bot, client, store)?;
            let outcome = watcher.run_cycle().await?;

            log::info!(
                "Cycle complete: {} listed, {} new, {} already seen, {} announce failures",
                outcome.discovered,
                outcome.inserted,
                outcome.already_seen,
                outcome.notify_failures
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            MeasureExtractor::new(&config.selectors, &config.watcher.source_url)?;

            log::info!("✓ Config OK (selectors parse, credentials present)");
        }

        Command::Info => {
            let store = SqliteStore::open(&config.storage.db_path)?;

            log::info!("Source: {}", config.watcher.source_url);
            log::info!("Poll interval: {}s", config.watcher.poll_interval_secs);
            log::info!("Store: {}", config.storage.db_path);
            log::info!("Recorded measures: {}", store.count().await?);
        }
    }

    log::info!("Done!");

    Ok(())
}
