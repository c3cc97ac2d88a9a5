//! tictac_promo - game server and promo bot.

#![warn(missing_docs)]

mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use tictac_promo::{
    AppConfig, AppState, FileConfig, GameService, MessagingChannel, OpsChannel, PromoAllocator,
    RewardStore, SqliteStore, StoreSettings, SyncLoop, TelegramChannel, WinLedger, router,
};
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();
    initialize_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port } => run_server(cli.config, port).await,
        Command::Seed { file } => run_seed(cli.config, file).await,
        Command::Stats => run_stats(cli.config).await,
    }
}

fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tictac_promo=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Opens the store described by the config file and environment.
fn open_store(config_path: Option<&Path>) -> Result<SqliteStore> {
    let file = match config_path {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let settings = StoreSettings::resolve(&file, &|key: &str| std::env::var(key).ok())?;
    Ok(SqliteStore::open(
        settings.database_url().clone(),
        *settings.store_timeout(),
    )?)
}

/// Run the HTTP server and the polling loop until Ctrl+C
#[instrument(skip_all)]
async fn run_server(config_path: Option<PathBuf>, port: Option<u16>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let port = port.unwrap_or(*config.port());

    let store: Arc<dyn RewardStore> = Arc::new(SqliteStore::open(
        config.store().database_url().clone(),
        *config.store().store_timeout(),
    )?);
    let ledger = WinLedger::new(store.clone());
    let allocator = PromoAllocator::new(store);

    let channel: Arc<dyn MessagingChannel> =
        Arc::new(TelegramChannel::new(config.telegram_bot_token().clone())?);
    let ops = config
        .ops_chat_id()
        .map(|chat_id| OpsChannel::new(channel.clone(), chat_id));

    let poller = SyncLoop::new(channel, ledger.clone(), allocator)
        .with_interval(*config.poll_interval())
        .spawn();

    let state = AppState::new(GameService::new(ledger, ops));
    let app = router(state, config.allowed_origins());

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), port))
        .await
        .with_context(|| format!("binding {}:{}", config.host(), port))?;
    info!(host = %config.host(), port, "Server ready");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown requested");
        })
        .await;

    poller.stop().await;
    served?;
    Ok(())
}

/// Add codes from a file to the pool
#[instrument(skip_all, fields(file = %file.display()))]
async fn run_seed(config_path: Option<PathBuf>, file: PathBuf) -> Result<()> {
    let store = open_store(config_path.as_deref())?;
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("reading {}", file.display()))?;
    let codes: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let offered = codes.len();
    let inserted = store.seed_codes(codes).await?;
    let stats = store.pool_stats().await?;
    println!(
        "Seeded {} of {} codes ({} unused / {} total)",
        inserted,
        offered,
        stats.unused(),
        stats.total()
    );
    Ok(())
}

/// Print pool usage
#[instrument(skip_all)]
async fn run_stats(config_path: Option<PathBuf>) -> Result<()> {
    let store = open_store(config_path.as_deref())?;
    let stats = store.pool_stats().await?;
    println!(
        "{} total, {} used, {} unused",
        stats.total(),
        stats.used(),
        stats.unused()
    );
    Ok(())
}
