//! Coinbook main entry point

use anyhow::Context;
use coinbook_api::{start_server, AppState};
use coinbook_config::{Config, ConfigError};
use coinbook_core::{store_from_config, TransactionManager};
use coinbook_market::CoinGeckoClient;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "coinbook")]
#[command(author = "Coinbook Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Record cryptocurrency purchases with the coin price at purchase time", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    // Logging needs the configured level, so report load problems after init
    let loaded = Config::load(&args.config);
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match loaded {
        Ok(config) => {
            log::info!("Config loaded from {}", args.config.display());
            config
        }
        Err(ConfigError::FileNotFound { path }) => {
            log::warn!("Config file {} not found, using defaults", path);
            Config::default()
        }
        Err(e) => {
            let details = e.to_details();
            log::error!("{} ({})", details.message, details.code);
            return Err(e).with_context(|| format!("Failed to load configuration from {}", args.config.display()));
        }
    };

    let store = store_from_config(&config);
    log::info!("Transactions stored in {}", store.describe());
    let manager = TransactionManager::new(store);

    let market = CoinGeckoClient::with_base_url(config.market.base_url.clone(), config.market.vs_currency.clone())
        .with_api_key(config.market.api_key.clone());

    let state = AppState::new(config, manager, Arc::new(market));

    let rt = Runtime::new()?;
    rt.block_on(start_server(state)).context("Server error")?;

    Ok(())
}
