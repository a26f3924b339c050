//! Venue Router CLI
//!
//! Thin operator front end over the library: resolve a token's venue, quote it, or
//! trade it through the retry/fallback controller. Results are printed to stdout as
//! JSON; logs go to stderr.

#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use solana_sdk::pubkey::Pubkey;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use venue_router::aggregator::AggregatorClient;
use venue_router::config::Config;
use venue_router::discovery::{VenueCache, VenueDiscovery};
use venue_router::endpoints;
use venue_router::execution::ExecutionController;
use venue_router::ledger::{LedgerClient, RequestBudget, SolanaLedger};
use venue_router::observability::init_logging;
use venue_router::types::{TradeRequest, TradeSide};
use venue_router::wallet::WalletManager;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file; defaults and environment overrides apply without one
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the venue currently holding liquidity for a token
    Discover {
        mint: Pubkey,
    },
    /// Quote a trade on the discovered venue without sending anything
    Quote {
        mint: Pubkey,
        #[arg(long)]
        side: TradeSide,
        /// Lamports to spend on a buy, raw token units to sell
        #[arg(long)]
        amount: u64,
    },
    /// Execute a trade with retries and venue fallback
    Trade {
        mint: Pubkey,
        #[arg(long)]
        side: TradeSide,
        /// Lamports to spend on a buy, raw token units to sell
        #[arg(long)]
        amount: u64,
        /// Stop starting new attempts after this many seconds
        #[arg(long)]
        deadline_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.json_logs)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting venue router");
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    if config.monitoring.enable_metrics {
        let port = config.monitoring.metrics_port;
        tokio::spawn(async move {
            if let Err(e) = endpoints::endpoint_server(port).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    let controller = build_controller(&config)?;

    let output = match args.command {
        Command::Discover { mint } => {
            let venue = controller.discovery().discover(&mint).await?;
            json!({ "mint": mint.to_string(), "venue": venue })
        }
        Command::Quote { mint, side, amount } => {
            let quote = controller.quote(&TradeRequest::new(mint, side, amount)).await?;
            serde_json::to_value(quote)?
        }
        Command::Trade {
            mint,
            side,
            amount,
            deadline_secs,
        } => {
            let wallet = WalletManager::from_file(&config.wallet.keypair_path)
                .context("Failed to load wallet")?;
            info!(wallet = %wallet.pubkey(), "Wallet loaded");

            let mut request = TradeRequest::new(mint, side, amount);
            if let Some(secs) = deadline_secs {
                request = request.with_deadline(tokio::time::Instant::now() + Duration::from_secs(secs));
            }

            let result = controller.execute(wallet.keypair(), &request).await;
            let success = result.success;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !success {
                std::process::exit(1);
            }
            return Ok(());
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Ledger, discovery and (optionally) the relay client, wired from configuration
fn build_controller(config: &Config) -> Result<ExecutionController> {
    let ledger: Arc<dyn LedgerClient> = Arc::new(SolanaLedger::new(
        &config.rpc.endpoint,
        Duration::from_secs(config.rpc.timeout_secs),
        config.rpc.skip_preflight,
    ));

    let discovery_config = config.discovery_config();
    let cache = Arc::new(
        VenueCache::new(discovery_config.cache_ttl).with_max_entries(discovery_config.cache_max_entries),
    );
    cache.spawn_pruner(discovery_config.cache_prune_interval);
    let discovery = Arc::new(VenueDiscovery::new(Arc::clone(&ledger), cache, &discovery_config));

    let mut controller = ExecutionController::new(
        ledger,
        discovery,
        config.execution.clone(),
        config.venues.clone(),
    );

    if config.aggregator.enabled {
        let budget = Arc::new(RequestBudget::per_second(config.aggregator.requests_per_second));
        let client = AggregatorClient::new(
            &config.aggregator.base_url,
            Duration::from_secs(config.aggregator.timeout_secs),
            budget,
        )
        .context("Failed to build aggregator client")?;
        controller = controller.with_aggregator(Arc::new(client));
    }

    Ok(controller)
}
