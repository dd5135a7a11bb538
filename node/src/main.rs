// Copyright (c) 2026 Regalium Contributors. MIT License.
// See LICENSE for details.

//! # Regalium Node
//!
//! Entry point for the `regalium-node` binary. A thin host around the
//! ledger: it supplies the wall clock, takes the caller identity from each
//! request and persists every accepted operation.
//!
//! - `init`    — write `genesis.json` and deploy the ledger
//! - `run`     — serve the HTTP API and Prometheus metrics
//! - `mine`    — search for a mining nonce locally
//! - `version` — print build version information

mod api;
mod cli;
mod genesis;
mod logging;
mod metrics;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::RwLock;

use regalium_contracts::{search_nonce, Blake3Pow};
use regalium_protocol::{format_units, Address};

use cli::{Commands, RegaliumNodeCli};
use logging::LogFormat;
use metrics::LedgerMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = RegaliumNodeCli::parse();

    match cli.command {
        Commands::Init(args) => init_node(args),
        Commands::Run(args) => run_node(args).await,
        Commands::Mine(args) => mine_nonce(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Loads the ledger and serves the API and metrics until shutdown.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        &format!("{},tower_http=debug", logging::DEFAULT_FILTER),
        args.log_format,
    );

    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        data_dir = %args.data_dir.display(),
        "starting regalium-node"
    );

    // --- Ledger ---
    let (token, db) = genesis::load(&args.data_dir)?;
    let operations = db.operation_count().context("failed to read operation count")?;
    tracing::info!(
        owner = %token.owner(),
        total_supply = %format_units(token.total_supply(), token.decimals()),
        operations,
        "ledger restored"
    );

    // --- Metrics ---
    let ledger_metrics =
        Arc::new(LedgerMetrics::new().context("failed to create prometheus registry")?);
    ledger_metrics.observe(&token);

    // --- Application state ---
    let db = Arc::new(db);
    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            regalium_protocol::config::PROTOCOL_VERSION,
        ),
        token: Arc::new(RwLock::new(token)),
        db: Arc::clone(&db),
        metrics: Arc::clone(&ledger_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&ledger_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    db.flush().context("failed to flush database")?;
    tracing::info!("regalium-node stopped");
    Ok(())
}

/// Writes the genesis config and deploys the ledger into the data directory.
fn init_node(args: cli::InitArgs) -> Result<()> {
    logging::init_logging(logging::DEFAULT_FILTER, LogFormat::Pretty);

    let config = match &args.config {
        Some(path) => genesis::read_config(path)?,
        None => Default::default(),
    };
    let data_dir = &args.data_dir;
    tracing::info!(data_dir = %data_dir.display(), owner = %args.owner, "initializing ledger");

    let (token, _db) = genesis::initialize(data_dir, Address::new(args.owner), &config, args.force)?;

    println!("Ledger initialized successfully.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Genesis        : {}", genesis::genesis_path(data_dir).display());
    println!("  Owner          : {}", token.owner());
    println!(
        "  Initial supply : {} {}",
        format_units(token.total_supply(), token.decimals()),
        token.symbol()
    );
    println!("  Presale ends   : {}", token.presale_end_time().to_rfc3339());
    println!("  Difficulty     : {}", token.mining_difficulty());

    Ok(())
}

/// Searches for a nonce with the production proof function and prints it.
fn mine_nonce(args: cli::MineArgs) -> Result<()> {
    logging::init_logging(logging::DEFAULT_FILTER, LogFormat::Pretty);

    let miner = Address::new(args.miner);
    tracing::info!(
        miner = %miner,
        difficulty = args.difficulty,
        start_nonce = args.start_nonce,
        max_attempts = args.max_attempts,
        "searching for nonce"
    );

    let started = std::time::Instant::now();
    match search_nonce(
        &Blake3Pow,
        &miner,
        args.difficulty,
        args.start_nonce,
        args.max_attempts,
    ) {
        Some(nonce) => {
            tracing::info!(nonce, elapsed_ms = started.elapsed().as_millis() as u64, "nonce found");
            println!("{}", nonce);
            Ok(())
        }
        None => bail!(
            "no valid nonce in {} attempts from {}",
            args.max_attempts,
            args.start_nonce
        ),
    }
}

/// Prints version information to stdout.
fn print_version() {
    println!("regalium-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol      {}", regalium_protocol::config::PROTOCOL_VERSION);
    println!("rustc         {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. If a handler cannot be
/// installed, that branch never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
