// Copyright (c) 2026 Flux Labs. MIT License.
// See LICENSE for details.

//! # FLUX Relay
//!
//! Entry point for the `flux-relay` binary. Parses CLI arguments,
//! initializes logging and metrics, opens the ledger, and serves the
//! relay HTTP API.
//!
//! The binary supports three subcommands:
//!
//! - `run`     — start the relay server
//! - `keygen`  — generate a development Ed25519 keypair
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use flux_protocol::crypto::FluxKeypair;
use flux_protocol::ledger::LedgerHandle;
use flux_protocol::relay::RelayService;

use cli::{Commands, FluxRelayCli};
use logging::LogFormat;
use metrics::RelayMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = FluxRelayCli::parse();

    match cli.command {
        Commands::Run(args) => run_relay(args).await,
        Commands::Keygen(args) => keygen(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the relay server: API endpoint plus metrics endpoint.
async fn run_relay(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "flux_relay=info,flux_protocol=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(
        port = args.port,
        metrics_port = args.metrics_port,
        data_dir = %args.data_dir.display(),
        "starting flux-relay"
    );

    // --- Persistent ledger ---
    let ledger_path = args.data_dir.join("ledger");
    std::fs::create_dir_all(&args.data_dir).with_context(|| {
        format!("failed to create data directory: {}", args.data_dir.display())
    })?;

    // Deferred open: the ledger comes up on the first operation that
    // needs it, and the server starts serving /health immediately.
    let handle = LedgerHandle::new(&ledger_path);
    let ledger = Arc::new(
        handle
            .store()
            .await
            .with_context(|| format!("failed to open ledger at {}", ledger_path.display()))?
            .clone(),
    );

    // --- Metrics ---
    let relay_metrics = Arc::new(RelayMetrics::new());
    relay_metrics.accounts.set(ledger.account_count() as i64);

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            flux_protocol::config::PROTOCOL_VERSION,
        ),
        started_at: chrono::Utc::now(),
        service: RelayService::new(Arc::clone(&ledger)),
        ledger,
        metrics: Arc::clone(&relay_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("relay API listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&relay_metrics));
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
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("flux-relay stopped");
    Ok(())
}

/// Generates a fresh Ed25519 keypair for development use.
///
/// The public key goes to stdout either way; the secret key goes to the
/// `--out` file when given, otherwise to stdout.
fn keygen(args: cli::KeygenArgs) -> Result<()> {
    let keypair = FluxKeypair::generate();
    let pubkey_hex = keypair.public_key_hex();
    let secret_hex = hex::encode(keypair.secret_key_bytes());

    match args.out {
        Some(path) => {
            std::fs::write(&path, &secret_hex)
                .with_context(|| format!("failed to write secret key to {}", path.display()))?;

            // Restrict permissions on Unix.
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
            }

            println!("Keypair generated.");
            println!("  Secret key : {}", path.display());
            println!("  Public key : {}", pubkey_hex);
        }
        None => {
            println!("Keypair generated. Keep the secret key private.");
            println!("  Secret key : {}", secret_hex);
            println!("  Public key : {}", pubkey_hex);
        }
    }

    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("flux-relay {}", env!("CARGO_PKG_VERSION"));
    println!("protocol   {}", flux_protocol::config::PROTOCOL_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
