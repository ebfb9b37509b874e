//! # CLI Interface
//!
//! Defines the command-line argument structure for `flux-relay` using
//! `clap` derive. Supports three subcommands: `run`, `keygen`, and
//! `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use flux_protocol::config::{DEFAULT_METRICS_PORT, DEFAULT_RELAY_PORT};

/// FLUX intent relay.
///
/// Accepts signed payment intents over HTTP, verifies their Ed25519
/// signatures, and credits a local persistent ledger. Exposes account
/// queries and Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "flux-relay",
    about = "FLUX signed-intent relay",
    version,
    propagate_version = true
)]
pub struct FluxRelayCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the relay binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the relay server.
    Run(RunArgs),
    /// Generate a fresh Ed25519 keypair and print it. For development
    /// and test wallets only.
    Keygen(KeygenArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the data directory where the ledger is stored.
    ///
    /// Created on first run if it does not exist.
    #[arg(long, short = 'd', env = "FLUX_DATA_DIR", default_value = "~/.flux")]
    pub data_dir: PathBuf,

    /// Port for the relay HTTP API.
    #[arg(long, env = "FLUX_PORT", default_value_t = DEFAULT_RELAY_PORT)]
    pub port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "FLUX_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "FLUX_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `keygen` subcommand.
#[derive(Parser, Debug)]
pub struct KeygenArgs {
    /// Write the secret key to this file instead of printing it.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}
