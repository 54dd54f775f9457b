//! CLI command definitions and handlers.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Load configuration with graceful fallback to defaults.
///
/// If the config file doesn't exist or can't be parsed, it falls back to
/// defaults and logs why.
pub fn load_config() -> ferry_core::config::Config {
    ferry_core::config::Config::load().unwrap_or_else(|e| {
        tracing::warn!("Using default configuration: {}", e);
        ferry_core::config::Config::default()
    })
}

pub mod config;
pub mod receive;
pub mod send;

/// Ferry - direct single-file transfer over TCP
#[derive(Parser)]
#[command(name = "ferry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Detailed logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand)]
pub enum Command {
    /// Listen for one incoming file
    Receive(ReceiveArgs),

    /// Send a file to a listening receiver
    Send(SendArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the receive command
#[derive(Parser)]
pub struct ReceiveArgs {
    /// File to write the received payload to (truncated if it exists)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Fail if the received length differs from the announced size
    #[arg(long)]
    pub verify_length: bool,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the send command
#[derive(Parser)]
pub struct SendArgs {
    /// Receiver IP address
    pub address: String,

    /// Receiver port
    pub port: u16,

    /// File to send (defaults to the configured source file)
    pub file: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the config command
#[derive(Parser)]
pub struct ConfigArgs {
    /// Config action
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
