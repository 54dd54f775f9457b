//! Ferry CLI - direct single-file transfer over TCP
//!
//! One side listens and prints its address; the other side sends a file
//! to that address.
//!
//! ## Quick Start
//!
//! ```bash
//! # On the receiving machine
//! ferry receive -o movie.mp4
//!
//! # On the sending machine
//! ferry send 192.168.1.20 40123 ./movie.mp4
//! ```

#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::Parser;

mod commands;
pub mod ui;

use commands::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Command::Receive(args) => commands::receive::run(args).await,
        Command::Send(args) => commands::send::run(args).await,
        Command::Config(args) => commands::config::run(&args),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_filter = if verbose {
        "info,ferry=debug,ferry_core=debug"
    } else {
        "warn,ferry=info,ferry_core=info"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
