//! Receive command implementation.

use anyhow::{Context, Result};

use ferry_core::progress::ChannelObserver;
use ferry_core::transfer::TransferService;

use super::ReceiveArgs;
use crate::ui::{display_events, format_size};

/// Run the receive command.
pub async fn run(args: ReceiveArgs) -> Result<()> {
    let global_config = super::load_config();

    let mut config = global_config.transfer_config();
    config.verify_length |= args.verify_length;

    let output = args
        .output
        .unwrap_or_else(|| global_config.transfer.default_output.clone());

    if !args.quiet && !args.json {
        println!();
        println!("Ferry v{}", ferry_core::VERSION);
        println!("{}", "-".repeat(37));
        println!();
        println!("  Waiting for connection...");
        println!();
    }

    let (observer, events) = ChannelObserver::new();
    let service = TransferService::new(config, observer.reporter());
    drop(observer);

    let listening = service.start_listening(&output).await?;

    if args.json {
        let out = serde_json::json!({
            "status": "waiting",
            "address": &listening.address.address,
            "port": listening.address.port,
            "output": output.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    }

    let display = tokio::spawn(display_events(events, args.quiet || args.json));

    let result = listening
        .handle
        .await
        .context("receive task panicked")?;

    drop(service);
    let _ = display.await;

    match result {
        Ok(summary) => {
            if args.json {
                let out = serde_json::json!({
                    "status": "complete",
                    "output": summary.path.display().to_string(),
                    "declared_size": summary.total_size,
                    "bytes_received": summary.bytes_moved,
                    "chunks": summary.chunks,
                    "elapsed_ms": u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else if !args.quiet {
                println!();
                println!(
                    "  Received {} to {}",
                    format_size(summary.bytes_moved),
                    summary.path.display()
                );
                if !summary.is_complete() {
                    println!(
                        "  Note: sender announced {}, connection closed after {}",
                        format_size(summary.total_size),
                        format_size(summary.bytes_moved)
                    );
                }
                println!();
            }
            Ok(())
        }
        Err(e) => {
            if args.json {
                let out = serde_json::json!({
                    "status": "failed",
                    "error": e.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            Err(e.into())
        }
    }
}
