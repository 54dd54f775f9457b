//! Send command implementation.

use anyhow::Result;

use ferry_core::progress::ChannelObserver;
use ferry_core::transfer::TransferService;

use super::SendArgs;
use crate::ui::{display_events, format_size};

/// Run the send command.
pub async fn run(args: SendArgs) -> Result<()> {
    let global_config = super::load_config();

    let source = args
        .file
        .unwrap_or_else(|| global_config.transfer.default_source.clone());

    if !args.quiet && !args.json {
        println!();
        println!("Ferry v{}", ferry_core::VERSION);
        println!("{}", "-".repeat(37));
        println!();
        println!(
            "  Sending {} to {}:{}",
            source.display(),
            args.address,
            args.port
        );
        println!();
    }

    let (observer, events) = ChannelObserver::new();
    let service = TransferService::new(global_config.transfer_config(), observer.reporter());
    drop(observer);

    let display = tokio::spawn(display_events(events, args.quiet || args.json));

    let result = service.send(&args.address, args.port, &source).await;

    drop(service);
    let _ = display.await;

    match result {
        Ok(summary) => {
            if args.json {
                let out = serde_json::json!({
                    "status": "complete",
                    "source": summary.path.display().to_string(),
                    "total_sent": summary.bytes_moved,
                    "chunks": summary.chunks,
                    "elapsed_ms": u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else if !args.quiet {
                println!();
                println!("  Sent {}", format_size(summary.bytes_moved));
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
