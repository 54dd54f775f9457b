//! UI utilities for Ferry CLI.

use std::io::{self, Write};

use ferry_core::progress::{EventReceiver, ProgressEvent, TransferEvent, TransferStatus};

const BAR_WIDTH: usize = 30;

/// Format a byte count with a binary unit suffix.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Render a fixed-width progress bar like `[=======>      ]`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn render_bar(fraction: f64) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = (fraction * BAR_WIDTH as f64).round() as usize;

    let mut bar = String::with_capacity(BAR_WIDTH + 2);
    bar.push('[');
    for i in 0..BAR_WIDTH {
        bar.push(match i.cmp(&filled) {
            std::cmp::Ordering::Less => '=',
            std::cmp::Ordering::Equal => '>',
            std::cmp::Ordering::Greater => ' ',
        });
    }
    bar.push(']');
    bar
}

/// Indent every line of a status text for display.
pub fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_progress(event: &ProgressEvent) {
    print!("\r  {} {}    ", render_bar(event.fraction), event.label);
    let _ = io::stdout().flush();
}

/// Print events until a terminal status arrives or the channel closes.
///
/// Returns the terminal status, if one was seen.
pub async fn display_events(
    mut rx: EventReceiver,
    quiet: bool,
) -> Option<TransferStatus> {
    let mut mid_line = false;

    while let Some(event) = rx.recv().await {
        match event {
            TransferEvent::Progress(progress) => {
                if !quiet {
                    print_progress(&progress);
                    mid_line = true;
                }
            }
            TransferEvent::Status(status) => {
                if mid_line {
                    println!();
                    mid_line = false;
                }
                let terminal = status.is_terminal();
                if !quiet || terminal {
                    match status {
                        TransferStatus::Failed { .. } => eprintln!("{}", indent(&status.to_string())),
                        _ => println!("{}", indent(&status.to_string())),
                    }
                }
                if terminal {
                    return Some(status);
                }
            }
        }
    }

    if mid_line {
        println!();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_core::progress::ChannelObserver;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(2500), "2.4 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_render_bar() {
        assert_eq!(render_bar(0.0), format!("[>{}]", " ".repeat(BAR_WIDTH - 1)));
        assert_eq!(render_bar(1.0), format!("[{}]", "=".repeat(BAR_WIDTH)));
        assert_eq!(render_bar(2.0), render_bar(1.0));

        let half = render_bar(0.5);
        assert_eq!(half.len(), BAR_WIDTH + 2);
        assert_eq!(half.matches('=').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn test_indent() {
        assert_eq!(
            indent("IP: 10.0.0.2\nWaiting on Port: 4000"),
            "  IP: 10.0.0.2\n  Waiting on Port: 4000"
        );
    }

    #[tokio::test]
    async fn test_display_events_returns_terminal_status() {
        let (observer, rx) = ChannelObserver::new();
        let reporter = observer.reporter();
        reporter.progress(&ProgressEvent::new(0.5));
        reporter.status(&TransferStatus::Failed {
            message: "Connection failed".to_string(),
        });
        reporter.status(&TransferStatus::Transferring);
        drop(reporter);
        drop(observer);

        let status = display_events(rx, true).await;
        assert_eq!(
            status,
            Some(TransferStatus::Failed {
                message: "Connection failed".to_string()
            })
        );
    }
}
