//! Callback-driven entry point for a presentation layer.
//!
//! A [`TransferService`] exposes the two outbound actions a UI needs,
//! `start_listening` and `send`, and pushes everything else through the
//! injected [`Reporter`]. It runs at most one transfer at a time.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

use super::{send_file, ListenAddress, Listener, TransferConfig, TransferSummary};
use crate::error::{Error, Result};
use crate::progress::{Reporter, TransferStatus};

/// A receive that is waiting for its peer in the background.
#[derive(Debug)]
pub struct Listening {
    /// Where the sender should connect
    pub address: ListenAddress,
    /// Background receive task; dropping it leaves the task running
    pub handle: JoinHandle<Result<TransferSummary>>,
}

/// Marks the service busy until dropped.
#[derive(Debug)]
struct ActiveGuard {
    flag: Arc<AtomicBool>,
}

impl ActiveGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::Busy)?;
        Ok(Self { flag: flag.clone() })
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Owner of the single in-flight transfer.
#[derive(Debug, Clone)]
pub struct TransferService {
    config: TransferConfig,
    reporter: Reporter,
    active: Arc<AtomicBool>,
}

impl TransferService {
    /// Create a service reporting through `reporter`.
    #[must_use]
    pub fn new(config: TransferConfig, reporter: Reporter) -> Self {
        Self {
            config,
            reporter,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns whether a transfer is currently in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Bind a listener and receive one file into `destination` in the background.
    ///
    /// Returns once the socket is bound, with the address to hand to the
    /// sender. Accepting and receiving happen on a spawned task whose
    /// progress is only visible through the reporter.
    ///
    /// # Errors
    ///
    /// Returns `Error::Busy` if a transfer is already in flight (nothing is
    /// reported in that case, so the running session's observer sees no
    /// interference), or the bind error.
    pub async fn start_listening(&self, destination: impl Into<PathBuf>) -> Result<Listening> {
        let guard = ActiveGuard::acquire(&self.active)?;
        let destination = destination.into();

        self.reporter.status(&TransferStatus::Idle);

        let listener = match Listener::bind(self.config.clone()).await {
            Ok(listener) => listener,
            Err(e) => {
                self.reporter.status(&TransferStatus::Failed {
                    message: e.status_text(),
                });
                return Err(e);
            }
        };

        let address = listener.listen_address().clone();
        self.reporter.status(&address.waiting_status());

        let reporter = self.reporter.clone();
        let handle = tokio::spawn(async move {
            let _guard = guard;

            let incoming = match listener.accept_once().await {
                Ok(incoming) => incoming,
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    reporter.status(&TransferStatus::Failed {
                        message: e.status_text(),
                    });
                    return Err(e);
                }
            };

            incoming.receive(&destination, &reporter).await
        });

        Ok(Listening { address, handle })
    }

    /// Send `source` to the listener at `address:port` on the calling task.
    ///
    /// # Errors
    ///
    /// Returns `Error::Busy` if a transfer is already in flight, otherwise
    /// see [`send_file`].
    pub async fn send(
        &self,
        address: &str,
        port: u16,
        source: impl AsRef<Path>,
    ) -> Result<TransferSummary> {
        let _guard = ActiveGuard::acquire(&self.active)?;
        self.reporter.status(&TransferStatus::Idle);
        send_file(address, port, source, &self.config, &self.reporter).await
    }
}
