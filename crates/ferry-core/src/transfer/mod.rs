//! File transfer engine for Ferry.
//!
//! This module moves exactly one file across one TCP connection:
//!
//! - [`Listener`] binds an ephemeral port and accepts a single peer
//! - [`IncomingTransfer::receive`] reads the header and payload into a file
//! - [`send_file`] connects, writes the header and streams the file
//! - [`TransferService`] is the callback-driven entry point for a UI
//!
//! ## Transfer Protocol
//!
//! - Chunk size: 1 KiB by default
//! - No acknowledgments; TCP ordering and reliability are relied upon
//! - End of payload is signalled by the sender closing the connection

pub mod listener;
pub mod receiver;
pub mod sender;
pub mod service;

pub use listener::{IncomingTransfer, ListenAddress, Listener};
pub use receiver::receive_stream;
pub use sender::{send_file, stream_payload};
pub use service::{Listening, TransferService};

use std::path::PathBuf;
use std::time::Duration;

use crate::progress::ProgressEvent;
use crate::protocol::ByteOrder;

/// Which side of the connection a session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferRole {
    /// Sending a file
    Send,
    /// Receiving a file
    Receive,
}

/// Configuration for a transfer session.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Maximum bytes per read/write
    pub chunk_size: usize,
    /// Encoding of the size header
    pub byte_order: ByteOrder,
    /// Fail the receive when the byte count differs from the header
    pub verify_length: bool,
    /// Bound on the single connect attempt
    pub connect_timeout: Duration,
    /// Local address the listener binds to
    pub bind_address: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: crate::DEFAULT_CHUNK_SIZE,
            byte_order: ByteOrder::Native,
            verify_length: false,
            connect_timeout: Duration::from_secs(crate::DEFAULT_CONNECT_TIMEOUT_SECS),
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

/// Outcome of a finished transfer.
#[derive(Debug, Clone)]
pub struct TransferSummary {
    /// Side that produced this summary
    pub role: TransferRole,
    /// Source or destination file
    pub path: PathBuf,
    /// Size declared in the header
    pub total_size: u64,
    /// Payload bytes actually moved
    pub bytes_moved: u64,
    /// Number of chunks moved
    pub chunks: u64,
    /// Wall time from header to close
    pub elapsed: Duration,
}

impl TransferSummary {
    /// Returns whether the moved byte count equals the declared size.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.bytes_moved == self.total_size
    }
}

/// Running byte accounting for one session.
///
/// Fractions derived from it never decrease: the declared total is fixed
/// and the moved count only grows.
#[derive(Debug, Clone)]
pub struct ProgressCounter {
    total: u64,
    moved: u64,
    chunks: u64,
}

impl ProgressCounter {
    /// Create a counter for a payload of `total` bytes.
    #[must_use]
    pub const fn new(total: u64) -> Self {
        Self {
            total,
            moved: 0,
            chunks: 0,
        }
    }

    /// Account for one chunk and return the event to report for it.
    pub fn record(&mut self, len: usize) -> ProgressEvent {
        self.moved += len as u64;
        self.chunks += 1;
        ProgressEvent::new(self.fraction())
    }

    /// Fraction moved, `0.0` for an empty payload, capped at `1.0`.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.moved as f64 / self.total as f64).min(1.0)
        }
    }

    /// Declared total.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Bytes moved so far.
    #[must_use]
    pub const fn moved(&self) -> u64 {
        self.moved
    }

    /// Chunks moved so far.
    #[must_use]
    pub const fn chunks(&self) -> u64 {
        self.chunks
    }
}
