//! # Ferry Core Library
//!
//! `ferry-core` moves a single file from one host to another over a direct
//! TCP connection and reports progress to an observer as bytes move.
//!
//! ## Features
//!
//! - **One transfer per session**: a listener accepts exactly one connection
//! - **Minimal wire format**: an 8-byte size header followed by raw payload
//! - **Observable**: progress fractions and status transitions are pushed to
//!   injected sinks without ever blocking the transfer loop
//!
//! ## Modules
//!
//! - [`config`] - Configuration management
//! - [`connection`] - Address parsing and local address detection
//! - [`error`] - Error taxonomy
//! - [`progress`] - Progress and status reporting boundary
//! - [`protocol`] - Size header wire format
//! - [`transfer`] - Listener, receiver, sender and the transfer service
//!
//! ## Example
//!
//! ```rust,ignore
//! use ferry_core::transfer::{TransferConfig, TransferService};
//! use ferry_core::progress::ChannelObserver;
//!
//! let (observer, mut events) = ChannelObserver::new();
//! let service = TransferService::new(TransferConfig::default(), observer.reporter());
//!
//! // Receiving side
//! let listening = service.start_listening("received.bin").await?;
//! println!("{}", listening.address);
//!
//! // Sending side (on another host)
//! service.send("192.168.1.20", 40123, "movie.mp4").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

pub mod config;
pub mod connection;
pub mod error;
pub mod progress;
pub mod protocol;
pub mod transfer;

pub use error::{Error, ErrorKind, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default chunk size for file transfers (1 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Default timeout for the single connect attempt, in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default destination file for received payloads
pub const DEFAULT_OUTPUT_FILE: &str = "video_received.mp4";

/// Default source file for sends when none is given
pub const DEFAULT_SOURCE_FILE: &str = "video_to_send_to_client.mp4";
