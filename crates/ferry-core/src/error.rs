//! Error types for Ferry.
//!
//! Every error is terminal to the transfer attempt that raised it. The
//! boundary decides how to present it; [`Error::kind`] maps each variant
//! onto the coarse taxonomy callers match on.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized `Result` type for Ferry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Ferry.
#[derive(Error, Debug)]
pub enum Error {
    /// Listening socket could not be created or bound
    #[error("bind failed on {addr}: {source}")]
    Bind {
        /// Address we tried to bind
        addr: String,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// Accepting the inbound connection failed
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// Outbound connection was refused, timed out, or the host is unreachable
    #[error("connection to {addr} failed: {reason}")]
    Connection {
        /// Target address
        addr: SocketAddr,
        /// Human-readable reason
        reason: String,
    },

    /// Caller supplied an unusable argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// File could not be opened, created, or sized
    #[error("cannot open '{}': {source}", .path.display())]
    FileOpen {
        /// File involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// File read or write failed
    #[error("file error on '{}': {source}", .path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Socket read or write failed mid-transfer
    #[error("network error: {0}")]
    Network(#[source] io::Error),

    /// Malformed or incomplete header
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// Byte count did not match the header (only when length verification is enabled)
    #[error("length mismatch: header declared {expected} bytes, received {received}")]
    LengthMismatch {
        /// Bytes declared in the header
        expected: u64,
        /// Bytes actually received
        received: u64,
    },

    /// A transfer is already in flight on this service
    #[error("a transfer is already in progress")]
    Busy,

    /// Configuration file error
    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Listener could not bind
    Bind,
    /// Listener could not accept
    Accept,
    /// Sender could not connect
    Connection,
    /// Bad caller input
    InvalidArgument,
    /// File system failure
    Io,
    /// Socket failure mid-transfer
    Network,
    /// Header or length violation
    Protocol,
    /// Busy service or bad configuration
    Other,
}

impl Error {
    /// Wrap an I/O error with the file path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a failure to open `path`.
    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileOpen {
            path: path.into(),
            source,
        }
    }

    /// Returns the taxonomy bucket for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Bind { .. } => ErrorKind::Bind,
            Self::Accept(_) => ErrorKind::Accept,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::FileOpen { .. } | Self::Io { .. } => ErrorKind::Io,
            Self::Network(_) => ErrorKind::Network,
            Self::ProtocolError(_) | Self::LengthMismatch { .. } => ErrorKind::Protocol,
            Self::Busy | Self::ConfigError(_) => ErrorKind::Other,
        }
    }

    /// Short status line suitable for a one-line status label.
    #[must_use]
    pub fn status_text(&self) -> String {
        match self {
            Self::InvalidArgument(_) => "Invalid IP or port".to_string(),
            Self::Connection { .. } => "Connection failed".to_string(),
            Self::FileOpen { .. } => "Failed to open file".to_string(),
            Self::Network(_) => "Error during file transfer".to_string(),
            _ => self.to_string(),
        }
    }
}
