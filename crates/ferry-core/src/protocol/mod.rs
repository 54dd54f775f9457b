//! Ferry wire protocol.
//!
//! A transfer is a single size header followed by the raw payload. There is
//! no acknowledgment, checksum, or trailer; the sender closing its half of
//! the connection marks the end of the payload.
//!
//! ## Stream Format
//!
//! ```text
//! ┌────────────────────────┬─────────────────────────────────────┐
//! │      Total size        │              Payload                │
//! │   8 bytes (u64)        │   total size bytes, ≤1024 per write  │
//! └────────────────────────┴─────────────────────────────────────┘
//! ```
//!
//! The size is encoded with the configured [`ByteOrder`]. The default,
//! [`ByteOrder::Native`], matches peers that write the integer straight
//! from memory.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Header size in bytes
pub const HEADER_SIZE: usize = 8;

/// Byte order used for the size header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Host byte order
    #[default]
    Native,
    /// Little-endian
    Little,
    /// Big-endian (network order)
    Big,
}

/// The fixed preamble declaring how many payload bytes follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferHeader {
    /// Exact byte length of the payload
    pub total_size: u64,
}

impl TransferHeader {
    /// Create a header for a payload of `total_size` bytes.
    #[must_use]
    pub const fn new(total_size: u64) -> Self {
        Self { total_size }
    }

    /// Encode the header to bytes.
    #[must_use]
    pub fn encode(&self, order: ByteOrder) -> [u8; HEADER_SIZE] {
        match order {
            ByteOrder::Native => self.total_size.to_ne_bytes(),
            ByteOrder::Little => self.total_size.to_le_bytes(),
            ByteOrder::Big => self.total_size.to_be_bytes(),
        }
    }

    /// Decode a header from bytes.
    #[must_use]
    pub fn decode(buf: [u8; HEADER_SIZE], order: ByteOrder) -> Self {
        let total_size = match order {
            ByteOrder::Native => u64::from_ne_bytes(buf),
            ByteOrder::Little => u64::from_le_bytes(buf),
            ByteOrder::Big => u64::from_be_bytes(buf),
        };
        Self { total_size }
    }
}

/// Read the size header from a stream.
///
/// # Errors
///
/// Returns `Error::ProtocolError("incomplete header")` if the peer closes
/// before all 8 bytes arrive, or `Error::Network` on any other read failure.
pub async fn read_header<R>(reader: &mut R, order: ByteOrder) -> Result<TransferHeader>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; HEADER_SIZE];
    reader.read_exact(&mut buf).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::ProtocolError("incomplete header".to_string())
        } else {
            Error::Network(e)
        }
    })?;

    Ok(TransferHeader::decode(buf, order))
}

/// Write the size header as a single framed write.
///
/// # Errors
///
/// Returns `Error::Network` if the write is short or fails.
pub async fn write_header<W>(writer: &mut W, header: TransferHeader, order: ByteOrder) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(&header.encode(order))
        .await
        .map_err(Error::Network)?;
    writer.flush().await.map_err(Error::Network)?;
    Ok(())
}
