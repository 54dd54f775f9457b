//! Receive loop.

use std::path::Path;
use std::time::Instant;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use super::{ProgressCounter, TransferConfig, TransferRole, TransferSummary};
use crate::error::{Error, Result};
use crate::progress::{Reporter, TransferStatus};
use crate::protocol;

/// Read a header and payload from `reader` into `destination`.
///
/// The loop ends when the peer closes the stream. Reaching the declared
/// size does not end it, and a stream that closes early still counts as a
/// completed transfer unless [`TransferConfig::verify_length`] is set.
///
/// Emits one progress event per chunk and a `Complete` status on success.
/// Failure statuses are left to the caller.
///
/// # Errors
///
/// - `Error::ProtocolError` if the header is incomplete
/// - `Error::FileOpen` if the destination cannot be created
/// - `Error::Io` if the destination cannot be written
/// - `Error::Network` if a socket read fails
/// - `Error::LengthMismatch` if verification is enabled and the count is off
pub async fn receive_stream<R>(
    reader: &mut R,
    destination: &Path,
    config: &TransferConfig,
    reporter: &Reporter,
) -> Result<TransferSummary>
where
    R: AsyncRead + Unpin,
{
    let header = protocol::read_header(reader, config.byte_order).await?;
    tracing::debug!("Header declares {} bytes", header.total_size);

    let mut file = File::create(destination)
        .await
        .map_err(|e| Error::open(destination, e))?;

    reporter.status(&TransferStatus::Transferring);

    let started_at = Instant::now();
    let mut counter = ProgressCounter::new(header.total_size);
    let mut buffer = vec![0u8; config.chunk_size.max(1)];

    loop {
        let n = reader.read(&mut buffer).await.map_err(Error::Network)?;
        if n == 0 {
            break;
        }

        file.write_all(&buffer[..n])
            .await
            .map_err(|e| Error::io(destination, e))?;

        let event = counter.record(n);
        reporter.progress(&event);
    }

    file.flush().await.map_err(|e| Error::io(destination, e))?;
    drop(file);

    if counter.moved() != counter.total() {
        if config.verify_length {
            return Err(Error::LengthMismatch {
                expected: counter.total(),
                received: counter.moved(),
            });
        }
        tracing::warn!(
            "Peer closed after {} of {} declared bytes",
            counter.moved(),
            counter.total()
        );
    }

    tracing::info!(
        "Received {} bytes in {} chunks to {}",
        counter.moved(),
        counter.chunks(),
        destination.display()
    );

    reporter.status(&TransferStatus::Complete {
        role: TransferRole::Receive,
    });

    Ok(TransferSummary {
        role: TransferRole::Receive,
        path: destination.to_path_buf(),
        total_size: counter.total(),
        bytes_moved: counter.moved(),
        chunks: counter.chunks(),
        elapsed: started_at.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{ChannelObserver, EventReceiver, TransferEvent};
    use crate::protocol::{ByteOrder, TransferHeader};
    use tempfile::TempDir;

    fn stream_bytes(total: u64, payload: &[u8], order: ByteOrder) -> Vec<u8> {
        let mut bytes = TransferHeader::new(total).encode(order).to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    fn drain(rx: &mut EventReceiver) -> Vec<TransferEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_receive_writes_payload() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let dest = temp_dir.path().join("out.bin");
        let payload: Vec<u8> = (0..3000u32).map(|i| (i % 251) as u8).collect();

        let config = TransferConfig::default();
        let mut reader =
            std::io::Cursor::new(stream_bytes(3000, &payload, config.byte_order));

        let summary = receive_stream(&mut reader, &dest, &config, &Reporter::silent())
            .await
            .expect("receive");

        assert!(summary.is_complete());
        assert_eq!(summary.chunks, 3);
        assert_eq!(std::fs::read(&dest).unwrap(), payload);
    }

    #[tokio::test]
    async fn test_receive_truncates_existing_file() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let dest = temp_dir.path().join("out.bin");
        std::fs::write(&dest, vec![0xAA; 5000]).unwrap();

        let config = TransferConfig::default();
        let mut reader = std::io::Cursor::new(stream_bytes(3, b"xyz", config.byte_order));

        receive_stream(&mut reader, &dest, &config, &Reporter::silent())
            .await
            .expect("receive");

        assert_eq!(std::fs::read(&dest).unwrap(), b"xyz");
    }

    #[tokio::test]
    async fn test_short_stream_still_completes() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let dest = temp_dir.path().join("out.bin");
        let (observer, mut rx) = ChannelObserver::new();

        let config = TransferConfig::default();
        let mut reader =
            std::io::Cursor::new(stream_bytes(4096, &[7u8; 1000], config.byte_order));

        let summary = receive_stream(&mut reader, &dest, &config, &observer.reporter())
            .await
            .expect("receive");

        assert!(!summary.is_complete());
        assert_eq!(summary.bytes_moved, 1000);

        let events = drain(&mut rx);
        let last_fraction = events
            .iter()
            .filter_map(|e| match e {
                TransferEvent::Progress(p) => Some(p.fraction),
                TransferEvent::Status(_) => None,
            })
            .last()
            .expect("at least one progress event");
        assert!(last_fraction < 1.0);
        assert_eq!(
            events.last(),
            Some(&TransferEvent::Status(TransferStatus::Complete {
                role: TransferRole::Receive
            }))
        );
    }

    #[tokio::test]
    async fn test_short_stream_fails_with_verification() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let dest = temp_dir.path().join("out.bin");

        let config = TransferConfig {
            verify_length: true,
            ..Default::default()
        };
        let mut reader = std::io::Cursor::new(stream_bytes(10, b"abcd", config.byte_order));

        let result = receive_stream(&mut reader, &dest, &config, &Reporter::silent()).await;
        match result {
            Err(Error::LengthMismatch { expected, received }) => {
                assert_eq!(expected, 10);
                assert_eq!(received, 4);
            }
            other => panic!("Expected LengthMismatch, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_size_emits_no_progress() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let dest = temp_dir.path().join("empty.bin");
        let (observer, mut rx) = ChannelObserver::new();

        let config = TransferConfig::default();
        let mut reader = std::io::Cursor::new(stream_bytes(0, &[], config.byte_order));

        let summary = receive_stream(&mut reader, &dest, &config, &observer.reporter())
            .await
            .expect("receive");

        assert_eq!(summary.chunks, 0);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 0);

        let events = drain(&mut rx);
        assert!(events
            .iter()
            .all(|e| matches!(e, TransferEvent::Status(_))));
        assert!(matches!(
            events.last(),
            Some(TransferEvent::Status(TransferStatus::Complete { .. }))
        ));
    }

    #[tokio::test]
    async fn test_incomplete_header_creates_nothing() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let dest = temp_dir.path().join("never.bin");

        let mut reader = std::io::Cursor::new(vec![0u8; 5]);
        let result =
            receive_stream(&mut reader, &dest, &TransferConfig::default(), &Reporter::silent())
                .await;

        assert!(matches!(result, Err(Error::ProtocolError(_))));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_unwritable_destination() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let dest = temp_dir.path().join("missing-dir").join("out.bin");

        let config = TransferConfig::default();
        let mut reader = std::io::Cursor::new(stream_bytes(1, b"z", config.byte_order));
        let result = receive_stream(&mut reader, &dest, &config, &Reporter::silent()).await;

        assert!(matches!(result, Err(Error::FileOpen { .. })));
    }

    #[tokio::test]
    async fn test_read_error_is_network_error() {
        struct FailingReader {
            header: Option<[u8; 8]>,
        }

        impl tokio::io::AsyncRead for FailingReader {
            fn poll_read(
                mut self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
                buf: &mut tokio::io::ReadBuf<'_>,
            ) -> std::task::Poll<std::io::Result<()>> {
                if let Some(header) = self.header.take() {
                    buf.put_slice(&header);
                    std::task::Poll::Ready(Ok(()))
                } else {
                    std::task::Poll::Ready(Err(std::io::Error::from(
                        std::io::ErrorKind::ConnectionReset,
                    )))
                }
            }
        }

        let temp_dir = TempDir::new().expect("create temp dir");
        let dest = temp_dir.path().join("out.bin");
        let config = TransferConfig::default();
        let mut reader = FailingReader {
            header: Some(TransferHeader::new(100).encode(config.byte_order)),
        };

        let result = receive_stream(&mut reader, &dest, &config, &Reporter::silent()).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
