//! Send loop.

use std::io::SeekFrom;
use std::path::Path;
use std::time::Instant;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use super::{ProgressCounter, TransferConfig, TransferRole, TransferSummary};
use crate::connection::{configure_tcp_keepalive, parse_target};
use crate::error::{Error, Result};
use crate::progress::{Reporter, TransferStatus};
use crate::protocol::{self, TransferHeader};

/// Send `source` to the listener at `address:port`.
///
/// The connection is made before the source is opened, so a failed connect
/// never touches the file and never writes a header. Every outcome is
/// reported: `Complete` on success, `Failed` with a short message otherwise.
///
/// # Errors
///
/// - `Error::InvalidArgument` for an empty or non-literal address or port 0
/// - `Error::Connection` if the single connect attempt fails or times out
/// - `Error::FileOpen` if the source cannot be opened
/// - `Error::Io` if the source cannot be read
/// - `Error::Network` if a socket write fails
pub async fn send_file(
    address: &str,
    port: u16,
    source: impl AsRef<Path>,
    config: &TransferConfig,
    reporter: &Reporter,
) -> Result<TransferSummary> {
    let result = send_file_inner(address, port, source.as_ref(), config, reporter).await;

    if let Err(ref e) = result {
        tracing::warn!("Send failed: {}", e);
        reporter.status(&TransferStatus::Failed {
            message: e.status_text(),
        });
    }

    result
}

async fn send_file_inner(
    address: &str,
    port: u16,
    source: &Path,
    config: &TransferConfig,
    reporter: &Reporter,
) -> Result<TransferSummary> {
    let target = parse_target(address, port)?;

    let mut stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(target))
        .await
        .map_err(|_| Error::Connection {
            addr: target,
            reason: format!("timed out after {}s", config.connect_timeout.as_secs()),
        })?
        .map_err(|e| Error::Connection {
            addr: target,
            reason: e.to_string(),
        })?;

    tracing::info!("Connected to {}", target);
    configure_tcp_keepalive(&stream)?;
    reporter.status(&TransferStatus::Connected { peer: target });

    let mut file = File::open(source).await.map_err(|e| Error::open(source, e))?;
    let total_size = file
        .seek(SeekFrom::End(0))
        .await
        .map_err(|e| Error::open(source, e))?;
    file.seek(SeekFrom::Start(0))
        .await
        .map_err(|e| Error::open(source, e))?;

    protocol::write_header(&mut stream, TransferHeader::new(total_size), config.byte_order)
        .await?;
    tracing::debug!("Sent header: {} bytes", total_size);

    reporter.status(&TransferStatus::Transferring);

    let started_at = Instant::now();
    let counter = stream_payload(&mut file, &mut stream, source, total_size, config, reporter).await?;

    stream.shutdown().await.map_err(Error::Network)?;

    tracing::info!(
        "Sent {} bytes in {} chunks from {}",
        counter.moved(),
        counter.chunks(),
        source.display()
    );

    reporter.status(&TransferStatus::Complete {
        role: TransferRole::Send,
    });

    Ok(TransferSummary {
        role: TransferRole::Send,
        path: source.to_path_buf(),
        total_size,
        bytes_moved: counter.moved(),
        chunks: counter.chunks(),
        elapsed: started_at.elapsed(),
    })
}

/// Copy `file` to `writer` chunk by chunk, reporting after every chunk.
///
/// Yields to the scheduler after each chunk so a caller sharing its task
/// or thread with a UI loop stays responsive. `path` only labels errors.
///
/// # Errors
///
/// Returns `Error::Io` on a file read failure and `Error::Network` as soon
/// as a socket write fails; nothing after the failed chunk is written.
pub async fn stream_payload<F, W>(
    file: &mut F,
    writer: &mut W,
    path: &Path,
    total_size: u64,
    config: &TransferConfig,
    reporter: &Reporter,
) -> Result<ProgressCounter>
where
    F: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut counter = ProgressCounter::new(total_size);
    let mut buffer = vec![0u8; config.chunk_size.max(1)];

    loop {
        let n = read_chunk(file, &mut buffer)
            .await
            .map_err(|e| Error::io(path, e))?;
        if n == 0 {
            break;
        }

        writer
            .write_all(&buffer[..n])
            .await
            .map_err(Error::Network)?;

        let event = counter.record(n);
        reporter.progress(&event);

        tokio::task::yield_now().await;
    }

    writer.flush().await.map_err(Error::Network)?;
    Ok(counter)
}

/// Fill `buffer` as far as the file allows, so chunks stay full-sized
/// until the last one.
async fn read_chunk<F>(file: &mut F, buffer: &mut [u8]) -> std::io::Result<usize>
where
    F: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buffer.len() {
        let n = file.read(&mut buffer[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
