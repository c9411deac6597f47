//! One direction of the bidirectional byte relay.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Relay buffer size per direction.
pub const RELAY_BUFFER_SIZE: usize = 64 * 1024;

/// Copy bytes from `reader` to `writer` until the source reaches
/// end-of-stream, then half-close the destination.
///
/// A chunk is fully written before the next read, so backpressure from the
/// destination propagates to the source. Bytes are counted into
/// `transferred` as they are written, so the count is accurate even when
/// the relay ends with an error.
pub async fn pump<R, W>(
    mut reader: R,
    mut writer: W,
    transferred: &AtomicU64,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; RELAY_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).await?;
        transferred.fetch_add(n as u64, Ordering::Relaxed);
    }
    // Source EOF: half-close our destination. The opposite direction keeps
    // draining independently.
    writer.shutdown().await?;
    Ok(())
}
