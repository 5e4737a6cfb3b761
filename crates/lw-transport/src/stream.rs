//! Length-prefixed exchange over any byte stream. Shared by the plain and
//! TLS drivers.

use std::io::ErrorKind;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use lw_protocol::{LwCodec, FRAME_HEADER_SIZE};

use crate::error::{TransportError, TransportResult};
use crate::reply::{FrameStream, Reply, FRAME_BUFFER};
use crate::transport::SendFlags;

pub(crate) async fn exchange<S>(mut stream: S, payload: &[u8], flags: SendFlags) -> TransportResult<Option<Reply>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let framed = LwCodec::frame(payload)?;
    stream.write_all(&framed).await?;
    stream.flush().await?;

    if flags.close_when_sent {
        stream.shutdown().await?;
        return Ok(None);
    }

    let first = read_frame(&mut stream).await?.ok_or(TransportError::Closed)?;

    if flags.close_when_received {
        if let Err(e) = stream.shutdown().await {
            debug!(error = %e, "shutdown after reply failed");
        }
        return Ok(Some(Reply::single(first)));
    }

    let (tx, frames) = FrameStream::channel(FRAME_BUFFER);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                frame = read_frame(&mut stream) => match frame {
                    Ok(Some(frame)) => {
                        if tx.send(Ok(frame)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        break;
                    }
                },
            }
        }
        debug!("resident connection closed");
    });
    Ok(Some(Reply::resident(first, frames)))
}

/// Read one frame. `None` when the peer closed cleanly between frames.
async fn read_frame<S>(stream: &mut S) -> TransportResult<Option<Bytes>>
where
    S: AsyncRead + Unpin,
{
    let mut header = [0u8; FRAME_HEADER_SIZE];
    match stream.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = LwCodec::frame_len(header)?;
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await?;
    Ok(Some(Bytes::from(body)))
}
