use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::TransportResult;

/// Frames buffered between a connection's reader task and its consumer.
pub const FRAME_BUFFER: usize = 64;

/// Frames received after the first one on a connection that stays open.
///
/// Ends when the peer closes the connection. Dropping the stream closes the
/// connection.
#[derive(Debug)]
pub struct FrameStream {
    rx: mpsc::Receiver<TransportResult<Bytes>>,
}

impl FrameStream {
    pub fn new(rx: mpsc::Receiver<TransportResult<Bytes>>) -> Self {
        Self { rx }
    }

    /// A stream fed by the returned sender.
    pub fn channel(buffer: usize) -> (mpsc::Sender<TransportResult<Bytes>>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx))
    }

    pub async fn next(&mut self) -> Option<TransportResult<Bytes>> {
        self.rx.recv().await
    }
}

/// The reply to a send that waited for an answer.
#[derive(Debug)]
pub struct Reply {
    pub frame: Bytes,
    /// Present when the connection was kept open after the first frame.
    pub stream: Option<FrameStream>,
}

impl Reply {
    pub fn single(frame: Bytes) -> Self {
        Self { frame, stream: None }
    }

    pub fn resident(frame: Bytes, stream: FrameStream) -> Self {
        Self { frame, stream: Some(stream) }
    }
}
