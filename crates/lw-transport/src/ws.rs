use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, WebSocketStream};
use tracing::debug;

use lw_types::Node;

use crate::error::{TransportError, TransportResult};
use crate::reply::{FrameStream, Reply, FRAME_BUFFER};
use crate::transport::{SendFlags, Transport};

/// WebSocket driver. Node addresses are `ws://` URLs.
///
/// The payload goes out as one binary message once the handshake has
/// completed; each binary or text message received is one reply frame.
#[derive(Clone, Debug, Default)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WsTransport {
    fn name(&self) -> &'static str {
        "ws"
    }

    async fn send(&self, node: &Node, payload: Bytes, flags: SendFlags) -> TransportResult<Option<Reply>> {
        let (mut socket, _) = connect_async(node.address()).await?;
        debug!(node = %node, ?flags, "websocket open");

        socket.send(Message::binary(payload.to_vec())).await?;

        if flags.close_when_sent {
            close(&mut socket).await;
            return Ok(None);
        }

        let first = next_frame(&mut socket).await?.ok_or(TransportError::Closed)?;

        if flags.close_when_received {
            close(&mut socket).await;
            return Ok(Some(Reply::single(first)));
        }

        let (tx, frames) = FrameStream::channel(FRAME_BUFFER);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => {
                        close(&mut socket).await;
                        break;
                    }
                    frame = next_frame(&mut socket) => match frame {
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
            debug!("resident websocket closed");
        });
        Ok(Some(Reply::resident(first, frames)))
    }
}

/// Next data message. Control frames are skipped; `None` once the peer
/// closes.
async fn next_frame<S>(socket: &mut WebSocketStream<S>) -> TransportResult<Option<Bytes>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(message) = socket.next().await {
        match message? {
            message @ (Message::Binary(_) | Message::Text(_)) => {
                return Ok(Some(Bytes::from(message.into_data())));
            }
            Message::Close(_) => return Ok(None),
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
        }
    }
    Ok(None)
}

async fn close<S>(socket: &mut WebSocketStream<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Err(e) = socket.close(None).await {
        debug!(error = %e, "websocket close failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    async fn serve<F>(replies: Vec<&'static str>, check: F) -> Node
    where
        F: FnOnce(Vec<u8>) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let request = ws.next().await.unwrap().unwrap();
            check(request.into_data().to_vec());
            for reply in replies {
                ws.send(Message::text(reply)).await.unwrap();
            }
            let _ = ws.close(None).await;
        });
        Node::new(format!("ws://{addr}")).unwrap()
    }

    #[tokio::test]
    async fn request_response() {
        let node = serve(vec![r#"{"dataName":"block","data":{"index":1}}"#], |req| {
            assert_eq!(req, br#"{"command":"getBlock","data":1}"#);
        })
        .await;
        let reply = WsTransport::new()
            .send(&node, Bytes::from_static(br#"{"command":"getBlock","data":1}"#), SendFlags::request())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.frame, Bytes::from_static(br#"{"dataName":"block","data":{"index":1}}"#));
        assert!(reply.stream.is_none());
    }

    #[tokio::test]
    async fn one_way_returns_none() {
        let node = serve(vec![], |_| {}).await;
        let reply = WsTransport::new()
            .send(&node, Bytes::from_static(b"x"), SendFlags::one_way())
            .await
            .unwrap();
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn resident_receives_pushes() {
        let node = serve(vec!["a", "b", "c"], |_| {}).await;
        let reply = WsTransport::new()
            .send(&node, Bytes::from_static(b"observe"), SendFlags::resident())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.frame, Bytes::from_static(b"a"));
        let mut frames = reply.stream.unwrap();
        assert_eq!(frames.next().await.unwrap().unwrap(), Bytes::from_static(b"b"));
        assert_eq!(frames.next().await.unwrap().unwrap(), Bytes::from_static(b"c"));
        assert!(frames.next().await.is_none());
    }

    #[tokio::test]
    async fn unreachable_node_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let node = Node::new(format!("ws://{addr}")).unwrap();
        let err = WsTransport::new()
            .send(&node, Bytes::from_static(b"x"), SendFlags::request())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::WebSocket(_)));
    }
}
