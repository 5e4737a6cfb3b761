use async_trait::async_trait;
use bytes::Bytes;
use tokio::net::TcpStream;
use tracing::debug;

use lw_types::Node;

use crate::endpoint::Endpoint;
use crate::error::{TransportError, TransportResult};
use crate::reply::Reply;
use crate::stream::exchange;
use crate::transport::{SendFlags, Transport};

/// Plain stream socket driver. The default transport.
#[derive(Clone, Debug, Default)]
pub struct TcpTransport;

impl TcpTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for TcpTransport {
    fn name(&self) -> &'static str {
        "tcp"
    }

    async fn send(&self, node: &Node, payload: Bytes, flags: SendFlags) -> TransportResult<Option<Reply>> {
        let endpoint = Endpoint::parse_stream(node.address())?;
        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .await
            .map_err(|source| TransportError::Connect {
                address: node.address().to_string(),
                source,
            })?;
        stream.set_nodelay(true)?;
        debug!(node = %node, ?flags, "tcp connected");
        exchange(stream, &payload, flags).await
    }
}
