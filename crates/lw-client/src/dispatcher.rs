use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use lw_protocol::{CommandEnvelope, LwCodec};
use lw_transport::{NodePool, Reply, SendFlags, Transport};

use crate::error::{ConnectorError, ConnectorResult};

/// Builds command envelopes and sends them to a node, retrying transport
/// failures.
///
/// A failed send is retried immediately against a freshly picked node, up
/// to `max_retries` more times, with the same serialized bytes. A send whose
/// acknowledgment was lost may therefore reach the ledger more than once.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    nodes: NodePool,
    max_retries: u32,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, nodes: NodePool, max_retries: u32) -> Self {
        Self { transport, nodes, max_retries }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Send a command and return the raw reply.
    ///
    /// `oneway` closes the connection once written; `resident` keeps it open
    /// after the first reply frame.
    pub async fn exchange(
        &self,
        command: &str,
        data: Option<Value>,
        oneway: bool,
        resident: bool,
    ) -> ConnectorResult<Option<Reply>> {
        let payload = LwCodec::encode_command(&CommandEnvelope::new(command, data))?;
        let flags = SendFlags::new(oneway, !resident);

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let node = self.nodes.pick();
            debug!(command, node = %node, attempt, "sending command");
            match self.transport.send(node, payload.clone(), flags).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_config() => return Err(ConnectorError::Config(e.to_string())),
                Err(e) if attempt <= self.max_retries => {
                    warn!(command, node = %node, attempt, error = %e, "send failed, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Send a command and decode the reply's data. `None` for one-way
    /// sends and for empty replies.
    pub async fn send(
        &self,
        command: &str,
        data: Option<Value>,
        oneway: bool,
        resident: bool,
    ) -> ConnectorResult<Option<Value>> {
        match self.exchange(command, data, oneway, resident).await? {
            Some(reply) => Ok(LwCodec::decode_response(&reply.frame)?),
            None => Ok(None),
        }
    }

    /// Request/response command decoded into `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        command: &str,
        data: Option<Value>,
        name: &'static str,
    ) -> ConnectorResult<Option<T>> {
        match self.send(command, data, false, false).await? {
            Some(data) => Ok(Some(LwCodec::decode_data(name, data)?)),
            None => Ok(None),
        }
    }
}
