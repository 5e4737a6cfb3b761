use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::debug;

use lw_protocol::{ProtocolError, ProtocolResult};
use lw_types::Block;

use crate::error::{ConnectorError, ConnectorResult};
use crate::events::{ConnectorEvent, EventStream, ListenerRegistry};

/// A pending confirmation: the ids one call is waiting to see in a block.
///
/// Armed before the command is sent, so a notification racing the command's
/// own reply is not missed. Settles on the first single block that contains
/// every id, or fails at the deadline. Dropping the waiter deregisters it.
pub(crate) struct Waiter {
    ids: Vec<String>,
    listener: EventStream,
    events: Arc<ListenerRegistry>,
}

impl Waiter {
    pub(crate) fn arm(events: &Arc<ListenerRegistry>, ids: Vec<String>) -> Self {
        Self {
            ids,
            listener: events.subscribe(),
            events: Arc::clone(events),
        }
    }

    /// Whether `block` alone contains every id this waiter needs.
    pub(crate) fn is_satisfied_by(&self, block: &Block) -> ProtocolResult<bool> {
        let Some(transactions) = &block.transactions else {
            return Err(ProtocolError::MissingTransactions(block.index));
        };
        let present: HashSet<&str> = transactions.iter().map(|tx| tx.transaction_id.as_str()).collect();
        Ok(self.ids.iter().all(|id| present.contains(id.as_str())))
    }

    /// Wait for the matching block.
    ///
    /// A failure of `command` settles the wait with that failure. On timeout
    /// the command keeps running detached; its outcome is discarded.
    pub(crate) async fn settle(
        mut self,
        mut command: JoinHandle<ConnectorResult<Option<Value>>>,
        timeout: Duration,
    ) -> ConnectorResult<Vec<String>> {
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        let mut command_done = false;

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    debug!(ids = ?self.ids, "confirmation deadline passed");
                    return Err(ConnectorError::Timeout(timeout));
                }
                outcome = &mut command, if !command_done => {
                    command_done = true;
                    match outcome {
                        Ok(Ok(_)) => {}
                        Ok(Err(e)) => return Err(e),
                        Err(e) => return Err(ConnectorError::Internal(e.to_string())),
                    }
                }
                event = self.listener.recv() => match event {
                    Some(ConnectorEvent::Created(block)) => match self.is_satisfied_by(&block) {
                        Ok(true) => {
                            debug!(index = block.index, ids = ?self.ids, "transactions confirmed");
                            return Ok(std::mem::take(&mut self.ids));
                        }
                        Ok(false) => {}
                        Err(e) => self.events.emit_error(e.into()),
                    },
                    Some(ConnectorEvent::Error(_)) => {}
                    None => return Err(ConnectorError::Closed),
                },
            }
        }
    }
}
