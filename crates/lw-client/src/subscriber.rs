use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use lw_protocol::{commands, LwCodec};
use lw_transport::Reply;

use crate::dispatcher::Dispatcher;
use crate::error::{ConnectorError, ConnectorResult};
use crate::events::{ConnectorEvent, ListenerRegistry};

/// Keeps a resident `addObserver` connection open and republishes every
/// pushed block to local listeners. Any failure, including the node closing
/// the connection, is reported and followed by a fresh attempt after
/// `retry_delay`, for as long as the connector lives.
pub(crate) struct Subscriber {
    dispatcher: Arc<Dispatcher>,
    events: Arc<ListenerRegistry>,
    retry_delay: Duration,
}

/// Stops the subscription when dropped.
pub(crate) struct SubscriptionHandle(JoinHandle<()>);

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl Subscriber {
    pub(crate) fn new(dispatcher: Arc<Dispatcher>, events: Arc<ListenerRegistry>, retry_delay: Duration) -> Self {
        Self { dispatcher, events, retry_delay }
    }

    pub(crate) fn spawn(self) -> SubscriptionHandle {
        SubscriptionHandle(tokio::spawn(self.run()))
    }

    async fn run(self) {
        loop {
            let error = match self.observe().await {
                Ok(()) => ConnectorError::Subscription("connection closed by node".into()),
                Err(e) => ConnectorError::Subscription(e.to_string()),
            };
            self.events.emit_error(error);
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    /// Runs until the observer connection ends.
    async fn observe(&self) -> ConnectorResult<()> {
        let reply = self.dispatcher.exchange(commands::ADD_OBSERVER, None, false, true).await?;
        let Some(Reply { frame, stream }) = reply else {
            return Ok(());
        };
        info!(transport = self.dispatcher.transport_name(), "block observer registered");

        // The first frame may be a bare acknowledgment.
        if LwCodec::decode_response(&frame)?.is_some() {
            self.publish(&frame);
        }

        let Some(mut stream) = stream else {
            return Ok(());
        };
        while let Some(frame) = stream.next().await {
            self.publish(&frame?);
        }
        Ok(())
    }

    fn publish(&self, frame: &[u8]) {
        match LwCodec::decode_notification(frame) {
            Ok(block) => {
                debug!(index = block.index, "block notification");
                self.events.emit(ConnectorEvent::Created(Arc::new(block)));
            }
            Err(e) => self.events.emit_error(e.into()),
        }
    }
}
