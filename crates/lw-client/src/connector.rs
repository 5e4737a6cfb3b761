use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use lw_protocol::{commands, ProtocolError};
use lw_transport::Transport;
use lw_types::{validate_transaction_ids, Block, GetBlocksRequest, Transaction, TransactionCondition};

use crate::config::ConnectorSettings;
use crate::correlator::Waiter;
use crate::dispatcher::Dispatcher;
use crate::error::{ConnectorError, ConnectorResult};
use crate::events::{EventStream, ListenerRegistry};
use crate::subscriber::{Subscriber, SubscriptionHandle};

/// Parameters of [`Connector::get_transactions`].
#[derive(Clone, Debug, Default)]
pub struct TransactionQuery {
    pub condition: Option<TransactionCondition>,
    /// Skipped entries. Only honoured together with `limit`.
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub timestamp_start: Option<u64>,
    pub timestamp_end: Option<u64>,
    /// Stamp each transaction with the timestamp of its block.
    pub timestamp_required: bool,
}

impl TransactionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_condition(mut self, condition: TransactionCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_window(mut self, offset: Option<usize>, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    pub fn with_time_range(mut self, start: Option<u64>, end: Option<u64>) -> Self {
        self.timestamp_start = start;
        self.timestamp_end = end;
        self
    }

    pub fn with_timestamps(mut self) -> Self {
        self.timestamp_required = true;
        self
    }
}

/// Client handle to a set of ledger nodes.
///
/// Construction starts a background block subscription that lives as long
/// as the connector. All operations take `&self` and may run concurrently.
pub struct Connector {
    dispatcher: Arc<Dispatcher>,
    events: Arc<ListenerRegistry>,
    confirmation_timeout: Duration,
    _subscription: SubscriptionHandle,
}

impl Connector {
    /// Build a connector using the driver selected by `settings.protocol`.
    /// Must be called inside a tokio runtime.
    pub fn new(settings: ConnectorSettings) -> ConnectorResult<Self> {
        let transport = settings.build_transport()?;
        Self::with_transport(settings, transport)
    }

    pub fn with_transport(settings: ConnectorSettings, transport: Arc<dyn Transport>) -> ConnectorResult<Self> {
        let nodes = settings.node_pool()?;
        info!(
            transport = transport.name(),
            nodes = nodes.node_count(),
            "starting connector"
        );
        let dispatcher = Arc::new(Dispatcher::new(transport, nodes, settings.max_send_retries));
        let events = ListenerRegistry::new();
        let subscription = Subscriber::new(
            Arc::clone(&dispatcher),
            Arc::clone(&events),
            settings.resubscribe_delay(),
        )
        .spawn();

        Ok(Self {
            dispatcher,
            events,
            confirmation_timeout: settings.confirmation_timeout(),
            _subscription: subscription,
        })
    }

    /// Listen to block notifications and asynchronous errors.
    pub fn subscribe(&self) -> EventStream {
        self.events.subscribe()
    }

    /// Submit transactions.
    ///
    /// With `temporary` the call returns once the one-way send completes.
    /// Otherwise it resolves with the ids, in submission order, once a single
    /// block containing all of them is announced. An empty batch is a no-op
    /// and yields `None`.
    pub async fn add_transactions(
        &self,
        transactions: &[Transaction],
        temporary: bool,
    ) -> ConnectorResult<Option<Vec<String>>> {
        if transactions.is_empty() {
            return Ok(None);
        }
        validate_transaction_ids(transactions.iter().map(|tx| tx.transaction_id.as_str()))?;
        let ids: Vec<String> = transactions.iter().map(|tx| tx.transaction_id.clone()).collect();
        let data = serde_json::to_value(transactions)
            .map_err(|e| ConnectorError::Protocol(ProtocolError::Serialization(e.to_string())))?;

        if temporary {
            self.dispatcher
                .send(commands::ADD_TEMPORARY_TRANSACTION, Some(data), true, false)
                .await?;
            debug!(count = ids.len(), "temporary transactions sent");
            return Ok(Some(ids));
        }

        self.confirm(commands::ADD_TRANSACTION, data, ids).await.map(Some)
    }

    /// Commit previously added transactions and wait until a block contains
    /// all of them.
    pub async fn commit_transactions(&self, transaction_ids: &[String]) -> ConnectorResult<()> {
        if transaction_ids.is_empty() {
            return Err(ConnectorError::InvalidArgument("no transaction ids given".into()));
        }
        validate_transaction_ids(transaction_ids.iter().map(String::as_str))?;
        let data = Value::from(transaction_ids.to_vec());
        self.confirm(commands::COMMIT_TRANSACTION, data, transaction_ids.to_vec())
            .await
            .map(|_| ())
    }

    /// Fetch one block. `None` when the node has nothing to report.
    pub async fn get_block(&self, index: u64) -> ConnectorResult<Option<Block>> {
        self.dispatcher
            .request(commands::GET_BLOCK, Some(Value::from(index)), "block")
            .await
    }

    /// Range query over blocks, newest first, flattened to transactions.
    pub async fn get_transactions(&self, query: TransactionQuery) -> ConnectorResult<Option<Vec<Transaction>>> {
        if let Some(condition) = &query.condition {
            condition.validate()?;
        }
        let request = GetBlocksRequest::backward(query.condition, query.timestamp_start, query.timestamp_end);
        let data = serde_json::to_value(&request)
            .map_err(|e| ConnectorError::Protocol(ProtocolError::Serialization(e.to_string())))?;

        let Some(blocks) = self
            .dispatcher
            .request::<Vec<Block>>(commands::GET_BLOCKS, Some(data), "blocks")
            .await?
        else {
            return Ok(None);
        };

        let transactions = blocks
            .into_iter()
            .flat_map(|block| block.into_transactions(query.timestamp_required))
            .collect();
        Ok(Some(apply_window(transactions, query.offset, query.limit)))
    }

    async fn confirm(&self, command: &'static str, data: Value, ids: Vec<String>) -> ConnectorResult<Vec<String>> {
        let waiter = Waiter::arm(&self.events, ids);
        let dispatcher = Arc::clone(&self.dispatcher);
        let send = tokio::spawn(async move { dispatcher.send(command, Some(data), false, false).await });
        waiter.settle(send, self.confirmation_timeout).await
    }
}

/// Client-side paging. `offset` applies only when `limit` is set.
pub(crate) fn apply_window<T>(mut items: Vec<T>, offset: Option<usize>, limit: Option<usize>) -> Vec<T> {
    let Some(limit) = limit else {
        return items;
    };
    let offset = offset.unwrap_or(0).min(items.len());
    items.drain(..offset);
    items.truncate(limit);
    items
}
