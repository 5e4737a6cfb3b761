//! Client for LedgerWire.
//!
//! A [`Connector`] sends commands to a ledger node over one of the
//! configured transports and, for transaction submission, waits until a
//! pushed block notification shows the transactions were incorporated.
//!
//! ```ignore
//! use lw_client::{Connector, ConnectorSettings, Transaction};
//!
//! let settings = ConnectorSettings::load("ledger.toml")?;
//! let connector = Connector::new(settings)?;
//! let ids = connector.add_transactions(&[Transaction::new("tx-1")], false).await?;
//! ```

pub mod config;
pub mod connector;
mod correlator;
pub mod dispatcher;
pub mod error;
pub mod events;
mod subscriber;

#[cfg(test)]
mod mock;

pub use config::ConnectorSettings;
pub use connector::{Connector, TransactionQuery};
pub use dispatcher::Dispatcher;
pub use error::{ConnectorError, ConnectorResult};
pub use events::{ConnectorEvent, EventStream};

// Re-export key types
pub use lw_transport::{SendFlags, Transport, WireProtocol};
pub use lw_types::{Block, Node, Operation, Transaction, TransactionCondition};
