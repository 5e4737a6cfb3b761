//! Foundation types for LedgerWire.
//!
//! Everything a ledger node sends back or accepts as a payload lives here.
//! The client never constructs blocks; it only decodes them from responses
//! and notifications.
//!
//! # Key Types
//!
//! - [`Node`] — One configured endpoint of the ledger network
//! - [`Transaction`] — Opaque payload identified by its `transactionId`
//! - [`Block`] — A ledger block as reported by a node
//! - [`TransactionCondition`] — Search condition for range queries
//! - [`GetBlocksRequest`] — Body of a backward range query

pub mod block;
pub mod condition;
pub mod error;
pub mod node;
pub mod transaction;

pub use block::Block;
pub use condition::{Direction, GetBlocksRequest, Operation, TransactionCondition};
pub use error::TypeError;
pub use node::Node;
pub use transaction::{validate_transaction_ids, Transaction};
