use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;

/// A ledger transaction.
///
/// Only the identifier has meaning to the client. Every other member of the
/// JSON object is carried through untouched in `payload`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<Transaction>>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Transaction {
    pub fn new(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    pub fn with_elements(mut self, elements: Vec<Transaction>) -> Self {
        self.elements = Some(elements);
        self
    }

    /// The `timestamp` member, whatever its JSON type.
    pub fn timestamp(&self) -> Option<&Value> {
        self.payload.get(TIMESTAMP_KEY)
    }

    /// Overwrite the `timestamp` member with a block timestamp.
    pub fn stamp(&mut self, block_timestamp: u64) {
        self.payload.insert(TIMESTAMP_KEY.to_string(), Value::from(block_timestamp));
    }
}

const TIMESTAMP_KEY: &str = "timestamp";

/// Check that a batch of ids is usable as a confirmation key: no empty id,
/// no id twice.
pub fn validate_transaction_ids<'a, I>(ids: I) -> Result<(), TypeError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for (position, id) in ids.into_iter().enumerate() {
        if id.is_empty() {
            return Err(TypeError::EmptyTransactionId(position));
        }
        if !seen.insert(id) {
            return Err(TypeError::DuplicateTransactionId(id.to_string()));
        }
    }
    Ok(())
}
