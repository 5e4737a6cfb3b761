use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// A block as reported by a ledger node.
///
/// `transactions` is optional on decode: notifications for header-only
/// blocks leave it out, and callers that need it must treat its absence as
/// a protocol problem.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(default)]
    pub version: String,
    pub index: u64,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub prev_hash: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub transactions: Option<Vec<Transaction>>,
}

impl Block {
    /// Iterate over the ids of the transactions in this block.
    pub fn transaction_ids(&self) -> impl Iterator<Item = &str> {
        self.transactions
            .iter()
            .flatten()
            .map(|tx| tx.transaction_id.as_str())
    }

    /// Take the transaction list, stamping each entry with the block
    /// timestamp when `stamp` is set.
    pub fn into_transactions(self, stamp: bool) -> Vec<Transaction> {
        let timestamp = self.timestamp;
        let mut transactions = self.transactions.unwrap_or_default();
        if stamp {
            for tx in &mut transactions {
                tx.stamp(timestamp);
            }
        }
        transactions
    }
}
