use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;

/// How the members of a condition are combined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    And,
    Or,
    Between,
}

/// Search condition evaluated by the node against transaction contents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambiguous: Option<bool>,
    pub conditions: Value,
}

impl TransactionCondition {
    pub fn new(conditions: Value) -> Self {
        Self { operation: None, ambiguous: None, conditions }
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn ambiguous(mut self, ambiguous: bool) -> Self {
        self.ambiguous = Some(ambiguous);
        self
    }

    /// A condition must carry a `conditions` member.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.conditions.is_null() {
            return Err(TypeError::InvalidCondition("conditions is missing".into()));
        }
        Ok(())
    }
}

/// Scan direction of a range query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

/// Body of the `getBlocks` command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBlocksRequest {
    pub direction: Direction,
    pub header_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_start: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_end: Option<u64>,
    pub transaction_condition: Option<TransactionCondition>,
}

impl GetBlocksRequest {
    /// Newest-first query returning full blocks.
    pub fn backward(
        condition: Option<TransactionCondition>,
        timestamp_start: Option<u64>,
        timestamp_end: Option<u64>,
    ) -> Self {
        Self {
            direction: Direction::Backward,
            header_only: false,
            timestamp_start,
            timestamp_end,
            transaction_condition: condition,
        }
    }
}
