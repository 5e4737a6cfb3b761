use thiserror::Error;

/// Errors produced by type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("node address is empty")]
    EmptyAddress,

    #[error("transaction id is empty at position {0}")]
    EmptyTransactionId(usize),

    #[error("duplicate transaction id in batch: {0}")]
    DuplicateTransactionId(String),

    #[error("invalid condition: {0}")]
    InvalidCondition(String),
}
