use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("framing error: {0}")]
    FramingError(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("unexpected {name} payload: {reason}")]
    UnexpectedData { name: &'static str, reason: String },

    #[error("the block is empty")]
    EmptyBlock,

    #[error("transactions in block[{0}] are missing")]
    MissingTransactions(u64),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
