use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("transport error: {0}")]
    Transport(#[from] lw_transport::TransportError),

    #[error("confirmation timed out after {0:?}")]
    Timeout(Duration),

    #[error("protocol error: {0}")]
    Protocol(#[from] lw_protocol::ProtocolError),

    #[error("block observer registration failed: {0}")]
    Subscription(String),

    #[error("event registry closed")]
    Closed,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<lw_types::TypeError> for ConnectorError {
    fn from(e: lw_types::TypeError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

pub type ConnectorResult<T> = Result<T, ConnectorError>;
