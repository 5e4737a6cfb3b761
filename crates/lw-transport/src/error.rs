use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid endpoint {address}: {reason}")]
    InvalidEndpoint { address: String, reason: String },

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("connection to {address} failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("connection closed before a reply arrived")]
    Closed,

    #[error("protocol error: {0}")]
    Protocol(#[from] lw_protocol::ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Errors caused by settings rather than by the network. Retrying them
    /// cannot succeed.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::InvalidEndpoint { .. } | Self::Certificate(_))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(e.to_string())
    }
}

pub type TransportResult<T> = Result<T, TransportError>;
