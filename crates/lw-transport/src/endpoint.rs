use crate::error::{TransportError, TransportResult};

const TCP_SCHEME: &str = "tcp://";
const TLS_SCHEME: &str = "tls://";

/// Host and port extracted from a node address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Parse a plain stream address: `tcp://host:port` or bare `host:port`.
    pub fn parse_stream(address: &str) -> TransportResult<Self> {
        let rest = address.strip_prefix(TCP_SCHEME).unwrap_or(address);
        Self::split(address, rest)
    }

    /// Parse a TLS address. The scheme must be `tls://`.
    pub fn parse_tls(address: &str) -> TransportResult<Self> {
        let rest = address.strip_prefix(TLS_SCHEME).ok_or_else(|| invalid(address, "scheme must be tls://"))?;
        Self::split(address, rest)
    }

    fn split(address: &str, rest: &str) -> TransportResult<Self> {
        let (host, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| invalid(address, "port is missing"))?;
        if port.is_empty() {
            return Err(invalid(address, "port is missing"));
        }
        let port: u16 = port.parse().map_err(|_| invalid(address, "port is invalid"))?;
        if host.is_empty() {
            return Err(invalid(address, "host is missing"));
        }
        Ok(Self { host: host.to_string(), port })
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

fn invalid(address: &str, reason: &str) -> TransportError {
    TransportError::InvalidEndpoint {
        address: address.to_string(),
        reason: reason.to_string(),
    }
}
