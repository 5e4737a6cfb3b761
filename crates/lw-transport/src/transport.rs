use async_trait::async_trait;
use bytes::Bytes;

use lw_types::Node;

use crate::error::TransportResult;
use crate::reply::Reply;

/// When to close the connection used for a send.
///
/// With neither flag set the connection stays open and later frames are
/// delivered through [`Reply::stream`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendFlags {
    /// Close right after the write, without waiting for a reply.
    pub close_when_sent: bool,
    /// Close right after the first reply frame.
    pub close_when_received: bool,
}

impl SendFlags {
    pub fn new(close_when_sent: bool, close_when_received: bool) -> Self {
        Self { close_when_sent, close_when_received }
    }

    /// Fire-and-forget command. `close_when_sent` wins, so no reply is
    /// read even though `close_when_received` is also set.
    pub fn one_way() -> Self {
        Self::new(true, true)
    }

    /// Request answered by exactly one frame.
    pub fn request() -> Self {
        Self::new(false, true)
    }

    /// Long-lived connection receiving pushed frames.
    pub fn resident() -> Self {
        Self::new(false, false)
    }
}

/// A wire protocol able to deliver one payload to a node.
#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;

    /// Write `payload` to `node`. Resolves `None` for a one-way send, else
    /// with the first reply frame.
    async fn send(&self, node: &Node, payload: Bytes, flags: SendFlags) -> TransportResult<Option<Reply>>;
}

/// Wire protocol selected by configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WireProtocol {
    #[default]
    Tcp,
    Tls,
    Ws,
}

impl WireProtocol {
    /// `"ws"` and `"tls"` select those protocols; anything else, including
    /// no setting at all, selects the plain stream transport.
    pub fn from_setting(setting: Option<&str>) -> Self {
        match setting {
            Some("ws") => Self::Ws,
            Some("tls") => Self::Tls,
            _ => Self::Tcp,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Tls => "tls",
            Self::Ws => "ws",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_shapes() {
        assert_eq!(SendFlags::one_way(), SendFlags::new(true, true));
        assert_eq!(SendFlags::request(), SendFlags::new(false, true));
        assert_eq!(SendFlags::resident(), SendFlags::new(false, false));
    }

    #[test]
    fn protocol_from_setting() {
        assert_eq!(WireProtocol::from_setting(Some("ws")), WireProtocol::Ws);
        assert_eq!(WireProtocol::from_setting(Some("tls")), WireProtocol::Tls);
        assert_eq!(WireProtocol::from_setting(Some("axon")), WireProtocol::Tcp);
        assert_eq!(WireProtocol::from_setting(None), WireProtocol::Tcp);
    }

    #[test]
    fn protocol_names() {
        assert_eq!(WireProtocol::default().as_str(), "tcp");
        assert_eq!(WireProtocol::Ws.as_str(), "ws");
    }
}
