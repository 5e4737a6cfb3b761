//! Transport drivers for LedgerWire.
//!
//! Every driver implements the same primitive: open a connection to a node,
//! write one payload, and hand back the reply according to two independent
//! close flags. See [`SendFlags`] for the three connection shapes.

pub mod endpoint;
pub mod error;
pub mod reply;
pub mod selector;
mod stream;
pub mod tcp;
pub mod tls;
pub mod transport;
pub mod ws;

pub use endpoint::Endpoint;
pub use error::{TransportError, TransportResult};
pub use reply::{FrameStream, Reply};
pub use selector::NodePool;
pub use tcp::TcpTransport;
pub use tls::{CertificateBundle, TlsTransport};
pub use transport::{SendFlags, Transport, WireProtocol};
pub use ws::WsTransport;
