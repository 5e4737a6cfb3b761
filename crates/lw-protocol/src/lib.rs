//! Wire protocol for LedgerWire.
//!
//! Defines the JSON envelopes exchanged with a ledger node, the command
//! vocabulary, and the length-prefixed framing used on stream transports.

pub mod codec;
pub mod error;
pub mod message;

pub use codec::{LwCodec, FRAME_HEADER_SIZE};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{commands, CommandEnvelope, ResponseEnvelope, MAX_MESSAGE_SIZE};
