use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use lw_types::Block;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{CommandEnvelope, ResponseEnvelope, MAX_MESSAGE_SIZE};

/// Size of the length prefix on stream transports.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Codec for LedgerWire envelopes.
pub struct LwCodec;

impl LwCodec {
    /// Serialize a command envelope to its JSON wire form.
    pub fn encode_command(envelope: &CommandEnvelope) -> ProtocolResult<Bytes> {
        let payload = serde_json::to_vec(envelope)
            .map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        Ok(Bytes::from(payload))
    }

    /// Decode a reply into its data member.
    ///
    /// Zero bytes, JSON `null`, non-object JSON, and envelopes missing
    /// `dataName` or `data` all decode to `None`.
    pub fn decode_response(payload: &[u8]) -> ProtocolResult<Option<Value>> {
        if payload.is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;
        if !value.is_object() {
            return Ok(None);
        }
        let envelope: ResponseEnvelope = serde_json::from_value(value)
            .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;
        Ok(envelope.into_data())
    }

    /// Interpret response data as a typed value.
    pub fn decode_data<T: DeserializeOwned>(name: &'static str, data: Value) -> ProtocolResult<T> {
        serde_json::from_value(data).map_err(|e| ProtocolError::UnexpectedData {
            name,
            reason: e.to_string(),
        })
    }

    /// Decode a pushed block notification. A push without data is an
    /// empty block.
    pub fn decode_notification(payload: &[u8]) -> ProtocolResult<Block> {
        match Self::decode_response(payload)? {
            Some(data) => Self::decode_data("block", data),
            None => Err(ProtocolError::EmptyBlock),
        }
    }

    /// Frame a payload for a stream transport: [4 bytes len][payload]
    pub fn frame(payload: &[u8]) -> ProtocolResult<Vec<u8>> {
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        buf.extend_from_slice(payload);
        Ok(buf)
    }

    /// Validate a received length prefix before reading the body.
    pub fn frame_len(header: [u8; FRAME_HEADER_SIZE]) -> ProtocolResult<usize> {
        let len = u32::from_be_bytes(header) as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge { size: len, max: MAX_MESSAGE_SIZE });
        }
        Ok(len)
    }
}
