//! PDU codec
//!
//! Vault PDUs are opaque bytes. The chat transport only carries text, so
//! every PDU travels as standard base64 (padded, no line wrapping).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),
}

/// Encode raw PDU bytes into their transport text form
pub fn encode(pdu: &[u8]) -> String {
    STANDARD.encode(pdu)
}

/// Decode transport text back into raw PDU bytes
pub fn decode(text: &str) -> Result<Vec<u8>, CodecError> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| CodecError::InvalidBase64(e.to_string()))
}
