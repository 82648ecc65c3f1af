//! Error types for the relay

use super::codec::CodecError;
use super::status::ChatId;
use thiserror::Error;

/// Result type for relay operations
pub type RelayResult<T> = Result<T, RelayError>;

/// Errors that can occur while relaying a vault status event.
///
/// None of these ever reach the vault engine: every variant ends in a log
/// entry and a dropped event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// A required ingress field is missing or out of range
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// Status code outside the closed set
    #[error("Unknown status kind: {0}")]
    UnknownStatusKind(i64),

    /// Payload could not be converted to or from its text form
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The transport rejected the message, panicked or timed out
    #[error("Transport send to chat {chat_id} failed: {reason}")]
    TransportSendFailure { chat_id: ChatId, reason: String },
}

impl RelayError {
    /// Short label used for log fields and metric labels
    pub fn label(&self) -> &'static str {
        match self {
            RelayError::MalformedEvent(_) => "malformed",
            RelayError::UnknownStatusKind(_) => "unknown",
            RelayError::Codec(_) => "codec",
            RelayError::TransportSendFailure { .. } => "send_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RelayError::MalformedEvent("missing chatId".to_string());
        assert_eq!(err.to_string(), "Malformed event: missing chatId");

        let err = RelayError::TransportSendFailure {
            chat_id: ChatId::new(12),
            reason: "offline".to_string(),
        };
        assert_eq!(err.to_string(), "Transport send to chat 12 failed: offline");
    }

    #[test]
    fn test_codec_error_conversion() {
        let err: RelayError = CodecError::InvalidBase64("bad".to_string()).into();
        assert!(matches!(err, RelayError::Codec(_)));
        assert_eq!(err.label(), "codec");
    }
}
