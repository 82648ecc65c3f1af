//! Protocol envelope
//!
//! A relayed PDU travels as an ordinary text chat message:
//!
//! - subject: `{'privitty':'true', 'type':'<tag>'}`
//! - text: standard base64 of the raw PDU
//!
//! The subject is not strict JSON (single quotes), so receivers parse it
//! leniently with [`parse_subject`].

use super::codec;
use super::status::ChatId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker key identifying protocol messages among ordinary chat traffic
pub const PROTOCOL_MARKER: &str = "privitty";

/// Protocol message types carried in the subject's `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolMessageType {
    NewPeerAdd,
    ForwardAddRequest,
    NewPeerComplete,
    NewPeerConcluded,
    OtspSent,
    SplitkeysRequest,
    SplitkeysResponse,
    SplitkeysRevoked,
    SplitkeysUndoRevoked,
    ForwardSplitkeysRevoked,
    SplitkeysDeleted,
    NewGroupConcluded,
    RelayMessage,
    RelayRequest,
    RelayResponse,
}

impl ProtocolMessageType {
    pub const ALL: [ProtocolMessageType; 15] = [
        ProtocolMessageType::NewPeerAdd,
        ProtocolMessageType::ForwardAddRequest,
        ProtocolMessageType::NewPeerComplete,
        ProtocolMessageType::NewPeerConcluded,
        ProtocolMessageType::OtspSent,
        ProtocolMessageType::SplitkeysRequest,
        ProtocolMessageType::SplitkeysResponse,
        ProtocolMessageType::SplitkeysRevoked,
        ProtocolMessageType::SplitkeysUndoRevoked,
        ProtocolMessageType::ForwardSplitkeysRevoked,
        ProtocolMessageType::SplitkeysDeleted,
        ProtocolMessageType::NewGroupConcluded,
        ProtocolMessageType::RelayMessage,
        ProtocolMessageType::RelayRequest,
        ProtocolMessageType::RelayResponse,
    ];

    /// Wire tag
    pub fn as_tag(&self) -> &'static str {
        match self {
            ProtocolMessageType::NewPeerAdd => "new_peer_add",
            ProtocolMessageType::ForwardAddRequest => "forward_add_request",
            ProtocolMessageType::NewPeerComplete => "new_peer_complete",
            ProtocolMessageType::NewPeerConcluded => "new_peer_concluded",
            ProtocolMessageType::OtspSent => "OTSP_SENT",
            ProtocolMessageType::SplitkeysRequest => "SPLITKEYS_REQUEST",
            ProtocolMessageType::SplitkeysResponse => "SPLITKEYS_RESPONSE",
            ProtocolMessageType::SplitkeysRevoked => "SPLITKEYS_REVOKED",
            ProtocolMessageType::SplitkeysUndoRevoked => "SPLITKEYS_UNDO_REVOKED",
            ProtocolMessageType::ForwardSplitkeysRevoked => "FORWARD_SPLITKEYS_REVOKED",
            ProtocolMessageType::SplitkeysDeleted => "SPLITKEYS_DELETED",
            ProtocolMessageType::NewGroupConcluded => "new_group_concluded",
            ProtocolMessageType::RelayMessage => "relay_message",
            ProtocolMessageType::RelayRequest => "relay_request",
            ProtocolMessageType::RelayResponse => "relay_response",
        }
    }

    /// Look up a wire tag (exact match, tags are case sensitive)
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_tag() == tag)
    }
}

impl fmt::Display for ProtocolMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Render the structured subject for a type tag
pub fn render_subject(message_type: ProtocolMessageType) -> String {
    format!(
        "{{'{}':'true', 'type':'{}'}}",
        PROTOCOL_MARKER,
        message_type.as_tag()
    )
}

/// Parse a protocol subject and return its type tag.
///
/// Tolerates single or double quotes, any whitespace, any key order and a
/// bare or quoted `true`. Returns `None` unless the protocol marker is set
/// and a non-empty `type` is present. Unknown tags are still returned so
/// newer peers can be logged rather than silently ignored.
pub fn parse_subject(subject: &str) -> Option<String> {
    let body = subject.trim();
    let body = body.strip_prefix('{')?.strip_suffix('}')?;

    let mut marker = false;
    let mut tag = None;

    for pair in body.split(',') {
        let Some((key, value)) = pair.split_once(':') else {
            continue;
        };
        let key = unquote(key);
        let value = unquote(value);

        if key == PROTOCOL_MARKER {
            marker = value.eq_ignore_ascii_case("true");
        } else if key == "type" && !value.is_empty() {
            tag = Some(value.to_string());
        }
    }

    if marker {
        tag
    } else {
        None
    }
}

/// Whether a chat subject marks a protocol message
pub fn is_protocol_subject(subject: &str) -> bool {
    parse_subject(subject).is_some()
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches(|c| c == '\'' || c == '"').trim()
}

/// Type tag plus encoded PDU, built per relayed event and never stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolEnvelope {
    pub message_type: ProtocolMessageType,
    pub pdu_text: String,
}

impl ProtocolEnvelope {
    pub fn build(message_type: ProtocolMessageType, pdu: &[u8]) -> Self {
        Self {
            message_type,
            pdu_text: codec::encode(pdu),
        }
    }

    pub fn type_tag(&self) -> &'static str {
        self.message_type.as_tag()
    }

    pub fn subject(&self) -> String {
        render_subject(self.message_type)
    }

    /// Address the envelope to a chat
    pub fn into_outgoing(self, destination: ChatId) -> OutgoingMessage {
        OutgoingMessage {
            destination,
            subject: self.subject(),
            text: self.pdu_text,
        }
    }
}

/// Material handed to the transport sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub destination: ChatId,
    pub subject: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_subject() {
        assert_eq!(
            render_subject(ProtocolMessageType::NewPeerAdd),
            "{'privitty':'true', 'type':'new_peer_add'}"
        );
        assert_eq!(
            render_subject(ProtocolMessageType::SplitkeysUndoRevoked),
            "{'privitty':'true', 'type':'SPLITKEYS_UNDO_REVOKED'}"
        );
    }

    #[test]
    fn test_tags_roundtrip() {
        for message_type in ProtocolMessageType::ALL {
            assert_eq!(ProtocolMessageType::from_tag(message_type.as_tag()), Some(message_type));
            assert_eq!(
                parse_subject(&render_subject(message_type)).as_deref(),
                Some(message_type.as_tag())
            );
        }
        assert_eq!(ProtocolMessageType::from_tag("NEW_PEER_ADD"), None);
    }

    #[test]
    fn test_parse_subject_lenient() {
        assert_eq!(
            parse_subject(r#"{"privitty": "true", "type": "relay_request"}"#).as_deref(),
            Some("relay_request")
        );
        assert_eq!(
            parse_subject("  {'type':'relay_response','privitty':true}  ").as_deref(),
            Some("relay_response")
        );
        assert_eq!(
            parse_subject("{ 'privitty' : 'TRUE' , 'type' : 'future_tag' }").as_deref(),
            Some("future_tag")
        );
    }

    #[test]
    fn test_parse_subject_rejects_non_protocol() {
        assert_eq!(parse_subject("Hello there"), None);
        assert_eq!(parse_subject("{'privitty':'false', 'type':'new_peer_add'}"), None);
        assert_eq!(parse_subject("{'type':'new_peer_add'}"), None);
        assert_eq!(parse_subject("{'privitty':'true'}"), None);
        assert_eq!(parse_subject("{'privitty':'true', 'type':''}"), None);
        assert!(!is_protocol_subject(""));
    }

    #[test]
    fn test_envelope_into_outgoing() {
        let envelope = ProtocolEnvelope::build(ProtocolMessageType::NewPeerAdd, &[0x01, 0x02]);
        assert_eq!(envelope.type_tag(), "new_peer_add");
        assert_eq!(envelope.pdu_text, "AQI=");

        let outgoing = envelope.into_outgoing(ChatId::new(7));
        assert_eq!(outgoing.destination, ChatId::new(7));
        assert!(outgoing.subject.contains("new_peer_add"));
        assert_eq!(outgoing.text, "AQI=");
    }
}
