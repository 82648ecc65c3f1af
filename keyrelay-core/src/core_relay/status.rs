/*
    Status - vault status taxonomy and ingress events

    The vault engine reports every lifecycle step (vault created, peer handshake
    progress, split-key request/response/revocation, relayed forwards, ...) as a
    numeric status code plus two chat ids and an opaque PDU.

    Workflow:
    1. Host bridge builds a RawStatusEvent from whatever the vault callback hands it
    2. RawStatusEvent::validate() checks all four fields are present and in range
    3. StatusKind::from_code() maps the numeric code onto the closed set

    Codes are fixed by the vault ABI and must never be renumbered.
*/

use super::errors::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat identifier on the messaging transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(u32);

impl ChatId {
    pub const fn new(id: u32) -> Self {
        ChatId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Chat id 0 is never a real chat on the transport
    pub fn is_unset(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message identifier returned by the transport after a send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u32);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status reported by the vault engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Error,
    Failed,
    InvalidRequest,
    VaultIsReady,
    VaultFailed,
    UserAlreadyExists,
    UserNotExists,
    PeerAlreadyAdded,
    SendPeerPdu,
    PeerAddAccepted,
    PeerAddComplete,
    PeerAddConcluded,
    PeerAddPending,
    PeerBlocked,
    FileEncrypted,
    FileEncryptionFailed,
    FileDecryptionFailed,
    InvalidFile,
    FileInaccessible,
    AwaitingPeerAuth,
    PeerSplitkeysRequest,
    PeerSplitkeysResponse,
    PeerSplitkeysRevoked,
    PeerOtspSplitkeys,
    DeleteChat,
    GroupAlreadyExists,
    GroupAddAccepted,
    ForwardPdu,
    ForwardSplitkeysRequest,
    RelayForwardSplitkeysRequest,
    RevertForwardSplitkeysRequest,
    RelayBackwardSplitkeysResponse,
    PeerSplitkeysDeleted,
    PeerSplitkeysRestore,
    ForwardSplitkeysRevoked,
}

impl StatusKind {
    /// Every kind, in wire-code order
    pub const ALL: [StatusKind; 35] = [
        StatusKind::Error,
        StatusKind::Failed,
        StatusKind::InvalidRequest,
        StatusKind::VaultIsReady,
        StatusKind::VaultFailed,
        StatusKind::UserAlreadyExists,
        StatusKind::UserNotExists,
        StatusKind::PeerAlreadyAdded,
        StatusKind::SendPeerPdu,
        StatusKind::PeerAddAccepted,
        StatusKind::PeerAddComplete,
        StatusKind::PeerAddConcluded,
        StatusKind::PeerAddPending,
        StatusKind::PeerBlocked,
        StatusKind::FileEncrypted,
        StatusKind::FileEncryptionFailed,
        StatusKind::FileDecryptionFailed,
        StatusKind::InvalidFile,
        StatusKind::FileInaccessible,
        StatusKind::AwaitingPeerAuth,
        StatusKind::PeerSplitkeysRequest,
        StatusKind::PeerSplitkeysResponse,
        StatusKind::PeerSplitkeysRevoked,
        StatusKind::PeerOtspSplitkeys,
        StatusKind::DeleteChat,
        StatusKind::GroupAlreadyExists,
        StatusKind::GroupAddAccepted,
        StatusKind::ForwardPdu,
        StatusKind::ForwardSplitkeysRequest,
        StatusKind::RelayForwardSplitkeysRequest,
        StatusKind::RevertForwardSplitkeysRequest,
        StatusKind::RelayBackwardSplitkeysResponse,
        StatusKind::PeerSplitkeysDeleted,
        StatusKind::PeerSplitkeysRestore,
        StatusKind::ForwardSplitkeysRevoked,
    ];

    /// Map a vault status code onto the closed set.
    ///
    /// Returns `None` for anything outside 0..=34, including the vault's own
    /// end-of-list sentinel (35).
    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// Wire code of this kind
    pub fn code(&self) -> i64 {
        *self as i64
    }

    /// Human readable description for log lines
    pub fn describe(&self) -> &'static str {
        match self {
            StatusKind::Error => "vault reported an error",
            StatusKind::Failed => "vault operation failed",
            StatusKind::InvalidRequest => "vault rejected an invalid request",
            StatusKind::VaultIsReady => "vault is created",
            StatusKind::VaultFailed => "vault creation failed",
            StatusKind::UserAlreadyExists => "user already exists",
            StatusKind::UserNotExists => "user does not exist",
            StatusKind::PeerAlreadyAdded => "peer already added",
            StatusKind::SendPeerPdu => "send add new peer request",
            StatusKind::PeerAddAccepted => "peer add accepted",
            StatusKind::PeerAddComplete => "add new peer handshake is complete",
            StatusKind::PeerAddConcluded => "new peer concluded",
            StatusKind::PeerAddPending => "peer add pending",
            StatusKind::PeerBlocked => "peer blocked",
            StatusKind::FileEncrypted => "file encrypted",
            StatusKind::FileEncryptionFailed => "file encryption failed",
            StatusKind::FileDecryptionFailed => "file decryption failed",
            StatusKind::InvalidFile => "invalid file",
            StatusKind::FileInaccessible => "file inaccessible",
            StatusKind::AwaitingPeerAuth => "awaiting peer authentication",
            StatusKind::PeerSplitkeysRequest => "peer SPLITKEYS request",
            StatusKind::PeerSplitkeysResponse => "peer SPLITKEYS response",
            StatusKind::PeerSplitkeysRevoked => "peer SPLITKEYS revoked",
            StatusKind::PeerOtspSplitkeys => "peer OTSP sent",
            StatusKind::DeleteChat => "delete chat",
            StatusKind::GroupAlreadyExists => "group already exists",
            StatusKind::GroupAddAccepted => "new chat group is ready",
            StatusKind::ForwardPdu => "forward pdu to forward chat",
            StatusKind::ForwardSplitkeysRequest => "forward SPLITKEYS request",
            StatusKind::RelayForwardSplitkeysRequest => "relay SPLITKEYS request",
            StatusKind::RevertForwardSplitkeysRequest => "revert forward SPLITKEYS request",
            StatusKind::RelayBackwardSplitkeysResponse => "relay SPLITKEYS response",
            StatusKind::PeerSplitkeysDeleted => "peer SPLITKEYS deleted",
            StatusKind::PeerSplitkeysRestore => "peer SPLITKEYS undo revoked",
            StatusKind::ForwardSplitkeysRevoked => "forwarded SPLITKEYS revoked",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// Event exactly as delivered by the vault callback.
///
/// Every field is optional here because the host bridge may hand over a
/// partially filled record; `validate` turns it into a `StatusEvent`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStatusEvent {
    #[serde(rename = "statusCode", default)]
    pub status_code: Option<i64>,
    #[serde(rename = "chatId", default)]
    pub chat_id: Option<i64>,
    #[serde(rename = "fwdToChatId", alias = "forwardToChatId", default)]
    pub forward_to_chat_id: Option<i64>,
    #[serde(default)]
    pub pdu: Option<Vec<u8>>,
}

impl RawStatusEvent {
    /// Fully populated raw event
    pub fn new(status_code: i64, chat_id: i64, forward_to_chat_id: i64, pdu: Vec<u8>) -> Self {
        Self {
            status_code: Some(status_code),
            chat_id: Some(chat_id),
            forward_to_chat_id: Some(forward_to_chat_id),
            pdu: Some(pdu),
        }
    }

    /// Parse a JSON ingress record
    pub fn from_json(json: &str) -> RelayResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| RelayError::MalformedEvent(format!("invalid ingress record: {}", e)))
    }

    /// Check field presence and ranges, then resolve the status kind.
    ///
    /// Missing fields are `MalformedEvent`; a code outside the closed set is
    /// `UnknownStatusKind`.
    pub fn validate(self) -> RelayResult<StatusEvent> {
        let status_code = self
            .status_code
            .ok_or_else(|| RelayError::MalformedEvent("missing statusCode".to_string()))?;
        let chat_id = chat_id_field("chatId", self.chat_id)?;
        let forward_chat_id = chat_id_field("fwdToChatId", self.forward_to_chat_id)?;
        let pdu = self
            .pdu
            .ok_or_else(|| RelayError::MalformedEvent("missing pdu".to_string()))?;

        let kind = StatusKind::from_code(status_code)
            .ok_or(RelayError::UnknownStatusKind(status_code))?;

        Ok(StatusEvent {
            kind,
            chat_id,
            forward_chat_id,
            pdu,
        })
    }
}

fn chat_id_field(name: &str, value: Option<i64>) -> RelayResult<ChatId> {
    let raw = value.ok_or_else(|| RelayError::MalformedEvent(format!("missing {}", name)))?;
    u32::try_from(raw)
        .map(ChatId::new)
        .map_err(|_| RelayError::MalformedEvent(format!("{} out of range: {}", name, raw)))
}

/// Validated vault status event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub kind: StatusKind,
    pub chat_id: ChatId,
    pub forward_chat_id: ChatId,
    pub pdu: Vec<u8>,
}

impl StatusEvent {
    pub fn new(kind: StatusKind, chat_id: ChatId, forward_chat_id: ChatId, pdu: Vec<u8>) -> Self {
        Self {
            kind,
            chat_id,
            forward_chat_id,
            pdu,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        for (idx, kind) in StatusKind::ALL.iter().enumerate() {
            assert_eq!(kind.code(), idx as i64);
            assert_eq!(StatusKind::from_code(idx as i64), Some(*kind));
        }
        assert_eq!(StatusKind::from_code(8), Some(StatusKind::SendPeerPdu));
        assert_eq!(StatusKind::from_code(27), Some(StatusKind::ForwardPdu));
        assert_eq!(StatusKind::from_code(34), Some(StatusKind::ForwardSplitkeysRevoked));
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(StatusKind::from_code(35), None);
        assert_eq!(StatusKind::from_code(999), None);
        assert_eq!(StatusKind::from_code(-1), None);
    }

    #[test]
    fn test_validate_complete_event() {
        let event = RawStatusEvent::new(8, 7, 0, vec![1, 2]).validate().unwrap();
        assert_eq!(event.kind, StatusKind::SendPeerPdu);
        assert_eq!(event.chat_id, ChatId::new(7));
        assert_eq!(event.forward_chat_id, ChatId::new(0));
        assert_eq!(event.pdu, vec![1, 2]);
    }

    #[test]
    fn test_validate_missing_fields() {
        let mut raw = RawStatusEvent::new(8, 7, 0, vec![]);
        raw.chat_id = None;
        assert_eq!(
            raw.validate(),
            Err(RelayError::MalformedEvent("missing chatId".to_string()))
        );

        let mut raw = RawStatusEvent::new(8, 7, 0, vec![]);
        raw.pdu = None;
        assert!(matches!(raw.validate(), Err(RelayError::MalformedEvent(_))));

        assert!(matches!(
            RawStatusEvent::default().validate(),
            Err(RelayError::MalformedEvent(_))
        ));
    }

    #[test]
    fn test_validate_negative_chat_id() {
        let raw = RawStatusEvent::new(8, -4, 0, vec![]);
        assert!(matches!(raw.validate(), Err(RelayError::MalformedEvent(_))));
    }

    #[test]
    fn test_validate_unknown_code() {
        let raw = RawStatusEvent::new(999, 7, 0, vec![]);
        assert_eq!(raw.validate(), Err(RelayError::UnknownStatusKind(999)));
    }

    #[test]
    fn test_from_json() {
        let raw = RawStatusEvent::from_json(
            r#"{"statusCode": 27, "chatId": 7, "fwdToChatId": 9, "pdu": [1, 2, 3]}"#,
        )
        .unwrap();
        assert_eq!(raw, RawStatusEvent::new(27, 7, 9, vec![1, 2, 3]));

        let raw = RawStatusEvent::from_json(r#"{"statusCode": 27, "forwardToChatId": 9}"#).unwrap();
        assert_eq!(raw.forward_to_chat_id, Some(9));
        assert!(raw.validate().is_err());

        assert!(RawStatusEvent::from_json("not json").is_err());
    }
}
