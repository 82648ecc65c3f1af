//! Inbound protocol messages
//!
//! The receiving side of the relay: ordinary chat messages pass through
//! untouched, protocol messages are unwrapped and handed back to the local
//! vault engine as a `ReceivedPeerPdu` request.

use super::codec;
use super::envelope::{parse_subject, ProtocolMessageType};
use super::errors::RelayResult;
use super::status::ChatId;
use std::fmt;
use tracing::{debug, warn};

/// Requests the host sends into the vault engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VaultEventKind {
    None,
    CreateVault,
    Deinit,
    Abort,
    Shutdown,
    AddNewPeer,
    ReceivedPeerPdu,
    StopRendering,
    PeerOffline,
    PeerTimeoutReached,
    FileSanityFailed,
}

impl VaultEventKind {
    pub const ALL: [VaultEventKind; 11] = [
        VaultEventKind::None,
        VaultEventKind::CreateVault,
        VaultEventKind::Deinit,
        VaultEventKind::Abort,
        VaultEventKind::Shutdown,
        VaultEventKind::AddNewPeer,
        VaultEventKind::ReceivedPeerPdu,
        VaultEventKind::StopRendering,
        VaultEventKind::PeerOffline,
        VaultEventKind::PeerTimeoutReached,
        VaultEventKind::FileSanityFailed,
    ];

    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }
}

impl fmt::Display for VaultEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// Request for the local vault engine built from a received message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEvent {
    pub kind: VaultEventKind,
    pub chat_id: ChatId,
    pub type_tag: String,
    pub pdu: Vec<u8>,
}

impl VaultEvent {
    /// Typed view of the tag, `None` for tags from newer peers
    pub fn message_type(&self) -> Option<ProtocolMessageType> {
        ProtocolMessageType::from_tag(&self.type_tag)
    }
}

/// Unwrap a received chat message.
///
/// `Ok(None)` for non-protocol messages; `Err(Codec)` when the subject marks
/// a protocol message but the body is not valid base64.
pub fn decode_incoming(chat_id: ChatId, subject: &str, text: &str) -> RelayResult<Option<VaultEvent>> {
    let Some(type_tag) = parse_subject(subject) else {
        return Ok(None);
    };

    let pdu = codec::decode(text).map_err(|e| {
        warn!(chat_id = %chat_id, type_tag = %type_tag, "Undecodable protocol message: {}", e);
        e
    })?;

    if ProtocolMessageType::from_tag(&type_tag).is_none() {
        debug!(chat_id = %chat_id, type_tag = %type_tag, "Protocol message with unrecognised type");
    }

    Ok(Some(VaultEvent {
        kind: VaultEventKind::ReceivedPeerPdu,
        chat_id,
        type_tag,
        pdu,
    }))
}
