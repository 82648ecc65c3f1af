/*
    RouteTable - status kind to outgoing message rule

    Static and total: every StatusKind has exactly one entry and entries never
    change at runtime.

    Destination rule:
      - Self    -> event.chat_id (reply to the originating peer chat)
      - Forward -> event.forward_chat_id (relay through the intermediary chat)

    PeerOtspSplitkeys is deliberately non-producing. The vault expects an
    OTSP_SENT notice but transmission of it is disabled until the product
    side decides what the peer should do with it.
*/

use super::envelope::ProtocolMessageType;
use super::status::{ChatId, StatusEvent, StatusKind};

/// Which chat id field of the event receives the message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The originating chat (`chat_id`)
    Own,
    /// The intermediary chat (`forward_chat_id`)
    Forward,
}

impl Destination {
    /// Pick the chat id this rule points at
    pub fn resolve(&self, event: &StatusEvent) -> ChatId {
        match self {
            Destination::Own => event.chat_id,
            Destination::Forward => event.forward_chat_id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Own => "self",
            Destination::Forward => "forward",
        }
    }
}

/// Routing decision for one status kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub produces_message: bool,
    pub destination: Option<Destination>,
    pub message_type: Option<ProtocolMessageType>,
}

impl RouteEntry {
    const NONE: RouteEntry = RouteEntry {
        produces_message: false,
        destination: None,
        message_type: None,
    };

    const fn to_own(message_type: ProtocolMessageType) -> Self {
        RouteEntry {
            produces_message: true,
            destination: Some(Destination::Own),
            message_type: Some(message_type),
        }
    }

    const fn to_forward(message_type: ProtocolMessageType) -> Self {
        RouteEntry {
            produces_message: true,
            destination: Some(Destination::Forward),
            message_type: Some(message_type),
        }
    }

    pub fn type_tag(&self) -> Option<&'static str> {
        self.message_type.map(|t| t.as_tag())
    }
}

/// Routing rule for a status kind
pub fn route(kind: StatusKind) -> RouteEntry {
    use ProtocolMessageType as T;

    match kind {
        StatusKind::SendPeerPdu => RouteEntry::to_own(T::NewPeerAdd),
        StatusKind::ForwardPdu => RouteEntry::to_forward(T::ForwardAddRequest),
        StatusKind::PeerAddComplete => RouteEntry::to_own(T::NewPeerComplete),
        StatusKind::PeerAddConcluded => RouteEntry::to_own(T::NewPeerConcluded),
        StatusKind::PeerSplitkeysRequest => RouteEntry::to_own(T::SplitkeysRequest),
        StatusKind::PeerSplitkeysResponse => RouteEntry::to_own(T::SplitkeysResponse),
        StatusKind::PeerSplitkeysRevoked => RouteEntry::to_own(T::SplitkeysRevoked),
        StatusKind::PeerSplitkeysRestore => RouteEntry::to_own(T::SplitkeysUndoRevoked),
        StatusKind::ForwardSplitkeysRevoked => RouteEntry::to_forward(T::ForwardSplitkeysRevoked),
        StatusKind::PeerSplitkeysDeleted => RouteEntry::to_own(T::SplitkeysDeleted),
        StatusKind::GroupAddAccepted => RouteEntry::to_own(T::NewGroupConcluded),
        StatusKind::ForwardSplitkeysRequest | StatusKind::RevertForwardSplitkeysRequest => {
            RouteEntry::to_own(T::RelayMessage)
        }
        StatusKind::RelayForwardSplitkeysRequest => RouteEntry::to_forward(T::RelayRequest),
        StatusKind::RelayBackwardSplitkeysResponse => RouteEntry::to_forward(T::RelayResponse),

        // TODO: decide whether OTSP_SENT should reach the peer chat once the
        // product owners define its receive-side handling.
        StatusKind::PeerOtspSplitkeys => RouteEntry::NONE,

        StatusKind::Error
        | StatusKind::Failed
        | StatusKind::InvalidRequest
        | StatusKind::VaultIsReady
        | StatusKind::VaultFailed
        | StatusKind::UserAlreadyExists
        | StatusKind::UserNotExists
        | StatusKind::PeerAlreadyAdded
        | StatusKind::PeerAddAccepted
        | StatusKind::PeerAddPending
        | StatusKind::PeerBlocked
        | StatusKind::FileEncrypted
        | StatusKind::FileEncryptionFailed
        | StatusKind::FileDecryptionFailed
        | StatusKind::InvalidFile
        | StatusKind::FileInaccessible
        | StatusKind::AwaitingPeerAuth
        | StatusKind::DeleteChat
        | StatusKind::GroupAlreadyExists => RouteEntry::NONE,
    }
}
