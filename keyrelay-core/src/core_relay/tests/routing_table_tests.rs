/*
 * Routing table conformance
 *
 * Every status kind must map to exactly the (produces, destination, tag)
 * triple the peer protocol expects. A change here silently breaks
 * interoperability with deployed peers, so the full table is spelled out.
 */

use crate::core_relay::route_table::{route, Destination};
use crate::core_relay::status::StatusKind;

type Expected = (StatusKind, bool, Option<Destination>, Option<&'static str>);

fn expected_table() -> Vec<Expected> {
    use Destination::{Forward, Own};
    use StatusKind::*;

    vec![
        (Error, false, None, None),
        (Failed, false, None, None),
        (InvalidRequest, false, None, None),
        (VaultIsReady, false, None, None),
        (VaultFailed, false, None, None),
        (UserAlreadyExists, false, None, None),
        (UserNotExists, false, None, None),
        (PeerAlreadyAdded, false, None, None),
        (SendPeerPdu, true, Some(Own), Some("new_peer_add")),
        (PeerAddAccepted, false, None, None),
        (PeerAddComplete, true, Some(Own), Some("new_peer_complete")),
        (PeerAddConcluded, true, Some(Own), Some("new_peer_concluded")),
        (PeerAddPending, false, None, None),
        (PeerBlocked, false, None, None),
        (FileEncrypted, false, None, None),
        (FileEncryptionFailed, false, None, None),
        (FileDecryptionFailed, false, None, None),
        (InvalidFile, false, None, None),
        (FileInaccessible, false, None, None),
        (AwaitingPeerAuth, false, None, None),
        (PeerSplitkeysRequest, true, Some(Own), Some("SPLITKEYS_REQUEST")),
        (PeerSplitkeysResponse, true, Some(Own), Some("SPLITKEYS_RESPONSE")),
        (PeerSplitkeysRevoked, true, Some(Own), Some("SPLITKEYS_REVOKED")),
        (PeerOtspSplitkeys, false, None, None),
        (DeleteChat, false, None, None),
        (GroupAlreadyExists, false, None, None),
        (GroupAddAccepted, true, Some(Own), Some("new_group_concluded")),
        (ForwardPdu, true, Some(Forward), Some("forward_add_request")),
        (ForwardSplitkeysRequest, true, Some(Own), Some("relay_message")),
        (RelayForwardSplitkeysRequest, true, Some(Forward), Some("relay_request")),
        (RevertForwardSplitkeysRequest, true, Some(Own), Some("relay_message")),
        (RelayBackwardSplitkeysResponse, true, Some(Forward), Some("relay_response")),
        (PeerSplitkeysDeleted, true, Some(Own), Some("SPLITKEYS_DELETED")),
        (PeerSplitkeysRestore, true, Some(Own), Some("SPLITKEYS_UNDO_REVOKED")),
        (ForwardSplitkeysRevoked, true, Some(Forward), Some("FORWARD_SPLITKEYS_REVOKED")),
    ]
}

#[test]
fn test_table_covers_every_kind_once() {
    let table = expected_table();
    assert_eq!(table.len(), 35);
    for (expected, kind) in table.iter().zip(StatusKind::ALL) {
        assert_eq!(expected.0, kind, "table out of wire-code order");
    }
}

#[test]
fn test_every_kind_routes_as_expected() {
    for (kind, produces, destination, tag) in expected_table() {
        let entry = route(kind);
        assert_eq!(entry.produces_message, produces, "produces for {}", kind);
        assert_eq!(entry.destination, destination, "destination for {}", kind);
        assert_eq!(entry.type_tag(), tag, "type tag for {}", kind);
    }
}

#[test]
fn test_producing_kind_count() {
    let producing = StatusKind::ALL
        .iter()
        .filter(|kind| route(**kind).produces_message)
        .count();
    assert_eq!(producing, 15);
}
