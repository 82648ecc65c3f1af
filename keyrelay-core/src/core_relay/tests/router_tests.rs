/*
 * RelayRouter scenarios
 *
 * Destination selection, envelope contents and the failure paths of a
 * single relay attempt.
 */

use crate::core_relay::envelope::ProtocolMessageType;
use crate::core_relay::errors::RelayError;
use crate::core_relay::router::{RelayOutcome, RelayRouter};
use crate::core_relay::status::{ChatId, MessageId, StatusEvent, StatusKind};
use crate::test_utils::*;
use std::time::Duration;

fn event(kind: StatusKind, chat_id: u32, forward_chat_id: u32, pdu: &[u8]) -> StatusEvent {
    StatusEvent::new(kind, ChatId::new(chat_id), ChatId::new(forward_chat_id), pdu.to_vec())
}

#[tokio::test]
async fn test_send_peer_pdu_goes_to_own_chat() {
    let (sink, _rx) = RecordingSink::new();
    let router = router_with(sink.clone());

    let outcome = router
        .relay(event(StatusKind::SendPeerPdu, 7, 0, &[0x01, 0x02]))
        .await;

    assert_eq!(
        outcome,
        RelayOutcome::Sent {
            destination: ChatId::new(7),
            message_id: MessageId(1),
            message_type: ProtocolMessageType::NewPeerAdd,
        }
    );

    let sent = sink.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].destination, ChatId::new(7));
    assert!(sent[0].subject.contains("new_peer_add"));
    assert_eq!(sent[0].subject, "{'privitty':'true', 'type':'new_peer_add'}");
    assert_eq!(sent[0].text, "AQI=");
}

#[tokio::test]
async fn test_forward_pdu_goes_to_forward_chat() {
    let (sink, _rx) = RecordingSink::new();
    let router = router_with(sink.clone());

    let outcome = router
        .relay(event(StatusKind::ForwardPdu, 7, 9, &[0xde, 0xad, 0xbe, 0xef]))
        .await;
    assert!(outcome.is_sent());

    let sent = sink.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].destination, ChatId::new(9));
    assert!(sent[0].subject.contains("forward_add_request"));
    assert_eq!(crate::core_relay::codec::decode(&sent[0].text).unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
}

#[tokio::test]
async fn test_relay_messages_follow_their_rule() {
    let (sink, _rx) = RecordingSink::new();
    let router = router_with(sink.clone());

    router.relay(event(StatusKind::ForwardSplitkeysRequest, 3, 4, b"a")).await;
    router.relay(event(StatusKind::RevertForwardSplitkeysRequest, 3, 4, b"b")).await;
    router.relay(event(StatusKind::RelayForwardSplitkeysRequest, 3, 4, b"c")).await;
    router.relay(event(StatusKind::RelayBackwardSplitkeysResponse, 3, 4, b"d")).await;
    router.relay(event(StatusKind::ForwardSplitkeysRevoked, 3, 4, b"e")).await;

    let routed: Vec<(u32, bool)> = sink
        .sent()
        .await
        .iter()
        .map(|m| (m.destination.as_u32(), m.subject.contains("relay_message")))
        .collect();
    assert_eq!(routed, vec![(3, true), (3, true), (4, false), (4, false), (4, false)]);
}

#[tokio::test]
async fn test_non_producing_kinds_send_nothing() {
    let (sink, _rx) = RecordingSink::new();
    let router = router_with(sink.clone());

    for kind in [
        StatusKind::VaultIsReady,
        StatusKind::PeerOtspSplitkeys,
        StatusKind::PeerBlocked,
        StatusKind::FileEncrypted,
    ] {
        assert_eq!(router.relay(event(kind, 7, 9, b"pdu")).await, RelayOutcome::NoMessage(kind));
    }
    assert_eq!(sink.sent_count().await, 0);
}

#[tokio::test]
async fn test_unset_destination_is_malformed() {
    let (sink, _rx) = RecordingSink::new();
    let router = router_with(sink.clone());

    let outcome = router.relay(event(StatusKind::ForwardPdu, 7, 0, b"pdu")).await;
    assert!(matches!(outcome, RelayOutcome::Dropped(RelayError::MalformedEvent(_))));

    let outcome = router.relay(event(StatusKind::SendPeerPdu, 0, 9, b"pdu")).await;
    assert!(matches!(outcome, RelayOutcome::Dropped(RelayError::MalformedEvent(_))));

    assert_eq!(sink.sent_count().await, 0);
}

#[tokio::test]
async fn test_sink_rejection_is_dropped_without_retry() {
    let sink = FailingSink::new();
    let router = router_with(sink.clone());

    let outcome = router.relay(event(StatusKind::PeerSplitkeysRevoked, 5, 0, b"x")).await;
    match outcome {
        RelayOutcome::Dropped(RelayError::TransportSendFailure { chat_id, reason }) => {
            assert_eq!(chat_id, ChatId::new(5));
            assert!(reason.contains("read-only"));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(sink.attempts(), 1);
}

#[tokio::test]
async fn test_sink_panic_is_contained() {
    let router = router_with(std::sync::Arc::new(PanickingSink));
    let outcome = router.relay(event(StatusKind::PeerSplitkeysDeleted, 5, 0, b"x")).await;
    assert!(matches!(
        outcome,
        RelayOutcome::Dropped(RelayError::TransportSendFailure { .. })
    ));
}

#[tokio::test]
async fn test_stalled_sink_times_out() {
    let router = router_with_timeout(std::sync::Arc::new(StallingSink), Duration::from_millis(50));
    let outcome = assert_completes_within(
        DEFAULT_TEST_TIMEOUT,
        router.relay(event(StatusKind::PeerSplitkeysRequest, 5, 0, b"x")),
    )
    .await;
    match outcome {
        RelayOutcome::Dropped(RelayError::TransportSendFailure { reason, .. }) => {
            assert!(reason.contains("timed out"));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_reload_switches_account() {
    let (first, _first_rx) = RecordingSink::new();
    let (second, _second_rx) = RecordingSink::new();
    let accounts = SwitchableAccounts::new(first.clone());
    let router = RelayRouter::new(accounts.clone(), Duration::from_secs(1));

    router.relay(event(StatusKind::SendPeerPdu, 1, 0, b"a")).await;

    accounts.select(second.clone());
    router.relay(event(StatusKind::SendPeerPdu, 1, 0, b"b")).await;
    assert_eq!(first.sent_count().await, 2, "selection is only picked up on reload");

    router.reload().await;
    router.relay(event(StatusKind::SendPeerPdu, 1, 0, b"c")).await;
    assert_eq!(first.sent_count().await, 2);
    assert_eq!(second.sent_count().await, 1);
}

#[test]
fn test_plan_is_pure() {
    let planned = RelayRouter::plan(&event(StatusKind::GroupAddAccepted, 11, 0, &[1, 2]))
        .unwrap()
        .unwrap();
    assert_eq!(planned.0, ProtocolMessageType::NewGroupConcluded);
    assert_eq!(planned.1.destination, ChatId::new(11));
    assert_eq!(planned.1.text, "AQI=");

    assert_eq!(RelayRouter::plan(&event(StatusKind::DeleteChat, 11, 0, &[])).unwrap(), None);
}
