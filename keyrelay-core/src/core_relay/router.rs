/*
    RelayRouter

    Turns one validated StatusEvent into at most one transport send.

    Workflow:
    1. route(kind) decides whether the kind produces a message and where it goes
    2. destination chat id is taken from the event field the rule names
    3. ProtocolEnvelope::build encodes the PDU and picks the subject tag
    4. the selected account's sink gets exactly one send_message call,
       holding a worker permit when called from the dispatcher

    The sink handle is snapshotted from the injected AccountSource at
    construction and on reload(); there is no ambient "current account".
*/

use super::envelope::{OutgoingMessage, ProtocolEnvelope, ProtocolMessageType};
use super::errors::{RelayError, RelayResult};
use super::metrics;
use super::route_table::route;
use super::status::{ChatId, MessageId, StatusEvent, StatusKind};
use super::transport::{AccountSource, TransportSink};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, error, info};

/// Final result of relaying one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// One message was accepted by the transport
    Sent {
        destination: ChatId,
        message_id: MessageId,
        message_type: ProtocolMessageType,
    },
    /// The kind does not produce a message
    NoMessage(StatusKind),
    /// Status code outside the known set
    Ignored(i64),
    /// The event was dropped after a failure
    Dropped(RelayError),
}

impl RelayOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RelayOutcome::Sent { .. } => "sent",
            RelayOutcome::NoMessage(_) => "no_message",
            RelayOutcome::Ignored(_) => "ignored",
            RelayOutcome::Dropped(err) => err.label(),
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, RelayOutcome::Sent { .. })
    }
}

pub struct RelayRouter {
    accounts: Arc<dyn AccountSource>,
    sink: RwLock<Arc<dyn TransportSink>>,
    send_timeout: Duration,
}

impl RelayRouter {
    pub fn new(accounts: Arc<dyn AccountSource>, send_timeout: Duration) -> Self {
        let sink = accounts.selected();
        Self {
            accounts,
            sink: RwLock::new(sink),
            send_timeout,
        }
    }

    /// Re-read the selected account after the host switched accounts.
    ///
    /// Tasks already holding the previous sink finish against it.
    pub async fn reload(&self) {
        let sink = self.accounts.selected();
        *self.sink.write().await = sink;
        info!("Relay account context reloaded");
    }

    /// Work out the message an event produces, without sending it.
    ///
    /// `Ok(None)` for non-producing kinds. A producing kind whose destination
    /// field is unset (chat id 0) is a `MalformedEvent`.
    pub fn plan(event: &StatusEvent) -> RelayResult<Option<(ProtocolMessageType, OutgoingMessage)>> {
        let entry = route(event.kind);
        let (destination, message_type) = match (entry.destination, entry.message_type) {
            (Some(destination), Some(message_type)) if entry.produces_message => {
                (destination, message_type)
            }
            _ => return Ok(None),
        };

        let chat_id = destination.resolve(event);
        if chat_id.is_unset() {
            return Err(RelayError::MalformedEvent(format!(
                "{} requires a {} chat id",
                event.kind,
                destination.as_str()
            )));
        }

        let envelope = ProtocolEnvelope::build(message_type, &event.pdu);
        Ok(Some((message_type, envelope.into_outgoing(chat_id))))
    }

    /// Route, build and send. Never panics and never retries.
    pub async fn relay(&self, event: StatusEvent) -> RelayOutcome {
        self.relay_within(event, None).await
    }

    /// Like `relay`, but the send waits for a permit from `workers`.
    ///
    /// Only the transport send occupies the pool; events that produce no
    /// message or fail to plan finish without waiting.
    pub async fn relay_within(
        &self,
        event: StatusEvent,
        workers: Option<&Semaphore>,
    ) -> RelayOutcome {
        debug!(
            kind = %event.kind,
            chat_id = %event.chat_id,
            forward_chat_id = %event.forward_chat_id,
            "{}",
            event.kind.describe()
        );

        let (message_type, outgoing) = match Self::plan(&event) {
            Ok(Some(planned)) => planned,
            Ok(None) => {
                debug!(kind = %event.kind, "No outgoing message for status");
                return RelayOutcome::NoMessage(event.kind);
            }
            Err(err) => return RelayOutcome::Dropped(err),
        };

        // The pool is never closed, so a failed acquire only means "run unbounded".
        let _permit = match workers {
            Some(workers) => workers.acquire().await.ok(),
            None => None,
        };

        match self.send(&outgoing).await {
            Ok(message_id) => {
                metrics::message_sent(message_type.as_tag());
                debug!(
                    chat_id = %outgoing.destination,
                    message_id = %message_id,
                    type_tag = message_type.as_tag(),
                    "Protocol message sent"
                );
                RelayOutcome::Sent {
                    destination: outgoing.destination,
                    message_id,
                    message_type,
                }
            }
            Err(err) => {
                metrics::send_failed();
                error!(type_tag = message_type.as_tag(), "{}", err);
                RelayOutcome::Dropped(err)
            }
        }
    }

    async fn send(&self, outgoing: &OutgoingMessage) -> RelayResult<MessageId> {
        let sink = self.sink.read().await.clone();
        let chat_id = outgoing.destination;
        let send = sink.send_message(chat_id, &outgoing.subject, &outgoing.text);

        let failure = |reason: String| RelayError::TransportSendFailure { chat_id, reason };

        match tokio::time::timeout(self.send_timeout, AssertUnwindSafe(send).catch_unwind()).await {
            Ok(Ok(Ok(message_id))) => Ok(message_id),
            Ok(Ok(Err(e))) => Err(failure(e.to_string())),
            Ok(Err(_)) => Err(failure("transport panicked".to_string())),
            Err(_) => Err(failure(format!("timed out after {:?}", self.send_timeout))),
        }
    }
}
