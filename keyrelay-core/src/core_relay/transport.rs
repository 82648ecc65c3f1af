//! Transport sink bridge
//!
//! Interface to the messaging core's send primitive. The relay never talks to
//! the network itself; it hands a subject and text to whatever account is
//! currently selected on the host.

use super::status::{ChatId, MessageId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The messaging core refused the message
    #[error("Message rejected: {0}")]
    Rejected(String),

    /// The messaging core is not in a state to send (no account, shut down)
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Messaging core send primitive.
///
/// Implementations must be safe to call from many tasks at once; the relay
/// adds no locking of its own around `send_message`.
#[async_trait]
pub trait TransportSink: Send + Sync {
    /// Queue a text message with the given subject on a chat
    async fn send_message(
        &self,
        chat_id: ChatId,
        subject: &str,
        text: &str,
    ) -> Result<MessageId, SinkError>;
}

/// Source of the currently selected account's sink.
///
/// Injected into the router at construction; the router re-reads it only
/// when told to via `RelayRouter::reload`.
pub trait AccountSource: Send + Sync {
    fn selected(&self) -> Arc<dyn TransportSink>;
}

/// Account source with one fixed sink
pub struct SingleAccount {
    sink: Arc<dyn TransportSink>,
}

impl SingleAccount {
    pub fn new(sink: Arc<dyn TransportSink>) -> Self {
        Self { sink }
    }
}

impl AccountSource for SingleAccount {
    fn selected(&self) -> Arc<dyn TransportSink> {
        self.sink.clone()
    }
}
