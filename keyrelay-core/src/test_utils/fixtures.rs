//! Test fixtures for the relay
//!
//! Fake transport sinks with scripted behaviour, a counting background host
//! and factory functions wiring them into a router or dispatcher.

use crate::config::DispatchConfig;
use crate::core_relay::{
    AccountSource, BackgroundTaskHost, BackgroundTaskId, ChatId, Dispatcher, MessageId,
    OutgoingMessage, RawStatusEvent, RelayRouter, SingleAccount, SinkError, StatusKind,
    TransportSink,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex, Notify};

/// Sink that accepts everything and records what it was given
pub struct RecordingSink {
    sent: Mutex<Vec<OutgoingMessage>>,
    notify_tx: mpsc::UnboundedSender<OutgoingMessage>,
    next_id: AtomicU32,
}

impl RecordingSink {
    /// Create a sink and a receiver yielding every accepted message
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<OutgoingMessage>) {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let sink = Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            notify_tx,
            next_id: AtomicU32::new(1),
        });
        (sink, notify_rx)
    }

    pub async fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl TransportSink for RecordingSink {
    async fn send_message(
        &self,
        chat_id: ChatId,
        subject: &str,
        text: &str,
    ) -> Result<MessageId, SinkError> {
        let message = OutgoingMessage {
            destination: chat_id,
            subject: subject.to_string(),
            text: text.to_string(),
        };
        self.sent.lock().await.push(message.clone());
        let _ = self.notify_tx.send(message);
        Ok(MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }
}

/// Sink that rejects every message
pub struct FailingSink {
    attempts: AtomicU32,
}

impl FailingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicU32::new(0),
        })
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransportSink for FailingSink {
    async fn send_message(&self, _chat_id: ChatId, _subject: &str, _text: &str) -> Result<MessageId, SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Rejected("chat is read-only".to_string()))
    }
}

/// Sink that panics inside `send_message`
pub struct PanickingSink;

#[async_trait]
impl TransportSink for PanickingSink {
    async fn send_message(&self, chat_id: ChatId, _subject: &str, _text: &str) -> Result<MessageId, SinkError> {
        panic!("transport exploded while sending to chat {}", chat_id);
    }
}

/// Sink whose sends never complete
pub struct StallingSink;

#[async_trait]
impl TransportSink for StallingSink {
    async fn send_message(&self, _chat_id: ChatId, _subject: &str, _text: &str) -> Result<MessageId, SinkError> {
        futures::future::pending::<()>().await;
        Err(SinkError::Unavailable("unreachable".to_string()))
    }
}

/// Sink that holds sends to `gated_chat` until a send to any other chat
/// happens. If relay tasks blocked each other, the gated send would never
/// be released.
pub struct GatedSink {
    gated_chat: ChatId,
    gate: Notify,
    inner: Arc<RecordingSink>,
}

impl GatedSink {
    pub fn new(gated_chat: ChatId) -> (Arc<Self>, mpsc::UnboundedReceiver<OutgoingMessage>) {
        let (inner, rx) = RecordingSink::new();
        let sink = Arc::new(Self {
            gated_chat,
            gate: Notify::new(),
            inner,
        });
        (sink, rx)
    }
}

#[async_trait]
impl TransportSink for GatedSink {
    async fn send_message(&self, chat_id: ChatId, subject: &str, text: &str) -> Result<MessageId, SinkError> {
        if chat_id == self.gated_chat {
            self.gate.notified().await;
        } else {
            self.gate.notify_one();
        }
        self.inner.send_message(chat_id, subject, text).await
    }
}

/// Account source whose selection can be switched at runtime
pub struct SwitchableAccounts {
    selected: RwLock<Arc<dyn TransportSink>>,
}

impl SwitchableAccounts {
    pub fn new(initial: Arc<dyn TransportSink>) -> Arc<Self> {
        Arc::new(Self {
            selected: RwLock::new(initial),
        })
    }

    pub fn select(&self, sink: Arc<dyn TransportSink>) {
        if let Ok(mut selected) = self.selected.write() {
            *selected = sink;
        }
    }
}

impl AccountSource for SwitchableAccounts {
    fn selected(&self) -> Arc<dyn TransportSink> {
        match self.selected.read() {
            Ok(selected) => selected.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Background host counting begin/end calls
#[derive(Default)]
pub struct CountingHost {
    begun: AtomicU64,
    ended: AtomicU64,
}

impl CountingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn begun(&self) -> u64 {
        self.begun.load(Ordering::SeqCst)
    }

    pub fn ended(&self) -> u64 {
        self.ended.load(Ordering::SeqCst)
    }
}

impl BackgroundTaskHost for CountingHost {
    fn begin(&self, _name: &str) -> BackgroundTaskId {
        BackgroundTaskId(self.begun.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn end(&self, _id: BackgroundTaskId) {
        self.ended.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fully populated raw event for a known kind
pub fn raw_event(kind: StatusKind, chat_id: i64, forward_chat_id: i64, pdu: &[u8]) -> RawStatusEvent {
    RawStatusEvent::new(kind.code(), chat_id, forward_chat_id, pdu.to_vec())
}

/// Router over a single fixed sink
pub fn router_with(sink: Arc<dyn TransportSink>) -> Arc<RelayRouter> {
    router_with_timeout(sink, DispatchConfig::default().send_timeout)
}

pub fn router_with_timeout(sink: Arc<dyn TransportSink>, send_timeout: Duration) -> Arc<RelayRouter> {
    Arc::new(RelayRouter::new(Arc::new(SingleAccount::new(sink)), send_timeout))
}

/// Dispatcher on the current runtime with default settings
pub fn dispatcher_with(sink: Arc<dyn TransportSink>) -> Dispatcher {
    Dispatcher::new(Handle::current(), router_with(sink), &DispatchConfig::default())
}
