//! Vault-to-chat protocol relay
//!
//! Bridges status events from the local secure vault onto the chat transport
//! and unwraps protocol messages arriving from peers.

pub mod background;
pub mod codec;
pub mod dispatch;
pub mod envelope;
pub mod errors;
pub mod inbound;
pub mod metrics;
pub mod route_table;
pub mod router;
pub mod status;
pub mod transport;

#[cfg(test)]
mod tests;

pub use background::{BackgroundTaskGuard, BackgroundTaskHost, BackgroundTaskId, NoopBackgroundHost};
pub use codec::CodecError;
pub use dispatch::Dispatcher;
pub use envelope::{
    is_protocol_subject, parse_subject, render_subject, OutgoingMessage, ProtocolEnvelope,
    ProtocolMessageType, PROTOCOL_MARKER,
};
pub use errors::{RelayError, RelayResult};
pub use inbound::{decode_incoming, VaultEvent, VaultEventKind};
pub use route_table::{route, Destination, RouteEntry};
pub use router::{RelayOutcome, RelayRouter};
pub use status::{ChatId, MessageId, RawStatusEvent, StatusEvent, StatusKind};
pub use transport::{AccountSource, SingleAccount, SinkError, TransportSink};
