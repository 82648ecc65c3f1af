//! keyrelay core
//!
//! Relays secure-vault status events onto a store-and-forward chat transport
//! as protocol messages, and unwraps such messages on the receiving side.

pub mod config;
pub mod core_relay;
pub mod logging;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{Config, ConfigError, DispatchConfig};
pub use core_relay::{
    decode_incoming, ChatId, Dispatcher, MessageId, RawStatusEvent, RelayError, RelayOutcome,
    RelayRouter, StatusEvent, StatusKind, TransportSink,
};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogLevel};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _ = LogLevel::Info;
        assert_eq!(StatusKind::ALL.len(), 35);
        assert!(Config::default().validate().is_ok());
    }
}
