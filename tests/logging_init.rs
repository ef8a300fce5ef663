//! Global subscriber installation
//!
//! Lives in its own test binary: a process can install only one subscriber.

#![allow(clippy::expect_used, clippy::panic)]

use tracing::Level;
use world_protocol::config::LoggingConfig;
use world_protocol::error::ProtocolError;
use world_protocol::utils::logging::init_logging;
use world_protocol::utils::{DiagnosticSink, TracingSink};

#[test]
fn test_init_logging_installs_once() {
    let config = LoggingConfig {
        log_level: Level::WARN,
        packet_trace: true,
        ..LoggingConfig::default()
    };

    init_logging(&config).expect("first install succeeds");
    assert!(TracingSink.enabled());

    match init_logging(&config) {
        Err(ProtocolError::ConfigError(message)) => {
            assert!(message.contains("Failed to install subscriber"))
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}
