//! # Logging
//!
//! Subscriber setup and the diagnostic sink used for buffer dumps.
//!
//! Buffer dumps are expensive to render, so the codec never formats one on
//! its own. It asks a [`DiagnosticSink`] whether the channel is live and
//! hands over `fmt::Arguments` that are only rendered inside `emit`.

use crate::config::LoggingConfig;
use crate::error::{ProtocolError, Result};
use std::fmt;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Tracing target used for packet-level diagnostics
pub const NETWORK_TARGET: &str = "network";

/// Destination for trace-level buffer diagnostics.
pub trait DiagnosticSink {
    /// Whether anything emitted would be recorded.
    fn enabled(&self) -> bool;

    /// Record a rendered diagnostic line.
    fn emit(&self, args: fmt::Arguments<'_>);
}

/// Sink that forwards to `tracing` on the `network` target at TRACE level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn enabled(&self) -> bool {
        tracing::enabled!(target: "network", Level::TRACE)
    }

    fn emit(&self, args: fmt::Arguments<'_>) {
        tracing::trace!(target: "network", "{}", args);
    }
}

/// Sink that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn enabled(&self) -> bool {
        false
    }

    fn emit(&self, _args: fmt::Arguments<'_>) {}
}

/// Build the filter directive for a logging configuration.
pub fn filter_directive(config: &LoggingConfig) -> String {
    let level = config.log_level.to_string().to_lowercase();
    if config.packet_trace {
        format!("{level},{NETWORK_TARGET}=trace")
    } else {
        level
    }
}

/// Install a global `tracing` subscriber built from `config`.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(filter_directive(config))
        .map_err(|e| ProtocolError::ConfigError(format!("Invalid log filter: {e}")))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| {
        ProtocolError::ConfigError(format!("Failed to install subscriber: {e}"))
    })?;

    tracing::info!(app = %config.app_name, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_plain() {
        let config = LoggingConfig::default();
        assert_eq!(filter_directive(&config), "info");
    }

    #[test]
    fn test_filter_directive_with_packet_trace() {
        let config = LoggingConfig {
            log_level: Level::WARN,
            packet_trace: true,
            ..LoggingConfig::default()
        };
        assert_eq!(filter_directive(&config), "warn,network=trace");
    }

    #[test]
    fn test_null_sink_is_disabled() {
        assert!(!NullSink.enabled());
    }
}
