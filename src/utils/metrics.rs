//! Observability and Metrics
//!
//! Packet-level counters for the codec and dispatcher.
//!
//! Uses atomic counters for thread-safe metrics collection. A single
//! `Metrics` can be shared by every session's dispatcher.

use crate::error::ProtocolError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Packet metrics collector
#[derive(Debug)]
pub struct Metrics {
    /// Inbound packets handed to the dispatcher
    pub packets_received: AtomicU64,
    /// Outbound packets produced by handlers
    pub packets_sent: AtomicU64,
    /// Inbound payload bytes
    pub bytes_received: AtomicU64,
    /// Outbound payload bytes
    pub bytes_sent: AtomicU64,
    /// Reads that ran out of bytes
    pub position_errors: AtomicU64,
    /// Reads that found malformed content
    pub invalid_value_errors: AtomicU64,
    /// Payloads or writes rejected by the size ceiling
    pub capacity_errors: AtomicU64,
    /// Opcodes outside the catalog
    pub unknown_opcodes: AtomicU64,
    /// Known opcodes with no registered handler
    pub unhandled_opcodes: AtomicU64,
    /// Handlers that returned an error
    pub handler_errors: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            packets_received: AtomicU64::new(0),
            packets_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            position_errors: AtomicU64::new(0),
            invalid_value_errors: AtomicU64::new(0),
            capacity_errors: AtomicU64::new(0),
            unknown_opcodes: AtomicU64::new(0),
            unhandled_opcodes: AtomicU64::new(0),
            handler_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record an inbound packet
    pub fn packet_received(&self, byte_count: u64) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record an outbound packet
    pub fn packet_sent(&self, byte_count: u64) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a codec failure under its category
    pub fn codec_error(&self, error: &ProtocolError) {
        let counter = match error {
            ProtocolError::Position { .. } => &self.position_errors,
            ProtocolError::InvalidValue { .. } => &self.invalid_value_errors,
            ProtocolError::CapacityExceeded { .. } => &self.capacity_errors,
            ProtocolError::UnknownOpcode(_) => &self.unknown_opcodes,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a packet nobody handles
    pub fn unhandled_opcode(&self) {
        self.unhandled_opcodes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failing handler
    pub fn handler_error(&self) {
        self.handler_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            packets_received: self.packets_received.load(Ordering::Relaxed),
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            position_errors: self.position_errors.load(Ordering::Relaxed),
            invalid_value_errors: self.invalid_value_errors.load(Ordering::Relaxed),
            capacity_errors: self.capacity_errors.load(Ordering::Relaxed),
            unknown_opcodes: self.unknown_opcodes.load(Ordering::Relaxed),
            unhandled_opcodes: self.unhandled_opcodes.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            packets_received = snapshot.packets_received,
            packets_sent = snapshot.packets_sent,
            bytes_received = snapshot.bytes_received,
            bytes_sent = snapshot.bytes_sent,
            position_errors = snapshot.position_errors,
            invalid_value_errors = snapshot.invalid_value_errors,
            capacity_errors = snapshot.capacity_errors,
            unknown_opcodes = snapshot.unknown_opcodes,
            unhandled_opcodes = snapshot.unhandled_opcodes,
            handler_errors = snapshot.handler_errors,
            uptime_seconds = snapshot.uptime_seconds,
            "Packet metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub packets_received: u64,
    pub packets_sent: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub position_errors: u64,
    pub invalid_value_errors: u64,
    pub capacity_errors: u64,
    pub unknown_opcodes: u64,
    pub unhandled_opcodes: u64,
    pub handler_errors: u64,
    pub uptime_seconds: u64,
}

impl MetricsSnapshot {
    /// Inbound packets rejected by the codec
    pub fn malformed_total(&self) -> u64 {
        self.position_errors + self.invalid_value_errors + self.capacity_errors + self.unknown_opcodes
    }
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}
