//! # Utility Modules
//!
//! Supporting utilities for logging and observability.
//!
//! ## Components
//! - **Logging**: subscriber setup and the diagnostic sink used for buffer dumps
//! - **Metrics**: thread-safe packet counters

pub mod logging;
pub mod metrics;

pub use logging::{DiagnosticSink, TracingSink};
