//! # Error Types
//!
//! Error handling for the wire codec and packet envelope.
//!
//! Every read and write accessor returns a [`Result`]; nothing in this crate
//! panics on malformed input, and nothing decides to drop a peer. Callers get
//! the failure and choose what to do with the packet and the session.
//!
//! ## Error Categories
//! - **Position Errors**: fewer bytes or bits remain than the operation needs
//! - **Invalid Values**: enough bytes, bad content (malformed UTF-8, non-finite floats)
//! - **Capacity Errors**: an append would push the buffer past its ceiling
//! - **Opcode Errors**: unknown identifiers or a packet fed to the wrong schema
//! - **Configuration Errors**: unreadable or invalid TOML settings
//!
//! ## Example Usage
//! ```rust
//! use world_protocol::core::buffer::PacketBuffer;
//! use world_protocol::error::ProtocolError;
//! use tracing::{error, info};
//!
//! # fn main() -> world_protocol::error::Result<()> {
//! let mut buf = PacketBuffer::from_vec(vec![0x01, 0x02])?;
//! match buf.read::<u32>() {
//!     Ok(value) => info!(value, "Read value"),
//!     Err(ProtocolError::Position { pos, size, value_size }) => {
//!         error!(pos, size, value_size, "Truncated payload")
//!     }
//!     Err(e) => error!(error = %e, "Malformed payload"),
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Dispatcher-related error messages
    pub const ERR_DISPATCHER_WRITE_LOCK: &str = "Failed to acquire write lock on dispatcher";
    pub const ERR_DISPATCHER_READ_LOCK: &str = "Failed to acquire read lock on dispatcher";

    /// Value kind reported by `InvalidValue` for malformed text
    pub const KIND_STRING: &str = "string";

    /// Trailing bytes left after a schema finished reading
    pub const WARN_TRAILING_BYTES: &str = "Packet has unprocessed tail data";
}

/// ProtocolError is the primary error type for all codec and packet operations
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    #[serde(skip_serializing, skip_deserializing)]
    Io(#[from] io::Error),

    #[error("Attempted to get value with size: {value_size} in buffer (pos: {pos} size: {size})")]
    Position {
        pos: usize,
        size: usize,
        value_size: usize,
    },

    #[error("Invalid {kind} value ({value}) found in buffer")]
    InvalidValue { kind: String, value: String },

    #[error("Buffer size {size} would exceed the payload ceiling of {limit} bytes")]
    CapacityExceeded { size: usize, limit: usize },

    #[error("Attempted to put a zero-sized value in buffer (pos: {pos} size: {size})")]
    ZeroSizedWrite { pos: usize, size: usize },

    #[error("Invalid bit count: {0} (valid range: 1-64)")]
    BitCount(u32),

    #[error("Unknown opcode: 0x{0:04X}")]
    UnknownOpcode(u32),

    #[error("Opcode mismatch: expected {expected}, got {actual}")]
    UnexpectedOpcode { expected: String, actual: String },

    #[error("Unexpected message type")]
    UnexpectedMessage,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl ProtocolError {
    /// Build an `InvalidValue` error for a string that failed UTF-8 validation.
    pub(crate) fn invalid_string(raw: &[u8]) -> Self {
        ProtocolError::InvalidValue {
            kind: constants::KIND_STRING.to_string(),
            value: String::from_utf8_lossy(raw).into_owned(),
        }
    }

    /// True for errors caused by the peer's bytes rather than local misuse.
    ///
    /// The transport uses this to decide between dropping the packet and
    /// flagging the session.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            ProtocolError::Position { .. }
                | ProtocolError::InvalidValue { .. }
                | ProtocolError::CapacityExceeded { .. }
                | ProtocolError::UnknownOpcode(_)
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
