//! # Core Codec Components
//!
//! Byte-level packet storage and the packet envelope.
//!
//! ## Components
//! - **Scalar**: fixed-width little-endian encodings
//! - **Buffer**: growable storage with read/write/bit cursors
//! - **Packet**: opcode + buffer, and the `Inbound`/`Outbound` schema traits
//!
//! ## Security
//! - Maximum payload size: 100MB (prevents memory exhaustion)
//! - Every read is bounds-checked and fail-closed
//! - Text is UTF-8 validated unless the caller explicitly asks for raw bytes

pub mod buffer;
pub mod packet;
pub mod scalar;
