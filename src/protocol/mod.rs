//! # Protocol Layer
//!
//! Opcode catalog, packet schemas, and opcode dispatch.
//!
//! ## Components
//! - **Opcode**: direction-tagged packet identifiers
//! - **Guid**: the 16-byte entity identifier shared by most schemas
//! - **Taxi**: flight-master packet family
//! - **Dispatcher**: static opcode table plus handler routing

pub mod dispatcher;
pub mod guid;
pub mod opcode;
pub mod taxi;
