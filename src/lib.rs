//! # World Protocol
//!
//! Binary wire codec and packet envelope for a multiplayer world server.
//!
//! Raw, opcode-tagged payloads come in from the transport and are wrapped in
//! a [`Packet`]. An [`Inbound`] schema reads them into typed structs. Replies
//! go the other way: a typed struct is written through its [`Outbound`] schema
//! and the finished bytes are handed back to the transport.
//!
//! ## Modules
//! - [`core`]: the [`PacketBuffer`] codec and the packet envelope
//! - [`protocol`]: opcodes, packet schemas, and dispatch
//! - [`config`]: TOML/env configuration and validation
//! - [`utils`]: logging setup, diagnostic sinks, metrics
//!
//! Framing, compression, encryption, and session handling belong to the
//! transport and are not part of this crate.
//!
//! ## Example
//! ```rust
//! use world_protocol::{Inbound, Outbound, Packet};
//! use world_protocol::protocol::opcode::ClientOpcode;
//! use world_protocol::protocol::taxi::{ActivateTaxiReply, ActivateTaxiResult, TaxiNodeStatusQuery};
//!
//! # fn main() -> world_protocol::Result<()> {
//! let query = Packet::inbound(ClientOpcode::TaxiNodeStatusQuery, vec![0u8; 16])?;
//! let query = TaxiNodeStatusQuery::decode(query)?;
//! assert!(query.unit_guid.is_empty());
//!
//! let reply = ActivateTaxiReply::new(ActivateTaxiResult::TooFarAway).encode()?;
//! assert_eq!(reply.contents(), &[4]);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod utils;

pub use crate::core::buffer::PacketBuffer;
pub use crate::core::packet::{Inbound, Outbound, Packet};
pub use crate::error::{ProtocolError, Result};
