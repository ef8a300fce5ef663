//! # Packet Envelope
//!
//! A [`Packet`] binds one opcode to one [`PacketBuffer`]. Concrete packet
//! types describe their wire schema through two traits:
//!
//! - [`Inbound`]: `read` walks the schema front to back and builds the typed
//!   value. `decode` consumes the packet, so a payload is read exactly once.
//! - [`Outbound`]: `write` pushes the fields in schema order; `encode`
//!   produces a finished packet ready for the transport.
//!
//! The schema is positional. Producer and consumer must agree on field order,
//! width, and how presence flags are packed; nothing in the stream describes
//! itself.
//!
//! ## Example
//! ```rust
//! use world_protocol::core::packet::{Inbound, Outbound, Packet};
//! use world_protocol::protocol::taxi::NewTaxiPath;
//!
//! # fn main() -> world_protocol::error::Result<()> {
//! let packet = NewTaxiPath { taxi_nodes_id: -42 }.encode()?;
//! let (opcode, bytes) = packet.into_parts();
//!
//! let received = Packet::inbound(opcode, bytes.to_vec())?;
//! assert_eq!(NewTaxiPath::decode(received)?.taxi_nodes_id, -42);
//! # Ok(())
//! # }
//! ```

use crate::config::MAX_PAYLOAD_SIZE;
use crate::core::buffer::PacketBuffer;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::opcode::{Direction, Opcode};
use bytes::Bytes;
use tracing::{debug, warn};

/// One opcode plus the buffer carrying its payload
#[derive(Debug)]
pub struct Packet {
    opcode: Opcode,
    buffer: PacketBuffer,
}

impl Packet {
    /// Wrap an already-received payload. The bytes are moved, not copied.
    pub fn inbound(opcode: impl Into<Opcode>, payload: Vec<u8>) -> Result<Self> {
        Self::inbound_with_limit(opcode, payload, MAX_PAYLOAD_SIZE)
    }

    /// Like [`inbound`](Self::inbound) with a custom payload ceiling.
    pub fn inbound_with_limit(
        opcode: impl Into<Opcode>,
        payload: Vec<u8>,
        limit: usize,
    ) -> Result<Self> {
        Ok(Self {
            opcode: opcode.into(),
            buffer: PacketBuffer::from_vec_with_limit(payload, limit)?,
        })
    }

    /// Empty packet ready for writing. `size_hint` only sets initial capacity.
    pub fn outbound(opcode: impl Into<Opcode>, size_hint: usize) -> Self {
        Self::outbound_with_limit(opcode, size_hint, MAX_PAYLOAD_SIZE)
    }

    /// Like [`outbound`](Self::outbound) with a custom payload ceiling.
    pub fn outbound_with_limit(opcode: impl Into<Opcode>, size_hint: usize, limit: usize) -> Self {
        Self {
            opcode: opcode.into(),
            buffer: PacketBuffer::with_limit(size_hint, limit),
        }
    }

    #[inline]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.opcode.direction()
    }

    #[inline]
    pub fn buffer(&self) -> &PacketBuffer {
        &self.buffer
    }

    #[inline]
    pub fn buffer_mut(&mut self) -> &mut PacketBuffer {
        &mut self.buffer
    }

    /// Finished payload bytes
    #[inline]
    pub fn contents(&self) -> &[u8] {
        self.buffer.contents()
    }

    /// Hand the payload to the transport without copying it.
    pub fn into_parts(self) -> (Opcode, Bytes) {
        (self.opcode, self.buffer.into_bytes())
    }

    pub fn into_buffer(self) -> PacketBuffer {
        self.buffer
    }
}

/// A packet type that can be parsed from its wire schema.
pub trait Inbound: Sized {
    const OPCODE: Opcode;

    /// Read every field in schema order.
    fn read(buf: &mut PacketBuffer) -> Result<Self>;

    /// Consume `packet` and parse it.
    ///
    /// Fails if the packet carries a different opcode. Unread trailing bytes
    /// are logged but not treated as an error.
    fn decode(packet: Packet) -> Result<Self> {
        Self::decode_with(packet, true)
    }

    /// [`decode`](Self::decode) with control over the trailing-bytes warning.
    fn decode_with(mut packet: Packet, warn_on_trailing: bool) -> Result<Self> {
        if packet.opcode != Self::OPCODE {
            return Err(ProtocolError::UnexpectedOpcode {
                expected: Self::OPCODE.to_string(),
                actual: packet.opcode.to_string(),
            });
        }

        let value = Self::read(&mut packet.buffer)?;

        let trailing = packet.buffer.remaining();
        if warn_on_trailing && trailing > 0 {
            warn!(
                opcode = %packet.opcode,
                read = packet.buffer.rpos(),
                size = packet.buffer.size(),
                trailing,
                "{}",
                constants::WARN_TRAILING_BYTES
            );
        }

        debug!(opcode = %packet.opcode, size = packet.buffer.size(), "Packet decoded");
        Ok(value)
    }
}

/// A packet type that can be serialized into its wire schema.
pub trait Outbound {
    const OPCODE: Opcode;

    /// Expected payload size, used as the initial capacity
    const SIZE_HINT: usize = 0;

    /// Write every field in schema order.
    fn write(&self, buf: &mut PacketBuffer) -> Result<()>;

    /// Build a finished packet.
    fn encode(&self) -> Result<Packet> {
        self.encode_with_limit(MAX_PAYLOAD_SIZE)
    }

    /// [`encode`](Self::encode) under a custom payload ceiling.
    fn encode_with_limit(&self, limit: usize) -> Result<Packet> {
        let mut packet = Packet::outbound_with_limit(Self::OPCODE, Self::SIZE_HINT, limit);
        self.write(&mut packet.buffer)?;
        packet.buffer.flush_bits()?;

        debug!(opcode = %packet.opcode, size = packet.buffer.size(), "Packet encoded");
        Ok(packet)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::protocol::opcode::{ClientOpcode, ServerOpcode};

    struct Ping {
        stamp: u32,
    }

    impl Inbound for Ping {
        const OPCODE: Opcode = Opcode::Client(ClientOpcode::TaxiRequestEarlyLanding);

        fn read(buf: &mut PacketBuffer) -> Result<Self> {
            Ok(Self {
                stamp: buf.read()?,
            })
        }
    }

    struct Flags {
        bits: u8,
    }

    impl Outbound for Flags {
        const OPCODE: Opcode = Opcode::Server(ServerOpcode::ActivateTaxiReply);
        const SIZE_HINT: usize = 1;

        fn write(&self, buf: &mut PacketBuffer) -> Result<()> {
            buf.write_bits(u64::from(self.bits), 3)
        }
    }

    #[test]
    fn test_decode_checks_opcode() {
        let packet = Packet::inbound(ClientOpcode::ActivateTaxi, vec![0; 4]).unwrap();
        assert!(matches!(
            Ping::decode(packet),
            Err(ProtocolError::UnexpectedOpcode { .. })
        ));
    }

    #[test]
    fn test_decode_tolerates_trailing_bytes() {
        let packet =
            Packet::inbound(ClientOpcode::TaxiRequestEarlyLanding, vec![1, 0, 0, 0, 9]).unwrap();
        assert_eq!(Ping::decode(packet).unwrap().stamp, 1);
    }

    #[test]
    fn test_encode_flushes_trailing_bits() {
        let packet = Flags { bits: 0b101 }.encode().unwrap();
        assert_eq!(packet.contents(), &[0b1010_0000]);
        assert_eq!(packet.direction(), Direction::ServerToClient);
    }

    #[test]
    fn test_inbound_ceiling() {
        let err = Packet::inbound_with_limit(ClientOpcode::ActivateTaxi, vec![0; 65], 64)
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::CapacityExceeded { size: 65, limit: 64 }
        ));
    }

    #[test]
    fn test_huge_size_hint_does_not_abort() {
        let mut packet = Packet::outbound(ServerOpcode::NewTaxiPath, usize::MAX);
        assert!(packet.contents().is_empty());
        packet.buffer_mut().write(1i32).unwrap();
        assert_eq!(packet.contents(), &1i32.to_le_bytes());
    }

    #[test]
    fn test_encode_respects_limit() {
        let err = Flags { bits: 1 }.encode_with_limit(0).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::CapacityExceeded { size: 1, limit: 0 }
        ));
    }

    #[test]
    fn test_into_parts_moves_payload() {
        let mut packet = Packet::outbound(ServerOpcode::NewTaxiPath, 4);
        packet.buffer_mut().write(7i32).unwrap();
        let ptr = packet.contents().as_ptr();

        let (opcode, bytes) = packet.into_parts();
        assert_eq!(opcode, Opcode::Server(ServerOpcode::NewTaxiPath));
        assert_eq!(bytes.as_ptr(), ptr);
        assert_eq!(&bytes[..], &7i32.to_le_bytes());
    }
}
