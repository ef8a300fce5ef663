//! 128-bit entity identifier.

use crate::core::buffer::PacketBuffer;
use crate::error::Result;
use std::fmt;

/// Wire width of an [`ObjectGuid`]
pub const GUID_SIZE: usize = 16;

/// Identifies a world entity. Travels as 16 bytes: low half, then high half.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectGuid {
    pub high: u64,
    pub low: u64,
}

impl ObjectGuid {
    pub const EMPTY: ObjectGuid = ObjectGuid { high: 0, low: 0 };

    pub const fn new(high: u64, low: u64) -> Self {
        Self { high, low }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    pub fn read(buf: &mut PacketBuffer) -> Result<Self> {
        // checked up front so a short buffer does not consume the low half
        let raw = buf.read_bytes(GUID_SIZE)?;
        let mut low = [0u8; 8];
        let mut high = [0u8; 8];
        low.copy_from_slice(&raw[..8]);
        high.copy_from_slice(&raw[8..]);
        Ok(Self {
            high: u64::from_le_bytes(high),
            low: u64::from_le_bytes(low),
        })
    }

    pub fn write(&self, buf: &mut PacketBuffer) -> Result<()> {
        let mut raw = [0u8; GUID_SIZE];
        raw[..8].copy_from_slice(&self.low.to_le_bytes());
        raw[8..].copy_from_slice(&self.high.to_le_bytes());
        buf.append(&raw)
    }
}

impl fmt::Display for ObjectGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}{:016X}", self.high, self.low)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_low_then_high() {
        let mut buf = PacketBuffer::new();
        ObjectGuid::new(0x0200_0000_0000_0001, 0x0000_0000_0000_00FF)
            .write(&mut buf)
            .unwrap();

        let bytes = buf.contents();
        assert_eq!(bytes.len(), GUID_SIZE);
        assert_eq!(bytes[0], 0xFF);
        assert_eq!(bytes[8], 0x01);
        assert_eq!(bytes[15], 0x02);
    }

    #[test]
    fn test_short_read_consumes_nothing() {
        let mut buf = PacketBuffer::from_vec(vec![0; 15]).unwrap();
        assert!(ObjectGuid::read(&mut buf).is_err());
        assert_eq!(buf.rpos(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ObjectGuid::new(1, 2).to_string(),
            "0x00000000000000010000000000000002"
        );
        assert!(ObjectGuid::default().is_empty());
    }
}
