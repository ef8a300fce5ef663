//! Property-based tests using proptest
//!
//! These tests validate codec invariants across a wide range of randomly
//! generated inputs: scalar encoding, bit packing, fail-closed reads and
//! buffer growth.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use world_protocol::core::buffer::PacketBuffer;
use world_protocol::error::ProtocolError;

// Property: every integer scalar reads back as written, little-endian on the wire
proptest! {
    #[test]
    fn prop_integer_scalars_roundtrip(a in any::<u8>(), b in any::<i16>(), c in any::<u32>(), d in any::<i64>()) {
        let mut buf = PacketBuffer::new();
        buf.write(a).unwrap();
        buf.write(b).unwrap();
        buf.write(c).unwrap();
        buf.write(d).unwrap();

        prop_assert_eq!(buf.size(), 1 + 2 + 4 + 8);
        prop_assert_eq!(&buf.contents()[3..7], &c.to_le_bytes());

        prop_assert_eq!(buf.read::<u8>().unwrap(), a);
        prop_assert_eq!(buf.read::<i16>().unwrap(), b);
        prop_assert_eq!(buf.read::<u32>().unwrap(), c);
        prop_assert_eq!(buf.read::<i64>().unwrap(), d);
        prop_assert_eq!(buf.remaining(), 0);
    }
}

// Property: finite floats read back bit-exact
proptest! {
    #[test]
    fn prop_finite_floats_roundtrip(x in proptest::num::f32::NORMAL | proptest::num::f32::ZERO, y in proptest::num::f64::NORMAL | proptest::num::f64::SUBNORMAL) {
        let mut buf = PacketBuffer::new();
        buf.write(x).unwrap();
        buf.write(y).unwrap();

        prop_assert_eq!(buf.read::<f32>().unwrap().to_bits(), x.to_bits());
        prop_assert_eq!(buf.read::<f64>().unwrap().to_bits(), y.to_bits());
    }
}

// Property: a bit run written at any offset reads back intact
proptest! {
    #[test]
    fn prop_write_bits_read_bits(offset in 0u32..8, count in 1u32..=32, value in any::<u32>()) {
        let value = u64::from(value) & ((1u64 << count) - 1);

        let mut buf = PacketBuffer::new();
        if offset > 0 {
            buf.write_bits(0, offset).unwrap();
        }
        buf.write_bits(value, count).unwrap();
        buf.flush_bits().unwrap();

        prop_assert_eq!(buf.size(), (offset + count).div_ceil(8) as usize);

        if offset > 0 {
            prop_assert_eq!(buf.read_bits(offset).unwrap(), 0);
        }
        prop_assert_eq!(buf.read_bits(count).unwrap(), value);
    }
}

// Property: put_bits replaces exactly the target run and keeps every other bit
proptest! {
    #[test]
    fn prop_put_bits_preserves_neighbours(
        fill in any::<u8>(),
        offset in 0usize..8,
        count in 1u32..=32,
        value in any::<u32>(),
    ) {
        let value = u64::from(value) & ((1u64 << count) - 1);

        let mut buf = PacketBuffer::new();
        buf.append(&[fill; 6]).unwrap();
        buf.put_bits(offset, value, count).unwrap();

        let end = offset + count as usize;
        for bit in 0..48 {
            let byte = buf.contents()[bit / 8];
            let actual = (byte >> (7 - bit % 8)) & 1;
            let expected = if bit >= offset && bit < end {
                ((value >> (end - bit - 1)) & 1) as u8
            } else {
                (fill >> (7 - bit % 8)) & 1
            };
            prop_assert_eq!(actual, expected, "bit {}", bit);
        }

        buf.set_rpos(0).unwrap();
        if offset > 0 {
            buf.read_bits(offset as u32).unwrap();
        }
        prop_assert_eq!(buf.read_bits(count).unwrap(), value);
    }
}

// Property: a read that runs out of bytes fails and leaves the cursor alone
proptest! {
    #[test]
    fn prop_short_reads_are_fail_closed(payload in prop::collection::vec(any::<u8>(), 0..8), prefix in 0usize..8) {
        let prefix = prefix.min(payload.len());
        let len = payload.len();
        let mut buf = PacketBuffer::from_vec(payload).unwrap();
        buf.read_skip(prefix).unwrap();

        let rpos = buf.rpos();
        let err = buf.read::<u64>().unwrap_err();
        prop_assert!(
            matches!(err, ProtocolError::Position { value_size: 8, .. }),
            "unexpected error: {}",
            err
        );
        prop_assert_eq!(buf.rpos(), rpos);

        prop_assert!(buf.read_bytes(len - prefix + 1).is_err());
        prop_assert_eq!(buf.rpos(), rpos);
        prop_assert_eq!(buf.read_bytes(len - prefix).unwrap().len(), len - prefix);
    }
}

// Property: capacity never shrinks and always covers the stored bytes
proptest! {
    #[test]
    fn prop_capacity_monotonic(chunks in prop::collection::vec(1usize..2000, 1..20)) {
        let mut buf = PacketBuffer::new();
        let mut last_capacity = buf.capacity();

        for len in chunks {
            buf.append(&vec![0xA5; len]).unwrap();
            prop_assert!(buf.capacity() >= last_capacity);
            prop_assert!(buf.capacity() >= buf.size());
            last_capacity = buf.capacity();
        }
    }
}

// Property: arbitrary bytes never make the validated string reader panic
proptest! {
    #[test]
    fn prop_string_reads_validate(payload in prop::collection::vec(any::<u8>(), 0..64)) {
        let expected_ok = std::str::from_utf8(&payload).is_ok();
        let len = payload.len();
        let mut buf = PacketBuffer::from_vec(payload).unwrap();

        let result = buf.read_string(len).map(str::to_owned);
        prop_assert_eq!(result.is_ok(), expected_ok);
        if !expected_ok {
            prop_assert_eq!(buf.rpos(), 0);
        }
    }
}
