//! Bit-exact wire checks against hand-built byte sequences

#![allow(clippy::unwrap_used, clippy::expect_used)]

use world_protocol::core::buffer::PacketBuffer;
use world_protocol::protocol::opcode::ServerOpcode;
use world_protocol::protocol::taxi::{ActivateTaxiReply, NewTaxiPath, NodeMask, ShowTaxiNodes};
use world_protocol::{Inbound, Outbound, Packet};

#[test]
fn test_bits_are_msb_first() {
    let mut buf = PacketBuffer::new();
    buf.write_bit(true).unwrap();
    buf.write_bits(0b011, 3).unwrap();
    buf.write_bits(0b1_1111_0000, 9).unwrap();
    buf.flush_bits().unwrap();

    assert_eq!(buf.contents(), &[0b1011_1111, 0b1000_0000]);
    assert_eq!(buf.bit_write_pos(), 16);
}

#[test]
fn test_byte_write_flushes_pending_bits() {
    let mut buf = PacketBuffer::new();
    buf.write_bits(0b11, 2).unwrap();
    assert!(buf.has_unfinished_bit_pack());
    assert_eq!(buf.bit_write_pos(), 2);

    buf.write(0x1234u16).unwrap();
    assert!(!buf.has_unfinished_bit_pack());
    assert_eq!(buf.contents(), &[0b1100_0000, 0x34, 0x12]);
}

#[test]
fn test_put_bits_straddles_bytes() {
    let mut buf = PacketBuffer::new();
    buf.append(&[0xFF, 0x00]).unwrap();
    buf.put_bits(6, 0b0110, 4).unwrap();
    assert_eq!(buf.contents(), &[0b1111_1101, 0b1000_0000]);
}

#[test]
fn test_scalars_are_little_endian() {
    let mut buf = PacketBuffer::new();
    buf.write(0x0102_0304u32).unwrap();
    buf.write(-2i16).unwrap();
    buf.write(true).unwrap();
    buf.write(1.0f32).unwrap();

    assert_eq!(
        buf.contents(),
        &[0x04, 0x03, 0x02, 0x01, 0xFE, 0xFF, 0x01, 0x00, 0x00, 0x80, 0x3F]
    );
}

#[test]
fn test_cstring_layout() {
    let mut buf = PacketBuffer::new();
    buf.write_cstring("Goldshire").unwrap();
    buf.write_cstring("").unwrap();
    assert_eq!(buf.contents(), b"Goldshire\0\0");

    assert_eq!(buf.read_cstring().unwrap(), "Goldshire");
    assert_eq!(buf.read_cstring().unwrap(), "");
    assert_eq!(buf.remaining(), 0);
}

#[test]
fn test_node_window_end_to_end() {
    let outbound = ShowTaxiNodes {
        window_info: None,
        can_land_nodes: NodeMask::default(),
        can_use_nodes: NodeMask::default(),
    }
    .encode()
    .unwrap();
    assert_eq!(outbound.contents(), &[0u8; 17]);

    let (opcode, bytes) = outbound.into_parts();
    let inbound = Packet::inbound(opcode, bytes.to_vec()).unwrap();
    let nodes = ShowTaxiNodes::decode(inbound).unwrap();
    assert!(nodes.window_info.is_none());
    assert_eq!(nodes.can_land_nodes.as_bytes(), &[0u8; 8]);
    assert_eq!(nodes.can_use_nodes.as_bytes(), &[0u8; 8]);
}

#[test]
fn test_reply_and_path_end_to_end() {
    let reply = Packet::inbound(ServerOpcode::ActivateTaxiReply, vec![0x01]).unwrap();
    assert_eq!(ActivateTaxiReply::decode(reply).unwrap().reply, 1);

    let path =
        Packet::inbound(ServerOpcode::NewTaxiPath, (-42i32).to_le_bytes().to_vec()).unwrap();
    assert_eq!(NewTaxiPath::decode(path).unwrap().taxi_nodes_id, -42);
}
