#![no_main]

use libfuzzer_sys::fuzz_target;
use world_protocol::core::buffer::PacketBuffer;

fuzz_target!(|data: &[u8]| {
    // Drive the reader with a script taken from the input itself
    let Some((&script_len, rest)) = data.split_first() else {
        return;
    };
    let split = usize::from(script_len).min(rest.len());
    let (script, payload) = rest.split_at(split);

    let Ok(mut buf) = PacketBuffer::from_vec(payload.to_vec()) else {
        return;
    };

    for &op in script {
        let before = buf.rpos();
        let ok = match op % 10 {
            0 => buf.read::<u8>().is_ok(),
            1 => buf.read::<u32>().is_ok(),
            2 => buf.read::<f32>().is_ok(),
            3 => buf.read::<f64>().is_ok(),
            4 => buf.read_bit().is_ok(),
            5 => buf.read_bits(u32::from(op >> 2) % 65).is_ok(),
            6 => buf.read_cstring().is_ok(),
            7 => buf.read_string(usize::from(op >> 4)).is_ok(),
            8 => buf.read_raw_cstring().is_ok(),
            _ => {
                buf.reset_bit_pos();
                true
            }
        };
        if !ok {
            assert_eq!(buf.rpos(), before, "failed read moved the cursor");
        }
        assert!(buf.rpos() <= buf.wpos());
    }
});
