#![no_main]

use libfuzzer_sys::fuzz_target;
use world_protocol::protocol::dispatcher::ClientMessage;
use world_protocol::protocol::opcode::{ClientOpcode, ServerOpcode};
use world_protocol::protocol::taxi::{ActivateTaxiReply, NewTaxiPath, ShowTaxiNodes, TaxiNodeStatus};
use world_protocol::{Inbound, Packet};

fuzz_target!(|data: &[u8]| {
    // First byte picks the schema, the rest is the payload
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let payload = payload.to_vec();

    let opcodes = ClientOpcode::ALL;
    let index = usize::from(selector);
    if let Some(&opcode) = opcodes.get(index % (opcodes.len() + 4)) {
        if let Ok(packet) = Packet::inbound(opcode, payload) {
            let _ = ClientMessage::decode_with(packet, false);
        }
        return;
    }

    let server = ServerOpcode::ALL[index % ServerOpcode::ALL.len()];
    let Ok(packet) = Packet::inbound(server, payload) else {
        return;
    };
    let _ = match server {
        ServerOpcode::TaxiNodeStatus => TaxiNodeStatus::decode_with(packet, false).map(|_| ()),
        ServerOpcode::ShowTaxiNodes => ShowTaxiNodes::decode_with(packet, false).map(|_| ()),
        ServerOpcode::NewTaxiPath => NewTaxiPath::decode_with(packet, false).map(|_| ()),
        ServerOpcode::ActivateTaxiReply => ActivateTaxiReply::decode_with(packet, false).map(|_| ()),
    };
});
