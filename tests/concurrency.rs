//! Cross-thread tests
//!
//! Packets are never shared; they move between threads whole. The
//! dispatcher and its metrics are shared by every session thread.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use world_protocol::protocol::dispatcher::{ClientMessage, Dispatcher, ServerMessage};
use world_protocol::protocol::opcode::{ClientOpcode, Opcode, ServerOpcode};
use world_protocol::protocol::taxi::{NewTaxiPath, TaxiNodeStatus, TaxiStatus};
use world_protocol::{Inbound, Outbound, Packet};

#[test]
fn test_packet_moves_between_threads() {
    let (tx, rx) = mpsc::channel::<Packet>();

    let producer = thread::spawn(move || {
        for id in 0..100i32 {
            let packet = NewTaxiPath { taxi_nodes_id: id }.encode().unwrap();
            tx.send(packet).unwrap();
        }
    });

    let consumer = thread::spawn(move || {
        let mut seen = Vec::new();
        for packet in rx {
            let (opcode, bytes) = packet.into_parts();
            let inbound = Packet::inbound(opcode, bytes.to_vec()).unwrap();
            seen.push(NewTaxiPath::decode(inbound).unwrap().taxi_nodes_id);
        }
        seen
    });

    producer.join().unwrap();
    let seen = consumer.join().unwrap();
    assert_eq!(seen, (0..100).collect::<Vec<_>>());
}

#[test]
fn test_shared_dispatcher_across_sessions() {
    let dispatcher = Arc::new(Dispatcher::new());
    dispatcher
        .register(ClientOpcode::TaxiNodeStatusQuery, |message| match message {
            ClientMessage::TaxiNodeStatusQuery(query) => {
                Ok(Some(ServerMessage::TaxiNodeStatus(TaxiNodeStatus {
                    status: TaxiStatus::Learned as u8,
                    unit: query.unit_guid,
                })))
            }
            _ => Ok(None),
        })
        .unwrap();

    let sessions: Vec<_> = (0..8u64)
        .map(|session| {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || {
                for i in 0..50u64 {
                    let mut payload = (session * 1000 + i).to_le_bytes().to_vec();
                    payload.extend_from_slice(&session.to_le_bytes());

                    let reply = dispatcher
                        .dispatch_raw(ClientOpcode::TaxiNodeStatusQuery.raw(), payload)
                        .unwrap()
                        .expect("status reply");
                    assert_eq!(reply.opcode(), Opcode::from(ServerOpcode::TaxiNodeStatus));

                    let (opcode, bytes) = reply.into_parts();
                    let status =
                        TaxiNodeStatus::decode(Packet::inbound(opcode, bytes.to_vec()).unwrap())
                            .unwrap();
                    assert_eq!(status.unit.low, session * 1000 + i);
                    assert_eq!(status.unit.high, session);
                }
            })
        })
        .collect();

    for session in sessions {
        session.join().unwrap();
    }

    let snapshot = dispatcher.metrics().snapshot();
    assert_eq!(snapshot.packets_received, 400);
    assert_eq!(snapshot.packets_sent, 400);
    assert_eq!(snapshot.bytes_received, 400 * 16);
    assert_eq!(snapshot.bytes_sent, 400 * 17);
}

#[test]
fn test_registration_while_dispatching() {
    let dispatcher = Arc::new(Dispatcher::new());

    let writer = {
        let dispatcher = Arc::clone(&dispatcher);
        thread::spawn(move || {
            dispatcher
                .register(ClientOpcode::TaxiRequestEarlyLanding, |_| Ok(None))
                .unwrap();
        })
    };
    writer.join().unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || {
                assert!(dispatcher.is_registered(ClientOpcode::TaxiRequestEarlyLanding).unwrap());
                dispatcher
                    .dispatch_raw(ClientOpcode::TaxiRequestEarlyLanding.raw(), Vec::new())
                    .unwrap()
            })
        })
        .collect();

    for reader in readers {
        assert!(reader.join().unwrap().is_none());
    }
}
