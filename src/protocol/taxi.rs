//! # Taxi Packets
//!
//! Flight-master traffic: node status queries, the node window, activation
//! and the replies the server sends back.
//!
//! ## Wire Layouts
//! ```text
//! CMSG_TAXI_NODE_STATUS_QUERY      [guid(16)]
//! SMSG_TAXI_NODE_STATUS            [status(1)] [guid(16)]
//! SMSG_SHOW_TAXI_NODES             [has_window:1 | pad:7] ([guid(16)] [current_node i32])? [can_land(N)] [can_use(N)]
//! CMSG_ENABLE_TAXI_NODE            [guid(16)]
//! CMSG_TAXI_QUERY_AVAILABLE_NODES  [guid(16)]
//! CMSG_ACTIVATE_TAXI               [guid(16)] [node u32] [ground_mount u32] [flying_mount u32]
//! SMSG_NEW_TAXI_PATH               [taxi_nodes_id i32]
//! SMSG_ACTIVATE_TAXI_REPLY         [reply(1)]
//! CMSG_TAXI_REQUEST_EARLY_LANDING  (empty)
//! ```
//! `N` is [`TAXI_MASK_SIZE`]; the masks carry no length prefix.

use crate::core::buffer::PacketBuffer;
use crate::core::packet::{Inbound, Outbound};
use crate::error::Result;
use crate::protocol::guid::{ObjectGuid, GUID_SIZE};
use crate::protocol::opcode::{ClientOpcode, Opcode, ServerOpcode};

/// Number of taxi nodes the masks can address
pub const TAXI_NODE_COUNT: usize = 64;

/// Bytes per node mask
pub const TAXI_MASK_SIZE: usize = TAXI_NODE_COUNT.div_ceil(8);

/// Bitmask over taxi nodes. Node ids are 1-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NodeMask([u8; TAXI_MASK_SIZE]);

impl NodeMask {
    pub const fn from_bytes(bytes: [u8; TAXI_MASK_SIZE]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; TAXI_MASK_SIZE] {
        &self.0
    }

    fn locate(node: u32) -> Option<(usize, u8)> {
        let index = (node as usize).checked_sub(1)?;
        if index >= TAXI_NODE_COUNT {
            return None;
        }
        Some((index / 8, 1 << (index % 8)))
    }

    /// Mark `node`. Returns false if the node is outside the mask.
    pub fn insert(&mut self, node: u32) -> bool {
        match Self::locate(node) {
            Some((byte, bit)) => {
                self.0[byte] |= bit;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, node: u32) {
        if let Some((byte, bit)) = Self::locate(node) {
            self.0[byte] &= !bit;
        }
    }

    pub fn contains(&self, node: u32) -> bool {
        Self::locate(node).is_some_and(|(byte, bit)| self.0[byte] & bit != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Marked node ids in ascending order
    pub fn nodes(&self) -> impl Iterator<Item = u32> + '_ {
        (1..=TAXI_NODE_COUNT as u32).filter(move |&node| self.contains(node))
    }

    fn read(buf: &mut PacketBuffer) -> Result<Self> {
        let mut bytes = [0u8; TAXI_MASK_SIZE];
        buf.read_into(&mut bytes)?;
        Ok(Self(bytes))
    }

    fn write(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.append(&self.0)
    }
}

/// Flight-master icon state shown above a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaxiStatus {
    None = 0,
    Unlearned = 1,
    Learned = 2,
    NotEligible = 3,
}

impl TryFrom<u8> for TaxiStatus {
    type Error = u8;

    fn try_from(raw: u8) -> std::result::Result<Self, u8> {
        match raw {
            0 => Ok(TaxiStatus::None),
            1 => Ok(TaxiStatus::Unlearned),
            2 => Ok(TaxiStatus::Learned),
            3 => Ok(TaxiStatus::NotEligible),
            other => Err(other),
        }
    }
}

/// Outcome of a taxi activation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActivateTaxiResult {
    Ok = 0,
    UnspecifiedServerError = 1,
    NoSuchPath = 2,
    NotEnoughMoney = 3,
    TooFarAway = 4,
    NoVendorNearby = 5,
    NotVisited = 6,
    PlayerBusy = 7,
    PlayerAlreadyMounted = 8,
    PlayerShapeshifted = 9,
    PlayerMoving = 10,
    SameNode = 11,
    NotStanding = 12,
}

impl TryFrom<u8> for ActivateTaxiResult {
    type Error = u8;

    fn try_from(raw: u8) -> std::result::Result<Self, u8> {
        let result = match raw {
            0 => ActivateTaxiResult::Ok,
            1 => ActivateTaxiResult::UnspecifiedServerError,
            2 => ActivateTaxiResult::NoSuchPath,
            3 => ActivateTaxiResult::NotEnoughMoney,
            4 => ActivateTaxiResult::TooFarAway,
            5 => ActivateTaxiResult::NoVendorNearby,
            6 => ActivateTaxiResult::NotVisited,
            7 => ActivateTaxiResult::PlayerBusy,
            8 => ActivateTaxiResult::PlayerAlreadyMounted,
            9 => ActivateTaxiResult::PlayerShapeshifted,
            10 => ActivateTaxiResult::PlayerMoving,
            11 => ActivateTaxiResult::SameNode,
            12 => ActivateTaxiResult::NotStanding,
            other => return Err(other),
        };
        Ok(result)
    }
}

// ----------------------------------------------------------------------
// Client -> server
// ----------------------------------------------------------------------

/// Asks for the taxi status of a flight master
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaxiNodeStatusQuery {
    pub unit_guid: ObjectGuid,
}

impl Inbound for TaxiNodeStatusQuery {
    const OPCODE: Opcode = Opcode::Client(ClientOpcode::TaxiNodeStatusQuery);

    fn read(buf: &mut PacketBuffer) -> Result<Self> {
        Ok(Self {
            unit_guid: ObjectGuid::read(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnableTaxiNode {
    pub unit: ObjectGuid,
}

impl Inbound for EnableTaxiNode {
    const OPCODE: Opcode = Opcode::Client(ClientOpcode::EnableTaxiNode);

    fn read(buf: &mut PacketBuffer) -> Result<Self> {
        Ok(Self {
            unit: ObjectGuid::read(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaxiQueryAvailableNodes {
    pub unit: ObjectGuid,
}

impl Inbound for TaxiQueryAvailableNodes {
    const OPCODE: Opcode = Opcode::Client(ClientOpcode::TaxiQueryAvailableNodes);

    fn read(buf: &mut PacketBuffer) -> Result<Self> {
        Ok(Self {
            unit: ObjectGuid::read(buf)?,
        })
    }
}

/// Requests a flight from the vendor's node to `node`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivateTaxi {
    pub vendor: ObjectGuid,
    pub node: u32,
    pub ground_mount_id: u32,
    pub flying_mount_id: u32,
}

impl Inbound for ActivateTaxi {
    const OPCODE: Opcode = Opcode::Client(ClientOpcode::ActivateTaxi);

    fn read(buf: &mut PacketBuffer) -> Result<Self> {
        Ok(Self {
            vendor: ObjectGuid::read(buf)?,
            node: buf.read()?,
            ground_mount_id: buf.read()?,
            flying_mount_id: buf.read()?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaxiRequestEarlyLanding;

impl Inbound for TaxiRequestEarlyLanding {
    const OPCODE: Opcode = Opcode::Client(ClientOpcode::TaxiRequestEarlyLanding);

    fn read(_buf: &mut PacketBuffer) -> Result<Self> {
        Ok(Self)
    }
}

// ----------------------------------------------------------------------
// Server -> client
//
// These also implement `Inbound` so a receiving peer can parse them.
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaxiNodeStatus {
    pub status: u8,
    pub unit: ObjectGuid,
}

impl TaxiNodeStatus {
    /// Typed status, `None` for values this build does not know
    pub fn taxi_status(&self) -> Option<TaxiStatus> {
        TaxiStatus::try_from(self.status).ok()
    }
}

impl Outbound for TaxiNodeStatus {
    const OPCODE: Opcode = Opcode::Server(ServerOpcode::TaxiNodeStatus);
    const SIZE_HINT: usize = 1 + GUID_SIZE;

    fn write(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write(self.status)?;
        self.unit.write(buf)
    }
}

impl Inbound for TaxiNodeStatus {
    const OPCODE: Opcode = Opcode::Server(ServerOpcode::TaxiNodeStatus);

    fn read(buf: &mut PacketBuffer) -> Result<Self> {
        Ok(Self {
            status: buf.read()?,
            unit: ObjectGuid::read(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowTaxiNodesWindowInfo {
    pub unit_guid: ObjectGuid,
    pub current_node: i32,
}

/// Opens the flight map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowTaxiNodes {
    pub window_info: Option<ShowTaxiNodesWindowInfo>,
    /// Nodes known by the player
    pub can_land_nodes: NodeMask,
    /// Nodes usable right now; a known node can be temporarily disabled
    pub can_use_nodes: NodeMask,
}

impl Outbound for ShowTaxiNodes {
    const OPCODE: Opcode = Opcode::Server(ServerOpcode::ShowTaxiNodes);
    const SIZE_HINT: usize = 1 + GUID_SIZE + 4 + 2 * TAXI_MASK_SIZE;

    fn write(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_bit(self.window_info.is_some())?;
        buf.flush_bits()?;

        if let Some(info) = &self.window_info {
            info.unit_guid.write(buf)?;
            buf.write(info.current_node)?;
        }

        self.can_land_nodes.write(buf)?;
        self.can_use_nodes.write(buf)
    }
}

impl Inbound for ShowTaxiNodes {
    const OPCODE: Opcode = Opcode::Server(ServerOpcode::ShowTaxiNodes);

    fn read(buf: &mut PacketBuffer) -> Result<Self> {
        let has_window_info = buf.read_bit()?;
        buf.reset_bit_pos();

        let window_info = if has_window_info {
            Some(ShowTaxiNodesWindowInfo {
                unit_guid: ObjectGuid::read(buf)?,
                current_node: buf.read()?,
            })
        } else {
            None
        };

        Ok(Self {
            window_info,
            can_land_nodes: NodeMask::read(buf)?,
            can_use_nodes: NodeMask::read(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NewTaxiPath {
    pub taxi_nodes_id: i32,
}

impl Outbound for NewTaxiPath {
    const OPCODE: Opcode = Opcode::Server(ServerOpcode::NewTaxiPath);
    const SIZE_HINT: usize = 4;

    fn write(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write(self.taxi_nodes_id)
    }
}

impl Inbound for NewTaxiPath {
    const OPCODE: Opcode = Opcode::Server(ServerOpcode::NewTaxiPath);

    fn read(buf: &mut PacketBuffer) -> Result<Self> {
        Ok(Self {
            taxi_nodes_id: buf.read()?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivateTaxiReply {
    pub reply: u8,
}

impl ActivateTaxiReply {
    pub fn new(result: ActivateTaxiResult) -> Self {
        Self {
            reply: result as u8,
        }
    }

    pub fn result(&self) -> Option<ActivateTaxiResult> {
        ActivateTaxiResult::try_from(self.reply).ok()
    }
}

impl Outbound for ActivateTaxiReply {
    const OPCODE: Opcode = Opcode::Server(ServerOpcode::ActivateTaxiReply);
    const SIZE_HINT: usize = 1;

    fn write(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write(self.reply)
    }
}

impl Inbound for ActivateTaxiReply {
    const OPCODE: Opcode = Opcode::Server(ServerOpcode::ActivateTaxiReply);

    fn read(buf: &mut PacketBuffer) -> Result<Self> {
        Ok(Self { reply: buf.read()? })
    }
}
