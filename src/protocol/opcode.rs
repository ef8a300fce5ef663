//! Opcode catalog.
//!
//! Every opcode belongs to exactly one direction. Client opcodes only ever
//! arrive at the server; server opcodes only ever leave it. The split is
//! encoded in the type so a packet's direction never has to be checked at
//! runtime.

use crate::error::{ProtocolError, Result};
use std::fmt;

/// Which way a packet travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
}

macro_rules! opcode_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = $value:expr => $label:expr),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum $name {
            $($variant = $value),*
        }

        impl $name {
            /// Every opcode in this direction
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            /// Numeric wire identifier
            #[inline]
            pub fn raw(self) -> u32 {
                self as u32
            }

            /// Human-readable name for logs
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label),*
                }
            }
        }

        impl TryFrom<u32> for $name {
            type Error = ProtocolError;

            fn try_from(raw: u32) -> Result<Self> {
                match raw {
                    $(v if v == $value => Ok($name::$variant),)*
                    other => Err(ProtocolError::UnknownOpcode(other)),
                }
            }
        }
    };
}

opcode_enum! {
    /// Opcodes sent by clients
    ClientOpcode {
        TaxiNodeStatusQuery = 0x34A0 => "CMSG_TAXI_NODE_STATUS_QUERY",
        EnableTaxiNode = 0x34A1 => "CMSG_ENABLE_TAXI_NODE",
        TaxiQueryAvailableNodes = 0x34A2 => "CMSG_TAXI_QUERY_AVAILABLE_NODES",
        ActivateTaxi = 0x34A3 => "CMSG_ACTIVATE_TAXI",
        TaxiRequestEarlyLanding = 0x34A4 => "CMSG_TAXI_REQUEST_EARLY_LANDING",
    }
}

opcode_enum! {
    /// Opcodes sent by the server
    ServerOpcode {
        TaxiNodeStatus = 0x2670 => "SMSG_TAXI_NODE_STATUS",
        ShowTaxiNodes = 0x2671 => "SMSG_SHOW_TAXI_NODES",
        NewTaxiPath = 0x2672 => "SMSG_NEW_TAXI_PATH",
        ActivateTaxiReply = 0x2673 => "SMSG_ACTIVATE_TAXI_REPLY",
    }
}

/// A direction-tagged opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Client(ClientOpcode),
    Server(ServerOpcode),
}

impl Opcode {
    /// Resolve a numeric identifier received for a known direction.
    pub fn from_raw(direction: Direction, raw: u32) -> Result<Self> {
        match direction {
            Direction::ClientToServer => ClientOpcode::try_from(raw).map(Opcode::Client),
            Direction::ServerToClient => ServerOpcode::try_from(raw).map(Opcode::Server),
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Opcode::Client(_) => Direction::ClientToServer,
            Opcode::Server(_) => Direction::ServerToClient,
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Opcode::Client(op) => op.raw(),
            Opcode::Server(op) => op.raw(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::Client(op) => op.name(),
            Opcode::Server(op) => op.name(),
        }
    }
}

impl From<ClientOpcode> for Opcode {
    fn from(op: ClientOpcode) -> Self {
        Opcode::Client(op)
    }
}

impl From<ServerOpcode> for Opcode {
    fn from(op: ServerOpcode) -> Self {
        Opcode::Server(op)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04X})", self.name(), self.raw())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_roundtrip() {
        for &op in ClientOpcode::ALL {
            assert_eq!(ClientOpcode::try_from(op.raw()).unwrap(), op);
        }
        for &op in ServerOpcode::ALL {
            assert_eq!(ServerOpcode::try_from(op.raw()).unwrap(), op);
        }
    }

    #[test]
    fn test_direction_is_fixed() {
        assert_eq!(
            Opcode::from(ClientOpcode::ActivateTaxi).direction(),
            Direction::ClientToServer
        );
        assert_eq!(
            Opcode::from(ServerOpcode::NewTaxiPath).direction(),
            Direction::ServerToClient
        );
    }

    #[test]
    fn test_server_opcode_not_accepted_from_client() {
        let raw = ServerOpcode::TaxiNodeStatus.raw();
        assert!(matches!(
            Opcode::from_raw(Direction::ClientToServer, raw),
            Err(ProtocolError::UnknownOpcode(r)) if r == raw
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Opcode::from(ServerOpcode::ActivateTaxiReply).to_string(),
            "SMSG_ACTIVATE_TAXI_REPLY (0x2673)"
        );
    }
}
