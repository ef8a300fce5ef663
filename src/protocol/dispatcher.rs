use crate::config::{CodecConfig, MAX_PAYLOAD_SIZE};
use crate::core::packet::{Inbound, Outbound, Packet};
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::opcode::{ClientOpcode, Opcode, ServerOpcode};
use crate::protocol::taxi::{
    ActivateTaxi, ActivateTaxiReply, EnableTaxiNode, NewTaxiPath, ShowTaxiNodes,
    TaxiNodeStatus, TaxiNodeStatusQuery, TaxiQueryAvailableNodes, TaxiRequestEarlyLanding,
};
use crate::utils::logging::TracingSink;
use crate::utils::metrics::{Metrics, Timer};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{instrument, warn};

/// Every packet a client may send, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    TaxiNodeStatusQuery(TaxiNodeStatusQuery),
    EnableTaxiNode(EnableTaxiNode),
    TaxiQueryAvailableNodes(TaxiQueryAvailableNodes),
    ActivateTaxi(ActivateTaxi),
    TaxiRequestEarlyLanding(TaxiRequestEarlyLanding),
}

impl ClientMessage {
    /// Static decode table: client opcode to schema.
    ///
    /// Server opcodes are rejected; the server never parses its own traffic.
    pub fn decode(packet: Packet) -> Result<Self> {
        Self::decode_with(packet, true)
    }

    pub fn decode_with(packet: Packet, warn_on_trailing: bool) -> Result<Self> {
        let opcode = match packet.opcode() {
            Opcode::Client(op) => op,
            Opcode::Server(_) => return Err(ProtocolError::UnexpectedMessage),
        };

        let message = match opcode {
            ClientOpcode::TaxiNodeStatusQuery => ClientMessage::TaxiNodeStatusQuery(
                TaxiNodeStatusQuery::decode_with(packet, warn_on_trailing)?,
            ),
            ClientOpcode::EnableTaxiNode => {
                ClientMessage::EnableTaxiNode(EnableTaxiNode::decode_with(packet, warn_on_trailing)?)
            }
            ClientOpcode::TaxiQueryAvailableNodes => ClientMessage::TaxiQueryAvailableNodes(
                TaxiQueryAvailableNodes::decode_with(packet, warn_on_trailing)?,
            ),
            ClientOpcode::ActivateTaxi => {
                ClientMessage::ActivateTaxi(ActivateTaxi::decode_with(packet, warn_on_trailing)?)
            }
            ClientOpcode::TaxiRequestEarlyLanding => ClientMessage::TaxiRequestEarlyLanding(
                TaxiRequestEarlyLanding::decode_with(packet, warn_on_trailing)?,
            ),
        };
        Ok(message)
    }

    pub fn opcode(&self) -> ClientOpcode {
        match self {
            ClientMessage::TaxiNodeStatusQuery(_) => ClientOpcode::TaxiNodeStatusQuery,
            ClientMessage::EnableTaxiNode(_) => ClientOpcode::EnableTaxiNode,
            ClientMessage::TaxiQueryAvailableNodes(_) => ClientOpcode::TaxiQueryAvailableNodes,
            ClientMessage::ActivateTaxi(_) => ClientOpcode::ActivateTaxi,
            ClientMessage::TaxiRequestEarlyLanding(_) => ClientOpcode::TaxiRequestEarlyLanding,
        }
    }
}

/// Every packet the server may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    TaxiNodeStatus(TaxiNodeStatus),
    ShowTaxiNodes(ShowTaxiNodes),
    NewTaxiPath(NewTaxiPath),
    ActivateTaxiReply(ActivateTaxiReply),
}

impl ServerMessage {
    pub fn encode(&self) -> Result<Packet> {
        self.encode_with_limit(MAX_PAYLOAD_SIZE)
    }

    pub fn encode_with_limit(&self, limit: usize) -> Result<Packet> {
        match self {
            ServerMessage::TaxiNodeStatus(p) => p.encode_with_limit(limit),
            ServerMessage::ShowTaxiNodes(p) => p.encode_with_limit(limit),
            ServerMessage::NewTaxiPath(p) => p.encode_with_limit(limit),
            ServerMessage::ActivateTaxiReply(p) => p.encode_with_limit(limit),
        }
    }

    pub fn opcode(&self) -> ServerOpcode {
        match self {
            ServerMessage::TaxiNodeStatus(_) => ServerOpcode::TaxiNodeStatus,
            ServerMessage::ShowTaxiNodes(_) => ServerOpcode::ShowTaxiNodes,
            ServerMessage::NewTaxiPath(_) => ServerOpcode::NewTaxiPath,
            ServerMessage::ActivateTaxiReply(_) => ServerOpcode::ActivateTaxiReply,
        }
    }
}

type HandlerFn = dyn Fn(&ClientMessage) -> Result<Option<ServerMessage>> + Send + Sync + 'static;

/// Routes decoded client packets to handlers keyed by opcode.
pub struct Dispatcher {
    handlers: Arc<RwLock<HashMap<ClientOpcode, Box<HandlerFn>>>>,
    metrics: Arc<Metrics>,
    config: CodecConfig,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default(), Arc::new(Metrics::new()))
    }

    pub fn with_config(config: CodecConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
            metrics,
            config,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn register<F>(&self, opcode: ClientOpcode, handler: F) -> Result<()>
    where
        F: Fn(&ClientMessage) -> Result<Option<ServerMessage>> + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().map_err(|_| {
            ProtocolError::Custom(constants::ERR_DISPATCHER_WRITE_LOCK.to_string())
        })?;

        handlers.insert(opcode, Box::new(handler));
        Ok(())
    }

    pub fn is_registered(&self, opcode: ClientOpcode) -> Result<bool> {
        let handlers = self.handlers.read().map_err(|_| {
            ProtocolError::Custom(constants::ERR_DISPATCHER_READ_LOCK.to_string())
        })?;
        Ok(handlers.contains_key(&opcode))
    }

    /// Resolve a raw client opcode and dispatch its payload.
    pub fn dispatch_raw(&self, opcode: u32, payload: Vec<u8>) -> Result<Option<Packet>> {
        let opcode = match ClientOpcode::try_from(opcode) {
            Ok(op) => op,
            Err(e) => {
                self.metrics.codec_error(&e);
                warn!(opcode, "Unknown client opcode");
                return Err(e);
            }
        };

        let packet = Packet::inbound_with_limit(opcode, payload, self.config.max_payload_size)
            .inspect_err(|e| self.metrics.codec_error(e))?;
        self.dispatch(packet)
    }

    /// Decode `packet`, run its handler and encode the reply, if any.
    #[instrument(skip(self, packet), fields(opcode = %packet.opcode()), level = "debug")]
    pub fn dispatch(&self, packet: Packet) -> Result<Option<Packet>> {
        let _timer = Timer::start("dispatch");
        self.metrics.packet_received(packet.contents().len() as u64);

        if self.config.dump_inbound {
            packet.buffer().hexlike(&TracingSink);
        }

        let message = ClientMessage::decode_with(packet, self.config.warn_on_trailing_bytes)
            .inspect_err(|e| {
                self.metrics.codec_error(e);
                warn!(error = %e, "Dropping malformed packet");
            })?;

        let handlers = self.handlers.read().map_err(|_| {
            ProtocolError::Custom(constants::ERR_DISPATCHER_READ_LOCK.to_string())
        })?;

        let handler = handlers.get(&message.opcode()).ok_or_else(|| {
            self.metrics.unhandled_opcode();
            ProtocolError::UnexpectedMessage
        })?;

        let reply = handler(&message).inspect_err(|e| {
            self.metrics.handler_error();
            warn!(error = %e, "Handler failed");
        })?;

        match reply {
            Some(reply) => {
                let packet = reply
                    .encode_with_limit(self.config.max_payload_size)
                    .inspect_err(|e| {
                        self.metrics.codec_error(e);
                        let opcode = Opcode::from(reply.opcode());
                        warn!(error = %e, %opcode, "Failed to encode reply");
                    })?;
                self.metrics.packet_sent(packet.contents().len() as u64);
                Ok(Some(packet))
            }
            None => Ok(None),
        }
    }
}
