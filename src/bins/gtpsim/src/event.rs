//! Session Event Definitions
//!
//! What a session is run with: a scheduler tick or a decoded inbound message.

use std::net::SocketAddr;

use gtpsim_gtp::v2::Gtp2Message;

use crate::gtp_path::ConnId;

/// Event types for sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEventId {
    /// Wake-up from the scheduler
    Tick,
    /// Inbound GTP-C message
    GtpMessage,
}

impl SimEventId {
    pub fn name(&self) -> &'static str {
        match self {
            SimEventId::Tick => "GTPSIM_EVT_TICK",
            SimEventId::GtpMessage => "GTPSIM_EVT_GTP_MESSAGE",
        }
    }
}

/// Inbound message data
#[derive(Debug, Clone)]
pub struct GtpEventData {
    pub conn: ConnId,
    pub peer: SocketAddr,
    pub message: Gtp2Message,
}

/// Session event
#[derive(Debug, Clone)]
pub struct SimEvent {
    pub id: SimEventId,
    pub gtp: Option<GtpEventData>,
}

impl SimEvent {
    pub fn tick() -> Self {
        Self {
            id: SimEventId::Tick,
            gtp: None,
        }
    }

    pub fn gtp_message(conn: ConnId, peer: SocketAddr, message: Gtp2Message) -> Self {
        Self {
            id: SimEventId::GtpMessage,
            gtp: Some(GtpEventData {
                conn,
                peer,
                message,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.id.name()
    }
}
