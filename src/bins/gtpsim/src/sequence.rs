//! Peer Sequence Registry
//!
//! One sequence counter per remote endpoint. Requests and commands sent to a
//! peer are stamped from it; commands additionally carry the high bit of the
//! 24-bit field so they never collide with request numbering.

use std::collections::HashMap;
use std::net::SocketAddr;

use gtpsim_gtp::v2::{MessageCategory, GTP2_COMMAND_SEQUENCE_FLAG};

/// Counter space below the command bit
const SEQUENCE_MASK: u32 = GTP2_COMMAND_SEQUENCE_FLAG - 1;

/// Sequencing state of one remote endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    pub endpoint: SocketAddr,
    pub last_sequence: u32,
}

#[derive(Debug, Default)]
pub struct PeerSequenceRegistry {
    peers: HashMap<SocketAddr, PeerRecord>,
}

impl PeerSequenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, peer: SocketAddr) -> &mut PeerRecord {
        self.peers.entry(peer).or_insert_with(|| {
            log::debug!("New peer {}", peer);
            PeerRecord {
                endpoint: peer,
                last_sequence: 0,
            }
        })
    }

    /// Next sequence number for a message of `category` sent to `peer`
    pub fn generate(&mut self, peer: SocketAddr, category: MessageCategory) -> u32 {
        let record = self.record(peer);
        record.last_sequence = (record.last_sequence + 1) & SEQUENCE_MASK;
        if category == MessageCategory::Command {
            record.last_sequence | GTP2_COMMAND_SEQUENCE_FLAG
        } else {
            record.last_sequence
        }
    }

    /// Keep the counter at or above a sequence number seen from `peer`
    pub fn observe(&mut self, peer: SocketAddr, sequence: u32) {
        let record = self.record(peer);
        record.last_sequence = record.last_sequence.max(sequence & SEQUENCE_MASK);
    }

    pub fn get(&self, peer: &SocketAddr) -> Option<&PeerRecord> {
        self.peers.get(peer)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
