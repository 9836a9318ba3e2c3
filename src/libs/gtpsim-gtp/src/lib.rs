//! GTPv2-C codec for the gtpsim load generator
//!
//! This crate provides GTPv2-C message building, parsing and classification
//! as specified in 3GPP TS 29.274: the IE codec (typed kinds, grouped IEs and
//! named-parameter builders), the message codec, the message classifier and
//! the TEID allocator.

pub mod error;
pub mod v2;


pub use error::{GtpError, GtpResult};

/// GTPv2-C UDP port (2123)
pub const GTPV2_C_UDP_PORT: u16 = 2123;

/// Largest GTPv2-C datagram the simulator reads or writes
pub const GTPV2_MAX_MESSAGE_LEN: usize = 8192;
