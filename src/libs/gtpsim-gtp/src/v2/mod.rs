//! GTPv2 Protocol Implementation
//!
//! This module implements GTPv2-C (Control Plane) as specified in 3GPP TS 29.274.

pub mod types;
pub mod header;
pub mod message;
pub mod ie;
pub mod ie_kinds;
pub mod ie_build;
pub mod classifier;
pub mod teid_pool;

// Re-export header types
pub use header::{
    Gtp2Header, Gtp2MessageType, GTPV2C_HEADER_LEN, GTPV2C_HEADER_LEN_NO_TEID,
    GTP2_COMMAND_SEQUENCE_FLAG, GTP2_MAX_SEQUENCE, GTP2_TEID_LEN, GTP2_VERSION,
};

pub use message::Gtp2Message;

// Re-export IE types
pub use ie::{Gtp2IeType, GroupedIe, IeHeader, IeKind, InformationElement, IE_HEADER_LEN};
pub use ie_kinds::{
    pdn_type, uli_flag, AmbrIe, AreaCode, BearerQosIe, CauseIe, ExtMacroEnb, FTeidIe,
    IndicationIe, OffendingIe, PaaIe, PlmnCode16, PlmnId32, UeTimeZoneIe, UliIe,
};
pub use ie_build::IeParams;

pub use classifier::{
    classify, is_command_triggerable, message_name, message_tag, message_type_from_tag,
    MessageCategory,
};

// Re-export types
pub use types::{
    fteid_interface, is_accepted_cause, Gtp2Arp, Gtp2Cause, Gtp2RatType, PlmnId,
};

pub use teid_pool::TeidPool;
