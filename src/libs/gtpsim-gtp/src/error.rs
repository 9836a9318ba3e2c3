//! GTP Error types

use thiserror::Error;

/// GTP Error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GtpError {
    /// Buffer too short for operation
    #[error("Buffer too short: need {needed} bytes, have {available}")]
    BufferTooShort { needed: usize, available: usize },

    /// IE header declares more value bytes than the enclosing buffer holds
    #[error("Invalid IE length: type {ie_type} declares {declared} bytes, {available} available")]
    InvalidIeLength {
        ie_type: u8,
        declared: usize,
        available: usize,
    },

    /// Required IE is absent
    #[error("IE not found: type {ie_type} instance {instance} occurrence {occurrence}")]
    IeNotFound {
        ie_type: u8,
        instance: u8,
        occurrence: usize,
    },

    /// Invalid header
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Invalid message type
    #[error("Invalid message type: {0}")]
    InvalidMessageType(u8),

    /// Invalid IE type
    #[error("Invalid IE type: {0}")]
    InvalidIeType(u8),

    /// Invalid version
    #[error("Invalid GTP version: {0}")]
    InvalidVersion(u8),

    /// A named build parameter carries a value that cannot be parsed
    #[error("Invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    /// Invalid PDN type
    #[error("Invalid PDN type: {0}")]
    InvalidPdnType(u8),

    /// Encoded message exceeds the 16-bit length field
    #[error("Message too long: {0} bytes")]
    MessageTooLong(usize),

    /// Resource exhausted
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),
}

impl GtpError {
    pub(crate) fn short(needed: usize, available: usize) -> Self {
        Self::BufferTooShort { needed, available }
    }

    pub(crate) fn invalid_param(name: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// GTP Result type
pub type GtpResult<T> = Result<T, GtpError>;
