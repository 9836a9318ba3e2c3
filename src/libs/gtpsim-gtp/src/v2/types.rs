//! GTPv2 Types
//!
//! Value types and digit/label helpers shared by the IE codec, as specified
//! in 3GPP TS 29.274 and TS 24.008.

use bytes::{BufMut, BytesMut};
use crate::error::{GtpError, GtpResult};

/// Filler nibble terminating an odd-length BCD digit string
pub const BCD_FILLER: u8 = 0x0F;

/// Maximum digits carried by an IMSI
pub const MAX_IMSI_DIGITS: usize = 15;

/// Maximum digits carried by an MSISDN
pub const MAX_MSISDN_DIGITS: usize = 15;

/// Maximum digits carried by an MEI (IMEISV)
pub const MAX_MEI_DIGITS: usize = 16;

/// GTPv2 Cause Values (TS 29.274 Section 8.4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Gtp2Cause {
    LocalDetach = 2,
    CompleteDetach = 3,
    ReactivationRequested = 8,
    PgwNotResponding = 12,
    NetworkFailure = 13,
    RequestAccepted = 16,
    RequestAcceptedPartially = 17,
    NewPdnTypeDueToNetworkPreference = 18,
    NewPdnTypeDueToSingleAddressBearerOnly = 19,
    ContextNotFound = 64,
    InvalidMessageFormat = 65,
    VersionNotSupportedByNextPeer = 66,
    InvalidLength = 67,
    ServiceNotSupported = 68,
    MandatoryIeIncorrect = 69,
    MandatoryIeMissing = 70,
    SystemFailure = 72,
    NoResourcesAvailable = 73,
    MissingOrUnknownApn = 78,
    UserAuthenticationFailed = 92,
    RequestRejectedReasonNotSpecified = 94,
    RemotePeerNotResponding = 100,
    CollisionWithNetworkInitiatedRequest = 101,
    ConditionalIeMissing = 103,
    InvalidReplyFromRemotePeer = 107,
    GtpCEntityCongestion = 120,
    LateOverlappingRequest = 121,
    TimedOutRequest = 122,
}

impl TryFrom<u8> for Gtp2Cause {
    type Error = GtpError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let cause = match value {
            2 => Self::LocalDetach,
            3 => Self::CompleteDetach,
            8 => Self::ReactivationRequested,
            12 => Self::PgwNotResponding,
            13 => Self::NetworkFailure,
            16 => Self::RequestAccepted,
            17 => Self::RequestAcceptedPartially,
            18 => Self::NewPdnTypeDueToNetworkPreference,
            19 => Self::NewPdnTypeDueToSingleAddressBearerOnly,
            64 => Self::ContextNotFound,
            65 => Self::InvalidMessageFormat,
            66 => Self::VersionNotSupportedByNextPeer,
            67 => Self::InvalidLength,
            68 => Self::ServiceNotSupported,
            69 => Self::MandatoryIeIncorrect,
            70 => Self::MandatoryIeMissing,
            72 => Self::SystemFailure,
            73 => Self::NoResourcesAvailable,
            78 => Self::MissingOrUnknownApn,
            92 => Self::UserAuthenticationFailed,
            94 => Self::RequestRejectedReasonNotSpecified,
            100 => Self::RemotePeerNotResponding,
            101 => Self::CollisionWithNetworkInitiatedRequest,
            103 => Self::ConditionalIeMissing,
            107 => Self::InvalidReplyFromRemotePeer,
            120 => Self::GtpCEntityCongestion,
            121 => Self::LateOverlappingRequest,
            122 => Self::TimedOutRequest,
            _ => {
                return Err(GtpError::InvalidHeader(format!(
                    "unknown cause value {value}"
                )))
            }
        };
        Ok(cause)
    }
}

impl Gtp2Cause {
    /// Check if cause indicates success (acceptance range 16..=63)
    pub fn is_success(&self) -> bool {
        is_accepted_cause(*self as u8)
    }
}

/// Whether a raw cause value falls in the "request accepted" range
pub fn is_accepted_cause(value: u8) -> bool {
    (16..=63).contains(&value)
}

/// RAT Type values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Gtp2RatType {
    Utran = 1,
    Geran = 2,
    Wlan = 3,
    Gan = 4,
    HspaEvolution = 5,
    Eutran = 6,
    Virtual = 7,
    EutranNbIot = 8,
    LteM = 9,
    Nr = 10,
}

/// F-TEID interface types (TS 29.274 Table 8.22-1), subset
pub mod fteid_interface {
    pub const S1_U_ENODEB_GTP_U: u8 = 0;
    pub const S1_U_SGW_GTP_U: u8 = 1;
    pub const S5_S8_SGW_GTP_U: u8 = 4;
    pub const S5_S8_PGW_GTP_U: u8 = 5;
    pub const S5_S8_SGW_GTP_C: u8 = 6;
    pub const S5_S8_PGW_GTP_C: u8 = 7;
    pub const S11_MME_GTP_C: u8 = 10;
    pub const S11_S4_SGW_GTP_C: u8 = 11;
    pub const S4_SGSN_GTP_C: u8 = 17;
}

// ============================================================================
// PLMN Identity
// ============================================================================

/// PLMN identity (MCC + MNC), kept as decimal digits.
///
/// A two-digit MNC stores `BCD_FILLER` in `mnc[2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlmnId {
    pub mcc: [u8; 3],
    pub mnc: [u8; 3],
}

impl PlmnId {
    /// Build from digit strings such as ("001", "01")
    pub fn from_digits(mcc: &str, mnc: &str) -> GtpResult<Self> {
        let mcc_digits = parse_digits("mcc", mcc)?;
        let mnc_digits = parse_digits("mnc", mnc)?;
        if mcc_digits.len() != 3 {
            return Err(GtpError::invalid_param("mcc", mcc, "MCC must have 3 digits"));
        }
        if !(2..=3).contains(&mnc_digits.len()) {
            return Err(GtpError::invalid_param("mnc", mnc, "MNC must have 2 or 3 digits"));
        }
        let mnc3 = mnc_digits.get(2).copied().unwrap_or(BCD_FILLER);
        Ok(Self {
            mcc: [mcc_digits[0], mcc_digits[1], mcc_digits[2]],
            mnc: [mnc_digits[0], mnc_digits[1], mnc3],
        })
    }

    /// Encode into the 3-octet TS 24.008 layout
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8((self.mcc[1] << 4) | (self.mcc[0] & 0x0F));
        buf.put_u8((self.mnc[2] << 4) | (self.mcc[2] & 0x0F));
        buf.put_u8((self.mnc[1] << 4) | (self.mnc[0] & 0x0F));
    }

    /// Decode from the first 3 octets of `value`
    pub fn decode(value: &[u8]) -> GtpResult<Self> {
        if value.len() < 3 {
            return Err(GtpError::short(3, value.len()));
        }
        Ok(Self {
            mcc: [value[0] & 0x0F, value[0] >> 4, value[1] & 0x0F],
            mnc: [value[2] & 0x0F, value[2] >> 4, value[1] >> 4],
        })
    }

    /// MCC as a digit string
    pub fn mcc_string(&self) -> String {
        self.mcc.iter().map(|d| char::from(b'0' + d)).collect()
    }

    /// MNC as a digit string (2 or 3 digits)
    pub fn mnc_string(&self) -> String {
        self.mnc
            .iter()
            .filter(|d| **d <= 9)
            .map(|d| char::from(b'0' + d))
            .collect()
    }
}

// ============================================================================
// BCD digits
// ============================================================================

/// Parse a decimal digit string into digit values
pub fn parse_digits(name: &str, digits: &str) -> GtpResult<Vec<u8>> {
    digits
        .chars()
        .map(|c| {
            c.to_digit(10)
                .map(|d| d as u8)
                .ok_or_else(|| GtpError::invalid_param(name, digits, "expected decimal digits"))
        })
        .collect()
}

/// Pack decimal digits two per octet, low nibble first.
///
/// An odd digit count leaves `BCD_FILLER` in the final high nibble, so
/// `L` digits always occupy `ceil(L / 2)` octets.
pub fn encode_bcd(digits: &[u8]) -> Vec<u8> {
    digits
        .chunks(2)
        .map(|pair| {
            let low = pair[0] & 0x0F;
            let high = pair.get(1).map_or(BCD_FILLER, |d| d & 0x0F);
            (high << 4) | low
        })
        .collect()
}

/// Unpack BCD octets, stopping at the first filler nibble
pub fn decode_bcd(octets: &[u8]) -> Vec<u8> {
    let mut digits = Vec::with_capacity(octets.len() * 2);
    for octet in octets {
        for nibble in [octet & 0x0F, octet >> 4] {
            if nibble == BCD_FILLER {
                return digits;
            }
            digits.push(nibble);
        }
    }
    digits
}

/// Render digit values as a decimal string.
///
/// Nibbles 0xA-0xE are not digits and fail the decode.
pub fn digits_to_string(digits: &[u8]) -> GtpResult<String> {
    digits
        .iter()
        .map(|d| {
            char::from_digit(u32::from(*d), 10).ok_or_else(|| {
                GtpError::invalid_param("digits", &format!("{d:#x}"), "non-decimal BCD nibble")
            })
        })
        .collect()
}

// ============================================================================
// APN / FQDN labels
// ============================================================================

/// Longest label a length octet may announce (RFC 1035)
pub const MAX_LABEL_LEN: usize = 63;

/// Convert dot-separated name to the length-prefixed label format
pub fn encode_labels(name: &str) -> GtpResult<Vec<u8>> {
    let mut encoded = Vec::with_capacity(name.len() + 1);
    if name.is_empty() {
        return Ok(encoded);
    }
    for part in name.split('.') {
        if part.len() > MAX_LABEL_LEN {
            return Err(GtpError::invalid_param(
                "name",
                name,
                format!("label longer than {MAX_LABEL_LEN} octets"),
            ));
        }
        encoded.push(part.len() as u8);
        encoded.extend_from_slice(part.as_bytes());
    }
    Ok(encoded)
}

/// Convert length-prefixed labels back to a dot-separated name
pub fn decode_labels(encoded: &[u8]) -> String {
    let mut result = String::new();
    let mut i = 0;
    while i < encoded.len() {
        let len = encoded[i] as usize;
        if i + 1 + len > encoded.len() {
            break;
        }
        if !result.is_empty() {
            result.push('.');
        }
        result.push_str(&String::from_utf8_lossy(&encoded[i + 1..i + 1 + len]));
        i += 1 + len;
    }
    result
}

// ============================================================================
// Allocation/Retention Priority
// ============================================================================

/// ARP octet shared by Bearer QoS and the ARP IE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Gtp2Arp {
    pub pre_emption_capability: bool,
    pub priority_level: u8,
    pub pre_emption_vulnerability: bool,
}

impl Gtp2Arp {
    pub fn encode(&self) -> u8 {
        let mut byte = (self.priority_level & 0x0F) << 2;
        if self.pre_emption_capability {
            byte |= 0x40;
        }
        if self.pre_emption_vulnerability {
            byte |= 0x01;
        }
        byte
    }

    pub fn decode(byte: u8) -> Self {
        Self {
            pre_emption_capability: byte & 0x40 != 0,
            priority_level: (byte >> 2) & 0x0F,
            pre_emption_vulnerability: byte & 0x01 != 0,
        }
    }
}
