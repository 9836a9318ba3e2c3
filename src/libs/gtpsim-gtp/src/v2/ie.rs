//! GTPv2 Information Elements
//!
//! TLV envelope, IE type registry and the polymorphic [`InformationElement`]
//! used by the message codec. Each concrete value layout lives in
//! [`super::ie_kinds`]; named-parameter builders live in [`super::ie_build`].

use std::net::IpAddr;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use crate::error::{GtpError, GtpResult};
use super::ie_kinds::{
    AmbrIe, BearerQosIe, CauseIe, FTeidIe, IndicationIe, PaaIe, UeTimeZoneIe, UliIe,
};
use super::types::{
    decode_bcd, decode_labels, digits_to_string, encode_bcd, encode_labels, parse_digits,
    Gtp2Arp, PlmnId,
};

/// IE header length: type(1) + length(2) + spare/instance(1)
pub const IE_HEADER_LEN: usize = 4;

/// Largest instance value (4 bits)
pub const MAX_IE_INSTANCE: u8 = 0x0F;

/// GTPv2 IE Types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Gtp2IeType {
    Imsi = 1,
    Cause = 2,
    Recovery = 3,
    Apn = 71,
    Ambr = 72,
    Ebi = 73,
    IpAddress = 74,
    Mei = 75,
    Msisdn = 76,
    Indication = 77,
    Pco = 78,
    Paa = 79,
    BearerQos = 80,
    RatType = 82,
    ServingNetwork = 83,
    BearerTft = 84,
    Uli = 86,
    FTeid = 87,
    DelayValue = 92,
    BearerContext = 93,
    ChargingId = 94,
    ChargingCharacteristics = 95,
    BearerFlags = 97,
    PdnType = 99,
    Pti = 100,
    PdnConnection = 109,
    UeTimeZone = 114,
    ApnRestriction = 127,
    SelectionMode = 128,
    NodeType = 135,
    Fqdn = 136,
    Arp = 155,
    OverloadControlInformation = 180,
    LoadControlInformation = 181,
}

/// Registry of IE types: (type, tag used by scenarios)
const IE_REGISTRY: &[(Gtp2IeType, &str)] = &[
    (Gtp2IeType::Imsi, "imsi"),
    (Gtp2IeType::Cause, "cause"),
    (Gtp2IeType::Recovery, "recovery"),
    (Gtp2IeType::Apn, "apn"),
    (Gtp2IeType::Ambr, "ambr"),
    (Gtp2IeType::Ebi, "ebi"),
    (Gtp2IeType::IpAddress, "ip_address"),
    (Gtp2IeType::Mei, "mei"),
    (Gtp2IeType::Msisdn, "msisdn"),
    (Gtp2IeType::Indication, "indication"),
    (Gtp2IeType::Pco, "pco"),
    (Gtp2IeType::Paa, "paa"),
    (Gtp2IeType::BearerQos, "bearer_qos"),
    (Gtp2IeType::RatType, "rat_type"),
    (Gtp2IeType::ServingNetwork, "serving_network"),
    (Gtp2IeType::BearerTft, "bearer_tft"),
    (Gtp2IeType::Uli, "uli"),
    (Gtp2IeType::FTeid, "f_teid"),
    (Gtp2IeType::DelayValue, "delay_value"),
    (Gtp2IeType::BearerContext, "bearer_context"),
    (Gtp2IeType::ChargingId, "charging_id"),
    (Gtp2IeType::ChargingCharacteristics, "charging_characteristics"),
    (Gtp2IeType::BearerFlags, "bearer_flags"),
    (Gtp2IeType::PdnType, "pdn_type"),
    (Gtp2IeType::Pti, "pti"),
    (Gtp2IeType::PdnConnection, "pdn_connection"),
    (Gtp2IeType::UeTimeZone, "ue_time_zone"),
    (Gtp2IeType::ApnRestriction, "apn_restriction"),
    (Gtp2IeType::SelectionMode, "selection_mode"),
    (Gtp2IeType::NodeType, "node_type"),
    (Gtp2IeType::Fqdn, "fqdn"),
    (Gtp2IeType::Arp, "arp"),
    (Gtp2IeType::OverloadControlInformation, "overload_control_information"),
    (Gtp2IeType::LoadControlInformation, "load_control_information"),
];

impl TryFrom<u8> for Gtp2IeType {
    type Error = GtpError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        IE_REGISTRY
            .iter()
            .find(|(ie_type, _)| *ie_type as u8 == value)
            .map(|(ie_type, _)| *ie_type)
            .ok_or(GtpError::InvalidIeType(value))
    }
}

impl Gtp2IeType {
    /// Scenario tag of this IE type
    pub fn tag(&self) -> &'static str {
        IE_REGISTRY
            .iter()
            .find(|(ie_type, _)| ie_type == self)
            .map_or("unknown", |(_, tag)| tag)
    }

    /// Look up an IE type by scenario tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        IE_REGISTRY
            .iter()
            .find(|(_, t)| t.eq_ignore_ascii_case(tag))
            .map(|(ie_type, _)| *ie_type)
    }

    /// Whether the IE value is itself a list of IEs
    pub fn is_grouped(&self) -> bool {
        matches!(
            self,
            Self::BearerContext
                | Self::PdnConnection
                | Self::OverloadControlInformation
                | Self::LoadControlInformation
        )
    }
}

// ============================================================================
// IE header
// ============================================================================

/// TLV envelope of one IE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IeHeader {
    pub ie_type: u8,
    /// Length of the value part
    pub length: u16,
    /// Instance (4 bits)
    pub instance: u8,
}

impl IeHeader {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.ie_type);
        buf.put_u16(self.length);
        buf.put_u8(self.instance & MAX_IE_INSTANCE);
    }

    /// Decode a header whose value must fit in `max_len` bytes (header included)
    pub fn decode(buf: &mut Bytes, max_len: usize) -> GtpResult<Self> {
        let limit = max_len.min(buf.remaining());
        if limit < IE_HEADER_LEN {
            return Err(GtpError::short(IE_HEADER_LEN, limit));
        }

        let ie_type = buf.get_u8();
        let length = buf.get_u16();
        let instance = buf.get_u8() & MAX_IE_INSTANCE;

        let available = limit - IE_HEADER_LEN;
        if length as usize > available {
            return Err(GtpError::InvalidIeLength {
                ie_type,
                declared: length as usize,
                available,
            });
        }

        Ok(Self {
            ie_type,
            length,
            instance,
        })
    }
}

// ============================================================================
// Information Element
// ============================================================================

/// Concrete value of an IE, one variant per supported kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IeKind {
    Imsi(String),
    Cause(CauseIe),
    Recovery(u8),
    Apn(String),
    Ambr(AmbrIe),
    Ebi(u8),
    IpAddress(IpAddr),
    Mei(String),
    Msisdn(String),
    Indication(IndicationIe),
    Pco(Bytes),
    Paa(PaaIe),
    BearerQos(BearerQosIe),
    RatType(u8),
    ServingNetwork(PlmnId),
    BearerTft(Bytes),
    Uli(UliIe),
    FTeid(FTeidIe),
    DelayValue(u8),
    BearerContext(GroupedIe),
    ChargingId(u32),
    ChargingCharacteristics(u16),
    BearerFlags(u8),
    PdnType(u8),
    Pti(u8),
    PdnConnection(GroupedIe),
    UeTimeZone(UeTimeZoneIe),
    ApnRestriction(u8),
    SelectionMode(u8),
    NodeType(u8),
    Fqdn(String),
    Arp(Gtp2Arp),
    OverloadControlInformation(GroupedIe),
    LoadControlInformation(GroupedIe),
    /// IE type outside the supported subset, carried opaquely
    Unknown { ie_type: u8, data: Bytes },
}

impl IeKind {
    /// Wire IE type of this value
    pub fn ie_type(&self) -> u8 {
        let ie_type = match self {
            Self::Imsi(_) => Gtp2IeType::Imsi,
            Self::Cause(_) => Gtp2IeType::Cause,
            Self::Recovery(_) => Gtp2IeType::Recovery,
            Self::Apn(_) => Gtp2IeType::Apn,
            Self::Ambr(_) => Gtp2IeType::Ambr,
            Self::Ebi(_) => Gtp2IeType::Ebi,
            Self::IpAddress(_) => Gtp2IeType::IpAddress,
            Self::Mei(_) => Gtp2IeType::Mei,
            Self::Msisdn(_) => Gtp2IeType::Msisdn,
            Self::Indication(_) => Gtp2IeType::Indication,
            Self::Pco(_) => Gtp2IeType::Pco,
            Self::Paa(_) => Gtp2IeType::Paa,
            Self::BearerQos(_) => Gtp2IeType::BearerQos,
            Self::RatType(_) => Gtp2IeType::RatType,
            Self::ServingNetwork(_) => Gtp2IeType::ServingNetwork,
            Self::BearerTft(_) => Gtp2IeType::BearerTft,
            Self::Uli(_) => Gtp2IeType::Uli,
            Self::FTeid(_) => Gtp2IeType::FTeid,
            Self::DelayValue(_) => Gtp2IeType::DelayValue,
            Self::BearerContext(_) => Gtp2IeType::BearerContext,
            Self::ChargingId(_) => Gtp2IeType::ChargingId,
            Self::ChargingCharacteristics(_) => Gtp2IeType::ChargingCharacteristics,
            Self::BearerFlags(_) => Gtp2IeType::BearerFlags,
            Self::PdnType(_) => Gtp2IeType::PdnType,
            Self::Pti(_) => Gtp2IeType::Pti,
            Self::PdnConnection(_) => Gtp2IeType::PdnConnection,
            Self::UeTimeZone(_) => Gtp2IeType::UeTimeZone,
            Self::ApnRestriction(_) => Gtp2IeType::ApnRestriction,
            Self::SelectionMode(_) => Gtp2IeType::SelectionMode,
            Self::NodeType(_) => Gtp2IeType::NodeType,
            Self::Fqdn(_) => Gtp2IeType::Fqdn,
            Self::Arp(_) => Gtp2IeType::Arp,
            Self::OverloadControlInformation(_) => Gtp2IeType::OverloadControlInformation,
            Self::LoadControlInformation(_) => Gtp2IeType::LoadControlInformation,
            Self::Unknown { ie_type, .. } => return *ie_type,
        };
        ie_type as u8
    }

    /// Encode the value part only
    fn encode_value(&self, buf: &mut BytesMut) -> GtpResult<()> {
        match self {
            Self::Imsi(digits) | Self::Mei(digits) | Self::Msisdn(digits) => {
                let parsed = parse_digits("digits", digits)?;
                buf.put_slice(&encode_bcd(&parsed));
            }
            Self::Cause(cause) => cause.encode(buf),
            Self::Recovery(v)
            | Self::RatType(v)
            | Self::DelayValue(v)
            | Self::BearerFlags(v)
            | Self::Pti(v)
            | Self::ApnRestriction(v)
            | Self::NodeType(v) => buf.put_u8(*v),
            Self::Ebi(ebi) => buf.put_u8(ebi & 0x0F),
            Self::PdnType(pdn_type) => buf.put_u8(pdn_type & 0x07),
            Self::SelectionMode(mode) => buf.put_u8(mode & 0x03),
            Self::Apn(name) | Self::Fqdn(name) => buf.put_slice(&encode_labels(name)?),
            Self::Ambr(ambr) => ambr.encode(buf),
            Self::IpAddress(IpAddr::V4(addr)) => buf.put_slice(&addr.octets()),
            Self::IpAddress(IpAddr::V6(addr)) => buf.put_slice(&addr.octets()),
            Self::Indication(indication) => buf.put_slice(&indication.octets),
            Self::Pco(data) | Self::BearerTft(data) => buf.put_slice(data),
            Self::Paa(paa) => paa.encode(buf),
            Self::BearerQos(qos) => qos.encode(buf),
            Self::ServingNetwork(plmn) => plmn.encode(buf),
            Self::Uli(uli) => uli.encode(buf),
            Self::FTeid(fteid) => fteid.encode(buf),
            Self::ChargingId(id) => buf.put_u32(*id),
            Self::ChargingCharacteristics(cc) => buf.put_u16(*cc),
            Self::UeTimeZone(tz) => tz.encode(buf),
            Self::Arp(arp) => buf.put_u8(arp.encode()),
            Self::BearerContext(group)
            | Self::PdnConnection(group)
            | Self::OverloadControlInformation(group)
            | Self::LoadControlInformation(group) => group.encode(buf)?,
            Self::Unknown { data, .. } => buf.put_slice(data),
        }
        Ok(())
    }

    /// Decode a value of the given IE type.
    ///
    /// This is the type registry: every supported type maps to exactly one
    /// constructor, everything else becomes [`IeKind::Unknown`].
    pub fn decode_value(ie_type: u8, value: Bytes) -> GtpResult<Self> {
        let Ok(known) = Gtp2IeType::try_from(ie_type) else {
            return Ok(Self::Unknown {
                ie_type,
                data: value,
            });
        };

        let kind = match known {
            Gtp2IeType::Imsi => Self::Imsi(digits_to_string(&decode_bcd(&value))?),
            Gtp2IeType::Mei => Self::Mei(digits_to_string(&decode_bcd(&value))?),
            Gtp2IeType::Msisdn => Self::Msisdn(digits_to_string(&decode_bcd(&value))?),
            Gtp2IeType::Cause => Self::Cause(CauseIe::decode(&value)?),
            Gtp2IeType::Recovery => Self::Recovery(first_octet(&value)?),
            Gtp2IeType::RatType => Self::RatType(first_octet(&value)?),
            Gtp2IeType::DelayValue => Self::DelayValue(first_octet(&value)?),
            Gtp2IeType::BearerFlags => Self::BearerFlags(first_octet(&value)?),
            Gtp2IeType::Pti => Self::Pti(first_octet(&value)?),
            Gtp2IeType::ApnRestriction => Self::ApnRestriction(first_octet(&value)?),
            Gtp2IeType::NodeType => Self::NodeType(first_octet(&value)?),
            Gtp2IeType::Ebi => Self::Ebi(first_octet(&value)? & 0x0F),
            Gtp2IeType::PdnType => Self::PdnType(first_octet(&value)? & 0x07),
            Gtp2IeType::SelectionMode => Self::SelectionMode(first_octet(&value)? & 0x03),
            Gtp2IeType::Apn => Self::Apn(decode_labels(&value)),
            Gtp2IeType::Fqdn => Self::Fqdn(decode_labels(&value)),
            Gtp2IeType::Ambr => Self::Ambr(AmbrIe::decode(&value)?),
            Gtp2IeType::IpAddress => Self::IpAddress(decode_ip_address(&value)?),
            Gtp2IeType::Indication => Self::Indication(IndicationIe {
                octets: value.to_vec(),
            }),
            Gtp2IeType::Pco => Self::Pco(value),
            Gtp2IeType::BearerTft => Self::BearerTft(value),
            Gtp2IeType::Paa => Self::Paa(PaaIe::decode(&value)?),
            Gtp2IeType::BearerQos => Self::BearerQos(BearerQosIe::decode(&value)?),
            Gtp2IeType::ServingNetwork => Self::ServingNetwork(PlmnId::decode(&value)?),
            Gtp2IeType::Uli => Self::Uli(UliIe::decode(&value)?),
            Gtp2IeType::FTeid => Self::FTeid(FTeidIe::decode(&value)?),
            Gtp2IeType::ChargingId => {
                if value.len() < 4 {
                    return Err(GtpError::short(4, value.len()));
                }
                Self::ChargingId(u32::from_be_bytes([value[0], value[1], value[2], value[3]]))
            }
            Gtp2IeType::ChargingCharacteristics => {
                if value.len() < 2 {
                    return Err(GtpError::short(2, value.len()));
                }
                Self::ChargingCharacteristics(u16::from_be_bytes([value[0], value[1]]))
            }
            Gtp2IeType::UeTimeZone => Self::UeTimeZone(UeTimeZoneIe::decode(&value)?),
            Gtp2IeType::Arp => Self::Arp(Gtp2Arp::decode(first_octet(&value)?)),
            Gtp2IeType::BearerContext => Self::BearerContext(GroupedIe::decode(value)?),
            Gtp2IeType::PdnConnection => Self::PdnConnection(GroupedIe::decode(value)?),
            Gtp2IeType::OverloadControlInformation => {
                Self::OverloadControlInformation(GroupedIe::decode(value)?)
            }
            Gtp2IeType::LoadControlInformation => {
                Self::LoadControlInformation(GroupedIe::decode(value)?)
            }
        };
        Ok(kind)
    }
}

fn first_octet(value: &Bytes) -> GtpResult<u8> {
    value.first().copied().ok_or(GtpError::short(1, 0))
}

fn decode_ip_address(value: &Bytes) -> GtpResult<IpAddr> {
    match value.len() {
        4 => Ok(IpAddr::from([value[0], value[1], value[2], value[3]])),
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&value[..16]);
            Ok(IpAddr::from(octets))
        }
        n => Err(GtpError::InvalidHeader(format!(
            "IP Address IE with {n} octets"
        ))),
    }
}

/// One IE: instance plus kind-specific value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InformationElement {
    /// IE Instance (4 bits)
    pub instance: u8,
    pub kind: IeKind,
}

impl InformationElement {
    pub fn new(instance: u8, kind: IeKind) -> Self {
        Self {
            instance: instance & MAX_IE_INSTANCE,
            kind,
        }
    }

    /// Build a grouped IE around already-built children
    pub fn grouped(
        ie_type: Gtp2IeType,
        instance: u8,
        ies: Vec<InformationElement>,
    ) -> GtpResult<Self> {
        let group = GroupedIe { ies };
        let kind = match ie_type {
            Gtp2IeType::BearerContext => IeKind::BearerContext(group),
            Gtp2IeType::PdnConnection => IeKind::PdnConnection(group),
            Gtp2IeType::OverloadControlInformation => IeKind::OverloadControlInformation(group),
            Gtp2IeType::LoadControlInformation => IeKind::LoadControlInformation(group),
            other => return Err(GtpError::InvalidIeType(other as u8)),
        };
        Ok(Self::new(instance, kind))
    }

    pub fn ie_type(&self) -> u8 {
        self.kind.ie_type()
    }

    /// Encode `[type:1][length:2][instance:1][value:length]`
    pub fn encode(&self, buf: &mut BytesMut) -> GtpResult<()> {
        let start = buf.len();
        IeHeader {
            ie_type: self.ie_type(),
            length: 0,
            instance: self.instance,
        }
        .encode(buf);

        self.kind.encode_value(buf)?;

        let value_len = buf.len() - start - IE_HEADER_LEN;
        let length = u16::try_from(value_len).map_err(|_| GtpError::MessageTooLong(value_len))?;
        buf[start + 1..start + 3].copy_from_slice(&length.to_be_bytes());
        Ok(())
    }

    /// Decode one IE from `buf`, never reading past `max_len` bytes.
    ///
    /// Returns the IE together with the number of bytes consumed.
    pub fn decode(buf: &mut Bytes, max_len: usize) -> GtpResult<(Self, usize)> {
        let header = IeHeader::decode(buf, max_len)?;
        let value = buf.split_to(header.length as usize);
        let kind = IeKind::decode_value(header.ie_type, value)?;
        Ok((
            Self {
                instance: header.instance,
                kind,
            },
            IE_HEADER_LEN + header.length as usize,
        ))
    }

    /// Get encoded length
    pub fn encoded_len(&self) -> GtpResult<usize> {
        let mut buf = BytesMut::new();
        self.encode(&mut buf)?;
        Ok(buf.len())
    }

    pub fn as_ebi(&self) -> Option<u8> {
        match self.kind {
            IeKind::Ebi(ebi) => Some(ebi),
            _ => None,
        }
    }

    pub fn as_fteid(&self) -> Option<&FTeidIe> {
        match &self.kind {
            IeKind::FTeid(fteid) => Some(fteid),
            _ => None,
        }
    }

    pub fn as_fteid_mut(&mut self) -> Option<&mut FTeidIe> {
        match &mut self.kind {
            IeKind::FTeid(fteid) => Some(fteid),
            _ => None,
        }
    }

    pub fn as_cause(&self) -> Option<&CauseIe> {
        match &self.kind {
            IeKind::Cause(cause) => Some(cause),
            _ => None,
        }
    }

    pub fn as_imsi(&self) -> Option<&str> {
        match &self.kind {
            IeKind::Imsi(imsi) => Some(imsi),
            _ => None,
        }
    }

    /// Nested IE list of a grouped IE
    pub fn as_grouped(&self) -> Option<&GroupedIe> {
        match &self.kind {
            IeKind::BearerContext(group)
            | IeKind::PdnConnection(group)
            | IeKind::OverloadControlInformation(group)
            | IeKind::LoadControlInformation(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_grouped_mut(&mut self) -> Option<&mut GroupedIe> {
        match &mut self.kind {
            IeKind::BearerContext(group)
            | IeKind::PdnConnection(group)
            | IeKind::OverloadControlInformation(group)
            | IeKind::LoadControlInformation(group) => Some(group),
            _ => None,
        }
    }
}

// ============================================================================
// Grouped IE
// ============================================================================

/// Ordered list of IEs nested inside a grouped IE
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupedIe {
    pub ies: Vec<InformationElement>,
}

impl GroupedIe {
    fn encode(&self, buf: &mut BytesMut) -> GtpResult<()> {
        for ie in &self.ies {
            ie.encode(buf)?;
        }
        Ok(())
    }

    fn decode(mut value: Bytes) -> GtpResult<Self> {
        let mut ies = Vec::new();
        while value.has_remaining() {
            let remaining = value.remaining();
            let (ie, _) = InformationElement::decode(&mut value, remaining)?;
            ies.push(ie);
        }
        Ok(Self { ies })
    }

    /// The `occurrence`-th (0-based) IE with this type and instance
    pub fn get(&self, ie_type: Gtp2IeType, instance: u8, occurrence: usize) -> Option<&InformationElement> {
        find_ie(&self.ies, ie_type as u8, instance, occurrence)
    }

    pub fn get_mut(
        &mut self,
        ie_type: Gtp2IeType,
        instance: u8,
        occurrence: usize,
    ) -> Option<&mut InformationElement> {
        self.ies
            .iter_mut()
            .filter(|ie| ie.ie_type() == ie_type as u8 && ie.instance == instance)
            .nth(occurrence)
    }

    /// Like [`GroupedIe::get`] but a missing IE is an error
    pub fn require(&self, ie_type: Gtp2IeType, instance: u8, occurrence: usize) -> GtpResult<&InformationElement> {
        self.get(ie_type, instance, occurrence)
            .ok_or(GtpError::IeNotFound {
                ie_type: ie_type as u8,
                instance,
                occurrence,
            })
    }

    pub fn count(&self, ie_type: Gtp2IeType, instance: u8) -> usize {
        count_ie(&self.ies, ie_type as u8, instance)
    }

    /// EBI carried at instance 0, the usual bearer identity of a BearerContext
    pub fn ebi(&self) -> Option<u8> {
        self.get(Gtp2IeType::Ebi, 0, 0).and_then(InformationElement::as_ebi)
    }
}

pub(crate) fn find_ie(
    ies: &[InformationElement],
    ie_type: u8,
    instance: u8,
    occurrence: usize,
) -> Option<&InformationElement> {
    ies.iter()
        .filter(|ie| ie.ie_type() == ie_type && ie.instance == instance)
        .nth(occurrence)
}

pub(crate) fn count_ie(ies: &[InformationElement], ie_type: u8, instance: u8) -> usize {
    ies.iter()
        .filter(|ie| ie.ie_type() == ie_type && ie.instance == instance)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn round_trip(ie: &InformationElement) -> InformationElement {
        let mut buf = BytesMut::new();
        ie.encode(&mut buf).unwrap();
        let len = buf.len();
        let mut bytes = buf.freeze();
        let (decoded, consumed) = InformationElement::decode(&mut bytes, len).unwrap();
        assert_eq!(consumed, len);
        decoded
    }

    #[test]
    fn test_registry_tags() {
        assert_eq!(Gtp2IeType::FTeid.tag(), "f_teid");
        assert_eq!(Gtp2IeType::from_tag("bearer_context"), Some(Gtp2IeType::BearerContext));
        assert_eq!(Gtp2IeType::from_tag("BEARER_CONTEXT"), Some(Gtp2IeType::BearerContext));
        assert_eq!(Gtp2IeType::from_tag("nope"), None);
        assert_eq!(Gtp2IeType::try_from(87).unwrap(), Gtp2IeType::FTeid);
        assert_eq!(Gtp2IeType::try_from(250), Err(GtpError::InvalidIeType(250)));
        for (ie_type, tag) in IE_REGISTRY {
            assert_eq!(Gtp2IeType::from_tag(tag), Some(*ie_type));
        }
    }

    #[test]
    fn test_recovery_wire_layout() {
        let ie = InformationElement::new(0, IeKind::Recovery(42));
        let mut buf = BytesMut::new();
        ie.encode(&mut buf).unwrap();

        assert_eq!(&buf[..], &[3, 0x00, 0x01, 0x00, 42]);
    }

    #[test]
    fn test_instance_in_low_nibble() {
        let ie = InformationElement::new(1, IeKind::Ebi(5));
        let mut buf = BytesMut::new();
        ie.encode(&mut buf).unwrap();
        assert_eq!(&buf[..], &[73, 0x00, 0x01, 0x01, 0x05]);
    }

    #[test]
    fn test_imsi_round_trip() {
        let ie = InformationElement::new(0, IeKind::Imsi("001010123456789".into()));
        let mut buf = BytesMut::new();
        ie.encode(&mut buf).unwrap();
        assert_eq!(u16::from_be_bytes([buf[1], buf[2]]), 8);
        assert_eq!(round_trip(&ie), ie);
    }

    #[test]
    fn test_imsi_with_hex_nibble_fails_decode() {
        // Second octet carries 0xB as a digit
        let mut bytes = Bytes::from_static(&[1, 0x00, 0x03, 0x00, 0x10, 0x1B, 0xF1]);
        assert!(matches!(
            InformationElement::decode(&mut bytes, 7),
            Err(GtpError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_apn_oversized_label_fails_encode() {
        let ie = InformationElement::new(0, IeKind::Apn("a".repeat(256)));
        let mut buf = BytesMut::new();
        assert!(matches!(
            ie.encode(&mut buf),
            Err(GtpError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_overlong_length() {
        // EBI claiming 4 value bytes with only 1 present
        let mut bytes = Bytes::from_static(&[73, 0x00, 0x04, 0x00, 0x05]);
        let err = InformationElement::decode(&mut bytes, 5).unwrap_err();
        assert_eq!(
            err,
            GtpError::InvalidIeLength {
                ie_type: 73,
                declared: 4,
                available: 1
            }
        );
    }

    #[test]
    fn test_decode_respects_max_len() {
        // Enough bytes in the buffer but the caller only allows 4
        let mut bytes = Bytes::from_static(&[73, 0x00, 0x01, 0x00, 0x05]);
        assert!(matches!(
            InformationElement::decode(&mut bytes, 4),
            Err(GtpError::InvalidIeLength { declared: 1, available: 0, .. })
        ));
    }

    #[test]
    fn test_unknown_ie_passthrough() {
        let ie = InformationElement::new(
            2,
            IeKind::Unknown {
                ie_type: 254,
                data: Bytes::from_static(&[1, 2, 3]),
            },
        );
        assert_eq!(round_trip(&ie), ie);
    }

    #[test]
    fn test_bearer_context_lookup() {
        let bearer = InformationElement::grouped(
            Gtp2IeType::BearerContext,
            0,
            vec![
                InformationElement::new(0, IeKind::Ebi(5)),
                InformationElement::new(
                    0,
                    IeKind::FTeid(FTeidIe::ipv4(0, 0x100, Ipv4Addr::LOCALHOST)),
                ),
                InformationElement::new(
                    2,
                    IeKind::FTeid(FTeidIe::ipv4(4, 0x200, Ipv4Addr::LOCALHOST)),
                ),
            ],
        )
        .unwrap();

        let decoded = round_trip(&bearer);
        assert_eq!(decoded, bearer);

        let group = decoded.as_grouped().unwrap();
        assert_eq!(group.ebi(), Some(5));
        assert_eq!(group.count(Gtp2IeType::FTeid, 0), 1);
        assert_eq!(
            group.get(Gtp2IeType::FTeid, 2, 0).and_then(|ie| ie.as_fteid()).map(|f| f.teid),
            Some(0x200)
        );
        assert!(group.require(Gtp2IeType::FTeid, 1, 0).is_err());
    }

    #[test]
    fn test_grouped_rejects_plain_type() {
        assert!(InformationElement::grouped(Gtp2IeType::Ebi, 0, vec![]).is_err());
    }

    #[test]
    fn test_nested_invalid_length_fails() {
        // Bearer context whose nested EBI overruns the group
        let mut bytes = Bytes::from_static(&[93, 0x00, 0x05, 0x00, 73, 0x00, 0x02, 0x00, 0x05]);
        assert!(matches!(
            InformationElement::decode(&mut bytes, 9),
            Err(GtpError::InvalidIeLength { ie_type: 73, .. })
        ));
    }

    #[test]
    fn test_ip_address_lengths() {
        let v4 = InformationElement::new(0, IeKind::IpAddress(IpAddr::from([10, 0, 0, 1])));
        assert_eq!(round_trip(&v4), v4);
        let v6 = InformationElement::new(0, IeKind::IpAddress("2001:db8::1".parse().unwrap()));
        assert_eq!(round_trip(&v6), v6);

        let mut bytes = Bytes::from_static(&[74, 0x00, 0x02, 0x00, 1, 2]);
        assert!(InformationElement::decode(&mut bytes, 6).is_err());
    }
}
