//! Value layouts of the multi-field GTPv2 IEs
//!
//! Each type here only knows its value part; the TLV envelope is written by
//! [`super::ie::InformationElement`].

use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::{BufMut, BytesMut};
use crate::error::{GtpError, GtpResult};
use super::types::{Gtp2Arp, PlmnId};

fn ensure_len(value: &[u8], needed: usize) -> GtpResult<()> {
    if value.len() < needed {
        return Err(GtpError::short(needed, value.len()));
    }
    Ok(())
}

fn read_u16(value: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([value[offset], value[offset + 1]])
}

fn read_u32(value: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        value[offset],
        value[offset + 1],
        value[offset + 2],
        value[offset + 3],
    ])
}

fn read_ipv6(value: &[u8], offset: usize) -> Ipv6Addr {
    let mut octets = [0u8; 16];
    octets.copy_from_slice(&value[offset..offset + 16]);
    Ipv6Addr::from(octets)
}

// ============================================================================
// Cause
// ============================================================================

/// IE that caused a rejection, echoed back in the Cause IE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffendingIe {
    pub ie_type: u8,
    pub length: u16,
    pub instance: u8,
}

/// Cause IE (TS 29.274 8.4)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CauseIe {
    pub value: u8,
    /// PDN Connection IE Error
    pub pce: bool,
    /// Bearer Context IE Error
    pub bce: bool,
    /// Cause Source
    pub cs: bool,
    pub offending: Option<OffendingIe>,
}

impl CauseIe {
    pub fn new(value: u8) -> Self {
        Self {
            value,
            pce: false,
            bce: false,
            cs: false,
            offending: None,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.value);

        let mut flags = 0u8;
        if self.pce {
            flags |= 0x04;
        }
        if self.bce {
            flags |= 0x02;
        }
        if self.cs {
            flags |= 0x01;
        }
        buf.put_u8(flags);

        if let Some(offending) = &self.offending {
            buf.put_u8(offending.ie_type);
            buf.put_u16(offending.length);
            buf.put_u8(offending.instance & 0x0F);
        }
    }

    pub fn decode(value: &[u8]) -> GtpResult<Self> {
        ensure_len(value, 2)?;
        let flags = value[1];

        let offending = if value.len() >= 6 {
            Some(OffendingIe {
                ie_type: value[2],
                length: read_u16(value, 3),
                instance: value[5] & 0x0F,
            })
        } else {
            None
        };

        Ok(Self {
            value: value[0],
            pce: flags & 0x04 != 0,
            bce: flags & 0x02 != 0,
            cs: flags & 0x01 != 0,
            offending,
        })
    }
}

// ============================================================================
// AMBR
// ============================================================================

/// AMBR IE (Aggregate Maximum Bit Rate, kbps)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AmbrIe {
    pub uplink: u32,
    pub downlink: u32,
}

impl AmbrIe {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.uplink);
        buf.put_u32(self.downlink);
    }

    pub fn decode(value: &[u8]) -> GtpResult<Self> {
        ensure_len(value, 8)?;
        Ok(Self {
            uplink: read_u32(value, 0),
            downlink: read_u32(value, 4),
        })
    }
}

// ============================================================================
// Indication
// ============================================================================

/// Named Indication flags: (name, octet index, bit mask)
pub const INDICATION_FLAGS: &[(&str, usize, u8)] = &[
    ("daf", 0, 0x80),
    ("dtf", 0, 0x40),
    ("hi", 0, 0x20),
    ("dfi", 0, 0x10),
    ("oi", 0, 0x08),
    ("isrsi", 0, 0x04),
    ("israi", 0, 0x02),
    ("sgwci", 0, 0x01),
    ("sqci", 1, 0x80),
    ("uimsi", 1, 0x40),
    ("cfsi", 1, 0x20),
    ("crsi", 1, 0x10),
    ("p", 1, 0x08),
    ("pt", 1, 0x04),
    ("si", 1, 0x02),
    ("msv", 1, 0x01),
    ("retloc", 2, 0x80),
    ("pbic", 2, 0x40),
    ("srni", 2, 0x20),
    ("s6af", 2, 0x10),
    ("s4af", 2, 0x08),
    ("mbmdt", 2, 0x04),
    ("israu", 2, 0x02),
    ("ccrsi", 2, 0x01),
    ("cprai", 3, 0x80),
    ("arrl", 3, 0x40),
    ("ppof", 3, 0x20),
    ("ppon", 3, 0x10),
    ("ppsi", 3, 0x08),
    ("csfbi", 3, 0x04),
    ("clii", 3, 0x02),
    ("cpsr", 3, 0x01),
];

/// Indication IE: a presence bitmask spread over one or more octets
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndicationIe {
    pub octets: Vec<u8>,
}

impl IndicationIe {
    /// Set a named flag, growing the octet list as needed.
    ///
    /// Returns false when the flag name is not known.
    pub fn set(&mut self, name: &str) -> bool {
        let Some((_, octet, mask)) = INDICATION_FLAGS
            .iter()
            .find(|(flag, _, _)| flag.eq_ignore_ascii_case(name))
        else {
            return false;
        };
        if self.octets.len() <= *octet {
            self.octets.resize(octet + 1, 0);
        }
        self.octets[*octet] |= mask;
        true
    }

    pub fn is_set(&self, name: &str) -> bool {
        INDICATION_FLAGS
            .iter()
            .find(|(flag, _, _)| flag.eq_ignore_ascii_case(name))
            .is_some_and(|(_, octet, mask)| {
                self.octets.get(*octet).is_some_and(|o| o & mask != 0)
            })
    }
}

// ============================================================================
// PAA
// ============================================================================

/// PDN types carried by PAA and PDN Type IEs
pub mod pdn_type {
    pub const IPV4: u8 = 1;
    pub const IPV6: u8 = 2;
    pub const IPV4V6: u8 = 3;
}

/// PAA IE (PDN Address Allocation)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaaIe {
    Ipv4(Ipv4Addr),
    Ipv6 { prefix_len: u8, addr: Ipv6Addr },
    Ipv4v6 { prefix_len: u8, ipv6: Ipv6Addr, ipv4: Ipv4Addr },
}

impl PaaIe {
    pub fn pdn_type(&self) -> u8 {
        match self {
            Self::Ipv4(_) => pdn_type::IPV4,
            Self::Ipv6 { .. } => pdn_type::IPV6,
            Self::Ipv4v6 { .. } => pdn_type::IPV4V6,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.pdn_type());
        match self {
            Self::Ipv4(addr) => buf.put_slice(&addr.octets()),
            Self::Ipv6 { prefix_len, addr } => {
                buf.put_u8(*prefix_len);
                buf.put_slice(&addr.octets());
            }
            Self::Ipv4v6 {
                prefix_len,
                ipv6,
                ipv4,
            } => {
                buf.put_u8(*prefix_len);
                buf.put_slice(&ipv6.octets());
                buf.put_slice(&ipv4.octets());
            }
        }
    }

    pub fn decode(value: &[u8]) -> GtpResult<Self> {
        ensure_len(value, 1)?;
        match value[0] & 0x07 {
            pdn_type::IPV4 => {
                ensure_len(value, 5)?;
                Ok(Self::Ipv4(Ipv4Addr::new(value[1], value[2], value[3], value[4])))
            }
            pdn_type::IPV6 => {
                ensure_len(value, 18)?;
                Ok(Self::Ipv6 {
                    prefix_len: value[1],
                    addr: read_ipv6(value, 2),
                })
            }
            pdn_type::IPV4V6 => {
                ensure_len(value, 22)?;
                Ok(Self::Ipv4v6 {
                    prefix_len: value[1],
                    ipv6: read_ipv6(value, 2),
                    ipv4: Ipv4Addr::new(value[18], value[19], value[20], value[21]),
                })
            }
            other => Err(GtpError::InvalidPdnType(other)),
        }
    }
}

// ============================================================================
// Bearer QoS
// ============================================================================

/// Largest bit rate representable in the 5-octet QoS fields
pub const MAX_QOS_BITRATE: u64 = 0xFF_FFFF_FFFF;

/// Bearer QoS IE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BearerQosIe {
    pub arp: Gtp2Arp,
    pub qci: u8,
    pub mbr_ul: u64,
    pub mbr_dl: u64,
    pub gbr_ul: u64,
    pub gbr_dl: u64,
}

impl BearerQosIe {
    pub const LEN: usize = 22;

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.arp.encode());
        buf.put_u8(self.qci);
        for rate in [self.mbr_ul, self.mbr_dl, self.gbr_ul, self.gbr_dl] {
            buf.put_slice(&rate.min(MAX_QOS_BITRATE).to_be_bytes()[3..8]);
        }
    }

    pub fn decode(value: &[u8]) -> GtpResult<Self> {
        ensure_len(value, Self::LEN)?;
        let rate = |offset: usize| {
            let mut octets = [0u8; 8];
            octets[3..8].copy_from_slice(&value[offset..offset + 5]);
            u64::from_be_bytes(octets)
        };
        Ok(Self {
            arp: Gtp2Arp::decode(value[0]),
            qci: value[1],
            mbr_ul: rate(2),
            mbr_dl: rate(7),
            gbr_ul: rate(12),
            gbr_dl: rate(17),
        })
    }
}

// ============================================================================
// F-TEID
// ============================================================================

/// F-TEID IE (Fully Qualified TEID)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FTeidIe {
    /// Interface type (6 bits)
    pub interface_type: u8,
    pub teid: u32,
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
}

impl FTeidIe {
    pub fn ipv4(interface_type: u8, teid: u32, addr: Ipv4Addr) -> Self {
        Self {
            interface_type,
            teid,
            ipv4: Some(addr),
            ipv6: None,
        }
    }

    pub fn ipv6(interface_type: u8, teid: u32, addr: Ipv6Addr) -> Self {
        Self {
            interface_type,
            teid,
            ipv4: None,
            ipv6: Some(addr),
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        let mut flags = self.interface_type & 0x3F;
        if self.ipv4.is_some() {
            flags |= 0x80;
        }
        if self.ipv6.is_some() {
            flags |= 0x40;
        }
        buf.put_u8(flags);
        buf.put_u32(self.teid);
        if let Some(addr) = &self.ipv4 {
            buf.put_slice(&addr.octets());
        }
        if let Some(addr) = &self.ipv6 {
            buf.put_slice(&addr.octets());
        }
    }

    pub fn decode(value: &[u8]) -> GtpResult<Self> {
        ensure_len(value, 5)?;
        let flags = value[0];
        let mut offset = 5;

        let ipv4 = if flags & 0x80 != 0 {
            ensure_len(value, offset + 4)?;
            let addr = Ipv4Addr::new(
                value[offset],
                value[offset + 1],
                value[offset + 2],
                value[offset + 3],
            );
            offset += 4;
            Some(addr)
        } else {
            None
        };

        let ipv6 = if flags & 0x40 != 0 {
            ensure_len(value, offset + 16)?;
            Some(read_ipv6(value, offset))
        } else {
            None
        };

        Ok(Self {
            interface_type: flags & 0x3F,
            teid: read_u32(value, 1),
            ipv4,
            ipv6,
        })
    }
}

// ============================================================================
// ULI
// ============================================================================

/// ULI presence flags, in wire order
pub mod uli_flag {
    pub const CGI: u8 = 0x01;
    pub const SAI: u8 = 0x02;
    pub const RAI: u8 = 0x04;
    pub const TAI: u8 = 0x08;
    pub const ECGI: u8 = 0x10;
    pub const LAI: u8 = 0x20;
    pub const MACRO_ENB: u8 = 0x40;
    pub const EXT_MACRO_ENB: u8 = 0x80;
}

/// PLMN plus a 16-bit area code and a 16-bit cell/service/routing code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AreaCode {
    pub plmn: PlmnId,
    pub lac: u16,
    pub code: u16,
}

impl AreaCode {
    const LEN: usize = 7;

    fn encode(&self, buf: &mut BytesMut) {
        self.plmn.encode(buf);
        buf.put_u16(self.lac);
        buf.put_u16(self.code);
    }

    fn decode(value: &[u8]) -> GtpResult<Self> {
        ensure_len(value, Self::LEN)?;
        Ok(Self {
            plmn: PlmnId::decode(value)?,
            lac: read_u16(value, 3),
            code: read_u16(value, 5),
        })
    }
}

/// PLMN plus a 16-bit code (TAI, LAI)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlmnCode16 {
    pub plmn: PlmnId,
    pub code: u16,
}

/// PLMN plus a 32-bit identity (ECGI, eNodeB IDs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlmnId32 {
    pub plmn: PlmnId,
    pub id: u32,
}

/// Extended Macro eNodeB ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtMacroEnb {
    pub plmn: PlmnId,
    /// Short Macro eNodeB flag
    pub smenb: bool,
    /// 21-bit identity (18-bit when `smenb`)
    pub id: u32,
}

/// ULI IE (User Location Information)
///
/// Each present location component sets its bit in the leading flags
/// octet and follows in bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UliIe {
    /// CGI: `code` is the Cell Identity
    pub cgi: Option<AreaCode>,
    /// SAI: `code` is the Service Area Code
    pub sai: Option<AreaCode>,
    /// RAI: `code` is the Routing Area Code
    pub rai: Option<AreaCode>,
    pub tai: Option<PlmnCode16>,
    /// ECGI: 28-bit E-UTRAN Cell Identifier
    pub ecgi: Option<PlmnId32>,
    pub lai: Option<PlmnCode16>,
    /// 20-bit Macro eNodeB ID
    pub macro_enb: Option<PlmnId32>,
    pub ext_macro_enb: Option<ExtMacroEnb>,
}

impl UliIe {
    pub fn flags(&self) -> u8 {
        let mut flags = 0;
        for (present, flag) in [
            (self.cgi.is_some(), uli_flag::CGI),
            (self.sai.is_some(), uli_flag::SAI),
            (self.rai.is_some(), uli_flag::RAI),
            (self.tai.is_some(), uli_flag::TAI),
            (self.ecgi.is_some(), uli_flag::ECGI),
            (self.lai.is_some(), uli_flag::LAI),
            (self.macro_enb.is_some(), uli_flag::MACRO_ENB),
            (self.ext_macro_enb.is_some(), uli_flag::EXT_MACRO_ENB),
        ] {
            if present {
                flags |= flag;
            }
        }
        flags
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.flags());
        for area in [&self.cgi, &self.sai, &self.rai].into_iter().flatten() {
            area.encode(buf);
        }
        if let Some(tai) = &self.tai {
            tai.plmn.encode(buf);
            buf.put_u16(tai.code);
        }
        if let Some(ecgi) = &self.ecgi {
            ecgi.plmn.encode(buf);
            buf.put_u32(ecgi.id & 0x0FFF_FFFF);
        }
        if let Some(lai) = &self.lai {
            lai.plmn.encode(buf);
            buf.put_u16(lai.code);
        }
        if let Some(enb) = &self.macro_enb {
            enb.plmn.encode(buf);
            let id = enb.id & 0x000F_FFFF;
            buf.put_u8((id >> 16) as u8);
            buf.put_u16(id as u16);
        }
        if let Some(enb) = &self.ext_macro_enb {
            enb.plmn.encode(buf);
            let id = enb.id & 0x001F_FFFF;
            let mut high = (id >> 16) as u8;
            if enb.smenb {
                high |= 0x80;
            }
            buf.put_u8(high);
            buf.put_u16(id as u16);
        }
    }

    pub fn decode(value: &[u8]) -> GtpResult<Self> {
        ensure_len(value, 1)?;
        let flags = value[0];
        let mut rest = &value[1..];
        let mut uli = Self::default();

        if flags & uli_flag::CGI != 0 {
            uli.cgi = Some(AreaCode::decode(take_field(&mut rest, AreaCode::LEN)?)?);
        }
        if flags & uli_flag::SAI != 0 {
            uli.sai = Some(AreaCode::decode(take_field(&mut rest, AreaCode::LEN)?)?);
        }
        if flags & uli_flag::RAI != 0 {
            uli.rai = Some(AreaCode::decode(take_field(&mut rest, AreaCode::LEN)?)?);
        }
        if flags & uli_flag::TAI != 0 {
            let field = take_field(&mut rest, 5)?;
            uli.tai = Some(PlmnCode16 {
                plmn: PlmnId::decode(field)?,
                code: read_u16(field, 3),
            });
        }
        if flags & uli_flag::ECGI != 0 {
            let field = take_field(&mut rest, 7)?;
            uli.ecgi = Some(PlmnId32 {
                plmn: PlmnId::decode(field)?,
                id: read_u32(field, 3) & 0x0FFF_FFFF,
            });
        }
        if flags & uli_flag::LAI != 0 {
            let field = take_field(&mut rest, 5)?;
            uli.lai = Some(PlmnCode16 {
                plmn: PlmnId::decode(field)?,
                code: read_u16(field, 3),
            });
        }
        if flags & uli_flag::MACRO_ENB != 0 {
            let field = take_field(&mut rest, 6)?;
            uli.macro_enb = Some(PlmnId32 {
                plmn: PlmnId::decode(field)?,
                id: (u32::from(field[3] & 0x0F) << 16) | u32::from(read_u16(field, 4)),
            });
        }
        if flags & uli_flag::EXT_MACRO_ENB != 0 {
            let field = take_field(&mut rest, 6)?;
            uli.ext_macro_enb = Some(ExtMacroEnb {
                plmn: PlmnId::decode(field)?,
                smenb: field[3] & 0x80 != 0,
                id: (u32::from(field[3] & 0x1F) << 16) | u32::from(read_u16(field, 4)),
            });
        }

        Ok(uli)
    }
}

fn take_field<'a>(rest: &mut &'a [u8], len: usize) -> GtpResult<&'a [u8]> {
    ensure_len(rest, len)?;
    let (head, tail) = rest.split_at(len);
    *rest = tail;
    Ok(head)
}

// ============================================================================
// UE Time Zone
// ============================================================================

/// UE Time Zone IE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UeTimeZoneIe {
    /// Time zone octet as defined in TS 24.008 (quarter hours, BCD swapped)
    pub time_zone: u8,
    /// Daylight saving time adjustment (2 bits)
    pub daylight_saving: u8,
}

impl UeTimeZoneIe {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.time_zone);
        buf.put_u8(self.daylight_saving & 0x03);
    }

    pub fn decode(value: &[u8]) -> GtpResult<Self> {
        ensure_len(value, 2)?;
        Ok(Self {
            time_zone: value[0],
            daylight_saving: value[1] & 0x03,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plmn() -> PlmnId {
        PlmnId::from_digits("001", "01").unwrap()
    }

    #[test]
    fn test_cause_without_offending_ie() {
        let mut cause = CauseIe::new(16);
        cause.cs = true;
        let mut buf = BytesMut::new();
        cause.encode(&mut buf);
        assert_eq!(&buf[..], &[16, 0x01]);
        assert_eq!(CauseIe::decode(&buf).unwrap(), cause);
    }

    #[test]
    fn test_cause_with_offending_ie() {
        let mut cause = CauseIe::new(70);
        cause.offending = Some(OffendingIe {
            ie_type: 87,
            length: 9,
            instance: 1,
        });
        let mut buf = BytesMut::new();
        cause.encode(&mut buf);
        assert_eq!(buf.len(), 6);
        assert_eq!(CauseIe::decode(&buf).unwrap(), cause);
    }

    #[test]
    fn test_indication_flags() {
        let mut indication = IndicationIe::default();
        assert!(indication.set("sgwci"));
        assert!(indication.set("MSV"));
        assert!(!indication.set("bogus"));
        assert_eq!(indication.octets, vec![0x01, 0x01]);
        assert!(indication.is_set("msv"));
        assert!(!indication.is_set("daf"));
    }

    #[test]
    fn test_paa_variants() {
        for paa in [
            PaaIe::Ipv4(Ipv4Addr::new(10, 45, 0, 2)),
            PaaIe::Ipv6 {
                prefix_len: 64,
                addr: "2001:db8::".parse().unwrap(),
            },
            PaaIe::Ipv4v6 {
                prefix_len: 64,
                ipv6: "2001:db8::".parse().unwrap(),
                ipv4: Ipv4Addr::new(10, 45, 0, 2),
            },
        ] {
            let mut buf = BytesMut::new();
            paa.encode(&mut buf);
            assert_eq!(PaaIe::decode(&buf).unwrap(), paa);
        }
        assert_eq!(PaaIe::decode(&[0x05]), Err(GtpError::InvalidPdnType(5)));
    }

    #[test]
    fn test_bearer_qos_layout() {
        let qos = BearerQosIe {
            arp: Gtp2Arp {
                pre_emption_capability: true,
                priority_level: 9,
                pre_emption_vulnerability: false,
            },
            qci: 9,
            mbr_ul: 1_000_000,
            mbr_dl: 2_000_000,
            gbr_ul: 0,
            gbr_dl: MAX_QOS_BITRATE,
        };
        let mut buf = BytesMut::new();
        qos.encode(&mut buf);
        assert_eq!(buf.len(), BearerQosIe::LEN);
        assert_eq!(buf[0], 0x40 | (9 << 2));
        assert_eq!(BearerQosIe::decode(&buf).unwrap(), qos);
    }

    #[test]
    fn test_fteid_address_combinations() {
        let v4 = Ipv4Addr::new(192, 168, 1, 1);
        let v6: Ipv6Addr = "2001:db8::1".parse().unwrap();
        for (ipv4, ipv6, len) in [
            (None, None, 5),
            (Some(v4), None, 9),
            (None, Some(v6), 21),
            (Some(v4), Some(v6), 25),
        ] {
            let fteid = FTeidIe {
                interface_type: 10,
                teid: 0xDEAD_BEEF,
                ipv4,
                ipv6,
            };
            let mut buf = BytesMut::new();
            fteid.encode(&mut buf);
            assert_eq!(buf.len(), len);
            assert_eq!(FTeidIe::decode(&buf).unwrap(), fteid);
        }
    }

    #[test]
    fn test_fteid_truncated_address() {
        // V4 flag set but no address
        assert!(FTeidIe::decode(&[0x80 | 10, 0, 0, 0, 1]).is_err());
    }

    #[test]
    fn test_uli_tai_ecgi() {
        let uli = UliIe {
            tai: Some(PlmnCode16 {
                plmn: plmn(),
                code: 0x0001,
            }),
            ecgi: Some(PlmnId32 {
                plmn: plmn(),
                id: 0x0000_0101,
            }),
            ..Default::default()
        };
        assert_eq!(uli.flags(), uli_flag::TAI | uli_flag::ECGI);

        let mut buf = BytesMut::new();
        uli.encode(&mut buf);
        assert_eq!(buf.len(), 1 + 5 + 7);
        assert_eq!(UliIe::decode(&buf).unwrap(), uli);
    }

    #[test]
    fn test_uli_all_components() {
        let area = AreaCode {
            plmn: plmn(),
            lac: 0x1234,
            code: 0x5678,
        };
        let uli = UliIe {
            cgi: Some(area),
            sai: Some(area),
            rai: Some(area),
            tai: Some(PlmnCode16 { plmn: plmn(), code: 7 }),
            ecgi: Some(PlmnId32 { plmn: plmn(), id: 0x0ABC_DEF1 }),
            lai: Some(PlmnCode16 { plmn: plmn(), code: 8 }),
            macro_enb: Some(PlmnId32 { plmn: plmn(), id: 0x000F_0001 }),
            ext_macro_enb: Some(ExtMacroEnb {
                plmn: plmn(),
                smenb: true,
                id: 0x001F_0002,
            }),
        };
        assert_eq!(uli.flags(), 0xFF);

        let mut buf = BytesMut::new();
        uli.encode(&mut buf);
        assert_eq!(UliIe::decode(&buf).unwrap(), uli);
    }

    #[test]
    fn test_uli_missing_component() {
        // TAI flagged but only 2 octets follow
        assert!(UliIe::decode(&[uli_flag::TAI, 0x00, 0xF1]).is_err());
    }
}
