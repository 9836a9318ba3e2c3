//! Building IEs from named parameters
//!
//! Outgoing messages are described by scenario templates: an IE type plus a
//! flat list of `name = value` strings. Each IE kind declares the names it
//! understands. Unknown names are logged and skipped, missing names fall back
//! to defaults, and a value that does not parse is an error.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use bytes::Bytes;
use crate::error::{GtpError, GtpResult};
use super::ie::{Gtp2IeType, IeKind, InformationElement};
use super::ie_kinds::{
    pdn_type, AmbrIe, AreaCode, BearerQosIe, CauseIe, ExtMacroEnb, FTeidIe, IndicationIe,
    OffendingIe, PaaIe, PlmnCode16, PlmnId32, UeTimeZoneIe, UliIe, MAX_QOS_BITRATE,
};
use super::types::{
    parse_digits, Gtp2Arp, PlmnId, MAX_IMSI_DIGITS, MAX_MEI_DIGITS, MAX_MSISDN_DIGITS,
};

/// Default PLMN used when a template gives no MCC/MNC
const DEFAULT_MCC: &str = "001";
const DEFAULT_MNC: &str = "01";

/// Named build parameters of one IE
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IeParams {
    values: BTreeMap<String, String>,
}

impl IeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Integer parameter, decimal or `0x` hex, range-checked into `T`
    pub fn int<T: TryFrom<u64>>(&self, name: &str) -> GtpResult<Option<T>> {
        let Some(raw) = self.get(name) else {
            return Ok(None);
        };
        let trimmed = raw.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => trimmed.parse::<u64>(),
        }
        .map_err(|e| GtpError::invalid_param(name, raw, e.to_string()))?;

        T::try_from(parsed)
            .map(Some)
            .map_err(|_| GtpError::invalid_param(name, raw, "value out of range"))
    }

    pub fn int_or<T: TryFrom<u64>>(&self, name: &str, default: T) -> GtpResult<T> {
        Ok(self.int(name)?.unwrap_or(default))
    }

    pub fn flag(&self, name: &str) -> GtpResult<bool> {
        let Some(raw) = self.get(name) else {
            return Ok(false);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(GtpError::invalid_param(name, raw, "expected a boolean")),
        }
    }

    /// Any `FromStr` value (addresses mostly)
    pub fn parsed<T>(&self, name: &str) -> GtpResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(name)
            .map(|raw| {
                raw.trim()
                    .parse::<T>()
                    .map_err(|e| GtpError::invalid_param(name, raw, e.to_string()))
            })
            .transpose()
    }

    /// Hex-encoded octet string, e.g. `8080211001000010`
    pub fn hex(&self, name: &str) -> GtpResult<Option<Bytes>> {
        let Some(raw) = self.get(name) else {
            return Ok(None);
        };
        let cleaned: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let digits = cleaned
            .strip_prefix("0x")
            .or_else(|| cleaned.strip_prefix("0X"))
            .unwrap_or(&cleaned);
        if digits.len() % 2 != 0 {
            return Err(GtpError::invalid_param(name, raw, "odd number of hex digits"));
        }
        let nibble = |b: u8| char::from(b).to_digit(16);
        let octets = digits
            .as_bytes()
            .chunks(2)
            .map(|pair| match (nibble(pair[0]), nibble(pair[1])) {
                (Some(high), Some(low)) => Ok(((high << 4) | low) as u8),
                _ => Err(GtpError::invalid_param(name, raw, "expected hex digits")),
            })
            .collect::<GtpResult<Vec<u8>>>()?;
        Ok(Some(Bytes::from(octets)))
    }

    fn plmn(&self) -> GtpResult<PlmnId> {
        PlmnId::from_digits(
            self.get("mcc").unwrap_or(DEFAULT_MCC),
            self.get("mnc").unwrap_or(DEFAULT_MNC),
        )
    }

    /// Log every parameter name the IE kind does not understand
    fn warn_unknown(&self, ie_type: Gtp2IeType, accepted: &[&str]) {
        for name in self.values.keys() {
            if !accepted.contains(&name.as_str()) {
                log::warn!(
                    "IE {}: ignoring unknown parameter '{}'",
                    ie_type.tag(),
                    name
                );
            }
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for IeParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn digits_param(params: &IeParams, max_digits: usize) -> GtpResult<String> {
    let Some(raw) = params.get("value") else {
        return Ok(String::new());
    };
    let digits = parse_digits("value", raw)?;
    if digits.len() > max_digits {
        return Err(GtpError::invalid_param(
            "value",
            raw,
            format!("at most {max_digits} digits"),
        ));
    }
    Ok(raw.to_string())
}

fn arp_params(params: &IeParams) -> GtpResult<Gtp2Arp> {
    let priority_level: u8 = params.int_or("pl", 0)?;
    if priority_level > 0x0F {
        return Err(GtpError::invalid_param(
            "pl",
            &priority_level.to_string(),
            "priority level is 4 bits",
        ));
    }
    Ok(Gtp2Arp {
        pre_emption_capability: params.flag("pci")?,
        priority_level,
        pre_emption_vulnerability: params.flag("pvi")?,
    })
}

fn bitrate(params: &IeParams, name: &str) -> GtpResult<u64> {
    let rate: u64 = params.int_or(name, 0)?;
    if rate > MAX_QOS_BITRATE {
        return Err(GtpError::invalid_param(name, &rate.to_string(), "exceeds 40 bits"));
    }
    Ok(rate)
}

const ULI_PARAMS: &[&str] = &[
    "mcc",
    "mnc",
    "cgi_lac",
    "cgi_ci",
    "sai_lac",
    "sai_sac",
    "rai_lac",
    "rai_rac",
    "tai_tac",
    "ecgi_eci",
    "lai_lac",
    "macro_enb_id",
    "ext_macro_enb_id",
    "ext_macro_enb_smenb",
];

fn uli_params(params: &IeParams) -> GtpResult<UliIe> {
    let plmn = params.plmn()?;
    let any = |names: &[&str]| names.iter().any(|n| params.contains(n));
    let area = |lac: &str, code: &str| -> GtpResult<Option<AreaCode>> {
        if !any(&[lac, code]) {
            return Ok(None);
        }
        Ok(Some(AreaCode {
            plmn,
            lac: params.int_or(lac, 0)?,
            code: params.int_or(code, 0)?,
        }))
    };

    let mut uli = UliIe {
        cgi: area("cgi_lac", "cgi_ci")?,
        sai: area("sai_lac", "sai_sac")?,
        rai: area("rai_lac", "rai_rac")?,
        ..Default::default()
    };
    if let Some(tac) = params.int::<u16>("tai_tac")? {
        uli.tai = Some(PlmnCode16 { plmn, code: tac });
    }
    if let Some(eci) = params.int::<u32>("ecgi_eci")? {
        uli.ecgi = Some(PlmnId32 {
            plmn,
            id: eci & 0x0FFF_FFFF,
        });
    }
    if let Some(lac) = params.int::<u16>("lai_lac")? {
        uli.lai = Some(PlmnCode16 { plmn, code: lac });
    }
    if let Some(id) = params.int::<u32>("macro_enb_id")? {
        uli.macro_enb = Some(PlmnId32 {
            plmn,
            id: id & 0x000F_FFFF,
        });
    }
    if any(&["ext_macro_enb_id", "ext_macro_enb_smenb"]) {
        uli.ext_macro_enb = Some(ExtMacroEnb {
            plmn,
            smenb: params.flag("ext_macro_enb_smenb")?,
            id: params.int_or::<u32>("ext_macro_enb_id", 0)? & 0x001F_FFFF,
        });
    }
    Ok(uli)
}

fn paa_params(params: &IeParams) -> GtpResult<PaaIe> {
    let kind = match params.get("pdn_type").map(str::to_ascii_lowercase).as_deref() {
        None | Some("1") | Some("ipv4") => pdn_type::IPV4,
        Some("2") | Some("ipv6") => pdn_type::IPV6,
        Some("3") | Some("ipv4v6") => pdn_type::IPV4V6,
        Some(_) => {
            return Err(GtpError::invalid_param(
                "pdn_type",
                params.get("pdn_type").unwrap_or_default(),
                "expected ipv4, ipv6 or ipv4v6",
            ))
        }
    };
    let ipv4 = params.parsed::<Ipv4Addr>("ipv4")?.unwrap_or(Ipv4Addr::UNSPECIFIED);
    let ipv6 = params.parsed::<Ipv6Addr>("ipv6")?.unwrap_or(Ipv6Addr::UNSPECIFIED);
    let prefix_len = params.int_or("prefix_len", 64)?;

    Ok(match kind {
        pdn_type::IPV4 => PaaIe::Ipv4(ipv4),
        pdn_type::IPV6 => PaaIe::Ipv6 {
            prefix_len,
            addr: ipv6,
        },
        _ => PaaIe::Ipv4v6 {
            prefix_len,
            ipv6,
            ipv4,
        },
    })
}

fn cause_params(params: &IeParams) -> GtpResult<CauseIe> {
    let mut cause = CauseIe::new(params.int_or("value", 16)?);
    cause.pce = params.flag("pce")?;
    cause.bce = params.flag("bce")?;
    cause.cs = params.flag("cs")?;
    // Offending IE sub-fields are emitted only when asked for
    if let Some(ie_type) = params.int::<u8>("offending_ie_type")? {
        cause.offending = Some(OffendingIe {
            ie_type,
            length: params.int_or("offending_ie_length", 0)?,
            instance: params.int_or::<u8>("offending_ie_instance", 0)? & 0x0F,
        });
    }
    Ok(cause)
}

fn single_octet(params: &IeParams, default: u8, mask: u8) -> GtpResult<u8> {
    let value: u8 = params.int_or("value", default)?;
    if value & !mask != 0 {
        return Err(GtpError::invalid_param(
            "value",
            &value.to_string(),
            format!("must fit mask {mask:#04x}"),
        ));
    }
    Ok(value)
}

impl InformationElement {
    /// Build an IE of `ie_type` from named parameters.
    ///
    /// Grouped types come back empty; their children are appended by the
    /// caller through [`InformationElement::as_grouped_mut`].
    pub fn from_params(ie_type: Gtp2IeType, instance: u8, params: &IeParams) -> GtpResult<Self> {
        let (kind, accepted): (IeKind, &[&str]) = match ie_type {
            Gtp2IeType::Imsi => (IeKind::Imsi(digits_param(params, MAX_IMSI_DIGITS)?), &["value"]),
            Gtp2IeType::Msisdn => (
                IeKind::Msisdn(digits_param(params, MAX_MSISDN_DIGITS)?),
                &["value"],
            ),
            Gtp2IeType::Mei => (IeKind::Mei(digits_param(params, MAX_MEI_DIGITS)?), &["value"]),
            Gtp2IeType::Cause => (
                IeKind::Cause(cause_params(params)?),
                &[
                    "value",
                    "pce",
                    "bce",
                    "cs",
                    "offending_ie_type",
                    "offending_ie_length",
                    "offending_ie_instance",
                ],
            ),
            Gtp2IeType::Recovery => (IeKind::Recovery(single_octet(params, 0, 0xFF)?), &["value"]),
            Gtp2IeType::Apn => (
                IeKind::Apn(params.get("value").unwrap_or_default().to_string()),
                &["value"],
            ),
            Gtp2IeType::Fqdn => (
                IeKind::Fqdn(params.get("value").unwrap_or_default().to_string()),
                &["value"],
            ),
            Gtp2IeType::Ambr => (
                IeKind::Ambr(AmbrIe {
                    uplink: params.int_or("uplink", 0)?,
                    downlink: params.int_or("downlink", 0)?,
                }),
                &["uplink", "downlink"],
            ),
            Gtp2IeType::Ebi => (IeKind::Ebi(single_octet(params, 5, 0x0F)?), &["value"]),
            Gtp2IeType::IpAddress => (
                IeKind::IpAddress(
                    params
                        .parsed::<IpAddr>("value")?
                        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
                ),
                &["value"],
            ),
            Gtp2IeType::Indication => {
                let mut indication = IndicationIe::default();
                for (name, _) in params.iter() {
                    if params.flag(name)? && !indication.set(name) {
                        log::warn!("IE indication: ignoring unknown flag '{}'", name);
                    }
                }
                return Ok(Self::new(instance, IeKind::Indication(indication)));
            }
            Gtp2IeType::Pco => (
                IeKind::Pco(params.hex("hex")?.unwrap_or_default()),
                &["hex"],
            ),
            Gtp2IeType::BearerTft => (
                IeKind::BearerTft(params.hex("hex")?.unwrap_or_default()),
                &["hex"],
            ),
            Gtp2IeType::Paa => (
                IeKind::Paa(paa_params(params)?),
                &["pdn_type", "ipv4", "ipv6", "prefix_len"],
            ),
            Gtp2IeType::BearerQos => (
                IeKind::BearerQos(BearerQosIe {
                    arp: arp_params(params)?,
                    qci: params.int_or("qci", 9)?,
                    mbr_ul: bitrate(params, "mbr_ul")?,
                    mbr_dl: bitrate(params, "mbr_dl")?,
                    gbr_ul: bitrate(params, "gbr_ul")?,
                    gbr_dl: bitrate(params, "gbr_dl")?,
                }),
                &["pci", "pl", "pvi", "qci", "mbr_ul", "mbr_dl", "gbr_ul", "gbr_dl"],
            ),
            Gtp2IeType::RatType => (IeKind::RatType(single_octet(params, 6, 0xFF)?), &["value"]),
            Gtp2IeType::ServingNetwork => {
                (IeKind::ServingNetwork(params.plmn()?), &["mcc", "mnc"])
            }
            Gtp2IeType::Uli => (IeKind::Uli(uli_params(params)?), ULI_PARAMS),
            Gtp2IeType::FTeid => {
                let interface_type: u8 = params.int_or("interface_type", 0)?;
                if interface_type > 0x3F {
                    return Err(GtpError::invalid_param(
                        "interface_type",
                        &interface_type.to_string(),
                        "interface type is 6 bits",
                    ));
                }
                (
                    IeKind::FTeid(FTeidIe {
                        interface_type,
                        teid: params.int_or("teid", 0)?,
                        ipv4: params.parsed("ipv4")?,
                        ipv6: params.parsed("ipv6")?,
                    }),
                    &["interface_type", "teid", "ipv4", "ipv6"],
                )
            }
            Gtp2IeType::DelayValue => {
                (IeKind::DelayValue(single_octet(params, 0, 0xFF)?), &["value"])
            }
            Gtp2IeType::ChargingId => (IeKind::ChargingId(params.int_or("value", 0)?), &["value"]),
            Gtp2IeType::ChargingCharacteristics => (
                IeKind::ChargingCharacteristics(params.int_or("value", 0)?),
                &["value"],
            ),
            Gtp2IeType::BearerFlags => {
                (IeKind::BearerFlags(single_octet(params, 0, 0xFF)?), &["value"])
            }
            Gtp2IeType::PdnType => (
                IeKind::PdnType(single_octet(params, pdn_type::IPV4, 0x07)?),
                &["value"],
            ),
            Gtp2IeType::Pti => (IeKind::Pti(single_octet(params, 0, 0xFF)?), &["value"]),
            Gtp2IeType::UeTimeZone => (
                IeKind::UeTimeZone(UeTimeZoneIe {
                    time_zone: params.int_or("time_zone", 0)?,
                    daylight_saving: params.int_or::<u8>("daylight_saving", 0)? & 0x03,
                }),
                &["time_zone", "daylight_saving"],
            ),
            Gtp2IeType::ApnRestriction => (
                IeKind::ApnRestriction(single_octet(params, 0, 0xFF)?),
                &["value"],
            ),
            Gtp2IeType::SelectionMode => (
                IeKind::SelectionMode(single_octet(params, 0, 0x03)?),
                &["value"],
            ),
            Gtp2IeType::NodeType => (IeKind::NodeType(single_octet(params, 0, 0xFF)?), &["value"]),
            Gtp2IeType::Arp => (IeKind::Arp(arp_params(params)?), &["pci", "pl", "pvi"]),
            Gtp2IeType::BearerContext
            | Gtp2IeType::PdnConnection
            | Gtp2IeType::OverloadControlInformation
            | Gtp2IeType::LoadControlInformation => {
                params.warn_unknown(ie_type, &[]);
                return Self::grouped(ie_type, instance, Vec::new());
            }
        };

        params.warn_unknown(ie_type, accepted);
        Ok(Self::new(instance, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_parsing() {
        let params = IeParams::new()
            .with("a", "42")
            .with("b", "0x1F")
            .with("c", "300")
            .with("d", "abc");
        assert_eq!(params.int::<u8>("a").unwrap(), Some(42));
        assert_eq!(params.int::<u8>("b").unwrap(), Some(0x1F));
        assert!(params.int::<u8>("c").is_err());
        assert_eq!(params.int::<u16>("c").unwrap(), Some(300));
        assert!(params.int::<u32>("d").is_err());
        assert_eq!(params.int::<u32>("missing").unwrap(), None);
    }

    #[test]
    fn test_flag_parsing() {
        let params = IeParams::new().with("x", "true").with("y", "0").with("z", "maybe");
        assert!(params.flag("x").unwrap());
        assert!(!params.flag("y").unwrap());
        assert!(!params.flag("missing").unwrap());
        assert!(params.flag("z").is_err());
    }

    #[test]
    fn test_hex_parsing() {
        let params = IeParams::new().with("hex", "80 80 21").with("odd", "abc");
        assert_eq!(
            params.hex("hex").unwrap(),
            Some(Bytes::from_static(&[0x80, 0x80, 0x21]))
        );
        assert!(params.hex("odd").is_err());
    }

    #[test]
    fn test_hex_rejects_non_ascii() {
        let params = IeParams::new()
            .with("hex", "a\u{e9}0")
            .with("upper", "0xAbCd");
        assert!(matches!(
            params.hex("hex"),
            Err(GtpError::InvalidParameter { .. })
        ));
        assert_eq!(
            params.hex("upper").unwrap(),
            Some(Bytes::from_static(&[0xAB, 0xCD]))
        );
        assert!(InformationElement::from_params(Gtp2IeType::Pco, 0, &params).is_err());
    }

    #[test]
    fn test_build_imsi() {
        let params = IeParams::new().with("value", "001010000000001");
        let ie = InformationElement::from_params(Gtp2IeType::Imsi, 0, &params).unwrap();
        assert_eq!(ie.as_imsi(), Some("001010000000001"));

        let empty = InformationElement::from_params(Gtp2IeType::Imsi, 0, &IeParams::new()).unwrap();
        assert_eq!(empty.as_imsi(), Some(""));

        let too_long = IeParams::new().with("value", "0010100000000012");
        assert!(InformationElement::from_params(Gtp2IeType::Imsi, 0, &too_long).is_err());
        let not_digits = IeParams::new().with("value", "00101x");
        assert!(InformationElement::from_params(Gtp2IeType::Imsi, 0, &not_digits).is_err());
    }

    #[test]
    fn test_build_unknown_param_is_ignored() {
        let params = IeParams::new().with("value", "7").with("colour", "blue");
        let ie = InformationElement::from_params(Gtp2IeType::Ebi, 0, &params).unwrap();
        assert_eq!(ie.as_ebi(), Some(7));
    }

    #[test]
    fn test_build_ebi_out_of_range() {
        let params = IeParams::new().with("value", "16");
        assert!(InformationElement::from_params(Gtp2IeType::Ebi, 0, &params).is_err());
    }

    #[test]
    fn test_build_cause_offending_only_when_given() {
        let plain = IeParams::new().with("value", "64").with("bce", "1");
        let ie = InformationElement::from_params(Gtp2IeType::Cause, 0, &plain).unwrap();
        let cause = ie.as_cause().unwrap();
        assert_eq!(cause.value, 64);
        assert!(cause.bce);
        assert!(cause.offending.is_none());

        let offending = plain
            .with("offending_ie_type", "87")
            .with("offending_ie_length", "9");
        let ie = InformationElement::from_params(Gtp2IeType::Cause, 0, &offending).unwrap();
        assert_eq!(
            ie.as_cause().unwrap().offending,
            Some(OffendingIe {
                ie_type: 87,
                length: 9,
                instance: 0
            })
        );
    }

    #[test]
    fn test_build_fteid() {
        let params = IeParams::new()
            .with("interface_type", "10")
            .with("teid", "0x1234")
            .with("ipv4", "127.0.0.1");
        let ie = InformationElement::from_params(Gtp2IeType::FTeid, 1, &params).unwrap();
        assert_eq!(ie.instance, 1);
        let fteid = ie.as_fteid().unwrap();
        assert_eq!(fteid.interface_type, 10);
        assert_eq!(fteid.teid, 0x1234);
        assert_eq!(fteid.ipv4, Some(Ipv4Addr::LOCALHOST));
        assert!(fteid.ipv6.is_none());

        let bad = IeParams::new().with("ipv4", "300.0.0.1");
        assert!(InformationElement::from_params(Gtp2IeType::FTeid, 0, &bad).is_err());
    }

    #[test]
    fn test_build_indication() {
        let params = IeParams::new()
            .with("sgwci", "1")
            .with("msv", "true")
            .with("daf", "0")
            .with("bogus", "1");
        let ie = InformationElement::from_params(Gtp2IeType::Indication, 0, &params).unwrap();
        match ie.kind {
            IeKind::Indication(indication) => assert_eq!(indication.octets, vec![0x01, 0x01]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_build_uli_components() {
        let params = IeParams::new()
            .with("mcc", "310")
            .with("mnc", "410")
            .with("tai_tac", "1")
            .with("ecgi_eci", "257");
        let ie = InformationElement::from_params(Gtp2IeType::Uli, 0, &params).unwrap();
        let IeKind::Uli(uli) = ie.kind else {
            panic!("not a ULI");
        };
        assert_eq!(uli.flags(), 0x18);
        assert_eq!(uli.tai.unwrap().plmn.mnc_string(), "410");
        assert_eq!(uli.ecgi.unwrap().id, 257);
        assert!(uli.cgi.is_none());
    }

    #[test]
    fn test_build_paa() {
        let params = IeParams::new().with("pdn_type", "ipv4v6").with("ipv4", "10.0.0.1");
        let ie = InformationElement::from_params(Gtp2IeType::Paa, 0, &params).unwrap();
        assert_eq!(
            ie.kind,
            IeKind::Paa(PaaIe::Ipv4v6 {
                prefix_len: 64,
                ipv6: Ipv6Addr::UNSPECIFIED,
                ipv4: Ipv4Addr::new(10, 0, 0, 1),
            })
        );

        let bad = IeParams::new().with("pdn_type", "ethernet");
        assert!(InformationElement::from_params(Gtp2IeType::Paa, 0, &bad).is_err());
    }

    #[test]
    fn test_build_bearer_qos() {
        let params = IeParams::new()
            .with("qci", "5")
            .with("pl", "2")
            .with("pci", "1")
            .with("mbr_ul", "1000");
        let ie = InformationElement::from_params(Gtp2IeType::BearerQos, 0, &params).unwrap();
        let IeKind::BearerQos(qos) = ie.kind else {
            panic!("not QoS");
        };
        assert_eq!(qos.qci, 5);
        assert_eq!(qos.arp.priority_level, 2);
        assert!(qos.arp.pre_emption_capability);
        assert_eq!(qos.mbr_ul, 1000);

        let too_fast = IeParams::new().with("gbr_dl", "0x10000000000");
        assert!(InformationElement::from_params(Gtp2IeType::BearerQos, 0, &too_fast).is_err());
    }

    #[test]
    fn test_build_grouped_is_empty() {
        let ie = InformationElement::from_params(Gtp2IeType::BearerContext, 0, &IeParams::new())
            .unwrap();
        assert!(ie.as_grouped().unwrap().ies.is_empty());
    }
}
