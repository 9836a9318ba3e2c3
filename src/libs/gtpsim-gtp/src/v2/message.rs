//! GTPv2 Messages
//!
//! Message encoding/decoding for GTPv2-C protocol.

use bytes::{Buf, Bytes, BytesMut};
use crate::error::{GtpError, GtpResult};
use super::classifier::{classify, MessageCategory};
use super::header::{Gtp2Header, Gtp2MessageType, GTPV2C_LENGTH_EXCLUDED};
use super::ie::{count_ie, find_ie, Gtp2IeType, IeKind, InformationElement};

/// IEs that must be present before a message of a given type is sent
const MANDATORY_IES: &[(Gtp2MessageType, &[(Gtp2IeType, u8)])] = &[
    (Gtp2MessageType::EchoRequest, &[(Gtp2IeType::Recovery, 0)]),
    (Gtp2MessageType::EchoResponse, &[(Gtp2IeType::Recovery, 0)]),
    (
        Gtp2MessageType::CreateSessionRequest,
        &[(Gtp2IeType::FTeid, 0), (Gtp2IeType::BearerContext, 0)],
    ),
    (
        Gtp2MessageType::CreateBearerRequest,
        &[(Gtp2IeType::Ebi, 0), (Gtp2IeType::BearerContext, 0)],
    ),
    (Gtp2MessageType::DeleteBearerCommand, &[(Gtp2IeType::BearerContext, 0)]),
    (Gtp2MessageType::ModifyBearerCommand, &[(Gtp2IeType::Ambr, 0)]),
];

/// GTPv2-C Message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gtp2Message {
    /// Message header
    pub header: Gtp2Header,
    /// Information Elements, in wire order
    pub ies: Vec<InformationElement>,
}

impl Gtp2Message {
    /// Create a new GTPv2-C message
    pub fn new(header: Gtp2Header) -> Self {
        Self {
            header,
            ies: Vec::new(),
        }
    }

    /// Create an Echo Request message
    pub fn echo_request(sequence_number: u32, recovery: u8) -> Self {
        let mut msg = Self::new(Gtp2Header::new_no_teid(
            Gtp2MessageType::EchoRequest as u8,
            sequence_number,
        ));
        msg.add_ie(InformationElement::new(0, IeKind::Recovery(recovery)));
        msg
    }

    /// Create an Echo Response message
    pub fn echo_response(sequence_number: u32, recovery: u8) -> Self {
        let mut msg = Self::new(Gtp2Header::new_no_teid(
            Gtp2MessageType::EchoResponse as u8,
            sequence_number,
        ));
        msg.add_ie(InformationElement::new(0, IeKind::Recovery(recovery)));
        msg
    }

    pub fn message_type(&self) -> u8 {
        self.header.message_type
    }

    pub fn sequence_number(&self) -> u32 {
        self.header.sequence_number
    }

    /// Header TEID, 0 when absent
    pub fn teid(&self) -> u32 {
        self.header.teid.unwrap_or(0)
    }

    /// Add an IE to the message
    pub fn add_ie(&mut self, ie: InformationElement) {
        self.ies.push(ie);
    }

    /// The `occurrence`-th (0-based) top-level IE with this type and instance.
    ///
    /// Grouped IEs are not searched; descend through
    /// [`InformationElement::as_grouped`].
    pub fn get_ie(&self, ie_type: Gtp2IeType, instance: u8, occurrence: usize) -> Option<&InformationElement> {
        find_ie(&self.ies, ie_type as u8, instance, occurrence)
    }

    pub fn get_ie_mut(
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

    /// Number of top-level IEs with this type and instance
    pub fn get_ie_count(&self, ie_type: Gtp2IeType, instance: u8) -> usize {
        count_ie(&self.ies, ie_type as u8, instance)
    }

    /// Like [`Gtp2Message::get_ie`] but a missing IE is an error
    pub fn require_ie(&self, ie_type: Gtp2IeType, instance: u8, occurrence: usize) -> GtpResult<&InformationElement> {
        self.get_ie(ie_type, instance, occurrence)
            .ok_or(GtpError::IeNotFound {
                ie_type: ie_type as u8,
                instance,
                occurrence,
            })
    }

    /// First IMSI IE value, if any
    pub fn imsi(&self) -> Option<&str> {
        self.get_ie(Gtp2IeType::Imsi, 0, 0)
            .and_then(InformationElement::as_imsi)
            .filter(|imsi| !imsi.is_empty())
    }

    /// Cause value at instance 0
    pub fn cause(&self) -> Option<u8> {
        self.get_ie(Gtp2IeType::Cause, 0, 0)
            .and_then(InformationElement::as_cause)
            .map(|cause| cause.value)
    }

    /// Check the mandatory IEs for this message type.
    ///
    /// Every response other than Echo Response needs Cause instance 0.
    pub fn check_mandatory_ies(&self) -> GtpResult<()> {
        let message_type = self.message_type();
        if message_type != Gtp2MessageType::EchoResponse as u8
            && classify(message_type, false) == MessageCategory::Response
        {
            self.require_ie(Gtp2IeType::Cause, 0, 0)?;
        }

        if let Some((_, required)) = MANDATORY_IES
            .iter()
            .find(|(msg_type, _)| *msg_type as u8 == message_type)
        {
            for (ie_type, instance) in required.iter() {
                self.require_ie(*ie_type, *instance, 0)?;
            }
        }
        Ok(())
    }

    /// Encode the message.
    ///
    /// The header is written first with a zero length, then the IEs in list
    /// order, then the length field is back-patched.
    pub fn encode(&self) -> GtpResult<BytesMut> {
        let mut buf = BytesMut::with_capacity(self.header.header_len() + 64);
        self.header.encode(&mut buf);
        for ie in &self.ies {
            ie.encode(&mut buf)?;
        }

        let payload_len = buf.len() - GTPV2C_LENGTH_EXCLUDED;
        let length = u16::try_from(payload_len).map_err(|_| GtpError::MessageTooLong(buf.len()))?;
        buf[2..4].copy_from_slice(&length.to_be_bytes());
        Ok(buf)
    }

    /// Check the mandatory IEs, then encode
    pub fn encode_checked(&self) -> GtpResult<BytesMut> {
        self.check_mandatory_ies()?;
        self.encode()
    }

    /// Decode one message from the front of `buf`.
    ///
    /// Bytes past the header-declared length are left in `buf` (a
    /// piggybacked message, if the P flag is set).
    pub fn decode(buf: &mut Bytes) -> GtpResult<Self> {
        let header = Gtp2Header::decode(buf)?;

        let body_len = header.length as usize + GTPV2C_LENGTH_EXCLUDED - header.header_len();
        if buf.remaining() < body_len {
            return Err(GtpError::short(body_len, buf.remaining()));
        }
        let mut body = buf.split_to(body_len);

        let mut ies = Vec::new();
        while body.has_remaining() {
            let remaining = body.remaining();
            let (ie, _) = InformationElement::decode(&mut body, remaining)?;
            ies.push(ie);
        }

        Ok(Self { header, ies })
    }
}
