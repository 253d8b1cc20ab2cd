// ABOUTME: Message type dispatch over the TPDU variants with the decoded octets kept alongside
// ABOUTME: Decode options, direction and the accessors reassembly keys on live here

use crate::codec::{CodecError, Decodable, Encodable};
use crate::datatypes::{
    Address, Concatenation, Deliver, FirstOctet, MessageTypeIndicator, StatusReport, Submit,
    UserData, UserDataHeader,
};
use bytes::{Buf, Bytes, BytesMut};
use std::io::Cursor;

/// Which way a TPDU travels relative to the mobile station
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Service centre to mobile station
    MobileTerminated,
    /// Mobile station to service centre
    MobileOriginated,
    /// Service centre to mobile station, reporting on an earlier submission
    StatusReport,
}

/// A TPDU of one of the supported types
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Tpdu {
    Deliver(Deliver),
    Submit(Submit),
    StatusReport(StatusReport),
    /// Message type 11, carried as undecoded octets
    Reserved(Bytes),
}

impl Tpdu {
    pub fn message_type(&self) -> MessageTypeIndicator {
        match self {
            Tpdu::Deliver(_) => MessageTypeIndicator::Deliver,
            Tpdu::Submit(_) => MessageTypeIndicator::Submit,
            Tpdu::StatusReport(_) => MessageTypeIndicator::StatusReport,
            Tpdu::Reserved(_) => MessageTypeIndicator::Reserved,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            Tpdu::Deliver(_) => Some(Direction::MobileTerminated),
            Tpdu::Submit(_) => Some(Direction::MobileOriginated),
            Tpdu::StatusReport(_) => Some(Direction::StatusReport),
            Tpdu::Reserved(_) => None,
        }
    }

    /// The one address the TPDU carries: originator of a Deliver,
    /// destination of a Submit, recipient of a Status-Report
    pub fn address(&self) -> Option<&Address> {
        match self {
            Tpdu::Deliver(deliver) => Some(&deliver.originating_address),
            Tpdu::Submit(submit) => Some(&submit.destination_address),
            Tpdu::StatusReport(report) => Some(&report.recipient_address),
            Tpdu::Reserved(_) => None,
        }
    }

    pub fn user_data(&self) -> Option<&UserData> {
        match self {
            Tpdu::Deliver(deliver) => Some(&deliver.user_data),
            Tpdu::Submit(submit) => Some(&submit.user_data),
            Tpdu::StatusReport(report) => report.user_data.as_ref(),
            Tpdu::Reserved(_) => None,
        }
    }

    pub fn header(&self) -> Option<&UserDataHeader> {
        self.user_data().and_then(|ud| ud.header.as_ref())
    }

    /// The decoded text; empty when the TPDU carries no user data
    pub fn text(&self) -> &str {
        self.user_data().map_or("", |ud| ud.text.as_str())
    }

    pub fn concatenation(&self) -> Option<Concatenation> {
        self.header().and_then(UserDataHeader::concatenation)
    }
}

impl Encodable for Tpdu {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        match self {
            Tpdu::Deliver(deliver) => deliver.encode(buf),
            Tpdu::Submit(submit) => submit.encode(buf),
            Tpdu::StatusReport(report) => report.encode(buf),
            Tpdu::Reserved(raw) => {
                buf.extend_from_slice(raw);
                Ok(())
            }
        }
    }
}

/// Decoder settings
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Keep message type 11 as raw octets instead of failing with
    /// [`CodecError::UnsupportedPduType`] (default: false)
    pub passthrough_reserved: bool,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_passthrough_reserved(mut self, passthrough: bool) -> Self {
        self.passthrough_reserved = passthrough;
        self
    }
}

/// A decoded TPDU together with the octets it was decoded from
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Message {
    tpdu: Tpdu,
    raw: Bytes,
}

impl Message {
    /// Decodes a TPDU with the default options
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Self::decode_with(bytes, DecodeOptions::default())
    }

    pub fn decode_with(bytes: &[u8], options: DecodeOptions) -> Result<Self, CodecError> {
        let Some(&first) = bytes.first() else {
            return Err(CodecError::MalformedPdu {
                offset: 0,
                reason: "empty TPDU",
            });
        };

        let mti = FirstOctet(first).message_type();
        let mut cursor = Cursor::new(bytes);
        let tpdu = match mti {
            MessageTypeIndicator::Deliver => Tpdu::Deliver(Deliver::decode(&mut cursor)?),
            MessageTypeIndicator::Submit => Tpdu::Submit(Submit::decode(&mut cursor)?),
            MessageTypeIndicator::StatusReport => {
                Tpdu::StatusReport(StatusReport::decode(&mut cursor)?)
            }
            MessageTypeIndicator::Reserved if options.passthrough_reserved => {
                tracing::debug!("passing through reserved TPDU of {} octets", bytes.len());
                cursor.advance(bytes.len());
                Tpdu::Reserved(Bytes::copy_from_slice(bytes))
            }
            MessageTypeIndicator::Reserved => {
                return Err(CodecError::UnsupportedPduType { mti: u8::from(mti) });
            }
        };

        if cursor.has_remaining() {
            tracing::debug!(
                "{} trailing octets after user data ignored",
                cursor.remaining()
            );
        }

        Ok(Self {
            tpdu,
            raw: Bytes::copy_from_slice(bytes),
        })
    }

    /// Encodes `tpdu`, keeping the octets produced
    pub fn from_tpdu(tpdu: Tpdu) -> Result<Self, CodecError> {
        let raw = tpdu.to_bytes()?;
        Ok(Self { tpdu, raw })
    }

    pub fn tpdu(&self) -> &Tpdu {
        &self.tpdu
    }

    pub fn into_tpdu(self) -> Tpdu {
        self.tpdu
    }

    /// The octets this message was decoded from
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn message_type(&self) -> MessageTypeIndicator {
        self.tpdu.message_type()
    }

    pub fn direction(&self) -> Option<Direction> {
        self.tpdu.direction()
    }

    pub fn address(&self) -> Option<&Address> {
        self.tpdu.address()
    }

    pub fn text(&self) -> &str {
        self.tpdu.text()
    }

    pub fn header(&self) -> Option<&UserDataHeader> {
        self.tpdu.header()
    }

    pub fn concatenation(&self) -> Option<Concatenation> {
        self.tpdu.concatenation()
    }

    /// True if encoding the decoded TPDU reproduces the retained octets
    pub fn verify_round_trip(&self) -> Result<bool, CodecError> {
        Ok(self.tpdu.to_bytes()? == self.raw)
    }
}
