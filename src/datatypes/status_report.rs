use crate::alphabet::Alphabet;
use crate::codec::{CodecError, Decodable, Encodable, decode_u8, offset_of};
use crate::datatypes::first_octet::{
    FirstOctet, LOOP_PREVENTION, MORE_MESSAGES, MessageTypeIndicator, STATUS_REPORT,
    USER_DATA_HEADER,
};
use crate::datatypes::{Address, DataCodingScheme, Timestamp, UserData};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// Status-Report first octet bits 4 and 7 are reserved
const RESERVED_BITS: u8 = 0x90;

/// TP-PI flags
const PI_PROTOCOL_IDENTIFIER: u8 = 0x01;
const PI_DATA_CODING: u8 = 0x02;
const PI_USER_DATA: u8 = 0x04;
const PI_PRESENCE_FLAGS: u8 = PI_PROTOCOL_IDENTIFIER | PI_DATA_CODING | PI_USER_DATA;

/// Broad outcome encoded in TP-ST
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeliveryStatus {
    /// Short message transaction completed
    Completed,
    /// Temporary error, service centre still trying
    Pending,
    /// Permanent error, service centre is not making more attempts
    PermanentError,
    /// Temporary error, service centre is not making more attempts
    TemporaryError,
    Reserved,
}

impl DeliveryStatus {
    pub fn from_byte(status: u8) -> Self {
        match status {
            0x00..=0x1F => DeliveryStatus::Completed,
            0x20..=0x3F => DeliveryStatus::Pending,
            0x40..=0x5F => DeliveryStatus::PermanentError,
            0x60..=0x7F => DeliveryStatus::TemporaryError,
            _ => DeliveryStatus::Reserved,
        }
    }
}

/// SMS-STATUS-REPORT: the service centre reporting on a previously
/// submitted message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StatusReport {
    /// TP-MMS as transmitted: set means no more messages are waiting
    pub no_more_messages: bool,
    /// TP-LP
    pub loop_prevention: bool,
    /// TP-SRQ: set when reporting on an SMS-COMMAND rather than an SMS-SUBMIT
    pub status_report_qualifier: bool,

    /// TP-MR of the message being reported on
    pub message_reference: u8,
    /// TP-RA
    pub recipient_address: Address,
    /// TP-SCTS of the original message
    pub service_centre_timestamp: Timestamp,
    /// TP-DT
    pub discharge_time: Timestamp,
    /// TP-ST
    pub status: u8,
    /// TP-PI bits other than the presence flags; `None` when TP-PI is absent
    /// or carries presence flags only
    pub parameter_indicator: Option<u8>,
    pub protocol_identifier: Option<u8>,
    pub data_coding: Option<DataCodingScheme>,
    pub user_data: Option<UserData>,
}

impl StatusReport {
    pub fn new(
        message_reference: u8,
        recipient_address: Address,
        service_centre_timestamp: Timestamp,
        discharge_time: Timestamp,
        status: u8,
    ) -> Self {
        Self {
            no_more_messages: false,
            loop_prevention: false,
            status_report_qualifier: false,
            message_reference,
            recipient_address,
            service_centre_timestamp,
            discharge_time,
            status,
            parameter_indicator: None,
            protocol_identifier: None,
            data_coding: None,
            user_data: None,
        }
    }

    /// Attaches user data, selecting a data coding scheme for it when none
    /// is set
    pub fn with_user_data(mut self, user_data: UserData) -> Self {
        if self.data_coding.is_none() {
            self.data_coding = Some(DataCodingScheme::for_alphabet(Alphabet::detect(
                &user_data.text,
            )));
        }
        self.user_data = Some(user_data);
        self
    }

    pub fn with_protocol_identifier(mut self, pid: u8) -> Self {
        self.protocol_identifier = Some(pid);
        self
    }

    pub fn delivery_status(&self) -> DeliveryStatus {
        DeliveryStatus::from_byte(self.status)
    }

    pub fn is_delivered(&self) -> bool {
        self.status == 0x00
    }

    /// Alphabet of the optional user data; the default alphabet when no
    /// data coding scheme is present
    pub fn alphabet(&self) -> Alphabet {
        self.data_coding
            .map_or(Alphabet::Gsm7, |dcs| dcs.alphabet())
    }

    pub fn first_octet(&self) -> FirstOctet {
        let has_header = self.user_data.as_ref().is_some_and(UserData::has_header);
        FirstOctet::compose(
            MessageTypeIndicator::StatusReport,
            &[
                (MORE_MESSAGES, self.no_more_messages),
                (LOOP_PREVENTION, self.loop_prevention),
                (STATUS_REPORT, self.status_report_qualifier),
                (USER_DATA_HEADER, has_header),
            ],
        )
    }

    fn encoded_parameter_indicator(&self) -> Option<u8> {
        let mut flags = 0;
        if self.protocol_identifier.is_some() {
            flags |= PI_PROTOCOL_IDENTIFIER;
        }
        if self.data_coding.is_some() {
            flags |= PI_DATA_CODING;
        }
        if self.user_data.is_some() {
            flags |= PI_USER_DATA;
        }
        match self.parameter_indicator {
            Some(extra) => Some((extra & !PI_PRESENCE_FLAGS) | flags),
            None if flags != 0 => Some(flags),
            None => None,
        }
    }
}

impl Decodable for StatusReport {
    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let start = offset_of(buf);
        let first = FirstOctet(decode_u8(buf, "first octet missing")?);
        first.check_reserved(RESERVED_BITS, start)?;

        let message_reference = decode_u8(buf, "message reference missing")?;
        let recipient_address = Address::decode(buf)?;
        let service_centre_timestamp = Timestamp::decode(buf)?;
        let discharge_time = Timestamp::decode(buf)?;
        let status = decode_u8(buf, "status missing")?;

        let mut report = Self {
            no_more_messages: first.is_set(MORE_MESSAGES),
            loop_prevention: first.is_set(LOOP_PREVENTION),
            status_report_qualifier: first.is_set(STATUS_REPORT),
            message_reference,
            recipient_address,
            service_centre_timestamp,
            discharge_time,
            status,
            parameter_indicator: None,
            protocol_identifier: None,
            data_coding: None,
            user_data: None,
        };

        if !buf.has_remaining() {
            return Ok(report);
        }

        let pi = decode_u8(buf, "parameter indicator missing")?;
        report.parameter_indicator = match pi & !PI_PRESENCE_FLAGS {
            0 if pi != 0 => None,
            extra => Some(extra),
        };
        if pi & PI_PROTOCOL_IDENTIFIER != 0 {
            report.protocol_identifier = Some(decode_u8(buf, "protocol identifier missing")?);
        }
        if pi & PI_DATA_CODING != 0 {
            report.data_coding = Some(DataCodingScheme::from_byte(decode_u8(
                buf,
                "data coding scheme missing",
            )?));
        }
        if pi & PI_USER_DATA != 0 {
            report.user_data = Some(UserData::decode(
                buf,
                report.alphabet(),
                first.has_user_data_header(),
            )?);
        }
        Ok(report)
    }
}

impl Encodable for StatusReport {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u8(self.first_octet().0);
        buf.put_u8(self.message_reference);
        self.recipient_address.encode(buf)?;
        self.service_centre_timestamp.encode(buf)?;
        self.discharge_time.encode(buf)?;
        buf.put_u8(self.status);

        if let Some(pi) = self.encoded_parameter_indicator() {
            buf.put_u8(pi);
            if let Some(pid) = self.protocol_identifier {
                buf.put_u8(pid);
            }
            if let Some(dcs) = self.data_coding {
                buf.put_u8(dcs.to_byte());
            }
            if let Some(user_data) = &self.user_data {
                user_data.encode(buf, self.alphabet())?;
            }
        }
        Ok(())
    }
}
