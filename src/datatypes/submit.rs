use crate::alphabet::Alphabet;
use crate::codec::{CodecError, Decodable, Encodable, decode_u8, offset_of};
use crate::datatypes::first_octet::{
    FirstOctet, MessageTypeIndicator, REJECT_DUPLICATES, REPLY_PATH, STATUS_REPORT,
    USER_DATA_HEADER,
};
use crate::datatypes::validity_period::ValidityPeriodFormat;
use crate::datatypes::{Address, DataCodingScheme, UserData, UserDataHeader, ValidityPeriod};
use bytes::{BufMut, BytesMut};
use std::io::Cursor;

/// SMS-SUBMIT: a short message from the mobile station to the service
/// centre (mobile originated).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Submit {
    /// TP-RD
    pub reject_duplicates: bool,
    /// TP-SRR
    pub status_report_request: bool,
    /// TP-RP
    pub reply_path: bool,

    /// TP-MR
    pub message_reference: u8,
    /// TP-DA
    pub destination_address: Address,
    /// TP-PID
    pub protocol_identifier: u8,
    /// TP-DCS
    pub data_coding: DataCodingScheme,
    /// TP-VP; its form selects TP-VPF
    pub validity_period: Option<ValidityPeriod>,
    /// TP-UDL/TP-UD; TP-UDHI follows from the header being present
    pub user_data: UserData,
}

impl Submit {
    /// Creates a Submit carrying `text` with no validity period, choosing the
    /// default alphabet when every character is representable and UCS2 otherwise
    pub fn new(destination_address: Address, text: &str) -> Self {
        Self {
            reject_duplicates: false,
            status_report_request: false,
            reply_path: false,
            message_reference: 0,
            destination_address,
            protocol_identifier: 0,
            data_coding: DataCodingScheme::for_alphabet(Alphabet::detect(text)),
            validity_period: None,
            user_data: UserData::new(text),
        }
    }

    pub fn with_message_reference(mut self, reference: u8) -> Self {
        self.message_reference = reference;
        self
    }

    pub fn with_validity_period(mut self, validity_period: ValidityPeriod) -> Self {
        self.validity_period = Some(validity_period);
        self
    }

    pub fn with_data_coding(mut self, data_coding: DataCodingScheme) -> Self {
        self.data_coding = data_coding;
        self
    }

    pub fn with_header(mut self, header: UserDataHeader) -> Self {
        self.user_data.header = Some(header);
        self
    }

    pub fn with_protocol_identifier(mut self, pid: u8) -> Self {
        self.protocol_identifier = pid;
        self
    }

    pub fn with_status_report_request(mut self, request: bool) -> Self {
        self.status_report_request = request;
        self
    }

    pub fn alphabet(&self) -> Alphabet {
        self.data_coding.alphabet()
    }

    pub fn validity_period_format(&self) -> ValidityPeriodFormat {
        self.validity_period
            .as_ref()
            .map_or(ValidityPeriodFormat::NotPresent, ValidityPeriod::format)
    }

    pub fn first_octet(&self) -> FirstOctet {
        let octet = FirstOctet::compose(
            MessageTypeIndicator::Submit,
            &[
                (REJECT_DUPLICATES, self.reject_duplicates),
                (STATUS_REPORT, self.status_report_request),
                (USER_DATA_HEADER, self.user_data.has_header()),
                (REPLY_PATH, self.reply_path),
            ],
        );
        FirstOctet(octet.0 | (self.validity_period_format().bits() << 3))
    }
}

impl Decodable for Submit {
    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let first = FirstOctet(decode_u8(buf, "first octet missing")?);
        let message_reference = decode_u8(buf, "message reference missing")?;
        let destination_address = Address::decode(buf)?;
        let protocol_identifier = decode_u8(buf, "protocol identifier missing")?;
        let data_coding = DataCodingScheme::from_byte(decode_u8(buf, "data coding scheme missing")?);

        let format = ValidityPeriodFormat::from_bits(first.validity_period_format());
        let validity_period = ValidityPeriod::decode(buf, format)?;

        tracing::trace!(
            "submit {} to {} vpf {:?} at offset {}",
            message_reference,
            destination_address,
            format,
            offset_of(buf)
        );
        let user_data =
            UserData::decode(buf, data_coding.alphabet(), first.has_user_data_header())?;

        Ok(Self {
            reject_duplicates: first.is_set(REJECT_DUPLICATES),
            status_report_request: first.is_set(STATUS_REPORT),
            reply_path: first.is_set(REPLY_PATH),
            message_reference,
            destination_address,
            protocol_identifier,
            data_coding,
            validity_period,
            user_data,
        })
    }
}

impl Encodable for Submit {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u8(self.first_octet().0);
        buf.put_u8(self.message_reference);
        self.destination_address.encode(buf)?;
        buf.put_u8(self.protocol_identifier);
        buf.put_u8(self.data_coding.to_byte());
        if let Some(validity_period) = &self.validity_period {
            validity_period.encode(buf)?;
        }
        self.user_data.encode(buf, self.alphabet())
    }
}
