use crate::alphabet::Alphabet;
use crate::codec::{CodecError, Decodable, Encodable, decode_u8, offset_of};
use crate::datatypes::first_octet::{
    FirstOctet, LOOP_PREVENTION, MORE_MESSAGES, MessageTypeIndicator, REPLY_PATH, STATUS_REPORT,
    USER_DATA_HEADER,
};
use crate::datatypes::{Address, DataCodingScheme, Timestamp, UserData, UserDataHeader};
use bytes::{BufMut, BytesMut};
use std::io::Cursor;

/// Deliver first octet bit 4 is reserved
const RESERVED_BITS: u8 = 0x10;

/// SMS-DELIVER: a short message from the service centre to the mobile
/// station (mobile terminated).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Deliver {
    /// TP-MMS as transmitted: set means no more messages are waiting
    pub no_more_messages: bool,
    /// TP-LP
    pub loop_prevention: bool,
    /// TP-SRI: a status report will be returned to the originator
    pub status_report_indication: bool,
    /// TP-RP
    pub reply_path: bool,

    /// TP-OA
    pub originating_address: Address,
    /// TP-PID
    pub protocol_identifier: u8,
    /// TP-DCS
    pub data_coding: DataCodingScheme,
    /// TP-SCTS
    pub service_centre_timestamp: Timestamp,
    /// TP-UDL/TP-UD; TP-UDHI follows from the header being present
    pub user_data: UserData,
}

impl Deliver {
    /// Creates a Deliver carrying `text`, choosing the default alphabet when
    /// every character is representable and UCS2 otherwise
    pub fn new(originating_address: Address, text: &str, timestamp: Timestamp) -> Self {
        Self {
            no_more_messages: false,
            loop_prevention: false,
            status_report_indication: false,
            reply_path: false,
            originating_address,
            protocol_identifier: 0,
            data_coding: DataCodingScheme::for_alphabet(Alphabet::detect(text)),
            service_centre_timestamp: timestamp,
            user_data: UserData::new(text),
        }
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

    pub fn with_status_report_indication(mut self, indication: bool) -> Self {
        self.status_report_indication = indication;
        self
    }

    pub fn with_no_more_messages(mut self, no_more: bool) -> Self {
        self.no_more_messages = no_more;
        self
    }

    pub fn alphabet(&self) -> Alphabet {
        self.data_coding.alphabet()
    }

    pub fn first_octet(&self) -> FirstOctet {
        FirstOctet::compose(
            MessageTypeIndicator::Deliver,
            &[
                (MORE_MESSAGES, self.no_more_messages),
                (LOOP_PREVENTION, self.loop_prevention),
                (STATUS_REPORT, self.status_report_indication),
                (USER_DATA_HEADER, self.user_data.has_header()),
                (REPLY_PATH, self.reply_path),
            ],
        )
    }
}

impl Decodable for Deliver {
    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let start = offset_of(buf);
        let first = FirstOctet(decode_u8(buf, "first octet missing")?);
        first.check_reserved(RESERVED_BITS, start)?;

        let originating_address = Address::decode(buf)?;
        let protocol_identifier = decode_u8(buf, "protocol identifier missing")?;
        let data_coding = DataCodingScheme::from_byte(decode_u8(buf, "data coding scheme missing")?);
        let service_centre_timestamp = Timestamp::decode(buf)?;

        tracing::trace!(
            "deliver from {} dcs {:?}",
            originating_address,
            data_coding
        );
        let user_data =
            UserData::decode(buf, data_coding.alphabet(), first.has_user_data_header())?;

        Ok(Self {
            no_more_messages: first.is_set(MORE_MESSAGES),
            loop_prevention: first.is_set(LOOP_PREVENTION),
            status_report_indication: first.is_set(STATUS_REPORT),
            reply_path: first.is_set(REPLY_PATH),
            originating_address,
            protocol_identifier,
            data_coding,
            service_centre_timestamp,
            user_data,
        })
    }
}

impl Encodable for Deliver {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u8(self.first_octet().0);
        self.originating_address.encode(buf)?;
        buf.put_u8(self.protocol_identifier);
        buf.put_u8(self.data_coding.to_byte());
        self.service_centre_timestamp.encode(buf)?;
        self.user_data.encode(buf, self.alphabet())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamp() -> Timestamp {
        Timestamp::new(2009, 8, 7, 6, 5, 4).unwrap()
    }

    #[test]
    fn deliver_to_bytes_basic() {
        let deliver = Deliver::new(
            Address::international("46708251358").unwrap(),
            "hellohello",
            timestamp(),
        )
        .with_status_report_indication(true);

        let bytes = deliver.to_bytes().unwrap();
        let expected: &[u8] = &[
            0x20, 0x0B, 0x91, 0x64, 0x07, 0x28, 0x15, 0x53, 0xF8, 0x00, 0x00, 0x90, 0x80, 0x70,
            0x60, 0x50, 0x40, 0x00, 0x0A, 0xE8, 0x32, 0x9B, 0xFD, 0x46, 0x97, 0xD9, 0xEC, 0x37,
        ];
        assert_eq!(bytes.as_ref(), expected);
    }

    #[test]
    fn alphanumeric_originator() {
        let deliver = Deliver::new(Address::parse("eKit").unwrap(), "hellohello", timestamp())
            .with_status_report_indication(true);
        let bytes = deliver.to_bytes().unwrap();
        assert_eq!(&bytes[..6], &[0x20, 0x07, 0xD0, 0xE5, 0x65, 0x9A]);

        let decoded = Deliver::decode(&mut Cursor::new(bytes.as_ref())).unwrap();
        assert_eq!(decoded, deliver);
    }

    #[test]
    fn decode_flags() {
        let data: &[u8] = &[
            0x04, 0x0B, 0xC8, 0x72, 0x38, 0x88, 0x09, 0x00, 0xF1, 0x00, 0x00, 0x99, 0x30, 0x92,
            0x51, 0x61, 0x95, 0x80, 0x0A, 0xE8, 0x32, 0x9B, 0xFD, 0x46, 0x97, 0xD9, 0xEC, 0x37,
        ];
        let deliver = Deliver::decode(&mut Cursor::new(data)).unwrap();
        assert!(deliver.no_more_messages);
        assert!(!deliver.status_report_indication);
        assert_eq!(deliver.originating_address.value(), "27838890001");
        assert_eq!(deliver.user_data.text, "hellohello");
        assert_eq!(deliver.service_centre_timestamp.year(), 2099);
        assert_eq!(deliver.to_bytes().unwrap().as_ref(), data);
    }

    #[test]
    fn selects_ucs2_for_unicode_text() {
        let deliver = Deliver::new(Address::national("123").unwrap(), "Привет", timestamp());
        assert_eq!(deliver.alphabet(), Alphabet::Ucs2);
        let bytes = deliver.to_bytes().unwrap();
        let decoded = Deliver::decode(&mut Cursor::new(bytes.as_ref())).unwrap();
        assert_eq!(decoded.user_data.text, "Привет");
    }

    #[test]
    fn reserved_bit_with_header_rejected() {
        let mut bytes = Deliver::new(Address::national("1").unwrap(), "x", timestamp())
            .with_header(UserDataHeader::concatenated(1, 2, 1))
            .to_bytes()
            .unwrap()
            .to_vec();
        bytes[0] |= RESERVED_BITS;
        let err = Deliver::decode(&mut Cursor::new(bytes.as_slice())).unwrap_err();
        assert!(matches!(err, CodecError::MalformedPdu { offset: 0, .. }));
    }

    #[test]
    fn truncated_before_user_data_is_fatal() {
        let data: &[u8] = &[0x04, 0x03, 0x81, 0x21, 0xF3, 0x00];
        let err = Deliver::decode(&mut Cursor::new(data)).unwrap_err();
        assert_eq!(
            err,
            CodecError::MalformedPdu {
                offset: 6,
                reason: "data coding scheme missing"
            }
        );
    }
}
