use crate::codec::CodecError;
use num_enum::{FromPrimitive, IntoPrimitive};

/// TP-MTI, bits 1..0 of the first octet
///
/// Submit and Deliver share the same codes in opposite directions; this
/// crate reads 00 as Deliver and 01 as Submit.
#[derive(FromPrimitive, IntoPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageTypeIndicator {
    Deliver = 0b00,
    Submit = 0b01,
    StatusReport = 0b10,
    #[num_enum(default)]
    Reserved = 0b11,
}

/// TP-MMS (Deliver, Status-Report): set when no more messages are waiting
pub const MORE_MESSAGES: u8 = 0x04;
/// TP-RD (Submit)
pub const REJECT_DUPLICATES: u8 = 0x04;
/// TP-LP (Deliver, Status-Report)
pub const LOOP_PREVENTION: u8 = 0x08;
/// TP-VPF (Submit), two bits
pub const VALIDITY_PERIOD_FORMAT: u8 = 0x18;
/// TP-SRI (Deliver), TP-SRR (Submit), TP-SRQ (Status-Report)
pub const STATUS_REPORT: u8 = 0x20;
/// TP-UDHI
pub const USER_DATA_HEADER: u8 = 0x40;
/// TP-RP (Deliver, Submit)
pub const REPLY_PATH: u8 = 0x80;

/// The first octet of a TPDU, interpreted per message type
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct FirstOctet(pub u8);

impl FirstOctet {
    pub fn message_type(&self) -> MessageTypeIndicator {
        MessageTypeIndicator::from(self.0 & 0b11)
    }

    pub fn is_set(&self, mask: u8) -> bool {
        self.0 & mask != 0
    }

    pub fn has_user_data_header(&self) -> bool {
        self.is_set(USER_DATA_HEADER)
    }

    /// TP-VPF as its two-bit value
    pub fn validity_period_format(&self) -> u8 {
        (self.0 & VALIDITY_PERIOD_FORMAT) >> 3
    }

    /// Applies the reserved-bit policy for a message type whose reserved
    /// bits are `reserved`: alone they are ignored, together with TP-UDHI
    /// the octet is rejected
    pub fn check_reserved(&self, reserved: u8, offset: usize) -> Result<(), CodecError> {
        if self.0 & reserved == 0 {
            return Ok(());
        }
        if self.has_user_data_header() {
            return Err(CodecError::MalformedPdu {
                offset,
                reason: "reserved first octet bit set together with user data header indicator",
            });
        }
        tracing::debug!(
            "ignoring reserved first octet bits {:#04x}",
            self.0 & reserved
        );
        Ok(())
    }

    /// Builds a first octet from a message type and flag bits
    pub fn compose(mti: MessageTypeIndicator, flags: &[(u8, bool)]) -> Self {
        let bits = flags
            .iter()
            .filter(|(_, on)| *on)
            .fold(u8::from(mti), |acc, (mask, _)| acc | mask);
        FirstOctet(bits)
    }
}
