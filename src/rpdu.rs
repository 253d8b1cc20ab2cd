// ABOUTME: RP-DATA envelope (GSM 04.11) carrying a TPDU between mobile station and network
// ABOUTME: RP addresses count octets rather than digits; the RP user data length must be exact

use crate::codec::{CodecError, Decodable, Encodable, decode_octets, decode_u8, offset_of};
use crate::datatypes::{Address, TypeOfNumber};
use crate::message::{Message, Tpdu};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use num_enum::{FromPrimitive, IntoPrimitive};
use std::io::Cursor;

/// Longest RP-User-Data element value
pub const MAX_RP_USER_DATA: usize = 233;

/// RP-MTI, the low three bits of the first RP octet
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum RpMessageType {
    /// RP-DATA, mobile station to network
    DataToNetwork = 0x00,
    /// RP-DATA, network to mobile station
    DataToMobile = 0x01,
    AckToNetwork = 0x02,
    AckToMobile = 0x03,
    ErrorToNetwork = 0x04,
    ErrorToMobile = 0x05,
    /// RP-SMMA, memory available notification
    Smma = 0x06,
    #[num_enum(catch_all)]
    Reserved(u8),
}

impl RpMessageType {
    pub fn is_data(&self) -> bool {
        matches!(self, RpMessageType::DataToNetwork | RpMessageType::DataToMobile)
    }
}

/// An RP-DATA message: relay-layer addressing around one TPDU.
///
/// Mobile-originated messages carry the service centre in the destination
/// and normally no originator; mobile-terminated messages the reverse.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RpData {
    pub message_type: RpMessageType,
    pub message_reference: u8,
    /// RP-OA; `None` when the element has length 0
    pub originator: Option<Address>,
    /// RP-DA; `None` when the element has length 0
    pub destination: Option<Address>,
    /// RP-User-Data: the encoded TPDU
    pub user_data: Bytes,
}

impl RpData {
    /// Wraps `tpdu` for sending from a mobile station to `service_centre`
    pub fn mobile_originated(
        message_reference: u8,
        service_centre: Address,
        tpdu: &Tpdu,
    ) -> Result<Self, CodecError> {
        Ok(Self {
            message_type: RpMessageType::DataToNetwork,
            message_reference,
            originator: None,
            destination: Some(service_centre),
            user_data: tpdu.to_bytes()?,
        })
    }

    /// Wraps `tpdu` for delivery from `service_centre` to a mobile station
    pub fn mobile_terminated(
        message_reference: u8,
        service_centre: Address,
        tpdu: &Tpdu,
    ) -> Result<Self, CodecError> {
        Ok(Self {
            message_type: RpMessageType::DataToMobile,
            message_reference,
            originator: Some(service_centre),
            destination: None,
            user_data: tpdu.to_bytes()?,
        })
    }

    /// Decodes the carried TPDU
    pub fn message(&self) -> Result<Message, CodecError> {
        Message::decode(&self.user_data)
    }
}

fn decode_rp_address(buf: &mut Cursor<&[u8]>) -> Result<Option<Address>, CodecError> {
    let start = offset_of(buf);
    let octets = usize::from(decode_u8(buf, "RP address length missing")?);
    if octets == 0 {
        return Ok(None);
    }
    if buf.remaining() < octets {
        return Err(CodecError::MalformedAddress {
            offset: start,
            reason: "declared length reads past the buffer",
        });
    }

    // Rewrite the octet count as a digit count and read it as a TP address
    let value = decode_octets(buf, octets, "RP address truncated")?;
    let digits = match value.last() {
        _ if octets == 1 => 0,
        Some(&last) if last >> 4 == 0x0F => 2 * (octets - 1) - 1,
        _ => 2 * (octets - 1),
    };
    let mut tp = Vec::with_capacity(1 + octets);
    tp.push(digits as u8);
    tp.extend_from_slice(&value);

    let address = Address::decode(&mut Cursor::new(tp.as_slice())).map_err(|e| e.shifted(start))?;
    Ok(Some(address))
}

fn encode_rp_address(address: Option<&Address>, buf: &mut BytesMut) -> Result<(), CodecError> {
    let Some(address) = address else {
        buf.put_u8(0);
        return Ok(());
    };
    if address.type_of_number() == TypeOfNumber::Alphanumeric {
        return Err(CodecError::InvalidAddress {
            reason: format!("RP address '{address}' must be numeric"),
        });
    }
    let tp = address.to_bytes()?;
    buf.put_u8((tp.len() - 1) as u8);
    buf.put_slice(&tp[1..]);
    Ok(())
}

impl Decodable for RpData {
    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let first = decode_u8(buf, "RP message type missing")?;
        if first & !0x07 != 0 {
            tracing::debug!("RP message type octet {first:#04x} has spare bits set");
        }
        let message_type = RpMessageType::from(first & 0x07);
        if !message_type.is_data() {
            return Err(CodecError::UnsupportedPduType {
                mti: u8::from(message_type),
            });
        }

        let message_reference = decode_u8(buf, "RP message reference missing")?;
        let originator = decode_rp_address(buf)?;
        let destination = decode_rp_address(buf)?;

        let length_offset = offset_of(buf);
        let length = usize::from(decode_u8(buf, "RP user data length missing")?);
        if buf.remaining() != length {
            return Err(CodecError::MalformedPdu {
                offset: length_offset,
                reason: "RP user data length does not match the remaining octets",
            });
        }
        let user_data = decode_octets(buf, length, "RP user data truncated")?;

        Ok(Self {
            message_type,
            message_reference,
            originator,
            destination,
            user_data,
        })
    }
}

impl Encodable for RpData {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        if self.user_data.len() > MAX_RP_USER_DATA {
            return Err(CodecError::UserDataTooLong {
                length: self.user_data.len(),
                max: MAX_RP_USER_DATA,
            });
        }
        buf.put_u8(u8::from(self.message_type));
        buf.put_u8(self.message_reference);
        encode_rp_address(self.originator.as_ref(), buf)?;
        encode_rp_address(self.destination.as_ref(), buf)?;
        buf.put_u8(self.user_data.len() as u8);
        buf.put_slice(&self.user_data);
        Ok(())
    }
}

/// Unwraps an RP-DATA message, returning the decoded TPDU together with
/// the RP originator, if any.
///
/// Errors inside the TPDU are offset from the start of `bytes`.
pub fn decode_rp(bytes: &[u8]) -> Result<(Message, Option<Address>), CodecError> {
    let rp = RpData::decode(&mut Cursor::new(bytes))?;
    let base = bytes.len() - rp.user_data.len();
    let message = rp.message().map_err(|e| e.shifted(base))?;
    Ok((message, rp.originator))
}
