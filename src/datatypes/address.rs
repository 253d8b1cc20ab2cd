// ABOUTME: TP-OA/TP-DA/TP-RA address fields with semi-octet and alphanumeric encodings
// ABOUTME: Validates digits against the Type of Number before anything reaches the wire

use crate::alphabet;
use crate::codec::{CodecError, Decodable, Encodable, decode_u8, offset_of};
use crate::datatypes::{NumericPlanIndicator, TypeOfNumber};
use bytes::{Buf, BufMut, BytesMut};
use std::fmt;
use std::io::Cursor;

/// Maximum number of digits in a numeric address
pub const MAX_ADDRESS_DIGITS: usize = 20;

/// Maximum number of characters in an alphanumeric address
pub const MAX_ALPHANUMERIC_LENGTH: usize = 11;

/// Filler nibble padding an odd digit count
const FILLER_NIBBLE: u8 = 0x0F;

/// A validated short-message address.
///
/// Numeric addresses hold only decimal digits; the leading `+` of an
/// international number lives in the Type of Number, not in the digits.
/// Alphanumeric addresses hold GSM 7-bit text.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Address {
    value: String,
    ton: TypeOfNumber,
    npi: NumericPlanIndicator,
}

impl Address {
    /// Creates an address, validating `value` against `ton`.
    ///
    /// A leading `+` is accepted on numeric addresses and forces
    /// [`TypeOfNumber::International`].
    pub fn new(
        value: &str,
        ton: TypeOfNumber,
        npi: NumericPlanIndicator,
    ) -> Result<Self, CodecError> {
        if ton == TypeOfNumber::Alphanumeric {
            return Self::alphanumeric_with_plan(value, npi);
        }

        let (digits, ton) = match value.strip_prefix('+') {
            Some(rest) => (rest, TypeOfNumber::International),
            None => (value, ton),
        };

        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CodecError::InvalidAddress {
                reason: format!("'{value}' contains non-digit characters"),
            });
        }
        if digits.len() > MAX_ADDRESS_DIGITS {
            return Err(CodecError::InvalidAddress {
                reason: format!(
                    "{} digits exceeds maximum of {MAX_ADDRESS_DIGITS}",
                    digits.len()
                ),
            });
        }

        Ok(Self {
            value: digits.to_string(),
            ton,
            npi,
        })
    }

    /// International number in the ISDN/telephone plan, with or without `+`
    pub fn international(number: &str) -> Result<Self, CodecError> {
        Self::new(number, TypeOfNumber::International, NumericPlanIndicator::Isdn)
    }

    /// National number in the ISDN/telephone plan
    pub fn national(number: &str) -> Result<Self, CodecError> {
        Self::new(number, TypeOfNumber::National, NumericPlanIndicator::Isdn)
    }

    /// Alphanumeric sender name such as "INFO"
    pub fn alphanumeric(text: &str) -> Result<Self, CodecError> {
        Self::alphanumeric_with_plan(text, NumericPlanIndicator::Unknown)
    }

    fn alphanumeric_with_plan(text: &str, npi: NumericPlanIndicator) -> Result<Self, CodecError> {
        if !alphabet::is_gsm7_encodable(text) {
            return Err(CodecError::InvalidAddress {
                reason: format!("'{text}' is not representable in the GSM 7-bit alphabet"),
            });
        }
        if alphabet::septet_len(text) > MAX_ALPHANUMERIC_LENGTH {
            return Err(CodecError::InvalidAddress {
                reason: format!(
                    "alphanumeric address exceeds {MAX_ALPHANUMERIC_LENGTH} septets"
                ),
            });
        }
        Ok(Self {
            value: text.to_string(),
            ton: TypeOfNumber::Alphanumeric,
            npi,
        })
    }

    /// Guesses the address kind from its text: `+digits` is international,
    /// bare digits are of unknown type, anything else is alphanumeric
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        let digits = s.strip_prefix('+').unwrap_or(s);
        if digits.bytes().all(|b| b.is_ascii_digit()) {
            Self::new(s, TypeOfNumber::Unknown, NumericPlanIndicator::Isdn)
        } else {
            Self::alphanumeric(s)
        }
    }

    /// The digits (or text, for alphanumeric addresses), without any `+`
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn type_of_number(&self) -> TypeOfNumber {
        self.ton
    }

    pub fn numbering_plan(&self) -> NumericPlanIndicator {
        self.npi
    }

    pub fn is_alphanumeric(&self) -> bool {
        self.ton == TypeOfNumber::Alphanumeric
    }

    pub fn len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// The type-of-address octet; bit 7 is always set
    pub fn type_of_address(&self) -> u8 {
        0x80 | (u8::from(self.ton) << 4) | (u8::from(self.npi) & 0x0F)
    }
}

impl Default for Address {
    fn default() -> Self {
        Self {
            value: String::new(),
            ton: TypeOfNumber::Unknown,
            npi: NumericPlanIndicator::Isdn,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ton == TypeOfNumber::International {
            write!(f, "+{}", self.value)
        } else {
            write!(f, "{}", self.value)
        }
    }
}

impl Decodable for Address {
    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let start = offset_of(buf);
        let truncated = CodecError::MalformedAddress {
            offset: start,
            reason: "address header truncated",
        };
        let length = decode_u8(buf, "address length").map_err(|_| truncated.clone())?;
        let toa = decode_u8(buf, "type of address").map_err(|_| truncated)?;

        if toa & 0x80 == 0 {
            tracing::debug!("type-of-address {toa:#04x} has bit 7 clear");
        }
        let ton = TypeOfNumber::from((toa >> 4) & 0x07);
        let npi = NumericPlanIndicator::from(toa & 0x0F);

        let octets = usize::from(length).div_ceil(2);
        if buf.remaining() < octets {
            return Err(CodecError::MalformedAddress {
                offset: start,
                reason: "declared length reads past the buffer",
            });
        }
        let value_offset = offset_of(buf);
        let data = buf.copy_to_bytes(octets);

        let value = if ton == TypeOfNumber::Alphanumeric {
            let count = usize::from(length) * 4 / 7;
            let mut septets = alphabet::unpack_raw_septets(&data, count, 0).map_err(|_| {
                CodecError::MalformedAddress {
                    offset: value_offset,
                    reason: "alphanumeric address truncated",
                }
            })?;
            // Encoders that count whole octets leave a zero septet in the
            // padding of a 7-octet value; a real trailing '@' reads the same
            // and is dropped with it
            if usize::from(length) % 14 == 0 && septets.last() == Some(&0) {
                septets.pop();
            }
            alphabet::decode_gsm7(&septets)
        } else {
            if usize::from(length) > MAX_ADDRESS_DIGITS {
                return Err(CodecError::MalformedAddress {
                    offset: start,
                    reason: "address longer than 20 digits",
                });
            }
            unpack_digits(&data, usize::from(length), value_offset)?
        };

        Ok(Self { value, ton, npi })
    }
}

fn unpack_digits(data: &[u8], length: usize, offset: usize) -> Result<String, CodecError> {
    let mut digits = String::with_capacity(length);
    let nibbles = data.iter().flat_map(|&b| [b & 0x0F, b >> 4]);
    for (i, nibble) in nibbles.take(length).enumerate() {
        match nibble {
            0..=9 => digits.push(char::from(b'0' + nibble)),
            FILLER_NIBBLE if i == length - 1 => {}
            _ => {
                return Err(CodecError::MalformedAddress {
                    offset: offset + i / 2,
                    reason: "address digit is not a decimal semi-octet",
                });
            }
        }
    }
    Ok(digits)
}

impl Encodable for Address {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        if self.is_alphanumeric() {
            let septets = alphabet::encode_gsm7(&self.value);
            let packed = alphabet::pack_raw_septets(&septets, 0);
            buf.put_u8((septets.len() * 7).div_ceil(4) as u8);
            buf.put_u8(self.type_of_address());
            buf.put_slice(&packed);
            return Ok(());
        }

        buf.put_u8(self.value.len() as u8);
        buf.put_u8(self.type_of_address());
        for pair in self.value.as_bytes().chunks(2) {
            let low = pair[0] - b'0';
            let high = pair.get(1).map_or(FILLER_NIBBLE, |d| d - b'0');
            buf.put_u8((high << 4) | low);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_bytes(data: &[u8]) -> Result<(Address, usize), CodecError> {
        let mut cursor = Cursor::new(data);
        let address = Address::decode(&mut cursor)?;
        Ok((address, offset_of(&cursor)))
    }

    #[test]
    fn encode_odd_digit_count() {
        let address = Address::international("27838890001").unwrap();
        let bytes = address.to_bytes().unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[0x0B, 0x91, 0x72, 0x38, 0x88, 0x09, 0x00, 0xF1]
        );
    }

    #[test]
    fn decode_strips_filler() {
        let (address, consumed) =
            decode_bytes(&[0x0B, 0xC8, 0x72, 0x38, 0x88, 0x09, 0x00, 0xF1, 0x00]).unwrap();
        assert_eq!(address.value(), "27838890001");
        assert_eq!(address.type_of_number(), TypeOfNumber::SubscriberNumber);
        assert_eq!(address.numbering_plan(), NumericPlanIndicator::National);
        assert_eq!(consumed, 8);
        assert!(!address.value().contains('F'));
    }

    #[test]
    fn digit_round_trip_all_lengths() {
        let all = "12345678901234567890";
        for len in 0..=MAX_ADDRESS_DIGITS {
            let address = Address::national(&all[..len]).unwrap();
            let bytes = address.to_bytes().unwrap();
            assert_eq!(bytes.len(), 2 + len.div_ceil(2));
            let (decoded, consumed) = decode_bytes(&bytes).unwrap();
            assert_eq!(decoded, address, "len {len}");
            assert_eq!(consumed, bytes.len());
        }
    }

    #[test]
    fn leading_plus_selects_international() {
        let address = Address::parse("+46708251358").unwrap();
        assert_eq!(address.type_of_number(), TypeOfNumber::International);
        assert_eq!(address.value(), "46708251358");
        assert_eq!(address.type_of_address(), 0x91);
        assert_eq!(address.to_string(), "+46708251358");
    }

    #[test]
    fn invalid_characters_rejected() {
        assert!(matches!(
            Address::national("123-456"),
            Err(CodecError::InvalidAddress { .. })
        ));
        assert!(matches!(
            Address::international("+12+3"),
            Err(CodecError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn too_many_digits_rejected() {
        let long = "1".repeat(21);
        assert!(matches!(
            Address::national(&long),
            Err(CodecError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn declared_length_past_buffer() {
        let result = decode_bytes(&[0x0B, 0x91, 0x72, 0x38]);
        assert_eq!(
            result.unwrap_err(),
            CodecError::MalformedAddress {
                offset: 0,
                reason: "declared length reads past the buffer"
            }
        );
    }

    #[test]
    fn non_decimal_nibble_rejected() {
        let result = decode_bytes(&[0x04, 0x81, 0x21, 0x4A]);
        assert!(matches!(
            result,
            Err(CodecError::MalformedAddress { offset: 3, .. })
        ));
    }

    #[test]
    fn empty_address() {
        let address = Address::new("", TypeOfNumber::Unknown, NumericPlanIndicator::Isdn).unwrap();
        let bytes = address.to_bytes().unwrap();
        assert_eq!(bytes.as_ref(), &[0x00, 0x81]);
        let (decoded, consumed) = decode_bytes(&bytes).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(consumed, 2);
    }

    #[test]
    fn alphanumeric_round_trip() {
        let address = Address::parse("eKit").unwrap();
        assert!(address.is_alphanumeric());
        let bytes = address.to_bytes().unwrap();
        assert_eq!(bytes.as_ref(), &[0x07, 0xD0, 0xE5, 0x65, 0x9A, 0x0E]);
        let (decoded, _) = decode_bytes(&bytes).unwrap();
        assert_eq!(decoded, address);
    }

    #[test]
    fn alphanumeric_length_counted_in_octets() {
        // Some encoders declare whole octets: 8 semi-octets for 4 septets
        let (decoded, consumed) = decode_bytes(&[0x08, 0xD0, 0xE5, 0x65, 0x9A, 0x0E]).unwrap();
        assert_eq!(decoded.value(), "eKit");
        assert_eq!(consumed, 6);

        // 7 septets fill 7 octets leaving a zero septet in the padding
        let (decoded, _) =
            decode_bytes(&[0x0E, 0xD0, 0x41, 0xE1, 0x90, 0x58, 0x34, 0x1E, 0x01]).unwrap();
        assert_eq!(decoded.value(), "ABCDEFG");
    }

    #[test]
    fn alphanumeric_trailing_at_sign_lost() {
        // A final '@' is septet 0 and reads the same as the padding above
        let address = Address::alphanumeric("ABCDEFG@").unwrap();
        let bytes = address.to_bytes().unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[0x0E, 0xD0, 0x41, 0xE1, 0x90, 0x58, 0x34, 0x1E, 0x01]
        );
        let (decoded, _) = decode_bytes(&bytes).unwrap();
        assert_eq!(decoded.value(), "ABCDEFG");

        // Elsewhere '@' survives
        let address = Address::alphanumeric("AB@D").unwrap();
        let (decoded, _) = decode_bytes(&address.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.value(), "AB@D");
    }

    #[test]
    fn alphanumeric_too_long() {
        assert!(Address::alphanumeric("ABCDEFGHIJKL").is_err());
        assert!(Address::alphanumeric("ABCDEFGHIJK").is_ok());
    }

    #[test]
    fn reserved_plan_preserved() {
        let (decoded, _) = decode_bytes(&[0x02, 0x8F, 0x21]).unwrap();
        assert_eq!(decoded.numbering_plan(), NumericPlanIndicator::Reserved(0x0F));
        assert_eq!(decoded.to_bytes().unwrap().as_ref(), &[0x02, 0x8F, 0x21]);
    }
}
