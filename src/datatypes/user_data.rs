// ABOUTME: TP-UDL and TP-UD: optional header plus text in the alphabet the DCS selects
// ABOUTME: A short buffer degrades to the text that is present; header faults are hard errors

use crate::alphabet::{self, Alphabet};
use crate::codec::{CodecError, Encodable, MAX_USER_DATA_OCTETS, decode_u8, offset_of};
use crate::datatypes::UserDataHeader;
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// Decoded user data: the header, if TP-UDHI was set, and the text.
///
/// 8-bit data is held as one char per octet (U+0000..=U+00FF).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct UserData {
    pub header: Option<UserDataHeader>,
    pub text: String,
}

impl UserData {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            header: None,
            text: text.into(),
        }
    }

    pub fn with_header(mut self, header: UserDataHeader) -> Self {
        self.header = Some(header);
        self
    }

    pub fn has_header(&self) -> bool {
        self.header.is_some()
    }

    fn header_len(&self) -> usize {
        self.header.as_ref().map_or(0, UserDataHeader::encoded_len)
    }

    /// TP-UDL for this user data: septets for the default alphabet,
    /// octets otherwise
    pub fn length(&self, alphabet: Alphabet) -> usize {
        let header = self.header_len();
        match alphabet {
            Alphabet::Gsm7 if header == 0 => alphabet::septet_len(&self.text),
            Alphabet::Gsm7 => alphabet::header_septets(header) + alphabet::septet_len(&self.text),
            _ => header + alphabet.encoded_len(&self.text),
        }
    }

    /// Octets TP-UD occupies on the wire
    pub fn octet_len(&self, alphabet: Alphabet) -> usize {
        match alphabet {
            Alphabet::Gsm7 => (self.length(alphabet) * 7).div_ceil(8),
            _ => self.length(alphabet),
        }
    }

    /// Writes TP-UDL followed by TP-UD
    pub fn encode(&self, buf: &mut BytesMut, alphabet: Alphabet) -> Result<(), CodecError> {
        let octets = self.octet_len(alphabet);
        if octets > MAX_USER_DATA_OCTETS {
            return Err(CodecError::UserDataTooLong {
                length: octets,
                max: MAX_USER_DATA_OCTETS,
            });
        }

        buf.put_u8(self.length(alphabet) as u8);
        let header_len = self.header_len();
        if let Some(header) = &self.header {
            header.encode(buf)?;
        }

        match alphabet {
            Alphabet::Gsm7 => {
                let septets = alphabet::encode_gsm7(&self.text);
                let fill = if header_len == 0 {
                    0
                } else {
                    alphabet::fill_bits(header_len)
                };
                buf.put_slice(&alphabet::pack_raw_septets(&septets, fill));
            }
            Alphabet::EightBit => buf.put_slice(&alphabet::encode_octets(&self.text)),
            Alphabet::Ucs2 => buf.put_slice(&alphabet::encode_ucs2(&self.text)),
        }
        Ok(())
    }

    /// Reads TP-UDL and TP-UD at the cursor.
    ///
    /// Only the octets TP-UDL announces are consumed; anything after them
    /// is left in the buffer.
    pub fn decode(
        buf: &mut Cursor<&[u8]>,
        alphabet: Alphabet,
        has_header: bool,
    ) -> Result<Self, CodecError> {
        let udl = usize::from(decode_u8(buf, "user data length missing")?);
        let start = offset_of(buf);

        let declared = match alphabet {
            Alphabet::Gsm7 => (udl * 7).div_ceil(8),
            _ => udl,
        };
        let available = declared.min(buf.remaining());
        if available < declared {
            tracing::warn!(
                "user data truncated: length announces {} octets, {} present",
                declared,
                available
            );
        }
        let data = buf.copy_to_bytes(available);

        let (header, header_len) = if has_header {
            if udl == 0 {
                return Err(CodecError::MalformedHeader {
                    offset: start,
                    reason: "header indicated but user data is empty",
                });
            }
            let (header, consumed) =
                UserDataHeader::parse(&data).map_err(|e| e.shifted(start))?;
            (Some(header), consumed)
        } else {
            (None, 0)
        };

        let body = &data[header_len..];
        let text = match alphabet {
            Alphabet::Gsm7 => {
                let (skip, fill) = if header_len == 0 {
                    (0, 0)
                } else {
                    (
                        alphabet::header_septets(header_len),
                        alphabet::fill_bits(header_len),
                    )
                };
                if skip > udl {
                    return Err(CodecError::MalformedHeader {
                        offset: start,
                        reason: "header longer than user data length",
                    });
                }
                let wanted = udl - skip;
                let present = (body.len() * 8).saturating_sub(usize::from(fill)) / 7;
                let septets = alphabet::unpack_raw_septets(body, wanted.min(present), fill)?;
                alphabet::decode_gsm7(&septets)
            }
            Alphabet::EightBit => alphabet::decode_octets(body),
            Alphabet::Ucs2 => {
                let even = body.len() & !1;
                if even < body.len() && available == declared {
                    tracing::warn!(
                        "UCS2 user data has odd length {}, last octet dropped",
                        body.len()
                    );
                }
                alphabet::decode_ucs2(&body[..even])?
            }
        };

        Ok(Self { header, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::user_data_header::Concatenation;

    fn encode(ud: &UserData, alphabet: Alphabet) -> Vec<u8> {
        let mut buf = BytesMut::new();
        ud.encode(&mut buf, alphabet).unwrap();
        buf.to_vec()
    }

    fn decode(data: &[u8], alphabet: Alphabet, has_header: bool) -> Result<UserData, CodecError> {
        UserData::decode(&mut Cursor::new(data), alphabet, has_header)
    }

    #[test]
    fn gsm7_without_header() {
        let ud = UserData::new("hellohello");
        let bytes = encode(&ud, Alphabet::Gsm7);
        assert_eq!(
            bytes,
            [0x0A, 0xE8, 0x32, 0x9B, 0xFD, 0x46, 0x97, 0xD9, 0xEC, 0x37]
        );
        assert_eq!(decode(&bytes, Alphabet::Gsm7, false).unwrap(), ud);
    }

    #[test]
    fn gsm7_with_header_uses_fill_bits() {
        let ud = UserData::new("abcd").with_header(UserDataHeader::concatenated(1, 2, 1));
        // Six header octets take seven septets; one fill bit precedes the text
        assert_eq!(ud.length(Alphabet::Gsm7), 11);
        let bytes = encode(&ud, Alphabet::Gsm7);
        assert_eq!(
            bytes,
            [0x0B, 0x05, 0x00, 0x03, 0x01, 0x02, 0x01, 0xC2, 0xE2, 0x31, 0x19]
        );
        let decoded = decode(&bytes, Alphabet::Gsm7, true).unwrap();
        assert_eq!(decoded, ud);
        assert_eq!(
            decoded.header.unwrap().concatenation(),
            Some(Concatenation {
                reference: 1,
                total: 2,
                part: 1
            })
        );
    }

    #[test]
    fn ucs2_with_header() {
        let ud = UserData::new("©®").with_header(UserDataHeader::concatenated(0x0102, 2, 2));
        let bytes = encode(&ud, Alphabet::Ucs2);
        assert_eq!(bytes[0], 7 + 4);
        assert_eq!(decode(&bytes, Alphabet::Ucs2, true).unwrap(), ud);
    }

    #[test]
    fn eight_bit_octets() {
        let ud = UserData::new("\u{0}\u{FF}\u{80}");
        let bytes = encode(&ud, Alphabet::EightBit);
        assert_eq!(bytes, [0x03, 0x00, 0xFF, 0x80]);
        assert_eq!(decode(&bytes, Alphabet::EightBit, false).unwrap(), ud);
    }

    #[test]
    fn truncated_payload_degrades() {
        // hellohello announced, only four octets present
        let data = [0x0A, 0xE8, 0x32, 0x9B, 0xFD];
        let ud = decode(&data, Alphabet::Gsm7, false).unwrap();
        assert_eq!(ud.text, "hell");

        let data = [0x04, 0x00, 0x41, 0x00];
        let ud = decode(&data, Alphabet::Ucs2, false).unwrap();
        assert_eq!(ud.text, "A");
    }

    #[test]
    fn header_overrun_is_malformed() {
        // Header length 10 with three octets left
        let data = [0x0C, 0x0A, 0x00, 0x03];
        let err = decode(&data, Alphabet::Gsm7, true).unwrap_err();
        assert_eq!(
            err,
            CodecError::MalformedHeader {
                offset: 1,
                reason: "header length exceeds user data"
            }
        );
    }

    #[test]
    fn header_indicator_with_empty_user_data() {
        let err = decode(&[0x00], Alphabet::Gsm7, true).unwrap_err();
        assert!(matches!(err, CodecError::MalformedHeader { .. }));
    }

    #[test]
    fn odd_ucs2_length_drops_last_octet() {
        let ud = decode(&[0x03, 0x00, 0x41, 0x00], Alphabet::Ucs2, false).unwrap();
        assert_eq!(ud.text, "A");

        let header = [0x09, 0x05, 0x00, 0x03, 0x07, 0x02, 0x01, 0x00, 0x42, 0x00];
        let ud = decode(&header, Alphabet::Ucs2, true).unwrap();
        assert_eq!(ud.text, "B");
        assert_eq!(ud.header.unwrap().concatenation().unwrap().reference, 7);
    }

    #[test]
    fn too_long_rejected() {
        let ud = UserData::new("x".repeat(141));
        let mut buf = BytesMut::new();
        assert_eq!(
            ud.encode(&mut buf, Alphabet::EightBit),
            Err(CodecError::UserDataTooLong {
                length: 141,
                max: 140
            })
        );

        let ud = UserData::new("x".repeat(160));
        assert!(ud.encode(&mut buf, Alphabet::Gsm7).is_ok());
        let ud = UserData::new("x".repeat(161));
        assert!(ud.encode(&mut BytesMut::new(), Alphabet::Gsm7).is_err());
    }

    #[test]
    fn trailing_octets_left_in_buffer() {
        let data: &[u8] = &[0x02, 0x41, 0x42, 0xEE];
        let mut cursor = Cursor::new(data);
        let ud = UserData::decode(&mut cursor, Alphabet::EightBit, false).unwrap();
        assert_eq!(ud.text, "AB");
        assert_eq!(cursor.remaining(), 1);
    }
}
