// GSM 03.40 TPDU codec - separates wire parsing/encoding from the field types
//
// Every field type (address, timestamp, user data header, ...) and every TPDU
// variant implements Encodable/Decodable rather than having all parsing logic
// in one monolithic parser. Decoding works on a Cursor so that every error can
// report the byte offset it happened at.

use bytes::{Buf, Bytes, BytesMut};
use std::io::Cursor;
use thiserror::Error;

/// Maximum length of TP-User-Data in octets
pub const MAX_USER_DATA_OCTETS: usize = 140;

/// Maximum length of TP-User-Data in septets (140 octets of packed 7-bit text)
pub const MAX_USER_DATA_SEPTETS: usize = 160;

/// Trait for types that can be encoded to TPDU octets
pub trait Encodable {
    /// Encode this value to the buffer
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Calculate the encoded size without keeping the encoding
    fn encoded_size(&self) -> usize {
        let mut buf = BytesMut::new();
        self.encode(&mut buf).map(|_| buf.len()).unwrap_or(0)
    }

    /// Convert this value to bytes (convenience method)
    fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::new();
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }
}

/// Trait for types that can be decoded from TPDU octets
pub trait Decodable: Sized {
    /// Decode a value starting at the cursor position, advancing past it
    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError>;
}

/// Codec errors with the byte offset and reason where one applies
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Malformed address at offset {offset}: {reason}")]
    MalformedAddress { offset: usize, reason: &'static str },

    #[error("Invalid address: {reason}")]
    InvalidAddress { reason: String },

    #[error("Alphabet decode error: need {expected} octets, have {actual}")]
    AlphabetDecode { expected: usize, actual: usize },

    #[error("Malformed user data header at offset {offset}: {reason}")]
    MalformedHeader { offset: usize, reason: &'static str },

    #[error("Malformed TPDU at offset {offset}: {reason}")]
    MalformedPdu { offset: usize, reason: &'static str },

    #[error("Unsupported TPDU type: message type indicator {mti:#04b}")]
    UnsupportedPduType { mti: u8 },

    #[error("User data too long: {length} exceeds maximum of {max}")]
    UserDataTooLong { length: usize, max: usize },

    #[error("Invalid timestamp field '{field}': {value}")]
    InvalidTimestamp { field: &'static str, value: u32 },
}

impl CodecError {
    /// Returns the byte offset for structural errors
    pub fn offset(&self) -> Option<usize> {
        match self {
            CodecError::MalformedAddress { offset, .. }
            | CodecError::MalformedHeader { offset, .. }
            | CodecError::MalformedPdu { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Re-bases the offset of an error produced while decoding a sub-slice
    pub(crate) fn shifted(self, base: usize) -> Self {
        match self {
            CodecError::MalformedAddress { offset, reason } => CodecError::MalformedAddress {
                offset: offset + base,
                reason,
            },
            CodecError::MalformedHeader { offset, reason } => CodecError::MalformedHeader {
                offset: offset + base,
                reason,
            },
            CodecError::MalformedPdu { offset, reason } => CodecError::MalformedPdu {
                offset: offset + base,
                reason,
            },
            other => other,
        }
    }

    /// True if the TPDU structure itself is broken (malformed PDU, address
    /// or header, or an unsupported type); false for errors confined to
    /// one value
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            CodecError::AlphabetDecode { .. }
                | CodecError::InvalidAddress { .. }
                | CodecError::UserDataTooLong { .. }
                | CodecError::InvalidTimestamp { .. }
        )
    }
}

/// Current cursor position as a byte offset
pub fn offset_of(buf: &Cursor<&[u8]>) -> usize {
    buf.position() as usize
}

/// Decode a single byte
pub fn decode_u8(buf: &mut Cursor<&[u8]>, field: &'static str) -> Result<u8, CodecError> {
    if buf.remaining() < 1 {
        return Err(CodecError::MalformedPdu {
            offset: offset_of(buf),
            reason: field,
        });
    }
    Ok(buf.get_u8())
}

/// Decode a fixed number of octets
pub fn decode_octets(
    buf: &mut Cursor<&[u8]>,
    len: usize,
    field: &'static str,
) -> Result<Bytes, CodecError> {
    if buf.remaining() < len {
        return Err(CodecError::MalformedPdu {
            offset: offset_of(buf),
            reason: field,
        });
    }
    Ok(buf.copy_to_bytes(len))
}

/// Decode a fixed-size array
pub fn decode_array<const N: usize>(
    buf: &mut Cursor<&[u8]>,
    field: &'static str,
) -> Result<[u8; N], CodecError> {
    if buf.remaining() < N {
        return Err(CodecError::MalformedPdu {
            offset: offset_of(buf),
            reason: field,
        });
    }
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

/// Swap the two nibbles of a semi-octet encoded byte
pub const fn swap_nibbles(byte: u8) -> u8 {
    byte.rotate_left(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_u8_reports_offset() {
        let data: &[u8] = &[0x01];
        let mut cursor = Cursor::new(data);
        assert_eq!(decode_u8(&mut cursor, "first").unwrap(), 0x01);

        let err = decode_u8(&mut cursor, "second").unwrap_err();
        assert_eq!(
            err,
            CodecError::MalformedPdu {
                offset: 1,
                reason: "second"
            }
        );
        assert_eq!(err.offset(), Some(1));
    }

    #[test]
    fn decode_octets_needs_enough_data() {
        let data: &[u8] = &[1, 2, 3];
        let mut cursor = Cursor::new(data);
        assert!(decode_octets(&mut cursor, 4, "ud").is_err());
        assert_eq!(decode_octets(&mut cursor, 3, "ud").unwrap().as_ref(), data);
    }

    #[test]
    fn decode_array_fixed_size() {
        let data: &[u8] = &[9, 8, 7, 6, 5, 4, 3, 2];
        let mut cursor = Cursor::new(data);
        let arr: [u8; 7] = decode_array(&mut cursor, "scts").unwrap();
        assert_eq!(arr, [9, 8, 7, 6, 5, 4, 3]);
        assert_eq!(offset_of(&cursor), 7);
    }

    #[test]
    fn nibble_swap() {
        assert_eq!(swap_nibbles(0x12), 0x21);
        assert_eq!(swap_nibbles(0xF1), 0x1F);
    }

    #[test]
    fn shifted_moves_structural_offsets_only() {
        let err = CodecError::MalformedHeader {
            offset: 2,
            reason: "overrun",
        };
        assert!(err.is_structural());
        assert_eq!(err.shifted(10).offset(), Some(12));
        assert!(CodecError::UnsupportedPduType { mti: 3 }.is_structural());

        let err = CodecError::AlphabetDecode {
            expected: 3,
            actual: 1,
        };
        assert_eq!(err.clone().shifted(10), err);
        assert!(!err.is_structural());
    }
}
