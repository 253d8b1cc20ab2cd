// ABOUTME: GSM 03.38 default alphabet tables, septet packing and UCS2/8-bit passthrough
// ABOUTME: Lookup tables are immutable statics shared freely across threads

use crate::codec::{CodecError, MAX_USER_DATA_OCTETS, MAX_USER_DATA_SEPTETS};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// Escape to the extension table
pub const ESCAPE: u8 = 0x1B;

/// Septet written for characters the default alphabet cannot represent ('?')
pub const UNENCODABLE_SEPTET: u8 = 0x3F;

/// Character produced when received septets or code units have no mapping
pub const REPLACEMENT_CHAR: char = char::REPLACEMENT_CHARACTER;

/// GSM 03.38 default alphabet, indexed by septet value.
///
/// Position 0x1B is the escape code and is never looked up directly.
static DEFAULT_ALPHABET: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å', //
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{A0}', 'Æ', 'æ', 'ß', 'É', //
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', //
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', //
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', //
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§', //
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', //
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à', //
];

/// Extension table reached through [`ESCAPE`]
static EXTENSION_TABLE: [(u8, char); 10] = [
    (0x0A, '\u{0C}'),
    (0x14, '^'),
    (0x28, '{'),
    (0x29, '}'),
    (0x2F, '\\'),
    (0x3C, '['),
    (0x3D, '~'),
    (0x3E, ']'),
    (0x40, '|'),
    (0x65, '€'),
];

/// Text alphabet selected by the data coding scheme
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Alphabet {
    /// GSM 7-bit default alphabet, user data length counted in septets
    #[default]
    Gsm7,
    /// 8-bit data, user data length counted in octets
    EightBit,
    /// UCS2 big-endian code units, user data length counted in octets
    Ucs2,
}

impl Alphabet {
    /// Picks the 7-bit alphabet when every character is representable,
    /// otherwise UCS2
    pub fn detect(text: &str) -> Self {
        if is_gsm7_encodable(text) {
            Alphabet::Gsm7
        } else {
            Alphabet::Ucs2
        }
    }

    /// Length of `text` in the unit this alphabet's user data length uses
    pub fn encoded_len(&self, text: &str) -> usize {
        match self {
            Alphabet::Gsm7 => septet_len(text),
            Alphabet::EightBit => text.chars().count(),
            Alphabet::Ucs2 => text.encode_utf16().count() * 2,
        }
    }

    /// Characters (or octets) fitting in one message without a header
    pub fn max_single_length(&self) -> usize {
        match self {
            Alphabet::Gsm7 => MAX_USER_DATA_SEPTETS,
            Alphabet::EightBit => MAX_USER_DATA_OCTETS,
            Alphabet::Ucs2 => MAX_USER_DATA_OCTETS / 2,
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alphabet::Gsm7 => write!(f, "GSM 7-bit default"),
            Alphabet::EightBit => write!(f, "8-bit data"),
            Alphabet::Ucs2 => write!(f, "UCS2"),
        }
    }
}

fn default_septet(c: char) -> Option<u8> {
    if c == '\u{A0}' {
        return None;
    }
    DEFAULT_ALPHABET
        .iter()
        .position(|&entry| entry == c)
        .map(|index| index as u8)
        .or(match c {
            // Lower-case c-cedilla shares the capital's code point
            'ç' => Some(0x09),
            _ => None,
        })
}

fn extension_septet(c: char) -> Option<u8> {
    EXTENSION_TABLE
        .iter()
        .find(|(_, entry)| *entry == c)
        .map(|(code, _)| *code)
}

fn extension_char(code: u8) -> Option<char> {
    EXTENSION_TABLE
        .iter()
        .find(|(entry, _)| *entry == code)
        .map(|(_, c)| *c)
}

/// True if every character of `text` is in the default or extension table
pub fn is_gsm7_encodable(text: &str) -> bool {
    text.chars()
        .all(|c| default_septet(c).is_some() || extension_septet(c).is_some())
}

/// Number of septets `text` occupies; extension characters count twice
pub fn septet_len(text: &str) -> usize {
    text.chars()
        .map(|c| match default_septet(c) {
            Some(_) => 1,
            None if extension_septet(c).is_some() => 2,
            None => 1,
        })
        .sum()
}

/// Maps text to septet values, substituting '?' for unencodable characters
pub fn encode_gsm7(text: &str) -> Vec<u8> {
    let mut septets = Vec::with_capacity(text.len());
    for c in text.chars() {
        if let Some(septet) = default_septet(c) {
            septets.push(septet);
        } else if let Some(code) = extension_septet(c) {
            septets.push(ESCAPE);
            septets.push(code);
        } else {
            tracing::trace!("character {c:?} not in GSM 7-bit alphabet, replacing");
            septets.push(UNENCODABLE_SEPTET);
        }
    }
    septets
}

/// Maps septet values to text.
///
/// An escape that is not followed by an extension table entry becomes a
/// single [`REPLACEMENT_CHAR`], consuming the septet after it.
pub fn decode_gsm7(septets: &[u8]) -> String {
    let mut text = String::with_capacity(septets.len());
    let mut iter = septets.iter().map(|s| s & 0x7F);
    while let Some(septet) = iter.next() {
        if septet == ESCAPE {
            match iter.next().and_then(extension_char) {
                Some(c) => text.push(c),
                None => text.push(REPLACEMENT_CHAR),
            }
        } else {
            text.push(DEFAULT_ALPHABET[septet as usize]);
        }
    }
    text
}

/// Octets needed to hold `septets` septets after `fill_bits` leading bits
pub const fn packed_len(septets: usize, fill_bits: u8) -> usize {
    (fill_bits as usize + septets * 7).div_ceil(8)
}

/// Fill bits placed after a user data header of `header_octets` octets
/// (length byte included) so the text starts on a septet boundary
pub const fn fill_bits(header_octets: usize) -> u8 {
    ((7 - (header_octets * 8) % 7) % 7) as u8
}

/// Septets a user data header of `header_octets` octets occupies in the
/// 7-bit user data length
pub const fn header_septets(header_octets: usize) -> usize {
    (header_octets * 8).div_ceil(7)
}

/// Packs septet values LSB-first, leaving `fill_bits` zero bits at the start.
/// The trailing partial octet is zero padded.
pub fn pack_raw_septets(septets: &[u8], fill_bits: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(packed_len(septets.len(), fill_bits));
    let mut acc: u32 = 0;
    let mut bits: u32 = u32::from(fill_bits);
    for &septet in septets {
        acc |= u32::from(septet & 0x7F) << bits;
        bits += 7;
        while bits >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        out.push(acc as u8);
    }
    out
}

/// Unpacks `count` septets from `bytes`, skipping `fill_bits` leading bits
pub fn unpack_raw_septets(
    bytes: &[u8],
    count: usize,
    fill_bits: u8,
) -> Result<Vec<u8>, CodecError> {
    let needed = packed_len(count, fill_bits);
    if bytes.len() < needed {
        return Err(CodecError::AlphabetDecode {
            expected: needed,
            actual: bytes.len(),
        });
    }

    let mut septets = Vec::with_capacity(count);
    for i in 0..count {
        let bit = fill_bits as usize + i * 7;
        let index = bit / 8;
        let shift = bit % 8;
        let mut value = u16::from(bytes[index]) >> shift;
        if shift > 1 {
            value |= u16::from(bytes[index + 1]) << (8 - shift);
        }
        septets.push((value & 0x7F) as u8);
    }
    Ok(septets)
}

/// Packs text in the default alphabet, returning the octets and the
/// number of septets they hold
pub fn pack_septets(text: &str) -> (Bytes, usize) {
    let septets = encode_gsm7(text);
    let packed = pack_raw_septets(&septets, 0);
    (Bytes::from(packed), septets.len())
}

/// Unpacks `septet_count` septets of default-alphabet text
pub fn unpack_septets(bytes: &[u8], septet_count: usize) -> Result<String, CodecError> {
    let septets = unpack_raw_septets(bytes, septet_count, 0)?;
    Ok(decode_gsm7(&septets))
}

/// Encodes text as big-endian UTF-16 code units
pub fn encode_ucs2(text: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        buf.put_u16(unit);
    }
    buf.freeze()
}

/// Decodes big-endian UTF-16 code units.
///
/// Unpaired surrogates become [`REPLACEMENT_CHAR`]; an odd octet count is an
/// [`CodecError::AlphabetDecode`].
pub fn decode_ucs2(bytes: &[u8]) -> Result<String, CodecError> {
    if bytes.len() % 2 != 0 {
        return Err(CodecError::AlphabetDecode {
            expected: bytes.len() + 1,
            actual: bytes.len(),
        });
    }
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    Ok(char::decode_utf16(units)
        .map(|unit| unit.unwrap_or(REPLACEMENT_CHAR))
        .collect())
}

/// Octets map one-to-one onto U+0000..=U+00FF
pub fn decode_octets(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Inverse of [`decode_octets`]; characters above U+00FF become '?'
pub fn encode_octets(text: &str) -> Bytes {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_hellohello() {
        let (packed, septets) = pack_septets("hellohello");
        assert_eq!(septets, 10);
        assert_eq!(
            packed.as_ref(),
            &[0xE8, 0x32, 0x9B, 0xFD, 0x46, 0x97, 0xD9, 0xEC, 0x37]
        );
    }

    #[test]
    fn unpack_hellohello() {
        let data = [0xE8, 0x32, 0x9B, 0xFD, 0x46, 0x97, 0xD9, 0xEC, 0x37];
        assert_eq!(unpack_septets(&data, 10).unwrap(), "hellohello");
    }

    #[test]
    fn pack_with_fill_bits() {
        // 'abcd' after a one-octet header: six fill bits
        let septets = encode_gsm7("abcd");
        assert_eq!(
            pack_raw_septets(&septets, 6),
            vec![0x40, 0x58, 0x3C, 0x26, 0x03]
        );
        assert_eq!(pack_raw_septets(&septets, 0), vec![0x61, 0xF1, 0x98, 0x0C]);

        let unpacked = unpack_raw_septets(&[0x40, 0x58, 0x3C, 0x26, 0x03], 4, 6).unwrap();
        assert_eq!(decode_gsm7(&unpacked), "abcd");
    }

    #[test]
    fn one_hundred_sixty_septets_in_140_octets() {
        let text = "x".repeat(160);
        let (packed, septets) = pack_septets(&text);
        assert_eq!(septets, 160);
        assert_eq!(packed.len(), 140);
        assert_eq!(unpack_septets(&packed, 160).unwrap(), text);
    }

    #[test]
    fn seven_octets_hold_eight_septets() {
        let (packed, _) = pack_septets("12345678");
        assert_eq!(packed.len(), 7);
        assert_eq!(unpack_septets(&packed, 8).unwrap(), "12345678");
        // With only the octets to go on, seven septets are just as plausible
        assert_eq!(unpack_septets(&packed, 7).unwrap(), "1234567");
    }

    #[test]
    fn septet_round_trip_all_lengths() {
        let alphabet: String = DEFAULT_ALPHABET
            .iter()
            .filter(|&&c| c != '\u{A0}')
            .collect();
        for len in 0..=160 {
            let text: String = alphabet.chars().cycle().take(len).collect();
            let (packed, septets) = pack_septets(&text);
            assert_eq!(septets, len);
            assert_eq!(packed.len(), packed_len(len, 0));
            assert_eq!(unpack_septets(&packed, septets).unwrap(), text, "len {len}");
        }
    }

    #[test]
    fn extension_characters_round_trip() {
        let text = "Argh [{}] ~|\\^€";
        assert_eq!(septet_len(text), 6 + 9 * 2);
        let (packed, septets) = pack_septets(text);
        assert_eq!(unpack_septets(&packed, septets).unwrap(), text);
    }

    #[test]
    fn euro_uses_escape() {
        assert_eq!(encode_gsm7("€"), vec![ESCAPE, 0x65]);
    }

    #[test]
    fn invalid_escape_decodes_to_replacement() {
        let septets = [0x48, 0x69, ESCAPE, 0x41, 0x21];
        assert_eq!(decode_gsm7(&septets), format!("Hi{REPLACEMENT_CHAR}!"));
    }

    #[test]
    fn trailing_escape_decodes_to_replacement() {
        assert_eq!(decode_gsm7(&[0x41, ESCAPE]), format!("A{REPLACEMENT_CHAR}"));
    }

    #[test]
    fn unencodable_becomes_question_mark() {
        assert_eq!(encode_gsm7("a\u{20AD}b"), vec![0x61, 0x3F, 0x62]);
        assert!(!is_gsm7_encodable("a\u{20AD}b"));
    }

    #[test]
    fn short_buffer_is_alphabet_error() {
        let err = unpack_septets(&[0xE8, 0x32], 10).unwrap_err();
        assert_eq!(
            err,
            CodecError::AlphabetDecode {
                expected: 9,
                actual: 2
            }
        );
    }

    #[test]
    fn header_alignment() {
        // UDHL 5 + length byte: one fill bit, seven septets
        assert_eq!(fill_bits(6), 1);
        assert_eq!(header_septets(6), 7);
        // 16-bit reference header ends on a septet boundary
        assert_eq!(fill_bits(7), 0);
        assert_eq!(header_septets(7), 8);
    }

    #[test]
    fn ucs2_round_trip() {
        let text = "Hello poopyhead © ® ¡ 😀";
        let encoded = encode_ucs2(text);
        assert_eq!(&encoded[..4], &[0x00, 0x48, 0x00, 0x65]);
        assert_eq!(decode_ucs2(&encoded).unwrap(), text);
    }

    #[test]
    fn ucs2_unpaired_surrogate() {
        assert_eq!(
            decode_ucs2(&[0x00, 0x41, 0xD8, 0x00, 0x00, 0x42]).unwrap(),
            format!("A{REPLACEMENT_CHAR}B")
        );
        assert!(decode_ucs2(&[0x00, 0x41, 0x00]).is_err());
    }

    #[test]
    fn octets_map_to_latin1() {
        let data = [0x00, 0x7F, 0x80, 0xFF];
        let text = decode_octets(&data);
        assert_eq!(text.chars().count(), 4);
        assert_eq!(encode_octets(&text).as_ref(), &data);
    }

    #[test]
    fn detect_alphabet() {
        assert_eq!(Alphabet::detect("hello €"), Alphabet::Gsm7);
        assert_eq!(Alphabet::detect("h\u{20AD}llo"), Alphabet::Ucs2);
        assert_eq!(Alphabet::Ucs2.encoded_len("ab"), 4);
        assert_eq!(Alphabet::Gsm7.encoded_len("a€"), 3);
    }
}
