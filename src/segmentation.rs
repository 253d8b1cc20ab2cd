// ABOUTME: Splits text too long for one TPDU into concatenated Submit or Deliver parts
// ABOUTME: Never cuts an escape sequence or a surrogate pair across two parts

use crate::alphabet::{self, Alphabet};
use crate::codec::{CodecError, MAX_USER_DATA_OCTETS, MAX_USER_DATA_SEPTETS};
use crate::datatypes::{Address, DataCodingScheme, Deliver, Submit, Timestamp, UserDataHeader};

/// Most parts a concatenation element can count
pub const MAX_PARTS: usize = 255;

/// Text units (septets, code units or octets) one part holds next to a
/// header of `header_octets`
pub fn part_capacity(alphabet: Alphabet, header_octets: usize) -> usize {
    match alphabet {
        Alphabet::Gsm7 => MAX_USER_DATA_SEPTETS - alphabet::header_septets(header_octets),
        Alphabet::Ucs2 => (MAX_USER_DATA_OCTETS - header_octets) / 2,
        Alphabet::EightBit => MAX_USER_DATA_OCTETS - header_octets,
    }
}

/// Width of one character in the units `alphabet` counts
fn char_units(alphabet: Alphabet, c: char) -> usize {
    match alphabet {
        Alphabet::Gsm7 => {
            let mut buf = [0u8; 4];
            alphabet::septet_len(c.encode_utf8(&mut buf))
        }
        Alphabet::Ucs2 => c.len_utf16(),
        Alphabet::EightBit => 1,
    }
}

/// Splits `text` into chunks; a single chunk when it fits unconcatenated,
/// otherwise chunks sized for a concatenation header of `header_octets`
pub fn split_text(text: &str, alphabet: Alphabet, header_octets: usize) -> Vec<String> {
    let total: usize = text.chars().map(|c| char_units(alphabet, c)).sum();
    if total <= alphabet.max_single_length() {
        return vec![text.to_string()];
    }

    let capacity = part_capacity(alphabet, header_octets);
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for c in text.chars() {
        let width = char_units(alphabet, c);
        if used + width > capacity {
            parts.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(c);
        used += width;
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn header_octets_for(reference: u16) -> usize {
    UserDataHeader::concatenated(reference, 1, 1).encoded_len()
}

fn chunks(text: &str, alphabet: Alphabet, reference: u16) -> Result<Vec<String>, CodecError> {
    let header_octets = header_octets_for(reference);
    let chunks = split_text(text, alphabet, header_octets);
    if chunks.len() > MAX_PARTS {
        return Err(CodecError::UserDataTooLong {
            length: text.chars().map(|c| char_units(alphabet, c)).sum(),
            max: MAX_PARTS * part_capacity(alphabet, header_octets),
        });
    }
    Ok(chunks)
}

/// Builds the Submit TPDUs for `text`. A text that fits in one TPDU
/// yields a single Submit without a header; otherwise every part carries
/// a concatenation element with `reference` and consecutive message
/// references starting at `message_reference`.
pub fn segment_submit(
    destination: &Address,
    text: &str,
    reference: u16,
    message_reference: u8,
) -> Result<Vec<Submit>, CodecError> {
    let alphabet = Alphabet::detect(text);
    let chunks = chunks(text, alphabet, reference)?;
    let total = chunks.len() as u8;
    let single = chunks.len() == 1;

    tracing::debug!("segmenting {} into {} {} parts", destination, total, alphabet);
    Ok(chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let submit = Submit::new(destination.clone(), chunk)
                .with_data_coding(DataCodingScheme::for_alphabet(alphabet))
                .with_message_reference(message_reference.wrapping_add(i as u8));
            if single {
                submit
            } else {
                submit.with_header(UserDataHeader::concatenated(reference, total, i as u8 + 1))
            }
        })
        .collect())
}

/// Builds the Deliver TPDUs for `text`, concatenated as in [`segment_submit`]
pub fn segment_deliver(
    origin: &Address,
    text: &str,
    timestamp: Timestamp,
    reference: u16,
) -> Result<Vec<Deliver>, CodecError> {
    let alphabet = Alphabet::detect(text);
    let chunks = chunks(text, alphabet, reference)?;
    let total = chunks.len() as u8;
    let single = chunks.len() == 1;

    Ok(chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let deliver = Deliver::new(origin.clone(), chunk, timestamp)
                .with_data_coding(DataCodingScheme::for_alphabet(alphabet));
            if single {
                deliver
            } else {
                deliver.with_header(UserDataHeader::concatenated(reference, total, i as u8 + 1))
            }
        })
        .collect())
}
