// ABOUTME: TP-VP in its relative, enhanced and absolute forms, selected by TP-VPF
// ABOUTME: Converts relative codes to durations and picks the smallest code covering a duration

use crate::codec::{CodecError, Decodable, Encodable, decode_array, decode_u8};
use crate::datatypes::Timestamp;
use bytes::{BufMut, BytesMut};
use std::io::Cursor;
use std::time::Duration;

const MINUTE: u64 = 60;
const DAY_MINUTES: u64 = 24 * 60;
const WEEK_MINUTES: u64 = 7 * DAY_MINUTES;

/// TP-VPF, bits 4..3 of the Submit first octet
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum ValidityPeriodFormat {
    #[default]
    NotPresent,
    Enhanced,
    Relative,
    Absolute,
}

impl ValidityPeriodFormat {
    /// Reads the format from the two low bits of `bits`
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => ValidityPeriodFormat::NotPresent,
            0b01 => ValidityPeriodFormat::Enhanced,
            0b10 => ValidityPeriodFormat::Relative,
            _ => ValidityPeriodFormat::Absolute,
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            ValidityPeriodFormat::NotPresent => 0b00,
            ValidityPeriodFormat::Enhanced => 0b01,
            ValidityPeriodFormat::Relative => 0b10,
            ValidityPeriodFormat::Absolute => 0b11,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ValidityPeriod {
    /// One-octet relative code, see [`ValidityPeriod::duration`]
    Relative(u8),
    /// Seven octets of enhanced format, carried opaquely
    Enhanced([u8; 7]),
    /// Absolute expiry time
    Absolute(Timestamp),
}

impl ValidityPeriod {
    pub fn format(&self) -> ValidityPeriodFormat {
        match self {
            ValidityPeriod::Relative(_) => ValidityPeriodFormat::Relative,
            ValidityPeriod::Enhanced(_) => ValidityPeriodFormat::Enhanced,
            ValidityPeriod::Absolute(_) => ValidityPeriodFormat::Absolute,
        }
    }

    /// Decodes the validity period announced by `format`, if any
    pub fn decode(
        buf: &mut Cursor<&[u8]>,
        format: ValidityPeriodFormat,
    ) -> Result<Option<Self>, CodecError> {
        Ok(match format {
            ValidityPeriodFormat::NotPresent => None,
            ValidityPeriodFormat::Relative => Some(ValidityPeriod::Relative(decode_u8(
                buf,
                "validity period truncated",
            )?)),
            ValidityPeriodFormat::Enhanced => Some(ValidityPeriod::Enhanced(decode_array(
                buf,
                "validity period truncated",
            )?)),
            ValidityPeriodFormat::Absolute => {
                Some(ValidityPeriod::Absolute(Timestamp::decode(buf)?))
            }
        })
    }

    /// Length of time a relative code stands for.
    ///
    /// - 0..=143: (v + 1) x 5 minutes
    /// - 144..=167: 12 hours + (v - 143) x 30 minutes
    /// - 168..=196: (v - 166) days
    /// - 197..=255: (v - 192) weeks
    pub fn relative_minutes(code: u8) -> u64 {
        let v = u64::from(code);
        match code {
            0..=143 => (v + 1) * 5,
            144..=167 => 720 + (v - 143) * 30,
            168..=196 => (v - 166) * DAY_MINUTES,
            _ => (v - 192) * WEEK_MINUTES,
        }
    }

    /// Smallest relative code whose period is at least `duration`,
    /// saturating at 63 weeks
    pub fn relative_from_duration(duration: Duration) -> Self {
        let minutes = duration.as_secs().div_ceil(MINUTE);
        let code = if minutes <= 720 {
            minutes.div_ceil(5).saturating_sub(1)
        } else if minutes <= DAY_MINUTES {
            143 + (minutes - 720).div_ceil(30)
        } else if minutes <= 30 * DAY_MINUTES {
            166 + minutes.div_ceil(DAY_MINUTES)
        } else {
            (192 + minutes.div_ceil(WEEK_MINUTES)).min(255)
        };
        ValidityPeriod::Relative(code as u8)
    }

    /// The relative period as a duration; `None` for the other forms
    pub fn duration(&self) -> Option<Duration> {
        match self {
            ValidityPeriod::Relative(code) => {
                Some(Duration::from_secs(Self::relative_minutes(*code) * MINUTE))
            }
            _ => None,
        }
    }
}

impl Encodable for ValidityPeriod {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        match self {
            ValidityPeriod::Relative(code) => buf.put_u8(*code),
            ValidityPeriod::Enhanced(octets) => buf.put_slice(octets),
            ValidityPeriod::Absolute(timestamp) => timestamp.encode(buf)?,
        }
        Ok(())
    }

    fn encoded_size(&self) -> usize {
        match self {
            ValidityPeriod::Relative(_) => 1,
            _ => 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(code: u8) -> u64 {
        ValidityPeriod::relative_minutes(code)
    }

    #[test]
    fn relative_breakpoints() {
        assert_eq!(minutes(0), 5);
        assert_eq!(minutes(143), 720);
        assert_eq!(minutes(144), 750);
        assert_eq!(minutes(167), 1440);
        assert_eq!(minutes(168), 2 * DAY_MINUTES);
        assert_eq!(minutes(196), 30 * DAY_MINUTES);
        assert_eq!(minutes(197), 5 * WEEK_MINUTES);
        assert_eq!(minutes(255), 63 * WEEK_MINUTES);
    }

    #[test]
    fn duration_of_relative_code() {
        let vp = ValidityPeriod::Relative(11);
        assert_eq!(vp.duration(), Some(Duration::from_secs(3600)));
        assert_eq!(ValidityPeriod::Enhanced([0; 7]).duration(), None);
    }

    #[test]
    fn from_duration_picks_covering_code() {
        let pick = |secs| ValidityPeriod::relative_from_duration(Duration::from_secs(secs));
        assert_eq!(pick(0), ValidityPeriod::Relative(0));
        assert_eq!(pick(300), ValidityPeriod::Relative(0));
        assert_eq!(pick(301), ValidityPeriod::Relative(1));
        assert_eq!(pick(12 * 3600), ValidityPeriod::Relative(143));
        assert_eq!(pick(12 * 3600 + 1), ValidityPeriod::Relative(144));
        assert_eq!(pick(24 * 3600), ValidityPeriod::Relative(167));
        assert_eq!(pick(24 * 3600 + 60), ValidityPeriod::Relative(168));
        assert_eq!(pick(30 * 86400), ValidityPeriod::Relative(196));
        assert_eq!(pick(30 * 86400 + 60), ValidityPeriod::Relative(197));
        assert_eq!(pick(1000 * 86400), ValidityPeriod::Relative(255));
    }

    #[test]
    fn every_code_covers_itself() {
        for code in 0..=255u8 {
            let vp = ValidityPeriod::Relative(code);
            let round = ValidityPeriod::relative_from_duration(vp.duration().unwrap());
            assert_eq!(round, vp, "code {code}");
        }
    }

    #[test]
    fn decode_by_format() {
        let data: &[u8] = &[0xAA];
        let mut cursor = Cursor::new(data);
        assert_eq!(
            ValidityPeriod::decode(&mut cursor, ValidityPeriodFormat::Relative).unwrap(),
            Some(ValidityPeriod::Relative(0xAA))
        );

        let mut cursor = Cursor::new(data);
        assert_eq!(
            ValidityPeriod::decode(&mut cursor, ValidityPeriodFormat::NotPresent).unwrap(),
            None
        );
        assert_eq!(cursor.position(), 0);

        let enhanced: &[u8] = &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut cursor = Cursor::new(enhanced);
        let vp = ValidityPeriod::decode(&mut cursor, ValidityPeriodFormat::Enhanced)
            .unwrap()
            .unwrap();
        assert_eq!(vp.to_bytes().unwrap().as_ref(), enhanced);
    }

    #[test]
    fn format_bits() {
        for bits in 0..4 {
            assert_eq!(ValidityPeriodFormat::from_bits(bits).bits(), bits);
        }
    }
}
