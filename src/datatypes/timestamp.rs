// ABOUTME: Seven-octet swapped-BCD service centre timestamp (TP-SCTS, TP-DT, absolute TP-VP)
// ABOUTME: Keeps the timezone sign apart from its magnitude so a negative zero offset re-encodes

use crate::codec::{CodecError, Decodable, Encodable, decode_array, offset_of, swap_nibbles};
use bytes::{BufMut, BytesMut};
use std::fmt;
use std::io::Cursor;

/// Encoded length of a timestamp
pub const TIMESTAMP_OCTETS: usize = 7;

/// Largest timezone offset in quarter hours that two BCD digits with a sign bit carry
pub const MAX_TIMEZONE_QUARTERS: u8 = 79;

/// A wall-clock time with a timezone offset in quarter hours.
///
/// The wire format carries a two-digit year; it is read as 2000 + year.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Timestamp {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    negative: bool,
    quarters: u8,
}

impl Timestamp {
    /// Creates a UTC timestamp after range checking every field
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, CodecError> {
        check("year", u32::from(year), 2000..=2099)?;
        check("month", u32::from(month), 1..=12)?;
        check("day", u32::from(day), 1..=31)?;
        check("hour", u32::from(hour), 0..=23)?;
        check("minute", u32::from(minute), 0..=59)?;
        check("second", u32::from(second), 0..=59)?;

        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            negative: false,
            quarters: 0,
        })
    }

    /// Sets the timezone as a sign and a magnitude in quarter hours
    pub fn with_timezone(mut self, negative: bool, quarters: u8) -> Result<Self, CodecError> {
        check(
            "timezone",
            u32::from(quarters),
            0..=u32::from(MAX_TIMEZONE_QUARTERS),
        )?;
        self.negative = negative;
        self.quarters = quarters;
        Ok(self)
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    /// True when the timezone sign bit is set, including for a zero offset
    pub fn is_negative_offset(&self) -> bool {
        self.negative
    }

    pub fn timezone_quarters(&self) -> u8 {
        self.quarters
    }

    /// Offset from UTC in minutes
    pub fn utc_offset_minutes(&self) -> i32 {
        let minutes = i32::from(self.quarters) * 15;
        if self.negative { -minutes } else { minutes }
    }
}

fn check(
    field: &'static str,
    value: u32,
    range: std::ops::RangeInclusive<u32>,
) -> Result<(), CodecError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(CodecError::InvalidTimestamp { field, value })
    }
}

/// Reads one swapped-BCD digit pair
fn bcd_octet(byte: u8, offset: usize) -> Result<u8, CodecError> {
    let swapped = swap_nibbles(byte);
    let (tens, units) = (swapped >> 4, swapped & 0x0F);
    if tens > 9 || units > 9 {
        return Err(CodecError::MalformedPdu {
            offset,
            reason: "timestamp digit is not decimal",
        });
    }
    Ok(tens * 10 + units)
}

fn to_bcd_octet(value: u8) -> u8 {
    swap_nibbles(((value / 10) << 4) | (value % 10))
}

impl Decodable for Timestamp {
    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let start = offset_of(buf);
        let raw: [u8; TIMESTAMP_OCTETS] = decode_array(buf, "timestamp truncated")?;

        let mut fields = [0u8; 6];
        for (i, field) in fields.iter_mut().enumerate() {
            *field = bcd_octet(raw[i], start + i)?;
        }

        let zone = swap_nibbles(raw[6]);
        let negative = zone & 0x80 != 0;
        let quarters = bcd_octet(swap_nibbles(zone & 0x7F), start + 6)?;

        Ok(Self {
            year: 2000 + u16::from(fields[0]),
            month: fields[1],
            day: fields[2],
            hour: fields[3],
            minute: fields[4],
            second: fields[5],
            negative,
            quarters,
        })
    }
}

impl Encodable for Timestamp {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let year = self.year.checked_sub(2000).filter(|y| *y < 100).ok_or(
            CodecError::InvalidTimestamp {
                field: "year",
                value: u32::from(self.year),
            },
        )?;
        buf.put_u8(to_bcd_octet(year as u8));
        buf.put_u8(to_bcd_octet(self.month));
        buf.put_u8(to_bcd_octet(self.day));
        buf.put_u8(to_bcd_octet(self.hour));
        buf.put_u8(to_bcd_octet(self.minute));
        buf.put_u8(to_bcd_octet(self.second));

        let sign = if self.negative { 0x08 } else { 0x00 };
        buf.put_u8(to_bcd_octet(self.quarters) | sign);
        Ok(())
    }

    fn encoded_size(&self) -> usize {
        TIMESTAMP_OCTETS
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let offset = self.quarters as u32 * 15;
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}{}{:02}:{:02}",
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            if self.negative { '-' } else { '+' },
            offset / 60,
            offset % 60
        )
    }
}
