// ABOUTME: TP-DCS data coding scheme kept verbatim with the alphabet and message class derived from it
// ABOUTME: Unknown coding groups fall back to the default alphabet so decoding never rejects a DCS

use crate::alphabet::Alphabet;
use std::fmt;

/// TP-Data-Coding-Scheme octet.
///
/// The raw value is retained so that a decoded TPDU re-encodes exactly;
/// the alphabet and message class are interpretations of it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DataCodingScheme(u8);

impl DataCodingScheme {
    pub const GSM7: DataCodingScheme = DataCodingScheme(0x00);
    pub const EIGHT_BIT: DataCodingScheme = DataCodingScheme(0x04);
    pub const UCS2: DataCodingScheme = DataCodingScheme(0x08);

    pub fn from_byte(value: u8) -> Self {
        DataCodingScheme(value)
    }

    pub fn to_byte(&self) -> u8 {
        self.0
    }

    /// General data coding without message class for `alphabet`
    pub fn for_alphabet(alphabet: Alphabet) -> Self {
        match alphabet {
            Alphabet::Gsm7 => Self::GSM7,
            Alphabet::EightBit => Self::EIGHT_BIT,
            Alphabet::Ucs2 => Self::UCS2,
        }
    }

    /// General data coding with a message class
    pub fn with_class(alphabet: Alphabet, class: MessageClass) -> Self {
        DataCodingScheme(0x10 | Self::for_alphabet(alphabet).0 | class.bits())
    }

    /// Returns the alphabet the user data is encoded in
    pub fn alphabet(&self) -> Alphabet {
        let value = self.0;
        match value >> 4 {
            // General data coding and automatic deletion; compressed text
            // is opaque octets
            0x0..=0x7 => {
                if value & 0x20 != 0 {
                    return Alphabet::EightBit;
                }
                match (value >> 2) & 0b11 {
                    0b01 => Alphabet::EightBit,
                    0b10 => Alphabet::Ucs2,
                    _ => Alphabet::Gsm7,
                }
            }
            // Message waiting indication: discard or store
            0xC | 0xD => Alphabet::Gsm7,
            // Message waiting indication: store, UCS2
            0xE => Alphabet::Ucs2,
            // Data coding / message class
            0xF => {
                if value & 0x04 != 0 {
                    Alphabet::EightBit
                } else {
                    Alphabet::Gsm7
                }
            }
            // Reserved coding groups
            _ => Alphabet::Gsm7,
        }
    }

    /// Returns true if the text is compressed
    pub fn is_compressed(&self) -> bool {
        self.0 >> 6 <= 0b01 && self.0 & 0x20 != 0
    }

    /// Returns the message class if this coding scheme includes one
    pub fn message_class(&self) -> Option<MessageClass> {
        let value = self.0;
        let has_class = match value >> 4 {
            0x0..=0x7 => value & 0x10 != 0,
            0xF => true,
            _ => false,
        };
        has_class.then(|| MessageClass::from_bits(value))
    }

    /// Returns true if this coding scheme includes a message class
    pub fn has_message_class(&self) -> bool {
        self.message_class().is_some()
    }

    /// Returns true for the message-waiting indication groups
    pub fn is_message_waiting(&self) -> bool {
        matches!(self.0 >> 4, 0xC..=0xE)
    }
}

impl fmt::Debug for DataCodingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataCodingScheme({:#04x}, {:?})", self.0, self.alphabet())
    }
}

impl fmt::Display for DataCodingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message_class() {
            Some(class) => write!(f, "{} ({})", self.alphabet(), class.description()),
            None => write!(f, "{}", self.alphabet()),
        }
    }
}

impl From<u8> for DataCodingScheme {
    fn from(value: u8) -> Self {
        DataCodingScheme(value)
    }
}

impl From<DataCodingScheme> for u8 {
    fn from(dcs: DataCodingScheme) -> Self {
        dcs.0
    }
}

/// Message class for SMS delivery
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MessageClass {
    /// Class 0, displayed immediately and not stored
    Flash,
    /// Class 1, mobile equipment specific
    MobileEquipment,
    /// Class 2, SIM specific
    SimSpecific,
    /// Class 3, terminal equipment specific
    TerminalEquipment,
}

impl MessageClass {
    fn from_bits(value: u8) -> Self {
        match value & 0b11 {
            0 => MessageClass::Flash,
            1 => MessageClass::MobileEquipment,
            2 => MessageClass::SimSpecific,
            _ => MessageClass::TerminalEquipment,
        }
    }

    fn bits(&self) -> u8 {
        match self {
            MessageClass::Flash => 0,
            MessageClass::MobileEquipment => 1,
            MessageClass::SimSpecific => 2,
            MessageClass::TerminalEquipment => 3,
        }
    }

    /// Returns a human-readable description of the message class
    pub fn description(&self) -> &'static str {
        match self {
            MessageClass::Flash => "Flash SMS (immediate display)",
            MessageClass::MobileEquipment => "Mobile Equipment specific",
            MessageClass::SimSpecific => "SIM card storage",
            MessageClass::TerminalEquipment => "Terminal Equipment specific",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_coding_alphabets() {
        assert_eq!(DataCodingScheme::from_byte(0x00).alphabet(), Alphabet::Gsm7);
        assert_eq!(DataCodingScheme::from_byte(0x04).alphabet(), Alphabet::EightBit);
        assert_eq!(DataCodingScheme::from_byte(0x08).alphabet(), Alphabet::Ucs2);
        // Reserved alphabet value in general coding
        assert_eq!(DataCodingScheme::from_byte(0x0C).alphabet(), Alphabet::Gsm7);
    }

    #[test]
    fn data_coding_message_class_group() {
        let dcs = DataCodingScheme::from_byte(0xF0);
        assert_eq!(dcs.alphabet(), Alphabet::Gsm7);
        assert_eq!(dcs.message_class(), Some(MessageClass::Flash));

        let dcs = DataCodingScheme::from_byte(0xF6);
        assert_eq!(dcs.alphabet(), Alphabet::EightBit);
        assert_eq!(dcs.message_class(), Some(MessageClass::SimSpecific));
    }

    #[test]
    fn class_bit_in_general_coding() {
        let dcs = DataCodingScheme::with_class(Alphabet::Ucs2, MessageClass::MobileEquipment);
        assert_eq!(dcs.to_byte(), 0x19);
        assert_eq!(dcs.alphabet(), Alphabet::Ucs2);
        assert_eq!(dcs.message_class(), Some(MessageClass::MobileEquipment));
        assert!(!DataCodingScheme::UCS2.has_message_class());
    }

    #[test]
    fn compressed_is_opaque() {
        let dcs = DataCodingScheme::from_byte(0x20);
        assert!(dcs.is_compressed());
        assert_eq!(dcs.alphabet(), Alphabet::EightBit);
    }

    #[test]
    fn message_waiting_groups() {
        assert_eq!(DataCodingScheme::from_byte(0xC8).alphabet(), Alphabet::Gsm7);
        assert_eq!(DataCodingScheme::from_byte(0xD0).alphabet(), Alphabet::Gsm7);
        assert_eq!(DataCodingScheme::from_byte(0xE0).alphabet(), Alphabet::Ucs2);
        assert!(DataCodingScheme::from_byte(0xE0).is_message_waiting());
        assert!(!DataCodingScheme::from_byte(0xE0).has_message_class());
    }

    #[test]
    fn raw_byte_retained() {
        for value in 0..=255u8 {
            assert_eq!(DataCodingScheme::from(value).to_byte(), value);
        }
    }
}
