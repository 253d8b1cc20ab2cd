use num_enum::{FromPrimitive, IntoPrimitive};

/// Type-of-number, bits 6..4 of the type-of-address octet
#[derive(FromPrimitive, IntoPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeOfNumber {
    Unknown = 0b000,
    International = 0b001,
    National = 0b010,
    NetworkSpecific = 0b011,
    SubscriberNumber = 0b100,
    Alphanumeric = 0b101,
    Abbreviated = 0b110,
    #[num_enum(default)]
    Reserved = 0b111,
}

impl Default for TypeOfNumber {
    fn default() -> Self {
        TypeOfNumber::Unknown
    }
}
