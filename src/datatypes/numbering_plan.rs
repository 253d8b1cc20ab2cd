use num_enum::{FromPrimitive, IntoPrimitive};

/// Numbering-plan identification, bits 3..0 of the type-of-address octet
#[derive(FromPrimitive, IntoPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NumericPlanIndicator {
    Unknown = 0b0000,
    Isdn = 0b0001,
    Data = 0b0011,
    Telex = 0b0100,
    National = 0b1000,
    Private = 0b1001,
    Ermes = 0b1010,
    /// Values the numbering plan table leaves reserved, kept so they re-encode
    #[num_enum(catch_all)]
    Reserved(u8),
}

impl Default for NumericPlanIndicator {
    fn default() -> Self {
        NumericPlanIndicator::Isdn
    }
}
