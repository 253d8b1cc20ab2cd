mod address;
mod data_coding;
mod deliver;
pub mod first_octet;
mod numbering_plan;
mod status_report;
mod submit;
mod timestamp;
mod type_of_number;
mod user_data;
pub mod user_data_header;
pub mod validity_period;

pub use address::{Address, MAX_ADDRESS_DIGITS, MAX_ALPHANUMERIC_LENGTH};
pub use data_coding::{DataCodingScheme, MessageClass};
pub use deliver::Deliver;
pub use first_octet::{FirstOctet, MessageTypeIndicator};
pub use numbering_plan::NumericPlanIndicator;
pub use status_report::{DeliveryStatus, StatusReport};
pub use submit::Submit;
pub use timestamp::{TIMESTAMP_OCTETS, Timestamp};
pub use type_of_number::TypeOfNumber;
pub use user_data::UserData;
pub use user_data_header::{ApplicationPorts, Concatenation, InformationElement, UserDataHeader};
pub use validity_period::{ValidityPeriod, ValidityPeriodFormat};
