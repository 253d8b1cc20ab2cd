pub mod alphabet;
pub mod codec;
pub mod datatypes;
pub mod message;
pub mod reassembly;
pub mod rpdu;
pub mod segmentation;


// Re-export codec types for direct access
pub use codec::{CodecError, Decodable, Encodable};

pub use alphabet::Alphabet;
pub use datatypes::{
    Address, DataCodingScheme, Deliver, NumericPlanIndicator, StatusReport, Submit, Timestamp,
    TypeOfNumber, UserData, UserDataHeader, ValidityPeriod,
};
pub use message::{DecodeOptions, Direction, Message, Tpdu};
pub use reassembly::{
    CompleteMessage, IncompleteMessageDiscarded, Reassembler, ReassemblyConfig,
};
pub use rpdu::{RpData, RpMessageType, decode_rp};

use bytes::Bytes;

/// A specialized `Result` type for TPDU operations.
///
/// # Examples
///
/// ## Encoding and decoding a Deliver
///
/// ```rust
/// use sms_tpdu::{Address, Timestamp};
///
/// fn main() -> sms_tpdu::Result<()> {
///     let origin = Address::parse("+46708251358")?;
///     let timestamp = Timestamp::new(2009, 8, 7, 6, 5, 4)?;
///
///     let bytes = sms_tpdu::encode_deliver(&origin, "hellohello", timestamp)?;
///     let message = sms_tpdu::decode(&bytes)?;
///
///     assert_eq!(message.text(), "hellohello");
///     assert_eq!(message.address(), Some(&origin));
///     Ok(())
/// }
/// ```
///
/// ## Reassembling a multi-part message
///
/// ```rust
/// use sms_tpdu::{Address, Reassembler, Timestamp};
/// use sms_tpdu::segmentation::segment_deliver;
/// use sms_tpdu::{Encodable, Tpdu};
///
/// fn main() -> sms_tpdu::Result<()> {
///     let origin = Address::parse("+46708251358")?;
///     let timestamp = Timestamp::new(2009, 8, 7, 6, 5, 4)?;
///     let text = "Long message. ".repeat(20);
///
///     let reassembler = Reassembler::default();
///     let mut complete = None;
///     for part in segment_deliver(&origin, &text, timestamp, 42)? {
///         let bytes = Tpdu::Deliver(part).to_bytes()?;
///         complete = reassembler.submit(sms_tpdu::decode(&bytes)?);
///     }
///
///     assert_eq!(complete.map(|m| m.text), Some(text));
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, CodecError>;

/// Encodes a Deliver carrying `body` from `origin`
pub fn encode_deliver(origin: &Address, body: &str, timestamp: Timestamp) -> Result<Bytes> {
    Deliver::new(origin.clone(), body, timestamp).to_bytes()
}

/// Encodes a Submit carrying `body` to `destination`
pub fn encode_submit(
    destination: &Address,
    body: &str,
    message_reference: u8,
    validity_period: Option<ValidityPeriod>,
) -> Result<Bytes> {
    let mut submit =
        Submit::new(destination.clone(), body).with_message_reference(message_reference);
    submit.validity_period = validity_period;
    submit.to_bytes()
}

/// Encodes a Status-Report without optional parameters
pub fn encode_status_report(
    message_reference: u8,
    recipient: &Address,
    service_centre_timestamp: Timestamp,
    discharge_time: Timestamp,
    status: u8,
) -> Result<Bytes> {
    StatusReport::new(
        message_reference,
        recipient.clone(),
        service_centre_timestamp,
        discharge_time,
        status,
    )
    .to_bytes()
}

/// Decodes a TPDU, rejecting the reserved message type
pub fn decode(bytes: &[u8]) -> Result<Message> {
    Message::decode(bytes)
}

pub fn decode_with(bytes: &[u8], options: DecodeOptions) -> Result<Message> {
    Message::decode_with(bytes, options)
}
