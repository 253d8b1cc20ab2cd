// ABOUTME: TP-UDH information elements with concatenation and application port accessors
// ABOUTME: Unknown elements are carried opaquely so a parsed header re-encodes byte for byte

use crate::codec::{CodecError, Encodable};
use bytes::{BufMut, Bytes, BytesMut};

/// Concatenated short message, 8-bit reference
pub const IEI_CONCATENATION_8BIT: u8 = 0x00;
/// Application port addressing, 8-bit ports
pub const IEI_PORTS_8BIT: u8 = 0x04;
/// Application port addressing, 16-bit ports
pub const IEI_PORTS_16BIT: u8 = 0x05;
/// Concatenated short message, 16-bit reference
pub const IEI_CONCATENATION_16BIT: u8 = 0x08;

/// A single information element: identifier, then opaque data
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InformationElement {
    pub id: u8,
    pub data: Bytes,
}

impl InformationElement {
    pub fn new(id: u8, data: impl Into<Bytes>) -> Self {
        Self {
            id,
            data: data.into(),
        }
    }
}

/// Multi-part linkage carried by a concatenation element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Concatenation {
    pub reference: u16,
    pub total: u8,
    pub part: u8,
}

impl Concatenation {
    fn is_valid(&self) -> bool {
        self.total != 0 && self.part != 0 && self.part <= self.total
    }
}

/// Destination and source application ports
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ApplicationPorts {
    pub destination: u16,
    pub source: u16,
}

/// TP-User-Data-Header.
///
/// Encoded as a length octet (excluding itself) followed by the
/// information elements in their original order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct UserDataHeader {
    elements: Vec<InformationElement>,
}

impl UserDataHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a header holding only a concatenation element; references
    /// above 255 use the 16-bit form
    pub fn concatenated(reference: u16, total: u8, part: u8) -> Self {
        let element = match u8::try_from(reference) {
            Ok(reference) => {
                InformationElement::new(IEI_CONCATENATION_8BIT, vec![reference, total, part])
            }
            Err(_) => {
                let [high, low] = reference.to_be_bytes();
                InformationElement::new(IEI_CONCATENATION_16BIT, vec![high, low, total, part])
            }
        };
        Self {
            elements: vec![element],
        }
    }

    pub fn with_element(mut self, element: InformationElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn elements(&self) -> &[InformationElement] {
        &self.elements
    }

    pub fn element(&self, id: u8) -> Option<&InformationElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Octets the header occupies, length octet included
    pub fn encoded_len(&self) -> usize {
        1 + self
            .elements
            .iter()
            .map(|e| 2 + e.data.len())
            .sum::<usize>()
    }

    /// Parses a header from the start of `bytes`, returning it with the
    /// number of octets consumed (length octet included).
    ///
    /// Offsets in errors are relative to `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize), CodecError> {
        let Some(&length) = bytes.first() else {
            return Err(CodecError::MalformedHeader {
                offset: 0,
                reason: "missing header length",
            });
        };
        let end = 1 + usize::from(length);
        if end > bytes.len() {
            return Err(CodecError::MalformedHeader {
                offset: 0,
                reason: "header length exceeds user data",
            });
        }

        let mut elements = Vec::new();
        let mut pos = 1;
        while pos < end {
            if pos + 2 > end {
                return Err(CodecError::MalformedHeader {
                    offset: pos,
                    reason: "element header overruns header",
                });
            }
            let id = bytes[pos];
            let data_len = usize::from(bytes[pos + 1]);
            let data_start = pos + 2;
            if data_start + data_len > end {
                return Err(CodecError::MalformedHeader {
                    offset: pos,
                    reason: "element data overruns header",
                });
            }

            let expected = match id {
                IEI_CONCATENATION_8BIT => Some(3),
                IEI_CONCATENATION_16BIT => Some(4),
                _ => None,
            };
            if expected.is_some_and(|len| len != data_len) {
                return Err(CodecError::MalformedHeader {
                    offset: pos,
                    reason: "concatenation element has wrong length",
                });
            }

            let element = InformationElement::new(
                id,
                Bytes::copy_from_slice(&bytes[data_start..data_start + data_len]),
            );
            if let Some(concat) = concatenation_of(&element) {
                if !concat.is_valid() {
                    tracing::warn!(
                        "ignoring concatenation element with part {} of {}",
                        concat.part,
                        concat.total
                    );
                }
            }
            elements.push(element);
            pos = data_start + data_len;
        }

        Ok((Self { elements }, end))
    }

    /// Linkage for reassembly; elements with total 0, part 0 or a part
    /// beyond the total are ignored
    pub fn concatenation(&self) -> Option<Concatenation> {
        self.elements
            .iter()
            .filter_map(concatenation_of)
            .find(Concatenation::is_valid)
    }

    pub fn ports(&self) -> Option<ApplicationPorts> {
        self.elements.iter().find_map(|e| match (e.id, &e.data[..]) {
            (IEI_PORTS_8BIT, &[destination, source]) => Some(ApplicationPorts {
                destination: u16::from(destination),
                source: u16::from(source),
            }),
            (IEI_PORTS_16BIT, &[d0, d1, s0, s1]) => Some(ApplicationPorts {
                destination: u16::from_be_bytes([d0, d1]),
                source: u16::from_be_bytes([s0, s1]),
            }),
            _ => None,
        })
    }
}

fn concatenation_of(element: &InformationElement) -> Option<Concatenation> {
    match (element.id, &element.data[..]) {
        (IEI_CONCATENATION_8BIT, &[reference, total, part]) => Some(Concatenation {
            reference: u16::from(reference),
            total,
            part,
        }),
        (IEI_CONCATENATION_16BIT, &[high, low, total, part]) => Some(Concatenation {
            reference: u16::from_be_bytes([high, low]),
            total,
            part,
        }),
        _ => None,
    }
}

impl Encodable for UserDataHeader {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let length = self.encoded_len() - 1;
        let length = u8::try_from(length).map_err(|_| CodecError::UserDataTooLong {
            length,
            max: crate::codec::MAX_USER_DATA_OCTETS,
        })?;
        buf.put_u8(length);
        for element in &self.elements {
            buf.put_u8(element.id);
            buf.put_u8(element.data.len() as u8);
            buf.put_slice(&element.data);
        }
        Ok(())
    }

    fn encoded_size(&self) -> usize {
        self.encoded_len()
    }
}
