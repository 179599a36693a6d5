//! Schema-less view of an encoded buffer, for debugging and the CLI
//! `inspect` command.

use std::fmt;

use langnet_core::WireError;

use crate::decode::DEFAULT_MAX_DEPTH;
use crate::reader::WireReader;
use crate::wire_type::WireType;

/// Bytes of a length-delimited payload shown before eliding.
const PREVIEW_BYTES: usize = 16;

/// One top-level field as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub number: u32,
    pub wire_type: WireType,
    /// Offset of the tag within the inspected buffer.
    pub offset: usize,
    pub value: RawValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Varint(u64),
    Fixed32(u32),
    Fixed64(u64),
    LengthDelimited(Vec<u8>),
    Group(Vec<RawField>),
}

/// Split `bytes` into tagged fields without a schema.
pub fn inspect(bytes: &[u8]) -> Result<Vec<RawField>, WireError> {
    let mut reader = WireReader::new(bytes);
    read_fields(&mut reader, None, DEFAULT_MAX_DEPTH)
}

fn read_fields(
    reader: &mut WireReader<'_>,
    group: Option<u32>,
    depth: usize,
) -> Result<Vec<RawField>, WireError> {
    let mut fields = Vec::new();
    loop {
        if reader.is_empty() {
            return match group {
                // An open group ran off the end of the buffer.
                Some(_) => Err(WireError::Truncated {
                    needed: 1,
                    available: 0,
                }),
                None => Ok(fields),
            };
        }
        let offset = reader.position();
        let (number, wire_type) = reader.read_tag()?;
        let value = match wire_type {
            WireType::Varint => RawValue::Varint(reader.read_varint()?),
            WireType::Fixed64 => RawValue::Fixed64(reader.read_fixed64()?),
            WireType::Len => RawValue::LengthDelimited(reader.read_length_delimited()?.to_vec()),
            WireType::Fixed32 => RawValue::Fixed32(reader.read_fixed32()?),
            WireType::StartGroup => {
                if depth == 0 {
                    return Err(WireError::RecursionLimit(DEFAULT_MAX_DEPTH));
                }
                RawValue::Group(read_fields(reader, Some(number), depth - 1)?)
            }
            WireType::EndGroup if group == Some(number) => return Ok(fields),
            WireType::EndGroup => return Err(WireError::InvalidWireType(wire_type.id())),
        };
        fields.push(RawField {
            number,
            wire_type,
            offset,
            value,
        });
    }
}

impl fmt::Display for RawField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{:<5} #{:<4} {:<11} {}",
            self.offset, self.number, self.wire_type, self.value
        )
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Varint(v) => write!(f, "{v}"),
            RawValue::Fixed32(v) => write!(f, "{v:#010x}"),
            RawValue::Fixed64(v) => write!(f, "{v:#018x}"),
            RawValue::LengthDelimited(bytes) => {
                write!(f, "[{} bytes]", bytes.len())?;
                for b in bytes.iter().take(PREVIEW_BYTES) {
                    write!(f, " {b:02x}")?;
                }
                if bytes.len() > PREVIEW_BYTES {
                    f.write_str(" ..")?;
                }
                match std::str::from_utf8(bytes) {
                    Ok(text) if !text.is_empty() && !text.chars().any(char::is_control) => {
                        write!(f, " {text:?}")
                    }
                    _ => Ok(()),
                }
            }
            RawValue::Group(fields) => write!(f, "group of {} fields", fields.len()),
        }
    }
}
