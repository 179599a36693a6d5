//! Wire types and tags.

use std::fmt;

use langnet_core::WireError;
use langnet_schema::{ResolvedType, ScalarKind};

/// How a field's payload is framed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    Len = 2,
    /// Legacy group framing. Only ever skipped.
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl WireType {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Varint => "varint",
            Self::Fixed64 => "fixed64",
            Self::Len => "len",
            Self::StartGroup => "start-group",
            Self::EndGroup => "end-group",
            Self::Fixed32 => "fixed32",
        }
    }

    /// The wire type a single element of `ty` is written with.
    pub fn for_type(ty: ResolvedType) -> Self {
        match ty {
            ResolvedType::Scalar(kind) => Self::for_scalar(kind),
            ResolvedType::Enum(_) => Self::Varint,
            ResolvedType::Message(_) => Self::Len,
        }
    }

    pub fn for_scalar(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Int32
            | ScalarKind::Int64
            | ScalarKind::Uint32
            | ScalarKind::Uint64
            | ScalarKind::Sint32
            | ScalarKind::Sint64
            | ScalarKind::Bool => Self::Varint,
            ScalarKind::Fixed64 | ScalarKind::Sfixed64 | ScalarKind::Double => Self::Fixed64,
            ScalarKind::Fixed32 | ScalarKind::Sfixed32 | ScalarKind::Float => Self::Fixed32,
            ScalarKind::String | ScalarKind::Bytes => Self::Len,
        }
    }
}

impl TryFrom<u8> for WireType {
    type Error = WireError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::Len),
            3 => Ok(Self::StartGroup),
            4 => Ok(Self::EndGroup),
            5 => Ok(Self::Fixed32),
            other => Err(WireError::InvalidWireType(other)),
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Combine a field number and wire type into a tag.
pub fn make_tag(number: u32, wire_type: WireType) -> u64 {
    (u64::from(number) << 3) | u64::from(wire_type.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_pack_number_and_type() {
        assert_eq!(make_tag(1, WireType::Len), 0x0a);
        assert_eq!(make_tag(3, WireType::Len), 0x1a);
        assert_eq!(make_tag(2, WireType::Varint), 0x10);
        assert_eq!(make_tag(16, WireType::Fixed32), 0x85);
    }

    #[test]
    fn ids_round_trip() {
        for id in 0u8..=5 {
            assert_eq!(WireType::try_from(id).unwrap().id(), id);
        }
        assert_eq!(WireType::try_from(6), Err(WireError::InvalidWireType(6)));
        assert_eq!(WireType::try_from(7), Err(WireError::InvalidWireType(7)));
    }

    #[test]
    fn scalar_framing() {
        assert_eq!(WireType::for_scalar(ScalarKind::Sint64), WireType::Varint);
        assert_eq!(WireType::for_scalar(ScalarKind::Double), WireType::Fixed64);
        assert_eq!(WireType::for_scalar(ScalarKind::Float), WireType::Fixed32);
        assert_eq!(WireType::for_scalar(ScalarKind::Bytes), WireType::Len);
    }
}
