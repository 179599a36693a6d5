//! Bounds-checked reader over an encoded buffer.
//!
//! Every read validates against the remaining length first, so a hostile
//! length prefix can never trigger an out-of-bounds slice or an oversized
//! allocation. Slices handed out borrow the input; decoders copy what they
//! keep.

use std::fmt;

use langnet_core::WireError;
use langnet_schema::MAX_FIELD_NUMBER;

use crate::varint::MAX_VARINT_LEN;
use crate::wire_type::WireType;

/// Cursor over a byte slice.
pub struct WireReader<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < len {
            return Err(WireError::Truncated {
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.buffer[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(slice)
    }

    pub fn read_varint(&mut self) -> Result<u64, WireError> {
        let mut value: u64 = 0;
        for i in 0..MAX_VARINT_LEN {
            let Some(&byte) = self.buffer.get(self.cursor) else {
                return Err(WireError::Truncated {
                    needed: 1,
                    available: 0,
                });
            };
            self.cursor += 1;
            // The tenth byte may only contribute the single top bit.
            if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
                return Err(WireError::VarintOverflow);
            }
            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(WireError::VarintOverflow)
    }

    pub fn read_fixed32(&mut self) -> Result<u32, WireError> {
        let bytes = self.read_bytes(4)?;
        let mut arr = [0u8; 4];
        arr.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(arr))
    }

    pub fn read_fixed64(&mut self) -> Result<u64, WireError> {
        let bytes = self.read_bytes(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(arr))
    }

    /// Read a varint length prefix and the payload it covers.
    pub fn read_length_delimited(&mut self) -> Result<&'a [u8], WireError> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| WireError::Truncated {
            needed: usize::MAX,
            available: self.remaining(),
        })?;
        self.read_bytes(len)
    }

    /// Read a tag, returning its field number and wire type.
    pub fn read_tag(&mut self) -> Result<(u32, WireType), WireError> {
        let tag = self.read_varint()?;
        let number = tag >> 3;
        if number == 0 || number > u64::from(MAX_FIELD_NUMBER) {
            return Err(WireError::InvalidTag(tag));
        }
        let wire_type = WireType::try_from((tag & 0x07) as u8)?;
        Ok((number as u32, wire_type))
    }

    /// Skip the payload of a field whose tag was just read at nesting
    /// `depth`. Groups are skipped up to their matching end-group; nesting
    /// past `max_depth` fails with [`WireError::RecursionLimit`].
    pub fn skip_field(
        &mut self,
        number: u32,
        wire_type: WireType,
        depth: usize,
        max_depth: usize,
    ) -> Result<(), WireError> {
        match wire_type {
            WireType::Varint => self.read_varint().map(drop),
            WireType::Fixed64 => self.read_bytes(8).map(drop),
            WireType::Len => self.read_length_delimited().map(drop),
            WireType::Fixed32 => self.read_bytes(4).map(drop),
            WireType::StartGroup => self.skip_group(number, depth, max_depth),
            WireType::EndGroup => Err(WireError::InvalidWireType(WireType::EndGroup.id())),
        }
    }

    fn skip_group(&mut self, number: u32, depth: usize, max_depth: usize) -> Result<(), WireError> {
        if depth >= max_depth {
            return Err(WireError::RecursionLimit(max_depth));
        }
        loop {
            let (inner, wire_type) = self.read_tag()?;
            if wire_type == WireType::EndGroup {
                if inner == number {
                    return Ok(());
                }
                return Err(WireError::InvalidWireType(WireType::EndGroup.id()));
            }
            self.skip_field(inner, wire_type, depth + 1, max_depth)?;
        }
    }
}

impl fmt::Debug for WireReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireReader")
            .field("cursor", &self.cursor)
            .field("remaining", &self.remaining())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_varints_and_fixed_values() {
        let bytes = [0xac, 0x02, 0x01, 0x00, 0x00, 0x00, 0xff];
        let mut r = WireReader::new(&bytes);
        assert_eq!(r.read_varint().unwrap(), 300);
        assert_eq!(r.read_fixed32().unwrap(), 1);
        assert_eq!(r.position(), 6);
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn truncated_varint() {
        let mut r = WireReader::new(&[0x80, 0x80]);
        assert_eq!(
            r.read_varint(),
            Err(WireError::Truncated {
                needed: 1,
                available: 0
            })
        );
    }

    #[test]
    fn overlong_varint_overflows() {
        let bytes = [0xff; 11];
        assert_eq!(
            WireReader::new(&bytes).read_varint(),
            Err(WireError::VarintOverflow)
        );
        let mut tenth_too_big = [0xff; 10];
        tenth_too_big[9] = 0x02;
        assert_eq!(
            WireReader::new(&tenth_too_big).read_varint(),
            Err(WireError::VarintOverflow)
        );
    }

    #[test]
    fn hostile_length_prefix_is_rejected_before_slicing() {
        // Claims 2^32 bytes follow; only two do.
        let bytes = [0x80, 0x80, 0x80, 0x80, 0x10, 0xaa, 0xbb];
        let mut r = WireReader::new(&bytes);
        match r.read_length_delimited() {
            Err(WireError::Truncated { available, .. }) => assert_eq!(available, 2),
            other => panic!("expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn tag_validation() {
        assert_eq!(
            WireReader::new(&[0x08]).read_tag().unwrap(),
            (1, WireType::Varint)
        );
        assert_eq!(
            WireReader::new(&[0x02]).read_tag(),
            Err(WireError::InvalidTag(0x02))
        );
        assert_eq!(
            WireReader::new(&[0x0e]).read_tag(),
            Err(WireError::InvalidWireType(6))
        );
    }

    #[test]
    fn skips_groups_to_matching_end() {
        // start group 5, varint field 1 = 7, end group 5, then varint field 2.
        let bytes = [0x2b, 0x08, 0x07, 0x2c, 0x10, 0x01];
        let mut r = WireReader::new(&bytes);
        let (number, wire_type) = r.read_tag().unwrap();
        assert_eq!(wire_type, WireType::StartGroup);
        r.skip_field(number, wire_type, 0, 8).unwrap();
        assert_eq!(r.read_tag().unwrap(), (2, WireType::Varint));
    }

    #[test]
    fn mismatched_end_group_fails() {
        // start group 5, end group 6.
        let bytes = [0x2b, 0x34];
        let mut r = WireReader::new(&bytes);
        let (number, wire_type) = r.read_tag().unwrap();
        assert_eq!(
            r.skip_field(number, wire_type, 0, 8),
            Err(WireError::InvalidWireType(4))
        );
    }

    #[test]
    fn nested_groups_report_the_configured_limit() {
        // start group 1 three times over, never closed.
        let bytes = [0x0b, 0x0b, 0x0b];
        let mut r = WireReader::new(&bytes);
        let (number, wire_type) = r.read_tag().unwrap();
        assert_eq!(
            r.skip_field(number, wire_type, 0, 2),
            Err(WireError::RecursionLimit(2))
        );
    }
}
