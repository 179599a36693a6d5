//! Append-only output buffer.

use crate::varint::{encode_varint, varint_len};
use crate::wire_type::{make_tag, WireType};

/// Growable output buffer for one encode call.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue appending to an existing buffer.
    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self { buf }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_tag(&mut self, number: u32, wire_type: WireType) {
        encode_varint(make_tag(number, wire_type), &mut self.buf);
    }

    pub fn write_varint(&mut self, value: u64) {
        encode_varint(value, &mut self.buf);
    }

    pub fn write_fixed32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Varint length followed by `data`.
    pub fn write_length_delimited(&mut self, data: &[u8]) {
        self.write_varint(data.len() as u64);
        self.buf.extend_from_slice(data);
    }

    /// Write a length-delimited payload produced by `body` directly into
    /// this buffer. A one-byte length is reserved up front; longer bodies
    /// shift right once the final length is known.
    pub fn write_nested<E>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<(), E>,
    ) -> Result<(), E> {
        let start = self.buf.len();
        self.buf.push(0);
        body(self)?;
        let body_len = self.buf.len() - start - 1;
        let prefix_len = varint_len(body_len as u64);
        if prefix_len > 1 {
            let pad = std::iter::repeat(0u8).take(prefix_len - 1);
            self.buf.splice(start + 1..start + 1, pad);
        }
        let mut prefix = Vec::with_capacity(prefix_len);
        encode_varint(body_len as u64, &mut prefix);
        self.buf[start..start + prefix_len].copy_from_slice(&prefix);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[test]
    fn writes_tagged_length_delimited() {
        let mut w = WireWriter::new();
        assert!(w.is_empty());
        w.write_tag(1, WireType::Len);
        w.write_length_delimited(b"u1");
        assert!(!w.is_empty());
        assert_eq!(w.len(), 4);
        assert_eq!(w.into_inner(), vec![0x0a, 0x02, b'u', b'1']);
    }

    #[test]
    fn fixed_values_are_little_endian() {
        let mut w = WireWriter::new();
        w.write_fixed32(0x0102_0304);
        w.write_fixed64(1);
        assert_eq!(
            w.into_inner(),
            vec![0x04, 0x03, 0x02, 0x01, 1, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn nested_short_body_keeps_single_byte_prefix() {
        let mut w = WireWriter::new();
        w.write_nested(|inner| {
            inner.write_varint(150);
            Ok::<(), Infallible>(())
        })
        .unwrap();
        assert_eq!(w.into_inner(), vec![0x02, 0x96, 0x01]);
    }

    #[test]
    fn nested_long_body_grows_prefix() {
        let payload = vec![7u8; 300];
        let mut w = WireWriter::from_vec(vec![0xee]);
        w.write_nested(|inner| {
            inner.buf.extend_from_slice(&payload);
            Ok::<(), Infallible>(())
        })
        .unwrap();
        let out = w.into_inner();
        assert_eq!(&out[..3], &[0xee, 0xac, 0x02]);
        assert_eq!(&out[3..], payload.as_slice());
    }

    #[test]
    fn nested_error_propagates() {
        let mut w = WireWriter::new();
        let result = w.write_nested(|_| Err::<(), _>("boom"));
        assert_eq!(result, Err("boom"));
    }
}
