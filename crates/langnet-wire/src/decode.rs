//! # Wire Decoder
//!
//! Parses bytes into a [`MessageValue`] of a named message type.
//!
//! ## Leniency
//!
//! The decoder accepts everything a conforming writer may emit, not only
//! what [`crate::encode`] emits:
//!
//! - fields in any order, and repeated occurrences of singular fields (the
//!   last occurrence wins, nested messages included);
//! - packed and unpacked forms for any repeated numeric field;
//! - map entries missing their key or value (the zero value is used);
//! - unknown field numbers of any wire type, including groups.
//!
//! ## Security Invariant
//!
//! Nesting depth is bounded by [`DecodeOptions::max_depth`], and every
//! length prefix is validated by [`WireReader`] before use. Malformed input
//! yields an error, never a panic.

use langnet_core::{MapKey, MessageValue, Value, WireError};
use langnet_schema::{
    scalar_zero, Cardinality, FieldLayout, MessageLayout, Registry, ResolvedType, ScalarKind,
};

use crate::reader::WireReader;
use crate::varint::{zigzag_decode32, zigzag_decode64};
use crate::wire_type::WireType;

/// Nesting depth accepted when no options are given.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Knobs for [`decode_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Deepest message nesting accepted. The top-level message is depth 0.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Decode `bytes` as an instance of `message`.
pub fn decode(registry: &Registry, message: &str, bytes: &[u8]) -> Result<MessageValue, WireError> {
    decode_with(registry, message, bytes, &DecodeOptions::default())
}

/// Decode `bytes` as an instance of `message` with explicit limits.
///
/// # Errors
///
/// - [`WireError::UnknownMessage`] if `message` is not in the registry.
/// - [`WireError::Truncated`], [`WireError::VarintOverflow`],
///   [`WireError::InvalidTag`] or [`WireError::InvalidWireType`] for
///   malformed framing.
/// - [`WireError::WireTypeMismatch`] when a known field arrives with a wire
///   type its declared type cannot produce.
/// - [`WireError::InvalidTextEncoding`] for non-UTF-8 `string` payloads.
/// - [`WireError::RecursionLimit`] past `options.max_depth`.
pub fn decode_with(
    registry: &Registry,
    message: &str,
    bytes: &[u8],
    options: &DecodeOptions,
) -> Result<MessageValue, WireError> {
    let layout = registry
        .message_by_name(message)
        .ok_or_else(|| WireError::UnknownMessage(message.to_string()))?;
    let decoder = Decoder {
        registry,
        max_depth: options.max_depth,
    };
    let value = decoder.message(layout, &mut WireReader::new(bytes), 0)?;
    tracing::debug!(
        message_type = message,
        bytes = bytes.len(),
        fields = value.len(),
        "decoded message"
    );
    Ok(value)
}

struct Decoder<'r> {
    registry: &'r Registry,
    max_depth: usize,
}

impl Decoder<'_> {
    fn message(
        &self,
        layout: &MessageLayout,
        reader: &mut WireReader<'_>,
        depth: usize,
    ) -> Result<MessageValue, WireError> {
        if depth > self.max_depth {
            return Err(WireError::RecursionLimit(self.max_depth));
        }

        let mut out = MessageValue::new(layout.name());
        while !reader.is_empty() {
            let (number, wire_type) = reader.read_tag()?;
            match layout.field_by_number(number) {
                Some(field) => self.field(field, wire_type, reader, &mut out, depth)?,
                None => {
                    tracing::trace!(
                        message_type = layout.name(),
                        number,
                        wire_type = %wire_type,
                        "skipping unknown field"
                    );
                    reader.skip_field(number, wire_type, depth, self.max_depth)?;
                }
            }
        }

        for field in layout.fields() {
            if !out.contains(field.name()) {
                if let Some(zero) = self.registry.zero_value(field) {
                    out.set(field.name(), zero);
                }
            }
        }
        Ok(out)
    }

    fn field(
        &self,
        field: &FieldLayout,
        wire_type: WireType,
        reader: &mut WireReader<'_>,
        out: &mut MessageValue,
        depth: usize,
    ) -> Result<(), WireError> {
        let element_wire_type = WireType::for_type(field.ty());
        match field.cardinality() {
            Cardinality::Singular => {
                expect_wire_type(field, element_wire_type, wire_type)?;
                let value = self.element(field, field.ty(), reader, depth)?;
                out.set(field.name(), value);
            }
            Cardinality::Repeated => {
                let mut items = match out.remove(field.name()) {
                    Some(Value::List(items)) => items,
                    _ => Vec::new(),
                };
                if wire_type == WireType::Len && field.ty().is_packable() {
                    let mut run = WireReader::new(reader.read_length_delimited()?);
                    while !run.is_empty() {
                        items.push(self.element(field, field.ty(), &mut run, depth)?);
                    }
                } else {
                    expect_wire_type(field, element_wire_type, wire_type)?;
                    items.push(self.element(field, field.ty(), reader, depth)?);
                }
                out.set(field.name(), Value::List(items));
            }
            Cardinality::Map { key } => {
                expect_wire_type(field, WireType::Len, wire_type)?;
                let mut entries = match out.remove(field.name()) {
                    Some(Value::Map(entries)) => entries,
                    _ => Default::default(),
                };
                let entry = reader.read_length_delimited()?;
                let (k, v) = self.map_entry(field, key, entry, depth)?;
                entries.insert(k, v);
                out.set(field.name(), Value::Map(entries));
            }
        }
        Ok(())
    }

    fn element(
        &self,
        field: &FieldLayout,
        ty: ResolvedType,
        reader: &mut WireReader<'_>,
        depth: usize,
    ) -> Result<Value, WireError> {
        match ty {
            ResolvedType::Scalar(kind) => read_scalar(field, kind, reader),
            // Enum numbers travel as int32 varints; unknown numbers are kept.
            ResolvedType::Enum(_) => Ok(Value::Enum(reader.read_varint()? as i32)),
            ResolvedType::Message(id) => {
                let payload = reader.read_length_delimited()?;
                let nested = self.message(
                    self.registry.message(id),
                    &mut WireReader::new(payload),
                    depth + 1,
                )?;
                Ok(Value::Message(nested))
            }
        }
    }

    fn map_entry(
        &self,
        field: &FieldLayout,
        key_kind: ScalarKind,
        entry: &[u8],
        depth: usize,
    ) -> Result<(MapKey, Value), WireError> {
        let key_wire_type = WireType::for_scalar(key_kind);
        let mut reader = WireReader::new(entry);
        let mut key = None;
        let mut value = None;
        while !reader.is_empty() {
            let (number, wire_type) = reader.read_tag()?;
            match number {
                1 => {
                    expect_wire_type(field, key_wire_type, wire_type)?;
                    key = Some(read_scalar(field, key_kind, &mut reader)?);
                }
                2 => {
                    expect_wire_type(field, WireType::for_type(field.ty()), wire_type)?;
                    value = Some(self.element(field, field.ty(), &mut reader, depth)?);
                }
                _ => reader.skip_field(number, wire_type, depth, self.max_depth)?,
            }
        }

        let key = key.unwrap_or_else(|| scalar_zero(key_kind));
        let kind = key.kind_name();
        // Unreachable for registry-validated schemas.
        let key = MapKey::from_value(key).ok_or_else(|| WireError::InvalidMapKey {
            field: field.qualified_name().to_string(),
            kind,
        })?;
        let value = match value {
            Some(value) => value,
            None => self.zero_element(field.ty(), depth)?,
        };
        Ok((key, value))
    }

    /// What a map value decodes to when the entry omits it.
    fn zero_element(&self, ty: ResolvedType, depth: usize) -> Result<Value, WireError> {
        Ok(match ty {
            ResolvedType::Scalar(kind) => scalar_zero(kind),
            ResolvedType::Enum(_) => Value::Enum(0),
            ResolvedType::Message(id) => Value::Message(self.message(
                self.registry.message(id),
                &mut WireReader::new(&[]),
                depth + 1,
            )?),
        })
    }
}

fn expect_wire_type(
    field: &FieldLayout,
    expected: WireType,
    actual: WireType,
) -> Result<(), WireError> {
    if expected == actual {
        return Ok(());
    }
    Err(WireError::WireTypeMismatch {
        field: field.qualified_name().to_string(),
        number: field.number(),
        expected: expected.id(),
        actual: actual.id(),
    })
}

fn read_scalar(
    field: &FieldLayout,
    kind: ScalarKind,
    r: &mut WireReader<'_>,
) -> Result<Value, WireError> {
    Ok(match kind {
        ScalarKind::Int32 => Value::I32(r.read_varint()? as i32),
        ScalarKind::Int64 => Value::I64(r.read_varint()? as i64),
        ScalarKind::Uint32 => Value::U32(r.read_varint()? as u32),
        ScalarKind::Uint64 => Value::U64(r.read_varint()?),
        ScalarKind::Sint32 => Value::I32(zigzag_decode32(r.read_varint()? as u32)),
        ScalarKind::Sint64 => Value::I64(zigzag_decode64(r.read_varint()?)),
        ScalarKind::Bool => Value::Bool(r.read_varint()? != 0),
        ScalarKind::Fixed32 => Value::U32(r.read_fixed32()?),
        ScalarKind::Sfixed32 => Value::I32(r.read_fixed32()? as i32),
        ScalarKind::Float => Value::F32(f32::from_bits(r.read_fixed32()?)),
        ScalarKind::Fixed64 => Value::U64(r.read_fixed64()?),
        ScalarKind::Sfixed64 => Value::I64(r.read_fixed64()? as i64),
        ScalarKind::Double => Value::F64(f64::from_bits(r.read_fixed64()?)),
        ScalarKind::String => {
            let bytes = r.read_length_delimited()?;
            let text = std::str::from_utf8(bytes).map_err(|_| WireError::InvalidTextEncoding {
                field: field.qualified_name().to_string(),
            })?;
            Value::String(text.to_string())
        }
        ScalarKind::Bytes => Value::Bytes(r.read_length_delimited()?.to_vec()),
    })
}
