//! # Wire Encoder
//!
//! Walks a [`MessageValue`] against its [`MessageLayout`] and appends the
//! binary form to a [`WireWriter`].
//!
//! ## Output Order
//!
//! Fields are written in ascending field-number order regardless of the
//! order they were set in, so two implementations holding the same value
//! produce the same bytes. Map entries follow key order.
//!
//! ## Type Checking
//!
//! The encoder is the last point where a malformed value graph can be
//! caught. A value of the wrong kind, a field the message does not declare,
//! or a nested message of the wrong type fails with [`EncodeError`] and no
//! bytes are returned.

use std::mem;

use langnet_core::{EncodeError, MessageValue, Value};
use langnet_schema::{
    scalar_zero, Cardinality, FieldLayout, MessageLayout, Registry, ResolvedType, ScalarKind,
};

use crate::varint::{zigzag_encode32, zigzag_encode64};
use crate::wire_type::WireType;
use crate::writer::WireWriter;

/// Encode `value` to a fresh buffer.
///
/// # Errors
///
/// Returns [`EncodeError`] when the value names an unknown message type or
/// does not match its layout.
pub fn encode(registry: &Registry, value: &MessageValue) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    encode_into(registry, value, &mut buf)?;
    Ok(buf)
}

/// Encode `value`, appending to `buf`. On error `buf` keeps its original
/// contents.
pub fn encode_into(
    registry: &Registry,
    value: &MessageValue,
    buf: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    let layout = registry
        .message_by_name(value.message())
        .ok_or_else(|| EncodeError::UnknownMessage(value.message().to_string()))?;

    let start = buf.len();
    let mut writer = WireWriter::from_vec(mem::take(buf));
    let result = Encoder { registry }.message(layout, value, &mut writer);
    *buf = writer.into_inner();
    if let Err(err) = result {
        buf.truncate(start);
        return Err(err);
    }

    tracing::debug!(
        message_type = %value.message(),
        bytes = buf.len() - start,
        "encoded message"
    );
    Ok(())
}

struct Encoder<'r> {
    registry: &'r Registry,
}

impl Encoder<'_> {
    fn message(
        &self,
        layout: &MessageLayout,
        value: &MessageValue,
        w: &mut WireWriter,
    ) -> Result<(), EncodeError> {
        let mut present: Vec<(&FieldLayout, bool, &Value)> = Vec::with_capacity(value.len());
        for (name, v) in value.fields() {
            let field =
                layout
                    .field_by_name(name)
                    .ok_or_else(|| EncodeError::UnknownField {
                        message: layout.name().to_string(),
                        field: name.to_string(),
                    })?;
            present.push((field, name != field.name(), v));
        }
        // A field set under both its declared and JSON name keeps the
        // declared one.
        present.sort_by_key(|(field, via_alias, _)| (field.number(), *via_alias));
        present.dedup_by_key(|(field, _, _)| field.number());

        for (field, _, v) in present {
            self.field(field, v, w)?;
        }
        Ok(())
    }

    fn field(&self, field: &FieldLayout, value: &Value, w: &mut WireWriter) -> Result<(), EncodeError> {
        let element_wire_type = WireType::for_type(field.ty());
        match field.cardinality() {
            Cardinality::Singular => {
                if !field.has_presence() && value.is_default() && self.accepts(field, value) {
                    return Ok(());
                }
                w.write_tag(field.number(), element_wire_type);
                self.element(field, value, w)
            }
            Cardinality::Repeated => {
                let Value::List(items) = value else {
                    return Err(self.mismatch(field, value));
                };
                if items.is_empty() {
                    return Ok(());
                }
                if field.is_packed() {
                    w.write_tag(field.number(), WireType::Len);
                    w.write_nested(|w| {
                        items.iter().try_for_each(|item| self.element(field, item, w))
                    })
                } else {
                    items.iter().try_for_each(|item| {
                        w.write_tag(field.number(), element_wire_type);
                        self.element(field, item, w)
                    })
                }
            }
            Cardinality::Map { key } => {
                let Value::Map(entries) = value else {
                    return Err(self.mismatch(field, value));
                };
                for (k, v) in entries {
                    w.write_tag(field.number(), WireType::Len);
                    w.write_nested(|w| {
                        let key_value = k.to_value();
                        w.write_tag(1, WireType::for_scalar(key));
                        write_scalar(field, key, &key_value, w).map_err(|_| {
                            EncodeError::MalformedMapEntry {
                                field: field.qualified_name().to_string(),
                                reason: format!(
                                    "{} key does not fit declared key type {key}",
                                    k.kind_name()
                                ),
                            }
                        })?;
                        w.write_tag(2, element_wire_type);
                        self.element(field, v, w)
                    })?;
                }
                Ok(())
            }
        }
    }

    /// Payload of one element, without its tag.
    fn element(&self, field: &FieldLayout, value: &Value, w: &mut WireWriter) -> Result<(), EncodeError> {
        match field.ty() {
            ResolvedType::Scalar(kind) => write_scalar(field, kind, value, w),
            ResolvedType::Enum(_) => match value {
                Value::Enum(n) => {
                    w.write_varint(i64::from(*n) as u64);
                    Ok(())
                }
                other => Err(self.mismatch(field, other)),
            },
            ResolvedType::Message(id) => {
                let layout = self.registry.message(id);
                let Value::Message(nested) = value else {
                    return Err(self.mismatch(field, value));
                };
                if nested.message() != layout.name() {
                    return Err(EncodeError::MessageMismatch {
                        field: field.qualified_name().to_string(),
                        expected: layout.name().to_string(),
                        found: nested.message().to_string(),
                    });
                }
                w.write_nested(|w| self.message(layout, nested, w))
            }
        }
    }

    /// Whether `value` is the right kind for a single element of `field`.
    fn accepts(&self, field: &FieldLayout, value: &Value) -> bool {
        match field.ty() {
            ResolvedType::Scalar(kind) => {
                mem::discriminant(&scalar_zero(kind)) == mem::discriminant(value)
            }
            ResolvedType::Enum(_) => matches!(value, Value::Enum(_)),
            ResolvedType::Message(_) => matches!(value, Value::Message(_)),
        }
    }

    fn mismatch(&self, field: &FieldLayout, found: &Value) -> EncodeError {
        let element = match field.ty() {
            ResolvedType::Scalar(kind) => kind.to_string(),
            ResolvedType::Enum(id) => self.registry.enumeration(id).name().to_string(),
            ResolvedType::Message(id) => self.registry.message(id).name().to_string(),
        };
        let expected = match field.cardinality() {
            Cardinality::Singular => element,
            Cardinality::Repeated => format!("repeated {element}"),
            Cardinality::Map { key } => format!("map<{key}, {element}>"),
        };
        EncodeError::TypeMismatch {
            field: field.qualified_name().to_string(),
            expected,
            found: found.kind_name(),
        }
    }
}

fn write_scalar(
    field: &FieldLayout,
    kind: ScalarKind,
    value: &Value,
    w: &mut WireWriter,
) -> Result<(), EncodeError> {
    match (kind, value) {
        // Negative int32 values are sign-extended to 64 bits.
        (ScalarKind::Int32, Value::I32(n)) => w.write_varint(i64::from(*n) as u64),
        (ScalarKind::Int64, Value::I64(n)) => w.write_varint(*n as u64),
        (ScalarKind::Uint32, Value::U32(n)) => w.write_varint(u64::from(*n)),
        (ScalarKind::Uint64, Value::U64(n)) => w.write_varint(*n),
        (ScalarKind::Sint32, Value::I32(n)) => w.write_varint(u64::from(zigzag_encode32(*n))),
        (ScalarKind::Sint64, Value::I64(n)) => w.write_varint(zigzag_encode64(*n)),
        (ScalarKind::Bool, Value::Bool(b)) => w.write_varint(u64::from(*b)),
        (ScalarKind::Fixed32, Value::U32(n)) => w.write_fixed32(*n),
        (ScalarKind::Sfixed32, Value::I32(n)) => w.write_fixed32(*n as u32),
        (ScalarKind::Float, Value::F32(x)) => w.write_fixed32(x.to_bits()),
        (ScalarKind::Fixed64, Value::U64(n)) => w.write_fixed64(*n),
        (ScalarKind::Sfixed64, Value::I64(n)) => w.write_fixed64(*n as u64),
        (ScalarKind::Double, Value::F64(x)) => w.write_fixed64(x.to_bits()),
        (ScalarKind::String, Value::String(s)) => w.write_length_delimited(s.as_bytes()),
        (ScalarKind::Bytes, Value::Bytes(b)) => w.write_length_delimited(b),
        (kind, other) => {
            return Err(EncodeError::TypeMismatch {
                field: field.qualified_name().to_string(),
                expected: kind.to_string(),
                found: other.kind_name(),
            })
        }
    }
    Ok(())
}
