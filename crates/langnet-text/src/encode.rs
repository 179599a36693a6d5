//! Message value to JSON.

use std::mem;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use langnet_core::{EncodeError, MessageValue, Value};
use langnet_schema::{
    scalar_zero, Cardinality, FieldLayout, MessageLayout, Registry, ResolvedType, ScalarKind,
};
use serde_json::{Map, Value as JsonValue};

/// Output knobs for the text encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextOptions {
    /// Also write implicit-presence fields that hold their zero value.
    pub emit_defaults: bool,
    /// Indent the rendered string.
    pub pretty: bool,
}

impl TextOptions {
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::default()
        }
    }
}

/// Encode `value` as a JSON object.
pub fn encode_value(
    registry: &Registry,
    value: &MessageValue,
    options: &TextOptions,
) -> Result<JsonValue, EncodeError> {
    let layout = registry
        .message_by_name(value.message())
        .ok_or_else(|| EncodeError::UnknownMessage(value.message().to_string()))?;
    let encoder = Encoder {
        registry,
        emit_defaults: options.emit_defaults,
    };
    let object = encoder.message(layout, value)?;
    tracing::debug!(
        message_type = %value.message(),
        keys = object.len(),
        "encoded message as JSON"
    );
    Ok(JsonValue::Object(object))
}

/// Encode `value` and render it, compact or indented per `options.pretty`.
pub fn encode_string(
    registry: &Registry,
    value: &MessageValue,
    options: &TextOptions,
) -> Result<String, EncodeError> {
    let json = encode_value(registry, value, options)?;
    Ok(if options.pretty {
        format!("{json:#}")
    } else {
        json.to_string()
    })
}

struct Encoder<'r> {
    registry: &'r Registry,
    emit_defaults: bool,
}

impl Encoder<'_> {
    fn message(
        &self,
        layout: &MessageLayout,
        value: &MessageValue,
    ) -> Result<Map<String, JsonValue>, EncodeError> {
        let mut present: Vec<(&FieldLayout, bool, &Value)> = Vec::with_capacity(value.len());
        for (name, v) in value.fields() {
            let field = layout
                .field_by_name(name)
                .ok_or_else(|| EncodeError::UnknownField {
                    message: layout.name().to_string(),
                    field: name.to_string(),
                })?;
            present.push((field, name != field.name(), v));
        }
        present.sort_by_key(|(field, via_alias, _)| (field.number(), *via_alias));
        present.dedup_by_key(|(field, _, _)| field.number());

        let mut object = Map::new();
        let mut present = present.into_iter().peekable();
        for field in layout.fields() {
            let set = match present.peek() {
                Some((f, _, v)) if f.number() == field.number() => {
                    let v = *v;
                    present.next();
                    Some(v)
                }
                _ => None,
            };
            match set {
                Some(v) => {
                    let skip = !self.emit_defaults
                        && !field.has_presence()
                        && v.is_default()
                        && self.accepts(field, v);
                    if !skip {
                        object.insert(field.name().to_string(), self.field(field, v)?);
                    }
                }
                None if self.emit_defaults => {
                    if let Some(zero) = self.registry.zero_value(field) {
                        object.insert(field.name().to_string(), self.field(field, &zero)?);
                    }
                }
                None => {}
            }
        }
        Ok(object)
    }

    fn field(&self, field: &FieldLayout, value: &Value) -> Result<JsonValue, EncodeError> {
        match field.cardinality() {
            Cardinality::Singular => self.element(field, value),
            Cardinality::Repeated => {
                let Value::List(items) = value else {
                    return Err(self.mismatch(field, value));
                };
                items
                    .iter()
                    .map(|item| self.element(field, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(JsonValue::Array)
            }
            Cardinality::Map { key } => {
                let Value::Map(entries) = value else {
                    return Err(self.mismatch(field, value));
                };
                let mut object = Map::new();
                for (k, v) in entries {
                    if mem::discriminant(&k.to_value()) != mem::discriminant(&scalar_zero(key)) {
                        return Err(EncodeError::MalformedMapEntry {
                            field: field.qualified_name().to_string(),
                            reason: format!(
                                "{} key does not fit declared key type {key}",
                                k.kind_name()
                            ),
                        });
                    }
                    object.insert(k.to_string(), self.element(field, v)?);
                }
                Ok(JsonValue::Object(object))
            }
        }
    }

    fn element(&self, field: &FieldLayout, value: &Value) -> Result<JsonValue, EncodeError> {
        match field.ty() {
            ResolvedType::Scalar(kind) => scalar(field, kind, value),
            ResolvedType::Enum(id) => match value {
                Value::Enum(n) => Ok(match self.registry.enumeration(id).name_of(*n) {
                    Some(name) => JsonValue::String(name.to_string()),
                    None => JsonValue::from(*n),
                }),
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
                self.message(layout, nested).map(JsonValue::Object)
            }
        }
    }

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

fn scalar(field: &FieldLayout, kind: ScalarKind, value: &Value) -> Result<JsonValue, EncodeError> {
    Ok(match (kind, value) {
        (ScalarKind::Int32 | ScalarKind::Sint32 | ScalarKind::Sfixed32, Value::I32(n)) => {
            JsonValue::from(*n)
        }
        (ScalarKind::Uint32 | ScalarKind::Fixed32, Value::U32(n)) => JsonValue::from(*n),
        // 64-bit integers exceed the exact range of a JSON number.
        (ScalarKind::Int64 | ScalarKind::Sint64 | ScalarKind::Sfixed64, Value::I64(n)) => {
            JsonValue::String(n.to_string())
        }
        (ScalarKind::Uint64 | ScalarKind::Fixed64, Value::U64(n)) => {
            JsonValue::String(n.to_string())
        }
        (ScalarKind::Bool, Value::Bool(b)) => JsonValue::Bool(*b),
        (ScalarKind::Float, Value::F32(x)) => float(widen(*x)),
        (ScalarKind::Double, Value::F64(x)) => float(*x),
        (ScalarKind::String, Value::String(s)) => JsonValue::String(s.clone()),
        (ScalarKind::Bytes, Value::Bytes(b)) => JsonValue::String(BASE64_STANDARD.encode(b)),
        (kind, other) => {
            return Err(EncodeError::TypeMismatch {
                field: field.qualified_name().to_string(),
                expected: kind.to_string(),
                found: other.kind_name(),
            })
        }
    })
}

/// Widen through the shortest decimal form so `0.1f32` is written as
/// `0.1`, not `0.10000000149011612`.
fn widen(x: f32) -> f64 {
    if !x.is_finite() {
        return f64::from(x);
    }
    x.to_string().parse().unwrap_or_else(|_| f64::from(x))
}

fn float(x: f64) -> JsonValue {
    if x.is_nan() {
        JsonValue::String("NaN".into())
    } else if x.is_infinite() {
        let text = if x > 0.0 { "Infinity" } else { "-Infinity" };
        JsonValue::String(text.into())
    } else {
        JsonValue::from(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use langnet_core::MapKey;
    use langnet_schema::{EnumDef, FieldDef, MessageDef, SchemaDescription};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn registry() -> Registry {
        let desc = SchemaDescription::new("test")
            .message(
                MessageDef::new("Event")
                    .field(FieldDef::enumeration("type", 1, "EventType"))
                    .field(FieldDef::scalar("id", 2, ScalarKind::String))
                    .field(
                        FieldDef::scalar("data", 3, ScalarKind::String).map(ScalarKind::String),
                    )
                    .field(FieldDef::message("occurred_at", 4, "Timestamp"))
                    .field(FieldDef::scalar("payload", 5, ScalarKind::Bytes))
                    .field(FieldDef::scalar("score", 6, ScalarKind::Float))
                    .field(FieldDef::scalar("weight", 7, ScalarKind::Double))
                    .field(FieldDef::scalar("retries", 8, ScalarKind::Uint32))
                    .field(FieldDef::scalar("tags", 9, ScalarKind::Sint64).repeated())
                    .field(FieldDef::scalar("note", 10, ScalarKind::String).optional())
                    .field(
                        FieldDef::scalar("counts", 11, ScalarKind::Int32).map(ScalarKind::Int64),
                    ),
            )
            .message(
                MessageDef::new("Timestamp")
                    .field(FieldDef::scalar("seconds", 1, ScalarKind::Int64))
                    .field(FieldDef::scalar("nanos", 2, ScalarKind::Int32)),
            )
            .enumeration(
                EnumDef::new("EventType")
                    .value("EVENT_TYPE_UNSPECIFIED", 0)
                    .value("SEARCH", 1),
            );
        Registry::new(desc).expect("valid schema")
    }

    fn encode(value: &MessageValue) -> JsonValue {
        encode_value(&registry(), value, &TextOptions::default()).unwrap()
    }

    #[test]
    fn writes_declared_names_and_skips_defaults() {
        let event = MessageValue::new("Event")
            .with("type", Value::Enum(1))
            .with("id", "e1")
            .with("retries", 0u32)
            .with(
                "occurred_at",
                MessageValue::new("Timestamp").with("seconds", 1_700_000_000i64),
            );
        assert_eq!(
            encode(&event),
            json!({
                "type": "SEARCH",
                "id": "e1",
                "occurred_at": {"seconds": "1700000000"}
            })
        );
    }

    #[test]
    fn emit_defaults_writes_zero_fields_but_not_unset_presence_fields() {
        let options = TextOptions {
            emit_defaults: true,
            ..TextOptions::default()
        };
        let json = encode_value(&registry(), &MessageValue::new("Timestamp"), &options).unwrap();
        assert_eq!(json, json!({"seconds": "0", "nanos": 0}));

        let event = encode_value(&registry(), &MessageValue::new("Event"), &options).unwrap();
        let object = event.as_object().unwrap();
        assert_eq!(object["type"], json!("EVENT_TYPE_UNSPECIFIED"));
        assert_eq!(object["tags"], json!([]));
        assert!(!object.contains_key("occurred_at"));
        assert!(!object.contains_key("note"));
    }

    #[test]
    fn explicit_presence_field_set_to_zero_is_written() {
        let event = MessageValue::new("Event").with("note", "");
        assert_eq!(encode(&event), json!({"note": ""}));
    }

    #[test]
    fn scalar_forms() {
        let event = MessageValue::new("Event")
            .with("payload", vec![0u8, 1, 2, 255])
            .with("score", 0.1f32)
            .with("weight", f64::NAN)
            .with("tags", Value::List(vec![Value::I64(i64::MIN), Value::I64(-1)]));
        assert_eq!(
            encode(&event),
            json!({
                "payload": "AAEC/w==",
                "score": 0.1,
                "weight": "NaN",
                "tags": ["-9223372036854775808", "-1"]
            })
        );

        let infinite = MessageValue::new("Event").with("weight", f64::NEG_INFINITY);
        assert_eq!(encode(&infinite), json!({"weight": "-Infinity"}));
    }

    #[test]
    fn unknown_enum_numbers_fall_back_to_numbers() {
        let event = MessageValue::new("Event").with("type", Value::Enum(42));
        assert_eq!(encode(&event), json!({"type": 42}));
    }

    #[test]
    fn map_keys_render_as_text() {
        let mut counts = BTreeMap::new();
        counts.insert(MapKey::I64(-5), Value::I32(2));
        counts.insert(MapKey::I64(10), Value::I32(0));
        let event = MessageValue::new("Event").with("counts", counts);
        assert_eq!(encode(&event), json!({"counts": {"-5": 2, "10": 0}}));
    }

    #[test]
    fn pretty_rendering_indents() {
        let event = MessageValue::new("Event").with("id", "e1");
        let compact = encode_string(&registry(), &event, &TextOptions::default()).unwrap();
        let pretty = encode_string(&registry(), &event, &TextOptions::pretty()).unwrap();
        assert_eq!(compact, r#"{"id":"e1"}"#);
        assert!(pretty.contains('\n'));
    }

    #[test]
    fn rejects_values_of_the_wrong_kind() {
        let event = MessageValue::new("Event").with("retries", -1i32);
        assert!(matches!(
            encode_value(&registry(), &event, &TextOptions::default()),
            Err(EncodeError::TypeMismatch { field, .. }) if field == "Event.retries"
        ));
        let unknown = MessageValue::new("Event").with("colour", "red");
        assert!(matches!(
            encode_value(&registry(), &unknown, &TextOptions::default()),
            Err(EncodeError::UnknownField { .. })
        ));
    }
}
