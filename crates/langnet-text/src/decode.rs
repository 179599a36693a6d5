//! JSON to message value.

use std::collections::BTreeMap;

use base64::{
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD},
    Engine as _,
};
use langnet_core::{MapKey, MessageValue, TextError, Value};
use langnet_schema::{Cardinality, FieldLayout, MessageLayout, Registry, ResolvedType, ScalarKind};
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Deepest message nesting accepted. The top-level message is depth 0.
pub const MAX_DEPTH: usize = 100;

/// Deepest bracket nesting [`parse`] accepts: each message level may sit
/// inside an array or a map object.
const MAX_JSON_NESTING: usize = 2 * (MAX_DEPTH + 1);

/// Parse `text` and decode it as an instance of `message`.
///
/// # Errors
///
/// [`TextError::Syntax`] for malformed JSON, otherwise as [`parse`] and
/// [`decode_value`].
pub fn decode(registry: &Registry, message: &str, text: &str) -> Result<MessageValue, TextError> {
    let json = parse(text.as_bytes())?;
    decode_value(registry, message, &json)
}

/// Parse a JSON document whose nesting fits [`MAX_DEPTH`] messages.
///
/// serde_json's own recursion limit is lower than that, so it is disabled
/// and the nesting is checked by an iterative scan before parsing.
///
/// # Errors
///
/// - [`TextError::RecursionLimit`] when brackets nest deeper than
///   [`MAX_DEPTH`] messages can.
/// - [`TextError::Syntax`] for malformed JSON.
pub fn parse(bytes: &[u8]) -> Result<JsonValue, TextError> {
    if nesting_depth(bytes) > MAX_JSON_NESTING {
        return Err(TextError::RecursionLimit(MAX_DEPTH));
    }
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let json = JsonValue::deserialize(&mut de)?;
    de.end()?;
    Ok(json)
}

/// Deepest `[`/`{` nesting in `bytes`, ignoring brackets inside strings.
/// Malformed input gets a best-effort answer; the parser rejects it later.
fn nesting_depth(bytes: &[u8]) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;
    let mut in_string = false;
    let mut escaped = false;
    for &b in bytes {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

/// Decode an already-parsed JSON value as an instance of `message`.
///
/// # Errors
///
/// - [`TextError::UnknownMessage`] if `message` is not in the registry.
/// - [`TextError::Type`] when a value's shape does not fit its field.
/// - [`TextError::RecursionLimit`] past [`MAX_DEPTH`].
pub fn decode_value(
    registry: &Registry,
    message: &str,
    json: &JsonValue,
) -> Result<MessageValue, TextError> {
    let layout = registry
        .message_by_name(message)
        .ok_or_else(|| TextError::UnknownMessage(message.to_string()))?;
    let value = Decoder { registry }.message(layout, json, layout.name(), 0)?;
    tracing::debug!(
        message_type = message,
        fields = value.len(),
        "decoded message from JSON"
    );
    Ok(value)
}

struct Decoder<'r> {
    registry: &'r Registry,
}

impl Decoder<'_> {
    fn message(
        &self,
        layout: &MessageLayout,
        json: &JsonValue,
        path: &str,
        depth: usize,
    ) -> Result<MessageValue, TextError> {
        if depth > MAX_DEPTH {
            return Err(TextError::RecursionLimit(MAX_DEPTH));
        }
        let JsonValue::Object(object) = json else {
            return Err(type_error(path, format!("object ({})", layout.name()), json));
        };

        let mut out = MessageValue::new(layout.name());
        for (key, v) in object {
            let Some(field) = layout.field_by_name(key) else {
                tracing::trace!(message_type = layout.name(), key = %key, "ignoring unknown key");
                continue;
            };
            // The declared spelling wins over the JSON name.
            if key != field.name() && object.contains_key(field.name()) {
                continue;
            }
            if v.is_null() {
                continue;
            }
            let field_path = format!("{path}.{key}");
            out.set(field.name(), self.field(field, v, &field_path, depth)?);
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
        json: &JsonValue,
        path: &str,
        depth: usize,
    ) -> Result<Value, TextError> {
        match field.cardinality() {
            Cardinality::Singular => self.element(field.ty(), json, path, depth),
            Cardinality::Repeated => {
                let JsonValue::Array(items) = json else {
                    return Err(type_error(path, "array", json));
                };
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.element(field.ty(), item, &format!("{path}[{i}]"), depth))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List)
            }
            Cardinality::Map { key } => {
                let JsonValue::Object(entries) = json else {
                    return Err(type_error(path, "object (map)", json));
                };
                let mut map = BTreeMap::new();
                for (k, v) in entries {
                    let entry_path = format!("{path}[{k:?}]");
                    let map_key = parse_key(key, k, &entry_path)?;
                    map.insert(map_key, self.element(field.ty(), v, &entry_path, depth)?);
                }
                Ok(Value::Map(map))
            }
        }
    }

    fn element(
        &self,
        ty: ResolvedType,
        json: &JsonValue,
        path: &str,
        depth: usize,
    ) -> Result<Value, TextError> {
        match ty {
            ResolvedType::Scalar(kind) => scalar(kind, json, path),
            ResolvedType::Enum(id) => {
                let layout = self.registry.enumeration(id);
                let number = match json {
                    JsonValue::String(name) => layout
                        .number_of(name)
                        .or_else(|| name.parse::<i32>().ok()),
                    other => integer(other).and_then(|n| i32::try_from(n).ok()),
                };
                number
                    .map(Value::Enum)
                    .ok_or_else(|| type_error(path, format!("enum {}", layout.name()), json))
            }
            ResolvedType::Message(id) => self
                .message(self.registry.message(id), json, path, depth + 1)
                .map(Value::Message),
        }
    }
}

fn scalar(kind: ScalarKind, json: &JsonValue, path: &str) -> Result<Value, TextError> {
    let value = match kind {
        ScalarKind::Int32 | ScalarKind::Sint32 | ScalarKind::Sfixed32 => integer(json)
            .and_then(|n| i32::try_from(n).ok())
            .map(Value::I32),
        ScalarKind::Int64 | ScalarKind::Sint64 | ScalarKind::Sfixed64 => integer(json)
            .and_then(|n| i64::try_from(n).ok())
            .map(Value::I64),
        ScalarKind::Uint32 | ScalarKind::Fixed32 => integer(json)
            .and_then(|n| u32::try_from(n).ok())
            .map(Value::U32),
        ScalarKind::Uint64 | ScalarKind::Fixed64 => integer(json)
            .and_then(|n| u64::try_from(n).ok())
            .map(Value::U64),
        ScalarKind::Float => float(json)
            .filter(|x| !x.is_finite() || (*x as f32).is_finite())
            .map(|x| Value::F32(x as f32)),
        ScalarKind::Double => float(json).map(Value::F64),
        ScalarKind::Bool => json.as_bool().map(Value::Bool),
        ScalarKind::String => json.as_str().map(|s| Value::String(s.to_string())),
        ScalarKind::Bytes => json.as_str().and_then(base64_bytes).map(Value::Bytes),
    };
    value.ok_or_else(|| type_error(path, kind.as_str(), json))
}

/// Integral value of a JSON number or decimal string. Integral-valued
/// floats such as `1.0` and `1e3` count.
fn integer(json: &JsonValue) -> Option<i128> {
    match json {
        JsonValue::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < 1.9e19)
                    .map(|f| f as i128)
            }),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn float(json: &JsonValue) -> Option<f64> {
    match json {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            other => other.parse().ok().filter(|x: &f64| x.is_finite()),
        },
        _ => None,
    }
}

fn base64_bytes(text: &str) -> Option<Vec<u8>> {
    [STANDARD, URL_SAFE, STANDARD_NO_PAD, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(text).ok())
}

fn parse_key(kind: ScalarKind, key: &str, path: &str) -> Result<MapKey, TextError> {
    let value = match kind {
        ScalarKind::Bool => match key {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        ScalarKind::String => Some(Value::String(key.to_string())),
        _ => scalar(kind, &JsonValue::String(key.to_string()), path).ok(),
    };
    value.and_then(MapKey::from_value).ok_or_else(|| TextError::Type {
        path: path.to_string(),
        expected: format!("{kind} map key"),
        found: format!("key {key:?}"),
    })
}

fn type_error(path: &str, expected: impl Into<String>, found: &JsonValue) -> TextError {
    TextError::Type {
        path: path.to_string(),
        expected: expected.into(),
        found: describe(found),
    }
}

fn describe(json: &JsonValue) -> String {
    match json {
        JsonValue::Null => "null".into(),
        JsonValue::Bool(b) => format!("bool {b}"),
        JsonValue::Number(n) => format!("number {n}"),
        JsonValue::String(s) if s.chars().count() > 32 => {
            let head: String = s.chars().take(32).collect();
            format!("string {head:?}..")
        }
        JsonValue::String(s) => format!("string {s:?}"),
        JsonValue::Array(items) => format!("array of {}", items.len()),
        JsonValue::Object(_) => "object".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode_string, TextOptions};
    use langnet_schema::{EnumDef, FieldDef, MessageDef, SchemaDescription};

    fn registry() -> Registry {
        let desc = SchemaDescription::new("test")
            .message(
                MessageDef::new("SearchRequest")
                    .field(FieldDef::scalar("query", 1, ScalarKind::String))
                    .field(FieldDef::scalar("page_number", 2, ScalarKind::Int32))
                    .field(FieldDef::scalar("results_per_page", 3, ScalarKind::Int32)),
            )
            .message(
                MessageDef::new("Sample")
                    .field(FieldDef::scalar("big", 1, ScalarKind::Int64))
                    .field(FieldDef::scalar("huge", 2, ScalarKind::Uint64))
                    .field(FieldDef::scalar("blob", 3, ScalarKind::Bytes))
                    .field(FieldDef::enumeration("kind", 4, "Kind"))
                    .field(FieldDef::scalar("ratio", 5, ScalarKind::Float))
                    .field(FieldDef::scalar("flags", 6, ScalarKind::Bool).map(ScalarKind::Bool))
                    .field(FieldDef::scalar("ids", 7, ScalarKind::Uint32).map(ScalarKind::Int32))
                    .field(FieldDef::message("child", 8, "Sample"))
                    .field(FieldDef::scalar("names", 9, ScalarKind::String).repeated()),
            )
            .enumeration(EnumDef::new("Kind").value("KIND_UNSPECIFIED", 0).value("BIG", 1));
        Registry::new(desc).expect("valid schema")
    }

    #[test]
    fn accepts_declared_and_json_names() {
        let registry = registry();
        let declared = decode(&registry, "SearchRequest", r#"{"page_number": 2}"#).unwrap();
        let camel = decode(&registry, "SearchRequest", r#"{"pageNumber": 2}"#).unwrap();
        assert_eq!(declared, camel);
        assert_eq!(declared.get_i32("page_number"), Some(2));
        assert_eq!(declared.get_str("query"), Some(""));
    }

    #[test]
    fn declared_name_wins_over_json_name() {
        let registry = registry();
        let req = decode(
            &registry,
            "SearchRequest",
            r#"{"pageNumber": 7, "page_number": 3}"#,
        )
        .unwrap();
        assert_eq!(req.get_i32("page_number"), Some(3));
    }

    #[test]
    fn ignores_unknown_keys_and_nulls() {
        let registry = registry();
        let req = decode(
            &registry,
            "SearchRequest",
            r#"{"query": "rust", "future_field": [1, 2], "page_number": null}"#,
        )
        .unwrap();
        assert_eq!(req.get_str("query"), Some("rust"));
        assert_eq!(req.get_i32("page_number"), Some(0));
    }

    #[test]
    fn sixty_four_bit_integers_survive_as_strings() {
        let registry = registry();
        let sample = decode(
            &registry,
            "Sample",
            r#"{"big": "9007199254740993", "huge": "18446744073709551615"}"#,
        )
        .unwrap();
        assert_eq!(sample.get_i64("big"), Some(9_007_199_254_740_993));
        assert_eq!(sample.get_u64("huge"), Some(u64::MAX));

        let text = encode_string(&registry, &sample, &TextOptions::default()).unwrap();
        assert!(text.contains(r#""big":"9007199254740993""#));

        let numeric = decode(&registry, "Sample", r#"{"big": 9007199254740993}"#).unwrap();
        assert_eq!(numeric.get_i64("big"), Some(9_007_199_254_740_993));
    }

    #[test]
    fn thirty_two_bit_integers_accept_numbers_and_strings() {
        let registry = registry();
        for text in [
            r#"{"page_number": 7}"#,
            r#"{"page_number": "7"}"#,
            r#"{"page_number": 7.0}"#,
        ] {
            let req = decode(&registry, "SearchRequest", text).unwrap();
            assert_eq!(req.get_i32("page_number"), Some(7), "{text}");
        }
    }

    #[test]
    fn rejects_ill_typed_values_with_a_path() {
        let registry = registry();
        for text in [
            r#"{"page_number": "abc"}"#,
            r#"{"page_number": 4294967296}"#,
            r#"{"page_number": 1.5}"#,
            r#"{"page_number": true}"#,
        ] {
            match decode(&registry, "SearchRequest", text) {
                Err(TextError::Type { path, .. }) => {
                    assert_eq!(path, "SearchRequest.page_number", "{text}")
                }
                other => panic!("{text}: expected a type error, got {other:?}"),
            }
        }

        match decode(&registry, "Sample", r#"{"names": ["a", 3]}"#) {
            Err(TextError::Type { path, .. }) => assert_eq!(path, "Sample.names[1]"),
            other => panic!("expected a type error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_a_syntax_error() {
        let registry = registry();
        assert!(matches!(
            decode(&registry, "SearchRequest", "{\"query\": "),
            Err(TextError::Syntax(_))
        ));
        assert!(matches!(
            decode(&registry, "SearchRequest", "[]"),
            Err(TextError::Type { .. })
        ));
    }

    #[test]
    fn enums_by_name_or_number() {
        let registry = registry();
        let by_name = decode(&registry, "Sample", r#"{"kind": "BIG"}"#).unwrap();
        let by_number = decode(&registry, "Sample", r#"{"kind": 1}"#).unwrap();
        let unknown = decode(&registry, "Sample", r#"{"kind": 99}"#).unwrap();
        assert_eq!(by_name.get_enum("kind"), Some(1));
        assert_eq!(by_number.get_enum("kind"), Some(1));
        assert_eq!(unknown.get_enum("kind"), Some(99));
        assert!(matches!(
            decode(&registry, "Sample", r#"{"kind": "HUGE"}"#),
            Err(TextError::Type { .. })
        ));
    }

    #[test]
    fn bytes_accept_both_base64_alphabets() {
        let registry = registry();
        for text in [
            r#"{"blob": "AAEC/w=="}"#,
            r#"{"blob": "AAEC_w=="}"#,
            r#"{"blob": "AAEC/w"}"#,
            r#"{"blob": "AAEC_w"}"#,
        ] {
            let sample = decode(&registry, "Sample", text).unwrap();
            assert_eq!(sample.get_bytes("blob"), Some(&[0u8, 1, 2, 255][..]), "{text}");
        }
    }

    #[test]
    fn special_floats() {
        let registry = registry();
        let nan = decode(&registry, "Sample", r#"{"ratio": "NaN"}"#).unwrap();
        assert!(nan.get_f32("ratio").unwrap().is_nan());
        let inf = decode(&registry, "Sample", r#"{"ratio": "-Infinity"}"#).unwrap();
        assert_eq!(inf.get_f32("ratio"), Some(f32::NEG_INFINITY));
        assert!(matches!(
            decode(&registry, "Sample", r#"{"ratio": 1e300}"#),
            Err(TextError::Type { .. })
        ));
    }

    #[test]
    fn map_keys_parse_by_declared_kind() {
        let registry = registry();
        let sample = decode(
            &registry,
            "Sample",
            r#"{"flags": {"true": false}, "ids": {"-3": 4}}"#,
        )
        .unwrap();
        assert_eq!(
            sample.get_map("flags").unwrap().get(&MapKey::Bool(true)),
            Some(&Value::Bool(false))
        );
        assert_eq!(
            sample.get_map("ids").unwrap().get(&MapKey::I32(-3)),
            Some(&Value::U32(4))
        );
        assert!(matches!(
            decode(&registry, "Sample", r#"{"ids": {"x": 1}}"#),
            Err(TextError::Type { .. })
        ));
    }

    #[test]
    fn nesting_is_bounded() {
        let registry = registry();
        let depth = MAX_DEPTH + 10;
        let text = format!("{}{{}}{}", r#"{"child": "#.repeat(depth), "}".repeat(depth));
        assert!(matches!(
            decode(&registry, "Sample", &text),
            Err(TextError::RecursionLimit(MAX_DEPTH))
        ));
    }

    fn tree_registry() -> Registry {
        let desc = SchemaDescription::new("tree").message(
            MessageDef::new("Node")
                .field(FieldDef::scalar("n", 1, ScalarKind::Int32))
                .field(FieldDef::message("kids", 2, "Node").repeated())
                .field(FieldDef::message("named", 3, "Node").map(ScalarKind::String)),
        );
        Registry::new(desc).expect("valid schema")
    }

    /// `levels` nested nodes, alternating between list and map children.
    fn tree(levels: usize) -> MessageValue {
        let mut node = MessageValue::new("Node").with("n", 1i32);
        for i in 0..levels {
            let parent = MessageValue::new("Node").with("n", 1i32);
            node = if i % 2 == 0 {
                parent.with("kids", Value::List(vec![node.into()]))
            } else {
                parent.with(
                    "named",
                    Value::Map(BTreeMap::from([(MapKey::from("k"), Value::Message(node))])),
                )
            };
        }
        node
    }

    #[test]
    fn deep_list_and_map_nesting_decodes() {
        let registry = tree_registry();
        for levels in [70, MAX_DEPTH] {
            let value = tree(levels);
            let text = encode_string(&registry, &value, &TextOptions::default()).unwrap();
            let back = decode(&registry, "Node", &text).unwrap();
            assert!(registry.equivalent(&back, &value), "{levels} levels");
        }
        let text = encode_string(&registry, &tree(MAX_DEPTH + 1), &TextOptions::default()).unwrap();
        assert!(matches!(
            decode(&registry, "Node", &text),
            Err(TextError::RecursionLimit(MAX_DEPTH))
        ));
    }

    #[test]
    fn bracket_nesting_is_bounded_before_parsing() {
        let depth = 100_000;
        let text = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
        assert!(matches!(
            parse(text.as_bytes()),
            Err(TextError::RecursionLimit(MAX_DEPTH))
        ));
    }

    #[test]
    fn brackets_inside_strings_do_not_count() {
        assert_eq!(nesting_depth(br#"{"a": "[[[{\"]]", "b": [1]}"#), 2);
        let text = format!(r#"{{"query": "{}"}}"#, "[".repeat(1000));
        assert!(parse(text.as_bytes()).is_ok());
    }

    #[test]
    fn parse_rejects_trailing_input() {
        assert!(matches!(parse(b"{} {}"), Err(TextError::Syntax(_))));
    }

    #[test]
    fn unknown_message_type() {
        assert!(matches!(
            decode(&registry(), "Nope", "{}"),
            Err(TextError::UnknownMessage(name)) if name == "Nope"
        ));
    }
}
