//! # Fixtures and Suites
//!
//! A [`Suite`] pairs a schema with the fixtures written against it. Two
//! suites ship with the harness:
//!
//! - [`Suite::langnet`]: the sample messages every LangNet writer
//!   produces, plus edge cases reachable through the LangNet schema
//!   (64-bit timestamp bounds, negative `int32`, unknown enum numbers,
//!   empty messages, non-ASCII text).
//! - [`Suite::scalars`]: a schema covering every scalar kind, packing,
//!   integer and bool map keys, explicit presence and recursion, with
//!   fixtures at the numeric boundaries (zig-zag, NaN and infinities, raw
//!   bytes).

use std::collections::BTreeMap;
use std::sync::Arc;

use langnet_core::{MapKey, MessageValue, Value};
use langnet_runtime::langnet::{self, samples};
use langnet_runtime::Message;
use langnet_schema::{EnumDef, FieldDef, MessageDef, Registry, ScalarKind, SchemaDescription};

use crate::error::ConformanceError;

/// A named message value that every implementation must write and read.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub name: String,
    pub message: MessageValue,
}

impl Fixture {
    pub fn new(name: impl Into<String>, message: MessageValue) -> Self {
        Self {
            name: name.into(),
            message,
        }
    }

    fn of<M: Message>(name: &str, message: &M) -> Self {
        Self::new(name, message.to_value())
    }
}

/// A schema with its fixtures.
#[derive(Debug, Clone)]
pub struct Suite {
    pub name: &'static str,
    pub schema: SchemaDescription,
    pub registry: Arc<Registry>,
    pub fixtures: Vec<Fixture>,
}

impl Suite {
    fn build(
        name: &'static str,
        schema: SchemaDescription,
        fixtures: Vec<Fixture>,
    ) -> Result<Self, ConformanceError> {
        let registry = Arc::new(Registry::new(schema.clone())?);
        Ok(Self {
            name,
            schema,
            registry,
            fixtures,
        })
    }

    /// Every suite the harness ships.
    pub fn all() -> Result<Vec<Self>, ConformanceError> {
        Ok(vec![Self::langnet()?, Self::scalars()?])
    }

    pub fn langnet() -> Result<Self, ConformanceError> {
        Self::build("langnet", langnet::schema(), langnet_fixtures())
    }

    pub fn scalars() -> Result<Self, ConformanceError> {
        Self::build("scalars", scalars_schema(), scalars_fixtures())
    }

    pub fn fixture(&self, name: &str) -> Option<&Fixture> {
        self.fixtures.iter().find(|f| f.name == name)
    }
}

/// The sample messages, one per LangNet message type, followed by edge
/// cases.
pub fn langnet_fixtures() -> Vec<Fixture> {
    let mut fixtures = vec![
        Fixture::of("search_request", &samples::search_request()),
        Fixture::of("search_response", &samples::search_response()),
        Fixture::of("user", &samples::user()),
        Fixture::of("config", &samples::config()),
        Fixture::of("batch", &samples::batch()),
        Fixture::of("event", &samples::event()),
        Fixture::of("api_request", &samples::api_request()),
        Fixture::of("api_response", &samples::api_response()),
        Fixture::of("error", &samples::error()),
    ];

    let timestamp = |seconds: i64, nanos: i32| {
        MessageValue::new("Timestamp")
            .with("seconds", seconds)
            .with("nanos", nanos)
    };
    fixtures.extend([
        Fixture::new("empty_user", MessageValue::new("User")),
        Fixture::new("timestamp_max", timestamp(i64::MAX, i32::MAX)),
        Fixture::new("timestamp_min", timestamp(i64::MIN, i32::MIN)),
        Fixture::new("timestamp_negative", timestamp(-1, -1)),
        Fixture::new("json_unsafe_seconds", timestamp(9_007_199_254_740_993, 0)),
        Fixture::new(
            "event_unknown_type",
            MessageValue::new("Event")
                .with("type", Value::Enum(42))
                .with("id", "event-future"),
        ),
        Fixture::new(
            "event_negative_type",
            MessageValue::new("Event").with("type", Value::Enum(-3)),
        ),
        Fixture::new(
            "user_non_ascii",
            MessageValue::new("User")
                .with("username", "zoë ☃ 日本語 🦀")
                .with("roles", vec!["", "rôle"])
                .with(
                    "preferences",
                    Value::Map(BTreeMap::from([
                        (MapKey::from(""), Value::from("empty key")),
                        (MapKey::from("ключ"), Value::from("")),
                    ])),
                ),
        ),
    ]);
    fixtures
}

/// A schema exercising every scalar kind and field shape.
pub fn scalars_schema() -> SchemaDescription {
    let kinds = [
        ScalarKind::Int32,
        ScalarKind::Int64,
        ScalarKind::Uint32,
        ScalarKind::Uint64,
        ScalarKind::Sint32,
        ScalarKind::Sint64,
        ScalarKind::Fixed32,
        ScalarKind::Fixed64,
        ScalarKind::Sfixed32,
        ScalarKind::Sfixed64,
        ScalarKind::Bool,
        ScalarKind::Float,
        ScalarKind::Double,
        ScalarKind::String,
        ScalarKind::Bytes,
    ];
    let scalars = (1..)
        .zip(kinds)
        .fold(MessageDef::new("Scalars"), |message, (number, kind)| {
            message.field(FieldDef::scalar(&format!("{kind}_value"), number, kind))
        })
        .field(FieldDef::scalar("packed_sint32", 16, ScalarKind::Sint32).repeated())
        .field(
            FieldDef::scalar("unpacked_int64", 17, ScalarKind::Int64)
                .repeated()
                .packed(false),
        )
        .field(FieldDef::scalar("doubles", 18, ScalarKind::Double).repeated())
        .field(FieldDef::scalar("blobs", 19, ScalarKind::Bytes).map(ScalarKind::Int64))
        .field(FieldDef::scalar("flags", 20, ScalarKind::String).map(ScalarKind::Bool))
        .field(FieldDef::scalar("counts", 21, ScalarKind::Fixed32).map(ScalarKind::String))
        .field(FieldDef::scalar("maybe", 22, ScalarKind::Int32).optional())
        .field(FieldDef::message("child", 23, "Scalars"))
        .field(FieldDef::message("children", 24, "Scalars").repeated())
        .field(FieldDef::enumeration("kind", 25, "Kind"))
        .field(FieldDef::enumeration("kinds", 26, "Kind").repeated())
        .field(FieldDef::scalar("large_field", 536_870_911, ScalarKind::Uint32));

    SchemaDescription::new("langnet.conformance")
        .message(scalars)
        .enumeration(
            EnumDef::new("Kind")
                .value("KIND_UNSPECIFIED", 0)
                .value("KIND_ALPHA", 1)
                .value("KIND_BETA", 2),
        )
}

/// Boundary values for [`scalars_schema`].
pub fn scalars_fixtures() -> Vec<Fixture> {
    let scalars = || MessageValue::new("Scalars");
    vec![
        Fixture::new("scalars_empty", scalars()),
        Fixture::new(
            "scalars_max",
            scalars()
                .with("int32_value", i32::MAX)
                .with("int64_value", i64::MAX)
                .with("uint32_value", u32::MAX)
                .with("uint64_value", u64::MAX)
                .with("sint32_value", i32::MAX)
                .with("sint64_value", i64::MAX)
                .with("fixed32_value", u32::MAX)
                .with("fixed64_value", u64::MAX)
                .with("sfixed32_value", i32::MAX)
                .with("sfixed64_value", i64::MAX)
                .with("bool_value", true)
                .with("float_value", f32::MAX)
                .with("double_value", f64::MAX)
                .with("string_value", "max")
                .with("bytes_value", vec![0xffu8; 4])
                .with("large_field", 1u32),
        ),
        Fixture::new(
            "scalars_min",
            scalars()
                .with("int32_value", i32::MIN)
                .with("int64_value", i64::MIN)
                .with("sint32_value", i32::MIN)
                .with("sint64_value", i64::MIN)
                .with("sfixed32_value", i32::MIN)
                .with("sfixed64_value", i64::MIN)
                .with("float_value", f32::MIN_POSITIVE)
                .with("double_value", f64::MIN_POSITIVE),
        ),
        Fixture::new(
            "zigzag_small_negatives",
            scalars()
                .with("int32_value", -1i32)
                .with("sint32_value", -1i32)
                .with("sint64_value", -2i64)
                .with("packed_sint32", Value::List(vec![1i32.into(), (-1i32).into(), 63i32.into(), (-64i32).into()])),
        ),
        Fixture::new(
            "json_unsafe_integers",
            scalars()
                .with("int64_value", 9_007_199_254_740_993i64)
                .with("uint64_value", 18_446_744_073_709_551_615u64)
                .with("fixed64_value", 9_007_199_254_740_993u64),
        ),
        Fixture::new(
            "non_finite_floats",
            scalars()
                .with("float_value", f32::NAN)
                .with("double_value", f64::INFINITY)
                .with(
                    "doubles",
                    Value::List(vec![f64::NEG_INFINITY.into(), (-0.0f64).into(), 0.1f64.into()]),
                ),
        ),
        Fixture::new(
            "binary_bytes",
            scalars()
                .with("bytes_value", (0..=255u8).collect::<Vec<u8>>())
                .with("string_value", "tab\tquote\"backslash\\nul\u{0}"),
        ),
        Fixture::new(
            "repeated_and_maps",
            scalars()
                .with("unpacked_int64", Value::List(vec![(-5i64).into(), 0i64.into(), 5i64.into()]))
                .with(
                    "blobs",
                    Value::Map(BTreeMap::from([
                        (MapKey::I64(-1), Value::Bytes(vec![0])),
                        (MapKey::I64(0), Value::Bytes(Vec::new())),
                        (MapKey::I64(i64::MAX), Value::Bytes(b"abc".to_vec())),
                    ])),
                )
                .with(
                    "flags",
                    Value::Map(BTreeMap::from([
                        (MapKey::Bool(false), Value::from("no")),
                        (MapKey::Bool(true), Value::from("yes")),
                    ])),
                )
                .with(
                    "counts",
                    Value::Map(BTreeMap::from([(MapKey::from("a"), Value::U32(0))])),
                ),
        ),
        Fixture::new(
            "explicit_zero_presence",
            scalars()
                .with("maybe", 0i32)
                .with("child", scalars()),
        ),
        Fixture::new(
            "nested_messages",
            scalars()
                .with("child", scalars().with("child", scalars().with("string_value", "deep")))
                .with(
                    "children",
                    Value::List(vec![
                        scalars().with("int32_value", 1i32).into(),
                        scalars().into(),
                        scalars().with("maybe", -7i32).into(),
                    ]),
                ),
        ),
        Fixture::new(
            "enums",
            scalars()
                .with("kind", Value::Enum(2))
                .with(
                    "kinds",
                    Value::List(vec![Value::Enum(1), Value::Enum(0), Value::Enum(99), Value::Enum(-1)]),
                ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_suites_build() {
        let suites = Suite::all().unwrap();
        let names: Vec<_> = suites.iter().map(|s| s.name).collect();
        assert_eq!(names, ["langnet", "scalars"]);
    }

    #[test]
    fn fixture_names_are_unique() {
        for suite in Suite::all().unwrap() {
            let mut names: Vec<_> = suite.fixtures.iter().map(|f| f.name.as_str()).collect();
            let total = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), total, "suite {}", suite.name);
        }
    }

    #[test]
    fn every_fixture_is_well_typed_for_its_suite() {
        for suite in Suite::all().unwrap() {
            for fixture in &suite.fixtures {
                langnet_wire::encode(&suite.registry, &fixture.message)
                    .unwrap_or_else(|e| panic!("{}/{}: {e}", suite.name, fixture.name));
            }
        }
    }

    #[test]
    fn scalar_fields_are_named_after_their_kind() {
        let suite = Suite::scalars().unwrap();
        let layout = suite.registry.message_by_name("Scalars").unwrap();
        assert_eq!(layout.field_by_number(5).unwrap().name(), "sint32_value");
        assert_eq!(layout.field_by_number(15).unwrap().name(), "bytes_value");
        assert!(suite.fixture("scalars_max").is_some());
    }
}
