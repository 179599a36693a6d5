//! # Registry
//!
//! Validates a [`SchemaDescription`] and compiles it into layout tables.
//!
//! ## Validation Rules
//!
//! A description is rejected, with every violation listed, when it has:
//!
//! - duplicate message or enum names, or a message and enum sharing a name;
//! - duplicate field names, JSON names or numbers within a message;
//! - field numbers outside `1..=536_870_911` or inside `19000..=19999`;
//! - references to undeclared enums or messages;
//! - map keys that are not integral, bool or string;
//! - presence tracking on repeated or map fields;
//! - `packed: true` on a field that is not a repeated numeric field;
//! - enums without a zero value, or with duplicate value names.
//!
//! ## Sharing
//!
//! A built registry is never mutated. Wrap it in `Arc` to share it between
//! threads; every codec call only takes `&Registry`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use langnet_core::{MessageValue, SchemaError, SchemaViolations, Value};

use crate::layout::{
    Cardinality, EnumId, EnumLayout, FieldLayout, MessageId, MessageLayout, ResolvedType,
};
use crate::model::{FieldDef, FieldType, Label, Presence, ScalarKind, SchemaDescription};

/// Largest field number representable in a 29-bit tag.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

const RESERVED_NUMBERS: std::ops::RangeInclusive<u32> = 19_000..=19_999;

/// Compiled, read-only schema shared by every codec call.
#[derive(Debug, Clone)]
pub struct Registry {
    description: SchemaDescription,
    messages: Vec<MessageLayout>,
    enums: Vec<EnumLayout>,
    message_ids: HashMap<String, MessageId>,
    enum_ids: HashMap<String, EnumId>,
}

impl Registry {
    /// Validate `description` and build its layout tables.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Invalid` listing every rule the description
    /// breaks.
    pub fn new(description: SchemaDescription) -> Result<Self, SchemaError> {
        let mut violations = SchemaViolations::new();

        let mut message_ids = HashMap::new();
        for (i, message) in description.messages.iter().enumerate() {
            match message_ids.entry(message.name.clone()) {
                Entry::Occupied(_) => {
                    violations.push(format!("duplicate message name '{}'", message.name))
                }
                Entry::Vacant(slot) => {
                    slot.insert(MessageId(i));
                }
            }
        }

        let mut enum_ids = HashMap::new();
        for (i, enumeration) in description.enums.iter().enumerate() {
            if message_ids.contains_key(&enumeration.name) {
                violations.push(format!(
                    "enum '{}' has the same name as a message",
                    enumeration.name
                ));
            }
            match enum_ids.entry(enumeration.name.clone()) {
                Entry::Occupied(_) => {
                    violations.push(format!("duplicate enum name '{}'", enumeration.name))
                }
                Entry::Vacant(slot) => {
                    slot.insert(EnumId(i));
                }
            }
        }

        let enums = description
            .enums
            .iter()
            .enumerate()
            .map(|(i, def)| {
                let mut layout = EnumLayout {
                    id: EnumId(i),
                    name: def.name.clone(),
                    values: Vec::with_capacity(def.values.len()),
                    by_name: HashMap::new(),
                    by_number: HashMap::new(),
                };
                for value in &def.values {
                    let index = layout.values.len();
                    if layout.by_name.insert(value.name.clone(), value.number).is_some() {
                        violations.push(format!(
                            "duplicate value name '{}' in enum '{}'",
                            value.name, def.name
                        ));
                        continue;
                    }
                    layout.by_number.entry(value.number).or_insert(index);
                    layout.values.push((value.name.clone(), value.number));
                }
                if !layout.by_number.contains_key(&0) {
                    violations.push(format!("enum '{}' has no zero value", def.name));
                }
                layout
            })
            .collect();

        let messages = description
            .messages
            .iter()
            .enumerate()
            .map(|(i, def)| {
                let mut fields: Vec<FieldLayout> = def
                    .fields
                    .iter()
                    .filter_map(|field| {
                        compile_field(&def.name, field, &message_ids, &enum_ids, &mut violations)
                    })
                    .collect();
                fields.sort_by_key(|f| f.number);
                let (by_number, by_name) = index_fields(&def.name, &fields, &mut violations);
                MessageLayout {
                    id: MessageId(i),
                    name: def.name.clone(),
                    fields,
                    by_number,
                    by_name,
                }
            })
            .collect();

        if !violations.is_empty() {
            return Err(SchemaError::Invalid {
                package: description.package.clone(),
                violations,
            });
        }

        let registry = Self {
            description,
            messages,
            enums,
            message_ids,
            enum_ids,
        };
        tracing::debug!(
            package = %registry.package(),
            messages = registry.messages.len(),
            enums = registry.enums.len(),
            "built schema registry"
        );
        Ok(registry)
    }

    pub fn package(&self) -> &str {
        &self.description.package
    }

    /// The description this registry was built from.
    pub fn description(&self) -> &SchemaDescription {
        &self.description
    }

    /// Layout for an id issued by this registry.
    pub fn message(&self, id: MessageId) -> &MessageLayout {
        &self.messages[id.0]
    }

    /// Layout for an id issued by this registry.
    pub fn enumeration(&self, id: EnumId) -> &EnumLayout {
        &self.enums[id.0]
    }

    pub fn message_by_name(&self, name: &str) -> Option<&MessageLayout> {
        self.message_ids.get(name).map(|id| self.message(*id))
    }

    pub fn enum_by_name(&self, name: &str) -> Option<&EnumLayout> {
        self.enum_ids.get(name).map(|id| self.enumeration(*id))
    }

    /// Like [`Registry::message_by_name`], failing with
    /// `SchemaError::UnknownMessage`.
    pub fn resolve(&self, name: &str) -> Result<&MessageLayout, SchemaError> {
        self.message_by_name(name)
            .ok_or_else(|| SchemaError::UnknownMessage(name.to_string()))
    }

    pub fn messages(&self) -> &[MessageLayout] {
        &self.messages
    }

    pub fn enums(&self) -> &[EnumLayout] {
        &self.enums
    }

    /// The value an absent field decodes to, or `None` for fields that
    /// track presence (they stay absent).
    pub fn zero_value(&self, field: &FieldLayout) -> Option<Value> {
        match field.cardinality() {
            Cardinality::Repeated => Some(Value::List(Vec::new())),
            Cardinality::Map { .. } => Some(Value::Map(Default::default())),
            Cardinality::Singular if field.has_presence() => None,
            Cardinality::Singular => match field.ty() {
                ResolvedType::Scalar(kind) => Some(scalar_zero(kind)),
                ResolvedType::Enum(_) => Some(Value::Enum(0)),
                ResolvedType::Message(_) => None,
            },
        }
    }

    /// Fill every absent implicit-presence field with its zero value,
    /// recursively. Fields set under their JSON name are re-keyed to the
    /// declared name. Values of unknown message types are returned as-is.
    pub fn normalize(&self, value: &MessageValue) -> MessageValue {
        match self.message_by_name(value.message()) {
            Some(layout) => self.normalize_with(layout, value),
            None => value.clone(),
        }
    }

    fn normalize_with(&self, layout: &MessageLayout, value: &MessageValue) -> MessageValue {
        let mut out = MessageValue::new(value.message());
        for (name, v) in value.fields() {
            match layout.field_by_name(name) {
                // The declared spelling wins over the JSON name.
                Some(field) if name != field.name() && value.contains(field.name()) => {}
                Some(field) => {
                    out.set(field.name(), self.normalize_field(field, v));
                }
                None => {
                    out.set(name, v.clone());
                }
            }
        }
        for field in layout.fields() {
            if !out.contains(field.name()) {
                if let Some(zero) = self.zero_value(field) {
                    out.set(field.name(), zero);
                }
            }
        }
        out
    }

    fn normalize_field(&self, field: &FieldLayout, value: &Value) -> Value {
        let ResolvedType::Message(id) = field.ty() else {
            return value.clone();
        };
        let layout = self.message(id);
        let nested = |v: &Value| match v {
            Value::Message(m) => Value::Message(self.normalize_with(layout, m)),
            other => other.clone(),
        };
        match value {
            Value::List(items) => Value::List(items.iter().map(nested).collect()),
            Value::Map(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), nested(v)))
                    .collect(),
            ),
            other => nested(other),
        }
    }

    /// Equality under which an omitted implicit-default field equals an
    /// explicit zero, presence-tracked fields distinguish absent from zero,
    /// and floats compare bitwise (so NaN equals NaN).
    pub fn equivalent(&self, a: &MessageValue, b: &MessageValue) -> bool {
        message_eq(&self.normalize(a), &self.normalize(b))
    }
}

/// The zero value of a scalar kind.
pub fn scalar_zero(kind: ScalarKind) -> Value {
    match kind {
        ScalarKind::Int32 | ScalarKind::Sint32 | ScalarKind::Sfixed32 => Value::I32(0),
        ScalarKind::Int64 | ScalarKind::Sint64 | ScalarKind::Sfixed64 => Value::I64(0),
        ScalarKind::Uint32 | ScalarKind::Fixed32 => Value::U32(0),
        ScalarKind::Uint64 | ScalarKind::Fixed64 => Value::U64(0),
        ScalarKind::Bool => Value::Bool(false),
        ScalarKind::Float => Value::F32(0.0),
        ScalarKind::Double => Value::F64(0.0),
        ScalarKind::String => Value::String(String::new()),
        ScalarKind::Bytes => Value::Bytes(Vec::new()),
    }
}

fn compile_field(
    message: &str,
    field: &FieldDef,
    message_ids: &HashMap<String, MessageId>,
    enum_ids: &HashMap<String, EnumId>,
    violations: &mut SchemaViolations,
) -> Option<FieldLayout> {
    let qualified_name = format!("{message}.{}", field.name);

    if field.number == 0 || field.number > MAX_FIELD_NUMBER {
        violations.push(format!(
            "field '{qualified_name}' has number {} outside 1..={MAX_FIELD_NUMBER}",
            field.number
        ));
    } else if RESERVED_NUMBERS.contains(&field.number) {
        violations.push(format!(
            "field '{qualified_name}' uses reserved number {}",
            field.number
        ));
    }

    let ty = match &field.ty {
        FieldType::Scalar(kind) => Some(ResolvedType::Scalar(*kind)),
        FieldType::Enum(name) => match enum_ids.get(name) {
            Some(id) => Some(ResolvedType::Enum(*id)),
            None => {
                violations.push(format!(
                    "field '{qualified_name}' references undeclared enum '{name}'"
                ));
                None
            }
        },
        FieldType::Message(name) => match message_ids.get(name) {
            Some(id) => Some(ResolvedType::Message(*id)),
            None => {
                violations.push(format!(
                    "field '{qualified_name}' references undeclared message '{name}'"
                ));
                None
            }
        },
    };

    let cardinality = match field.label {
        Label::Singular => Cardinality::Singular,
        Label::Repeated => Cardinality::Repeated,
        Label::Map { key } => {
            if !key.is_valid_map_key() {
                violations.push(format!(
                    "map field '{qualified_name}' has invalid key type {key}"
                ));
            }
            Cardinality::Map { key }
        }
    };

    let explicit = field.presence == Presence::Explicit;
    if explicit && cardinality != Cardinality::Singular {
        violations.push(format!(
            "field '{qualified_name}' cannot track presence: it is repeated or a map"
        ));
    }

    let ty = ty?;
    let packable = cardinality == Cardinality::Repeated && ty.is_packable();
    if field.packed == Some(true) && !packable {
        violations.push(format!(
            "field '{qualified_name}' is marked packed but is not a repeated numeric field"
        ));
    }

    Some(FieldLayout {
        name: field.name.clone(),
        json_name: field.effective_json_name(),
        qualified_name,
        number: field.number,
        ty,
        cardinality,
        has_presence: cardinality == Cardinality::Singular
            && (explicit || matches!(ty, ResolvedType::Message(_))),
        packed: packable && field.packed.unwrap_or(true),
    })
}

type FieldIndex = (HashMap<u32, usize>, HashMap<String, usize>);

fn index_fields(
    message: &str,
    fields: &[FieldLayout],
    violations: &mut SchemaViolations,
) -> FieldIndex {
    let mut by_number = HashMap::with_capacity(fields.len());
    let mut by_name = HashMap::with_capacity(fields.len() * 2);

    for (i, field) in fields.iter().enumerate() {
        if by_number.insert(field.number, i).is_some() {
            violations.push(format!(
                "duplicate field number {} in message '{message}'",
                field.number
            ));
        }
        if by_name.insert(field.name.clone(), i).is_some() {
            violations.push(format!(
                "duplicate field name '{}' in message '{message}'",
                field.name
            ));
        }
    }
    // JSON aliases go in after every declared name so that a collision with
    // a declared name is always detected.
    for (i, field) in fields.iter().enumerate() {
        if field.json_name == field.name {
            continue;
        }
        match by_name.entry(field.json_name.clone()) {
            Entry::Occupied(_) => violations.push(format!(
                "JSON name '{}' of field '{}' collides with another field in message '{message}'",
                field.json_name, field.qualified_name
            )),
            Entry::Vacant(slot) => {
                slot.insert(i);
            }
        }
    }
    (by_number, by_name)
}

fn message_eq(a: &MessageValue, b: &MessageValue) -> bool {
    a.message() == b.message()
        && a.len() == b.len()
        && a
            .fields()
            .zip(b.fields())
            .all(|((ka, va), (kb, vb))| ka == kb && value_eq(va, vb))
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::F32(x), Value::F32(y)) => x.to_bits() == y.to_bits(),
        (Value::F64(x), Value::F64(y)) => x.to_bits() == y.to_bits(),
        (Value::Message(x), Value::Message(y)) => message_eq(x, y),
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| value_eq(p, q))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .zip(y)
                    .all(|((kp, vp), (kq, vq))| kp == kq && value_eq(vp, vq))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EnumDef, MessageDef};

    fn user_schema() -> SchemaDescription {
        SchemaDescription::new("demo")
            .message(
                MessageDef::new("User")
                    .field(FieldDef::scalar("id", 1, ScalarKind::String))
                    .field(FieldDef::scalar("username", 2, ScalarKind::String))
                    .field(FieldDef::scalar("roles", 3, ScalarKind::String).repeated())
                    .field(FieldDef::scalar("scores", 4, ScalarKind::Sint32).repeated())
                    .field(
                        FieldDef::scalar("preferences", 5, ScalarKind::String)
                            .map(ScalarKind::String),
                    )
                    .field(FieldDef::message("created_at", 6, "Timestamp"))
                    .field(FieldDef::enumeration("kind", 7, "Kind"))
                    .field(FieldDef::scalar("nickname", 8, ScalarKind::String).optional())
                    .field(FieldDef::scalar("page_number", 9, ScalarKind::Int32)),
            )
            .message(
                MessageDef::new("Timestamp")
                    .field(FieldDef::scalar("seconds", 1, ScalarKind::Int64))
                    .field(FieldDef::scalar("nanos", 2, ScalarKind::Int32)),
            )
            .enumeration(
                EnumDef::new("Kind")
                    .value("KIND_UNSPECIFIED", 0)
                    .value("ADMIN", 1)
                    .value("SUPERUSER", 1),
            )
    }

    fn invalid(description: SchemaDescription) -> SchemaViolations {
        match Registry::new(description) {
            Err(SchemaError::Invalid { violations, .. }) => violations,
            Err(other) => panic!("expected Invalid, got {other}"),
            Ok(_) => panic!("expected the description to be rejected"),
        }
    }

    #[test]
    fn builds_layout_tables() {
        let registry = Registry::new(user_schema()).expect("valid schema");
        let user = registry.message_by_name("User").unwrap();
        assert_eq!(user.fields().len(), 9);
        assert_eq!(user.field_by_number(3).unwrap().name(), "roles");
        assert_eq!(user.field_by_name("username").unwrap().number(), 2);
        assert_eq!(user.field_by_name("pageNumber").unwrap().number(), 9);
        assert!(user.field_by_number(42).is_none());
        assert!(user.field_by_name("preferences").unwrap().is_map());
        assert!(!user.field_by_name("roles").unwrap().is_map());

        let numbers: Vec<u32> = user.fields().iter().map(|f| f.number()).collect();
        let mut sorted = numbers.clone();
        sorted.sort_unstable();
        assert_eq!(numbers, sorted);
    }

    #[test]
    fn resolves_references_to_ids() {
        let registry = Registry::new(user_schema()).unwrap();
        let user = registry.message_by_name("User").unwrap();
        let created_at = user.field_by_name("created_at").unwrap();
        match created_at.ty() {
            ResolvedType::Message(id) => assert_eq!(registry.message(id).name(), "Timestamp"),
            other => panic!("expected message type, got {other:?}"),
        }
        assert!(created_at.has_presence());
        let kind = user.field_by_name("kind").unwrap();
        assert!(matches!(kind.ty(), ResolvedType::Enum(_)));
        assert!(!kind.has_presence());
        assert!(user.field_by_name("nickname").unwrap().has_presence());
    }

    #[test]
    fn packing_defaults() {
        let registry = Registry::new(user_schema()).unwrap();
        let user = registry.message_by_name("User").unwrap();
        assert!(user.field_by_name("scores").unwrap().is_packed());
        assert!(!user.field_by_name("roles").unwrap().is_packed());
        assert!(!user.field_by_name("page_number").unwrap().is_packed());
    }

    #[test]
    fn enum_lookups_and_aliases() {
        let registry = Registry::new(user_schema()).unwrap();
        let kind = registry.enum_by_name("Kind").unwrap();
        assert_eq!(kind.number_of("ADMIN"), Some(1));
        assert_eq!(kind.number_of("SUPERUSER"), Some(1));
        assert_eq!(kind.name_of(1), Some("ADMIN"));
        assert_eq!(kind.name_of(7), None);
    }

    #[test]
    fn resolve_unknown_message_fails() {
        let registry = Registry::new(user_schema()).unwrap();
        assert!(matches!(
            registry.resolve("Nope"),
            Err(SchemaError::UnknownMessage(name)) if name == "Nope"
        ));
    }

    #[test]
    fn rejects_duplicate_numbers_and_names() {
        let desc = SchemaDescription::new("bad").message(
            MessageDef::new("M")
                .field(FieldDef::scalar("a", 1, ScalarKind::String))
                .field(FieldDef::scalar("b", 1, ScalarKind::String))
                .field(FieldDef::scalar("a", 2, ScalarKind::Int32)),
        );
        let violations = invalid(desc);
        assert!(violations.mentions("duplicate field number 1"));
        assert!(violations.mentions("duplicate field name 'a'"));
    }

    #[test]
    fn rejects_json_name_collision() {
        let desc = SchemaDescription::new("bad").message(
            MessageDef::new("M")
                .field(FieldDef::scalar("page_number", 1, ScalarKind::Int32))
                .field(FieldDef::scalar("pageNumber", 2, ScalarKind::Int32)),
        );
        assert!(invalid(desc).mentions("JSON name 'pageNumber'"));
    }

    #[test]
    fn rejects_out_of_range_and_reserved_numbers() {
        let desc = SchemaDescription::new("bad").message(
            MessageDef::new("M")
                .field(FieldDef::scalar("zero", 0, ScalarKind::Int32))
                .field(FieldDef::scalar("huge", MAX_FIELD_NUMBER + 1, ScalarKind::Int32))
                .field(FieldDef::scalar("reserved", 19_500, ScalarKind::Int32)),
        );
        let violations = invalid(desc);
        assert_eq!(violations.len(), 3);
        assert!(violations.mentions("reserved number 19500"));
    }

    #[test]
    fn rejects_unresolved_and_misdirected_references() {
        let desc = SchemaDescription::new("bad")
            .message(
                MessageDef::new("M")
                    .field(FieldDef::message("a", 1, "Missing"))
                    .field(FieldDef::enumeration("b", 2, "N")),
            )
            .message(MessageDef::new("N"));
        let violations = invalid(desc);
        assert!(violations.mentions("undeclared message 'Missing'"));
        assert!(violations.mentions("undeclared enum 'N'"));
    }

    #[test]
    fn rejects_bad_map_keys_presence_and_packing() {
        let desc = SchemaDescription::new("bad").message(
            MessageDef::new("M")
                .field(FieldDef::scalar("a", 1, ScalarKind::String).map(ScalarKind::Double))
                .field(
                    FieldDef::scalar("b", 2, ScalarKind::String)
                        .repeated()
                        .optional(),
                )
                .field(
                    FieldDef::scalar("c", 3, ScalarKind::String)
                        .repeated()
                        .packed(true),
                ),
        );
        let violations = invalid(desc);
        assert!(violations.mentions("invalid key type double"));
        assert!(violations.mentions("cannot track presence"));
        assert!(violations.mentions("marked packed"));
    }

    #[test]
    fn rejects_enum_without_zero_and_name_clash() {
        let desc = SchemaDescription::new("bad")
            .message(MessageDef::new("Color"))
            .enumeration(EnumDef::new("Color").value("RED", 1).value("RED", 2));
        let violations = invalid(desc);
        assert!(violations.mentions("same name as a message"));
        assert!(violations.mentions("duplicate value name 'RED'"));
        assert!(violations.mentions("no zero value"));
    }

    #[test]
    fn zero_values_follow_presence() {
        let registry = Registry::new(user_schema()).unwrap();
        let user = registry.message_by_name("User").unwrap();
        let zero = |name: &str| registry.zero_value(user.field_by_name(name).unwrap());
        assert_eq!(zero("id"), Some(Value::String(String::new())));
        assert_eq!(zero("roles"), Some(Value::List(vec![])));
        assert_eq!(zero("kind"), Some(Value::Enum(0)));
        assert_eq!(zero("nickname"), None);
        assert_eq!(zero("created_at"), None);
    }

    #[test]
    fn equivalence_treats_omitted_defaults_as_zero() {
        let registry = Registry::new(user_schema()).unwrap();
        let sparse = MessageValue::new("User").with("id", "u1");
        let explicit = MessageValue::new("User")
            .with("id", "u1")
            .with("username", "")
            .with("roles", Value::List(vec![]))
            .with("page_number", 0i32);
        assert!(registry.equivalent(&sparse, &explicit));

        let with_nickname = sparse.clone().with("nickname", "");
        assert!(!registry.equivalent(&sparse, &with_nickname));
    }

    #[test]
    fn equivalence_recurses_and_accepts_json_names() {
        let registry = Registry::new(user_schema()).unwrap();
        let a = MessageValue::new("User")
            .with("created_at", MessageValue::new("Timestamp").with("seconds", 5i64))
            .with("pageNumber", 3i32);
        let b = MessageValue::new("User")
            .with(
                "created_at",
                MessageValue::new("Timestamp")
                    .with("seconds", 5i64)
                    .with("nanos", 0i32),
            )
            .with("page_number", 3i32);
        assert!(registry.equivalent(&a, &b));
    }

    #[test]
    fn declared_name_wins_over_custom_json_name() {
        let desc = SchemaDescription::new("demo").message(
            MessageDef::new("M")
                .field(FieldDef::scalar("a", 1, ScalarKind::Int32).with_json_name("zz")),
        );
        let registry = Registry::new(desc).unwrap();
        let both = MessageValue::new("M").with("a", 1i32).with("zz", 2i32);
        assert_eq!(registry.normalize(&both).get_i32("a"), Some(1));
        assert!(registry.equivalent(&both, &MessageValue::new("M").with("a", 1i32)));
        assert!(!registry.equivalent(&both, &MessageValue::new("M").with("a", 2i32)));
    }

    #[test]
    fn equivalence_compares_floats_bitwise() {
        let desc = SchemaDescription::new("f").message(
            MessageDef::new("F").field(FieldDef::scalar("x", 1, ScalarKind::Double)),
        );
        let registry = Registry::new(desc).unwrap();
        let nan = MessageValue::new("F").with("x", f64::NAN);
        assert!(registry.equivalent(&nan, &nan.clone()));
        let neg_zero = MessageValue::new("F").with("x", -0.0f64);
        let absent = MessageValue::new("F");
        assert!(!registry.equivalent(&neg_zero, &absent));
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
