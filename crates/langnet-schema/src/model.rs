//! # Schema Description
//!
//! Records describing messages, fields and enums as an external schema
//! parser produces them. Immutable once handed to [`crate::Registry::new`].
//!
//! ## Descriptor Files
//!
//! The serde form is flat so descriptors read naturally in YAML:
//!
//! ```yaml
//! package: langnet
//! messages:
//!   - name: User
//!     fields:
//!       - { name: id, number: 1, type: string }
//!       - { name: roles, number: 3, type: string, repeated: true }
//!       - { name: preferences, number: 5, type: string, map_key: string }
//!       - { name: created_at, number: 6, message: Timestamp }
//! ```
//!
//! Exactly one of `type` (a scalar kind), `message` or `enum` names the
//! field's type. `optional: true` turns on presence tracking.

use std::fmt;
use std::path::Path;

use langnet_core::SchemaError;
use serde::{Deserialize, Serialize};

/// Scalar kinds a field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Int32,
    Int64,
    Uint32,
    Uint64,
    /// Zig-zag encoded signed 32-bit integer.
    Sint32,
    /// Zig-zag encoded signed 64-bit integer.
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    Float,
    Double,
    String,
    Bytes,
}

impl ScalarKind {
    /// Returns the schema-language spelling of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Sint32 => "sint32",
            Self::Sint64 => "sint64",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::Sfixed32 => "sfixed32",
            Self::Sfixed64 => "sfixed64",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }

    /// True for kinds that can be packed into a single length-delimited run.
    pub fn is_packable(&self) -> bool {
        !matches!(self, Self::String | Self::Bytes)
    }

    /// True for kinds allowed as map keys: integral kinds, bool and string.
    pub fn is_valid_map_key(&self) -> bool {
        !matches!(self, Self::Float | Self::Double | Self::Bytes)
    }

    /// True for 64-bit integer kinds, which the JSON form spells as strings.
    pub fn is_64bit_integer(&self) -> bool {
        matches!(
            self,
            Self::Int64 | Self::Uint64 | Self::Sint64 | Self::Fixed64 | Self::Sfixed64
        )
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The declared type of a field, before references are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarKind),
    /// Reference to an enum by name.
    Enum(String),
    /// Reference to a message by name.
    Message(String),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(kind) => write!(f, "{kind}"),
            FieldType::Enum(name) | FieldType::Message(name) => f.write_str(name),
        }
    }
}

/// Repetition of a field. For maps, the field's type is the value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Singular,
    Repeated,
    Map { key: ScalarKind },
}

/// Whether an unset field is distinguishable from one set to its zero value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presence {
    /// Set/unset is tracked.
    Explicit,
    /// Zero values are indistinguishable from absence.
    #[default]
    Implicit,
}

/// A field within a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFieldDef", into = "RawFieldDef")]
pub struct FieldDef {
    pub name: String,
    /// Field number, unique within the message and stable across versions.
    pub number: u32,
    pub ty: FieldType,
    pub label: Label,
    pub presence: Presence,
    /// Overrides default packing of repeated numeric fields.
    pub packed: Option<bool>,
    /// Overrides the derived lowerCamelCase JSON name.
    pub json_name: Option<String>,
}

impl FieldDef {
    fn with_type(name: &str, number: u32, ty: FieldType) -> Self {
        Self {
            name: name.to_string(),
            number,
            ty,
            label: Label::Singular,
            presence: Presence::Implicit,
            packed: None,
            json_name: None,
        }
    }

    /// A singular scalar field with implicit presence.
    pub fn scalar(name: &str, number: u32, kind: ScalarKind) -> Self {
        Self::with_type(name, number, FieldType::Scalar(kind))
    }

    /// A singular field referencing a message type.
    pub fn message(name: &str, number: u32, message: &str) -> Self {
        Self::with_type(name, number, FieldType::Message(message.to_string()))
    }

    /// A singular field referencing an enum type.
    pub fn enumeration(name: &str, number: u32, enumeration: &str) -> Self {
        Self::with_type(name, number, FieldType::Enum(enumeration.to_string()))
    }

    pub fn repeated(mut self) -> Self {
        self.label = Label::Repeated;
        self
    }

    /// Turns the field into a map from `key` to the field's type.
    pub fn map(mut self, key: ScalarKind) -> Self {
        self.label = Label::Map { key };
        self
    }

    /// Enables presence tracking.
    pub fn optional(mut self) -> Self {
        self.presence = Presence::Explicit;
        self
    }

    pub fn packed(mut self, packed: bool) -> Self {
        self.packed = Some(packed);
        self
    }

    pub fn with_json_name(mut self, json_name: &str) -> Self {
        self.json_name = Some(json_name.to_string());
        self
    }

    /// The name used as a JSON key alias: the override if set, otherwise
    /// the lowerCamelCase projection of the declared name.
    pub fn effective_json_name(&self) -> String {
        self.json_name
            .clone()
            .unwrap_or_else(|| json_name(&self.name))
    }
}

/// Flat serde form of [`FieldDef`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFieldDef {
    name: String,
    number: u32,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    scalar: Option<ScalarKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    enumeration: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    repeated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    map_key: Option<ScalarKind>,
    #[serde(default, skip_serializing_if = "is_false")]
    optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    packed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    json_name: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl TryFrom<RawFieldDef> for FieldDef {
    type Error = String;

    fn try_from(raw: RawFieldDef) -> Result<Self, Self::Error> {
        let ty = match (raw.scalar, raw.message, raw.enumeration) {
            (Some(kind), None, None) => FieldType::Scalar(kind),
            (None, Some(message), None) => FieldType::Message(message),
            (None, None, Some(enumeration)) => FieldType::Enum(enumeration),
            _ => {
                return Err(format!(
                    "field '{}' must set exactly one of 'type', 'message' or 'enum'",
                    raw.name
                ))
            }
        };
        let label = match (raw.repeated, raw.map_key) {
            (false, None) => Label::Singular,
            (true, None) => Label::Repeated,
            (false, Some(key)) => Label::Map { key },
            (true, Some(_)) => {
                return Err(format!(
                    "field '{}' cannot be both 'repeated' and a map",
                    raw.name
                ))
            }
        };
        Ok(FieldDef {
            name: raw.name,
            number: raw.number,
            ty,
            label,
            presence: if raw.optional {
                Presence::Explicit
            } else {
                Presence::Implicit
            },
            packed: raw.packed,
            json_name: raw.json_name,
        })
    }
}

impl From<FieldDef> for RawFieldDef {
    fn from(field: FieldDef) -> Self {
        let (scalar, message, enumeration) = match field.ty {
            FieldType::Scalar(kind) => (Some(kind), None, None),
            FieldType::Message(name) => (None, Some(name), None),
            FieldType::Enum(name) => (None, None, Some(name)),
        };
        let (repeated, map_key) = match field.label {
            Label::Singular => (false, None),
            Label::Repeated => (true, None),
            Label::Map { key } => (false, Some(key)),
        };
        RawFieldDef {
            name: field.name,
            number: field.number,
            scalar,
            message,
            enumeration,
            repeated,
            map_key,
            optional: field.presence == Presence::Explicit,
            packed: field.packed,
            json_name: field.json_name,
        }
    }
}

/// A message definition: a named, ordered set of fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl MessageDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }
}

/// One symbolic value of an enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValueDef {
    pub name: String,
    pub number: i32,
}

/// An enum definition. Value 0 is the implicit default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    #[serde(default)]
    pub values: Vec<EnumValueDef>,
}

impl EnumDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, name: &str, number: i32) -> Self {
        self.values.push(EnumValueDef {
            name: name.to_string(),
            number,
        });
        self
    }
}

/// A complete schema: every message and enum that may be referenced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub package: String,
    #[serde(default)]
    pub messages: Vec<MessageDef>,
    #[serde(default)]
    pub enums: Vec<EnumDef>,
}

impl SchemaDescription {
    pub fn new(package: &str) -> Self {
        Self {
            package: package.to_string(),
            messages: Vec::new(),
            enums: Vec::new(),
        }
    }

    pub fn message(mut self, message: MessageDef) -> Self {
        self.messages.push(message);
        self
    }

    pub fn enumeration(mut self, enumeration: EnumDef) -> Self {
        self.enums.push(enumeration);
        self
    }

    /// Parse a YAML descriptor.
    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(text).map_err(|e| SchemaError::Load {
            path: "<yaml>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Parse a JSON descriptor.
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(text).map_err(|e| SchemaError::Load {
            path: "<json>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Load a descriptor file, choosing the format by extension
    /// (`.json` is JSON, anything else is YAML).
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| SchemaError::Load {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        };
        parsed.map_err(|e| match e {
            SchemaError::Load { reason, .. } => SchemaError::Load {
                path: display,
                reason,
            },
            other => other,
        })
    }

    /// Render the description as a YAML descriptor.
    pub fn to_yaml_string(&self) -> Result<String, SchemaError> {
        serde_yaml::to_string(self).map_err(|e| SchemaError::Load {
            path: "<yaml>".to_string(),
            reason: e.to_string(),
        })
    }
}

/// lowerCamelCase projection of a declared field name: underscores are
/// dropped and the letter after each one is upper-cased.
pub fn json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
