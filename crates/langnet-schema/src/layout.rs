//! # Layout Tables
//!
//! The compiled, index-resolved form of a schema. One [`MessageLayout`] per
//! message, one [`EnumLayout`] per enum. Type references are resolved to
//! [`MessageId`]/[`EnumId`] indices when the registry is built, so codecs
//! never look a type up by name while walking a payload.

use std::collections::HashMap;

use crate::model::ScalarKind;

/// Index of a message layout within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub(crate) usize);

impl MessageId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Index of an enum layout within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumId(pub(crate) usize);

impl EnumId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A field type with references resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedType {
    Scalar(ScalarKind),
    Enum(EnumId),
    Message(MessageId),
}

impl ResolvedType {
    /// True when values of this type can share one packed run.
    pub fn is_packable(&self) -> bool {
        match self {
            ResolvedType::Scalar(kind) => kind.is_packable(),
            ResolvedType::Enum(_) => true,
            ResolvedType::Message(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Singular,
    Repeated,
    /// Map from `key` to the field's value type.
    Map { key: ScalarKind },
}

/// One field of a compiled message.
#[derive(Debug, Clone)]
pub struct FieldLayout {
    pub(crate) name: String,
    pub(crate) json_name: String,
    pub(crate) qualified_name: String,
    pub(crate) number: u32,
    pub(crate) ty: ResolvedType,
    pub(crate) cardinality: Cardinality,
    pub(crate) has_presence: bool,
    pub(crate) packed: bool,
}

impl FieldLayout {
    /// Declared field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// lowerCamelCase (or overridden) JSON name.
    pub fn json_name(&self) -> &str {
        &self.json_name
    }

    /// `Message.field`, for error messages.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Element type. For maps this is the value type.
    pub fn ty(&self) -> ResolvedType {
        self.ty
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }

    pub fn is_map(&self) -> bool {
        matches!(self.cardinality, Cardinality::Map { .. })
    }

    /// Whether "unset" is distinguishable from "set to zero". Singular
    /// message fields always track presence.
    pub fn has_presence(&self) -> bool {
        self.has_presence
    }

    /// Whether repeated elements are emitted as one packed run.
    pub fn is_packed(&self) -> bool {
        self.packed
    }
}

/// A compiled message with O(1) lookups by number and by name.
#[derive(Debug, Clone)]
pub struct MessageLayout {
    pub(crate) id: MessageId,
    pub(crate) name: String,
    pub(crate) fields: Vec<FieldLayout>,
    pub(crate) by_number: HashMap<u32, usize>,
    pub(crate) by_name: HashMap<String, usize>,
}

impl MessageLayout {
    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in ascending field-number order.
    pub fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldLayout> {
        self.by_number.get(&number).map(|&i| &self.fields[i])
    }

    /// Looks a field up by declared name or JSON name.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldLayout> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }
}

/// A compiled enum. Name→number is total over declared names; number→name
/// is partial (unknown numbers have no name). When several names share a
/// number the first declared name wins.
#[derive(Debug, Clone)]
pub struct EnumLayout {
    pub(crate) id: EnumId,
    pub(crate) name: String,
    pub(crate) values: Vec<(String, i32)>,
    pub(crate) by_name: HashMap<String, i32>,
    pub(crate) by_number: HashMap<i32, usize>,
}

impl EnumLayout {
    pub fn id(&self) -> EnumId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared `(name, number)` pairs in declaration order.
    pub fn values(&self) -> &[(String, i32)] {
        &self.values
    }

    pub fn name_of(&self, number: i32) -> Option<&str> {
        self.by_number
            .get(&number)
            .map(|&i| self.values[i].0.as_str())
    }

    pub fn number_of(&self, name: &str) -> Option<i32> {
        self.by_name.get(name).copied()
    }
}
