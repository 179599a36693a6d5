//! # langnet-schema: Schema Model & Layout Tables
//!
//! Holds the in-memory description of a schema (messages, fields, enums) and
//! compiles it into a [`Registry`] of per-message layout tables that the wire
//! and text codecs consult.
//!
//! ## Schema Description (`model`)
//!
//! The [`model`] module defines the records an external schema parser
//! produces. Descriptions can also be loaded from YAML or JSON descriptor
//! files (see [`SchemaDescription::load`]); this is deserialization of the
//! already-parsed model, not a parser for the schema language itself.
//!
//! ## Registry (`registry`, `layout`)
//!
//! [`Registry::new`] validates a description and resolves every type
//! reference to an index once, up front. After construction the registry is
//! read-only and can be shared across threads without synchronization.
//! There is no global registry: callers construct one and pass it to each
//! codec call.
//!
//! ## Crate Policy
//!
//! - Depends only on `langnet-core` internally.
//! - Lookups by field number and by field name are O(1).
//! - Invalid descriptions are rejected with every violation listed, not just
//!   the first.

pub mod layout;
pub mod model;
pub mod registry;

pub use layout::{
    Cardinality, EnumId, EnumLayout, FieldLayout, MessageId, MessageLayout, ResolvedType,
};
pub use model::{
    json_name, EnumDef, EnumValueDef, FieldDef, FieldType, Label, MessageDef, Presence,
    ScalarKind, SchemaDescription,
};
pub use registry::{scalar_zero, Registry, MAX_FIELD_NUMBER};
