//! # langnet-text: JSON Text Codec
//!
//! The human-readable twin of `langnet-wire`. Objects are keyed by field
//! name rather than number, so the text form survives field renumbering but
//! not renaming.
//!
//! ## Conventions
//!
//! | Field type | JSON form |
//! |---|---|
//! | int32, uint32, sint32, fixed32, sfixed32 | number |
//! | int64, uint64, sint64, fixed64, sfixed64 | decimal string |
//! | float, double | number, or `"NaN"` / `"Infinity"` / `"-Infinity"` |
//! | bool | `true` / `false` |
//! | string | string |
//! | bytes | standard base64 string |
//! | enum | symbolic name, or the number when it has no name |
//! | message | object |
//! | repeated | array |
//! | map | object keyed by the key's text form |
//!
//! Encoding writes declared field names. Decoding accepts declared names and
//! lowerCamelCase JSON names, ignores unknown keys, and treats `null` as an
//! absent field.
//!
//! ## Nesting
//!
//! [`parse`] bounds bracket nesting to what [`MAX_DEPTH`] nested messages
//! can need (two levels per message, for a repeated or map field plus the
//! object), so every value the binary codec decodes also decodes from text.
//!
//! ## Crate Policy
//!
//! - Produces and consumes `serde_json::Value`; string rendering is a thin
//!   layer on top.
//! - No `unsafe` code.

pub mod decode;
pub mod encode;

pub use decode::{decode, decode_value, parse, MAX_DEPTH};
pub use encode::{encode_string, encode_value, TextOptions};

#[doc(no_inline)]
pub use langnet_core::{EncodeError, TextError};
