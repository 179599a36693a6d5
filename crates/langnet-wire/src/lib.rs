//! # langnet-wire: Binary Wire Codec
//!
//! Encodes and decodes [`MessageValue`]s in the compact binary format every
//! LangNet implementation shares. The format is the contract between
//! languages: the same value must produce the same bytes everywhere.
//!
//! ## Format
//!
//! Each present field is a tag `(number << 3) | wire_type` followed by its
//! payload:
//!
//! | Wire type | Id | Used for |
//! |---|---|---|
//! | `Varint` | 0 | int32/64, uint32/64, sint32/64 (zig-zag), bool, enum |
//! | `Fixed64` | 1 | fixed64, sfixed64, double (little-endian) |
//! | `Len` | 2 | string, bytes, nested messages, map entries, packed runs |
//! | `Fixed32` | 5 | fixed32, sfixed32, float (little-endian) |
//!
//! Fields are written in ascending field-number order. Implicit-presence
//! fields holding their zero value are omitted. Map entries are nested
//! two-field messages `{key = 1, value = 2}`, one per entry.
//!
//! ## Decoding
//!
//! - Unknown field numbers are skipped and dropped, never an error.
//! - Every length prefix is checked against the remaining input before any
//!   slice or allocation is made.
//! - Decoding either returns a complete value or an error; nothing partial.
//!
//! ## Crate Policy
//!
//! - Depends only on `langnet-core` and `langnet-schema` internally.
//! - No `unsafe` code.

pub mod decode;
pub mod encode;
pub mod inspect;
pub mod reader;
pub mod varint;
pub mod wire_type;
pub mod writer;

pub use decode::{decode, decode_with, DecodeOptions, DEFAULT_MAX_DEPTH};
pub use encode::{encode, encode_into};
pub use inspect::{inspect, RawField, RawValue};
pub use reader::WireReader;
pub use wire_type::{make_tag, WireType};
pub use writer::WireWriter;

#[doc(no_inline)]
pub use langnet_core::{EncodeError, MessageValue, WireError};
