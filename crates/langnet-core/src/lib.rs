//! # langnet-core: Foundational Types for LangNet
//!
//! This crate is the leaf of the LangNet workspace. It defines the runtime
//! representation of a message instance and the error taxonomy that every
//! codec reports through. Every other crate depends on `langnet-core`; it
//! depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One dynamic value model.** `MessageValue` maps field names to
//!    [`Value`]s. Both the binary and the JSON codec produce and consume it,
//!    so "decode binary" and "decode JSON" can be compared structurally.
//!
//! 2. **Deterministic maps.** Map fields use `BTreeMap<MapKey, Value>`, so a
//!    single value always iterates (and therefore encodes) in the same order.
//!
//! 3. **Owned data only.** Decoded values never borrow from the input buffer.
//!
//! 4. **Typed failures.** Decode errors are whole-operation failures. No
//!    partially populated value is ever handed back to a caller.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `langnet-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod value;

pub use error::{
    EncodeError, LangnetError, RuntimeError, SchemaError, SchemaViolations, TextError, WireError,
};
pub use value::{MapKey, MessageValue, Value};
