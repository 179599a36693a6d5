//! # langnet-runtime: Message Runtime
//!
//! Native Rust structs for schema messages, bound to the generic codecs
//! through the [`Message`] trait. A struct converts to and from a
//! [`MessageValue`]; the trait's provided methods do the rest.
//!
//! ```text
//! User ──to_value──▶ MessageValue ──langnet-wire──▶ bytes
//!  ▲                                ──langnet-text──▶ JSON
//!  └──from_value── MessageValue ◀── decode
//! ```
//!
//! ## Modules
//!
//! - [`message`]: the [`Message`] trait.
//! - [`fields`]: typed accessors used by `from_value` implementations.
//! - [`langnet`]: the bundled LangNet schema and its message structs.

pub mod fields;
pub mod langnet;
pub mod message;

pub use fields::FieldReader;
pub use message::Message;

#[doc(no_inline)]
pub use langnet_core::{MessageValue, RuntimeError};
#[doc(no_inline)]
pub use langnet_text::TextOptions;
