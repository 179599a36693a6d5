//! # langnet-conformance: Cross-Language Conformance Harness
//!
//! Checks that every LangNet implementation reads what every other one
//! writes. An [`Implementation`] is either the codecs of this workspace
//! ([`NativeImplementation`]) or another program speaking the `langnet`
//! CLI protocol ([`ExternalImplementation`]), typically a Python or Zig
//! build of the same schema.
//!
//! ```text
//!            ┌── write ──▶ payload ──┬── read (rust)   ──▶ equivalent?
//! fixture ───┤                       ├── read (python) ──▶ equivalent?
//!            └── digest of canonical payload, compared across writers
//! ```
//!
//! ## Modules
//!
//! - [`fixtures`]: suites of schema plus fixture values.
//! - [`implementation`]: the [`Implementation`] trait and the in-process codecs.
//! - [`external`]: implementations behind a child process.
//! - [`harness`]: the writer × reader × format matrix and its report.
//! - [`canonical`]: canonical payload bytes and SHA-256 digests.

pub mod canonical;
pub mod error;
pub mod external;
pub mod fixtures;
pub mod harness;
pub mod implementation;

pub use canonical::{CanonicalPayload, PayloadDigest};
pub use error::ConformanceError;
pub use external::ExternalImplementation;
pub use fixtures::{Fixture, Suite};
pub use harness::{CaseFailure, ConformanceReport, Divergence, Harness};
pub use implementation::{Format, Implementation, NativeImplementation};
