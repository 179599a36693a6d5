//! Error type for the conformance harness.
//!
//! Codec failures inside a case are not errors of the harness: they are
//! recorded in the report. `ConformanceError` covers everything that stops
//! an implementation from producing or consuming a payload at all.

use std::process::ExitStatus;

use langnet_core::{EncodeError, SchemaError, TextError, WireError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConformanceError {
    /// A suite's schema failed to build a registry.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Encoding a fixture failed.
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),

    /// Decoding a binary payload failed.
    #[error("binary decode failed: {0}")]
    Wire(#[from] WireError),

    /// Decoding a JSON payload failed.
    #[error("JSON decode failed: {0}")]
    Text(#[from] TextError),

    /// A JSON payload could not be brought into canonical form.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[source] serde_json::Error),

    /// An external implementation could not be started or talked to.
    #[error("failed to run '{program}': {source}")]
    Process {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external implementation exited unsuccessfully.
    #[error("'{program}' exited with {status}: {stderr}")]
    PeerFailed {
        program: String,
        status: ExitStatus,
        /// Trimmed standard error of the peer.
        stderr: String,
    },
}
