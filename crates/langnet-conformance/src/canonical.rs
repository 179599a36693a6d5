//! # Canonical Payloads and Digests
//!
//! Two implementations agree on a payload when their canonical bytes are
//! identical. Binary payloads are already canonical: the wire format is the
//! cross-language contract down to the byte. JSON payloads are parsed and
//! re-serialized with `serde_jcs` (RFC 8785: sorted keys, compact
//! separators, normalized numbers) so whitespace and key order do not count
//! as disagreement.
//!
//! ## Invariant
//!
//! [`PayloadDigest`] is computed only from a [`CanonicalPayload`], so every
//! digest in a report went through the same canonicalization step.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::error::ConformanceError;
use crate::implementation::Format;

/// Payload bytes in the canonical form for their format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPayload(Vec<u8>);

impl CanonicalPayload {
    pub fn new(format: Format, payload: &[u8]) -> Result<Self, ConformanceError> {
        match format {
            Format::Binary => Ok(Self(payload.to_vec())),
            Format::Json => {
                let value = langnet_text::parse(payload)?;
                let text = serde_jcs::to_string(&value).map_err(ConformanceError::Canonicalization)?;
                Ok(Self(text.into_bytes()))
            }
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn digest(&self) -> PayloadDigest {
        let hash = Sha256::digest(&self.0);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        PayloadDigest(bytes)
    }
}

impl AsRef<[u8]> for CanonicalPayload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// SHA-256 of a canonical payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayloadDigest([u8; 32]);

impl PayloadDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// First eight bytes of the hex form, for reports.
    pub fn short(&self) -> String {
        self.to_hex()[..16].to_string()
    }
}

impl fmt::Display for PayloadDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}
