//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types used throughout LangNet. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Decode errors carry enough context (message, field, byte counts) to
//!   locate the defect in a payload produced by another language.
//! - Unknown fields and unknown JSON keys are never errors.
//! - The first fatal error aborts the whole decode; callers never observe a
//!   partially decoded value.

use std::fmt;

use thiserror::Error;

/// Top-level error type for LangNet.
#[derive(Error, Debug)]
pub enum LangnetError {
    /// The schema description was rejected or a message name did not resolve.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Binary payload could not be decoded.
    #[error("wire decode error: {0}")]
    Wire(#[from] WireError),

    /// A message value could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// JSON payload could not be decoded.
    #[error("text decode error: {0}")]
    Text(#[from] TextError),

    /// A native struct could not be built from a message value.
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error building a registry from a schema description, or resolving a
/// message against it.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The description violates one or more structural rules.
    #[error("invalid schema '{package}':\n{violations}")]
    Invalid {
        /// Package name of the rejected description.
        package: String,
        /// Every rule violation found, in discovery order.
        violations: SchemaViolations,
    },

    /// The message type is not part of the registry.
    #[error("unknown message type '{0}'")]
    UnknownMessage(String),

    /// A descriptor file could not be read or deserialized.
    #[error("schema load error for '{path}': {reason}")]
    Load {
        /// Path to the descriptor that failed to load.
        path: String,
        /// Reason the descriptor could not be loaded.
        reason: String,
    },
}

/// Collection of schema rule violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaViolations {
    violations: Vec<String>,
}

impl SchemaViolations {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation.
    pub fn push(&mut self, violation: impl Into<String>) {
        self.violations.push(violation.into());
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// Returns true if any violation message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.violations.iter().any(|v| v.contains(needle))
    }
}

impl fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {v}")?;
        }
        Ok(())
    }
}

/// Error decoding the binary wire format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// A length prefix or varint ran past the end of the input.
    #[error("truncated input: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required to continue.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },

    /// The tag's wire type disagrees with the declared field type.
    #[error("wire type mismatch for field '{field}' (#{number}): expected {expected}, found {actual}")]
    WireTypeMismatch {
        /// Qualified field name (`Message.field`).
        field: String,
        /// Field number from the tag.
        number: u32,
        /// Wire type id implied by the schema.
        expected: u8,
        /// Wire type id found on the stream.
        actual: u8,
    },

    /// A `string` field held bytes that are not valid UTF-8.
    #[error("invalid UTF-8 in text field '{field}'")]
    InvalidTextEncoding {
        /// Qualified field name.
        field: String,
    },

    /// A map key decoded to a kind that cannot key a map.
    #[error("map field '{field}' cannot be keyed by {kind}")]
    InvalidMapKey {
        /// Qualified field name.
        field: String,
        /// Kind of the decoded key.
        kind: &'static str,
    },

    /// A varint used more than ten bytes or overflowed 64 bits.
    #[error("varint exceeds 64 bits")]
    VarintOverflow,

    /// A tag carried field number zero or a number above the 29-bit range.
    #[error("invalid tag {0:#x}")]
    InvalidTag(u64),

    /// A wire type id that is not part of the format, or an unmatched end-group.
    #[error("invalid wire type {0}")]
    InvalidWireType(u8),

    /// Nested messages exceeded the configured depth.
    #[error("nesting exceeds recursion limit of {0}")]
    RecursionLimit(usize),

    /// The requested message type is not part of the registry.
    #[error("unknown message type '{0}'")]
    UnknownMessage(String),
}

/// Error encoding a message value. Encoding a well-typed value never fails;
/// these describe malformed value graphs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The value stored under a field is not of the field's declared kind.
    #[error("type mismatch for field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Qualified field name.
        field: String,
        /// Declared type.
        expected: String,
        /// Kind of the value that was supplied.
        found: &'static str,
    },

    /// The value sets a field its message does not declare.
    #[error("message '{message}' has no field named '{field}'")]
    UnknownField {
        /// Message type name.
        message: String,
        /// Offending field name.
        field: String,
    },

    /// A nested message value names a different message type than the field.
    #[error("field '{field}' expects message '{expected}', found '{found}'")]
    MessageMismatch {
        /// Qualified field name.
        field: String,
        /// Declared message type.
        expected: String,
        /// Message type named by the value.
        found: String,
    },

    /// A map entry is structurally malformed.
    #[error("malformed map entry in '{field}': {reason}")]
    MalformedMapEntry {
        /// Qualified field name.
        field: String,
        /// What was wrong with the entry.
        reason: String,
    },

    /// The value names a message type that is not part of the registry.
    #[error("unknown message type '{0}'")]
    UnknownMessage(String),
}

/// Error decoding the JSON text form.
#[derive(Error, Debug)]
pub enum TextError {
    /// The input is not well-formed JSON.
    #[error("malformed JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    /// A JSON value's shape is incompatible with the declared field type.
    #[error("type error at '{path}': expected {expected}, found {found}")]
    Type {
        /// Dotted path to the offending value.
        path: String,
        /// Declared type.
        expected: String,
        /// Description of the JSON value found.
        found: String,
    },

    /// Nested objects exceeded the depth limit.
    #[error("nesting exceeds recursion limit of {0}")]
    RecursionLimit(usize),

    /// The requested message type is not part of the registry.
    #[error("unknown message type '{0}'")]
    UnknownMessage(String),
}

/// Error moving between a native struct and a [`crate::MessageValue`].
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The value describes a different message type.
    #[error("expected message '{expected}', found '{found}'")]
    MessageMismatch {
        /// Message type the native struct binds to.
        expected: &'static str,
        /// Message type named by the value.
        found: String,
    },

    /// A field held a value of the wrong kind.
    #[error("field '{message}.{field}' should hold {expected}, found {found}")]
    FieldType {
        /// Message type name.
        message: &'static str,
        /// Field name.
        field: &'static str,
        /// Expected kind.
        expected: &'static str,
        /// Kind found.
        found: &'static str,
    },

    /// Binary decode failed.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// Encoding failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// JSON decode failed.
    #[error(transparent)]
    Text(#[from] TextError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violations_display_one_per_line() {
        let mut v = SchemaViolations::new();
        v.push("duplicate field number 1 in 'User'");
        v.push("unresolved message 'Missing'");
        let rendered = v.to_string();
        assert_eq!(rendered.lines().count(), 2);
        assert!(rendered.starts_with("  duplicate"));
        assert!(v.mentions("Missing"));
        assert!(!v.mentions("Absent"));
    }

    #[test]
    fn schema_error_lists_violations() {
        let mut violations = SchemaViolations::new();
        violations.push("enum 'Color' has no zero value");
        let err = SchemaError::Invalid {
            package: "demo".to_string(),
            violations,
        };
        let msg = err.to_string();
        assert!(msg.contains("invalid schema 'demo'"));
        assert!(msg.contains("no zero value"));
    }

    #[test]
    fn wire_errors_render_context() {
        let err = WireError::WireTypeMismatch {
            field: "User.id".to_string(),
            number: 1,
            expected: 2,
            actual: 0,
        };
        assert_eq!(
            err.to_string(),
            "wire type mismatch for field 'User.id' (#1): expected 2, found 0"
        );
        let err = WireError::Truncated {
            needed: 5,
            available: 2,
        };
        assert_eq!(err.to_string(), "truncated input: need 5 bytes, have 2");
        let err = WireError::InvalidMapKey {
            field: "Scores.by_ratio".to_string(),
            kind: "f64",
        };
        assert_eq!(
            err.to_string(),
            "map field 'Scores.by_ratio' cannot be keyed by f64"
        );
    }

    #[test]
    fn umbrella_error_wraps_sources() {
        let err: LangnetError = WireError::VarintOverflow.into();
        assert!(matches!(err, LangnetError::Wire(WireError::VarintOverflow)));
        let err: LangnetError = SchemaError::UnknownMessage("Nope".into()).into();
        assert!(err.to_string().contains("Nope"));
    }

    #[test]
    fn text_syntax_error_from_serde() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: TextError = parse_err.into();
        assert!(matches!(err, TextError::Syntax(_)));
    }
}
