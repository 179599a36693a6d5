//! Implementations under test.

use std::fmt;
use std::sync::Arc;

use langnet_core::MessageValue;
use langnet_schema::Registry;
use langnet_text::TextOptions;

use crate::error::ConformanceError;
use crate::fixtures::Fixture;

/// Payload encoding exercised by a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Format {
    Binary,
    Json,
}

impl Format {
    pub const ALL: [Format; 2] = [Format::Binary, Format::Json];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Json => "json",
        }
    }

    /// File extension used when payloads are written to disk.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Binary => "bin",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One codec implementation, in this process or another.
///
/// `write` turns a fixture into a payload; `read` turns a payload produced
/// by any implementation back into a message value.
pub trait Implementation {
    fn name(&self) -> &str;

    fn write(&self, fixture: &Fixture, format: Format) -> Result<Vec<u8>, ConformanceError>;

    fn read(
        &self,
        message: &str,
        payload: &[u8],
        format: Format,
    ) -> Result<MessageValue, ConformanceError>;
}

/// The codecs of this workspace, called in-process.
#[derive(Debug, Clone)]
pub struct NativeImplementation {
    registry: Arc<Registry>,
}

impl NativeImplementation {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

impl Implementation for NativeImplementation {
    fn name(&self) -> &str {
        "rust"
    }

    fn write(&self, fixture: &Fixture, format: Format) -> Result<Vec<u8>, ConformanceError> {
        let payload = match format {
            Format::Binary => langnet_wire::encode(&self.registry, &fixture.message)?,
            Format::Json => langnet_text::encode_string(
                &self.registry,
                &fixture.message,
                &TextOptions::default(),
            )?
            .into_bytes(),
        };
        Ok(payload)
    }

    fn read(
        &self,
        message: &str,
        payload: &[u8],
        format: Format,
    ) -> Result<MessageValue, ConformanceError> {
        let value = match format {
            Format::Binary => langnet_wire::decode(&self.registry, message, payload)?,
            Format::Json => {
                let value = langnet_text::parse(payload)?;
                langnet_text::decode_value(&self.registry, message, &value)?
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use langnet_runtime::langnet;

    #[test]
    fn native_round_trips_both_formats() {
        let registry = Arc::new(langnet::registry().unwrap());
        let native = NativeImplementation::new(registry.clone());
        let fixture = Fixture::new(
            "search",
            MessageValue::new("SearchRequest")
                .with("query", "zig")
                .with("page_number", 2),
        );
        for format in Format::ALL {
            let payload = native.write(&fixture, format).unwrap();
            let back = native.read("SearchRequest", &payload, format).unwrap();
            assert!(registry.equivalent(&back, &fixture.message), "{format}");
        }
    }

    #[test]
    fn native_read_reports_codec_errors() {
        let registry = Arc::new(langnet::registry().unwrap());
        let native = NativeImplementation::new(registry);
        assert!(matches!(
            native.read("SearchRequest", &[0x0a, 0x05, b'a'], Format::Binary),
            Err(ConformanceError::Wire(_))
        ));
        assert!(matches!(
            native.read("SearchRequest", b"[1,", Format::Json),
            Err(ConformanceError::Text(_))
        ));
    }

    #[test]
    fn format_names() {
        assert_eq!(Format::Binary.to_string(), "binary");
        assert_eq!(Format::Json.extension(), "json");
    }
}
