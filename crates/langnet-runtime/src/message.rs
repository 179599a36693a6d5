//! The [`Message`] trait.

use langnet_core::{MessageValue, RuntimeError};
use langnet_schema::Registry;
use langnet_text::TextOptions;

/// A native struct bound to one schema message.
///
/// Implementors provide the conversions to and from [`MessageValue`]; the
/// codec entry points are provided on top of them and take the registry
/// explicitly.
pub trait Message: Sized {
    /// Schema name of the bound message.
    const NAME: &'static str;

    fn to_value(&self) -> MessageValue;

    /// Build the struct from a value of message [`Self::NAME`]. Absent
    /// fields take their zero value.
    fn from_value(value: &MessageValue) -> Result<Self, RuntimeError>;

    fn encode_to_vec(&self, registry: &Registry) -> Result<Vec<u8>, RuntimeError> {
        Ok(langnet_wire::encode(registry, &self.to_value())?)
    }

    fn decode(registry: &Registry, bytes: &[u8]) -> Result<Self, RuntimeError> {
        let value = langnet_wire::decode(registry, Self::NAME, bytes)?;
        Self::from_value(&value)
    }

    fn to_json(&self, registry: &Registry, options: &TextOptions) -> Result<String, RuntimeError> {
        Ok(langnet_text::encode_string(
            registry,
            &self.to_value(),
            options,
        )?)
    }

    fn from_json(registry: &Registry, text: &str) -> Result<Self, RuntimeError> {
        let value = langnet_text::decode(registry, Self::NAME, text)?;
        Self::from_value(&value)
    }
}
