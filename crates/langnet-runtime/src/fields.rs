//! Typed field access for [`Message`] implementations.
//!
//! [`FieldReader`] pulls typed fields out of a [`MessageValue`], mapping an
//! absent field to its zero value and a field of the wrong kind to
//! [`RuntimeError::FieldType`]. The free functions build the [`Value`]s that
//! `to_value` implementations store.

use std::collections::BTreeMap;

use langnet_core::{MapKey, MessageValue, RuntimeError, Value};

use crate::message::Message;

/// Read-only typed view over the fields of one message value.
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    message: &'static str,
    value: &'a MessageValue,
}

impl<'a> FieldReader<'a> {
    /// Checks that `value` is an instance of `M` before handing out fields.
    pub fn new<M: Message>(value: &'a MessageValue) -> Result<Self, RuntimeError> {
        if value.message() != M::NAME {
            return Err(RuntimeError::MessageMismatch {
                expected: M::NAME,
                found: value.message().to_string(),
            });
        }
        Ok(Self {
            message: M::NAME,
            value,
        })
    }

    fn wrong_kind(&self, field: &'static str, expected: &'static str, found: &Value) -> RuntimeError {
        RuntimeError::FieldType {
            message: self.message,
            field,
            expected,
            found: found.kind_name(),
        }
    }

    pub fn string(&self, field: &'static str) -> Result<String, RuntimeError> {
        match self.value.get(field) {
            None => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(self.wrong_kind(field, "string", other)),
        }
    }

    pub fn int32(&self, field: &'static str) -> Result<i32, RuntimeError> {
        match self.value.get(field) {
            None => Ok(0),
            Some(Value::I32(n)) => Ok(*n),
            Some(other) => Err(self.wrong_kind(field, "i32", other)),
        }
    }

    pub fn int64(&self, field: &'static str) -> Result<i64, RuntimeError> {
        match self.value.get(field) {
            None => Ok(0),
            Some(Value::I64(n)) => Ok(*n),
            Some(other) => Err(self.wrong_kind(field, "i64", other)),
        }
    }

    /// Enum fields keep numbers without a symbolic name; `E` decides how to
    /// represent them.
    pub fn enumeration<E: From<i32>>(&self, field: &'static str) -> Result<E, RuntimeError> {
        match self.value.get(field) {
            None => Ok(E::from(0)),
            Some(Value::Enum(n)) => Ok(E::from(*n)),
            Some(other) => Err(self.wrong_kind(field, "enum", other)),
        }
    }

    /// A singular message field. `None` when unset.
    pub fn message<M: Message>(&self, field: &'static str) -> Result<Option<M>, RuntimeError> {
        match self.value.get(field) {
            None => Ok(None),
            Some(Value::Message(m)) => M::from_value(m).map(Some),
            Some(other) => Err(self.wrong_kind(field, "message", other)),
        }
    }

    pub fn strings(&self, field: &'static str) -> Result<Vec<String>, RuntimeError> {
        self.list(field)?
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(self.wrong_kind(field, "string", other)),
            })
            .collect()
    }

    pub fn messages<M: Message>(&self, field: &'static str) -> Result<Vec<M>, RuntimeError> {
        self.list(field)?
            .iter()
            .map(|item| match item {
                Value::Message(m) => M::from_value(m),
                other => Err(self.wrong_kind(field, "message", other)),
            })
            .collect()
    }

    pub fn string_map(&self, field: &'static str) -> Result<BTreeMap<String, String>, RuntimeError> {
        let entries = match self.value.get(field) {
            None => return Ok(BTreeMap::new()),
            Some(Value::Map(entries)) => entries,
            Some(other) => return Err(self.wrong_kind(field, "map", other)),
        };
        entries
            .iter()
            .map(|(k, v)| match (k, v) {
                (MapKey::String(k), Value::String(v)) => Ok((k.clone(), v.clone())),
                (MapKey::String(_), other) => Err(self.wrong_kind(field, "string", other)),
                (other, _) => Err(self.wrong_kind(field, "string key", &other.to_value())),
            })
            .collect()
    }

    fn list(&self, field: &'static str) -> Result<&'a [Value], RuntimeError> {
        match self.value.get(field) {
            None => Ok(&[]),
            Some(Value::List(items)) => Ok(items.as_slice()),
            Some(other) => Err(self.wrong_kind(field, "list", other)),
        }
    }
}

pub fn string_list(items: &[String]) -> Value {
    Value::List(items.iter().cloned().map(Value::String).collect())
}

pub fn string_map(map: &BTreeMap<String, String>) -> Value {
    Value::Map(
        map.iter()
            .map(|(k, v)| (MapKey::String(k.clone()), Value::String(v.clone())))
            .collect(),
    )
}

pub fn message_list<M: Message>(items: &[M]) -> Value {
    Value::List(items.iter().map(|m| Value::Message(m.to_value())).collect())
}
