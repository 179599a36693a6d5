use std::collections::BTreeMap;

use langnet_core::{MessageValue, RuntimeError, Value};

use super::Timestamp;
use crate::fields::{message_list, string_list, string_map, FieldReader};
use crate::message::Message;

/// Sets `field` on `value` only when `message` is present.
fn with_message<M: Message>(value: MessageValue, field: &str, message: &Option<M>) -> MessageValue {
    match message {
        Some(m) => value.with(field, m.to_value()),
        None => value,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchRequest {
    pub query: String,
    pub page_number: i32,
    pub results_per_page: i32,
}

impl Message for SearchRequest {
    const NAME: &'static str = "SearchRequest";

    fn to_value(&self) -> MessageValue {
        MessageValue::new(Self::NAME)
            .with("query", self.query.as_str())
            .with("page_number", self.page_number)
            .with("results_per_page", self.results_per_page)
    }

    fn from_value(value: &MessageValue) -> Result<Self, RuntimeError> {
        let f = FieldReader::new::<Self>(value)?;
        Ok(Self {
            query: f.string("query")?,
            page_number: f.int32("page_number")?,
            results_per_page: f.int32("results_per_page")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub metadata: BTreeMap<String, String>,
}

impl Message for SearchResult {
    const NAME: &'static str = "SearchResult";

    fn to_value(&self) -> MessageValue {
        MessageValue::new(Self::NAME)
            .with("id", self.id.as_str())
            .with("title", self.title.as_str())
            .with("url", self.url.as_str())
            .with("snippet", self.snippet.as_str())
            .with("metadata", string_map(&self.metadata))
    }

    fn from_value(value: &MessageValue) -> Result<Self, RuntimeError> {
        let f = FieldReader::new::<Self>(value)?;
        Ok(Self {
            id: f.string("id")?,
            title: f.string("title")?,
            url: f.string("url")?,
            snippet: f.string("snippet")?,
            metadata: f.string_map("metadata")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub total_results: i32,
    pub page_number: i32,
}

impl Message for SearchResponse {
    const NAME: &'static str = "SearchResponse";

    fn to_value(&self) -> MessageValue {
        MessageValue::new(Self::NAME)
            .with("results", message_list(&self.results))
            .with("total_results", self.total_results)
            .with("page_number", self.page_number)
    }

    fn from_value(value: &MessageValue) -> Result<Self, RuntimeError> {
        let f = FieldReader::new::<Self>(value)?;
        Ok(Self {
            results: f.messages("results")?,
            total_results: f.int32("total_results")?,
            page_number: f.int32("page_number")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct User {
    pub id: String,
    pub username: String,
    pub roles: Vec<String>,
    pub email: String,
    pub preferences: BTreeMap<String, String>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

impl Message for User {
    const NAME: &'static str = "User";

    fn to_value(&self) -> MessageValue {
        let value = MessageValue::new(Self::NAME)
            .with("id", self.id.as_str())
            .with("username", self.username.as_str())
            .with("roles", string_list(&self.roles))
            .with("email", self.email.as_str())
            .with("preferences", string_map(&self.preferences));
        let value = with_message(value, "created_at", &self.created_at);
        with_message(value, "updated_at", &self.updated_at)
    }

    fn from_value(value: &MessageValue) -> Result<Self, RuntimeError> {
        let f = FieldReader::new::<Self>(value)?;
        Ok(Self {
            id: f.string("id")?,
            username: f.string("username")?,
            roles: f.strings("roles")?,
            email: f.string("email")?,
            preferences: f.string_map("preferences")?,
            created_at: f.message("created_at")?,
            updated_at: f.message("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiRequest {
    pub request_id: String,
    pub search: Option<SearchRequest>,
    pub sent_at: Option<Timestamp>,
}

impl Message for ApiRequest {
    const NAME: &'static str = "ApiRequest";

    fn to_value(&self) -> MessageValue {
        let value = MessageValue::new(Self::NAME).with("request_id", self.request_id.as_str());
        let value = with_message(value, "search", &self.search);
        with_message(value, "sent_at", &self.sent_at)
    }

    fn from_value(value: &MessageValue) -> Result<Self, RuntimeError> {
        let f = FieldReader::new::<Self>(value)?;
        Ok(Self {
            request_id: f.string("request_id")?,
            search: f.message("search")?,
            sent_at: f.message("sent_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiResponse {
    pub request_id: String,
    pub search_response: Option<SearchResponse>,
    pub received_at: Option<Timestamp>,
}

impl Message for ApiResponse {
    const NAME: &'static str = "ApiResponse";

    fn to_value(&self) -> MessageValue {
        let value = MessageValue::new(Self::NAME).with("request_id", self.request_id.as_str());
        let value = with_message(value, "search_response", &self.search_response);
        with_message(value, "received_at", &self.received_at)
    }

    fn from_value(value: &MessageValue) -> Result<Self, RuntimeError> {
        let f = FieldReader::new::<Self>(value)?;
        Ok(Self {
            request_id: f.string("request_id")?,
            search_response: f.message("search_response")?,
            received_at: f.message("received_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub settings: BTreeMap<String, String>,
    pub enabled_features: Vec<String>,
    pub last_updated: Option<Timestamp>,
}

impl Message for Config {
    const NAME: &'static str = "Config";

    fn to_value(&self) -> MessageValue {
        let value = MessageValue::new(Self::NAME)
            .with("settings", string_map(&self.settings))
            .with("enabled_features", string_list(&self.enabled_features));
        with_message(value, "last_updated", &self.last_updated)
    }

    fn from_value(value: &MessageValue) -> Result<Self, RuntimeError> {
        let f = FieldReader::new::<Self>(value)?;
        Ok(Self {
            settings: f.string_map("settings")?,
            enabled_features: f.strings("enabled_features")?,
            last_updated: f.message("last_updated")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Batch {
    pub batch_id: String,
    pub searches: Vec<SearchRequest>,
    pub users: Vec<User>,
}

impl Message for Batch {
    const NAME: &'static str = "Batch";

    fn to_value(&self) -> MessageValue {
        MessageValue::new(Self::NAME)
            .with("batch_id", self.batch_id.as_str())
            .with("searches", message_list(&self.searches))
            .with("users", message_list(&self.users))
    }

    fn from_value(value: &MessageValue) -> Result<Self, RuntimeError> {
        let f = FieldReader::new::<Self>(value)?;
        Ok(Self {
            batch_id: f.string("batch_id")?,
            searches: f.messages("searches")?,
            users: f.messages("users")?,
        })
    }
}

/// Kinds of [`Event`]. Numbers outside the declared set survive a decode
/// and re-encode as [`EventType::Unrecognized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventType {
    #[default]
    Unspecified,
    Search,
    UserCreated,
    UserUpdated,
    ConfigChanged,
    Unrecognized(i32),
}

impl EventType {
    pub fn number(&self) -> i32 {
        match self {
            Self::Unspecified => 0,
            Self::Search => 1,
            Self::UserCreated => 2,
            Self::UserUpdated => 3,
            Self::ConfigChanged => 4,
            Self::Unrecognized(n) => *n,
        }
    }
}

impl From<i32> for EventType {
    fn from(number: i32) -> Self {
        match number {
            0 => Self::Unspecified,
            1 => Self::Search,
            2 => Self::UserCreated,
            3 => Self::UserUpdated,
            4 => Self::ConfigChanged,
            n => Self::Unrecognized(n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Event {
    /// Stored in the schema field `type`.
    pub event_type: EventType,
    pub id: String,
    pub data: BTreeMap<String, String>,
    pub occurred_at: Option<Timestamp>,
    pub source: String,
}

impl Message for Event {
    const NAME: &'static str = "Event";

    fn to_value(&self) -> MessageValue {
        let value = MessageValue::new(Self::NAME)
            .with("type", Value::Enum(self.event_type.number()))
            .with("id", self.id.as_str())
            .with("data", string_map(&self.data));
        with_message(value, "occurred_at", &self.occurred_at).with("source", self.source.as_str())
    }

    fn from_value(value: &MessageValue) -> Result<Self, RuntimeError> {
        let f = FieldReader::new::<Self>(value)?;
        Ok(Self {
            event_type: f.enumeration("type")?,
            id: f.string("id")?,
            data: f.string_map("data")?,
            occurred_at: f.message("occurred_at")?,
            source: f.string("source")?,
        })
    }
}

/// The schema's `Error` message. Renamed so it does not shadow
/// `std::error::Error` at use sites.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub details: BTreeMap<String, String>,
    pub timestamp: Option<Timestamp>,
}

impl Message for ApiError {
    const NAME: &'static str = "Error";

    fn to_value(&self) -> MessageValue {
        let value = MessageValue::new(Self::NAME)
            .with("code", self.code.as_str())
            .with("message", self.message.as_str())
            .with("details", string_map(&self.details));
        with_message(value, "timestamp", &self.timestamp)
    }

    fn from_value(value: &MessageValue) -> Result<Self, RuntimeError> {
        let f = FieldReader::new::<Self>(value)?;
        Ok(Self {
            code: f.string("code")?,
            message: f.string("message")?,
            details: f.string_map("details")?,
            timestamp: f.message("timestamp")?,
        })
    }
}
