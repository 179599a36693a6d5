//! # The LangNet Schema
//!
//! The message set every LangNet implementation ships: search requests and
//! responses, users, configuration, batches, events and errors, all
//! stamped with [`Timestamp`].
//!
//! [`schema()`] is the in-code description. The same schema is published as
//! `schemas/langnet.schema.yaml` for implementations in other languages;
//! a test keeps the two identical.

mod messages;
pub mod samples;
mod timestamp;

pub use messages::{
    ApiError, ApiRequest, ApiResponse, Batch, Config, Event, EventType, SearchRequest,
    SearchResponse, SearchResult, User,
};
pub use timestamp::Timestamp;

use langnet_core::SchemaError;
use langnet_schema::{EnumDef, FieldDef, MessageDef, Registry, ScalarKind, SchemaDescription};

/// Package name of the LangNet schema.
pub const PACKAGE: &str = "langnet";

fn string(name: &str, number: u32) -> FieldDef {
    FieldDef::scalar(name, number, ScalarKind::String)
}

fn string_map(name: &str, number: u32) -> FieldDef {
    string(name, number).map(ScalarKind::String)
}

/// The LangNet schema description.
pub fn schema() -> SchemaDescription {
    SchemaDescription::new(PACKAGE)
        .message(
            MessageDef::new("Timestamp")
                .field(FieldDef::scalar("seconds", 1, ScalarKind::Int64))
                .field(FieldDef::scalar("nanos", 2, ScalarKind::Int32)),
        )
        .message(
            MessageDef::new("SearchRequest")
                .field(string("query", 1))
                .field(FieldDef::scalar("page_number", 2, ScalarKind::Int32))
                .field(FieldDef::scalar("results_per_page", 3, ScalarKind::Int32)),
        )
        .message(
            MessageDef::new("SearchResult")
                .field(string("id", 1))
                .field(string("title", 2))
                .field(string("url", 3))
                .field(string("snippet", 4))
                .field(string_map("metadata", 5)),
        )
        .message(
            MessageDef::new("SearchResponse")
                .field(FieldDef::message("results", 1, "SearchResult").repeated())
                .field(FieldDef::scalar("total_results", 2, ScalarKind::Int32))
                .field(FieldDef::scalar("page_number", 3, ScalarKind::Int32)),
        )
        .message(
            MessageDef::new("User")
                .field(string("id", 1))
                .field(string("username", 2))
                .field(string("roles", 3).repeated())
                .field(string("email", 4))
                .field(string_map("preferences", 5))
                .field(FieldDef::message("created_at", 6, "Timestamp"))
                .field(FieldDef::message("updated_at", 7, "Timestamp")),
        )
        .message(
            MessageDef::new("ApiRequest")
                .field(string("request_id", 1))
                .field(FieldDef::message("search", 2, "SearchRequest"))
                .field(FieldDef::message("sent_at", 3, "Timestamp")),
        )
        .message(
            MessageDef::new("ApiResponse")
                .field(string("request_id", 1))
                .field(FieldDef::message("search_response", 2, "SearchResponse"))
                .field(FieldDef::message("received_at", 3, "Timestamp")),
        )
        .message(
            MessageDef::new("Config")
                .field(string_map("settings", 1))
                .field(string("enabled_features", 2).repeated())
                .field(FieldDef::message("last_updated", 3, "Timestamp")),
        )
        .message(
            MessageDef::new("Batch")
                .field(string("batch_id", 1))
                .field(FieldDef::message("searches", 2, "SearchRequest").repeated())
                .field(FieldDef::message("users", 3, "User").repeated()),
        )
        .message(
            MessageDef::new("Event")
                .field(FieldDef::enumeration("type", 1, "EventType"))
                .field(string("id", 2))
                .field(string_map("data", 3))
                .field(FieldDef::message("occurred_at", 4, "Timestamp"))
                .field(string("source", 5)),
        )
        .message(
            MessageDef::new("Error")
                .field(string("code", 1))
                .field(string("message", 2))
                .field(string_map("details", 3))
                .field(FieldDef::message("timestamp", 4, "Timestamp")),
        )
        .enumeration(
            EnumDef::new("EventType")
                .value("EVENT_TYPE_UNSPECIFIED", 0)
                .value("SEARCH", 1)
                .value("USER_CREATED", 2)
                .value("USER_UPDATED", 3)
                .value("CONFIG_CHANGED", 4),
        )
}

/// Build a registry for [`schema()`].
pub fn registry() -> Result<Registry, SchemaError> {
    Registry::new(schema())
}
