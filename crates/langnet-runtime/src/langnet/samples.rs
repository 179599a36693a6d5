//! Canonical sample messages.
//!
//! Every LangNet implementation writes these same values; the conformance
//! harness and the `write-samples` command compare them across languages.
//! Timestamps are fixed so the encoded bytes are reproducible.

use std::collections::BTreeMap;

use super::{
    ApiError, ApiRequest, ApiResponse, Batch, Config, Event, EventType, SearchRequest,
    SearchResponse, SearchResult, Timestamp, User,
};

/// 2025-01-15T12:00:00.123456Z
pub const SAMPLE_TIME: Timestamp = Timestamp {
    seconds: 1_736_942_400,
    nanos: 123_456_000,
};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn pairs(items: &[(&str, &str)]) -> BTreeMap<String, String> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn search_request() -> SearchRequest {
    SearchRequest {
        query: "protocol buffers python zig".into(),
        page_number: 1,
        results_per_page: 20,
    }
}

pub fn search_response() -> SearchResponse {
    let result = |id: &str, title: &str, url: &str, snippet: &str, source: &str, language: &str| {
        SearchResult {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            metadata: pairs(&[("source", source), ("language", language)]),
        }
    };
    SearchResponse {
        results: vec![
            result(
                "result-1",
                "Protocol Buffers Documentation",
                "https://protobuf.dev",
                "Official Protocol Buffers documentation",
                "official",
                "multiple",
            ),
            result(
                "result-2",
                "Zig Programming Language",
                "https://ziglang.org",
                "Official Zig programming language website",
                "official",
                "zig",
            ),
            result(
                "result-3",
                "Python Protocol Buffers Guide",
                "https://developers.google.com/protocol-buffers/docs/pythontutorial",
                "Using Protocol Buffers with Python",
                "google",
                "python",
            ),
        ],
        total_results: 3,
        page_number: 1,
    }
}

pub fn user() -> User {
    User {
        id: "user-123".into(),
        username: "testuser".into(),
        roles: strings(&["user", "admin"]),
        email: "test@example.com".into(),
        preferences: pairs(&[("theme", "dark"), ("language", "en")]),
        created_at: Some(SAMPLE_TIME),
        updated_at: Some(SAMPLE_TIME),
    }
}

pub fn api_request() -> ApiRequest {
    ApiRequest {
        request_id: "req-123".into(),
        search: Some(search_request()),
        sent_at: Some(SAMPLE_TIME),
    }
}

pub fn api_response() -> ApiResponse {
    ApiResponse {
        request_id: "req-123".into(),
        search_response: Some(search_response()),
        received_at: Some(SAMPLE_TIME),
    }
}

pub fn config() -> Config {
    Config {
        settings: pairs(&[
            ("api_endpoint", "https://api.example.com"),
            ("timeout", "30"),
            ("retries", "3"),
        ]),
        enabled_features: strings(&["search", "users", "analytics"]),
        last_updated: Some(SAMPLE_TIME),
    }
}

pub fn batch() -> Batch {
    Batch {
        batch_id: "batch-2025-01-15".into(),
        searches: (0..3)
            .map(|i| SearchRequest {
                query: format!("search query {i}"),
                page_number: 1,
                results_per_page: 10,
            })
            .collect(),
        users: (0..2)
            .map(|i| User {
                id: format!("batch-user-{i}"),
                username: format!("user{i}"),
                roles: strings(&["user"]),
                email: format!("user{i}@example.com"),
                ..User::default()
            })
            .collect(),
    }
}

pub fn event() -> Event {
    Event {
        event_type: EventType::Search,
        id: "event-123".into(),
        data: pairs(&[("query", "test"), ("results", "3")]),
        occurred_at: Some(SAMPLE_TIME),
        source: "sample-writer".into(),
    }
}

pub fn error() -> ApiError {
    ApiError {
        code: "NOT_FOUND".into(),
        message: "Resource not found".into(),
        details: pairs(&[("resource_id", "xyz-123")]),
        timestamp: Some(SAMPLE_TIME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_time_matches_chrono() {
        let dt = SAMPLE_TIME.to_datetime().unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-01-15T12:00:00.123456+00:00");
    }

    #[test]
    fn batch_has_expected_shape() {
        let batch = batch();
        assert_eq!(batch.searches.len(), 3);
        assert_eq!(batch.searches[2].query, "search query 2");
        assert_eq!(batch.users[1].email, "user1@example.com");
    }
}
