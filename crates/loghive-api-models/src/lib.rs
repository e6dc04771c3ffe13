#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP and GraphQL DTOs for the Loghive public API.
//!
//! These types are the single source of truth for the wire contract the CLI
//! speaks: the REST query-job endpoints (`QuerySpec`, `ResultSnapshot`) and
//! the GraphQL management entities (`Repository`, `User`, ...). The server
//! owns the schema; the client treats every response as a read-only value
//! object.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of a search result, as returned by the polling endpoint.
///
/// Keys are field names (`@timestamp`, `@rawstring`, user fields); values are
/// arbitrary JSON. `serde_json::Map` iterates keys in sorted order, which is
/// what makes downstream column capture deterministic.
pub type EventRow = Map<String, Value>;

/// Reserved field carrying a row's server-assigned identity, when present.
pub const EVENT_ID_FIELD: &str = "@id";

/// Reserved field carrying a row's ingest timestamp as float milliseconds
/// since the Unix epoch.
pub const EVENT_TIMESTAMP_FIELD: &str = "@timestamp";

/// Immutable description of one search request.
///
/// Serialised as the body of `POST /api/v1/repositories/{repo}/queryjobs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    /// Query text in the server's search language.
    pub query_string: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Lower time bound, absolute or relative (e.g. `"10m"`).
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Upper time bound, absolute or relative.
    pub end: Option<String>,
    /// Whether the job runs as a live (never-completing) search.
    pub is_live: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    /// Named per-request arguments referenced from the query text.
    pub arguments: BTreeMap<String, String>,
}

/// Response body of a successful query-job creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQueryJobResponse {
    /// Opaque identifier for the created job.
    pub id: String,
}

/// Point-in-time view of a query job's progress, superseding the previous
/// snapshot on every poll.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultSnapshot {
    /// True once the server has produced the final result.
    pub done: bool,
    #[serde(default)]
    /// True if the job was cancelled on the server side.
    pub cancelled: bool,
    #[serde(default)]
    /// Current result rows. For aggregate results this is the whole
    /// recomputed row set; for event lists it may repeat rows already seen.
    pub events: Vec<EventRow>,
    #[serde(rename = "metaData")]
    /// Progress metadata accompanying the rows.
    pub metadata: ResultMetadata,
}

impl ResultSnapshot {
    /// Server-advised wait before the next poll.
    #[must_use]
    pub const fn poll_after(&self) -> Duration {
        Duration::from_millis(self.metadata.poll_after)
    }
}

/// Metadata block of a [`ResultSnapshot`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    #[serde(default)]
    /// Total events inspected by the job so far.
    pub event_count: u64,
    #[serde(default)]
    /// True when the result shape is a fixed column set rather than a raw
    /// event list.
    pub is_aggregate: bool,
    #[serde(default = "default_poll_after_ms")]
    /// Advised wait before the next poll, in milliseconds.
    pub poll_after: u64,
}

const fn default_poll_after_ms() -> u64 {
    1_000
}

/// Error document returned by REST endpoints on non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    /// Human-readable diagnostic, when the server provides one.
    pub detail: Option<String>,
}

/// Envelope of every GraphQL response.
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    /// Query or mutation payload; absent when the request failed outright.
    pub data: Option<T>,
    #[serde(default)]
    /// Errors reported by the server; any entry means the request failed.
    pub errors: Vec<GraphqlError>,
}

/// Single error entry of a GraphQL response.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlError {
    /// Human-readable description of the failure.
    pub message: String,
}

/// A repository as surfaced by the management API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// Server-assigned identifier.
    pub id: String,
    /// Unique repository name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Free-form description.
    pub description: Option<String>,
    #[serde(default)]
    /// Compressed size of the stored data in bytes.
    pub compressed_byte_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Time-based retention in days, when configured.
    pub retention_days: Option<f64>,
}

/// A platform user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server-assigned identifier.
    pub id: String,
    /// Unique login name.
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Display name.
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Contact email address.
    pub email: Option<String>,
    #[serde(default)]
    /// Whether the account holds root privileges.
    pub is_root: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Account creation time.
    pub created_at: Option<DateTime<Utc>>,
}

/// A parser installed in a repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parser {
    /// Server-assigned identifier.
    pub id: String,
    /// Parser name, unique within the repository.
    pub name: String,
    #[serde(default)]
    /// True for parsers shipped with the platform.
    pub is_built_in: bool,
}

/// An alert configured on a repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Server-assigned identifier.
    pub id: String,
    /// Alert name, unique within the repository.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Free-form description.
    pub description: Option<String>,
    #[serde(default)]
    /// Whether the alert is currently firing-enabled.
    pub enabled: bool,
}

/// An ingest token attached to a repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestToken {
    /// Token name, unique within the repository.
    pub name: String,
    /// The secret token value.
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Parser assigned to data ingested with this token.
    pub parser: Option<String>,
}

/// Response body of `GET /api/v1/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Coarse health indicator (e.g. `"OK"`).
    pub status: String,
    /// Server version string.
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_spec_serialises_wire_field_names() {
        let spec = QuerySpec {
            query_string: "count()".to_string(),
            start: Some("10m".to_string()),
            end: None,
            is_live: false,
            arguments: BTreeMap::new(),
        };
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            value,
            json!({"queryString": "count()", "start": "10m", "isLive": false})
        );
    }

    #[test]
    fn snapshot_parses_metadata_and_defaults() {
        let snapshot: ResultSnapshot = serde_json::from_value(json!({
            "done": false,
            "events": [{"@id": "a", "@rawstring": "hello"}],
            "metaData": {"eventCount": 7, "isAggregate": false, "pollAfter": 250}
        }))
        .unwrap();
        assert!(!snapshot.done);
        assert!(!snapshot.cancelled);
        assert_eq!(snapshot.events.len(), 1);
        assert_eq!(snapshot.metadata.event_count, 7);
        assert_eq!(snapshot.poll_after(), Duration::from_millis(250));
    }

    #[test]
    fn snapshot_poll_after_falls_back_when_absent() {
        let snapshot: ResultSnapshot =
            serde_json::from_value(json!({"done": true, "metaData": {}})).unwrap();
        assert_eq!(snapshot.poll_after(), Duration::from_millis(1_000));
        assert!(snapshot.events.is_empty());
    }

    #[test]
    fn graphql_envelope_surfaces_errors() {
        let envelope: GraphqlResponse<Repository> = serde_json::from_value(json!({
            "data": null,
            "errors": [{"message": "unknown repository"}]
        }))
        .unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.errors[0].message, "unknown repository");
    }
}
