//! Records produced by the crawlers
//!
//! These are the flat, per-call values handed back to callers. Nothing here
//! persists beyond one crawl invocation unless it is explicitly exported.

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Format used for every human-readable timestamp in records and exports
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One comment or reply, flattened out of its thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub note_id: String,
    pub comment_id: String,
    pub content: String,
    pub like_count: u64,
    pub author_nickname: String,
    pub ip_location: String,
    /// Local calendar time, `YYYY-mm-dd HH:MM:SS`
    pub created_at: String,
}

/// A note as listed by keyword search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSummary {
    pub note_id: String,
    pub title: String,
    pub xsec_token: String,
    /// Shareable link that the comment crawler accepts
    pub url: String,
}

/// Note metadata from the detail (feed) endpoint
///
/// Interaction counts are kept as the platform renders them, since large
/// values arrive abbreviated (`1.2万`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetail {
    pub note_id: String,
    pub title: String,
    pub author: String,
    pub like_count: String,
    pub collected_count: String,
    pub comment_count: String,
    pub location: String,
    pub note_type: String,
    pub url: String,
    pub xsec_token: String,
    /// Publication time, empty when the platform omitted it
    pub published_at: String,
}

/// Converts a millisecond epoch value into a local timestamp string
///
/// Accepts JSON numbers or numeric strings. Anything else (missing, negative
/// overflow, non-numeric) is treated as epoch zero rather than rejected.
pub fn format_epoch_millis(value: &serde_json::Value) -> String {
    let millis = match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    };

    let seconds = millis.div_euclid(1000);
    Local
        .timestamp_opt(seconds, 0)
        .single()
        .or_else(|| Local.timestamp_opt(0, 0).single())
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}
