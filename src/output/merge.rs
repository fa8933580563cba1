//! Result merger
//!
//! Joins one note's metadata with each of its comments. Pure: inputs are
//! only read, and an empty comment list yields no rows.

use crate::model::{CommentRecord, NoteDetail, TIMESTAMP_FORMAT};
use chrono::Local;
use serde::Serialize;

/// One export row: a note paired with one of its comments
///
/// Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedRow {
    /// Job tag, usually the search keyword
    pub keyword: String,
    pub title: String,
    pub author: String,
    /// Caller-supplied customer identifier
    pub customer_tag: String,
    /// Comment text
    pub content: String,
    pub likes: String,
    pub collects: String,
    pub comments: String,
    pub note_url: String,
    /// When the rows were produced
    pub collect_time: String,
    pub note_time: String,
    pub note_location: String,
    pub note_type: String,
    pub comment_location: String,
    pub comment_id: String,
    pub commenter_nickname: String,
}

/// Merges `note` with `comments`, stamping rows with the current local time
pub fn merge(
    note: &NoteDetail,
    comments: &[CommentRecord],
    job_tag: &str,
    customer_tag: &str,
) -> Vec<MergedRow> {
    let now = Local::now().format(TIMESTAMP_FORMAT).to_string();
    merge_at(note, comments, job_tag, customer_tag, &now)
}

/// Merges `note` with `comments` using `collected_at` as the collect time
pub fn merge_at(
    note: &NoteDetail,
    comments: &[CommentRecord],
    job_tag: &str,
    customer_tag: &str,
    collected_at: &str,
) -> Vec<MergedRow> {
    comments
        .iter()
        .map(|comment| MergedRow {
            keyword: job_tag.to_string(),
            title: note.title.clone(),
            author: note.author.clone(),
            customer_tag: customer_tag.to_string(),
            content: comment.content.clone(),
            likes: note.like_count.clone(),
            collects: note.collected_count.clone(),
            comments: note.comment_count.clone(),
            note_url: note.url.clone(),
            collect_time: collected_at.to_string(),
            note_time: note.published_at.clone(),
            note_location: note.location.clone(),
            note_type: note.note_type.clone(),
            comment_location: comment.ip_location.clone(),
            comment_id: comment.comment_id.clone(),
            commenter_nickname: comment.author_nickname.clone(),
        })
        .collect()
}
