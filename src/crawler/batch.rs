//! Batch execution
//!
//! Jobs run strictly one after another with a fixed pause between them
//! (none after the last). A failing job is recorded in its own result and
//! the batch moves on.

use crate::model::{CommentRecord, NoteSummary};
use crate::state::JobStatus;
use crate::XhsError;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Default number of search results per request
pub const DEFAULT_SEARCH_NUM: usize = 20;

/// Largest number of search results a request may ask for
pub const MAX_SEARCH_NUM: usize = 100;

fn default_search_num() -> usize {
    DEFAULT_SEARCH_NUM
}

/// Fetch the comments of one note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub cookies: String,
    pub note_url: String,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub max_comments: Option<usize>,
}

/// Search notes by keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub cookies: String,
    pub keyword: String,
    #[serde(default = "default_search_num")]
    pub num: usize,
}

/// One entry of a mixed batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BatchJob {
    Comments(CommentRequest),
    Search(SearchRequest),
}

impl BatchJob {
    /// The note URL or keyword the job works on
    pub fn target(&self) -> &str {
        match self {
            Self::Comments(request) => &request.note_url,
            Self::Search(request) => &request.keyword,
        }
    }
}

impl fmt::Display for BatchJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target())
    }
}

/// What a successful job produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BatchPayload {
    Comments(Vec<CommentRecord>),
    Notes(Vec<NoteSummary>),
}

impl BatchPayload {
    pub fn len(&self) -> usize {
        match self {
            Self::Comments(comments) => comments.len(),
            Self::Notes(notes) => notes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of one batch job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchJobResult {
    /// Position in the submitted batch, starting at 0
    pub job_index: usize,
    /// Note URL or keyword of the job
    pub target: String,
    pub status: JobStatus,
    /// Records in the payload, 0 for a failed job
    pub item_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<BatchPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// RFC 3339 local time at which the job finished
    pub processed_at: String,
}

impl BatchJobResult {
    pub fn success(job_index: usize, target: String, payload: BatchPayload) -> Self {
        Self {
            job_index,
            target,
            status: JobStatus::Success,
            item_count: payload.len(),
            payload: Some(payload),
            error: None,
            processed_at: Local::now().to_rfc3339(),
        }
    }

    pub fn failure(job_index: usize, target: String, error: String) -> Self {
        Self {
            job_index,
            target,
            status: JobStatus::Failed,
            item_count: 0,
            payload: None,
            error: Some(error),
            processed_at: Local::now().to_rfc3339(),
        }
    }
}

/// Runs `jobs` one at a time through `run`
///
/// Produces exactly one result per job, in submission order, and sleeps
/// `interval` between consecutive jobs.
pub async fn run_sequential<J, F, Fut>(
    jobs: Vec<J>,
    interval: Duration,
    mut run: F,
) -> Vec<BatchJobResult>
where
    J: fmt::Display,
    F: FnMut(usize, J) -> Fut,
    Fut: Future<Output = Result<BatchPayload, XhsError>>,
{
    let total = jobs.len();
    let mut results = Vec::with_capacity(total);

    for (index, job) in jobs.into_iter().enumerate() {
        let target = job.to_string();
        tracing::info!("Processing batch job {}/{}: {}", index + 1, total, target);

        let result = match run(index, job).await {
            Ok(payload) => {
                tracing::info!("Batch job {} done with {} items", index + 1, payload.len());
                BatchJobResult::success(index, target, payload)
            }
            Err(e) => {
                tracing::error!("Batch job {} ({}) failed: {}", index + 1, target, e);
                BatchJobResult::failure(index, target, e.to_string())
            }
        };
        results.push(result);

        if index + 1 < total {
            tokio::time::sleep(interval).await;
        }
    }

    results
}
