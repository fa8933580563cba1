//! Crawler coordinator - entry points for every harvesting operation
//!
//! The coordinator owns the configuration and the signed gateway, and
//! starts one `Job` per operation. Inputs are validated here: a bad cookie
//! string or note URL fails the call before any request is made, while page
//! errors inside a crawl only shorten its result.

use crate::config::Config;
use crate::crawler::batch::{
    self, BatchJob, BatchJobResult, BatchPayload, CommentRequest, SearchRequest, MAX_SEARCH_NUM,
};
use crate::crawler::gateway::{build_http_client, Gateway, Session};
use crate::crawler::job::Job;
use crate::crawler::search::FIRST_SEARCH_PAGE;
use crate::model::{CommentRecord, NoteDetail, NoteSummary};
use crate::output::{merge, MergedRow};
use crate::signer::Signer;
use crate::state::Budget;
use crate::url::{canonicalize, is_note_id};
use crate::{Result, XhsError};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Keyword used when probing whether a cookie set still works
const COOKIE_PROBE_KEYWORD: &str = "测试";

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    gateway: Gateway,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `signer` - The request signer shared by every call
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(XhsError)` - Failed to build the HTTP client
    pub fn new(config: Config, signer: Arc<dyn Signer>) -> Result<Self> {
        let client = build_http_client(&config.platform)?;
        Ok(Self::with_client(config, client, signer))
    }

    /// Creates a coordinator around an existing HTTP client
    pub fn with_client(config: Config, client: Client, signer: Arc<dyn Signer>) -> Self {
        let gateway = Gateway::new(client, signer, &config.platform);
        Self {
            config: Arc::new(config),
            gateway,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn job<'a>(&'a self, session: &'a Session, budget: Budget) -> Job<'a> {
        Job::new(&self.gateway, session, &self.config, budget)
    }

    /// Fetches the comments of one note
    ///
    /// `cursor` resumes a previous crawl; `max_comments` bounds the result.
    pub async fn fetch_comments(
        &self,
        cookies: &str,
        note_url: &str,
        cursor: Option<&str>,
        max_comments: Option<usize>,
    ) -> Result<Vec<CommentRecord>> {
        let session = Session::from_cookie_str(cookies)?;
        let target = canonicalize(note_url)?;
        tracing::info!("Fetching comments of note {}", target.note_id);

        let mut job = self.job(&session, Budget::from_limit(max_comments));
        job.collect_comments(&target, cursor.unwrap_or_default().to_string())
            .await
    }

    /// Searches notes by keyword, returning at most `num` results
    pub async fn search_notes(
        &self,
        cookies: &str,
        keyword: &str,
        num: usize,
    ) -> Result<Vec<NoteSummary>> {
        if !(1..=MAX_SEARCH_NUM).contains(&num) {
            return Err(XhsError::InvalidRequest(format!(
                "num must be between 1 and {}, got {}",
                MAX_SEARCH_NUM, num
            )));
        }
        let session = Session::from_cookie_str(cookies)?;
        tracing::info!("Searching notes for {:?}", keyword);

        let mut job = self.job(&session, Budget::unlimited());
        job.collect_notes(keyword, num).await
    }

    /// Collects up to `num` comments across the search results for `keyword`
    pub async fn search_comments(
        &self,
        cookies: &str,
        keyword: &str,
        num: usize,
    ) -> Result<Vec<CommentRecord>> {
        if num == 0 {
            return Err(XhsError::InvalidRequest(
                "num must be at least 1".to_string(),
            ));
        }
        let session = Session::from_cookie_str(cookies)?;
        tracing::info!("Collecting {} comments for {:?}", num, keyword);

        let mut job = self.job(&session, Budget::limited(num));
        job.collect_search_comments(keyword).await
    }

    /// Fetches note metadata
    pub async fn note_detail(&self, cookies: &str, note_url: &str) -> Result<NoteDetail> {
        let session = Session::from_cookie_str(cookies)?;
        let target = canonicalize(note_url)?;

        let job = self.job(&session, Budget::unlimited());
        let link = target.explore_url(self.gateway.web_base_url());
        Ok(job.api.note_detail(&target, &link).await?)
    }

    /// Fetches a note's metadata and all its comments, merged into rows
    ///
    /// Returns no rows when the note has no comments.
    pub async fn collect_note_rows(
        &self,
        cookies: &str,
        note_url: &str,
        job_tag: &str,
        customer_tag: &str,
    ) -> Result<Vec<MergedRow>> {
        let session = Session::from_cookie_str(cookies)?;
        let target = canonicalize(note_url)?;
        let link = target.explore_url(self.gateway.web_base_url());

        let mut job = self.job(&session, Budget::unlimited());
        job.throttle.wait(Duration::ZERO).await;
        let detail = job.api.note_detail(&target, &link).await?;
        let comments = job.collect_comments(&target, String::new()).await?;

        if comments.is_empty() {
            tracing::info!("Note {} has no comments", target.note_id);
        }
        Ok(merge(&detail, &comments, job_tag, customer_tag))
    }

    /// Replies to a comment
    ///
    /// `note` is either a bare note id or any accepted note URL.
    pub async fn reply_comment(
        &self,
        cookies: &str,
        note: &str,
        comment_id: &str,
        content: &str,
    ) -> Result<Value> {
        let session = Session::from_cookie_str(cookies)?;
        let note_id = if is_note_id(note) {
            note.to_string()
        } else {
            canonicalize(note)?.note_id
        };
        if comment_id.trim().is_empty() || content.trim().is_empty() {
            return Err(XhsError::InvalidRequest(
                "comment id and content must not be empty".to_string(),
            ));
        }

        let job = self.job(&session, Budget::unlimited());
        let data = job.api.post_reply(&note_id, comment_id, content).await?;
        tracing::info!("Replied to comment {} on note {}", comment_id, note_id);
        Ok(data)
    }

    /// Returns true if a one-result search succeeds with `cookies`
    pub async fn validate_cookies(&self, cookies: &str) -> bool {
        let session = match Session::from_cookie_str(cookies) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Cookie validation failed: {}", e);
                return false;
            }
        };

        let job = self.job(&session, Budget::limited(1));
        match job.api.search_page(COOKIE_PROBE_KEYWORD, FIRST_SEARCH_PAGE).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Cookie validation failed: {}", e);
                false
            }
        }
    }

    /// Runs a mixed batch, one job at a time
    pub async fn run_batch(&self, jobs: Vec<BatchJob>) -> Vec<BatchJobResult> {
        let interval = Duration::from_millis(self.config.throttle.batch_interval_ms);
        batch::run_sequential(jobs, interval, |_, job| self.run_batch_job(job)).await
    }

    /// Runs a batch of comment requests
    pub async fn process_batch_comments(
        &self,
        requests: Vec<CommentRequest>,
    ) -> Vec<BatchJobResult> {
        self.run_batch(requests.into_iter().map(BatchJob::Comments).collect())
            .await
    }

    /// Runs a batch of search requests
    pub async fn process_batch_search(&self, requests: Vec<SearchRequest>) -> Vec<BatchJobResult> {
        self.run_batch(requests.into_iter().map(BatchJob::Search).collect())
            .await
    }

    async fn run_batch_job(&self, job: BatchJob) -> Result<BatchPayload> {
        match job {
            BatchJob::Comments(request) => self
                .fetch_comments(
                    &request.cookies,
                    &request.note_url,
                    request.cursor.as_deref(),
                    request.max_comments,
                )
                .await
                .map(BatchPayload::Comments),
            BatchJob::Search(request) => self
                .search_notes(&request.cookies, &request.keyword, request.num)
                .await
                .map(BatchPayload::Notes),
        }
    }
}
