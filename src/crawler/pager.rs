//! Generic cursor pager
//!
//! A `CursorPager` produces a lazy, finite sequence of pages from any
//! "fetch page at cursor" function. The same loop drives top-level comments
//! (string cursors), reply threads (string cursors) and search (page index).
//!
//! The sequence ends when:
//! - the platform reports `has_more = false`
//! - the caller's continue condition turns false
//! - a page fetch fails with a soft error (accumulated pages are kept)
//! - the cursor did not advance although `has_more = true`
//! - the configured maximum page count is reached

use crate::crawler::throttle::Throttle;
use crate::XhsError;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// One fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T, C> {
    pub items: Vec<T>,
    pub next_cursor: C,
    pub has_more: bool,
}

/// Why a page sequence ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The platform reported no further pages
    Exhausted,
    /// The caller's continue condition (budget, result count) turned false
    ConditionMet,
    /// The safety bound on fetched pages was reached
    PageLimit,
    /// `has_more` was set but the cursor did not change
    Stalled,
    /// A page fetch failed with a soft error
    Failed(String),
}

/// Walks one cursor-paginated sequence
#[derive(Debug)]
pub struct CursorPager<C> {
    /// Name used in logs
    label: &'static str,

    /// Cursor of the next page to fetch
    cursor: C,

    /// Minimum gap before each fetch of this pager
    interval: Duration,

    /// Safety bound on fetched pages
    max_pages: u32,

    pages_fetched: u32,
    stopped: Option<StopReason>,
}

impl<C> CursorPager<C>
where
    C: Clone + PartialEq + fmt::Debug,
{
    /// Creates a pager starting at `start`
    ///
    /// An empty string cursor means "start of sequence".
    pub fn new(label: &'static str, start: C, interval: Duration, max_pages: u32) -> Self {
        Self {
            label,
            cursor: start,
            interval,
            max_pages,
            pages_fetched: 0,
            stopped: None,
        }
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Why the sequence ended, if it has
    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stopped.as_ref()
    }

    /// Ends the sequence on behalf of the caller
    pub fn halt(&mut self, reason: StopReason) {
        if self.stopped.is_none() {
            self.stopped = Some(reason);
        }
    }

    /// Fetches the next page
    ///
    /// Waits on the job throttle first. Returns `Ok(None)` once the sequence
    /// has ended; soft errors end the sequence instead of being returned, hard
    /// errors (session, signer) propagate.
    pub async fn next_page<T, F, Fut>(
        &mut self,
        throttle: &mut Throttle,
        fetch: F,
    ) -> Result<Option<Vec<T>>, XhsError>
    where
        F: FnOnce(C) -> Fut,
        Fut: Future<Output = Result<Page<T, C>, XhsError>>,
    {
        if self.stopped.is_some() {
            return Ok(None);
        }

        if self.pages_fetched >= self.max_pages {
            tracing::warn!(
                "{}: reached page limit of {} at cursor {:?}",
                self.label,
                self.max_pages,
                self.cursor
            );
            self.stopped = Some(StopReason::PageLimit);
            return Ok(None);
        }

        throttle.wait(self.interval).await;
        let result = fetch(self.cursor.clone()).await;
        self.pages_fetched += 1;

        let page = match result {
            Ok(page) => page,
            Err(e) if e.is_hard() => return Err(e),
            Err(e) => {
                tracing::warn!(
                    "{}: page {} failed, keeping what was collected: {}",
                    self.label,
                    self.pages_fetched,
                    e
                );
                self.stopped = Some(StopReason::Failed(e.to_string()));
                return Ok(None);
            }
        };

        tracing::debug!(
            "{}: page {} returned {} items (has_more={})",
            self.label,
            self.pages_fetched,
            page.items.len(),
            page.has_more
        );

        if !page.has_more {
            self.stopped = Some(StopReason::Exhausted);
        } else if page.next_cursor == self.cursor {
            tracing::warn!(
                "{}: cursor {:?} did not advance, stopping",
                self.label,
                self.cursor
            );
            self.stopped = Some(StopReason::Stalled);
        } else {
            self.cursor = page.next_cursor;
        }

        Ok(Some(page.items))
    }

    /// Drains the sequence while `keep_going(accumulated)` holds
    ///
    /// The condition is checked before every fetch, so the result may exceed
    /// the caller's target by at most one page; callers truncate.
    pub async fn collect<T, F, Fut, K>(
        mut self,
        throttle: &mut Throttle,
        mut fetch: F,
        mut keep_going: K,
    ) -> Result<(Vec<T>, StopReason), XhsError>
    where
        F: FnMut(C) -> Fut,
        Fut: Future<Output = Result<Page<T, C>, XhsError>>,
        K: FnMut(&[T]) -> bool,
    {
        let mut accumulated = Vec::new();

        loop {
            if !keep_going(&accumulated) {
                self.halt(StopReason::ConditionMet);
                break;
            }

            match self.next_page(throttle, &mut fetch).await? {
                Some(items) => accumulated.extend(items),
                None => break,
            }
        }

        let reason = self.stopped.unwrap_or(StopReason::ConditionMet);
        Ok((accumulated, reason))
    }
}
