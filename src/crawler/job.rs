//! Per-job crawl state
//!
//! A `Job` is the single logical worker behind one inbound operation. It
//! owns the throttle and budget for that operation; every crawler it runs
//! borrows them, so pacing and the record allowance are shared across the
//! search pages, comment pages and reply threads of the job.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::api::PlatformApi;
use crate::crawler::gateway::{Gateway, Session};
use crate::crawler::pager::CursorPager;
use crate::crawler::throttle::Throttle;
use crate::state::Budget;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

pub struct Job<'a> {
    pub(crate) api: PlatformApi<'a>,
    pub(crate) throttle: Throttle,
    pub(crate) budget: Budget,
    page_interval: Duration,
    reply_interval: Duration,
    max_pages: u32,
}

impl<'a> Job<'a> {
    /// Starts a job for `session`
    ///
    /// A non-zero `job-timeout-secs` becomes a deadline on the budget.
    pub fn new(gateway: &'a Gateway, session: &'a Session, config: &'a Config, budget: Budget) -> Self {
        let budget = match config.crawler.job_timeout_secs {
            0 => budget,
            secs => budget.with_deadline(Instant::now() + Duration::from_secs(secs)),
        };

        Self::with_settings(
            PlatformApi::new(gateway, session, &config.crawler),
            &config.crawler,
            Duration::from_millis(config.throttle.page_interval_ms),
            Duration::from_millis(config.throttle.reply_interval_ms),
            budget,
        )
    }

    pub(crate) fn with_settings(
        api: PlatformApi<'a>,
        crawler: &CrawlerConfig,
        page_interval: Duration,
        reply_interval: Duration,
        budget: Budget,
    ) -> Self {
        Self {
            api,
            throttle: Throttle::new(),
            budget,
            page_interval,
            reply_interval,
            max_pages: crawler.max_pages,
        }
    }

    /// Pager for a top-level sequence (comment pages, search pages)
    pub(crate) fn page_pager<C>(&self, label: &'static str, start: C) -> CursorPager<C>
    where
        C: Clone + PartialEq + fmt::Debug,
    {
        CursorPager::new(label, start, self.page_interval, self.max_pages)
    }

    /// Pager for one reply thread
    pub(crate) fn reply_pager(&self, start: String) -> CursorPager<String> {
        CursorPager::new("replies", start, self.reply_interval, self.max_pages)
    }

    /// Appends `record` if the budget allows it
    ///
    /// Returns false once the budget is exhausted; the caller must stop.
    pub(crate) fn admit<T>(&mut self, records: &mut Vec<T>, record: T) -> bool {
        if self.budget.try_take() {
            records.push(record);
            true
        } else {
            false
        }
    }

    /// Calls issued so far by this job
    pub fn request_count(&self) -> u32 {
        self.throttle.request_count()
    }
}
