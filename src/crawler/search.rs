//! Search crawler and the search-then-comments job
//!
//! Search pages are addressed by an index starting at 1 that advances once
//! per page.

use crate::crawler::job::Job;
use crate::crawler::pager::StopReason;
use crate::model::{CommentRecord, NoteSummary};
use crate::url::canonicalize;
use crate::{Result, XhsError};

/// First page index of the search endpoint
///
/// Pages are numbered from 1 the way the web client requests them, and every
/// search call (plain search, search-then-comments, cookie probe) uses that
/// numbering so the same keyword always starts from the same results.
pub const FIRST_SEARCH_PAGE: u32 = 1;

impl Job<'_> {
    /// Collects up to `num` search results for `keyword`
    pub async fn collect_notes(&mut self, keyword: &str, num: usize) -> Result<Vec<NoteSummary>> {
        let api = self.api;
        let pager = self.page_pager("search", FIRST_SEARCH_PAGE);
        let budget = &self.budget;

        let (mut notes, reason) = pager
            .collect(
                &mut self.throttle,
                |page| async move { api.search_page(keyword, page).await.map_err(XhsError::from) },
                |found: &[NoteSummary]| found.len() < num && !budget.is_exhausted(),
            )
            .await?;

        notes.truncate(num);
        tracing::info!(
            "Search for {:?} returned {} notes ({:?})",
            keyword,
            notes.len(),
            reason
        );
        Ok(notes)
    }

    /// Pages through search results for `keyword` and crawls the comments of
    /// every result in turn, until the job budget is spent or search runs out
    ///
    /// All crawls draw on the job budget, so each note may take at most what
    /// the earlier notes left.
    pub async fn collect_search_comments(&mut self, keyword: &str) -> Result<Vec<CommentRecord>> {
        let api = self.api;
        let mut pager = self.page_pager("search", FIRST_SEARCH_PAGE);
        let mut records = Vec::new();
        let mut notes_crawled = 0usize;

        'search: loop {
            if self.budget.is_exhausted() {
                pager.halt(StopReason::ConditionMet);
                break;
            }

            let page = pager
                .next_page(&mut self.throttle, |page| async move {
                    api.search_page(keyword, page).await.map_err(XhsError::from)
                })
                .await?;
            let Some(notes) = page else {
                break;
            };

            for note in notes {
                if self.budget.is_exhausted() {
                    pager.halt(StopReason::ConditionMet);
                    break 'search;
                }

                let target = match canonicalize(&note.url) {
                    Ok(target) => target,
                    Err(e) => {
                        tracing::warn!("Skipping search result {}: {}", note.note_id, e);
                        continue;
                    }
                };

                tracing::debug!("Crawling comments of {:?}", note.title);
                self.crawl_comment_tree(&target, String::new(), &mut records)
                    .await?;
                notes_crawled += 1;
            }
        }

        tracing::info!(
            "Search-comments for {:?} collected {} comments from {} notes ({:?})",
            keyword,
            records.len(),
            notes_crawled,
            pager.stop_reason()
        );
        Ok(records)
    }
}
