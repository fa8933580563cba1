//! Comment tree crawler
//!
//! Flattens a note's two-level comment tree into one ordered list: each root
//! comment is followed by its replies (the inlined ones first, then the rest
//! of its reply thread) before the next root comment is emitted.
//!
//! Reply threads are tracked in an explicit work queue that is drained after
//! each root comment, so stack depth stays flat no matter how long a thread
//! runs. The job budget is checked before every fetch and before every append;
//! once it is exhausted both the reply thread and the outer page loop stop
//! without issuing another request.
//!
//! Records are not de-duplicated by comment id. Overlapping pages can yield
//! the same comment twice.

use crate::crawler::api::RawComment;
use crate::crawler::job::Job;
use crate::crawler::pager::StopReason;
use crate::model::CommentRecord;
use crate::url::CanonicalUrl;
use crate::{Result, XhsError};
use std::collections::VecDeque;

/// A reply thread that still has pages on the platform
#[derive(Debug)]
struct ReplyThread {
    note_id: String,
    root_comment_id: String,
    cursor: String,
}

/// Whether the crawl may continue after an append
enum Flow {
    Continue,
    BudgetSpent,
}

impl Job<'_> {
    /// Collects the comment tree of `target`, starting at `cursor`
    ///
    /// Page errors end the crawl early with what was collected; session and
    /// signer errors are returned.
    pub async fn collect_comments(
        &mut self,
        target: &CanonicalUrl,
        cursor: String,
    ) -> Result<Vec<CommentRecord>> {
        let mut records = Vec::new();
        self.crawl_comment_tree(target, cursor, &mut records).await?;
        Ok(records)
    }

    /// Appends the comment tree of `target` to `records`
    pub(crate) async fn crawl_comment_tree(
        &mut self,
        target: &CanonicalUrl,
        cursor: String,
        records: &mut Vec<CommentRecord>,
    ) -> Result<StopReason> {
        let api = self.api;
        let mut pager = self.page_pager("comments", cursor);
        let mut pending: VecDeque<ReplyThread> = VecDeque::new();
        let before = records.len();

        'pages: loop {
            if self.budget.is_exhausted() {
                pager.halt(StopReason::ConditionMet);
                break;
            }

            let page = pager
                .next_page(&mut self.throttle, |cursor| async move {
                    api.comment_page(target, cursor)
                        .await
                        .map_err(XhsError::from)
                })
                .await?;
            let Some(comments) = page else {
                break;
            };

            for comment in comments {
                if let Flow::BudgetSpent = self.admit_root(&comment, target, records, &mut pending)
                {
                    pager.halt(StopReason::ConditionMet);
                    break 'pages;
                }

                while let Some(thread) = pending.pop_front() {
                    if let Flow::BudgetSpent = self.crawl_reply_thread(thread, target, records).await? {
                        pager.halt(StopReason::ConditionMet);
                        break 'pages;
                    }
                }
            }
        }

        let reason = pager.stop_reason().cloned().unwrap_or(StopReason::ConditionMet);
        tracing::info!(
            "Collected {} comments for note {} ({:?}, {} requests so far)",
            records.len() - before,
            target.note_id,
            reason,
            self.request_count()
        );
        Ok(reason)
    }

    /// Appends a root comment and its inlined replies, queueing the rest of
    /// its reply thread
    fn admit_root(
        &mut self,
        comment: &RawComment,
        target: &CanonicalUrl,
        records: &mut Vec<CommentRecord>,
        pending: &mut VecDeque<ReplyThread>,
    ) -> Flow {
        if !self.admit(records, comment.to_record(&target.note_id)) {
            return Flow::BudgetSpent;
        }

        for reply in &comment.sub_comments {
            if !self.admit(records, reply.to_record(&target.note_id)) {
                return Flow::BudgetSpent;
            }
        }

        if comment.sub_comment_has_more {
            let note_id = if comment.note_id.is_empty() {
                target.note_id.clone()
            } else {
                comment.note_id.clone()
            };
            pending.push_back(ReplyThread {
                note_id,
                root_comment_id: comment.id.clone(),
                cursor: comment.sub_comment_cursor.clone(),
            });
        }

        Flow::Continue
    }

    /// Walks one reply thread until it ends or the budget is spent
    async fn crawl_reply_thread(
        &mut self,
        thread: ReplyThread,
        target: &CanonicalUrl,
        records: &mut Vec<CommentRecord>,
    ) -> Result<Flow> {
        let api = self.api;
        let mut pager = self.reply_pager(thread.cursor.clone());

        loop {
            if self.budget.is_exhausted() {
                return Ok(Flow::BudgetSpent);
            }

            let thread = &thread;
            let page = pager
                .next_page(&mut self.throttle, |cursor| async move {
                    api.sub_comment_page(
                        &thread.note_id,
                        &thread.root_comment_id,
                        &target.xsec_token,
                        cursor,
                    )
                    .await
                    .map_err(XhsError::from)
                })
                .await?;
            let Some(replies) = page else {
                break;
            };

            for reply in replies {
                if !self.admit(records, reply.to_record(&thread.note_id)) {
                    return Ok(Flow::BudgetSpent);
                }
            }
        }

        tracing::debug!(
            "Reply thread {} ended after {} pages ({:?})",
            thread.root_comment_id,
            pager.pages_fetched(),
            pager.stop_reason()
        );
        Ok(Flow::Continue)
    }
}
