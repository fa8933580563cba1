//! Crawler module for signed, paced platform traversal
//!
//! This module contains the core crawling logic, including:
//! - Signed request gateway (one call, one response classification)
//! - Generic cursor pager with stall and page-limit guards
//! - Per-job throttling and budget accounting
//! - Comment tree, search and search-then-comments crawlers
//! - Sequential batch execution
//! - Overall coordination of every operation

mod api;
pub mod batch;
mod comments;
mod coordinator;
mod gateway;
mod job;
pub mod pager;
mod search;
mod throttle;

pub use api::{PlatformApi, RawComment};
pub use batch::{BatchJob, BatchJobResult, BatchPayload, CommentRequest, SearchRequest};
pub use coordinator::Coordinator;
pub use gateway::{build_http_client, Gateway, Method, Session};
pub use job::Job;
pub use pager::{CursorPager, Page, StopReason};
pub use throttle::Throttle;
