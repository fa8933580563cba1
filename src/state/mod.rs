//! State module for tracking a running job
//!
//! # Components
//!
//! - `Budget`: Remaining record allowance and deadline shared by every crawler of one job
//! - `JobStatus`: Outcome of one batch job

mod budget;
mod job_status;

// Re-export main types
pub use budget::Budget;
pub use job_status::JobStatus;
