//! Outcome of one job in a batch
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents how a batch job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// The job ran to completion (possibly with a shortened result)
    Success,

    /// The job hit a hard error; the batch carried on
    Failed,
}

impl JobStatus {
    /// Converts the state to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
