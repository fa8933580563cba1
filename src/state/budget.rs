use tokio::time::Instant;

/// Remaining allowance of one job
///
/// The count only ever decreases. Once it reaches zero, or the optional
/// deadline passes, every crawler sharing this budget stops issuing requests,
/// including in the middle of a reply thread.
#[derive(Debug, Clone)]
pub struct Budget {
    /// Records still allowed (`None` = no limit)
    remaining: Option<usize>,

    /// Point in time after which no further request may start
    deadline: Option<Instant>,
}

impl Budget {
    /// A budget with no record limit and no deadline
    pub fn unlimited() -> Self {
        Self {
            remaining: None,
            deadline: None,
        }
    }

    /// A budget allowing at most `records` appends
    pub fn limited(records: usize) -> Self {
        Self {
            remaining: Some(records),
            deadline: None,
        }
    }

    /// Builds a budget from an optional caller-supplied maximum
    pub fn from_limit(limit: Option<usize>) -> Self {
        match limit {
            Some(records) => Self::limited(records),
            None => Self::unlimited(),
        }
    }

    /// Adds a deadline checked at every suspension point
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns the number of records still allowed
    pub fn remaining(&self) -> Option<usize> {
        self.remaining
    }

    /// Returns true if the deadline, if any, has passed
    pub fn deadline_passed(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    /// Returns true if no further request or append is allowed
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0) || self.deadline_passed()
    }

    /// Consumes one unit if any is left
    ///
    /// Returns false, without consuming, when the budget is exhausted.
    pub fn try_take(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }

        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }

        true
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::unlimited()
    }
}
