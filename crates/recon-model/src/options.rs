//! Options controlling a reconciliation run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ReconError, Result};

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Wait budgets for ordering-system operations, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timeouts {
    /// Search control becoming clickable.
    pub search_secs: u64,
    /// Candidate table becoming visible after a search.
    pub results_secs: u64,
    /// Quantity/cost inputs becoming editable.
    pub field_secs: u64,
    /// Displayed total becoming visible.
    pub total_secs: u64,
    /// Detail view close button.
    pub close_secs: u64,
    /// Each login/navigation step.
    pub session_secs: u64,
    /// Final save of the order form.
    pub commit_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            search_secs: 20,
            results_secs: 30,
            field_secs: 50,
            total_secs: 20,
            close_secs: 50,
            session_secs: 10,
            commit_secs: 20,
        }
    }
}

impl Timeouts {
    pub fn search(&self) -> Duration {
        Duration::from_secs(self.search_secs)
    }

    pub fn results(&self) -> Duration {
        Duration::from_secs(self.results_secs)
    }

    pub fn field(&self) -> Duration {
        Duration::from_secs(self.field_secs)
    }

    pub fn total(&self) -> Duration {
        Duration::from_secs(self.total_secs)
    }

    pub fn close(&self) -> Duration {
        Duration::from_secs(self.close_secs)
    }

    pub fn session(&self) -> Duration {
        Duration::from_secs(self.session_secs)
    }

    pub fn commit(&self) -> Duration {
        Duration::from_secs(self.commit_secs)
    }
}

/// Reconciliation tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconOptions {
    /// Rows per batch; also the checkpoint and error-section granularity.
    pub batch_size: usize,
    /// Relative tolerance when comparing expected and displayed totals.
    pub tolerance: f64,
    /// Attempts for a search whose results wait timed out.
    pub lookup_attempts: u32,
    pub timeouts: Timeouts,
}

impl Default for ReconOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            tolerance: DEFAULT_TOLERANCE,
            lookup_attempts: 1,
            timeouts: Timeouts::default(),
        }
    }
}

impl ReconOptions {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_lookup_attempts(mut self, attempts: u32) -> Self {
        self.lookup_attempts = attempts;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ReconError::InvalidOption {
                field: "batch_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ReconError::InvalidOption {
                field: "tolerance",
                reason: format!("must be a finite non-negative number, got {}", self.tolerance),
            });
        }
        if self.lookup_attempts == 0 {
            return Err(ReconError::InvalidOption {
                field: "lookup_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
