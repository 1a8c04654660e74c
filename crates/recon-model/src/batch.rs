//! Batch arithmetic.
//!
//! Batch `n` covers rows `[n * size, min((n + 1) * size, total))`. Batches
//! are numbered from 0 internally; section names use `n + 1`.

use std::ops::Range;

use crate::error::{ReconError, Result};

/// Section holding the full input dataset, written on a fresh start.
pub const INPUT_SECTION: &str = "Input Data";

/// Name of the error section for a 0-based batch number.
pub fn error_section_name(batch: usize) -> String {
    format!("Errors Batch {}", batch + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    total_rows: usize,
    batch_size: usize,
}

impl BatchPlan {
    pub fn new(total_rows: usize, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(ReconError::InvalidOption {
                field: "batch_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            total_rows,
            batch_size,
        })
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn batch_count(&self) -> usize {
        self.total_rows.div_ceil(self.batch_size)
    }

    /// Row indexes of `batch`. Empty when past the last batch.
    pub fn rows(&self, batch: usize) -> Range<usize> {
        let start = batch
            .saturating_mul(self.batch_size)
            .min(self.total_rows);
        let end = start.saturating_add(self.batch_size).min(self.total_rows);
        start..end
    }

    /// Batch numbers still to run when resuming at `start`.
    pub fn remaining(&self, start: usize) -> Range<usize> {
        start.min(self.batch_count())..self.batch_count()
    }
}
