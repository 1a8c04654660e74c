//! Batch runner: verifies every row of one batch and flushes its errors.

use std::any::Any;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::{debug, error, info, info_span};

use recon_model::{
    BatchPlan, DatasetRow, FaultKind, OutcomeCounts, OutcomeKind, ReconError,
    ReconOptions, VerificationOutcome,
};

use crate::driver::OrderingSession;
use crate::ledger::ErrorLedger;
use crate::results::ResultsSink;
use crate::store::StoreError;
use crate::verifier::RowVerifier;

/// A fault of the runner itself, as opposed to a row failure.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Plan(#[from] ReconError),

    #[error("batch {} is past the end of the dataset ({batches} batches)", batch + 1)]
    OutOfRange { batch: usize, batches: usize },

    #[error("failed to save errors for batch {}: {source}", batch + 1)]
    Flush {
        batch: usize,
        #[source]
        source: StoreError,
    },
}

/// Progress after one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowProgress {
    pub batch: usize,
    pub row_index: usize,
    /// Rows completed so far, counting from the first row of the dataset.
    pub completed: usize,
    pub total: usize,
    pub outcome: OutcomeKind,
}

/// What one batch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub batch: usize,
    pub rows: Range<usize>,
    pub counts: OutcomeCounts,
    /// Error section written, if any.
    pub section: Option<String>,
}

/// Receives progress from the runner.
pub trait ProgressObserver {
    fn row_completed(&mut self, progress: &RowProgress);

    fn batch_completed(&mut self, _summary: &BatchSummary) {}
}

/// Observer that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn row_completed(&mut self, progress: &RowProgress) {
        debug!(
            row = progress.completed,
            total = progress.total,
            outcome = %progress.outcome,
            "row processed"
        );
    }
}

#[derive(Debug, Clone)]
pub struct BatchRunner {
    verifier: RowVerifier,
    batch_size: usize,
}

impl BatchRunner {
    pub fn new(options: ReconOptions) -> Self {
        Self {
            batch_size: options.batch_size,
            verifier: RowVerifier::new(options),
        }
    }

    pub fn verifier(&self) -> &RowVerifier {
        &self.verifier
    }

    pub fn plan(&self, dataset: &[DatasetRow]) -> Result<BatchPlan, ReconError> {
        BatchPlan::new(dataset.len(), self.batch_size)
    }

    /// Verify every row of `batch` in index order, then flush its errors.
    ///
    /// Row failures, including panics inside the verifier, are recorded and
    /// never stop the batch. Only a failed flush is returned as an error.
    pub fn run_batch<S, R>(
        &self,
        session: &mut S,
        sink: &mut R,
        dataset: &[DatasetRow],
        batch: usize,
        observer: &mut dyn ProgressObserver,
    ) -> Result<BatchSummary, RunnerError>
    where
        S: OrderingSession + ?Sized,
        R: ResultsSink + ?Sized,
    {
        let plan = self.plan(dataset)?;
        if batch >= plan.batch_count() {
            return Err(RunnerError::OutOfRange {
                batch,
                batches: plan.batch_count(),
            });
        }
        let rows = plan.rows(batch);
        let span = info_span!("batch", batch = batch + 1, first_row = rows.start, rows = rows.len());
        let _guard = span.enter();
        info!("batch started");

        let mut ledger = ErrorLedger::new();
        let mut counts = OutcomeCounts::default();
        for row in &dataset[rows.clone()] {
            let outcome = self.verify_guarded(session, row);
            counts.add(outcome.kind());
            ledger.record(&outcome, row);
            let progress = RowProgress {
                batch,
                row_index: row.index,
                completed: row.index + 1,
                total: dataset.len(),
                outcome: outcome.kind(),
            };
            observer.row_completed(&progress);
        }

        let section = ledger
            .flush(sink, batch)
            .map_err(|source| RunnerError::Flush { batch, source })?;
        let summary = BatchSummary {
            batch,
            rows,
            counts,
            section,
        };
        info!(
            matched = summary.counts.matched,
            failed = summary.counts.failures(),
            "batch completed"
        );
        observer.batch_completed(&summary);
        Ok(summary)
    }

    fn verify_guarded<S>(&self, session: &mut S, row: &DatasetRow) -> VerificationOutcome
    where
        S: OrderingSession + ?Sized,
    {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| self.verifier.verify(session, row)));
        match attempt {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(row_index = row.index, %message, "row verification panicked");
                self.verifier.close_detail_view(session, row);
                VerificationOutcome::ProcessingError {
                    kind: FaultKind::Panic,
                    trace: format!(
                        "row {} (code {}): verifier panicked\n  {message}",
                        row.index,
                        row.code.trim()
                    ),
                    message,
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "verifier panicked".to_string()
    }
}
