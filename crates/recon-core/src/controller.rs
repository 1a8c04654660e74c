//! Run controller: session lifecycle, batch loop and checkpointing.
//!
//! A run moves through `Init -> SessionSetup -> BatchLoop -> Teardown` and
//! ends `Done` or `Aborted`. Teardown runs on every path that got past
//! `Init`, and the checkpoint always names the next batch that has not
//! been fully recorded.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, error, info, info_span, warn};

use recon_model::{DatasetRow, OutcomeCounts, ReconError, ReconOptions};

use crate::checkpoint::CheckpointStore;
use crate::driver::{DriverError, OrderingSession, SessionContext};
use crate::results::{ResultsSink, ResultsStore, Section, dataset_fingerprint};
use crate::runner::{BatchRunner, ProgressObserver, RunnerError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("invalid options: {0}")]
    InvalidOptions(#[from] ReconError),

    #[error("failed to reset the checkpoint: {0}")]
    Reset(#[source] StoreError),

    #[error("session setup failed: {0}")]
    SessionSetup(#[source] DriverError),

    #[error("failed to write the input data section: {0}")]
    InputReference(#[source] StoreError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("failed to advance the checkpoint past batch {}: {source}", batch + 1)]
    Checkpoint {
        batch: usize,
        #[source]
        source: StoreError,
    },
}

/// Everything one run needs, passed in explicitly.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub checkpoint_path: PathBuf,
    pub results_path: PathBuf,
    pub options: ReconOptions,
    /// Clear the checkpoint before reading it.
    pub reset: bool,
    pub session: SessionContext,
}

impl RunConfig {
    pub fn new(checkpoint_path: impl Into<PathBuf>, results_path: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_path: checkpoint_path.into(),
            results_path: results_path.into(),
            options: ReconOptions::default(),
            reset: false,
            session: SessionContext::default(),
        }
    }

    pub fn with_options(mut self, options: ReconOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    pub fn with_session(mut self, session: SessionContext) -> Self {
        self.session = session;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Init,
    SessionSetup,
    BatchLoop,
    Teardown,
    Done,
    Aborted,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::SessionSetup => "session setup",
            Self::BatchLoop => "batch loop",
            Self::Teardown => "teardown",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal classification of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Done,
    /// Stopped before the last batch; `at_batch` is where a rerun resumes.
    Aborted { at_batch: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub start_batch: usize,
    pub total_batches: usize,
    pub batches_completed: usize,
    pub rows_processed: usize,
    pub counts: OutcomeCounts,
    pub disposition: Disposition,
    /// Commit or release failure; does not change the disposition.
    pub teardown_error: Option<String>,
    /// States entered, in order.
    pub states: Vec<RunState>,
    /// Error sections written during this run.
    pub sections_written: Vec<String>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            start_batch: 0,
            total_batches: 0,
            batches_completed: 0,
            rows_processed: 0,
            counts: OutcomeCounts::default(),
            disposition: Disposition::Done,
            teardown_error: None,
            states: Vec::new(),
            sections_written: Vec::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.disposition, Disposition::Done)
    }

    pub fn resumed(&self) -> bool {
        self.start_batch > 0
    }

    fn enter(&mut self, state: RunState) {
        debug!(state = %state, "run state");
        self.states.push(state);
    }

    fn abort(&mut self, at_batch: usize, error: &ControllerError) {
        let reason = render_chain(error);
        error!(batch = at_batch + 1, error = %reason, "run aborted");
        self.disposition = Disposition::Aborted { at_batch, reason };
    }
}

fn render_chain(error: &dyn std::error::Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}

/// Drives one reconciliation run over a dataset.
pub struct RunController<R: ResultsSink = ResultsStore> {
    config: RunConfig,
    checkpoint: CheckpointStore,
    results: R,
    runner: BatchRunner,
}

impl RunController<ResultsStore> {
    pub fn new(config: RunConfig) -> Result<Self, ControllerError> {
        let results = ResultsStore::new(config.results_path.clone());
        Self::with_results(config, results)
    }
}

impl<R: ResultsSink> RunController<R> {
    /// Use a custom results sink instead of the file store at
    /// `config.results_path`.
    pub fn with_results(config: RunConfig, results: R) -> Result<Self, ControllerError> {
        config.options.validate()?;
        Ok(Self {
            checkpoint: CheckpointStore::new(config.checkpoint_path.clone()),
            runner: BatchRunner::new(config.options.clone()),
            config,
            results,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn checkpoint(&self) -> &CheckpointStore {
        &self.checkpoint
    }

    pub fn results(&self) -> &R {
        &self.results
    }

    pub fn into_results(self) -> R {
        self.results
    }

    /// Run every remaining batch of `dataset` against `session`.
    ///
    /// Never fails: setup and runner faults end the run as
    /// [`Disposition::Aborted`] with the checkpoint left for a resume.
    pub fn run<S>(
        &mut self,
        session: &mut S,
        dataset: &[DatasetRow],
        observer: &mut dyn ProgressObserver,
    ) -> RunReport
    where
        S: OrderingSession + ?Sized,
    {
        let span = info_span!(
            "run",
            rows = dataset.len(),
            batch_size = self.config.options.batch_size
        );
        let _guard = span.enter();
        let mut report = RunReport::new();

        report.enter(RunState::Init);
        if self.config.reset {
            if let Err(err) = self.checkpoint.clear() {
                report.abort(0, &ControllerError::Reset(err));
                report.enter(RunState::Aborted);
                return report;
            }
            info!(path = %self.checkpoint.path().display(), "checkpoint reset");
        }
        let plan = match self.runner.plan(dataset) {
            Ok(plan) => plan,
            Err(err) => {
                report.abort(0, &ControllerError::InvalidOptions(err));
                report.enter(RunState::Aborted);
                return report;
            }
        };
        let start = self.checkpoint.read();
        report.start_batch = start;
        report.total_batches = plan.batch_count();
        if start > 0 {
            info!(
                batch = start + 1,
                batches = plan.batch_count(),
                "resuming from checkpoint"
            );
        } else {
            info!(batches = plan.batch_count(), "starting fresh run");
        }

        report.enter(RunState::SessionSetup);
        let timeouts = self.config.options.timeouts;
        match session.open(&self.config.session, timeouts.session()) {
            Ok(()) => {
                info!("ordering session ready");
                report.enter(RunState::BatchLoop);
                self.batch_loop(session, dataset, start, observer, &mut report);
            }
            Err(err) => report.abort(start, &ControllerError::SessionSetup(err)),
        }

        report.enter(RunState::Teardown);
        let mut teardown_errors = Vec::new();
        if let Err(err) = session.commit_form(timeouts.commit()) {
            warn!(error = %err, "failed to save the order form");
            teardown_errors.push(format!("commit: {err}"));
        }
        if let Err(err) = session.release() {
            warn!(error = %err, "failed to release the ordering session");
            teardown_errors.push(format!("release: {err}"));
        }
        if !teardown_errors.is_empty() {
            report.teardown_error = Some(teardown_errors.join("; "));
        }

        if report.is_done() {
            report.enter(RunState::Done);
            info!(
                batches = report.batches_completed,
                rows = report.rows_processed,
                failures = report.counts.failures(),
                "run completed"
            );
        } else {
            report.enter(RunState::Aborted);
        }
        report
    }

    fn batch_loop<S>(
        &mut self,
        session: &mut S,
        dataset: &[DatasetRow],
        start: usize,
        observer: &mut dyn ProgressObserver,
        report: &mut RunReport,
    ) where
        S: OrderingSession + ?Sized,
    {
        let fingerprint = dataset_fingerprint(dataset);
        if start == 0 {
            let section = Section::input_data(dataset);
            if let Err(err) = self.results.write_fresh(section, Some(fingerprint)) {
                report.abort(0, &ControllerError::InputReference(err));
                return;
            }
        } else {
            match self.results.fingerprint() {
                Ok(Some(recorded)) if recorded != fingerprint => warn!(
                    recorded = %recorded,
                    current = %fingerprint,
                    "dataset differs from the one this checkpoint was taken on"
                ),
                Ok(Some(_)) => debug!("dataset fingerprint matches"),
                Ok(None) => debug!("results store has no dataset fingerprint"),
                Err(err) => warn!(error = %err, "could not read the results store fingerprint"),
            }
        }

        let total_batches = report.total_batches;
        for batch in start.min(total_batches)..total_batches {
            let summary = match self
                .runner
                .run_batch(session, &mut self.results, dataset, batch, observer)
            {
                Ok(summary) => summary,
                Err(err) => {
                    report.abort(batch, &ControllerError::Runner(err));
                    return;
                }
            };
            report.batches_completed += 1;
            report.rows_processed += summary.rows.len();
            report.counts.merge(&summary.counts);
            report.sections_written.extend(summary.section);

            if let Err(source) = self.checkpoint.write(batch + 1) {
                report.abort(batch, &ControllerError::Checkpoint { batch, source });
                return;
            }
        }
    }

    /// Clear the checkpoint after a `Done` run. Returns whether it was
    /// cleared; an aborted run keeps it for the next resume.
    pub fn complete(&self, report: &RunReport) -> Result<bool, StoreError> {
        if !report.is_done() {
            info!(
                path = %self.checkpoint.path().display(),
                "run not complete, checkpoint kept"
            );
            return Ok(false);
        }
        self.checkpoint.clear()?;
        Ok(true)
    }
}

impl<R: ResultsSink + fmt::Debug> fmt::Debug for RunController<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunController")
            .field("config", &self.config)
            .field("checkpoint", &self.checkpoint)
            .field("results", &self.results)
            .finish_non_exhaustive()
    }
}
