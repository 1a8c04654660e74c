//! Per-row verification protocol.
//!
//! For one dataset row: search the item, pick the candidate whose code and
//! description both match exactly, enter quantity and unit cost, read the
//! total the ordering system computed and compare it with the expected one.
//! Driver faults are classified into outcomes and never returned as errors.

use std::error::Error as StdError;
use std::fmt::Write as _;

use tracing::{debug, info, warn};

use recon_model::{DatasetRow, FaultKind, ReconOptions, VerificationOutcome};

use crate::driver::{Candidate, DriverError, OrderField, OrderingSession};

/// Failure inside one verification step.
#[derive(Debug)]
struct StepFault {
    step: &'static str,
    kind: FaultKind,
    error: StepError,
}

#[derive(Debug, thiserror::Error)]
enum StepError {
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error("displayed total '{text}' is not a number")]
    UnreadableTotal { text: String },
}

impl StepFault {
    fn driver(step: &'static str, error: DriverError) -> Self {
        Self {
            step,
            kind: FaultKind::Driver,
            error: StepError::Driver(error),
        }
    }

    fn into_outcome(self, row: &DatasetRow) -> VerificationOutcome {
        let message = self.error.to_string();
        let mut trace = format!(
            "row {} (code {}): {} failed\n  {}",
            row.index,
            row.code.trim(),
            self.step,
            self.error
        );
        let mut source = self.error.source();
        while let Some(cause) = source {
            let _ = write!(trace, "\n  caused by: {cause}");
            source = cause.source();
        }
        VerificationOutcome::ProcessingError {
            kind: self.kind,
            message,
            trace,
        }
    }
}

/// Strips whitespace and thousands separators, then parses.
pub fn parse_displayed_total(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Position of the first candidate matching the row exactly.
pub fn find_candidate(candidates: &[Candidate], row: &DatasetRow) -> Option<usize> {
    let (code, product) = row.match_key();
    candidates
        .iter()
        .position(|candidate| candidate.matches(code, product))
}

#[derive(Debug, Clone)]
pub struct RowVerifier {
    options: ReconOptions,
}

impl RowVerifier {
    pub fn new(options: ReconOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReconOptions {
        &self.options
    }

    /// Verify one row. Always leaves the detail view closed.
    pub fn verify<S>(&self, session: &mut S, row: &DatasetRow) -> VerificationOutcome
    where
        S: OrderingSession + ?Sized,
    {
        let outcome = match self.run_steps(session, row) {
            Ok(outcome) => outcome,
            Err(fault) => {
                warn!(
                    row_index = row.index,
                    code = %row.code.trim(),
                    step = fault.step,
                    error = %fault.error,
                    "row verification failed"
                );
                fault.into_outcome(row)
            }
        };
        self.close_detail_view(session, row);
        outcome
    }

    /// Best-effort close of the detail view.
    pub fn close_detail_view<S>(&self, session: &mut S, row: &DatasetRow)
    where
        S: OrderingSession + ?Sized,
    {
        if let Err(error) = session.close_detail_view(self.options.timeouts.close()) {
            warn!(row_index = row.index, %error, "could not close the item detail view");
        }
    }

    fn run_steps<S>(
        &self,
        session: &mut S,
        row: &DatasetRow,
    ) -> Result<VerificationOutcome, StepFault>
    where
        S: OrderingSession + ?Sized,
    {
        let timeouts = &self.options.timeouts;
        let candidates = self.lookup(session, row)?;
        let Some(position) = find_candidate(&candidates, row) else {
            info!(
                row_index = row.index,
                code = %row.code.trim(),
                candidates = candidates.len(),
                "product not found"
            );
            return Ok(VerificationOutcome::NotFound {
                candidates: candidates.len(),
            });
        };

        let quantity = row.quantity.to_string();
        let unit_cost = row.cost_per_unit.to_string();
        for (field, value) in [
            (OrderField::Quantity, quantity.as_str()),
            (OrderField::UnitCost, unit_cost.as_str()),
        ] {
            session
                .clear_field(position, field, timeouts.field())
                .map_err(|err| StepFault::driver("clear field", err))?;
            session
                .set_field(position, field, value, timeouts.field())
                .map_err(|err| StepFault::driver("enter field", err))?;
        }
        debug!(row_index = row.index, %quantity, %unit_cost, "fields entered");

        let text = session
            .read_total(position, timeouts.total())
            .map_err(|err| StepFault::driver("read total", err))?;
        let actual = parse_displayed_total(&text).ok_or_else(|| StepFault {
            step: "read total",
            kind: FaultKind::Driver,
            error: StepError::UnreadableTotal { text: text.clone() },
        })?;

        let outcome =
            VerificationOutcome::from_totals(row.total_cost, actual, self.options.tolerance);
        match &outcome {
            VerificationOutcome::TotalMismatch { difference, .. } => info!(
                row_index = row.index,
                expected = row.total_cost,
                actual,
                difference,
                "total cost mismatch"
            ),
            _ => debug!(row_index = row.index, total = actual, "totals match"),
        }
        Ok(outcome)
    }

    /// Search and wait for candidates, retrying timed-out waits.
    fn lookup<S>(&self, session: &mut S, row: &DatasetRow) -> Result<Vec<Candidate>, StepFault>
    where
        S: OrderingSession + ?Sized,
    {
        let timeouts = &self.options.timeouts;
        let attempts = self.options.lookup_attempts.max(1);
        let term = row.code.trim();
        let mut attempt = 1;
        loop {
            let result = session
                .search(term, timeouts.search())
                .map_err(|err| ("search", err))
                .and_then(|()| {
                    session
                        .wait_for_results(timeouts.results())
                        .map_err(|err| ("wait for results", err))
                });
            match result {
                Ok(candidates) => return Ok(candidates),
                Err((step, error)) if error.is_timeout() => {
                    if attempt >= attempts {
                        return Err(StepFault {
                            step,
                            kind: FaultKind::LookupTimeout,
                            error: StepError::Driver(error),
                        });
                    }
                    warn!(
                        row_index = row.index,
                        attempt,
                        attempts,
                        %error,
                        "lookup timed out, retrying"
                    );
                    attempt += 1;
                }
                Err((step, error)) => return Err(StepFault::driver(step, error)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, product: &str) -> DatasetRow {
        DatasetRow {
            index: 0,
            code: code.to_string(),
            product: product.to_string(),
            unit: "Each".to_string(),
            quantity: 1,
            cost_per_unit: 1.0,
            total_cost: 1.0,
        }
    }

    #[test]
    fn displayed_total_strips_separators() {
        assert_eq!(parse_displayed_total(" 1,234.50 "), Some(1234.5));
        assert_eq!(parse_displayed_total("12"), Some(12.0));
        assert_eq!(parse_displayed_total(""), None);
        assert_eq!(parse_displayed_total("N/A"), None);
    }

    #[test]
    fn same_code_other_description_is_not_a_match() {
        let candidates = vec![
            Candidate::new("1001", "Flour 10kg"),
            Candidate::new("1001", "Flour 25kg"),
        ];
        assert_eq!(find_candidate(&candidates, &row("1001", "Flour 25kg")), Some(1));
        assert_eq!(find_candidate(&candidates, &row("1001", "Flour 5kg")), None);
    }

    #[test]
    fn first_exact_match_wins() {
        let candidates = vec![
            Candidate::new("1001", "Flour 25kg"),
            Candidate::new("1001", "Flour 25kg"),
        ];
        assert_eq!(find_candidate(&candidates, &row(" 1001", "Flour 25kg ")), Some(0));
    }

    #[test]
    fn fault_trace_names_step() {
        let fault = StepFault::driver("read total", DriverError::missing("total cell"));
        let outcome = fault.into_outcome(&row("1001", "Flour"));
        let VerificationOutcome::ProcessingError {
            kind,
            message,
            trace,
        } = outcome
        else {
            panic!("expected processing error");
        };
        assert_eq!(kind, FaultKind::Driver);
        assert_eq!(message, "element not found: total cell");
        assert!(trace.contains("read total failed"));
    }
}
