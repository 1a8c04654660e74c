//! Per-row verification outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a fault raised while talking to the ordering system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultKind {
    /// The search results never appeared within the wait budget.
    LookupTimeout,
    /// Any other driver failure (missing element, transport, rejected input).
    Driver,
    /// The verifier panicked; caught by the batch runner.
    Panic,
}

/// Result of verifying one dataset row. Exactly one per row per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VerificationOutcome {
    Matched,
    /// No candidate matched both code and description.
    NotFound { candidates: usize },
    /// The displayed total disagrees beyond tolerance.
    ///
    /// `difference` is `actual - expected`.
    TotalMismatch {
        expected: f64,
        actual: f64,
        difference: f64,
    },
    ProcessingError {
        kind: FaultKind,
        message: String,
        trace: String,
    },
}

/// Outcome discriminant, used for tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutcomeKind {
    Matched,
    NotFound,
    TotalMismatch,
    LookupTimeout,
    ProcessingError,
}

impl VerificationOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Matched => OutcomeKind::Matched,
            Self::NotFound { .. } => OutcomeKind::NotFound,
            Self::TotalMismatch { .. } => OutcomeKind::TotalMismatch,
            Self::ProcessingError {
                kind: FaultKind::LookupTimeout,
                ..
            } => OutcomeKind::LookupTimeout,
            Self::ProcessingError { .. } => OutcomeKind::ProcessingError,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched)
    }

    /// Compare an expected total against the displayed one.
    ///
    /// Uses a relative tolerance scaled by the larger magnitude, so
    /// `100.00` vs `100.0099` matches at `1e-4` and `100.00` vs `100.02`
    /// does not.
    pub fn from_totals(expected: f64, actual: f64, tolerance: f64) -> Self {
        if totals_match(expected, actual, tolerance) {
            Self::Matched
        } else {
            Self::TotalMismatch {
                expected,
                actual,
                difference: actual - expected,
            }
        }
    }
}

/// Relative closeness test: `|a - b| <= tol * max(|a|, |b|)`.
pub fn totals_match(expected: f64, actual: f64, tolerance: f64) -> bool {
    if expected == actual {
        return true;
    }
    if !expected.is_finite() || !actual.is_finite() {
        return false;
    }
    let diff = (actual - expected).abs();
    diff <= tolerance * expected.abs().max(actual.abs())
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 5] = [
        OutcomeKind::Matched,
        OutcomeKind::NotFound,
        OutcomeKind::TotalMismatch,
        OutcomeKind::LookupTimeout,
        OutcomeKind::ProcessingError,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::NotFound => "not found",
            Self::TotalMismatch => "total mismatch",
            Self::LookupTimeout => "lookup timeout",
            Self::ProcessingError => "processing error",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running tally of outcomes by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub matched: usize,
    pub not_found: usize,
    pub total_mismatch: usize,
    pub lookup_timeout: usize,
    pub processing_error: usize,
}

impl OutcomeCounts {
    pub fn add(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Matched => self.matched += 1,
            OutcomeKind::NotFound => self.not_found += 1,
            OutcomeKind::TotalMismatch => self.total_mismatch += 1,
            OutcomeKind::LookupTimeout => self.lookup_timeout += 1,
            OutcomeKind::ProcessingError => self.processing_error += 1,
        }
    }

    pub fn merge(&mut self, other: &OutcomeCounts) {
        self.matched += other.matched;
        self.not_found += other.not_found;
        self.total_mismatch += other.total_mismatch;
        self.lookup_timeout += other.lookup_timeout;
        self.processing_error += other.processing_error;
    }

    pub fn get(&self, kind: OutcomeKind) -> usize {
        match kind {
            OutcomeKind::Matched => self.matched,
            OutcomeKind::NotFound => self.not_found,
            OutcomeKind::TotalMismatch => self.total_mismatch,
            OutcomeKind::LookupTimeout => self.lookup_timeout,
            OutcomeKind::ProcessingError => self.processing_error,
        }
    }

    pub fn total(&self) -> usize {
        self.matched + self.failures()
    }

    /// Number of non-matched outcomes; equals the error records written.
    pub fn failures(&self) -> usize {
        self.not_found + self.total_mismatch + self.lookup_timeout + self.processing_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tolerance_boundary() {
        assert!(VerificationOutcome::from_totals(100.0, 100.0099, 1e-4).is_matched());

        let outcome = VerificationOutcome::from_totals(100.0, 100.02, 1e-4);
        let VerificationOutcome::TotalMismatch {
            expected,
            actual,
            difference,
        } = outcome
        else {
            panic!("expected mismatch, got {outcome:?}");
        };
        assert_eq!(expected, 100.0);
        assert_eq!(actual, 100.02);
        assert!((difference - 0.02).abs() < 1e-9);
    }

    #[test]
    fn difference_is_signed() {
        let outcome = VerificationOutcome::from_totals(50.0, 40.0, 1e-4);
        assert!(matches!(
            outcome,
            VerificationOutcome::TotalMismatch { difference, .. } if (difference + 10.0).abs() < 1e-9
        ));
    }

    #[test]
    fn zero_totals_match() {
        assert!(totals_match(0.0, 0.0, 1e-4));
        assert!(!totals_match(0.0, 0.01, 1e-4));
    }

    #[test]
    fn nan_never_matches() {
        assert!(!totals_match(10.0, f64::NAN, 1e-4));
    }

    #[test]
    fn lookup_timeout_has_own_kind() {
        let outcome = VerificationOutcome::ProcessingError {
            kind: FaultKind::LookupTimeout,
            message: "timed out".to_string(),
            trace: String::new(),
        };
        assert_eq!(outcome.kind(), OutcomeKind::LookupTimeout);
    }

    #[test]
    fn counts_track_failures() {
        let mut counts = OutcomeCounts::default();
        counts.add(OutcomeKind::Matched);
        counts.add(OutcomeKind::NotFound);
        counts.add(OutcomeKind::ProcessingError);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.failures(), 2);
    }

    proptest! {
        #[test]
        fn totals_match_is_symmetric(
            a in -1.0e6f64..1.0e6,
            b in -1.0e6f64..1.0e6,
            tolerance in 0.0f64..0.1,
        ) {
            prop_assert_eq!(totals_match(a, b, tolerance), totals_match(b, a, tolerance));
        }

        #[test]
        fn a_total_matches_itself(a in -1.0e6f64..1.0e6) {
            prop_assert!(totals_match(a, a, 0.0));
        }
    }
}
