//! Error records written to the results store, one per non-matched row.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::outcome::{FaultKind, VerificationOutcome};
use crate::row::DatasetRow;

/// Error category label, as shown in the "Error Type" column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    ProductNotFound,
    TotalCostMismatch,
    LookupTimeout,
    ProcessingError,
}

impl ErrorType {
    pub fn label(self) -> &'static str {
        match self {
            Self::ProductNotFound => "Product Not Found",
            Self::TotalCostMismatch => "Total Cost Mismatch",
            Self::LookupTimeout => "Lookup Timeout",
            Self::ProcessingError => "Processing Error",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed leading columns of an error section.
pub const ERROR_HEADERS: [&str; 8] = [
    "Index",
    "Error Type",
    "Error Message",
    "Code",
    "Product",
    "Qty",
    "Cost per Unit",
    "Total Cost",
];

pub const WEB_TOTAL: &str = "Web Total";
pub const WEB_DIFFERENCE: &str = "Web Difference";
pub const CANDIDATES: &str = "Candidates";
pub const TRACEBACK: &str = "Traceback";

/// A failed row: the row's fields copied verbatim plus outcome details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub row_index: usize,
    pub error_type: ErrorType,
    pub error_message: String,
    pub code: String,
    pub product: String,
    pub quantity: i64,
    pub cost_per_unit: f64,
    pub total_cost: f64,
    /// Outcome-specific columns, in insertion order.
    pub extra: Vec<(String, String)>,
}

impl ErrorRecord {
    /// Build the record for a non-matched outcome; `None` for `Matched`.
    pub fn from_outcome(outcome: &VerificationOutcome, row: &DatasetRow) -> Option<Self> {
        let (error_type, error_message, extra) = match outcome {
            VerificationOutcome::Matched => return None,
            VerificationOutcome::NotFound { candidates } => (
                ErrorType::ProductNotFound,
                format!(
                    "Product code {} with description '{}' not found among {candidates} candidate(s).",
                    row.code.trim(),
                    row.product.trim()
                ),
                vec![(CANDIDATES.to_string(), candidates.to_string())],
            ),
            VerificationOutcome::TotalMismatch {
                actual, difference, ..
            } => (
                ErrorType::TotalCostMismatch,
                "Expected total cost does not match web total cost.".to_string(),
                vec![
                    (WEB_TOTAL.to_string(), actual.to_string()),
                    (WEB_DIFFERENCE.to_string(), difference.to_string()),
                ],
            ),
            VerificationOutcome::ProcessingError {
                kind,
                message,
                trace,
            } => {
                let error_type = match kind {
                    FaultKind::LookupTimeout => ErrorType::LookupTimeout,
                    FaultKind::Driver | FaultKind::Panic => ErrorType::ProcessingError,
                };
                (
                    error_type,
                    message.clone(),
                    vec![(TRACEBACK.to_string(), trace.clone())],
                )
            }
        };
        Some(Self {
            row_index: row.index,
            error_type,
            error_message,
            code: row.code.clone(),
            product: row.product.clone(),
            quantity: row.quantity,
            cost_per_unit: row.cost_per_unit,
            total_cost: row.total_cost,
            extra,
        })
    }

    /// Value of an extra column, if present.
    pub fn extra_value(&self, name: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Cells for the fixed [`ERROR_HEADERS`] columns.
    pub fn fixed_cells(&self) -> Vec<String> {
        vec![
            self.row_index.to_string(),
            self.error_type.label().to_string(),
            self.error_message.clone(),
            self.code.clone(),
            self.product.clone(),
            self.quantity.to_string(),
            self.cost_per_unit.to_string(),
            self.total_cost.to_string(),
        ]
    }
}
