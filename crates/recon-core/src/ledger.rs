//! Per-batch accumulator of error records.

use tracing::{debug, info};

use recon_model::{DatasetRow, ERROR_HEADERS, ErrorRecord, VerificationOutcome, error_section_name};

use crate::results::{ResultsSink, Section};
use crate::store::Result;

/// Error records of one batch, in insertion order.
///
/// Recording the same row twice keeps both records. A ledger lives for one
/// batch and is consumed by [`ErrorLedger::flush`].
#[derive(Debug, Default)]
pub struct ErrorLedger {
    records: Vec<ErrorRecord>,
}

impl ErrorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a non-matched outcome. Returns whether a record was added.
    pub fn record(&mut self, outcome: &VerificationOutcome, row: &DatasetRow) -> bool {
        let Some(record) = ErrorRecord::from_outcome(outcome, row) else {
            return false;
        };
        debug!(
            row_index = record.row_index,
            error_type = %record.error_type,
            "error recorded"
        );
        self.records.push(record);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    /// The batch's error section; `None` when nothing was recorded.
    ///
    /// Columns are the fixed error headers followed by every extra column
    /// in first-seen order.
    pub fn to_section(&self, batch: usize) -> Option<Section> {
        if self.records.is_empty() {
            return None;
        }
        let mut headers: Vec<String> = ERROR_HEADERS.iter().map(|h| (*h).to_string()).collect();
        for record in &self.records {
            for (name, _) in &record.extra {
                if !headers.iter().any(|h| h == name) {
                    headers.push(name.clone());
                }
            }
        }
        let extra_columns = &headers[ERROR_HEADERS.len()..];
        let rows = self
            .records
            .iter()
            .map(|record| {
                let mut cells = record.fixed_cells();
                cells.extend(
                    extra_columns
                        .iter()
                        .map(|name| record.extra_value(name).unwrap_or_default().to_string()),
                );
                cells
            })
            .collect();
        Some(Section {
            name: error_section_name(batch),
            headers,
            rows,
        })
    }

    /// Write the batch's section, replacing one of the same name.
    ///
    /// Writes nothing when empty. Returns the section name written.
    pub fn flush<R>(self, sink: &mut R, batch: usize) -> Result<Option<String>>
    where
        R: ResultsSink + ?Sized,
    {
        let Some(section) = self.to_section(batch) else {
            debug!(batch = batch + 1, "no errors to save");
            return Ok(None);
        };
        let name = section.name.clone();
        let count = section.rows.len();
        sink.replace_section(section)?;
        info!(batch = batch + 1, section = %name, errors = count, "errors saved");
        Ok(Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use recon_model::FaultKind;

    fn row(index: usize) -> DatasetRow {
        DatasetRow {
            index,
            code: format!("{}", 1000 + index),
            product: format!("Item {index}"),
            unit: "Each".to_string(),
            quantity: 2,
            cost_per_unit: 3.0,
            total_cost: 6.0,
        }
    }

    #[test]
    fn matched_is_not_recorded() {
        let mut ledger = ErrorLedger::new();
        assert!(!ledger.record(&VerificationOutcome::Matched, &row(0)));
        assert!(ledger.is_empty());
        assert!(ledger.to_section(0).is_none());
    }

    #[test]
    fn duplicates_are_preserved_in_order() {
        let mut ledger = ErrorLedger::new();
        let outcome = VerificationOutcome::NotFound { candidates: 0 };
        ledger.record(&outcome, &row(3));
        ledger.record(&outcome, &row(1));
        ledger.record(&outcome, &row(3));
        let indexes: Vec<usize> = ledger.records().iter().map(|r| r.row_index).collect();
        assert_eq!(indexes, vec![3, 1, 3]);
    }

    #[test]
    fn section_unions_extra_columns() {
        let mut ledger = ErrorLedger::new();
        ledger.record(
            &VerificationOutcome::TotalMismatch {
                expected: 6.0,
                actual: 7.0,
                difference: 1.0,
            },
            &row(0),
        );
        ledger.record(
            &VerificationOutcome::ProcessingError {
                kind: FaultKind::Driver,
                message: "lost".to_string(),
                trace: "trace".to_string(),
            },
            &row(1),
        );
        let section = ledger.to_section(4).expect("section");
        assert_eq!(section.name, "Errors Batch 5");
        assert_eq!(
            &section.headers[ERROR_HEADERS.len()..],
            &["Web Total", "Web Difference", "Traceback"]
        );
        assert_eq!(section.value(0, "Web Difference"), Some("1"));
        assert_eq!(section.value(0, "Traceback"), Some(""));
        assert_eq!(section.value(1, "Traceback"), Some("trace"));
        assert_eq!(section.value(1, "Error Type"), Some("Processing Error"));
    }

    fn outcome(choice: u8) -> VerificationOutcome {
        match choice {
            0 => VerificationOutcome::Matched,
            1 => VerificationOutcome::NotFound { candidates: 2 },
            2 => VerificationOutcome::from_totals(6.0, 9.0, 1e-4),
            3 => VerificationOutcome::ProcessingError {
                kind: FaultKind::LookupTimeout,
                message: "no results".to_string(),
                trace: String::new(),
            },
            _ => VerificationOutcome::ProcessingError {
                kind: FaultKind::Panic,
                message: "boom".to_string(),
                trace: "trace".to_string(),
            },
        }
    }

    proptest! {
        #[test]
        fn section_has_one_row_per_failure(choices in prop::collection::vec(0u8..5, 0..60)) {
            let mut ledger = ErrorLedger::new();
            for (index, choice) in choices.iter().enumerate() {
                ledger.record(&outcome(*choice), &row(index));
            }
            let failures = choices.iter().filter(|choice| **choice != 0).count();
            prop_assert_eq!(ledger.len(), failures);
            match ledger.to_section(0) {
                Some(section) => {
                    prop_assert_eq!(section.rows.len(), failures);
                    prop_assert!(section.rows.iter().all(|cells| cells.len() == section.headers.len()));
                }
                None => {
                    prop_assert_eq!(failures, 0);
                }
            }
        }
    }
}
