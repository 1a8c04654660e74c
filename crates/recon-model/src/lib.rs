pub mod batch;
pub mod error;
pub mod options;
pub mod outcome;
pub mod record;
pub mod row;

pub use batch::{BatchPlan, INPUT_SECTION, error_section_name};
pub use error::{ReconError, Result};
pub use options::{DEFAULT_BATCH_SIZE, DEFAULT_TOLERANCE, ReconOptions, Timeouts};
pub use outcome::{FaultKind, OutcomeCounts, OutcomeKind, VerificationOutcome, totals_match};
pub use record::{ERROR_HEADERS, ErrorRecord, ErrorType};
pub use row::{DATASET_HEADERS, DatasetRow};
