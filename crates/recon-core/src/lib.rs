pub mod catalog;
pub mod checkpoint;
pub mod controller;
pub mod driver;
pub mod ledger;
pub mod results;
pub mod runner;
pub mod store;
pub mod verifier;

pub use catalog::{CatalogDriver, CatalogItem, OrderLine, format_amount};
pub use checkpoint::CheckpointStore;
pub use controller::{
    ControllerError, Disposition, RunConfig, RunController, RunReport, RunState,
};
pub use driver::{
    Candidate, DriverError, DriverResult, OrderField, OrderingSession, SessionContext,
};
pub use ledger::ErrorLedger;
pub use results::{ResultsDocument, ResultsSink, ResultsStore, Section, dataset_fingerprint};
pub use runner::{
    BatchRunner, BatchSummary, LogProgress, ProgressObserver, RowProgress, RunnerError,
};
pub use store::{StoreError, write_atomic};
pub use verifier::{RowVerifier, find_candidate, parse_displayed_total};
