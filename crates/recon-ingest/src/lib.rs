//! Order dataset ingestion.
//!
//! Reads the prepared dataset consumed by the reconciliation engine and,
//! optionally, builds it from the raw supplier exports.

pub mod csv_table;
pub mod dataset;
pub mod error;
pub mod merge;
pub mod numeric;

pub use csv_table::{CsvTable, normalize_header, read_csv_table, read_csv_table_with_headers};
pub use dataset::{load_dataset, rows_from_table, write_dataset_csv};
pub use error::{IngestError, Result};
pub use merge::{MergedDataset, merge_source_files, merge_tables};
pub use numeric::{
    clean_amount, is_numeric_code, normalize_description, parse_amount, parse_quantity,
};
