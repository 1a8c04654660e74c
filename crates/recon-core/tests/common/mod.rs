#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::time::Duration;

use recon_core::{
    CatalogDriver, CatalogItem, Candidate, DriverError, DriverResult, OrderField,
    OrderingSession, ProgressObserver, ResultsSink, ResultsStore, RowProgress, BatchSummary,
    Section, SessionContext, StoreError,
};
use recon_model::{DatasetRow, ReconOptions, Timeouts};

/// Per-code behaviour of [`ScriptedDriver`].
#[derive(Debug, Clone)]
pub enum Script {
    /// The results wait times out this many times before succeeding.
    LookupTimeouts(u32),
    /// Field entry fails with a missing element.
    FieldFault,
    /// Reading the total panics.
    Panic,
    /// Show this text instead of the computed total.
    Displayed(String),
}

/// Catalogue driver with injectable faults and call accounting.
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    pub inner: CatalogDriver,
    scripts: HashMap<String, Script>,
    current: String,
    pub fail_open: bool,
    pub fail_commit: bool,
    pub searches: Vec<String>,
    pub closes: usize,
    pub commits: usize,
    pub releases: usize,
}

impl ScriptedDriver {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            inner: CatalogDriver::new(items),
            ..Self::default()
        }
    }

    /// Catalogue holding every row of `rows` exactly.
    pub fn for_rows(rows: &[DatasetRow]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| CatalogItem::new(row.code.clone(), row.product.clone()))
                .collect(),
        )
    }

    pub fn script(mut self, code: &str, script: Script) -> Self {
        self.scripts.insert(code.to_string(), script);
        self
    }

    fn current_script(&self) -> Option<&Script> {
        self.scripts.get(&self.current)
    }
}

impl OrderingSession for ScriptedDriver {
    fn open(&mut self, context: &SessionContext, timeout: Duration) -> DriverResult<()> {
        if self.fail_open {
            return Err(DriverError::timeout("login form", timeout));
        }
        self.inner.open(context, timeout)
    }

    fn search(&mut self, term: &str, timeout: Duration) -> DriverResult<()> {
        self.searches.push(term.to_string());
        self.current = term.to_string();
        self.inner.search(term, timeout)
    }

    fn wait_for_results(&mut self, timeout: Duration) -> DriverResult<Vec<Candidate>> {
        if let Some(Script::LookupTimeouts(remaining)) = self.scripts.get_mut(&self.current)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(DriverError::timeout("search results", timeout));
        }
        self.inner.wait_for_results(timeout)
    }

    fn clear_field(
        &mut self,
        position: usize,
        field: OrderField,
        timeout: Duration,
    ) -> DriverResult<()> {
        if matches!(self.current_script(), Some(Script::FieldFault)) {
            return Err(DriverError::missing("quantity input"));
        }
        self.inner.clear_field(position, field, timeout)
    }

    fn set_field(
        &mut self,
        position: usize,
        field: OrderField,
        value: &str,
        timeout: Duration,
    ) -> DriverResult<()> {
        self.inner.set_field(position, field, value, timeout)
    }

    fn read_total(&mut self, position: usize, timeout: Duration) -> DriverResult<String> {
        let computed = self.inner.read_total(position, timeout)?;
        match self.current_script() {
            Some(Script::Panic) => panic!("driver crashed on {}", self.current),
            Some(Script::Displayed(text)) => Ok(text.clone()),
            _ => Ok(computed),
        }
    }

    fn close_detail_view(&mut self, timeout: Duration) -> DriverResult<()> {
        self.closes += 1;
        self.inner.close_detail_view(timeout)
    }

    fn commit_form(&mut self, timeout: Duration) -> DriverResult<()> {
        self.commits += 1;
        if self.fail_commit {
            return Err(DriverError::Transport {
                message: "save button did not respond".to_string(),
            });
        }
        self.inner.commit_form(timeout)
    }

    fn release(&mut self) -> DriverResult<()> {
        self.releases += 1;
        self.inner.release()
    }
}

/// Results store that fails the Nth section replacement (1-based).
#[derive(Debug)]
pub struct FailingSink {
    pub store: ResultsStore,
    pub fail_on_replace: usize,
    pub replaces: usize,
}

impl FailingSink {
    pub fn new(path: &Path, fail_on_replace: usize) -> Self {
        Self {
            store: ResultsStore::new(path),
            fail_on_replace,
            replaces: 0,
        }
    }
}

impl ResultsSink for FailingSink {
    fn write_fresh(&mut self, section: Section, fingerprint: Option<String>) -> Result<(), StoreError> {
        self.store.write_fresh(section, fingerprint)
    }

    fn replace_section(&mut self, section: Section) -> Result<(), StoreError> {
        self.replaces += 1;
        if self.replaces == self.fail_on_replace {
            return Err(StoreError::Io {
                operation: "write",
                path: self.store.path().to_path_buf(),
                source: io::Error::other("disk full"),
            });
        }
        self.store.replace_section(section)
    }

    fn fingerprint(&self) -> Result<Option<String>, StoreError> {
        self.store.fingerprint()
    }
}

/// Observer keeping everything it was told.
#[derive(Debug, Default)]
pub struct Recorder {
    pub rows: Vec<RowProgress>,
    pub batches: Vec<BatchSummary>,
}

impl ProgressObserver for Recorder {
    fn row_completed(&mut self, progress: &RowProgress) {
        self.rows.push(*progress);
    }

    fn batch_completed(&mut self, summary: &BatchSummary) {
        self.batches.push(summary.clone());
    }
}

/// `count` rows with codes 1000.. whose totals are quantity times 2.5.
pub fn dataset(count: usize) -> Vec<DatasetRow> {
    (0..count)
        .map(|index| {
            let quantity = (index % 5 + 1) as i64;
            DatasetRow {
                index,
                code: code(index),
                product: format!("Item {index}"),
                unit: "Each".to_string(),
                quantity,
                cost_per_unit: 2.5,
                total_cost: quantity as f64 * 2.5,
            }
        })
        .collect()
}

pub fn code(index: usize) -> String {
    (1000 + index).to_string()
}

pub fn options(batch_size: usize) -> ReconOptions {
    ReconOptions {
        timeouts: Timeouts {
            search_secs: 1,
            results_secs: 1,
            field_secs: 1,
            total_secs: 1,
            close_secs: 1,
            session_secs: 1,
            commit_secs: 1,
        },
        ..ReconOptions::default()
    }
    .with_batch_size(batch_size)
}
