use std::path::PathBuf;

use recon_core::RunReport;

#[derive(Debug)]
pub struct RunOutcome {
    pub dataset: PathBuf,
    pub rows: usize,
    pub results: PathBuf,
    pub checkpoint: PathBuf,
    pub report: RunReport,
    pub checkpoint_cleared: bool,
}

#[derive(Debug)]
pub struct PrepareOutcome {
    pub output: PathBuf,
    pub rows: usize,
    pub duplicates: usize,
    pub duplicates_path: Option<PathBuf>,
    pub unmatched: usize,
    pub non_numeric_codes: usize,
}

#[derive(Debug)]
pub struct StatusReport {
    pub checkpoint: PathBuf,
    /// `None` when no checkpoint file exists.
    pub next_batch: Option<usize>,
    pub results: PathBuf,
    pub updated_at: Option<String>,
    pub fingerprint: Option<String>,
    pub sections: Vec<SectionCount>,
}

#[derive(Debug)]
pub struct SectionCount {
    pub name: String,
    pub rows: usize,
}

#[derive(Debug)]
pub struct ExportOutcome {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}
