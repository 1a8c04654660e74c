//! Results store: one JSON document holding named table sections.
//!
//! A fresh run writes the `Input Data` section, replacing the whole
//! document. Every batch with failures then replaces (or appends) its
//! `Errors Batch N` section, so re-running a batch is idempotent.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use recon_model::{DATASET_HEADERS, DatasetRow, INPUT_SECTION};

use crate::store::{Result, StoreError, write_atomic};

/// A named table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Section {
    /// The input dataset as a section.
    pub fn input_data(rows: &[DatasetRow]) -> Self {
        Self {
            name: INPUT_SECTION.to_string(),
            headers: DATASET_HEADERS.iter().map(|h| (*h).to_string()).collect(),
            rows: rows.iter().map(DatasetRow::to_cells).collect(),
        }
    }

    /// Cell by row and header name.
    pub fn value(&self, row: usize, header: &str) -> Option<&str> {
        let column = self.headers.iter().position(|h| h == header)?;
        self.rows.get(row)?.get(column).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsDocument {
    /// SHA-256 of the dataset the run started from.
    #[serde(default)]
    pub dataset_fingerprint: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl ResultsDocument {
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name == name)
    }

    /// Replace the section with the same name, or append.
    pub fn upsert(&mut self, section: Section) {
        match self.sections.iter_mut().find(|s| s.name == section.name) {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }
}

/// Where the engine writes its sections.
pub trait ResultsSink {
    /// Start a new document containing only `section`.
    fn write_fresh(&mut self, section: Section, fingerprint: Option<String>) -> Result<()>;

    /// Replace the section of the same name, appending when new.
    fn replace_section(&mut self, section: Section) -> Result<()>;

    /// Fingerprint recorded by the last fresh write.
    fn fingerprint(&self) -> Result<Option<String>>;
}

#[derive(Debug, Clone)]
pub struct ResultsStore {
    path: PathBuf,
}

impl ResultsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document; an absent file is an empty document.
    pub fn load(&self) -> Result<ResultsDocument> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ResultsDocument::default()),
            Err(err) => return Err(StoreError::io("read", &self.path, err)),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Deserialization {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, document: &mut ResultsDocument) -> Result<()> {
        document.updated_at = Some(Utc::now().to_rfc3339());
        let bytes =
            serde_json::to_vec_pretty(document).map_err(|source| StoreError::Serialization {
                path: self.path.clone(),
                source,
            })?;
        write_atomic(&self.path, &bytes)
    }

    pub fn sections(&self) -> Result<Vec<Section>> {
        Ok(self.load()?.sections)
    }

    pub fn section(&self, name: &str) -> Result<Option<Section>> {
        Ok(self.load()?.section(name).cloned())
    }

    /// Write each section to `<dir>/<name>.csv`.
    pub fn export_csv(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let document = self.load()?;
        fs::create_dir_all(dir).map_err(|e| StoreError::io("create directory", dir, e))?;
        let mut written = Vec::with_capacity(document.sections.len());
        for section in &document.sections {
            let path = dir.join(format!("{}.csv", section.name));
            let csv_err = |source| StoreError::Csv {
                path: path.clone(),
                source,
            };
            let mut writer = WriterBuilder::new()
                .flexible(true)
                .from_path(&path)
                .map_err(csv_err)?;
            writer.write_record(&section.headers).map_err(csv_err)?;
            for row in &section.rows {
                writer.write_record(row).map_err(csv_err)?;
            }
            writer
                .flush()
                .map_err(|e| StoreError::io("flush", &path, e))?;
            written.push(path);
        }
        info!(dir = %dir.display(), sections = written.len(), "exported result sections");
        Ok(written)
    }
}

impl ResultsSink for ResultsStore {
    fn write_fresh(&mut self, section: Section, fingerprint: Option<String>) -> Result<()> {
        let name = section.name.clone();
        let rows = section.rows.len();
        let mut document = ResultsDocument {
            dataset_fingerprint: fingerprint,
            updated_at: None,
            sections: vec![section],
        };
        self.save(&mut document)?;
        info!(path = %self.path.display(), section = %name, rows, "results store started");
        Ok(())
    }

    fn replace_section(&mut self, section: Section) -> Result<()> {
        let mut document = self.load()?;
        let name = section.name.clone();
        let rows = section.rows.len();
        document.upsert(section);
        self.save(&mut document)?;
        debug!(path = %self.path.display(), section = %name, rows, "section written");
        Ok(())
    }

    fn fingerprint(&self) -> Result<Option<String>> {
        Ok(self.load()?.dataset_fingerprint)
    }
}

/// SHA-256 over every row's cells, hex encoded.
///
/// Resume relies on row order being stable between runs; comparing
/// fingerprints detects a dataset that changed underneath a checkpoint.
pub fn dataset_fingerprint(rows: &[DatasetRow]) -> String {
    let mut hasher = Sha256::new();
    for row in rows {
        for cell in row.to_cells() {
            hasher.update(cell.as_bytes());
            hasher.update(b"\x1f");
        }
        hasher.update(b"\x1e");
    }
    hex::encode(hasher.finalize())
}
