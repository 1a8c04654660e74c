//! Durable "next batch to run" marker.
//!
//! A small text file holding a decimal integer. Absent or unparsable
//! content means "start from batch 0". It is overwritten after every
//! completed batch and removed only after a fully successful run.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::store::{Result, StoreError, write_atomic};

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Next batch to run; 0 when absent, unreadable or malformed.
    pub fn read(&self) -> usize {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return 0,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "checkpoint unreadable, starting from batch 0");
                return 0;
            }
        };
        match parse_checkpoint(&content) {
            Some(batch) => {
                debug!(path = %self.path.display(), batch, "checkpoint read");
                batch
            }
            None => {
                warn!(
                    path = %self.path.display(),
                    content = %content.trim(),
                    "checkpoint malformed, starting from batch 0"
                );
                0
            }
        }
    }

    /// Atomically overwrite the checkpoint.
    pub fn write(&self, batch: usize) -> Result<()> {
        write_atomic(&self.path, batch.to_string().as_bytes())?;
        debug!(path = %self.path.display(), batch, "checkpoint written");
        Ok(())
    }

    /// Remove the checkpoint. Idempotent.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "checkpoint cleared");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::io("remove", &self.path, err)),
        }
    }
}

/// Only plain ASCII digits count; signs, decimals and words do not.
fn parse_checkpoint(content: &str) -> Option<usize> {
    let trimmed = content.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absent_reads_zero() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("checkpoint.txt"));
        assert_eq!(store.read(), 0);
        assert!(!store.exists());
    }

    #[test]
    fn malformed_reads_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.txt");
        for content in ["abc", "-1", "2.5", "", "  "] {
            fs::write(&path, content).unwrap();
            assert_eq!(CheckpointStore::new(&path).read(), 0, "content {content:?}");
        }
    }

    #[test]
    fn write_overwrites() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("checkpoint.txt"));
        store.write(3).unwrap();
        store.write(4).unwrap();
        assert_eq!(store.read(), 4);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "4");
    }

    #[test]
    fn tolerates_trailing_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.txt");
        fs::write(&path, "7\n").unwrap();
        assert_eq!(CheckpointStore::new(&path).read(), 7);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("checkpoint.txt"));
        store.write(1).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(!store.exists());
        assert_eq!(store.read(), 0);
    }
}
