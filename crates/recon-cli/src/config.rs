//! `order-recon.toml` loading and command-line overrides.
//!
//! ```toml
//! [login]
//! url = "https://orders.example.com"
//! company_code = "ACME"
//! username = "clerk"
//! password = "..."
//!
//! [order]
//! business_name = "Main Kitchen"
//! supplier_name = "Wholesale Foods"
//! delivery_date = "2024-07-01"
//! reference = "PO-1182"
//!
//! [paths]
//! dataset = "orders.csv"
//! checkpoint = "checkpoint.txt"
//! results = "results.json"
//!
//! [reconcile]
//! batch_size = 50
//! tolerance = 0.0001
//!
//! [timeouts]
//! results_secs = 30
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use recon_core::{RunConfig, SessionContext};
use recon_model::{
    DEFAULT_BATCH_SIZE, DEFAULT_TOLERANCE, ReconOptions, Timeouts,
};

pub const DEFAULT_CONFIG_FILE: &str = "order-recon.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub login: LoginSection,
    pub order: OrderSection,
    pub paths: PathsSection,
    pub reconcile: ReconcileSection,
    pub timeouts: Timeouts,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoginSection {
    pub url: String,
    pub company_code: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginSection")
            .field("url", &self.url)
            .field("company_code", &self.company_code)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrderSection {
    pub business_name: String,
    pub supplier_name: String,
    pub delivery_date: String,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsSection {
    pub dataset: PathBuf,
    pub checkpoint: PathBuf,
    pub results: PathBuf,
    /// Catalogue for the in-process ordering session.
    pub catalog: Option<PathBuf>,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("orders.csv"),
            checkpoint: PathBuf::from("checkpoint.txt"),
            results: PathBuf::from("results.json"),
            catalog: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileSection {
    pub batch_size: usize,
    pub tolerance: f64,
    pub lookup_attempts: u32,
}

impl Default for ReconcileSection {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            tolerance: DEFAULT_TOLERANCE,
            lookup_attempts: 1,
        }
    }
}

/// Values given on the command line; each one wins over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub dataset: Option<PathBuf>,
    pub checkpoint: Option<PathBuf>,
    pub results: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub tolerance: Option<f64>,
}

impl FileConfig {
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(path) = &overrides.dataset {
            self.paths.dataset = path.clone();
        }
        if let Some(path) = &overrides.checkpoint {
            self.paths.checkpoint = path.clone();
        }
        if let Some(path) = &overrides.results {
            self.paths.results = path.clone();
        }
        if let Some(path) = &overrides.catalog {
            self.paths.catalog = Some(path.clone());
        }
        if let Some(batch_size) = overrides.batch_size {
            self.reconcile.batch_size = batch_size;
        }
        if let Some(tolerance) = overrides.tolerance {
            self.reconcile.tolerance = tolerance;
        }
    }

    pub fn options(&self) -> ReconOptions {
        ReconOptions {
            batch_size: self.reconcile.batch_size,
            tolerance: self.reconcile.tolerance,
            lookup_attempts: self.reconcile.lookup_attempts,
            timeouts: self.timeouts,
        }
    }

    pub fn session(&self) -> SessionContext {
        SessionContext {
            url: self.login.url.clone(),
            company_code: self.login.company_code.clone(),
            username: self.login.username.clone(),
            password: self.login.password.clone(),
            business_name: self.order.business_name.clone(),
            supplier_name: self.order.supplier_name.clone(),
            delivery_date: self.order.delivery_date.clone(),
            reference: self.order.reference.clone(),
        }
    }

    pub fn run_config(&self, reset: bool) -> RunConfig {
        RunConfig::new(&self.paths.checkpoint, &self.paths.results)
            .with_options(self.options())
            .with_session(self.session())
            .with_reset(reset)
    }
}

/// Load the configuration file.
///
/// An explicit path must exist. Without one, `order-recon.toml` in the
/// working directory is used when present and defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = explicit.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound && explicit.is_none() => {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(FileConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("read config {}", path.display()));
        }
    };
    let config = parse_config(&content).with_context(|| format!("parse config {}", path.display()))?;
    info!(path = %path.display(), "loaded config");
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<FileConfig> {
    Ok(toml::from_str(content)?)
}
