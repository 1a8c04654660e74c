use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use recon_cli::config::{FileConfig, Overrides};
use recon_core::{CatalogDriver, CheckpointStore, RunController, ResultsStore};
use recon_ingest::{load_dataset, merge_source_files, write_dataset_csv};

use crate::cli::{ExportArgs, PathArgs, PrepareArgs, RunArgs};
use crate::progress::BarProgress;
use crate::types::{ExportOutcome, PrepareOutcome, RunOutcome, SectionCount, StatusReport};

fn path_overrides(paths: &PathArgs) -> Overrides {
    Overrides {
        checkpoint: paths.checkpoint.clone(),
        results: paths.results.clone(),
        ..Overrides::default()
    }
}

pub fn run_reconcile(args: &RunArgs, mut config: FileConfig) -> Result<RunOutcome> {
    config.apply(&Overrides {
        dataset: args.dataset.clone(),
        catalog: args.catalog.clone(),
        batch_size: args.batch_size,
        tolerance: args.tolerance,
        ..path_overrides(&args.paths)
    });
    let dataset = config.paths.dataset.clone();
    let span = info_span!("reconcile", dataset = %dataset.display());
    let _guard = span.enter();

    let rows = load_dataset(&dataset)
        .with_context(|| format!("load dataset {}", dataset.display()))?;
    info!(rows = rows.len(), "dataset loaded");

    let catalog = config
        .paths
        .catalog
        .clone()
        .context("no ordering session configured: pass --catalog or set paths.catalog")?;
    let mut session = CatalogDriver::from_path(&catalog)
        .with_context(|| format!("load catalogue {}", catalog.display()))?;

    let mut controller =
        RunController::new(config.run_config(args.reset)).context("invalid run configuration")?;
    let mut progress = BarProgress::new(rows.len(), args.no_progress);
    let report = controller.run(&mut session, &rows, &mut progress);
    progress.finish();

    let checkpoint_cleared = controller
        .complete(&report)
        .context("clear checkpoint after a completed run")?;
    Ok(RunOutcome {
        dataset,
        rows: rows.len(),
        results: config.paths.results.clone(),
        checkpoint: config.paths.checkpoint.clone(),
        report,
        checkpoint_cleared,
    })
}

pub fn run_prepare(args: &PrepareArgs, config: &FileConfig) -> Result<PrepareOutcome> {
    let merged = merge_source_files(&args.quantities, &args.products).context("merge exports")?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.paths.dataset.clone());
    write_dataset_csv(&output, &merged.rows)
        .with_context(|| format!("write dataset {}", output.display()))?;

    let duplicates_path = if merged.duplicates.is_empty() {
        None
    } else {
        let path = duplicates_path(&output);
        write_dataset_csv(&path, &merged.duplicates)
            .with_context(|| format!("write duplicates {}", path.display()))?;
        warn!(
            duplicates = merged.duplicates.len(),
            path = %path.display(),
            "duplicate descriptions split off"
        );
        Some(path)
    };

    Ok(PrepareOutcome {
        output,
        rows: merged.rows.len(),
        duplicates: merged.duplicates.len(),
        duplicates_path,
        unmatched: merged.unmatched,
        non_numeric_codes: merged.non_numeric_codes,
    })
}

/// `orders.csv` -> `orders_duplicates.csv`, next to the dataset.
fn duplicates_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    output.with_file_name(format!("{stem}_duplicates.csv"))
}

pub fn run_export(args: &ExportArgs, mut config: FileConfig) -> Result<ExportOutcome> {
    config.apply(&path_overrides(&args.paths));
    let store = ResultsStore::new(&config.paths.results);
    let files = store
        .export_csv(&args.dir)
        .with_context(|| format!("export {}", config.paths.results.display()))?;
    Ok(ExportOutcome {
        dir: args.dir.clone(),
        files,
    })
}

pub fn run_status(paths: &PathArgs, mut config: FileConfig) -> Result<StatusReport> {
    config.apply(&path_overrides(paths));
    let checkpoint = CheckpointStore::new(&config.paths.checkpoint);
    let next_batch = checkpoint.exists().then(|| checkpoint.read());

    let store = ResultsStore::new(&config.paths.results);
    let document = store
        .load()
        .with_context(|| format!("read results {}", config.paths.results.display()))?;
    let sections = document
        .sections
        .iter()
        .map(|section| SectionCount {
            name: section.name.clone(),
            rows: section.rows.len(),
        })
        .collect();

    Ok(StatusReport {
        checkpoint: config.paths.checkpoint.clone(),
        next_batch,
        results: config.paths.results.clone(),
        updated_at: document.updated_at,
        fingerprint: document.dataset_fingerprint,
        sections,
    })
}
