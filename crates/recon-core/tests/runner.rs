mod common;

use std::time::Duration;

use common::{FailingSink, Recorder, Script, ScriptedDriver, code, dataset, options};
use recon_core::{
    BatchRunner, OrderingSession, ResultsSink, ResultsStore, RunnerError, Section, SessionContext,
};
use recon_model::{OutcomeKind, error_section_name};
use tempfile::TempDir;

fn opened(driver: ScriptedDriver) -> ScriptedDriver {
    let mut driver = driver;
    driver
        .open(&SessionContext::default(), Duration::from_secs(1))
        .expect("open session");
    driver
}

#[test]
fn runs_only_the_rows_of_its_batch() {
    let dir = TempDir::new().expect("temp dir");
    let rows = dataset(12);
    let mut driver = opened(ScriptedDriver::for_rows(&rows));
    let mut store = ResultsStore::new(dir.path().join("results.json"));
    let mut recorder = Recorder::default();

    let summary = BatchRunner::new(options(5))
        .run_batch(&mut driver, &mut store, &rows, 1, &mut recorder)
        .expect("run batch");

    assert_eq!(summary.rows, 5..10);
    assert_eq!(summary.counts.matched, 5);
    assert_eq!(summary.section, None);
    let searched: Vec<String> = (5..10).map(code).collect();
    assert_eq!(driver.searches, searched);

    let completed: Vec<usize> = recorder.rows.iter().map(|p| p.completed).collect();
    assert_eq!(completed, vec![6, 7, 8, 9, 10]);
    assert!(recorder.rows.iter().all(|p| p.total == 12 && p.batch == 1));
    assert_eq!(recorder.batches, vec![summary]);
    assert!(store.sections().expect("sections").is_empty());
}

#[test]
fn last_batch_is_short() {
    let dir = TempDir::new().expect("temp dir");
    let rows = dataset(12);
    let mut driver = opened(ScriptedDriver::for_rows(&rows));
    let mut store = ResultsStore::new(dir.path().join("results.json"));

    let summary = BatchRunner::new(options(5))
        .run_batch(&mut driver, &mut store, &rows, 2, &mut Recorder::default())
        .expect("run batch");
    assert_eq!(summary.rows, 10..12);
    assert_eq!(driver.searches.len(), 2);
}

#[test]
fn row_failures_do_not_stop_the_batch() {
    let dir = TempDir::new().expect("temp dir");
    let rows = dataset(5);
    let mut driver = opened(
        ScriptedDriver::for_rows(&rows)
            .script(&code(0), Script::Panic)
            .script(&code(2), Script::FieldFault)
            .script(&code(3), Script::Displayed("0.00".into())),
    );
    let mut store = ResultsStore::new(dir.path().join("results.json"));
    let mut recorder = Recorder::default();

    let summary = BatchRunner::new(options(5))
        .run_batch(&mut driver, &mut store, &rows, 0, &mut recorder)
        .expect("run batch");

    assert_eq!(summary.counts.matched, 2);
    assert_eq!(summary.counts.processing_error, 2);
    assert_eq!(summary.counts.total_mismatch, 1);
    assert_eq!(recorder.rows.len(), 5);
    assert_eq!(recorder.rows[0].outcome, OutcomeKind::ProcessingError);
    assert_eq!(summary.section.as_deref(), Some("Errors Batch 1"));

    let section = store
        .section(&error_section_name(0))
        .expect("read store")
        .expect("error section");
    assert_eq!(section.rows.len(), 3);
    assert_eq!(section.value(0, "Index"), Some("0"));
    assert_eq!(section.value(0, "Error Type"), Some("Processing Error"));
    assert_eq!(section.value(0, "Error Message"), Some("driver crashed on 1000"));
    assert_eq!(section.value(1, "Index"), Some("2"));
    assert_eq!(section.value(2, "Error Type"), Some("Total Cost Mismatch"));
    assert_eq!(section.value(2, "Web Total"), Some("0"));
    // The panicking row still had its detail view closed.
    assert!(driver.closes >= 5);
}

#[test]
fn rerunning_a_batch_replaces_its_section() {
    let dir = TempDir::new().expect("temp dir");
    let rows = dataset(4);
    let runner = BatchRunner::new(options(4));
    let mut store = ResultsStore::new(dir.path().join("results.json"));
    store
        .write_fresh(Section::input_data(&rows), None)
        .expect("fresh");

    for _ in 0..2 {
        let mut driver = opened(
            ScriptedDriver::for_rows(&rows).script(&code(1), Script::Displayed("1.00".into())),
        );
        runner
            .run_batch(&mut driver, &mut store, &rows, 0, &mut Recorder::default())
            .expect("run batch");
    }

    let sections = store.sections().expect("sections");
    let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Input Data", "Errors Batch 1"]);
    assert_eq!(sections[1].rows.len(), 1);
}

#[test]
fn batch_past_the_end_is_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let rows = dataset(3);
    let mut driver = opened(ScriptedDriver::for_rows(&rows));
    let mut store = ResultsStore::new(dir.path().join("results.json"));
    let err = BatchRunner::new(options(5))
        .run_batch(&mut driver, &mut store, &rows, 1, &mut Recorder::default())
        .unwrap_err();
    assert!(matches!(err, RunnerError::OutOfRange { batch: 1, batches: 1 }));
    assert!(driver.searches.is_empty());
}

#[test]
fn failed_flush_is_a_runner_fault() {
    let dir = TempDir::new().expect("temp dir");
    let rows = dataset(3);
    let mut driver = opened(ScriptedDriver::for_rows(&rows).script(&code(0), Script::FieldFault));
    let mut sink = FailingSink::new(&dir.path().join("results.json"), 1);
    let err = BatchRunner::new(options(5))
        .run_batch(&mut driver, &mut sink, &rows, 0, &mut Recorder::default())
        .unwrap_err();
    assert!(matches!(err, RunnerError::Flush { batch: 0, .. }));
    assert!(err.to_string().contains("batch 1"));
}
