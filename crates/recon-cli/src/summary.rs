use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use recon_core::Disposition;
use recon_model::OutcomeKind;

use crate::types::{ExportOutcome, PrepareOutcome, RunOutcome, StatusReport};

pub fn print_run_summary(outcome: &RunOutcome) {
    let report = &outcome.report;
    println!("Dataset: {} ({} rows)", outcome.dataset.display(), outcome.rows);
    println!("Results: {}", outcome.results.display());
    if report.resumed() {
        println!(
            "Resumed from batch {} of {}",
            report.start_batch + 1,
            report.total_batches
        );
    }

    let mut table = Table::new();
    table.set_header(vec![header_cell("Outcome"), header_cell("Rows")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for kind in OutcomeKind::ALL {
        let count = report.counts.get(kind);
        let cell = match kind {
            OutcomeKind::Matched => Cell::new(count).fg(Color::Green),
            _ => count_cell(count, Color::Red),
        };
        table.add_row(vec![Cell::new(kind.as_str()), cell]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(report.rows_processed).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    if !report.sections_written.is_empty() {
        println!("Error sections: {}", report.sections_written.join(", "));
    }
    match &report.disposition {
        Disposition::Done => {
            println!(
                "{}",
                batch_coverage(
                    report.start_batch,
                    report.batches_completed,
                    report.total_batches
                )
            );
            if outcome.checkpoint_cleared {
                println!("Checkpoint cleared: {}", outcome.checkpoint.display());
            }
        }
        Disposition::Aborted { at_batch, reason } => {
            eprintln!("Aborted at batch {}: {reason}", at_batch + 1);
            eprintln!(
                "Checkpoint kept at {}; run again to resume",
                outcome.checkpoint.display()
            );
        }
    }
    if let Some(error) = &report.teardown_error {
        eprintln!("Teardown: {error}");
    }
}

/// The batches this run covered, one-based: `Completed batches 3-3 of 3`.
fn batch_coverage(start: usize, completed: usize, total: usize) -> String {
    if completed == 0 {
        format!("No batches left to run ({total} in total)")
    } else {
        format!(
            "Completed batches {}-{} of {total}",
            start + 1,
            start + completed
        )
    }
}

pub fn print_prepare_summary(outcome: &PrepareOutcome) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Prepared"), header_cell("Rows")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("dataset rows"), Cell::new(outcome.rows)]);
    table.add_row(vec![
        Cell::new("duplicate descriptions"),
        count_cell(outcome.duplicates, Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("no catalogue match"),
        count_cell(outcome.unmatched, Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("non-numeric codes"),
        count_cell(outcome.non_numeric_codes, Color::Yellow),
    ]);
    println!("Dataset: {}", outcome.output.display());
    if let Some(path) = &outcome.duplicates_path {
        println!("Duplicates: {}", path.display());
    }
    println!("{table}");
}

pub fn print_status(status: &StatusReport) {
    match status.next_batch {
        Some(batch) => println!(
            "Checkpoint: {} (next batch {})",
            status.checkpoint.display(),
            batch + 1
        ),
        None => println!(
            "Checkpoint: none at {}, next run starts fresh",
            status.checkpoint.display()
        ),
    }
    println!("Results: {}", status.results.display());
    if let Some(updated) = &status.updated_at {
        println!("Updated: {updated}");
    }
    if let Some(fingerprint) = &status.fingerprint {
        println!("Dataset fingerprint: {fingerprint}");
    }
    if status.sections.is_empty() {
        println!("No sections recorded");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Section"), header_cell("Rows")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for section in &status.sections {
        table.add_row(vec![Cell::new(&section.name), Cell::new(section.rows)]);
    }
    println!("{table}");
}

pub fn print_export(outcome: &ExportOutcome) {
    println!(
        "Exported {} section(s) to {}",
        outcome.files.len(),
        outcome.dir.display()
    );
    for file in &outcome.files {
        println!("- {}", file.display());
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
