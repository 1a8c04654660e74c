//! Terminal progress for a reconciliation run.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use recon_core::{BatchSummary, ProgressObserver, RowProgress};
use tracing::debug;

pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(total_rows: usize, hidden: bool) -> Self {
        if hidden {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }
        let bar = ProgressBar::new(total_rows as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} rows ({eta}) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(12));
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn line(&self, text: String) {
        if self.bar.is_hidden() {
            eprintln!("{text}");
        } else {
            self.bar.println(text);
        }
    }
}

impl ProgressObserver for BarProgress {
    fn row_completed(&mut self, progress: &RowProgress) {
        debug!(
            row = progress.completed,
            total = progress.total,
            outcome = %progress.outcome,
            "row processed"
        );
        self.bar.set_position(progress.completed as u64);
        self.bar.set_message(format!("batch {}", progress.batch + 1));
    }

    fn batch_completed(&mut self, summary: &BatchSummary) {
        let failed = summary.counts.failures();
        let mut text = format!(
            "Batch {}: rows {}-{}, {} matched, {} failed",
            summary.batch + 1,
            summary.rows.start + 1,
            summary.rows.end,
            summary.counts.matched,
            failed
        );
        if let Some(section) = &summary.section {
            text.push_str(&format!(" -> {section}"));
        }
        self.line(text);
    }
}
