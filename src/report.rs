//! Run summary.
//!
//! A [`RunReport`] collects the per-worker counters and the merge outcome of
//! one run. It can be logged or written next to the results as JSON.

use crate::merge::MergeReport;
use crate::worker::WorkerReport;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{info, info_span};

/// File name the report is saved under inside the parser output directory.
pub const REPORT_FILE: &str = "run_report.json";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Deduplicated names in the input, before windowing.
    pub total_names: usize,
    pub window_start: usize,
    pub window_end: usize,
    pub workers: Vec<WorkerReport>,
    /// `None` for single-worker runs, which are never merged.
    pub merge: Option<MergeReport>,
    pub elapsed_ms: u64,
}

impl RunReport {
    #[must_use]
    pub fn dispatched(&self) -> usize {
        self.workers.iter().map(|w| w.dispatched).sum()
    }

    #[must_use]
    pub fn failed_batches(&self) -> usize {
        self.workers.iter().map(|w| w.stats.failed_batches).sum()
    }

    #[must_use]
    pub fn lines_written(&self) -> usize {
        self.workers.iter().map(|w| w.stats.lines_written).sum()
    }

    /// Log a one-line summary per worker and one for the whole run.
    pub fn print(&self) {
        let _run = info_span!("run", pid = std::process::id()).entered();
        for w in &self.workers {
            info!(
                worker = %w.worker,
                assigned = w.assigned,
                skipped = w.already_processed,
                batches = w.stats.batches,
                failed = w.stats.failed_batches,
                lines = w.stats.lines_written,
                "worker summary"
            );
        }
        info!(
            names = self.total_names,
            window = %format!("{} ~ {}", self.window_start, self.window_end),
            dispatched = self.dispatched(),
            failed_batches = self.failed_batches(),
            lines = self.lines_written(),
            elapsed_ms = self.elapsed_ms,
            "run summary"
        );
    }

    /// Write the report as pretty JSON, replacing any previous report.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("serialize run report")?;
        let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}
