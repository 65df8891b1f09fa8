//! Result merging.
//!
//! After all workers have joined, every numbered worker checkpoint file in
//! the output directory is appended, whole and in discovery order, to
//! `results.txt`. There is no dedup and no sorting. Repeating a run appends
//! again rather than truncating.

use crate::io::discover::files_in_dir;
use crate::partition::WORKER_DRUGS_PREFIX;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{OpenOptions, read};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the consolidated result file.
pub const RESULTS_FILE: &str = "results.txt";

/// What a merge touched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub output: PathBuf,
    pub files: Vec<PathBuf>,
    pub lines: usize,
}

/// Glob matching the success files of multi-worker runs.
#[must_use]
pub fn worker_file_pattern() -> String {
    format!("{WORKER_DRUGS_PREFIX}*.txt")
}

/// Append every worker success file under `dir` to `dir/results.txt`.
///
/// Single-worker output does not match the pattern and is left alone.
///
/// # Errors
///
/// Returns an error if the directory cannot be scanned, a worker file cannot
/// be read, or the result file cannot be written.
pub fn merge_results(dir: impl AsRef<Path>) -> Result<MergeReport> {
    let dir = dir.as_ref();
    let output = dir.join(RESULTS_FILE);
    let files = files_in_dir(dir, &worker_file_pattern())?;

    let mut out = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&output)
        .with_context(|| format!("open {} for append", output.display()))?;

    let mut lines = 0;
    for file in &files {
        let bytes = read(file).with_context(|| format!("read {}", file.display()))?;
        lines += bytes.iter().filter(|b| **b == b'\n').count();
        out.write_all(&bytes)
            .with_context(|| format!("append {} to {}", file.display(), output.display()))?;
    }
    out.flush()?;

    info!(files = files.len(), lines, output = %output.display(), "merge complete");
    Ok(MergeReport {
        output,
        files,
        lines,
    })
}
