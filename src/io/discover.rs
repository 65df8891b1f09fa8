//! File discovery by glob pattern.
//!
//! Used to find the per-worker result files that the merger concatenates.
//! Results are sorted lexicographically, so "discovery order" is stable
//! across platforms and runs (`worker1`, `worker10`, `worker2`, ...).

use anyhow::{Context, Result};
use glob::{Pattern, glob};
use std::path::{Path, PathBuf};

/// Expand a glob pattern into a sorted list of matching regular files.
///
/// Zero matches is not an error.
///
/// # Errors
///
/// Returns an error if the pattern is invalid or a directory entry cannot be
/// read while walking it.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut result = Vec::new();
    for entry in paths {
        let path =
            entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            result.push(path);
        }
    }

    result.sort();
    Ok(result)
}

/// Files directly inside `dir` whose name matches `file_pattern`.
///
/// `dir` is taken literally, so directory names containing glob
/// metacharacters (`[`, `*`, `?`) do not change what matches.
///
/// # Errors
///
/// See [`expand_glob`].
pub fn files_in_dir(dir: impl AsRef<Path>, file_pattern: &str) -> Result<Vec<PathBuf>> {
    let escaped = Pattern::escape(&dir.as_ref().to_string_lossy());
    let sep = std::path::MAIN_SEPARATOR;
    expand_glob(&format!("{escaped}{sep}{file_pattern}"))
}
