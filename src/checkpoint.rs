//! Durable per-partition progress: the checkpoint store.
//!
//! Each partition owns two append-only text files in the output directory:
//!
//! - `<drugs stem>.txt` holds one result record per line, pipe-delimited.
//!   The first field is the raw name that was sent, and it doubles as the
//!   resume key: on restart every name already present there is skipped.
//! - `<errors stem>.txt` holds one tab-separated [`ErrorEntry`] per failed
//!   batch. It is advisory only and never read back.
//!
//! Files are never truncated or rewritten. Only one worker writes to a given
//! pair during a run, so no locking is needed. Text is UTF-8; invalid bytes
//! in an existing file are replaced on read rather than failing the load.

use crate::error::BatchFailure;
use crate::partition::PartitionId;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{File, OpenOptions, read};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Separator between fields of a result record.
pub const FIELD_SEPARATOR: char = '|';

/// One failed batch, as written to the error file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorEntry {
    pub category: BatchFailure,
    /// Human-readable span of the batch, see [`range_label`].
    pub range_label: String,
    /// Whatever the service returned, possibly empty.
    pub raw_response: String,
    pub reason: String,
}

impl ErrorEntry {
    /// Render as a single tab-separated line, without the trailing newline.
    ///
    /// Tabs, newlines and backslashes inside fields are escaped so that one
    /// entry always occupies exactly one line.
    #[must_use]
    pub fn to_line(&self) -> String {
        [
            self.category.as_str(),
            self.range_label.as_str(),
            self.raw_response.as_str(),
            self.reason.as_str(),
        ]
        .iter()
        .map(|field| escape_field(field))
        .collect::<Vec<_>>()
        .join("\t")
    }
}

fn escape_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// Label for a batch spanning absolute input rows `first..=last`.
#[must_use]
pub fn range_label(first: usize, last: usize) -> String {
    format!("rows {first} - {last}")
}

/// Resume key of a result line: its first field, trimmed.
#[must_use]
pub fn record_key(line: &str) -> &str {
    line.trim()
        .split(FIELD_SEPARATOR)
        .next()
        .unwrap_or_default()
        .trim()
}

/// Success and error files of one partition.
#[derive(Clone, Debug)]
pub struct CheckpointStore {
    success_path: PathBuf,
    error_path: PathBuf,
}

impl CheckpointStore {
    /// Store for `partition` rooted at `directory`. Nothing is touched on disk
    /// until the first read or append.
    pub fn new(directory: impl AsRef<Path>, partition: PartitionId) -> Self {
        let directory = directory.as_ref();
        Self {
            success_path: directory.join(format!("{}.txt", partition.drugs_stem())),
            error_path: directory.join(format!("{}.txt", partition.errors_stem())),
        }
    }

    #[must_use]
    pub fn success_path(&self) -> &Path {
        &self.success_path
    }

    #[must_use]
    pub fn error_path(&self) -> &Path {
        &self.error_path
    }

    /// Keys of every record already persisted for this partition.
    ///
    /// A missing success file is an empty checkpoint, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(&self) -> Result<HashSet<String>> {
        let bytes = match read(&self.success_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("read checkpoint {}", self.success_path.display())
                });
            }
        };

        let text = String::from_utf8_lossy(&bytes);
        Ok(text
            .lines()
            .map(record_key)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Append `lines` to the success file, one per line, and return how many
    /// were written.
    ///
    /// Lines are written in order; if a write fails midway the lines before it
    /// stay in the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, written, or synced.
    pub fn append_success<S: AsRef<str>>(&self, lines: &[S]) -> Result<usize> {
        let mut w = BufWriter::new(open_append(&self.success_path)?);
        for (i, line) in lines.iter().enumerate() {
            writeln!(w, "{}", line.as_ref()).with_context(|| {
                format!(
                    "write record #{} to {}",
                    i + 1,
                    self.success_path.display()
                )
            })?;
        }
        let file = w
            .into_inner()
            .map_err(|e| e.into_error())
            .with_context(|| format!("flush {}", self.success_path.display()))?;
        file.sync_data()
            .with_context(|| format!("sync {}", self.success_path.display()))?;
        Ok(lines.len())
    }

    /// Append one error entry to the error file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written. The entry's
    /// content never causes an error.
    pub fn append_error(&self, entry: &ErrorEntry) -> Result<()> {
        let mut file = open_append(&self.error_path)?;
        writeln!(file, "{}", entry.to_line())
            .with_context(|| format!("write error entry to {}", self.error_path.display()))?;
        Ok(())
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {} for append", path.display()))
}
