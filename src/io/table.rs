//! Input table reading.
//!
//! The input is a delimited text table with a header row. Only the second
//! column carries drug names; every other column is ignored. Rows are read
//! with flexible lengths so a short row yields a missing cell instead of an
//! error.

use crate::io::decompress::auto_detect_reader;
use anyhow::{Context, Result, bail};
use std::fs::File;
use std::path::Path;

/// Zero-based index of the name column.
pub const NAME_COLUMN: usize = 1;

/// Field delimiter for `path`: tab for `.tsv` (optionally compressed),
/// comma otherwise.
#[must_use]
pub fn delimiter_for(path: impl AsRef<Path>) -> u8 {
    let lower = path.as_ref().to_string_lossy().to_lowercase();
    let is_tsv = [".tsv", ".tsv.gz", ".tsv.gzip", ".tsv.zst", ".tsv.zstd"]
        .iter()
        .any(|ext| lower.ends_with(ext));
    if is_tsv { b'\t' } else { b',' }
}

/// Read the name column of the table at `path`.
///
/// Returns one entry per data row, `None` where the row has no second cell.
/// Cells are returned untrimmed; cleaning is left to
/// [`extract_names`](crate::names::extract_names).
///
/// # Errors
///
/// Returns an error if the file cannot be opened, is not valid delimited
/// UTF-8 text, or its header has no second column.
pub fn read_name_cells(path: impl AsRef<Path>) -> Result<Vec<Option<String>>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = auto_detect_reader(f, path)
        .with_context(|| format!("setup decompression for {}", path.display()))?;
    read_name_cells_from(rdr, delimiter_for(path))
        .with_context(|| format!("read input table {}", path.display()))
}

/// Same as [`read_name_cells`], over any reader.
///
/// # Errors
///
/// See [`read_name_cells`].
pub fn read_name_cells_from<R: std::io::Read>(
    reader: R,
    delimiter: u8,
) -> Result<Vec<Option<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let headers = rdr.headers().context("parse header row")?;
    if headers.len() <= NAME_COLUMN {
        bail!(
            "input table has {} column(s); drug names are read from column {}",
            headers.len(),
            NAME_COLUMN + 1
        );
    }

    let mut out = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("parse table row #{}", i + 1))?;
        out.push(rec.get(NAME_COLUMN).map(str::to_string));
    }
    Ok(out)
}
