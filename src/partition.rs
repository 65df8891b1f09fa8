//! Splitting the windowed name list into worker partitions.
//!
//! Partitions are contiguous and fixed-size: every worker but the last gets
//! `total / workers` names and the last one absorbs the remainder. With fewer
//! names than workers, all but the last partition are empty.

use crate::names::IndexedName;
use std::fmt;
use std::ops::Range;

/// File stem for success output of single-worker runs.
pub const SINGLE_DRUGS_STEM: &str = "processed_drugs_single";
/// File stem for error output of single-worker runs.
pub const SINGLE_ERRORS_STEM: &str = "processed_errors_single";
/// File stem prefix for numbered worker success output.
pub const WORKER_DRUGS_PREFIX: &str = "processed_drugs_worker";
/// File stem prefix for numbered worker error output.
pub const WORKER_ERRORS_PREFIX: &str = "processed_errors_worker";

/// Which output file pair a partition owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartitionId {
    /// The only partition of a single-worker run.
    Single,
    /// Numbered partition of a multi-worker run, counting from 1.
    Worker(usize),
}

impl PartitionId {
    /// File stem of the success (checkpoint) file.
    #[must_use]
    pub fn drugs_stem(self) -> String {
        match self {
            Self::Single => SINGLE_DRUGS_STEM.to_string(),
            Self::Worker(n) => format!("{WORKER_DRUGS_PREFIX}{n}"),
        }
    }

    /// File stem of the error file.
    #[must_use]
    pub fn errors_stem(self) -> String {
        match self {
            Self::Single => SINGLE_ERRORS_STEM.to_string(),
            Self::Worker(n) => format!("{WORKER_ERRORS_PREFIX}{n}"),
        }
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("single"),
            Self::Worker(n) => write!(f, "worker{n}"),
        }
    }
}

/// A contiguous slice of the windowed input owned by one worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    pub id: PartitionId,
    pub names: Vec<IndexedName>,
}

impl Partition {
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Split `[0, total)` into `workers` contiguous ranges.
///
/// Worker `i` gets `[i * chunk, (i + 1) * chunk)` with `chunk = total / workers`,
/// except the last which runs to `total`. `workers` is clamped to at least 1.
#[must_use]
pub fn partition_ranges(total: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let chunk = total / workers;
    (0..workers)
        .map(|i| {
            let start = i * chunk;
            let end = if i + 1 < workers { (i + 1) * chunk } else { total };
            start..end
        })
        .collect()
}

/// Build the partitions for a run over `names`, whose first element sits at
/// absolute index `offset` in the deduplicated input.
///
/// One worker yields a single [`PartitionId::Single`] partition; more yield
/// [`PartitionId::Worker`] partitions numbered from 1.
#[must_use]
pub fn build_partitions(names: &[String], offset: usize, workers: usize) -> Vec<Partition> {
    let indexed = |range: Range<usize>| -> Vec<IndexedName> {
        names[range.clone()]
            .iter()
            .zip(range)
            .map(|(name, i)| IndexedName::new(offset + i, name.clone()))
            .collect()
    };

    if workers <= 1 {
        return vec![Partition {
            id: PartitionId::Single,
            names: indexed(0..names.len()),
        }];
    }

    partition_ranges(names.len(), workers)
        .into_iter()
        .enumerate()
        .map(|(i, range)| Partition {
            id: PartitionId::Worker(i + 1),
            names: indexed(range),
        })
        .collect()
}
