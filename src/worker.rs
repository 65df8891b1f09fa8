//! Worker unit: resume one partition from its checkpoint.

use crate::checkpoint::CheckpointStore;
use crate::dispatcher::{BatchDispatcher, DispatchStats};
use crate::names::IndexedName;
use crate::partition::Partition;
use anyhow::Result;
use serde::Serialize;
use tracing::info;

/// Outcome of one worker's run over its partition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    /// Partition name, e.g. `worker2` or `single`.
    pub worker: String,
    /// Names assigned to the partition.
    pub assigned: usize,
    /// Assigned names already present in the checkpoint at startup.
    pub already_processed: usize,
    /// Names handed to the dispatcher this run.
    pub dispatched: usize,
    #[serde(flatten)]
    pub stats: DispatchStats,
}

/// Names of `partition` whose raw text is not yet a checkpoint key.
#[must_use]
pub fn unprocessed_names(
    partition: &Partition,
    processed: &std::collections::HashSet<String>,
) -> Vec<IndexedName> {
    partition
        .names
        .iter()
        .filter(|n| !processed.contains(&n.name))
        .cloned()
        .collect()
}

/// Run one partition to completion.
///
/// Loads the partition's checkpoint, drops every name already recorded there,
/// and dispatches the rest. A partition whose names are all processed makes
/// no service calls. Running this twice over the same files never re-sends a
/// name that the first run persisted.
///
/// # Errors
///
/// Returns an error only if the existing checkpoint file cannot be read. An
/// empty partition never touches its files.
/// Per-batch failures are recorded in the error file and do not surface here.
pub fn run_worker(
    partition: &Partition,
    store: &CheckpointStore,
    dispatcher: &BatchDispatcher<'_>,
    prompt: &str,
) -> Result<WorkerReport> {
    if partition.is_empty() {
        info!("no names assigned, nothing to do");
        return Ok(WorkerReport {
            worker: partition.id.to_string(),
            ..WorkerReport::default()
        });
    }
    info!(
        assigned = partition.len(),
        batch_size = dispatcher.batch_size(),
        file = %store.success_path().display(),
        "worker started"
    );

    let processed = store.load()?;
    let unprocessed = unprocessed_names(partition, &processed);
    let already_processed = partition.len() - unprocessed.len();
    info!(
        checkpointed = processed.len(),
        remaining = unprocessed.len(),
        "checkpoint loaded"
    );

    let stats = if unprocessed.is_empty() {
        DispatchStats::default()
    } else {
        dispatcher.dispatch(&unprocessed, prompt, store)
    };

    info!(
        batches = stats.batches,
        failed = stats.failed_batches,
        lines = stats.lines_written,
        "worker finished"
    );

    Ok(WorkerReport {
        worker: partition.id.to_string(),
        assigned: partition.len(),
        already_processed,
        dispatched: unprocessed.len(),
        stats,
    })
}
