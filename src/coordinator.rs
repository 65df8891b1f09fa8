//! Partition coordination.
//!
//! The coordinator turns the raw name column into partitions and runs one
//! worker per partition. A single worker runs inline on the calling thread.
//! Several workers each get their own thread in a dedicated rayon pool sized
//! to the worker count, so every partition makes progress concurrently; the
//! call returns only after all of them have finished.
//!
//! Workers share nothing mutable. Each one owns a disjoint slice of names and
//! a disjoint pair of output files, which is what makes the files safe to
//! append to without locks.

use crate::checkpoint::CheckpointStore;
use crate::completion::CompletionService;
use crate::config::DrugParserConfig;
use crate::dispatcher::BatchDispatcher;
use crate::names::{extract_names, window_range};
use crate::partition::{Partition, build_partitions};
use crate::worker::{WorkerReport, run_worker};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::ops::Range;
use std::path::Path;
use tracing::{error, info, info_span};

/// Partitions for one run, plus where they came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunPlan {
    /// Deduplicated names before windowing.
    pub total_names: usize,
    /// Window applied to the deduplicated names.
    pub window: Range<usize>,
    pub partitions: Vec<Partition>,
}

/// Clean, window and split the name column.
///
/// `max_record` of `None` runs the window to the end of the input.
pub fn plan_run<I, S>(
    cells: I,
    workers: usize,
    start_index: usize,
    max_record: Option<usize>,
) -> RunPlan
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let names = extract_names(cells);
    let window = window_range(names.len(), start_index, max_record);
    let partitions = build_partitions(&names[window.clone()], window.start, workers);
    RunPlan {
        total_names: names.len(),
        window,
        partitions,
    }
}

/// Run every partition of `plan` against `service`, writing into `output_dir`.
///
/// Returns one report per partition, in partition order.
///
/// # Errors
///
/// Returns an error if the worker pool cannot be built or a worker cannot
/// read its existing checkpoint. Failed batches are not errors.
pub fn run_partitions(
    plan: &RunPlan,
    output_dir: &Path,
    service: &dyn CompletionService,
    config: &DrugParserConfig,
    prompt: &str,
) -> Result<Vec<WorkerReport>> {
    info!(
        total = plan.total_names,
        start = plan.window.start,
        end = plan.window.end,
        workers = plan.partitions.len(),
        "starting run"
    );

    let run_one = |partition: &Partition| -> Result<WorkerReport> {
        let span = info_span!("worker", pid = std::process::id(), worker = %partition.id);
        let _entered = span.enter();
        let store = CheckpointStore::new(output_dir, partition.id);
        let dispatcher = BatchDispatcher::new(service, config);
        run_worker(partition, &store, &dispatcher, prompt)
            .with_context(|| format!("worker {} failed", partition.id))
    };

    let results: Vec<Result<WorkerReport>> = if plan.partitions.len() <= 1 {
        info!("running single worker inline");
        plan.partitions.iter().map(run_one).collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(plan.partitions.len())
            .thread_name(|i| format!("drugbatch-worker-{}", i + 1))
            .build()
            .context("Failed to build worker pool")?;
        pool.install(|| plan.partitions.par_iter().map(run_one).collect())
    };

    let mut reports = Vec::with_capacity(results.len());
    let mut first_err = None;
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!(error = %format!("{e:#}"), "worker aborted");
                first_err.get_or_insert(e);
            }
        }
    }
    if let Some(e) = first_err {
        return Err(e);
    }

    info!("all workers finished");
    Ok(reports)
}
