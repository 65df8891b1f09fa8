//! Batch dispatch: the per-partition request loop.
//!
//! The dispatcher slices a partition's unprocessed names into consecutive
//! batches, sends each batch to the completion service exactly once, and
//! routes the answer either to the checkpoint file (one record per response
//! line) or to the error file. A failed batch never stops the loop; its names
//! are simply absent from the checkpoint and get retried on the next run.
//!
//! A fixed pause follows every batch, successful or not, to stay under the
//! service's rate limits.

use crate::checkpoint::{CheckpointStore, ErrorEntry, range_label};
use crate::completion::{CompletionRequest, CompletionService};
use crate::config::{ApiSettings, DrugParserConfig};
use crate::error::BatchFailure;
use crate::names::IndexedName;
use serde::Serialize;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Counters for one dispatch loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub batches: usize,
    pub succeeded_batches: usize,
    pub failed_batches: usize,
    pub lines_written: usize,
}

/// Sends batches of names to a [`CompletionService`] and persists the answers.
pub struct BatchDispatcher<'a> {
    service: &'a dyn CompletionService,
    api: &'a ApiSettings,
    batch_size: usize,
    delay: Duration,
}

impl<'a> BatchDispatcher<'a> {
    /// Dispatcher using the model parameters, batch size and inter-batch delay
    /// from `config`.
    pub fn new(service: &'a dyn CompletionService, config: &'a DrugParserConfig) -> Self {
        Self {
            service,
            api: &config.api,
            batch_size: config.process.batch_size.max(1),
            delay: config.process.batch_delay(),
        }
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Process `names` batch by batch, in order.
    ///
    /// Every batch results in exactly one service call and either checkpoint
    /// growth or an error entry in `store`.
    pub fn dispatch(
        &self,
        names: &[IndexedName],
        prompt: &str,
        store: &CheckpointStore,
    ) -> DispatchStats {
        let mut stats = DispatchStats::default();

        for batch in names.chunks(self.batch_size) {
            stats.batches += 1;
            match self.run_batch(batch, prompt, store) {
                Ok(written) => {
                    stats.succeeded_batches += 1;
                    stats.lines_written += written;
                }
                Err(entry) => {
                    stats.failed_batches += 1;
                    if let Err(e) = store.append_error(&entry) {
                        error!(error = %format!("{e:#}"), "could not record error entry");
                    }
                }
            }

            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
        }

        stats
    }

    /// One request/response cycle. On failure returns the error entry to
    /// record.
    fn run_batch(
        &self,
        batch: &[IndexedName],
        prompt: &str,
        store: &CheckpointStore,
    ) -> Result<usize, ErrorEntry> {
        // chunks() never yields an empty slice
        let (first, last) = (&batch[0], &batch[batch.len() - 1]);
        let label = range_label(first.index, last.index);
        info!(
            size = batch.len(),
            first = %first.name,
            last = %last.name,
            "dispatching batch"
        );

        let names: Vec<&str> = batch.iter().map(|n| n.name.as_str()).collect();
        let request = CompletionRequest::for_batch(self.api, prompt, &names);

        let text = match self.service.complete(&request) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, batch = ?names, "completion service call failed");
                return Err(ErrorEntry {
                    category: BatchFailure::ServiceCallFailed,
                    range_label: label,
                    raw_response: String::new(),
                    reason: e.to_string(),
                });
            }
        };

        let text = match text {
            Some(t) if !t.trim().is_empty() => t,
            other => {
                warn!(%label, "empty or malformed response, skipping batch");
                return Err(ErrorEntry {
                    category: BatchFailure::EmptyResponse,
                    range_label: label,
                    raw_response: other.unwrap_or_default(),
                    reason: "response has no text content".to_string(),
                });
            }
        };
        debug!(len = text.len(), "response received");

        let lines = response_lines(&text);
        match store.append_success(&lines) {
            Ok(written) => {
                info!(
                    written,
                    file = %store.success_path().display(),
                    "saved records"
                );
                Ok(written)
            }
            Err(e) => {
                let reason = format!("{e:#}");
                // lines appended before the failure stay in the file
                error!(error = %reason, response = ?text, "failed to persist response");
                Err(ErrorEntry {
                    category: BatchFailure::PersistFailed,
                    range_label: label,
                    raw_response: text,
                    reason,
                })
            }
        }
    }
}

/// Split a response into result lines: surrounding whitespace of the whole
/// response is dropped, then each line loses a trailing `\r`.
#[must_use]
pub fn response_lines(text: &str) -> Vec<&str> {
    text.trim()
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_lines_trim_outer_whitespace_and_cr() {
        assert_eq!(
            response_lines("\n a|b\r\nc|d\n\n"),
            vec!["a|b", "c|d"]
        );
    }

    #[test]
    fn single_line_response() {
        assert_eq!(response_lines("阿司匹林|Aspirin"), vec!["阿司匹林|Aspirin"]);
    }
}
