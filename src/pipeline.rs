//! End-to-end run: plan, dispatch, merge, report.

use crate::completion::CompletionService;
use crate::config::DrugParserConfig;
use crate::coordinator::{plan_run, run_partitions};
use crate::io::table::read_name_cells;
use crate::merge::merge_results;
use crate::report::{REPORT_FILE, RunReport};
use anyhow::{Context, Result, bail};
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, info_span};

/// Subdirectory of the output directory that holds all run files.
pub const PARSER_DIR: &str = "parser";

/// A configured drug-name normalization run.
///
/// ```no_run
/// use drugbatch::{ChatCompletionClient, DrugParser, DrugParserConfig};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = DrugParserConfig::load("config.ini")?;
/// let client = ChatCompletionClient::new(&config.api)?;
/// let parser = DrugParser::new(&config, &client);
///
/// let prompt = std::fs::read_to_string("prompt.txt")?;
/// let report = parser.run_file("drugs.csv", 4, "out", &prompt)?;
/// report.print();
/// # Ok(())
/// # }
/// ```
pub struct DrugParser<'a> {
    config: &'a DrugParserConfig,
    service: &'a dyn CompletionService,
}

impl<'a> DrugParser<'a> {
    pub fn new(config: &'a DrugParserConfig, service: &'a dyn CompletionService) -> Self {
        Self { config, service }
    }

    /// Directory under `output_dir` that a run writes into.
    pub fn parser_dir(output_dir: impl AsRef<Path>) -> PathBuf {
        output_dir.as_ref().join(PARSER_DIR)
    }

    /// Read the table at `input` and [`run`](Self::run) over its name column.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be read, plus everything
    /// [`run`](Self::run) can return.
    pub fn run_file(
        &self,
        input: impl AsRef<Path>,
        workers: usize,
        output_dir: impl AsRef<Path>,
        prompt: &str,
    ) -> Result<RunReport> {
        let cells = read_name_cells(input)?;
        self.run(cells, workers, output_dir, prompt)
    }

    /// Normalize the names in `cells` into `output_dir/parser`.
    ///
    /// Multi-worker runs merge their worker files into `results.txt` once
    /// every worker has finished. The run report is saved as
    /// `run_report.json` next to the results.
    ///
    /// # Errors
    ///
    /// Returns an error if `workers` is zero, the output directory cannot be
    /// created, a worker cannot read its checkpoint, or the merge fails.
    /// Individual batch failures are recorded in the error files instead.
    pub fn run<I, S>(
        &self,
        cells: I,
        workers: usize,
        output_dir: impl AsRef<Path>,
        prompt: &str,
    ) -> Result<RunReport>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        if workers == 0 {
            bail!("worker count must be at least 1");
        }
        let _run = info_span!("run", pid = std::process::id()).entered();
        let started = Instant::now();

        let dir = Self::parser_dir(output_dir);
        create_dir_all(&dir).with_context(|| format!("mkdir -p {}", dir.display()))?;
        info!(dir = %dir.display(), "writing results");

        let process = &self.config.process;
        let plan = plan_run(cells, workers, process.start_index, process.max_record());
        let reports = run_partitions(&plan, &dir, self.service, self.config, prompt)?;

        let merge = if workers > 1 {
            Some(merge_results(&dir)?)
        } else {
            None
        };

        let report = RunReport {
            total_names: plan.total_names,
            window_start: plan.window.start,
            window_end: plan.window.end,
            workers: reports,
            merge,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        report.save_to_file(dir.join(REPORT_FILE))?;
        Ok(report)
    }
}
