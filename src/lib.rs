//! # drugbatch
//!
//! Resumable, multi-worker normalization of free-text drug name lists through
//! an OpenAI-compatible chat-completion API.
//!
//! Each name is sent to the model in batches together with a prompt template;
//! the model answers with one pipe-delimited record per name (standard name,
//! market status, indication, combination flag, brand names, ...). Records
//! are appended to per-worker checkpoint files as they arrive, so an
//! interrupted run picks up where it stopped.
//!
//! ## Quick Start
//!
//! ```no_run
//! use drugbatch::{ChatCompletionClient, DrugParser, DrugParserConfig, init_logging};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = DrugParserConfig::load("config.ini")?;
//! init_logging(&config.logging)?;
//!
//! let client = ChatCompletionClient::new(&config.api)?;
//! let prompt = std::fs::read_to_string("prompt.txt")?;
//!
//! let report = DrugParser::new(&config, &client).run_file("drugs.csv", 4, "out", &prompt)?;
//! report.print();
//! # Ok(())
//! # }
//! ```
//!
//! ## Run layout
//!
//! Everything lands in `<output_dir>/parser/`:
//!
//! | File | Written by | Format |
//! |------|------------|--------|
//! | `processed_drugs_single.txt` | single-worker run | `name\|field\|...` per line |
//! | `processed_drugs_worker{i}.txt` | worker `i` of a multi-worker run | same |
//! | `processed_errors_*.txt` | matching worker | `category\trows a - b\tresponse\treason` |
//! | `results.txt` | merger, multi-worker runs only | concatenated worker files |
//! | `run_report.json` | every run | [`RunReport`] |
//!
//! ## Resuming
//!
//! The first field of every checkpoint line is the raw name that produced
//! it. On startup each worker skips names already present there, so running
//! the same input into the same directory again only sends what is missing:
//! names from failed batches, or names past the point where the previous run
//! was killed. The worker count must stay the same between runs for the
//! partitions (and therefore the checkpoint files) to line up.
//!
//! ## Module Overview
//!
//! - [`config`] - INI + environment configuration
//! - [`logging`] - tracing subscriber setup
//! - [`error`] - completion and batch failure types
//! - [`io`] - input table reading, decompression, file discovery
//! - [`names`] - name cleaning, dedup and windowing
//! - [`partition`] - splitting names across workers
//! - [`checkpoint`] - append-only success and error files
//! - [`completion`] - completion service trait and HTTP client
//! - [`dispatcher`] - per-batch request loop
//! - [`worker`] - resume one partition
//! - [`coordinator`] - run all partitions
//! - [`merge`] - consolidate worker output
//! - [`pipeline`] - the whole run end to end
//! - [`report`] - run summary and `run_report.json`

pub mod checkpoint;
pub mod completion;
pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod io;
pub mod logging;
pub mod merge;
pub mod names;
pub mod partition;
pub mod pipeline;
pub mod report;
pub mod worker;

pub use checkpoint::{CheckpointStore, ErrorEntry};
pub use completion::{ChatCompletionClient, CompletionRequest, CompletionService};
pub use config::{ConfigLoadError, DrugParserConfig};
pub use dispatcher::{BatchDispatcher, DispatchStats};
pub use error::{BatchFailure, CompletionError};
pub use logging::init_logging;
pub use merge::merge_results;
pub use names::{IndexedName, extract_names, window_range};
pub use partition::{Partition, PartitionId, partition_ranges};
pub use pipeline::DrugParser;
pub use report::RunReport;
pub use worker::{WorkerReport, run_worker};
