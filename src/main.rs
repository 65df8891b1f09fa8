//! `drugbatch` command-line entry point.

use anyhow::{Context, Result};
use clap::Parser;
use drugbatch::completion::DEFAULT_PROMPT;
use drugbatch::{ChatCompletionClient, DrugParser, DrugParserConfig, init_logging};
use std::path::{Path, PathBuf};
use tracing::info;

/// Configuration file read when `--config` is not given, if it exists.
const DEFAULT_CONFIG_FILE: &str = "config.ini";

/// Normalize a table of drug names through a chat-completion API.
#[derive(Debug, Parser)]
#[command(name = "drugbatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input table (CSV or TSV, optionally .gz/.zst); names are read from the
    /// second column.
    #[arg(long, short)]
    input: PathBuf,

    /// Number of concurrent workers.
    #[arg(long, short, default_value_t = 1)]
    workers: usize,

    /// Output directory; files are written under `<dir>/parser`.
    #[arg(long, short, default_value = "output")]
    output_dir: PathBuf,

    /// File holding the prompt template sent ahead of every batch; the
    /// built-in drug table template when omitted.
    #[arg(long, short)]
    prompt: Option<PathBuf>,

    /// INI configuration file. Without it, `config.ini` is used when present,
    /// otherwise settings come from `DRUGBATCH_*` variables alone.
    #[arg(long, short, env = "DRUGBATCH_CONFIG")]
    config: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<DrugParserConfig> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Path::new(DEFAULT_CONFIG_FILE),
        None => return DrugParserConfig::from_env().context("load configuration from environment"),
    };
    DrugParserConfig::load(path)
        .with_context(|| format!("load configuration from {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging)?;

    let prompt = match &cli.prompt {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("read prompt {}", path.display()))?,
        None => DEFAULT_PROMPT.to_string(),
    };
    let client = ChatCompletionClient::new(&config.api)?;
    info!(
        pid = std::process::id(),
        endpoint = client.endpoint(),
        model = %config.api.model,
        "completion client ready"
    );

    let report = DrugParser::new(&config, &client).run_file(
        &cli.input,
        cli.workers,
        &cli.output_dir,
        prompt.trim_end(),
    )?;
    report.print();

    println!(
        "processed {} names in {} worker(s): {} records written, {} failed batches",
        report.dispatched(),
        report.workers.len(),
        report.lines_written(),
        report.failed_batches()
    );
    if let Some(merge) = &report.merge {
        println!("merged {} files into {}", merge.files.len(), merge.output.display());
    }
    Ok(())
}
