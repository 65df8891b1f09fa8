//! Shared test utilities: a scripted completion service and config helpers.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use drugbatch::completion::{CompletionRequest, CompletionService};
use drugbatch::config::DrugParserConfig;
use drugbatch::error::CompletionError;
use std::collections::HashSet;
use std::sync::Mutex;

/// Prompt used by every test; it has no newline so batches split cleanly.
pub const PROMPT: &str = "Normalize each drug name into: name|standard|status|indication|combo|brands";

/// What the fake answers for a given call.
#[derive(Clone, Debug)]
pub enum Reply {
    /// One `name|STD-name|listed` line per name in the batch.
    Echo,
    /// Fail with a 503 status.
    Fail,
    /// Answer without message content.
    Empty,
    /// Answer with this exact text.
    Text(String),
}

/// In-memory [`CompletionService`] that records every batch it is sent.
pub struct ScriptedService {
    calls: Mutex<Vec<Vec<String>>>,
    /// Replies by zero-based call number; anything unlisted echoes.
    script: Vec<(usize, Reply)>,
    /// Names that always make their batch fail, regardless of call order.
    poison: HashSet<String>,
}

impl ScriptedService {
    pub fn echo() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Vec::new(),
            poison: HashSet::new(),
        }
    }

    pub fn with_script(script: Vec<(usize, Reply)>) -> Self {
        Self {
            script,
            ..Self::echo()
        }
    }

    pub fn poisoned<I: IntoIterator<Item = &'static str>>(names: I) -> Self {
        Self {
            poison: names.into_iter().map(String::from).collect(),
            ..Self::echo()
        }
    }

    /// Batches received so far, in arrival order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Every name received so far, across all batches.
    pub fn sent_names(&self) -> Vec<String> {
        self.calls().into_iter().flatten().collect()
    }
}

/// Names carried by a request built with [`PROMPT`].
pub fn batch_names(request: &CompletionRequest) -> Vec<String> {
    let user = &request.messages[1].content;
    user.strip_prefix(PROMPT)
        .and_then(|rest| rest.strip_prefix('\n'))
        .unwrap_or_default()
        .lines()
        .map(String::from)
        .collect()
}

/// The record the echo reply produces for `name`.
pub fn echo_line(name: &str) -> String {
    format!("{name}|STD-{name}|listed")
}

impl CompletionService for ScriptedService {
    fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, CompletionError> {
        let names = batch_names(request);
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(names.clone());
            calls.len() - 1
        };

        if names.iter().any(|n| self.poison.contains(n)) {
            return Err(CompletionError::Transport("connection reset by peer".into()));
        }

        let reply = self
            .script
            .iter()
            .find(|(n, _)| *n == call)
            .map_or(Reply::Echo, |(_, r)| r.clone());

        match reply {
            Reply::Echo => Ok(Some(
                names.iter().map(|n| echo_line(n)).collect::<Vec<_>>().join("\n"),
            )),
            Reply::Fail => Err(CompletionError::Status {
                status: 503,
                body: "upstream overloaded".into(),
            }),
            Reply::Empty => Ok(None),
            Reply::Text(t) => Ok(Some(t)),
        }
    }
}

/// Defaults with the given batch size and no inter-batch pause.
pub fn test_config(batch_size: usize) -> DrugParserConfig {
    let mut config = DrugParserConfig::default();
    config.process.batch_size = batch_size;
    config.process.batch_delay_ms = 0;
    config
}

/// Lines of a text file, or nothing if it does not exist.
pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .map(|s| s.lines().map(String::from).collect())
        .unwrap_or_default()
}
