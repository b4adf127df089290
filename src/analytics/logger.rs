use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::app_dir;
use crate::config::schema::LoggingConfig;
use crate::llm::{GenerationError, NO_RESPONSE};

// ---------------------------------------------------------------------------
// Question log entry (JSONL analytics)
// ---------------------------------------------------------------------------

/// A single entry in the question log (`~/.rare-earths/ask-log.jsonl`).
///
/// Records how a question went, never what was asked or answered: only the
/// question length is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskLogEntry {
    pub timestamp: String,
    /// Where the question came from: `"web"` or `"cli"`.
    pub surface: String,
    pub question_chars: usize,
    /// Prior transcript messages sent with the question.
    #[serde(default)]
    pub history_messages: usize,
    /// `"answered"`, `"no_response"`, or a [`GenerationError::kind`] tag.
    pub outcome: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub latency_ms: Option<u64>,
}

impl AskLogEntry {
    /// Build an entry stamped with the current time.
    pub fn new(
        surface: &str,
        question_chars: usize,
        history_messages: usize,
        outcome: &Result<String, GenerationError>,
        model: &str,
        latency_ms: Option<u64>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            surface: surface.to_string(),
            question_chars,
            history_messages,
            outcome: outcome_tag(outcome).to_string(),
            model: model.to_string(),
            latency_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == "answered" || self.outcome == "no_response"
    }
}

/// Tag a generation outcome for the log.
pub fn outcome_tag(outcome: &Result<String, GenerationError>) -> &'static str {
    match outcome {
        Ok(text) if text == NO_RESPONSE => "no_response",
        Ok(_) => "answered",
        Err(e) => e.kind(),
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Append-only JSONL question log.
///
/// A logger without a path is disabled: writes are dropped and reads are
/// empty. All I/O is best-effort; logging never fails a question.
#[derive(Debug, Clone)]
pub struct AskLogger {
    path: Option<PathBuf>,
}

impl AskLogger {
    /// Logger for the configured default location, or disabled.
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            path: config.enabled.then(ask_log_path).flatten(),
        }
    }

    /// Logger writing to an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// Append an entry. Failures are silently ignored.
    pub fn record(&self, entry: &AskLogEntry) {
        let _ = self.append(entry);
    }

    fn append(&self, entry: &AskLogEntry) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }

    /// Read every entry, skipping malformed lines.
    pub fn read_all(&self) -> Vec<AskLogEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };

        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<AskLogEntry>(&line).ok())
            .collect()
    }

    /// Read entries from the last `days` days (all entries for `None`).
    pub fn read_since_days(&self, days: Option<u32>) -> Vec<AskLogEntry> {
        let entries = self.read_all();

        let Some(days) = days else {
            return entries;
        };

        let cutoff = (Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();
        entries
            .into_iter()
            .filter(|e| e.timestamp >= cutoff)
            .collect()
    }
}

/// Default question log location.
pub fn ask_log_path() -> Option<PathBuf> {
    app_dir().map(|dir| dir.join("ask-log.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
