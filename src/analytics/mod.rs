//! Question analytics: the JSONL question log and its reporter.

pub mod logger;
pub mod reporter;
