//! Question-log reporter: totals, failure breakdown, and daily activity.
//!
//! Reads the JSONL question log and aggregates it for `rare-earths stats`.

use std::collections::HashMap;

use serde::Serialize;

use crate::analytics::logger::{AskLogEntry, AskLogger};

// ---------------------------------------------------------------------------
// Aggregated stats
// ---------------------------------------------------------------------------

/// Summary statistics for `rare-earths stats`.
#[derive(Debug, Default, Serialize)]
pub struct AskStats {
    pub total_questions: usize,
    pub answered: usize,
    pub no_response: usize,
    pub failed: usize,
    /// Failure counts by error kind, most frequent first.
    pub failures: Vec<FailureStat>,
    /// Mean latency over entries that recorded one.
    pub avg_latency_ms: Option<u64>,
    pub daily: Vec<DailyActivity>,
}

impl AskStats {
    /// Share of questions that produced an answer, 0.0 when empty.
    pub fn success_pct(&self) -> f64 {
        if self.total_questions == 0 {
            0.0
        } else {
            ((self.answered + self.no_response) as f64 / self.total_questions as f64) * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureStat {
    pub kind: String,
    pub count: usize,
}

/// Questions asked on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyActivity {
    pub date: String,
    pub questions: usize,
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// Stats computation
// ---------------------------------------------------------------------------

/// Compute stats from `logger`, optionally limited to the last `days` days.
pub fn compute_stats(logger: &AskLogger, days: Option<u32>) -> AskStats {
    build_stats(&logger.read_since_days(days))
}

pub fn build_stats(entries: &[AskLogEntry]) -> AskStats {
    if entries.is_empty() {
        return AskStats::default();
    }

    let answered = entries.iter().filter(|e| e.outcome == "answered").count();
    let no_response = entries.iter().filter(|e| e.outcome == "no_response").count();

    let latencies: Vec<u64> = entries.iter().filter_map(|e| e.latency_ms).collect();
    let avg_latency_ms = if latencies.is_empty() {
        None
    } else {
        Some(latencies.iter().sum::<u64>() / latencies.len() as u64)
    };

    AskStats {
        total_questions: entries.len(),
        answered,
        no_response,
        failed: entries.len() - answered - no_response,
        failures: compute_failures(entries),
        avg_latency_ms,
        daily: compute_daily(entries),
    }
}

fn compute_failures(entries: &[AskLogEntry]) -> Vec<FailureStat> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries.iter().filter(|e| !e.is_success()) {
        *counts.entry(&entry.outcome).or_default() += 1;
    }

    let mut failures: Vec<FailureStat> = counts
        .into_iter()
        .map(|(kind, count)| FailureStat {
            kind: kind.to_string(),
            count,
        })
        .collect();

    // Ties broken by name so output is stable
    failures.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.kind.cmp(&b.kind)));
    failures
}

fn compute_daily(entries: &[AskLogEntry]) -> Vec<DailyActivity> {
    let mut daily: HashMap<String, Vec<&AskLogEntry>> = HashMap::new();
    for entry in entries {
        // RFC 3339: first 10 chars are YYYY-MM-DD
        let date = entry.timestamp.get(..10).unwrap_or("unknown").to_string();
        daily.entry(date).or_default().push(entry);
    }

    let mut days: Vec<DailyActivity> = daily
        .into_iter()
        .map(|(date, group)| DailyActivity {
            date,
            questions: group.len(),
            failed: group.iter().filter(|e| !e.is_success()).count(),
        })
        .collect();

    days.sort_by(|a, b| a.date.cmp(&b.date));
    days
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(timestamp: &str, outcome: &str, latency_ms: Option<u64>) -> AskLogEntry {
        AskLogEntry {
            timestamp: timestamp.to_string(),
            surface: "web".to_string(),
            question_chars: 20,
            history_messages: 0,
            outcome: outcome.to_string(),
            model: "gemini-2.5-flash".to_string(),
            latency_ms,
        }
    }

    fn sample_entries() -> Vec<AskLogEntry> {
        vec![
            entry("2026-03-01T10:00:00+00:00", "answered", Some(800)),
            entry("2026-03-01T10:05:00+00:00", "answered", Some(1200)),
            entry("2026-03-01T11:00:00+00:00", "timeout", Some(30_000)),
            entry("2026-03-02T09:00:00+00:00", "no_response", Some(400)),
            entry("2026-03-02T09:30:00+00:00", "not_configured", None),
            entry("2026-03-02T09:31:00+00:00", "not_configured", None),
        ]
    }

    #[test]
    fn totals_split_by_outcome() {
        let stats = build_stats(&sample_entries());
        assert_eq!(stats.total_questions, 6);
        assert_eq!(stats.answered, 2);
        assert_eq!(stats.no_response, 1);
        assert_eq!(stats.failed, 3);
        assert!((stats.success_pct() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn failures_sorted_by_count() {
        let stats = build_stats(&sample_entries());
        assert_eq!(stats.failures.len(), 2);
        assert_eq!(stats.failures[0].kind, "not_configured");
        assert_eq!(stats.failures[0].count, 2);
        assert_eq!(stats.failures[1].kind, "timeout");
    }

    #[test]
    fn latency_averages_only_recorded_values() {
        let stats = build_stats(&sample_entries());
        assert_eq!(stats.avg_latency_ms, Some((800 + 1200 + 30_000 + 400) / 4));
    }

    #[test]
    fn daily_activity_is_chronological() {
        let stats = build_stats(&sample_entries());
        assert_eq!(stats.daily.len(), 2);
        assert_eq!(stats.daily[0].date, "2026-03-01");
        assert_eq!(stats.daily[0].questions, 3);
        assert_eq!(stats.daily[0].failed, 1);
        assert_eq!(stats.daily[1].failed, 2);
    }

    #[test]
    fn empty_log_gives_zeroes() {
        let stats = build_stats(&[]);
        assert_eq!(stats.total_questions, 0);
        assert_eq!(stats.avg_latency_ms, None);
        assert_eq!(stats.success_pct(), 0.0);
    }
}
