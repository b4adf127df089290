//! Embedded rare-earths dataset.
//!
//! Every table is a process-wide `static` built from the U.S. Geological
//! Survey Mineral Commodity Summaries (January 2025). Quantities are metric
//! tons of rare-earth-oxide (REO) equivalent unless a series name says
//! otherwise. Nothing here is ever mutated.
//!
//! - [`tables`] — the constant tables themselves
//! - [`summary`] — the plain-text digest used to ground model answers

pub mod summary;
pub mod tables;

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use summary::context_summary;

// ---------------------------------------------------------------------------
// Series types
// ---------------------------------------------------------------------------

/// A single `(year, value)` observation. `None` means unreported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataPoint {
    pub year: u16,
    pub value: Option<f64>,
}

impl DataPoint {
    pub const fn new(year: u16, value: Option<f64>) -> Self {
        Self { year, value }
    }
}

/// A named yearly series, e.g. `"Mineral Concentrates Production (tons REO)"`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSeries {
    pub name: &'static str,
    pub points: &'static [DataPoint],
}

/// Matches `"Label (unit)"` series names.
static LABEL_UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<label>[^(]*?)\s*\((?P<unit>[^)]*)\)\s*$")
        .expect("label/unit regex must compile")
});

impl MetricSeries {
    /// Series name without the trailing unit, used as a legend label.
    pub fn label(&self) -> &'static str {
        LABEL_UNIT_RE
            .captures(self.name)
            .and_then(|c| c.name("label"))
            .map(|m| m.as_str())
            .unwrap_or(self.name)
    }

    /// Unit in parentheses at the end of the name, if any.
    pub fn unit(&self) -> Option<&'static str> {
        LABEL_UNIT_RE
            .captures(self.name)
            .and_then(|c| c.name("unit"))
            .map(|m| m.as_str())
    }

    /// Most recent reported point (skips trailing gaps).
    pub fn latest(&self) -> Option<DataPoint> {
        self.points
            .iter()
            .filter(|p| p.value.is_some())
            .max_by_key(|p| p.year)
            .copied()
    }

    /// Value reported for `year`, if any.
    pub fn value_in(&self, year: u16) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.year == year)
            .and_then(|p| p.value)
    }
}

/// One year of a multi-series table (prices, imports).
///
/// The metric names travel with each row so a table can gain new metrics
/// without a schema change.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MultiMetricRow {
    pub year: u16,
    pub values: &'static [(&'static str, Option<f64>)],
}

impl MultiMetricRow {
    /// Value for `metric` in this row. Missing keys and unreported values
    /// both come back as `None`.
    pub fn get(&self, metric: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| *name == metric)
            .and_then(|(_, v)| *v)
    }
}

/// Ordered union of the metric names used across `rows`, in first-seen order.
pub fn metric_names(rows: &[MultiMetricRow]) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for row in rows {
        for (name, _) in row.values {
            if !names.contains(name) {
                names.push(*name);
            }
        }
    }
    names
}

/// Latest row of a multi-series table by year.
pub fn latest_row(rows: &[MultiMetricRow]) -> Option<&MultiMetricRow> {
    rows.iter().max_by_key(|r| r.year)
}

// ---------------------------------------------------------------------------
// Categorical and per-country types
// ---------------------------------------------------------------------------

/// A named share of a whole, in percent.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CategoricalShare {
    pub name: &'static str,
    pub value: f64,
}

/// Sum of the shares. Expected to be close to 100 but not enforced.
pub fn share_total(shares: &[CategoricalShare]) -> f64 {
    shares.iter().map(|s| s.value).sum()
}

/// A tariff schedule line.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TariffEntry {
    pub item: &'static str,
    /// Harmonized Tariff Schedule number.
    pub code: &'static str,
    /// Normal trade relations rate, as printed.
    pub rate: &'static str,
}

/// Per-country values keyed by year, for cross-country comparisons.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CountryYearMetric {
    pub country: &'static str,
    pub values: &'static [(u16, Option<f64>)],
}

impl CountryYearMetric {
    pub fn value_in(&self, year: u16) -> Option<f64> {
        self.values
            .iter()
            .find(|(y, _)| *y == year)
            .and_then(|(_, v)| *v)
    }
}

/// Years present across `rows`, ascending.
pub fn years_of(rows: &[CountryYearMetric]) -> Vec<u16> {
    let mut years: Vec<u16> = rows
        .iter()
        .flat_map(|r| r.values.iter().map(|(y, _)| *y))
        .collect();
    years.sort_unstable();
    years.dedup();
    years
}

/// Estimated reserves for one country.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CountryReserve {
    pub country: &'static str,
    pub reserves: Option<f64>,
}

/// A titled narrative paragraph.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TextBlock {
    pub title: &'static str,
    pub text: &'static str,
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// The first `n` items by `key`, largest first.
///
/// The sort is stable, so ties keep their table order. Items whose key is
/// absent rank after every reported value.
pub fn top_n_by<T, F>(items: &[T], n: usize, key: F) -> Vec<T>
where
    T: Copy,
    F: Fn(&T) -> Option<f64>,
{
    let mut ranked: Vec<T> = items.to_vec();
    ranked.sort_by(|a, b| match (key(a), key(b)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ranked.truncate(n);
    ranked
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
