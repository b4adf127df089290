//! Plain-text digest of the dataset, prepended to every question sent to the
//! model so answers stay grounded in the figures shown on the dashboard.
//!
//! Figures are read from [`super::tables`] rather than restated, so the digest
//! cannot drift from the charts.

use std::fmt::Write as _;

use super::tables::{
    COMPOUNDS, COMPOUNDS_AND_METALS, DOMESTIC_PRODUCTION_AND_USE, IMPORT_SOURCES, IMPORTS,
    METALS, MINERAL_CONCENTRATES, PRICES, RECYCLING, TARIFFS, WORLD_MINE_PRODUCTION,
    WORLD_RESERVES,
};
use super::{CountryReserve, CountryYearMetric, latest_row, metric_names, top_n_by};

/// Leading domestic end use, as stated in the narrative.
const LEADING_END_USE: &str = "catalysts";

/// Countries listed under world mine production / reserves.
const WORLD_PRODUCTION_LISTED: usize = 5;
const WORLD_RESERVES_LISTED: usize = 6;

const UNIT_NOTE: &str = "Note: All data is in metric tons, rare-earth-oxide (REO) equivalent, \
unless otherwise specified. Values for 2024 are estimates.";

/// Build the context summary.
///
/// Pure and deterministic: two calls always return the same text.
pub fn context_summary() -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_summary(&mut out);
    out.trim().to_string()
}

fn write_summary(out: &mut String) -> std::fmt::Result {
    writeln!(out, "Key highlights from U.S. Geological Survey Rare Earths data:")?;

    // Domestic production
    let latest = MINERAL_CONCENTRATES.latest();
    match latest {
        Some(p) => writeln!(
            out,
            "Domestic Production ({}): Mineral concentrates at {} tons REO. Leading end use is {}.",
            p.year,
            format_number(p.value.unwrap_or_default()),
            LEADING_END_USE
        )?,
        None => writeln!(out, "Domestic Production: not reported.")?,
    }

    // Import sources
    let sources: Vec<String> = IMPORT_SOURCES
        .iter()
        .map(|s| format!("{} ({}%)", s.name, format_number(s.value)))
        .collect();
    writeln!(out, "Import Sources (2020-23): {}.", sources.join(", "))?;

    // Salient statistics for the latest year
    let year = latest.map(|p| p.year).unwrap_or(2024);
    writeln!(out, "Salient Statistics (US, {year}):")?;
    write_series_line(out, MINERAL_CONCENTRATES.label(), MINERAL_CONCENTRATES.value_in(year), "tons")?;
    write_series_line(out, COMPOUNDS_AND_METALS.label(), COMPOUNDS_AND_METALS.value_in(year), "tons")?;
    if let Some(row) = latest_row(IMPORTS) {
        write_series_line(out, &format!("{COMPOUNDS} Imports"), row.get(COMPOUNDS), "tons")?;
        write_series_line(out, &format!("{METALS} Imports"), row.get(METALS), "tons")?;
    }
    if let Some(row) = latest_row(PRICES) {
        for metric in metric_names(PRICES) {
            match row.get(metric) {
                Some(v) => writeln!(out, "  - {metric} Price: ${}/kg", format_number(v))?,
                None => writeln!(out, "  - {metric} Price: not reported")?,
            }
        }
    }

    // World mine production
    writeln!(out, "World Mine Production ({year}, selected, tons REO):")?;
    let producers = top_n_by(WORLD_MINE_PRODUCTION, WORLD_PRODUCTION_LISTED, |r: &CountryYearMetric| {
        r.value_in(year)
    });
    for row in producers {
        if let Some(v) = row.value_in(year) {
            writeln!(out, "  - {}: {}", row.country, format_number(v))?;
        }
    }

    // World reserves
    writeln!(out, "World Reserves (largest, tons REO):")?;
    let holders = top_n_by(WORLD_RESERVES, WORLD_RESERVES_LISTED, |r: &CountryReserve| r.reserves);
    for row in holders {
        if let Some(v) = row.reserves {
            writeln!(out, "  - {}: {}", row.country, format_number(v))?;
        }
    }

    writeln!(out, "Recycling: {}", RECYCLING.text)?;

    let tariffs: Vec<String> = TARIFFS
        .iter()
        .map(|t| format!("{} {}", t.item, t.rate.trim_end_matches('.')))
        .collect();
    writeln!(out, "Tariffs: {}.", tariffs.join("; "))?;

    writeln!(out, "Background: {}", DOMESTIC_PRODUCTION_AND_USE.text)?;
    writeln!(out, "---")?;
    writeln!(out, "{UNIT_NOTE}")
}

fn write_series_line(out: &mut String, label: &str, value: Option<f64>, unit: &str) -> std::fmt::Result {
    match value {
        Some(v) => writeln!(out, "  - {label}: {} {unit}", format_number(v)),
        None => writeln!(out, "  - {label}: not reported"),
    }
}

/// Format a number with thousands separators, e.g. `44000000.0` → `"44,000,000"`.
///
/// Whole numbers print without decimals; fractional values keep one place.
pub fn format_number(value: f64) -> String {
    let rendered = if value.fract() == 0.0 {
        format!("{:.0}", value.abs())
    } else {
        format!("{:.1}", value.abs())
    };
    let (digits, fraction) = match rendered.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (rendered.as_str(), None),
    };

    let mut grouped = String::with_capacity(rendered.len() + digits.len() / 3 + 1);
    if value < 0.0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = fraction {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_groups_thousands() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(45_000.0), "45,000");
        assert_eq!(format_number(44_000_000.0), "44,000,000");
        assert_eq!(format_number(-1_300.0), "-1,300");
    }

    #[test]
    fn format_number_keeps_one_decimal() {
        assert_eq!(format_number(1_234.5), "1,234.5");
    }

    #[test]
    fn summary_reports_latest_domestic_figures() {
        let summary = context_summary();
        assert!(summary.starts_with("Key highlights"));
        assert!(summary.contains("Mineral concentrates at 45,000 tons REO"));
        assert!(summary.contains("Compounds and Metals Production: 1,300 tons"));
        assert!(summary.contains("Metals Imports: 310 tons"));
        assert!(summary.contains("Neodymium Oxide Price: $56/kg"));
        assert!(summary.contains("Terbium Oxide Price: $810/kg"));
    }

    #[test]
    fn summary_lists_world_leaders() {
        let summary = context_summary();
        assert!(summary.contains("China: 270,000"));
        assert!(summary.contains("China: 44,000,000"));
        assert!(summary.contains("Brazil: 21,000,000"));
        assert!(summary.contains("China (70%)"));
        // Vietnam produced 300 tons; not among the listed leaders.
        assert!(!summary.contains("Vietnam: 300"));
    }

    #[test]
    fn summary_ends_with_unit_note() {
        let summary = context_summary();
        assert!(summary.ends_with("Values for 2024 are estimates."));
        assert_eq!(summary, context_summary());
    }
}
