//! Presentation layer: dataset tables mapped to chart, table and text views.
//!
//! Every builder here is a pure function from constant tables to a
//! serializable view. [`svg`] draws chart views as inline SVG and [`page`]
//! assembles the dashboard page.

pub mod page;
pub mod svg;

use serde::Serialize;

use crate::dataset::{
    self, CategoricalShare, CountryReserve, CountryYearMetric, MetricSeries, MultiMetricRow,
    TariffEntry, TextBlock, tables,
};

/// Line colour of the mineral-concentrates production chart.
pub const CONCENTRATES_COLOR: &str = "#0ea5e9";
/// Line colour of the compounds-and-metals production chart.
pub const COMPOUNDS_METALS_COLOR: &str = "#f97316";
/// Cycled across multi-series charts.
pub const SERIES_COLORS: [&str; 4] = ["#8884d8", "#82ca9d", "#ffc658", "#ff7300"];
pub const PIE_COLORS: [&str; 6] = ["#0088FE", "#00C49F", "#FFBB28", "#FF8042", "#8884D8", "#82CA9D"];
pub const RESERVES_COLOR: &str = "#ffc658";

/// Countries shown in the reserves ranking.
pub const RESERVES_TOP_N: usize = 10;

// ---------------------------------------------------------------------------
// View types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    StackedBar,
    GroupedBar,
    Pie,
    HorizontalBar,
}

/// One plotted series. `values` line up with the chart's categories;
/// `None` is a gap, never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesView {
    pub name: String,
    pub color: &'static str,
    pub values: Vec<Option<f64>>,
    /// Per-category colours (pie slices).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub point_colors: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub id: &'static str,
    pub title: String,
    pub kind: ChartKind,
    pub categories: Vec<String>,
    pub series: Vec<SeriesView>,
    /// Drawing height in pixels.
    pub height: u32,
}

impl ChartView {
    /// Largest reported value across all series.
    pub fn max_value(&self) -> Option<f64> {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().flatten().copied())
            .reduce(f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub id: &'static str,
    pub title: String,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextView {
    pub id: &'static str,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum View {
    Chart(ChartView),
    Table(TableView),
    Text(TextView),
}

/// How much of the page row a section occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Width {
    Half,
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub width: Width,
    pub view: View,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Single-series yearly trend.
pub fn production_line_chart(series: &MetricSeries, color: &'static str) -> ChartView {
    ChartView {
        id: slug(series.label()),
        title: series.name.to_string(),
        kind: ChartKind::Line,
        categories: series.points.iter().map(|p| p.year.to_string()).collect(),
        series: vec![SeriesView {
            name: series.label().to_string(),
            color,
            values: series.points.iter().map(|p| p.value).collect(),
            point_colors: Vec::new(),
        }],
        height: 300,
    }
}

pub fn imports_bar_chart(rows: &[MultiMetricRow]) -> ChartView {
    let mut chart = multi_metric_chart(
        "imports",
        "U.S. Imports: Compounds and Metals (tons REO)",
        ChartKind::StackedBar,
        rows,
    );
    for series in &mut chart.series {
        if series.name == tables::METALS {
            series.name = "Metals (Total)".to_string();
        }
    }
    chart
}

pub fn prices_line_chart(rows: &[MultiMetricRow]) -> ChartView {
    multi_metric_chart(
        "prices",
        "Average Prices (USD per Kilogram)",
        ChartKind::Line,
        rows,
    )
}

/// One series per metric, taken from the union of keys across rows.
fn multi_metric_chart(
    id: &'static str,
    title: &str,
    kind: ChartKind,
    rows: &[MultiMetricRow],
) -> ChartView {
    let series = dataset::metric_names(rows)
        .into_iter()
        .enumerate()
        .map(|(i, name)| SeriesView {
            name: name.to_string(),
            color: SERIES_COLORS[i % SERIES_COLORS.len()],
            values: rows.iter().map(|r| r.get(name)).collect(),
            point_colors: Vec::new(),
        })
        .collect();

    ChartView {
        id,
        title: title.to_string(),
        kind,
        categories: rows.iter().map(|r| r.year.to_string()).collect(),
        series,
        height: 300,
    }
}

pub fn import_sources_pie(shares: &[CategoricalShare]) -> ChartView {
    ChartView {
        id: "import-sources",
        title: "U.S. Import Sources (2020-23, % of total value)".to_string(),
        kind: ChartKind::Pie,
        categories: shares.iter().map(|s| s.name.to_string()).collect(),
        series: vec![SeriesView {
            name: "Share".to_string(),
            color: PIE_COLORS[0],
            values: shares.iter().map(|s| Some(s.value)).collect(),
            point_colors: (0..shares.len())
                .map(|i| PIE_COLORS[i % PIE_COLORS.len()])
                .collect(),
        }],
        height: 300,
    }
}

pub fn tariff_table(entries: &[TariffEntry]) -> TableView {
    TableView {
        id: "tariffs",
        title: "U.S. Tariff Information (as of 12-31-24)".to_string(),
        headers: vec!["Item", "Number", "Normal Trade Relations"],
        rows: entries
            .iter()
            .map(|t| vec![t.item.to_string(), t.code.to_string(), t.rate.to_string()])
            .collect(),
    }
}

/// Countries side by side, one bar per year. The latest year is an estimate.
pub fn world_production_chart(rows: &[CountryYearMetric]) -> ChartView {
    let years = dataset::years_of(rows);
    let latest = years.last().copied();

    let series = years
        .iter()
        .enumerate()
        .map(|(i, &year)| SeriesView {
            name: if Some(year) == latest && years.len() > 1 {
                format!("{year} Production (est.)")
            } else {
                format!("{year} Production")
            },
            color: SERIES_COLORS[i % SERIES_COLORS.len()],
            values: rows.iter().map(|r| r.value_in(year)).collect(),
            point_colors: Vec::new(),
        })
        .collect();

    ChartView {
        id: "world-production",
        title: "World Mine Production (Selected Countries, tons REO)".to_string(),
        kind: ChartKind::GroupedBar,
        categories: rows.iter().map(|r| r.country.to_string()).collect(),
        series,
        height: 400,
    }
}

/// The [`RESERVES_TOP_N`] largest reserves, largest first.
pub fn world_reserves_chart(reserves: &[CountryReserve]) -> ChartView {
    let ranked = dataset::top_n_by(reserves, RESERVES_TOP_N, |r| r.reserves);

    ChartView {
        id: "world-reserves",
        title: format!("World Reserves (Top {RESERVES_TOP_N} Countries, tons REO)"),
        kind: ChartKind::HorizontalBar,
        categories: ranked.iter().map(|r| r.country.to_string()).collect(),
        series: vec![SeriesView {
            name: "Reserves (est.)".to_string(),
            color: RESERVES_COLOR,
            values: ranked.iter().map(|r| r.reserves).collect(),
            point_colors: Vec::new(),
        }],
        height: 400,
    }
}

pub fn text_block(block: &TextBlock) -> TextView {
    TextView {
        id: slug(block.title),
        title: block.title.to_string(),
        text: block.text.to_string(),
    }
}

/// Every dashboard section, in page order. The chat panel follows these.
pub fn dashboard_sections() -> Vec<Section> {
    use View::{Chart, Table, Text};
    use Width::{Full, Half};

    let section = |width, view| Section { width, view };
    vec![
        section(Full, Text(text_block(&tables::DOMESTIC_PRODUCTION_AND_USE))),
        section(
            Half,
            Chart(production_line_chart(&tables::MINERAL_CONCENTRATES, CONCENTRATES_COLOR)),
        ),
        section(
            Half,
            Chart(production_line_chart(&tables::COMPOUNDS_AND_METALS, COMPOUNDS_METALS_COLOR)),
        ),
        section(Half, Chart(imports_bar_chart(tables::IMPORTS))),
        section(Half, Chart(prices_line_chart(tables::PRICES))),
        section(Half, Chart(import_sources_pie(tables::IMPORT_SOURCES))),
        section(Half, Table(tariff_table(tables::TARIFFS))),
        section(Full, Chart(world_production_chart(tables::WORLD_MINE_PRODUCTION))),
        section(Full, Chart(world_reserves_chart(tables::WORLD_RESERVES))),
        section(Full, Text(text_block(&tables::RECYCLING))),
    ]
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Element ids for the fixed set of titles used above.
fn slug(title: &str) -> &'static str {
    match title {
        t if t.starts_with("Mineral Concentrates") => "mineral-concentrates",
        t if t.starts_with("Compounds and Metals") => "compounds-metals",
        t if t.starts_with("Domestic Production") => "domestic-production",
        t if t.starts_with("Recycling") => "recycling",
        _ => "section",
    }
}

/// Escape text for HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
