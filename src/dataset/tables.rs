//! Constant tables, transcribed from the USGS rare-earths summary.
//!
//! Several figures in the source document were printed with footnote digits
//! fused onto the number; the values below are the de-footnoted readings.

use super::{
    CategoricalShare, CountryReserve, CountryYearMetric, DataPoint, MetricSeries, MultiMetricRow,
    TariffEntry, TextBlock,
};

pub const SOURCE_NOTE: &str = "Data based on U.S. Geological Survey, Mineral Commodity Summaries, January 2025.";

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

pub static DOMESTIC_PRODUCTION_AND_USE: TextBlock = TextBlock {
    title: "Domestic Production and Use (Summary 2024)",
    text: "Rare earths were mined and processed domestically in 2024. An estimated 45,000 tons \
of REO in mineral concentrates were produced and were valued at $260 million. Bastnaesite \
(or bastnäsite), a rare-earth fluorocarbonate mineral, was mined as a primary product at a mine \
in Mountain Pass, CA. Monazite, a phosphate mineral, was stockpiled as a separated concentrate or \
included as an accessory mineral in heavy-mineral-sand concentrates in the southeastern United \
States. Mixed rare-earth compounds also were produced in the Western United States. The \
estimated value of rare-earth compounds and metals imported by the United States in 2024 was \
$170 million, an 11% decrease from $186 million in 2023. The estimated leading domestic end use \
of rare earths was catalysts. Significant amounts of rare earths are imported as permanent \
magnets embedded in finished goods. Other end uses were ceramics and glass, metallurgical \
applications and alloys, and polishing.",
};

pub static RECYCLING: TextBlock = TextBlock {
    title: "Recycling",
    text: "Limited quantities of rare earths were recovered from batteries, permanent magnets, \
and fluorescent lamps.",
};

// ---------------------------------------------------------------------------
// Salient U.S. statistics
// ---------------------------------------------------------------------------

pub static MINERAL_CONCENTRATES: MetricSeries = MetricSeries {
    name: "Mineral Concentrates Production (tons REO)",
    points: &[
        DataPoint::new(2020, Some(39_000.0)),
        DataPoint::new(2021, Some(42_400.0)),
        DataPoint::new(2022, Some(42_500.0)),
        DataPoint::new(2023, Some(41_600.0)),
        DataPoint::new(2024, Some(45_000.0)),
    ],
};

/// 2020 was not reported separately.
pub static COMPOUNDS_AND_METALS: MetricSeries = MetricSeries {
    name: "Compounds and Metals Production (tons REO)",
    points: &[
        DataPoint::new(2020, None),
        DataPoint::new(2021, Some(120.0)),
        DataPoint::new(2022, Some(95.0)),
        DataPoint::new(2023, Some(250.0)),
        DataPoint::new(2024, Some(1_300.0)),
    ],
};

pub const COMPOUNDS: &str = "Compounds";
pub const METALS: &str = "Metals";

/// Imports of compounds and metals. `Metals` is ferrocerium plus other
/// rare-earth metals.
pub static IMPORTS: &[MultiMetricRow] = &[
    MultiMetricRow {
        year: 2020,
        values: &[(COMPOUNDS, Some(6_510.0)), (METALS, Some(270.0 + 363.0))],
    },
    MultiMetricRow {
        year: 2021,
        values: &[(COMPOUNDS, Some(7_690.0)), (METALS, Some(330.0 + 580.0))],
    },
    MultiMetricRow {
        year: 2022,
        values: &[(COMPOUNDS, Some(10_700.0)), (METALS, Some(395.0 + 487.0))],
    },
    MultiMetricRow {
        year: 2023,
        values: &[(COMPOUNDS, Some(8_920.0)), (METALS, Some(259.0 + 476.0))],
    },
    MultiMetricRow {
        year: 2024,
        values: &[(COMPOUNDS, Some(8_000.0)), (METALS, Some(220.0 + 90.0))],
    },
];

pub const NEODYMIUM_OXIDE: &str = "Neodymium Oxide";
pub const TERBIUM_OXIDE: &str = "Terbium Oxide";
pub const CERIUM_OXIDE: &str = "Cerium Oxide";
pub const DYSPROSIUM_OXIDE: &str = "Dysprosium Oxide";

/// Average prices, USD per kilogram.
pub static PRICES: &[MultiMetricRow] = &[
    MultiMetricRow {
        year: 2020,
        values: &[
            (NEODYMIUM_OXIDE, Some(49.0)),
            (TERBIUM_OXIDE, Some(670.0)),
            (CERIUM_OXIDE, Some(2.0)),
            (DYSPROSIUM_OXIDE, Some(261.0)),
        ],
    },
    MultiMetricRow {
        year: 2021,
        values: &[
            (NEODYMIUM_OXIDE, Some(98.0)),
            (TERBIUM_OXIDE, Some(1_346.0)),
            (CERIUM_OXIDE, Some(2.0)),
            (DYSPROSIUM_OXIDE, Some(410.0)),
        ],
    },
    MultiMetricRow {
        year: 2022,
        values: &[
            (NEODYMIUM_OXIDE, Some(134.0)),
            (TERBIUM_OXIDE, Some(2_051.0)),
            (CERIUM_OXIDE, Some(1.0)),
            (DYSPROSIUM_OXIDE, Some(382.0)),
        ],
    },
    MultiMetricRow {
        year: 2023,
        values: &[
            (NEODYMIUM_OXIDE, Some(78.0)),
            (TERBIUM_OXIDE, Some(1_298.0)),
            (CERIUM_OXIDE, Some(1.0)),
            (DYSPROSIUM_OXIDE, Some(330.0)),
        ],
    },
    MultiMetricRow {
        year: 2024,
        values: &[
            (NEODYMIUM_OXIDE, Some(56.0)),
            (TERBIUM_OXIDE, Some(810.0)),
            (CERIUM_OXIDE, Some(1.0)),
            (DYSPROSIUM_OXIDE, Some(260.0)),
        ],
    },
];

/// U.S. import sources 2020–23, percent of total value.
pub static IMPORT_SOURCES: &[CategoricalShare] = &[
    CategoricalShare { name: "China", value: 70.0 },
    CategoricalShare { name: "Malaysia", value: 13.0 },
    CategoricalShare { name: "Japan", value: 6.0 },
    CategoricalShare { name: "Estonia", value: 5.0 },
    CategoricalShare { name: "Other", value: 6.0 },
];

/// Tariffs as of 12-31-24.
pub static TARIFFS: &[TariffEntry] = &[
    TariffEntry {
        item: "Rare-earth metals",
        code: "2805.30.0000",
        rate: "5% ad valorem.",
    },
    TariffEntry {
        item: "Cerium compounds",
        code: "2846.10.0000",
        rate: "5.5% ad valorem.",
    },
    TariffEntry {
        item: "Other rare-earth compounds: Oxides or chlorides",
        code: "2846.90.2000",
        rate: "Free.",
    },
    TariffEntry {
        item: "Other rare-earth compounds: Carbonates",
        code: "2846.90.8000",
        rate: "3.7% ad valorem.",
    },
    TariffEntry {
        item: "Ferrocerium and other pyrophoric alloys",
        code: "3606.90.3000",
        rate: "5.9% ad valorem.",
    },
];

// ---------------------------------------------------------------------------
// World figures
// ---------------------------------------------------------------------------

/// World mine production, selected countries. 2024 values are estimates;
/// China's figures are the production quota.
pub static WORLD_MINE_PRODUCTION: &[CountryYearMetric] = &[
    CountryYearMetric {
        country: "United States",
        values: &[(2023, Some(41_600.0)), (2024, Some(45_000.0))],
    },
    CountryYearMetric {
        country: "Australia",
        values: &[(2023, Some(16_000.0)), (2024, Some(13_000.0))],
    },
    CountryYearMetric {
        country: "Brazil",
        values: &[(2023, Some(140.0)), (2024, Some(20.0))],
    },
    CountryYearMetric {
        country: "Burma",
        values: &[(2023, Some(43_000.0)), (2024, Some(31_000.0))],
    },
    CountryYearMetric {
        country: "China",
        values: &[(2023, Some(255_000.0)), (2024, Some(270_000.0))],
    },
    CountryYearMetric {
        country: "India",
        values: &[(2023, Some(2_900.0)), (2024, Some(2_900.0))],
    },
    CountryYearMetric {
        country: "Russia",
        values: &[(2023, Some(2_500.0)), (2024, Some(2_500.0))],
    },
    CountryYearMetric {
        country: "Thailand",
        values: &[(2023, Some(3_600.0)), (2024, Some(13_000.0))],
    },
    CountryYearMetric {
        country: "Vietnam",
        values: &[(2023, Some(300.0)), (2024, Some(300.0))],
    },
];

pub static WORLD_RESERVES: &[CountryReserve] = &[
    CountryReserve { country: "United States", reserves: Some(1_900_000.0) },
    CountryReserve { country: "Australia", reserves: Some(5_700_000.0) },
    CountryReserve { country: "Brazil", reserves: Some(21_000_000.0) },
    CountryReserve { country: "Canada", reserves: Some(830_000.0) },
    CountryReserve { country: "China", reserves: Some(44_000_000.0) },
    CountryReserve { country: "Greenland", reserves: Some(1_500_000.0) },
    CountryReserve { country: "India", reserves: Some(6_900_000.0) },
    CountryReserve { country: "Russia", reserves: Some(3_800_000.0) },
    CountryReserve { country: "South Africa", reserves: Some(860_000.0) },
    CountryReserve { country: "Tanzania", reserves: Some(890_000.0) },
    CountryReserve { country: "Vietnam", reserves: Some(3_500_000.0) },
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::metric_names;

    #[test]
    fn compounds_and_metals_2020_is_unreported() {
        assert_eq!(COMPOUNDS_AND_METALS.value_in(2020), None);
        assert_eq!(COMPOUNDS_AND_METALS.value_in(2024), Some(1_300.0));
    }

    #[test]
    fn imports_metals_combine_ferrocerium_and_other() {
        let last = IMPORTS.last().unwrap();
        assert_eq!(last.year, 2024);
        assert_eq!(last.get(METALS), Some(310.0));
    }

    #[test]
    fn prices_track_four_oxides() {
        assert_eq!(
            metric_names(PRICES),
            vec![NEODYMIUM_OXIDE, TERBIUM_OXIDE, CERIUM_OXIDE, DYSPROSIUM_OXIDE]
        );
    }

    #[test]
    fn reserves_table_has_eleven_countries() {
        assert_eq!(WORLD_RESERVES.len(), 11);
        assert_eq!(TARIFFS.len(), 5);
    }
}
