//! Data models for case trends.
//!
//! This module contains the core data structures shared by ingestion,
//! aggregation, the chart model and the report writers.

use crate::view::{ChartModel, ChartState};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// An unvalidated row as it appears in the feed.
///
/// Every cell is kept as text; validation happens in
/// [`crate::analysis::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Datum", default)]
    pub date: String,
    #[serde(rename = "Gemeentenaam", default)]
    pub city: String,
    #[serde(rename = "Gemeentecode", default)]
    pub city_code: String,
    #[serde(rename = "Provincienaam", default)]
    pub province: String,
    #[serde(rename = "Aantal", default)]
    pub count: String,
}

/// A single validated row of the municipal case feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Reporting date.
    pub date: NaiveDate,
    /// Municipality name (never empty).
    pub city: String,
    /// Municipality code (CBS), if the feed provided a usable one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_code: Option<u32>,
    /// Province name.
    pub province: String,
    /// Total reported cases as of `date`.
    pub cumulative_count: u64,
}

/// A (date, count) observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub count: u64,
}

/// Cumulative counts for one city, in feed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitySeries {
    pub city: String,
    /// Province of the first record seen for this city.
    pub province: String,
    pub points: Vec<SeriesPoint>,
}

impl CitySeries {
    /// Creates an empty series for a city.
    pub fn new(city: impl Into<String>, province: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            province: province.into(),
            points: Vec::new(),
        }
    }

    /// Highest cumulative count observed, or 0 for an empty series.
    pub fn max_count(&self) -> u64 {
        self.points.iter().map(|p| p.count).max().unwrap_or(0)
    }

    /// Most recent cumulative count, if any.
    pub fn latest_count(&self) -> Option<u64> {
        self.points.last().map(|p| p.count)
    }
}

/// Estimated new cases per day for one city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityDailyDelta {
    pub city: String,
    pub points: Vec<SeriesPoint>,
}

/// Per-city series keyed by name, remembering first-encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitySeriesMap {
    series: Vec<CitySeries>,
    index: HashMap<String, usize>,
}

impl CitySeriesMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the series for `city`, creating it on first encounter.
    pub fn entry(&mut self, city: &str, province: &str) -> &mut CitySeries {
        let idx = match self.index.get(city) {
            Some(&idx) => idx,
            None => {
                self.series.push(CitySeries::new(city, province));
                let idx = self.series.len() - 1;
                self.index.insert(city.to_string(), idx);
                idx
            }
        };
        &mut self.series[idx]
    }

    pub fn get(&self, city: &str) -> Option<&CitySeries> {
        self.index.get(city).map(|&idx| &self.series[idx])
    }

    /// Iterates series in first-encounter order.
    pub fn iter(&self) -> impl Iterator<Item = &CitySeries> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Cities ordered by peak cumulative count, highest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityRanking(pub Vec<String>);

impl CityRanking {
    pub fn cities(&self) -> &[String] {
        &self.0
    }

    /// Position of `city` in the ranking.
    pub fn position(&self, city: &str) -> Option<usize> {
        self.0.iter().position(|c| c == city)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Summary statistics for a single city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityStats {
    pub city: String,
    pub province: String,
    /// Peak cumulative count.
    pub max_cumulative: u64,
    /// Largest day-over-day increase (unclamped).
    pub max_daily: i64,
    pub latest: u64,
    pub points: usize,
}

/// Earliest and latest reporting dates in a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateExtent {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

impl DateExtent {
    /// Number of calendar days covered, inclusive.
    pub fn days(&self) -> i64 {
        (self.latest - self.earliest).num_days() + 1
    }
}

/// Which quantity a chart plots.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum MetricMode {
    /// Running total per city
    #[default]
    Cumulative,
    /// New cases per day
    Daily,
}

impl fmt::Display for MetricMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricMode::Cumulative => write!(f, "Cumulative"),
            MetricMode::Daily => write!(f, "Daily"),
        }
    }
}

impl MetricMode {
    /// Axis label used for this metric.
    pub fn axis_label(&self) -> &'static str {
        match self {
            MetricMode::Cumulative => "Number of instances",
            MetricMode::Daily => "New cases",
        }
    }
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// URL or file path the feed was read from.
    pub source: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Data rows in the feed.
    pub total_rows: usize,
    /// Rows that became records.
    pub records: usize,
    /// Rows dropped as malformed.
    pub skipped: usize,
    /// Time spent fetching and aggregating.
    pub duration_seconds: f64,
}

/// A complete report: what was read, the chart data and the view applied.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub state: ChartState,
    pub chart: ChartModel,
    /// Cities matching the search text, in ranking order.
    pub listed: Vec<String>,
}
