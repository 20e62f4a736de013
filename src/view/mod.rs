//! Chart model and view state.
//!
//! [`ChartModel`] is everything a rendering surface needs to draw the
//! per-city line chart. [`ChartState`] holds what the user can change
//! (visible cities, metric, search text) and is passed around explicitly.

use crate::analysis::{
    city_stats, compute_deltas, date_extent, group_by_city, max_cumulative, max_daily,
    rank_cities, select_default_visible,
};
use crate::models::{
    CaseRecord, CityDailyDelta, CityRanking, CitySeries, CityStats, DateExtent, MetricMode,
    SeriesPoint,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Twelve-colour "Paired" palette, assigned by ranking position.
pub const PAIRED_PALETTE: [&str; 12] = [
    "#a6cee3", "#1f78b4", "#b2df8a", "#33a02c", "#fb9a99", "#e31a1c", "#fdbf6f", "#ff7f00",
    "#cab2d6", "#6a3d9a", "#ffff99", "#b15928",
];

/// Input for a rendering surface.
#[derive(Debug, Clone, Serialize)]
pub struct ChartModel {
    /// Cities by peak cumulative count.
    pub ranking: CityRanking,
    /// Cumulative series, in ranking order.
    pub series: Vec<CitySeries>,
    /// Daily deltas, in ranking order.
    pub daily: Vec<CityDailyDelta>,
    /// Per-city statistics, in ranking order.
    pub stats: Vec<CityStats>,
    /// X-axis domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<DateExtent>,
    /// Cities shown before any interaction.
    pub default_visible: Vec<String>,
    /// Line colour per city.
    pub colors: BTreeMap<String, String>,
    /// Y-axis maximum in cumulative mode.
    pub max_cumulative: u64,
    /// Y-axis maximum in daily mode.
    pub max_daily: u64,
}

impl ChartModel {
    /// Aggregate records into a chart model showing `visible` cities by default.
    pub fn build(records: &[CaseRecord], visible: usize) -> Self {
        let grouped = group_by_city(records);
        let ranking = rank_cities(&grouped);

        let series: Vec<CitySeries> = ranking
            .cities()
            .iter()
            .filter_map(|city| grouped.get(city).cloned())
            .collect();
        let daily: Vec<CityDailyDelta> = series.iter().map(compute_deltas).collect();
        let stats: Vec<CityStats> = series.iter().map(city_stats).collect();

        let colors = ranking
            .cities()
            .iter()
            .enumerate()
            .map(|(i, city)| (city.clone(), color_for(i).to_string()))
            .collect();

        debug!(
            "Built chart model: {} cities over {} records",
            ranking.len(),
            records.len()
        );

        Self {
            default_visible: select_default_visible(&ranking, visible),
            max_cumulative: max_cumulative(&grouped),
            max_daily: max_daily(&stats),
            extent: date_extent(records),
            ranking,
            series,
            daily,
            stats,
            colors,
        }
    }

    /// Points for `city` in the given metric.
    pub fn points(&self, city: &str, metric: MetricMode) -> Option<&[SeriesPoint]> {
        let idx = self.ranking.position(city)?;
        match metric {
            MetricMode::Cumulative => self.series.get(idx).map(|s| s.points.as_slice()),
            MetricMode::Daily => self.daily.get(idx).map(|d| d.points.as_slice()),
        }
    }

    /// Statistics for `city`.
    pub fn stats_for(&self, city: &str) -> Option<&CityStats> {
        self.ranking.position(city).and_then(|idx| self.stats.get(idx))
    }

    pub fn color(&self, city: &str) -> Option<&str> {
        self.colors.get(city).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.ranking.is_empty()
    }
}

/// Palette colour for a ranking position.
pub fn color_for(index: usize) -> &'static str {
    PAIRED_PALETTE[index % PAIRED_PALETTE.len()]
}

/// Identifier safe for use as an element id.
///
/// Drops the first apostrophe and the first comma. Whitespace runs become
/// `_`, but only in names that contain a plain space.
pub fn series_id(city: &str) -> String {
    let city = city.replacen('\'', "", 1);
    if !city.contains(' ') {
        return city.replacen(',', "", 1);
    }

    let mut id = String::with_capacity(city.len());
    let mut in_space = false;

    for ch in city.chars() {
        if ch.is_whitespace() {
            if !in_space {
                id.push('_');
            }
            in_space = true;
        } else {
            id.push(ch);
            in_space = false;
        }
    }

    id.replacen(',', "", 1)
}

/// What the user currently sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartState {
    /// Visible cities, always in ranking order.
    pub visible: Vec<String>,
    pub metric: MetricMode,
    /// Legend search text.
    pub search: String,
}

impl ChartState {
    /// Default view: top cities, cumulative counts, no search.
    pub fn initial(model: &ChartModel) -> Self {
        Self {
            visible: model.default_visible.clone(),
            metric: MetricMode::Cumulative,
            search: String::new(),
        }
    }

    /// Show `city` if hidden, hide it if shown.
    ///
    /// Cities not in the ranking are ignored.
    pub fn toggle(&mut self, model: &ChartModel, city: &str) {
        if model.ranking.position(city).is_none() {
            debug!("Ignoring toggle for unknown city: {}", city);
            return;
        }

        if let Some(pos) = self.visible.iter().position(|c| c == city) {
            self.visible.remove(pos);
        } else {
            self.visible.push(city.to_string());
        }

        self.visible
            .sort_by_key(|c| model.ranking.position(c).unwrap_or(usize::MAX));
    }

    /// Make `city` visible if it is not already.
    pub fn show(&mut self, model: &ChartModel, city: &str) {
        if !self.is_visible(city) {
            self.toggle(model, city);
        }
    }

    /// Hide `city` if it is visible.
    pub fn hide(&mut self, model: &ChartModel, city: &str) {
        if self.is_visible(city) {
            self.toggle(model, city);
        }
    }

    pub fn is_visible(&self, city: &str) -> bool {
        self.visible.iter().any(|c| c == city)
    }

    pub fn set_metric(&mut self, metric: MetricMode) {
        self.metric = metric;
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    /// Y-axis maximum for the active metric.
    pub fn y_max(&self, model: &ChartModel) -> u64 {
        match self.metric {
            MetricMode::Cumulative => model.max_cumulative,
            MetricMode::Daily => model.max_daily,
        }
    }

    /// Ranked cities whose name contains the search text, ignoring case.
    pub fn matching_cities<'a>(&self, model: &'a ChartModel) -> Vec<&'a str> {
        let needle = self.search.to_uppercase();
        model
            .ranking
            .cities()
            .iter()
            .filter(|city| city.to_uppercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }

    /// Visible cities with their points in the active metric.
    pub fn visible_series<'a>(&self, model: &'a ChartModel) -> Vec<(&'a str, &'a [SeriesPoint])> {
        self.visible
            .iter()
            .filter_map(|city| {
                let idx = model.ranking.position(city)?;
                let points = model.points(city, self.metric)?;
                Some((model.ranking.cities()[idx].as_str(), points))
            })
            .collect()
    }
}
