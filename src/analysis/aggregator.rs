//! Case aggregation and statistics.
//!
//! This module turns raw feed rows into per-city series and derives the
//! deltas, rankings and summary figures the chart model is built from.

use crate::models::{
    CaseRecord, CityDailyDelta, CityRanking, CitySeries, CitySeriesMap, CityStats, DateExtent,
    RawRow, SeriesPoint,
};
use chrono::NaiveDate;
use std::cmp::Reverse;
use tracing::debug;

/// Date format used by the feed.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Number of cities shown when nothing else is requested.
pub const DEFAULT_VISIBLE: usize = 5;

/// Validate raw rows, dropping any that cannot become a [`CaseRecord`].
pub fn parse<I>(rows: I) -> Vec<CaseRecord>
where
    I: IntoIterator<Item = RawRow>,
{
    rows.into_iter().filter_map(|row| parse_row(&row)).collect()
}

/// Validate a single row.
///
/// Returns `None` when the city is empty, the date is not `YYYY-MM-DD`, or the
/// count is not a non-negative integer.
pub fn parse_row(row: &RawRow) -> Option<CaseRecord> {
    let city = row.city.trim();
    if city.is_empty() {
        debug!("Skipping row without city: {:?}", row);
        return None;
    }

    let date = match NaiveDate::parse_from_str(row.date.trim(), DATE_FORMAT) {
        Ok(date) => date,
        Err(_) => {
            debug!("Skipping row for {} with bad date {:?}", city, row.date);
            return None;
        }
    };

    let cumulative_count = match row.count.trim().parse::<u64>() {
        Ok(count) => count,
        Err(_) => {
            debug!("Skipping row for {} with bad count {:?}", city, row.count);
            return None;
        }
    };

    Some(CaseRecord {
        date,
        city: city.to_string(),
        city_code: row.city_code.trim().parse().ok(),
        province: row.province.trim().to_string(),
        cumulative_count,
    })
}

/// Group records by city.
///
/// Points keep the order the records arrive in; the feed is already sorted by
/// date so no re-sorting happens here.
pub fn group_by_city(records: &[CaseRecord]) -> CitySeriesMap {
    let mut grouped = CitySeriesMap::new();

    for record in records {
        grouped
            .entry(&record.city, &record.province)
            .points
            .push(SeriesPoint {
                date: record.date,
                count: record.cumulative_count,
            });
    }

    grouped
}

/// Derive new cases per day from a cumulative series.
///
/// The first point is taken as-is. Later points are the difference to the
/// previous point, clamped at zero when the feed revised a count downwards.
pub fn compute_deltas(series: &CitySeries) -> CityDailyDelta {
    let mut previous: Option<u64> = None;

    let points = series
        .points
        .iter()
        .map(|point| {
            let count = match previous {
                Some(prev) => point.count.saturating_sub(prev),
                None => point.count,
            };
            previous = Some(point.count);
            SeriesPoint {
                date: point.date,
                count,
            }
        })
        .collect();

    CityDailyDelta {
        city: series.city.clone(),
        points,
    }
}

/// Order cities by peak cumulative count, highest first.
///
/// Ties keep first-encounter order.
pub fn rank_cities(series_map: &CitySeriesMap) -> CityRanking {
    let mut peaks: Vec<(&str, u64)> = series_map
        .iter()
        .map(|s| (s.city.as_str(), s.max_count()))
        .collect();

    // sort_by_key is stable
    peaks.sort_by_key(|(_, max)| Reverse(*max));

    CityRanking(peaks.into_iter().map(|(city, _)| city.to_string()).collect())
}

/// The first `n` cities of the ranking.
pub fn select_default_visible(ranking: &CityRanking, n: usize) -> Vec<String> {
    ranking.cities().iter().take(n).cloned().collect()
}

/// Summary statistics for one series.
pub fn city_stats(series: &CitySeries) -> CityStats {
    let max_daily = series
        .points
        .iter()
        .enumerate()
        .map(|(i, point)| match i {
            0 => point.count as i64,
            _ => point.count as i64 - series.points[i - 1].count as i64,
        })
        .max()
        .unwrap_or(0);

    CityStats {
        city: series.city.clone(),
        province: series.province.clone(),
        max_cumulative: series.max_count(),
        max_daily,
        latest: series.latest_count().unwrap_or(0),
        points: series.points.len(),
    }
}

/// Earliest and latest dates across all records.
pub fn date_extent(records: &[CaseRecord]) -> Option<DateExtent> {
    let earliest = records.iter().map(|r| r.date).min()?;
    let latest = records.iter().map(|r| r.date).max()?;
    Some(DateExtent { earliest, latest })
}

/// Highest cumulative count in the whole dataset.
pub fn max_cumulative(series_map: &CitySeriesMap) -> u64 {
    series_map.iter().map(CitySeries::max_count).max().unwrap_or(0)
}

/// Highest per-city daily increase, never below zero.
pub fn max_daily(stats: &[CityStats]) -> u64 {
    stats
        .iter()
        .map(|s| s.max_daily.max(0) as u64)
        .max()
        .unwrap_or(0)
}
