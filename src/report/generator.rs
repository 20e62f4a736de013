//! Report generation.
//!
//! This module writes the chart model and the applied view as a Markdown
//! summary or as JSON for a rendering surface.

use crate::models::{Report, ReportMetadata, SeriesPoint};
use crate::view::{series_id, ChartModel, ChartState};
use anyhow::Result;

/// Generate a complete Markdown report.
///
/// `recent_points` limits how many of the latest points are listed per
/// visible city.
pub fn generate_markdown_report(report: &Report, recent_points: usize) -> String {
    let mut output = String::new();

    output.push_str("# CaseTrend Report\n\n");

    output.push_str(&generate_metadata_section(
        &report.metadata,
        &report.chart,
        &report.state,
    ));

    if report.chart.is_empty() {
        output.push_str("No case records were found in the feed.\n\n");
        output.push_str(&generate_footer());
        return output;
    }

    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_ranking_section(report));
    output.push_str(&generate_series_section(
        &report.chart,
        &report.state,
        recent_points,
    ));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(
    metadata: &ReportMetadata,
    chart: &ChartModel,
    state: &ChartState,
) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Rows Parsed:** {} of {}\n",
        metadata.records, metadata.total_rows
    ));
    if metadata.skipped > 0 {
        section.push_str(&format!("- **Rows Skipped:** {}\n", metadata.skipped));
    }
    section.push_str(&format!("- **Cities:** {}\n", chart.ranking.len()));
    if let Some(extent) = chart.extent {
        section.push_str(&format!(
            "- **Date Range:** {} to {} ({} days)\n",
            extent.earliest,
            extent.latest,
            extent.days()
        ));
    }
    section.push_str(&format!("- **Metric:** {}\n", state.metric));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Ranking](#ranking)\n");
    toc.push_str("- [Visible Series](#visible-series)\n");

    for city in &report.state.visible {
        toc.push_str(&format!("  - [{}](#{})\n", city, series_id(city)));
    }

    toc.push('\n');

    toc
}

/// Generate the ranking table, restricted to cities matching the search.
fn generate_ranking_section(report: &Report) -> String {
    let mut section = String::new();
    let chart = &report.chart;

    section.push_str("## Ranking\n\n");

    if !report.state.search.is_empty() {
        section.push_str(&format!(
            "*Showing {} of {} cities matching \"{}\"*\n\n",
            report.listed.len(),
            chart.ranking.len(),
            report.state.search
        ));
    }

    if report.listed.is_empty() {
        section.push_str("No cities match.\n\n");
        return section;
    }

    section.push_str("| # | City | Province | Peak | Peak Daily | Latest | Visible |\n");
    section.push_str("|---:|:---|:---|---:|---:|---:|:---:|\n");

    for city in &report.listed {
        let rank = chart.ranking.position(city).map(|i| i + 1).unwrap_or(0);
        let Some(stats) = chart.stats_for(city) else {
            continue;
        };
        let visible = if report.state.is_visible(city) { "✓" } else { "" };

        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            rank,
            city,
            stats.province,
            stats.max_cumulative,
            stats.max_daily,
            stats.latest,
            visible
        ));
    }
    section.push('\n');

    section
}

/// Generate the section listing recent points of every visible series.
fn generate_series_section(chart: &ChartModel, state: &ChartState, recent_points: usize) -> String {
    let mut section = String::new();

    section.push_str("## Visible Series\n\n");
    section.push_str(&format!(
        "*{} (y-axis 0 to {})*\n\n",
        state.metric.axis_label(),
        state.y_max(chart)
    ));

    let series = state.visible_series(chart);
    if series.is_empty() {
        section.push_str("No cities are visible.\n\n");
        return section;
    }

    for (city, points) in series {
        section.push_str(&generate_city_block(
            city,
            chart.color(city).unwrap_or("grey"),
            points,
            recent_points,
        ));
    }

    section
}

/// Generate the block for a single city.
fn generate_city_block(city: &str, color: &str, points: &[SeriesPoint], recent: usize) -> String {
    let mut block = String::new();

    block.push_str(&format!("### {} {{#{}}}\n\n", city, series_id(city)));
    block.push_str(&format!(
        "*Colour: `{}` | Points: {}*\n\n",
        color,
        points.len()
    ));

    block.push_str("| Date | Count |\n");
    block.push_str("|:---|---:|\n");

    let start = points.len().saturating_sub(recent);
    for point in &points[start..] {
        block.push_str(&format!("| {} | {} |\n", point.date, point.count));
    }
    block.push('\n');

    block
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Data: RIVM via CoronaWatchNL. Report generated by CaseTrend.*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricMode;
    use crate::source::read_records;
    use chrono::Utc;

    const SAMPLE: &str = include_str!("../../fixtures/rivm_sample.csv");

    fn create_test_report() -> Report {
        let ingested = read_records(SAMPLE.as_bytes()).unwrap();
        let chart = ChartModel::build(&ingested.records, 5);
        let state = ChartState::initial(&chart);
        let listed = state
            .matching_cities(&chart)
            .into_iter()
            .map(String::from)
            .collect();

        Report {
            metadata: ReportMetadata {
                source: "fixtures/rivm_sample.csv".to_string(),
                generated_at: Utc::now(),
                total_rows: ingested.total_rows,
                records: ingested.records.len(),
                skipped: ingested.skipped,
                duration_seconds: 0.2,
            },
            state,
            chart,
            listed,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, 3);

        assert!(markdown.contains("# CaseTrend Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Ranking"));
        assert!(markdown.contains("## Visible Series"));
        assert!(markdown.contains("- **Rows Skipped:** 4"));
        assert!(markdown.contains("| 1 | Tilburg | Noord-Brabant | 71 | 41 | 71 | ✓ |"));
        assert!(markdown.contains("| 6 | Bergen op Zoom | Noord-Brabant | 9 | 9 | 9 |  |"));
        assert!(markdown.contains("### 's-Hertogenbosch {#s-Hertogenbosch}"));
    }

    #[test]
    fn test_recent_points_limit() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, 2);

        assert!(markdown.contains("| 2020-03-16 | 71 |"));
        assert!(markdown.contains("| 2020-03-15 | 60 |"));
        assert!(!markdown.contains("| 2020-03-14 | 52 |"));
    }

    #[test]
    fn test_daily_metric_section() {
        let mut report = create_test_report();
        report.state.set_metric(MetricMode::Daily);

        let section = generate_series_section(&report.chart, &report.state, 7);

        assert!(section.contains("New cases (y-axis 0 to 41)"));
        assert!(section.contains("| 2020-03-15 | 0 |"));
    }

    #[test]
    fn test_search_filters_ranking() {
        let mut report = create_test_report();
        report.state.set_search("burg");
        report.listed = report
            .state
            .matching_cities(&report.chart)
            .into_iter()
            .map(String::from)
            .collect();

        let section = generate_ranking_section(&report);

        assert!(section.contains("Showing 1 of 6 cities matching \"burg\""));
        assert!(section.contains("Tilburg"));
        assert!(!section.contains("Amsterdam"));
    }

    #[test]
    fn test_empty_report() {
        let mut report = create_test_report();
        report.chart = ChartModel::build(&[], 5);
        report.state = ChartState::initial(&report.chart);

        let markdown = generate_markdown_report(&report, 7);

        assert!(markdown.contains("No case records were found"));
        assert!(!markdown.contains("## Ranking"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["chart"]["ranking"][0], "Tilburg");
        assert_eq!(value["chart"]["default_visible"].as_array().map(Vec::len), Some(5));
        assert_eq!(value["state"]["metric"], "cumulative");
        assert_eq!(value["metadata"]["skipped"], 4);
        assert_eq!(value["chart"]["colors"]["Tilburg"], "#a6cee3");
    }
}
