//! CaseTrend - COVID-19 case trends per Dutch municipality
//!
//! A CLI tool that fetches the RIVM municipal case feed, aggregates it
//! into per-city series and writes the chart data as a report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (fetch, config, I/O, etc.)

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod source;
mod view;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::{Report, ReportMetadata};
use source::{FetchOptions, Ingested};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use view::{ChartModel, ChartState};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so `[general] verbose` applies
    let config = match load_config(&args).and_then(|mut config| {
        config.merge_with_args(&args);
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("CaseTrend v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Config: {:?}", config);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .casetrend.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the source URL, visible cities and report.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Fetch, aggregate and report. Returns the exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    // Step 1: Get the feed
    let (source_label, ingested) = ingest(&args, &config).await?;

    if args.dry_run {
        return Ok(handle_dry_run(&ingested));
    }

    // Step 2: Aggregate
    let chart = ChartModel::build(&ingested.records, config.view.default_visible);
    if chart.is_empty() {
        warn!("No usable case records in {}", source_label);
    }

    // Step 3: Apply the requested view
    let state = build_state(&chart, &config, &args);
    let listed: Vec<String> = state
        .matching_cities(&chart)
        .into_iter()
        .map(String::from)
        .collect();

    let metadata = ReportMetadata {
        source: source_label,
        generated_at: Utc::now(),
        total_rows: ingested.total_rows,
        records: ingested.records.len(),
        skipped: ingested.skipped,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let report = Report {
        metadata,
        state,
        chart,
        listed,
    };

    // Step 4: Generate and save the report
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&report, config.report.recent_points)
        }
    };

    let output_path = output_path(&args, &config);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    if !args.quiet {
        println!("\n📊 Summary:");
        println!(
            "   Records: {} ({} rows skipped)",
            report.metadata.records, report.metadata.skipped
        );
        println!("   Cities: {}", report.chart.ranking.len());
        if let Some(extent) = report.chart.extent {
            println!("   Dates: {} to {}", extent.earliest, extent.latest);
        }
        println!(
            "   Visible ({}): {}",
            report.state.metric,
            report.state.visible.join(", ")
        );
        println!(
            "\n✅ Done! Report saved to: {}",
            output_path.display()
        );
    }

    Ok(0)
}

/// Read the feed from disk or over HTTP.
async fn ingest(args: &Args, config: &Config) -> Result<(String, Ingested)> {
    if let Some(ref local) = args.local {
        let ingested = source::load_local(local)
            .await
            .with_context(|| format!("Failed to read case feed from {}", local.display()))?;
        return Ok((local.display().to_string(), ingested));
    }

    let url = config.source.url.clone();
    if !args.quiet {
        println!("📥 Fetching case feed: {}", url);
    }

    let options = FetchOptions {
        timeout: config.source.timeout_seconds.map(Duration::from_secs),
        show_progress: !args.quiet,
    };

    let ingested = source::fetch_records(&url, &options)
        .await
        .context("Failed to fetch case feed")?;

    Ok((url, ingested))
}

/// Handle --dry-run: print what was read, write nothing.
fn handle_dry_run(ingested: &Ingested) -> i32 {
    let grouped = analysis::group_by_city(&ingested.records);

    println!("\n🔍 Dry run: feed parsed, no report written.\n");
    println!("   Rows: {}", ingested.total_rows);
    println!("   Records: {}", ingested.records.len());
    println!("   Skipped: {}", ingested.skipped);
    if grouped.is_empty() {
        println!("   Cities: none");
    } else {
        println!("   Cities: {}", grouped.len());
    }

    if let Some(extent) = analysis::date_extent(&ingested.records) {
        println!(
            "   Dates: {} to {} ({} days)",
            extent.earliest,
            extent.latest,
            extent.days()
        );
    }

    0
}

/// Initial view from config, then CLI show/hide/search on top.
fn build_state(chart: &ChartModel, config: &Config, args: &Args) -> ChartState {
    let mut state = ChartState::initial(chart);
    state.set_metric(config.view.metric);

    for city in &args.show {
        if chart.ranking.position(city).is_none() {
            warn!("Unknown city in --show: {}", city);
        }
        state.show(chart, city);
    }
    for city in &args.hide {
        state.hide(chart, city);
    }

    if let Some(ref search) = args.search {
        state.set_search(search.as_str());
    }

    state
}

/// Resolve the report path, matching the extension to the format.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    let path = PathBuf::from(&config.general.output);

    if args.output.is_none() && config.general.output == Config::default().general.output {
        return path.with_extension(args.format.extension());
    }

    path
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const SAMPLE: &str = include_str!("../fixtures/rivm_sample.csv");

    fn sample_chart() -> ChartModel {
        let ingested = source::read_records(SAMPLE.as_bytes()).unwrap();
        ChartModel::build(&ingested.records, 5)
    }

    #[test]
    fn test_build_state_applies_show_hide() {
        let chart = sample_chart();
        let args = Args::parse_from([
            "casetrend",
            "--show",
            "Bergen op Zoom,Rotterdam",
            "--hide",
            "Tilburg",
            "--search",
            "en",
        ]);
        let mut config = Config::default();
        config.merge_with_args(&args);

        let state = build_state(&chart, &config, &args);

        assert_eq!(
            state.visible,
            vec![
                "Amsterdam",
                "'s-Hertogenbosch",
                "Utrecht",
                "Leiden",
                "Bergen op Zoom"
            ]
        );
        assert_eq!(state.search, "en");
    }

    #[test]
    fn test_build_state_metric_from_config() {
        let chart = sample_chart();
        let args = Args::parse_from(["casetrend", "--metric", "daily"]);
        let mut config = Config::default();
        config.merge_with_args(&args);

        let state = build_state(&chart, &config, &args);

        assert_eq!(state.metric, models::MetricMode::Daily);
        assert_eq!(state.y_max(&chart), 41);
    }

    #[test]
    fn test_output_path_follows_format() {
        let args = Args::parse_from(["casetrend", "--format", "json"]);
        let mut config = Config::default();
        config.merge_with_args(&args);
        assert_eq!(output_path(&args, &config), PathBuf::from("casetrend_report.json"));

        let args = Args::parse_from(["casetrend", "--format", "json", "-o", "out.txt"]);
        let mut config = Config::default();
        config.merge_with_args(&args);
        assert_eq!(output_path(&args, &config), PathBuf::from("out.txt"));
    }

    #[test]
    fn test_config_verbose_sets_log_level() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[general]\nverbose = true\n").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = Args::parse_from(["casetrend", "--config", path.as_str()]);
        let mut config = load_config(&args).unwrap();
        config.merge_with_args(&args);
        assert!(config.general.verbose);
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::DEBUG);

        let args = Args::parse_from(["casetrend", "--config", path.as_str(), "--quiet"]);
        let mut config = load_config(&args).unwrap();
        config.merge_with_args(&args);
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::ERROR);
    }

    #[test]
    fn test_ingest_prefers_local_over_source() {
        let fixture = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/rivm_sample.csv");
        let args = Args::parse_from([
            "casetrend",
            "--quiet",
            "--source",
            "http://127.0.0.1:9/unreachable.csv",
            "--local",
            fixture,
        ]);
        assert!(args.validate().is_ok());

        let mut config = Config::default();
        config.merge_with_args(&args);

        let (label, ingested) = tokio_test::block_on(ingest(&args, &config)).unwrap();
        assert_eq!(label, fixture);
        assert_eq!(ingested.records.len(), 15);
    }

    #[test]
    fn test_dry_run_exit_code() {
        let ingested = source::read_records(SAMPLE.as_bytes()).unwrap();
        assert_eq!(handle_dry_run(&ingested), 0);
    }
}
