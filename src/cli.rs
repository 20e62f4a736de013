//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::MetricMode;
use clap::Parser;
use std::path::PathBuf;

/// CaseTrend - COVID-19 case trends per Dutch municipality
///
/// Fetches the RIVM municipal case feed, ranks municipalities by peak
/// cumulative count and writes a Markdown or JSON report of the chart data.
///
/// Examples:
///   casetrend
///   casetrend --metric daily --top 10
///   casetrend --local ./rivm_NL_covid19_total_municipality.csv --format json
///   casetrend --show Utrecht,Leiden --hide Amsterdam
///   casetrend --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// URL of the municipal case CSV
    ///
    /// Defaults to the CoronaWatchNL mirror of the RIVM feed.
    /// Can also be set via CASETREND_SOURCE env var or .casetrend.toml config.
    #[arg(short, long, value_name = "URL", env = "CASETREND_SOURCE")]
    pub source: Option<String>,

    /// Local CSV file to read instead of fetching
    ///
    /// Takes precedence over --source and CASETREND_SOURCE.
    #[arg(short, long, value_name = "FILE")]
    pub local: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Number of top-ranked cities visible by default
    #[arg(short, long, value_name = "COUNT")]
    pub top: Option<usize>,

    /// Metric to report (cumulative, daily)
    #[arg(short, long, value_name = "METRIC")]
    pub metric: Option<MetricMode>,

    /// Extra cities to make visible (comma-separated)
    ///
    /// Example: --show Utrecht,Leiden
    #[arg(long, value_name = "CITIES", value_delimiter = ',')]
    pub show: Vec<String>,

    /// Cities to hide (comma-separated)
    #[arg(long, value_name = "CITIES", value_delimiter = ',')]
    pub hide: Vec<String>,

    /// Only list cities whose name contains this text (case-insensitive)
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Most recent points listed per visible city in Markdown reports
    #[arg(long, value_name = "COUNT")]
    pub recent: Option<usize>,

    /// Request timeout in seconds
    ///
    /// No timeout unless given here or in the config file.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .casetrend.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: fetch and parse the feed, print counts, write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .casetrend.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// File extension for reports in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref source) = self.source {
            if !source.starts_with("http://") && !source.starts_with("https://") {
                return Err("Source URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.top == Some(0) {
            return Err("Top must be at least 1".to_string());
        }

        if self.recent == Some(0) {
            return Err("Recent must be at least 1".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if let Some(ref local_path) = self.local {
            if !local_path.is_file() {
                return Err(format!(
                    "Local file does not exist: {}",
                    local_path.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `[general] verbose` from the config file;
    /// `--quiet` wins over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
