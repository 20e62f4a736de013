//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.casetrend.toml` files.

use crate::models::MetricMode;
use crate::source::DEFAULT_SOURCE_URL;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".casetrend.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Feed settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Initial chart view.
    #[serde(default)]
    pub view: ViewConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "casetrend_report.md".to_string()
}

/// Where the case feed comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// CSV URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// Request timeout in seconds. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_seconds: None,
        }
    }
}

fn default_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

/// Initial chart view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// How many top-ranked cities start visible.
    #[serde(default = "default_visible")]
    pub default_visible: usize,

    /// Metric shown first.
    #[serde(default)]
    pub metric: MetricMode,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_visible: default_visible(),
            metric: MetricMode::default(),
        }
    }
}

fn default_visible() -> usize {
    crate::analysis::DEFAULT_VISIBLE
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Most recent points listed per visible city in Markdown.
    #[serde(default = "default_recent_points")]
    pub recent_points: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            recent_points: default_recent_points(),
        }
    }
}

fn default_recent_points() -> usize {
    7
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.casetrend.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values given explicitly on the command line override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref source) = args.source {
            self.source.url = source.clone();
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = Some(timeout);
        }

        if let Some(top) = args.top {
            self.view.default_visible = top;
        }
        if let Some(metric) = args.metric {
            self.view.metric = metric;
        }

        if let Some(recent) = args.recent {
            self.report.recent_points = recent;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check merged settings against the same limits the CLI enforces.
    pub fn validate(&self) -> Result<()> {
        if self.view.default_visible == 0 {
            bail!("view.default_visible must be at least 1");
        }
        if self.report.recent_points == 0 {
            bail!("report.recent_points must be at least 1");
        }
        if self.source.timeout_seconds == Some(0) {
            bail!("source.timeout_seconds must be at least 1");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source.url, DEFAULT_SOURCE_URL);
        assert_eq!(config.view.default_visible, 5);
        assert_eq!(config.view.metric, MetricMode::Cumulative);
        assert!(config.source.timeout_seconds.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "trend.json"
verbose = true

[source]
url = "https://example.org/cases.csv"
timeout_seconds = 30

[view]
default_visible = 8
metric = "daily"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "trend.json");
        assert!(config.general.verbose);
        assert_eq!(config.source.url, "https://example.org/cases.csv");
        assert_eq!(config.source.timeout_seconds, Some(30));
        assert_eq!(config.view.default_visible, 8);
        assert_eq!(config.view.metric, MetricMode::Daily);
        assert_eq!(config.report.recent_points, 7);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[view]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.view.default_visible, 5);
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let args = Args::parse_from([
            "casetrend",
            "--top",
            "3",
            "--metric",
            "daily",
            "--timeout",
            "10",
        ]);

        config.merge_with_args(&args);

        assert_eq!(config.view.default_visible, 3);
        assert_eq!(config.view.metric, MetricMode::Daily);
        assert_eq!(config.source.timeout_seconds, Some(10));
        assert_eq!(config.source.url, DEFAULT_SOURCE_URL);
    }

    #[test]
    fn test_validate_limits() {
        assert!(Config::default().validate().is_ok());

        let config: Config = toml::from_str("[view]\ndefault_visible = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default_visible"));

        let config: Config = toml::from_str("[report]\nrecent_points = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config: Config = toml::from_str("[source]\ntimeout_seconds = 0\n").unwrap();
        assert!(config.validate().is_err());

        let mut config: Config = toml::from_str("[view]\ndefault_visible = 0\n").unwrap();
        config.merge_with_args(&Args::parse_from(["casetrend", "--top", "2"]));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[report]\nrecent_points = 3\n",
        )
        .unwrap();

        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.report.recent_points, 3);

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[view\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }
}
