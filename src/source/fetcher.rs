//! Retrieving the raw feed.
//!
//! One HTTP GET or one local file read. There is no retry; a failure is
//! reported once to the caller.

use super::{read_records, Ingested, SourceError};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Municipal totals published by RIVM, mirrored by CoronaWatchNL.
pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/J535D165/CoronaWatchNL/master/data/rivm_NL_covid19_total_municipality.csv";

/// Options for fetching the feed over HTTP.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Whether to show a spinner while downloading.
    pub show_progress: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            show_progress: true,
        }
    }
}

/// Download the feed body.
pub async fn fetch(url: &str, options: &FetchOptions) -> Result<Vec<u8>, SourceError> {
    info!("Fetching case feed: {}", url);

    let fetch_err = |source: reqwest::Error| SourceError::Fetch {
        url: url.to_string(),
        source,
    };

    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build().map_err(fetch_err)?;

    let spinner = options.show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Downloading case feed...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let result = download(&client, url).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let body = result.map_err(fetch_err)?;
    debug!("Downloaded {} bytes from {}", body.len(), url);

    Ok(body)
}

async fn download(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, reqwest::Error> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Download and decode the feed.
pub async fn fetch_records(url: &str, options: &FetchOptions) -> Result<Ingested, SourceError> {
    let body = fetch(url, options).await?;
    read_records(body.as_slice())
}

/// Read and decode a feed stored on disk.
pub async fn load_local(path: &Path) -> Result<Ingested, SourceError> {
    info!("Reading case feed from: {}", path.display());

    let body = tokio::fs::read(path).await?;
    debug!("Read {} bytes from {}", body.len(), path.display());

    read_records(body.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_fetch_options_default() {
        let opts = FetchOptions::default();
        assert!(opts.timeout.is_none());
        assert!(opts.show_progress);
    }

    #[test]
    fn test_load_local() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Datum,Gemeentenaam,Gemeentecode,Provincienaam,Aantal").unwrap();
        writeln!(file, "2020-03-13,Utrecht,344,Utrecht,10").unwrap();
        writeln!(file, "2020-03-14,Utrecht,344,Utrecht,15").unwrap();
        writeln!(file, "2020-03-14,,,,2").unwrap();
        file.flush().unwrap();

        let ingested = tokio_test::block_on(load_local(file.path())).unwrap();

        assert_eq!(ingested.records.len(), 2);
        assert_eq!(ingested.skipped, 1);
    }

    #[test]
    fn test_load_local_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = tokio_test::block_on(load_local(&dir.path().join("missing.csv")));

        assert!(matches!(result, Err(SourceError::Io(_))));
    }

    #[test]
    fn test_fetch_invalid_url() {
        let opts = FetchOptions {
            timeout: Some(Duration::from_secs(1)),
            show_progress: false,
        };
        let result = tokio_test::block_on(fetch("not a url", &opts));

        assert!(matches!(result, Err(SourceError::Fetch { .. })));
    }
}
