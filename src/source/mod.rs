//! Case feed ingestion.
//!
//! Fetches the municipal CSV over HTTP or from disk and turns it into
//! validated [`crate::models::CaseRecord`]s.

pub mod fetcher;
pub mod reader;

pub use fetcher::*;
pub use reader::*;

use thiserror::Error;

/// Errors that make the whole feed unusable.
///
/// Individual malformed rows never produce one of these; they are skipped.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The HTTP request failed or returned a non-success status.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Reading a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV could not be read at all.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required header is absent.
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
}
