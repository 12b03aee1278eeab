use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the sensor report pipeline.
///
/// Only run-level failures live here. Record-level problems (too few fields,
/// bad dates, pre-cutoff rows) are not errors — they are skipped silently by
/// the parser.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The input log could not be opened or read from disk.
    #[error("Failed to read input {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The summary artifact could not be written.
    #[error("Failed to write summary {path}: {source}")]
    SummaryWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row of the summary artifact did not parse back. Unlike input
    /// records, the summary file is our own output, so this is a hard error.
    #[error("Malformed summary row: {0}")]
    SummaryParse(String),

    /// No input file was given and none was found at the default locations.
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the report crates.
pub type Result<T> = std::result::Result<T, ReportError>;
