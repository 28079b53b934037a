use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the monster-ecology crates.
///
/// Field-level parse failures never appear here: the normalizers absorb them
/// by substituting defaults. These variants cover the plumbing around the
/// core (sources, persistence, configuration).
#[derive(Error, Debug)]
pub enum EcologyError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be created or written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or produced.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A CSV dataset could not be parsed or produced.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The dataset file extension is neither `.json` nor `.csv`.
    #[error("Unsupported dataset format: {0}")]
    UnsupportedFormat(PathBuf),

    /// The dataset file does not exist.
    #[error("Dataset not found: {0}")]
    DatasetNotFound(PathBuf),

    /// The paginated source failed to deliver a page after all retries.
    #[error("Source unavailable at {url}: {reason}")]
    SourceUnavailable { url: String, reason: String },

    /// A numeric column name did not match any known column.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the ecology crates.
pub type Result<T> = std::result::Result<T, EcologyError>;
