//! Error types for CSV input.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or splitting CSV lines.
#[derive(Error, Debug)]
pub enum CsvSourceError {
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read line {line} of {}: {source}", path.display())]
    Read {
        path: PathBuf,
        line: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to split line {line}: {source}")]
    Split {
        line: u64,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, CsvSourceError>;
