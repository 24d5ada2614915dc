//! Output module for exporting and summarizing search runs
//!
//! This module handles:
//! - Writing search results to a JSON export file
//! - Printing a human-readable run summary

mod export;
mod summary;

pub use export::{write_json, ExportDocument};
pub use summary::{format_summary, print_summary, Summary};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
