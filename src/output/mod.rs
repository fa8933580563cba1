//! Output module for turning crawl results into export rows
//!
//! This module handles:
//! - Merging note metadata with every collected comment
//! - Writing merged rows as spreadsheet-friendly CSV

mod export;
mod merge;

pub use export::{default_export_path, export_rows, write_csv, EXPORT_COLUMNS};
pub use merge::{merge, merge_at, MergedRow};

use thiserror::Error;

/// Errors raised while writing exports
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
