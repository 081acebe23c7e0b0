//! Error types for fetching and shaping census tables.
//!
//! Every variant aborts the report build; there is no partial output.

use thiserror::Error;

/// Failures raised while fetching, normalizing, or aggregating a table.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Data service returned {status} for table {table}: {body}")]
    Api {
        table: String,
        status: u16,
        body: String,
    },

    #[error("Data service returned no rows for table {0}")]
    EmptyResponse(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Invalid estimate '{value}' in row {row}")]
    InvalidEstimate { value: String, row: usize },

    #[error("Geography not found in table: {0}")]
    GeographyNotFound(String),

    #[error("No 'Total' mode row for group: {0}")]
    MissingTotal(String),

    #[error("Group not present in table: {0}")]
    UnknownGroup(String),

    #[error("Unrecognized income range: {0}")]
    UnknownIncomeRange(String),

    #[error("Unknown state: {0}")]
    UnknownState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
