// Error taxonomy for the insights pipeline.
//
// Every failure is fatal to the current "generate insights" action: the
// caller prints the error and renders nothing. There is no retry path and no
// substitution of defaults for missing data.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("required column '{column}' is missing from the input file")]
    MissingColumn { column: String },

    #[error("insufficient data: {what} has no rows")]
    EmptyTable { what: String },

    #[error("malformed value '{value}' in column '{column}' (line {line})")]
    MalformedValue {
        column: String,
        line: u64,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InsightError {
    pub fn missing_column(column: &str) -> Self {
        InsightError::MissingColumn {
            column: column.to_string(),
        }
    }

    pub fn empty_table(what: &str) -> Self {
        InsightError::EmptyTable {
            what: what.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InsightError>;
