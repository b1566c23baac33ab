//! Error types for loading, cleaning and analysing sales data

use thiserror::Error;

/// Errors surfaced by the library.
///
/// Per-cell coercion problems never show up here: the cleaning stage
/// substitutes a default or drops the row instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The source is missing columns that cleaning cannot do without
    #[error("schema error: missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// A column name that is not part of the sales table
    #[error("unknown column '{column}'")]
    Lookup { column: String },

    /// A numeric operation requested on a text or date column
    #[error("column '{column}' is not {expected}")]
    Type {
        column: String,
        expected: &'static str,
    },

    /// An entity record rejected one of its values
    #[error("validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure inside polars while reading, transforming or writing a frame
    #[error("data frame error: {0}")]
    Frame(#[from] polars::prelude::PolarsError),

    #[error("render error: {0}")]
    Render(String),
}

impl AnalysisError {
    pub(crate) fn lookup(column: impl Into<String>) -> Self {
        Self::Lookup {
            column: column.into(),
        }
    }
}
