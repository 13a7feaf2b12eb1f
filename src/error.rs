use thiserror::Error;

/// Errors raised while turning a query result into a table or filtering it.
///
/// None of these are caught inside the crate; every failure ends the single
/// call and reaches the caller as-is.
#[derive(Debug, Error)]
pub enum TableError {
    /// The table has no column with this exact (case-sensitive) name.
    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    /// A substring test hit a cell that is neither text nor null.
    #[error("column '{column}', row {row}: value is not text")]
    NotText { column: String, row: usize },

    #[error("unsupported query result format: .{extension}")]
    UnsupportedFormat { extension: String },

    /// JSON input that is not an array of flat objects.
    #[error("invalid JSON records: {0}")]
    InvalidRecords(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}

impl TableError {
    pub(crate) fn missing_column(column: &str) -> Self {
        TableError::MissingColumn {
            column: column.to_string(),
        }
    }
}

pub type Result<T, E = TableError> = std::result::Result<T, E>;
