use polars::prelude::PolarsError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogbookError {
    /// Malformed or missing configuration; aborts before any generation.
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("content pool '{category}' has no candidates")]
    EmptyPool { category: String },
    #[error("shift {shift}: field '{field}' has no override and no pool category")]
    MissingField { shift: u32, field: String },
    /// One record could not be written; the rest of the batch continues.
    #[error("shift {shift}: emission failed: {message}")]
    RecordEmission { shift: u32, message: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("dataframe error: {0}")]
    DataFrame(#[from] PolarsError),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl LogbookError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    /// True for errors that make every remaining record fail the same way.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::RecordEmission { .. })
    }
}

pub type LogbookResult<T> = Result<T, LogbookError>;
