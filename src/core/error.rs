use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Directory lookup timed out after {0:?}")]
    DirectoryTimeout(Duration),

    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("Partition fetch failed: {0}")]
    FetchFailed(String),

    #[error("Aggregation cancelled")]
    AggregationCancelled,

    #[error("Persist failed: {0}")]
    PersistFailed(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
