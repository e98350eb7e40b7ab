//! Custom error types for the signal pipeline
//!
//! Every error here is recovered somewhere inside the pipeline; none of them
//! is allowed to terminate the process.

use thiserror::Error;

/// Missing or invalid market snapshot data.
///
/// Strategy sources recover from these locally by emitting `{HOLD, 0.0}`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Snapshot for {symbol} has no bars")]
    EmptyBars { symbol: String },

    #[error("Invalid current price {price} for {symbol}")]
    InvalidPrice { symbol: String, price: f64 },

    #[error("Bar {index} for {symbol} has a non-finite or negative {field}")]
    InvalidBar {
        symbol: String,
        index: usize,
        field: &'static str,
    },

    #[error("Missing required field '{field}'")]
    MissingField { field: String },

    #[error("Column '{field}' has {actual} values, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("No swing high/low pair found for {symbol}")]
    NoSwingPoints { symbol: String },

    #[error("Not enough data for {symbol}: have {count}, need {required}")]
    InsufficientData {
        symbol: String,
        count: usize,
        required: usize,
    },
}

/// A configured strategy source could not be resolved.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Unknown strategy source '{id}'")]
    Unknown { id: String },

    #[error("Strategy source '{id}' is already registered")]
    Duplicate { id: String },
}

/// Failures of the external market-data collaborator.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("No market data available for {symbol}")]
    NoData { symbol: String },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid feed URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("Invalid snapshot: {0}")]
    Data(#[from] DataError),
}

/// Failures of the external trade-execution collaborator.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Action {action} is not executable")]
    NotExecutable { action: String },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// A router tick was abandoned before a decision was produced.
#[derive(Error, Debug)]
pub enum TickError {
    #[error("Market data unavailable: {0}")]
    Feed(#[from] FeedError),

    #[error("Another tick is still in progress")]
    InProgress,
}

/// Invalid or unreadable configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Failures while starting or stopping the periodic tick job.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Scheduler error: {0}")]
    Cron(String),

    #[error("Scheduler already running")]
    AlreadyRunning,

    #[error("Scheduler not running")]
    NotRunning,
}

impl From<tokio_cron_scheduler::JobSchedulerError> for SchedulerError {
    fn from(e: tokio_cron_scheduler::JobSchedulerError) -> Self {
        SchedulerError::Cron(e.to_string())
    }
}
