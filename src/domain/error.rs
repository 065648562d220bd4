// Error taxonomy for the telemetry core
use thiserror::Error;

/// Failures raised by a Reading Store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("store responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("store query error: {0}")]
    Query(String),
    #[error("malformed store row: {0}")]
    Decode(String),
    #[error("store did not respond within {0}s")]
    Timeout(u64),
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },
    #[error("insufficient data: {available} monthly point(s) available")]
    InsufficientData { available: usize },
    #[error("reading store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("page size must be positive, got {0}")]
    InvalidPageSize(i64),
    #[error("invalid reading: {0}")]
    InvalidReading(String),
    #[error("unknown granularity '{0}', expected day, week or month")]
    InvalidGranularity(String),
    #[error("invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
}

impl TelemetryError {
    pub fn invalid_range(start: impl ToString, end: impl ToString) -> Self {
        Self::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    /// Short machine-readable tag used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRange { .. } => "invalid_range",
            Self::InsufficientData { .. } => "insufficient_data",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::InvalidPageSize(_) => "invalid_page_size",
            Self::InvalidReading(_) => "invalid_reading",
            Self::InvalidGranularity(_) => "invalid_granularity",
            Self::InvalidMonth(_) => "invalid_month",
        }
    }
}
