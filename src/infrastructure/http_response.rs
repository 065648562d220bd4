// HTTP response utilities for core errors
use crate::domain::error::TelemetryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

pub fn status_for(error: &TelemetryError) -> StatusCode {
    match error {
        TelemetryError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        // Only reaches HTTP if a caller forgot to turn it into a "no forecast" body
        TelemetryError::InsufficientData { .. } => StatusCode::OK,
        TelemetryError::InvalidRange { .. }
        | TelemetryError::InvalidPageSize(_)
        | TelemetryError::InvalidReading(_)
        | TelemetryError::InvalidGranularity(_)
        | TelemetryError::InvalidMonth(_) => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for TelemetryError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }

        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::StoreError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&TelemetryError::invalid_range("2025-03", "2025-01")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&TelemetryError::InvalidPageSize(0)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&TelemetryError::StoreUnavailable(StoreError::Timeout(10))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_error_response_status() {
        let response = TelemetryError::InvalidMonth("2025-13".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
