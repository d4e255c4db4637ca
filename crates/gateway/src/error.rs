use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use tabulens_tabular::{ChartError, ParseError};

/// Request-level error taxonomy. Every handler returns `Result<_, ApiError>`
/// and the status mapping lives here, not at the call sites.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: Access denied.")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("Database error")]
    Storage(#[from] sqlx::Error),
    #[error("{0}")]
    Insights(String),
    #[error("{0}")]
    Configuration(String),
    #[error("Server Error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Parse(_)
            | ApiError::Storage(_)
            | ApiError::Insights(_)
            | ApiError::Configuration(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            // Detail (SQL messages, worker panics) goes to the log, the
            // body only carries the taxonomy message.
            match &self {
                ApiError::Storage(source) => tracing::error!("database failure: {}", source),
                ApiError::Internal(detail) => tracing::error!("internal failure: {}", detail),
                other => tracing::error!("request failed: {}", other),
            }
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

impl From<ChartError> for ApiError {
    fn from(err: ChartError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::NotFound("File not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Parse(ParseError::EmptySheet).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Configuration("no key".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn chart_errors_become_validation_errors() {
        let err: ApiError = ChartError::EmptyDataset.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "No data available to generate chart.");

        let err: ApiError = ChartError::InvalidChartType("donut".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
