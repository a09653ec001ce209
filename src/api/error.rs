use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::backend::FetchError;
use crate::normalize::NormalizedError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Credential negotiation failed. Detail stays in the logs; clients
    /// only learn that the gateway could not authorize upstream.
    #[error("upstream authorization failed")]
    Authorization,

    /// Upstream answered with a status of 300 or above.
    #[error("upstream returned status {}", .0.status)]
    Upstream(NormalizedError),

    /// Connection-level failure with no upstream status at all.
    #[error("upstream transport failure")]
    Transport(NormalizedError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Authorization => StatusCode::BAD_GATEWAY,
            ApiError::Upstream(err) => {
                StatusCode::from_u16(err.status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(value: FetchError) -> Self {
        match value {
            FetchError::Authorization(err) => {
                tracing::error!(error = %err, "Credential negotiation failed");
                ApiError::Authorization
            }
            other => {
                tracing::warn!(error = %other, "Upstream fetch failed");
                ApiError::Transport(other.into_normalized())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = match self {
            ApiError::Authorization => NormalizedError {
                error: Some("upstream authorization failed".to_string()),
                status: status.as_u16(),
            },
            ApiError::Upstream(err) | ApiError::Transport(err) => err,
        };

        (status, Json(body)).into_response()
    }
}
