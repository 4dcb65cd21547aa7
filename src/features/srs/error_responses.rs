use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::data::models::{ReviewError, StoreError};

impl ReviewError {
    pub fn status(&self) -> StatusCode {
        match self {
            ReviewError::NotFound(_) => StatusCode::NOT_FOUND,
            ReviewError::Unauthorized(_) => StatusCode::FORBIDDEN,
            ReviewError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ReviewError::InvalidGrade(_) | ReviewError::InvalidArgument(_) => {
                StatusCode::BAD_REQUEST
            }
            ReviewError::ConcurrencyConflict { .. } => StatusCode::CONFLICT,
            ReviewError::Store(StoreError::UnsupportedState(_)) => StatusCode::CONFLICT,
            ReviewError::Store(_) | ReviewError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Review request failed: {}", self);
        }

        let body = json!({
            "error": self.to_string(),
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}
