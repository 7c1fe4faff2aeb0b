//! HTTP Error Mapping
//!
//! The single place where application error kinds become status codes:
//! NotFound -> 404, illegal transition -> 403, validation -> 400,
//! everything storage/internal -> 500. Method and path errors (405/404)
//! come out of the router itself.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jobqueue_core::error::AppError;
use serde::Serialize;

/// Wrapper so handlers can bubble `AppError` with `?`.
#[derive(Debug)]
pub struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub(crate) fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Domain(_) => StatusCode::FORBIDDEN,
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::Database(_) | AppError::Conflict(_) | AppError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed with internal error");
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
