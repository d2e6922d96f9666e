//! Maps `LegioError` onto the `{error}` HTTP envelope (§6 HTTP/JSON API
//! conventions): 400 validation, 404 not-found/missing store, 500 otherwise.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use legio_core::LegioError;
use serde_json::json;

pub struct ApiError(pub LegioError);

impl From<LegioError> for ApiError {
    fn from(err: LegioError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LegioError::Validation { .. } => StatusCode::BAD_REQUEST,
            LegioError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({
            "error": {
                "kind": self.0.kind(),
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
