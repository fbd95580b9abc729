use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::facade::FacadeError;

/// HTTP classification of a facade failure.
pub fn status_of(err: &FacadeError) -> StatusCode {
    match err.root() {
        FacadeError::Validation(_) => StatusCode::BAD_REQUEST,
        FacadeError::NotFound(_) => StatusCode::NOT_FOUND,
        FacadeError::Store(_) | FacadeError::Batch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn code_of(err: &FacadeError) -> &'static str {
    match err.root() {
        FacadeError::Validation(_) => "validation_error",
        FacadeError::NotFound(_) => "not_found",
        FacadeError::Store(_) | FacadeError::Batch { .. } => "store_error",
    }
}

pub fn facade_error_to_response(err: FacadeError) -> Response {
    let status = status_of(&err);
    let code = code_of(&err);
    match err {
        FacadeError::Batch { index, source } => (
            status,
            Json(json!({
                "error": code,
                "message": source.to_string(),
                "index": index,
            })),
        )
            .into_response(),
        other => json_error(status, code, other.to_string()),
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// `200` with the JSON body, or the shaped error.
pub fn respond<T: Serialize>(result: Result<T, FacadeError>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => facade_error_to_response(e),
    }
}
