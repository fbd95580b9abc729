use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
};
use serde_json::Value;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn get_job(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    errors::respond(services.facade.job(&id).await)
}

pub async fn log(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    errors::respond(services.facade.log(&id).await)
}

pub async fn remove(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    errors::respond(services.facade.remove(&id).await)
}

pub async fn inactive(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    errors::respond(services.facade.inactive(&id).await)
}

pub async fn update_state(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, state)): Path<(String, String)>,
) -> Response {
    errors::respond(services.facade.update_state(&id, &state).await)
}

pub async fn update_priority(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, priority)): Path<(String, String)>,
) -> Response {
    errors::respond(services.facade.update_priority(&id, &priority).await)
}

pub async fn search(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::SearchParams>,
) -> Response {
    let text = params.q.unwrap_or_default();
    errors::respond(services.facade.search(&text).await)
}

/// Body is one spec, an array of specs, or nothing at all.
pub async fn create(Extension(services): Extension<Arc<AppServices>>, body: Bytes) -> Response {
    let body: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_json", e.to_string());
            }
        }
    };

    errors::respond(services.facade.create(body).await)
}
