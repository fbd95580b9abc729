use std::sync::Arc;

use axum::{extract::Extension, response::Response};

use crate::app::errors;
use crate::app::services::AppServices;

pub async fn stats(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(services.facade.stats().await)
}

pub async fn types(Extension(services): Extension<Arc<AppServices>>) -> Response {
    errors::respond(services.facade.types().await)
}
