use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::Response,
};

use crate::app::errors;
use crate::app::services::AppServices;

/// Every `/jobs/...` listing and count; the facade classifies the path.
pub async fn jobs(
    Extension(services): Extension<Arc<AppServices>>,
    Path(query): Path<String>,
) -> Response {
    errors::respond(services.facade.query(&query).await)
}
