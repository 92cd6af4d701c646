use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Extension};
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use super::handlers;
use crate::config::OpsReportsConfig;
use crate::domain::service::Service;

pub const HEALTH_PATH: &str = "/health";
pub const CALL_VOLUME_PATH: &str = "/ops-reports/v1/call-volume";
pub const INACTIVITY_PATH: &str = "/ops-reports/v1/inactivity";
pub const PRODUCTIVITY_PATH: &str = "/ops-reports/v1/productivity";

/// Mount the report endpoints onto `router`.
pub fn register_routes(router: Router, service: Arc<Service>, config: &OpsReportsConfig) -> Router {
    let reports = Router::new()
        .route(CALL_VOLUME_PATH, post(handlers::call_volume_report))
        .route(INACTIVITY_PATH, post(handlers::inactivity_report))
        .route(PRODUCTIVITY_PATH, post(handlers::productivity_report))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes()))
        .layer(Extension(service));

    router
        .route(HEALTH_PATH, get(handlers::health))
        .merge(reports)
}
