use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::Extension;
use axum::http::StatusCode;
use ops_reports_sdk::models::{
    CallVolumeReport, InactivityReport, InactivityRequest, ProductivityReport,
};
use tracing::debug;

use super::dto::{HealthResponse, InactivityReportRequest, ProductivityReportRequest};
use super::error::ApiResult;
use super::problem::Problem;
use crate::domain::service::Service;
use crate::infra::spreadsheet;

/// Multipart field carrying the call-log workbook.
pub const UPLOAD_FIELD: &str = "file";

const CODE_BAD_BODY: &str = "OPS_REPORTS_BAD_BODY";

fn bad_body(status: StatusCode, detail: String) -> Problem {
    let title = status.canonical_reason().unwrap_or("Bad Request");
    Problem::new(status, title, detail).with_code(CODE_BAD_BODY)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn call_volume_report(
    Extension(svc): Extension<Arc<Service>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<CallVolumeReport>> {
    let mut multipart =
        multipart.map_err(|e| bad_body(e.status(), e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_body(e.status(), e.body_text()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_body(e.status(), e.body_text()))?;
            upload = Some(bytes);
            break;
        }
    }

    let bytes = upload
        .filter(|b| !b.is_empty())
        .ok_or_else(|| Problem::bad_request("OPS_REPORTS_NO_FILE", "No file uploaded"))?;
    debug!(size = bytes.len(), "call log received");

    let table = spreadsheet::parse_table(bytes).await?;
    Ok(Json(svc.call_volume_report(&table)?))
}

pub async fn inactivity_report(
    Extension(svc): Extension<Arc<Service>>,
    payload: Result<Json<InactivityReportRequest>, JsonRejection>,
) -> ApiResult<Json<InactivityReport>> {
    let Json(req) = payload.map_err(|e| bad_body(e.status(), e.body_text()))?;
    let request = InactivityRequest::try_from(req)?;
    Ok(Json(svc.inactivity_report(request).await?))
}

pub async fn productivity_report(
    Extension(svc): Extension<Arc<Service>>,
    payload: Result<Json<ProductivityReportRequest>, JsonRejection>,
) -> ApiResult<Json<ProductivityReport>> {
    let Json(req) = payload.map_err(|e| bad_body(e.status(), e.body_text()))?;
    Ok(Json(svc.productivity_report(req.into()).await?))
}
