use axum::http::StatusCode;

use super::problem::Problem;
use crate::domain::error::DomainError;

pub type ApiResult<T> = Result<T, Problem>;

impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        let trace_id = tracing::Span::current()
            .id()
            .map(|id| id.into_u64().to_string());

        let (status, code, title, detail) = match &e {
            DomainError::MissingColumn { column } => (
                StatusCode::BAD_REQUEST,
                "OPS_REPORTS_MISSING_COLUMN",
                "Bad Request",
                format!("Missing column: {column}"),
            ),
            DomainError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                "OPS_REPORTS_VALIDATION",
                "Bad Request",
                format!("Validation error on '{field}': {message}"),
            ),
            DomainError::InvalidSpreadsheet(message) => (
                StatusCode::BAD_REQUEST,
                "OPS_REPORTS_INVALID_SPREADSHEET",
                "Bad Request",
                message.clone(),
            ),
            DomainError::UpstreamUnavailable { resource } => (
                StatusCode::BAD_GATEWAY,
                "OPS_REPORTS_UPSTREAM_UNAVAILABLE",
                "Bad Gateway",
                format!("Upstream unavailable: {resource}"),
            ),
            DomainError::Internal(_) => {
                tracing::error!(error = ?e, "Internal error while building report");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "OPS_REPORTS_INTERNAL",
                    "Internal Server Error",
                    "An internal error occurred".to_owned(),
                )
            }
        };

        let mut problem = Problem::new(status, title, detail).with_code(code);
        if let Some(id) = trace_id {
            problem = problem.with_trace_id(id);
        }
        problem
    }
}
