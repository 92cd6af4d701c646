use ops_reports_sdk::models::{InactivityRequest, ProductivityRequest};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::error::DomainError;

/// Body of `POST /ops-reports/v1/inactivity`. Secrets stay out of `Debug`.
#[derive(Deserialize)]
pub struct InactivityReportRequest {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub inactivity_days: Option<i64>,
}

impl TryFrom<InactivityReportRequest> for InactivityRequest {
    type Error = DomainError;

    fn try_from(req: InactivityReportRequest) -> Result<Self, Self::Error> {
        let inactivity_days = req
            .inactivity_days
            .ok_or_else(|| DomainError::validation("inactivity_days", "is required"))?;
        Ok(Self {
            access_token: SecretString::from(req.access_token),
            inactivity_days,
        })
    }
}

/// Body of `POST /ops-reports/v1/productivity`.
#[derive(Deserialize)]
pub struct ProductivityReportRequest {
    #[serde(default)]
    pub site_url: Option<Url>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default)]
    pub jql: Option<String>,
}

impl From<ProductivityReportRequest> for ProductivityRequest {
    fn from(req: ProductivityReportRequest) -> Self {
        Self {
            site_url: req.site_url,
            email: req.email,
            api_token: SecretString::from(req.api_token),
            jql: req.jql,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
