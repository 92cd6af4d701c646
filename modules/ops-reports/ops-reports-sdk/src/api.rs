//! `OpsReportsApi` trait definition.

use async_trait::async_trait;

use crate::errors::OpsReportsError;
use crate::models::{
    CallVolumeReport, InactivityReport, InactivityRequest, ProductivityReport, ProductivityRequest,
    Table,
};

/// Public API of the ops-reports module.
///
/// Each call runs one report to completion; there is no partial or streamed output.
#[async_trait]
pub trait OpsReportsApi: Send + Sync {
    /// Rank the call-log rows of an uploaded table by talk time and missed calls.
    async fn call_volume_report(&self, table: Table) -> Result<CallVolumeReport, OpsReportsError>;

    /// List directory users idle for at least `inactivity_days`, largest storage first.
    async fn inactivity_report(
        &self,
        request: InactivityRequest,
    ) -> Result<InactivityReport, OpsReportsError>;

    /// Summarize issue-tracker work per assignee.
    async fn productivity_report(
        &self,
        request: ProductivityRequest,
    ) -> Result<ProductivityReport, OpsReportsError>;
}
