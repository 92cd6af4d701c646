use std::sync::Arc;

use async_trait::async_trait;
use ops_reports_sdk::{
    CallVolumeReport, InactivityReport, InactivityRequest, OpsReportsApi, OpsReportsError,
    ProductivityReport, ProductivityRequest, Table,
};

use crate::domain::service::Service;

/// In-process implementation of [`OpsReportsApi`] backed by the domain service.
pub struct LocalClient {
    service: Arc<Service>,
}

impl LocalClient {
    #[must_use]
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl OpsReportsApi for LocalClient {
    async fn call_volume_report(&self, table: Table) -> Result<CallVolumeReport, OpsReportsError> {
        self.service.call_volume_report(&table).map_err(Into::into)
    }

    async fn inactivity_report(
        &self,
        request: InactivityRequest,
    ) -> Result<InactivityReport, OpsReportsError> {
        self.service
            .inactivity_report(request)
            .await
            .map_err(Into::into)
    }

    async fn productivity_report(
        &self,
        request: ProductivityRequest,
    ) -> Result<ProductivityReport, OpsReportsError> {
        self.service
            .productivity_report(request)
            .await
            .map_err(Into::into)
    }
}
