use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use ops_reports_sdk::OpsReportsApi;
use tracing::info;

use crate::api::rest::routes;
use crate::config::OpsReportsConfig;
use crate::domain::ports::{Clock, FetcherProvider, SystemClock};
use crate::domain::service::Service;
use crate::infra::http_fetcher::HttpFetcherProvider;
use crate::local_client::LocalClient;

/// Wires configuration, outbound HTTP and the domain service together.
pub struct OpsReportsModule {
    config: OpsReportsConfig,
    service: Arc<Service>,
}

impl OpsReportsModule {
    /// Production wiring: reqwest-backed fetchers and the system clock.
    ///
    /// # Errors
    /// Fails when the HTTP client cannot be built or the configuration is unusable.
    pub fn init(config: OpsReportsConfig) -> anyhow::Result<Self> {
        info!("Initializing ops-reports module");
        let fetchers = HttpFetcherProvider::new(config.request_timeout())
            .context("failed to build outbound HTTP client")?;
        Self::with_collaborators(config, Arc::new(fetchers), Arc::new(SystemClock))
    }

    /// # Errors
    /// Fails when the configured directory base URL is unusable.
    pub fn with_collaborators(
        config: OpsReportsConfig,
        fetchers: Arc<dyn FetcherProvider>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let service = Service::new(config.clone(), fetchers, clock)
            .context("invalid ops-reports configuration")?;
        info!(
            directory = %config.directory_base_url,
            delay_ms = config.rate_limit_delay_ms,
            "ops-reports module initialized"
        );
        Ok(Self {
            config,
            service: Arc::new(service),
        })
    }

    #[must_use]
    pub fn register_rest(&self, router: Router) -> Router {
        info!("Registering ops-reports REST routes");
        routes::register_routes(router, Arc::clone(&self.service), &self.config)
    }

    #[must_use]
    pub fn client(&self) -> Arc<dyn OpsReportsApi> {
        Arc::new(LocalClient::new(Arc::clone(&self.service)))
    }

    #[must_use]
    pub fn config(&self) -> &OpsReportsConfig {
        &self.config
    }
}
