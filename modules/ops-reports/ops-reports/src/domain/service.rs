use std::sync::Arc;

use ops_reports_sdk::models::{
    CallVolumeReport, InactivityReport, InactivityRequest, ProductivityReport,
    ProductivityRequest, Table,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, instrument};

use crate::config::OpsReportsConfig;
use crate::domain::aggregate::ProductivityAggregator;
use crate::domain::enrich::{DirectoryEndpoints, DirectoryEnricher, ScanWindow};
use crate::domain::error::DomainError;
use crate::domain::issues::{ISSUES_FIELD, project_issues, search_url};
use crate::domain::pagination::{OffsetPaginator, Paginator, PagingPolicy, TokenPaginator};
use crate::domain::ports::{ApiCredentials, Clock, FetcherProvider};
use crate::domain::rank::{order_by_storage, score_call_rows, select_high_volume};

const DIRECTORY_USERS_RESOURCE: &str = "directory users";
const DIRECTORY_USERS_FIELD: &str = "users";
const TRACKER_ISSUES_RESOURCE: &str = "tracker issues";

/// Domain service that builds the three reports.
#[derive(Clone)]
pub struct Service {
    config: OpsReportsConfig,
    fetchers: Arc<dyn FetcherProvider>,
    clock: Arc<dyn Clock>,
    directory: DirectoryEndpoints,
}

impl Service {
    /// # Errors
    /// `Validation` when the configured directory base URL is unusable.
    pub fn new(
        config: OpsReportsConfig,
        fetchers: Arc<dyn FetcherProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DomainError> {
        let directory = DirectoryEndpoints::new(config.directory_base_url.clone())?;
        Ok(Self {
            config,
            fetchers,
            clock,
            directory,
        })
    }

    fn paging_policy(&self) -> PagingPolicy {
        PagingPolicy {
            max_pages: self.config.max_pages,
            first_page_failure_fatal: self.config.first_page_failure_fatal,
        }
    }

    fn scan_window(&self) -> ScanWindow {
        ScanWindow {
            skip_days: self.config.usage_scan_skip_days,
            end_days: self.config.usage_scan_end_days,
        }
    }

    /// Rank uploaded call-log rows and keep the high-volume ones.
    ///
    /// # Errors
    /// `MissingColumn` when a required header is absent.
    #[instrument(skip_all, fields(rows = table.rows.len()))]
    pub fn call_volume_report(&self, table: &Table) -> Result<CallVolumeReport, DomainError> {
        let scored = score_call_rows(table)?;
        let users = select_high_volume(scored);
        debug!(selected = users.len(), "call-volume rows selected");
        Ok(CallVolumeReport { users })
    }

    /// List every directory user and keep the ones idle for at least `inactivity_days`,
    /// largest storage first.
    ///
    /// # Errors
    /// `Validation` for a blank token or negative threshold, `UpstreamUnavailable`
    /// when the user listing cannot be started.
    #[instrument(skip_all, fields(inactivity_days = request.inactivity_days))]
    pub async fn inactivity_report(
        &self,
        request: InactivityRequest,
    ) -> Result<InactivityReport, DomainError> {
        require_secret("access_token", &request.access_token)?;
        if request.inactivity_days < 0 {
            return Err(DomainError::validation(
                "inactivity_days",
                "must not be negative",
            ));
        }

        let fetcher = self
            .fetchers
            .fetcher(ApiCredentials::Bearer(request.access_token));
        let listing = TokenPaginator::new(
            DIRECTORY_USERS_RESOURCE,
            self.directory.users(
                &self.config.directory_customer,
                self.config.directory_page_size,
            ),
            DIRECTORY_USERS_FIELD,
            self.paging_policy(),
        );
        let users = listing.list_all(fetcher.as_ref()).await?;
        info!(users = users.len(), "directory listing complete");

        let enricher = DirectoryEnricher::new(
            fetcher.as_ref(),
            &self.directory,
            self.scan_window(),
            self.config.rate_limit_delay(),
        );
        let mut results = enricher
            .enrich_all(users, self.clock.now(), request.inactivity_days)
            .await;
        order_by_storage(&mut results);

        info!(inactive = results.len(), "inactivity report ready");
        Ok(InactivityReport { results })
    }

    /// Roll up every issue matched by the search query, overall and per assignee.
    ///
    /// # Errors
    /// `Validation` for blank credentials or when no tracker site is known,
    /// `UpstreamUnavailable` when the search cannot be started.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn productivity_report(
        &self,
        request: ProductivityRequest,
    ) -> Result<ProductivityReport, DomainError> {
        if request.email.trim().is_empty() {
            return Err(DomainError::validation("email", "must not be blank"));
        }
        require_secret("api_token", &request.api_token)?;

        let site = request
            .site_url
            .or_else(|| self.config.tracker_site_url.clone())
            .ok_or_else(|| {
                DomainError::validation("site_url", "no issue-tracker site supplied or configured")
            })?;
        let jql = request
            .jql
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| self.config.tracker_jql.clone());

        let fetcher = self.fetchers.fetcher(ApiCredentials::Basic {
            username: request.email,
            password: request.api_token,
        });
        let listing = OffsetPaginator::new(
            TRACKER_ISSUES_RESOURCE,
            search_url(&site, &jql)?,
            ISSUES_FIELD,
            self.config.tracker_page_size,
            self.paging_policy(),
        );
        let raw = listing.list_all(fetcher.as_ref()).await?;
        let issues = project_issues(&raw);
        info!(issues = issues.len(), "issue search complete");

        let mut aggregator = ProductivityAggregator::new(self.clock.now().date_naive());
        aggregator.extend(issues);
        Ok(aggregator.finalize())
    }
}

fn require_secret(field: &str, secret: &SecretString) -> Result<(), DomainError> {
    if secret.expose_secret().trim().is_empty() {
        return Err(DomainError::validation(field, "must not be blank"));
    }
    Ok(())
}
