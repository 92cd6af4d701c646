use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for the `ops_reports` module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpsReportsConfig {
    /// Base URL of the directory and usage-reports API.
    #[serde(default = "default_directory_base_url")]
    pub directory_base_url: Url,
    /// Customer selector passed to the directory listing.
    #[serde(default = "default_directory_customer")]
    pub directory_customer: String,
    #[serde(default = "default_directory_page_size")]
    pub directory_page_size: u32,
    /// Issue-tracker site used when a request does not carry its own.
    #[serde(default)]
    pub tracker_site_url: Option<Url>,
    /// Search query used when a request does not carry its own.
    #[serde(default = "default_tracker_jql")]
    pub tracker_jql: String,
    #[serde(default = "default_tracker_page_size")]
    pub tracker_page_size: u32,
    /// Pause after each enriched entity, in milliseconds.
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,
    /// First day (counted back from today) probed for usage data.
    #[serde(default = "default_usage_scan_skip_days")]
    pub usage_scan_skip_days: u32,
    /// Exclusive end of the usage probe window, in days back from today.
    #[serde(default = "default_usage_scan_end_days")]
    pub usage_scan_end_days: u32,
    /// Upper bound on pages fetched by one listing.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Fail the report when the first listing page cannot be fetched.
    #[serde(default = "default_first_page_failure_fatal")]
    pub first_page_failure_fatal: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_upload_size_mb")]
    pub max_upload_size_mb: u64,
}

impl OpsReportsConfig {
    #[must_use]
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_size_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

impl Default for OpsReportsConfig {
    fn default() -> Self {
        Self {
            directory_base_url: default_directory_base_url(),
            directory_customer: default_directory_customer(),
            directory_page_size: default_directory_page_size(),
            tracker_site_url: None,
            tracker_jql: default_tracker_jql(),
            tracker_page_size: default_tracker_page_size(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            usage_scan_skip_days: default_usage_scan_skip_days(),
            usage_scan_end_days: default_usage_scan_end_days(),
            max_pages: default_max_pages(),
            first_page_failure_fatal: default_first_page_failure_fatal(),
            request_timeout_secs: default_request_timeout_secs(),
            max_upload_size_mb: default_max_upload_size_mb(),
        }
    }
}

#[allow(clippy::unwrap_used)]
fn default_directory_base_url() -> Url {
    // Constant literal, always parses.
    Url::parse("https://admin.googleapis.com").unwrap()
}

fn default_directory_customer() -> String {
    "my_customer".to_owned()
}

fn default_directory_page_size() -> u32 {
    500
}

fn default_tracker_jql() -> String {
    "order by updated DESC".to_owned()
}

fn default_tracker_page_size() -> u32 {
    100
}

fn default_rate_limit_delay_ms() -> u64 {
    500
}

fn default_usage_scan_skip_days() -> u32 {
    4
}

fn default_usage_scan_end_days() -> u32 {
    30
}

fn default_max_pages() -> u32 {
    1000
}

fn default_first_page_failure_fatal() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_upload_size_mb() -> u64 {
    10
}
