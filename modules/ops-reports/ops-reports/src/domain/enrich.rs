//! Per-user secondary lookups against the directory reports API.
//!
//! Two lookup shapes are used:
//! - the most recent login event, which decides whether a user is kept at all;
//! - a scan over recent days of usage reports until a non-zero storage figure shows up.
//!
//! Every processed user is followed by a fixed pause so the phase stays under the
//! upstream request quota. Lookups never fail a run; a missing answer drops the user
//! (login) or defaults the figure to zero (storage).

use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, Utc};
use ops_reports_sdk::models::InactiveUser;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::error::DomainError;
use super::numeric::round_to;
use super::ports::ResilientFetcher;
use super::timefmt::{format_plain_date, parse_event_time};

/// Usage parameter carrying the account's storage footprint.
pub const STORAGE_QUOTA_PARAMETER: &str = "accounts:used_quota_in_mb";

/// Field of a directory user holding its login address.
pub const PRIMARY_EMAIL_FIELD: &str = "primaryEmail";

const SECONDS_PER_DAY: i64 = 86_400;

/// URL layout of the directory and reports API, rooted at a configurable base.
#[derive(Debug, Clone)]
pub struct DirectoryEndpoints {
    base: Url,
}

impl DirectoryEndpoints {
    /// # Errors
    /// `Validation` when `base` cannot carry a path (e.g. `mailto:`).
    pub fn new(base: Url) -> Result<Self, DomainError> {
        if base.cannot_be_a_base() {
            return Err(DomainError::validation(
                "directory_base_url",
                format!("'{base}' cannot be used as a base URL"),
            ));
        }
        Ok(Self { base })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Checked in `new`: the base always has path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// First page of the user listing, without a page token.
    #[must_use]
    pub fn users(&self, customer: &str, page_size: u32) -> Url {
        let mut url = self.endpoint(&["admin", "directory", "v1", "users"]);
        url.query_pairs_mut()
            .append_pair("customer", customer)
            .append_pair("maxResults", &page_size.to_string());
        url
    }

    #[must_use]
    pub fn last_login(&self, email: &str) -> Url {
        let mut url = self.endpoint(&[
            "admin",
            "reports",
            "v1",
            "activity",
            "users",
            email,
            "applications",
            "login",
        ]);
        url.query_pairs_mut().append_pair("maxResults", "1");
        url
    }

    #[must_use]
    pub fn usage_on(&self, email: &str, date: NaiveDate) -> Url {
        self.endpoint(&[
            "admin",
            "reports",
            "v1",
            "usage",
            "users",
            email,
            "dates",
            &format_plain_date(date),
        ])
    }
}

/// Days probed for usage data, counted back from today: `[skip_days, end_days)`.
///
/// The most recent days are skipped because the upstream finalizes usage with a lag.
#[derive(Debug, Clone, Copy)]
pub struct ScanWindow {
    pub skip_days: u32,
    pub end_days: u32,
}

impl ScanWindow {
    /// Candidate dates, newest first.
    pub fn dates(self, today: NaiveDate) -> impl Iterator<Item = NaiveDate> {
        (self.skip_days..self.end_days)
            .filter_map(move |back| today.checked_sub_days(Days::new(u64::from(back))))
    }
}

/// Time of the most recent event listed at `url`, if there is one with a parsable time.
pub async fn last_event_time(fetcher: &dyn ResilientFetcher, url: &Url) -> Option<DateTime<Utc>> {
    let body = fetcher.fetch(url).await;
    let raw = body
        .get("items")?
        .as_array()?
        .first()?
        .get("id")?
        .get("time")?
        .as_str()?;
    let parsed = parse_event_time(raw);
    if parsed.is_none() {
        debug!(%url, raw, "event time not parsable");
    }
    parsed
}

/// Numeric value of `name` in the first usage report of `body`.
fn usage_parameter(body: &Value, name: &str) -> Option<f64> {
    let parameters = body
        .get("usageReports")?
        .as_array()?
        .first()?
        .get("parameters")?
        .as_array()?;
    let param = parameters
        .iter()
        .find(|p| p.get("name").and_then(Value::as_str) == Some(name))?;
    match param.get("intValue")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

enum ScanState {
    Scanning { next: usize },
    Found(f64),
    Defaulted,
}

/// Probe `candidates` in order and return the first non-zero value of `parameter`, else 0.
pub async fn scan_for_parameter(
    fetcher: &dyn ResilientFetcher,
    candidates: &[Url],
    parameter: &str,
) -> f64 {
    let mut state = ScanState::Scanning { next: 0 };
    loop {
        state = match state {
            ScanState::Scanning { next } => match candidates.get(next) {
                None => ScanState::Defaulted,
                Some(url) => match usage_parameter(&fetcher.fetch(url).await, parameter) {
                    Some(value) if value != 0.0 => ScanState::Found(value),
                    _ => ScanState::Scanning { next: next + 1 },
                },
            },
            ScanState::Found(value) => return value,
            ScanState::Defaulted => return 0.0,
        };
    }
}

/// Walks directory users one at a time and keeps the ones idle long enough.
pub struct DirectoryEnricher<'a> {
    fetcher: &'a dyn ResilientFetcher,
    endpoints: &'a DirectoryEndpoints,
    window: ScanWindow,
    delay: Duration,
}

impl<'a> DirectoryEnricher<'a> {
    #[must_use]
    pub fn new(
        fetcher: &'a dyn ResilientFetcher,
        endpoints: &'a DirectoryEndpoints,
        window: ScanWindow,
        delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            window,
            delay,
        }
    }

    /// Enrich `users` in listing order. Users without an email, without a login
    /// event, or idle for fewer than `min_inactive_days` are dropped.
    pub async fn enrich_all(
        &self,
        users: Vec<Value>,
        now: DateTime<Utc>,
        min_inactive_days: i64,
    ) -> Vec<InactiveUser> {
        let mut enriched = Vec::new();
        for user in users {
            let Some(email) = user.get(PRIMARY_EMAIL_FIELD).and_then(Value::as_str) else {
                debug!("directory user without primary email skipped");
                continue;
            };
            if let Some(record) = self.enrich_one(email, now, min_inactive_days).await {
                enriched.push(record);
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
        enriched
    }

    pub async fn enrich_one(
        &self,
        email: &str,
        now: DateTime<Utc>,
        min_inactive_days: i64,
    ) -> Option<InactiveUser> {
        let Some(last_login) = last_event_time(self.fetcher, &self.endpoints.last_login(email)).await
        else {
            debug!(email, "no login event; user dropped");
            return None;
        };

        // Whole days, floored: a login later than `now` counts as -1.
        let inactive_days = (now - last_login).num_seconds().div_euclid(SECONDS_PER_DAY);
        if inactive_days < min_inactive_days {
            return None;
        }

        let today = now.date_naive();
        let candidates: Vec<Url> = self
            .window
            .dates(today)
            .map(|date| self.endpoints.usage_on(email, date))
            .collect();
        let storage_mb =
            scan_for_parameter(self.fetcher, &candidates, STORAGE_QUOTA_PARAMETER).await;

        debug!(email, inactive_days, storage_mb, "user enriched");
        Some(InactiveUser {
            email: email.to_owned(),
            last_login: last_login.date_naive(),
            inactive_days,
            storage_gb: round_to(storage_mb / 1024.0, 2),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::ScriptedFetcher;
    use chrono::TimeZone;
    use serde_json::json;

    const LOGIN_URL: &str =
        "https://api.test/admin/reports/v1/activity/users/a@x.com/applications/login?maxResults=1";

    fn endpoints() -> DirectoryEndpoints {
        DirectoryEndpoints::new(Url::parse("https://api.test").unwrap()).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn usage_url(date: &str) -> String {
        format!("https://api.test/admin/reports/v1/usage/users/a@x.com/dates/{date}")
    }

    fn usage_body(value: Value) -> Value {
        json!({"usageReports": [{"parameters": [
            {"name": "gmail:num_emails", "intValue": "7"},
            {"name": STORAGE_QUOTA_PARAMETER, "intValue": value}
        ]}]})
    }

    fn window() -> ScanWindow {
        ScanWindow {
            skip_days: 4,
            end_days: 30,
        }
    }

    #[test]
    fn endpoints_render_expected_paths() {
        let ep = endpoints();
        assert_eq!(ep.last_login("a@x.com").as_str(), LOGIN_URL);
        assert_eq!(
            ep.users("my_customer", 500).as_str(),
            "https://api.test/admin/directory/v1/users?customer=my_customer&maxResults=500"
        );
        assert_eq!(
            ep.usage_on("a@x.com", NaiveDate::from_ymd_opt(2024, 6, 26).unwrap())
                .as_str(),
            usage_url("2024-06-26")
        );
    }

    #[test]
    fn non_base_url_is_rejected() {
        assert!(DirectoryEndpoints::new(Url::parse("mailto:ops@x.com").unwrap()).is_err());
    }

    #[test]
    fn scan_window_skips_recent_days() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let dates: Vec<_> = window().dates(today).collect();
        assert_eq!(dates.len(), 26);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 6, 26).unwrap());
        assert_eq!(dates[25], NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }

    #[tokio::test]
    async fn user_without_login_items_is_dropped() {
        let fetcher = ScriptedFetcher::new().respond(LOGIN_URL, json!({"items": []}));
        let ep = endpoints();
        let enricher = DirectoryEnricher::new(&fetcher, &ep, window(), Duration::ZERO);
        assert!(enricher.enrich_one("a@x.com", now(), 0).await.is_none());
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn user_whose_event_lacks_time_is_dropped() {
        let fetcher =
            ScriptedFetcher::new().respond(LOGIN_URL, json!({"items": [{"id": {"uniqueQualifier": "1"}}]}));
        let ep = endpoints();
        let enricher = DirectoryEnricher::new(&fetcher, &ep, window(), Duration::ZERO);
        assert!(enricher.enrich_one("a@x.com", now(), 0).await.is_none());
    }

    #[tokio::test]
    async fn login_after_now_floors_below_zero_and_is_dropped() {
        let fetcher = ScriptedFetcher::new().respond(
            LOGIN_URL,
            json!({"items": [{"id": {"time": "2024-06-30T13:00:00Z"}}]}),
        );
        let ep = endpoints();
        let enricher = DirectoryEnricher::new(&fetcher, &ep, window(), Duration::ZERO);
        assert!(enricher.enrich_one("a@x.com", now(), 0).await.is_none());
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn partial_day_of_idleness_floors_to_zero() {
        let fetcher = ScriptedFetcher::new().respond(
            LOGIN_URL,
            json!({"items": [{"id": {"time": "2024-06-29T13:00:00Z"}}]}),
        );
        let ep = endpoints();
        let enricher = DirectoryEnricher::new(&fetcher, &ep, window(), Duration::ZERO);
        let user = enricher.enrich_one("a@x.com", now(), 0).await.unwrap();
        assert_eq!(user.inactive_days, 0);
    }

    #[tokio::test]
    async fn recently_active_user_is_dropped_before_usage_lookup() {
        let fetcher = ScriptedFetcher::new().respond(
            LOGIN_URL,
            json!({"items": [{"id": {"time": "2024-06-25T08:00:00.000Z"}}]}),
        );
        let ep = endpoints();
        let enricher = DirectoryEnricher::new(&fetcher, &ep, window(), Duration::ZERO);
        assert!(enricher.enrich_one("a@x.com", now(), 30).await.is_none());
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn usage_scan_stops_at_first_non_zero_value() {
        let fetcher = ScriptedFetcher::new()
            .respond(
                LOGIN_URL,
                json!({"items": [{"id": {"time": "2024-03-01T00:00:00Z"}}]}),
            )
            .respond(&usage_url("2024-06-26"), usage_body(json!("0")))
            .respond(&usage_url("2024-06-25"), json!({"usageReports": []}))
            .respond(&usage_url("2024-06-24"), usage_body(json!("2048")))
            .respond(&usage_url("2024-06-23"), usage_body(json!("9999")));
        let ep = endpoints();
        let enricher = DirectoryEnricher::new(&fetcher, &ep, window(), Duration::ZERO);

        let user = enricher.enrich_one("a@x.com", now(), 90).await.unwrap();

        assert_eq!(user.inactive_days, 121);
        assert_eq!(user.last_login, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!((user.storage_gb - 2.0).abs() < 1e-9);
        // login + three usage probes
        assert_eq!(fetcher.calls().len(), 4);
    }

    #[tokio::test]
    async fn exhausted_window_defaults_storage_to_zero() {
        let fetcher = ScriptedFetcher::new().respond(
            LOGIN_URL,
            json!({"items": [{"id": {"time": "2024-03-01T00:00:00.5Z"}}]}),
        );
        let ep = endpoints();
        let enricher = DirectoryEnricher::new(&fetcher, &ep, window(), Duration::ZERO);

        let user = enricher.enrich_one("a@x.com", now(), 0).await.unwrap();

        assert!(user.storage_gb.abs() < f64::EPSILON);
        assert_eq!(fetcher.calls().len(), 1 + 26);
    }

    #[tokio::test]
    async fn numeric_int_value_is_accepted() {
        let body = usage_body(json!(512));
        assert_eq!(usage_parameter(&body, STORAGE_QUOTA_PARAMETER), Some(512.0));
        assert_eq!(usage_parameter(&body, "missing"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_follows_every_processed_user() {
        let fetcher = ScriptedFetcher::new();
        let ep = endpoints();
        let enricher = DirectoryEnricher::new(
            &fetcher,
            &ep,
            ScanWindow {
                skip_days: 0,
                end_days: 0,
            },
            Duration::from_millis(500),
        );
        let users = vec![
            json!({"primaryEmail": "a@x.com"}),
            json!({"primaryEmail": "b@x.com"}),
            json!({"primaryEmail": "c@x.com"}),
        ];

        let started = tokio::time::Instant::now();
        let kept = enricher.enrich_all(users, now(), 0).await;

        assert!(kept.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }
}
