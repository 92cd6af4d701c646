//! Projection of raw issue-tracker search results.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::error::DomainError;
use super::timefmt::{parse_plain_date, parse_tracker_date};

/// Issue fields requested from the search endpoint.
pub const ISSUE_FIELDS: &str = "status,assignee,duedate,resolutiondate,timespent";

/// Field of a search response holding the page of issues.
pub const ISSUES_FIELD: &str = "issues";

/// Search endpoint for `jql` on `site`, without paging parameters.
///
/// # Errors
/// `Validation` when `site` cannot carry a path.
pub fn search_url(site: &Url, jql: &str) -> Result<Url, DomainError> {
    let mut url = site.clone();
    url.path_segments_mut()
        .map_err(|()| {
            DomainError::validation("site_url", format!("'{site}' cannot be used as a base URL"))
        })?
        .pop_if_empty()
        .extend(["rest", "api", "3", "search"]);
    url.query_pairs_mut()
        .append_pair("jql", jql)
        .append_pair("fields", ISSUE_FIELDS);
    Ok(url)
}

/// The fixed slice of an issue the productivity rollup looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueRecord {
    pub key: String,
    pub status_category: String,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub resolution_date: Option<NaiveDate>,
    /// Seconds.
    pub time_spent: u64,
}

impl IssueRecord {
    /// `None` when the issue has no key.
    #[must_use]
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let key = raw.get("key").and_then(Value::as_str)?.to_owned();
        let fields = raw.get("fields").unwrap_or(&Value::Null);

        let status_category = fields
            .pointer("/status/statusCategory/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let assignee = fields
            .pointer("/assignee/displayName")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let due_date = fields
            .get("duedate")
            .and_then(Value::as_str)
            .and_then(parse_plain_date);
        let resolution_date = fields
            .get("resolutiondate")
            .and_then(Value::as_str)
            .and_then(parse_tracker_date);
        let time_spent = fields
            .get("timespent")
            .and_then(Value::as_u64)
            .unwrap_or(0);

        Some(Self {
            key,
            status_category,
            assignee,
            due_date,
            resolution_date,
            time_spent,
        })
    }
}

/// Project every raw issue, dropping the ones without a key.
#[must_use]
pub fn project_issues(raw: &[Value]) -> Vec<IssueRecord> {
    let records: Vec<IssueRecord> = raw.iter().filter_map(IssueRecord::from_raw).collect();
    if records.len() < raw.len() {
        debug!(dropped = raw.len() - records.len(), "issues without key skipped");
    }
    records
}
