//! Listing drivers that walk an unbounded upstream collection page by page.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::error::DomainError;
use super::ports::ResilientFetcher;

/// Collects every entity of one listing endpoint, in upstream order.
#[async_trait]
pub trait Paginator: Send + Sync {
    /// # Errors
    /// `UpstreamUnavailable` when the first page cannot be fetched and the
    /// listing is configured to treat that as fatal.
    async fn list_all(&self, fetcher: &dyn ResilientFetcher) -> Result<Vec<Value>, DomainError>;
}

/// Behaviour shared by both pagination strategies.
#[derive(Debug, Clone)]
pub struct PagingPolicy {
    /// Hard stop, guards against an upstream that never stops handing out pages.
    pub max_pages: u32,
    pub first_page_failure_fatal: bool,
}

impl Default for PagingPolicy {
    fn default() -> Self {
        Self {
            max_pages: 1000,
            first_page_failure_fatal: true,
        }
    }
}

impl PagingPolicy {
    /// Decide what a failed page means. `Ok(())` means "stop and keep what we have".
    fn on_failed_page(&self, resource: &str, page: u32) -> Result<(), DomainError> {
        if page == 0 && self.first_page_failure_fatal {
            return Err(DomainError::upstream_unavailable(resource));
        }
        warn!(resource, page, "listing page failed; returning collected prefix");
        Ok(())
    }
}

fn take_items(body: &mut Value, field: &str) -> Vec<Value> {
    match body.get_mut(field).map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// Continuation-token listing: `{ <items>: [...], nextPageToken?: "..." }`.
#[derive(Debug, Clone)]
pub struct TokenPaginator {
    resource: String,
    base: Url,
    items_field: String,
    policy: PagingPolicy,
}

const PAGE_TOKEN_PARAM: &str = "pageToken";
const NEXT_PAGE_TOKEN_FIELD: &str = "nextPageToken";

impl TokenPaginator {
    /// `base` carries every query parameter except the page token.
    #[must_use]
    pub fn new(
        resource: impl Into<String>,
        base: Url,
        items_field: impl Into<String>,
        policy: PagingPolicy,
    ) -> Self {
        Self {
            resource: resource.into(),
            base,
            items_field: items_field.into(),
            policy,
        }
    }

    fn page_url(&self, token: Option<&str>) -> Url {
        let mut url = self.base.clone();
        if let Some(token) = token {
            url.query_pairs_mut().append_pair(PAGE_TOKEN_PARAM, token);
        }
        url
    }
}

#[async_trait]
impl Paginator for TokenPaginator {
    async fn list_all(&self, fetcher: &dyn ResilientFetcher) -> Result<Vec<Value>, DomainError> {
        let mut entities = Vec::new();
        let mut token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        for page in 0..self.policy.max_pages {
            let url = self.page_url(token.as_deref());
            let Some(mut body) = fetcher.try_fetch(&url).await else {
                self.policy.on_failed_page(&self.resource, page)?;
                return Ok(entities);
            };

            let items = take_items(&mut body, &self.items_field);
            debug!(resource = %self.resource, page, items = items.len(), "fetched page");
            entities.extend(items);

            let next = body
                .get(NEXT_PAGE_TOKEN_FIELD)
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty());
            match next {
                None => return Ok(entities),
                Some(next) if !seen_tokens.insert(next.to_owned()) => {
                    warn!(resource = %self.resource, page, "continuation token repeated; stopping");
                    return Ok(entities);
                }
                Some(next) => token = Some(next.to_owned()),
            }
        }

        warn!(
            resource = %self.resource,
            max_pages = self.policy.max_pages,
            "page limit reached; listing truncated"
        );
        Ok(entities)
    }
}

/// Offset listing: `{ <items>: [...], total: n }` addressed by `startAt`/`maxResults`.
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    resource: String,
    base: Url,
    items_field: String,
    page_size: u32,
    policy: PagingPolicy,
}

const START_AT_PARAM: &str = "startAt";
const MAX_RESULTS_PARAM: &str = "maxResults";
const TOTAL_FIELD: &str = "total";

impl OffsetPaginator {
    #[must_use]
    pub fn new(
        resource: impl Into<String>,
        base: Url,
        items_field: impl Into<String>,
        page_size: u32,
        policy: PagingPolicy,
    ) -> Self {
        Self {
            resource: resource.into(),
            base,
            items_field: items_field.into(),
            page_size: page_size.max(1),
            policy,
        }
    }

    fn page_url(&self, start_at: u64) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair(START_AT_PARAM, &start_at.to_string())
            .append_pair(MAX_RESULTS_PARAM, &self.page_size.to_string());
        url
    }
}

#[async_trait]
impl Paginator for OffsetPaginator {
    async fn list_all(&self, fetcher: &dyn ResilientFetcher) -> Result<Vec<Value>, DomainError> {
        let mut entities = Vec::new();
        let mut start_at: u64 = 0;

        for page in 0..self.policy.max_pages {
            let url = self.page_url(start_at);
            let Some(mut body) = fetcher.try_fetch(&url).await else {
                self.policy.on_failed_page(&self.resource, page)?;
                return Ok(entities);
            };

            let items = take_items(&mut body, &self.items_field);
            let count = items.len() as u64;
            debug!(resource = %self.resource, page, start_at, items = count, "fetched page");
            entities.extend(items);
            start_at += count;

            let exhausted = match body.get(TOTAL_FIELD).and_then(Value::as_u64) {
                Some(total) => start_at >= total,
                None => count < u64::from(self.page_size),
            };
            if count == 0 || exhausted {
                return Ok(entities);
            }
        }

        warn!(
            resource = %self.resource,
            max_pages = self.policy.max_pages,
            "page limit reached; listing truncated"
        );
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::ScriptedFetcher;
    use serde_json::json;

    fn base(path: &str) -> Url {
        Url::parse(&format!("https://api.test{path}")).unwrap()
    }

    fn token_paginator(policy: PagingPolicy) -> TokenPaginator {
        TokenPaginator::new("users", base("/users?customer=c"), "users", policy)
    }

    #[tokio::test]
    async fn token_listing_concatenates_pages_in_order() {
        let fetcher = ScriptedFetcher::new()
            .respond(
                "https://api.test/users?customer=c",
                json!({"users": [{"id": 1}, {"id": 2}], "nextPageToken": "t1"}),
            )
            .respond(
                "https://api.test/users?customer=c&pageToken=t1",
                json!({"users": [{"id": 3}], "nextPageToken": "t2"}),
            )
            .respond(
                "https://api.test/users?customer=c&pageToken=t2",
                json!({"users": [{"id": 4}]}),
            );

        let all = token_paginator(PagingPolicy::default())
            .list_all(&fetcher)
            .await
            .unwrap();

        let ids: Vec<_> = all.iter().map(|u| u["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn first_page_failure_is_upstream_unavailable() {
        let fetcher = ScriptedFetcher::new();
        let err = token_paginator(PagingPolicy::default())
            .list_all(&fetcher)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::UpstreamUnavailable { ref resource } if resource == "users"));
    }

    #[tokio::test]
    async fn first_page_failure_can_be_tolerated() {
        let fetcher = ScriptedFetcher::new();
        let policy = PagingPolicy {
            first_page_failure_fatal: false,
            ..PagingPolicy::default()
        };
        let all = token_paginator(policy).list_all(&fetcher).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn later_page_failure_keeps_prefix() {
        let fetcher = ScriptedFetcher::new().respond(
            "https://api.test/users?customer=c",
            json!({"users": [{"id": 1}], "nextPageToken": "t1"}),
        );
        let all = token_paginator(PagingPolicy::default())
            .list_all(&fetcher)
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn repeated_token_stops_the_loop() {
        let fetcher = ScriptedFetcher::new()
            .respond(
                "https://api.test/users?customer=c",
                json!({"users": [{"id": 1}], "nextPageToken": "same"}),
            )
            .respond(
                "https://api.test/users?customer=c&pageToken=same",
                json!({"users": [{"id": 2}], "nextPageToken": "same"}),
            );
        let all = token_paginator(PagingPolicy::default())
            .list_all(&fetcher)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn page_cap_bounds_requests() {
        let fetcher = ScriptedFetcher::new()
            .respond(
                "https://api.test/users?customer=c",
                json!({"users": [{"id": 1}], "nextPageToken": "a"}),
            )
            .respond(
                "https://api.test/users?customer=c&pageToken=a",
                json!({"users": [{"id": 2}], "nextPageToken": "b"}),
            );
        let policy = PagingPolicy {
            max_pages: 2,
            ..PagingPolicy::default()
        };
        let all = token_paginator(policy).list_all(&fetcher).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn offset_listing_stops_at_total() {
        let fetcher = ScriptedFetcher::new()
            .respond(
                "https://api.test/search?jql=x&startAt=0&maxResults=2",
                json!({"issues": [{"key": "A-1"}, {"key": "A-2"}], "total": 3}),
            )
            .respond(
                "https://api.test/search?jql=x&startAt=2&maxResults=2",
                json!({"issues": [{"key": "A-3"}], "total": 3}),
            );
        let paginator = OffsetPaginator::new(
            "issues",
            base("/search?jql=x"),
            "issues",
            2,
            PagingPolicy::default(),
        );

        let all = paginator.list_all(&fetcher).await.unwrap();
        let keys: Vec<_> = all.iter().map(|i| i["key"].as_str().unwrap()).collect();
        assert_eq!(keys, vec!["A-1", "A-2", "A-3"]);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn offset_listing_without_total_stops_on_short_page() {
        let fetcher = ScriptedFetcher::new().respond(
            "https://api.test/search?jql=x&startAt=0&maxResults=5",
            json!({"issues": [{"key": "A-1"}]}),
        );
        let paginator = OffsetPaginator::new(
            "issues",
            base("/search?jql=x"),
            "issues",
            5,
            PagingPolicy::default(),
        );
        let all = paginator.list_all(&fetcher).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(fetcher.calls().len(), 1);
    }
}
