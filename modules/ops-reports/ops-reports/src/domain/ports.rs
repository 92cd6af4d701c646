//! Seams between the report pipeline and the outside world.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde_json::{Map, Value};
use url::Url;

/// How outbound requests authenticate. Obtaining the secret is the caller's business.
#[derive(Debug)]
pub enum ApiCredentials {
    Bearer(SecretString),
    Basic {
        username: String,
        password: SecretString,
    },
}

/// One GET, classified. Never fails past its boundary.
#[async_trait]
pub trait ResilientFetcher: Send + Sync {
    /// `Some(object)` on HTTP 200 with a JSON object body. `None` on any other status,
    /// a transport failure, or a body that does not decode to an object.
    async fn try_fetch(&self, url: &Url) -> Option<Value>;

    /// Same as [`try_fetch`](Self::try_fetch) with absence read as `{}`.
    async fn fetch(&self, url: &Url) -> Value {
        self.try_fetch(url)
            .await
            .unwrap_or_else(|| Value::Object(Map::new()))
    }
}

/// Builds a fetcher bound to one caller's credentials.
pub trait FetcherProvider: Send + Sync {
    fn fetcher(&self, credentials: ApiCredentials) -> Arc<dyn ResilientFetcher>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
