//! In-memory doubles for the pipeline ports.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use url::Url;

use super::ports::{ApiCredentials, Clock, FetcherProvider, ResilientFetcher};

/// Answers from a fixed URL -> body table; unknown URLs behave like failed requests.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, Value>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn respond(mut self, url: &str, body: Value) -> Self {
        self.responses.insert(url.to_owned(), body);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResilientFetcher for ScriptedFetcher {
    async fn try_fetch(&self, url: &Url) -> Option<Value> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses.get(url.as_str()).cloned()
    }
}

/// Hands out the same scripted fetcher regardless of credentials, remembering what it was given.
pub struct ScriptedProvider {
    fetcher: Arc<ScriptedFetcher>,
    credentials: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(fetcher: ScriptedFetcher) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            credentials: Mutex::new(Vec::new()),
        }
    }

    pub fn scripted(&self) -> Arc<ScriptedFetcher> {
        Arc::clone(&self.fetcher)
    }

    /// Credential kinds seen so far (`bearer` / `basic:<user>`).
    pub fn credential_kinds(&self) -> Vec<String> {
        self.credentials.lock().unwrap().clone()
    }
}

impl FetcherProvider for ScriptedProvider {
    fn fetcher(&self, credentials: ApiCredentials) -> Arc<dyn ResilientFetcher> {
        let kind = match credentials {
            ApiCredentials::Bearer(_) => "bearer".to_owned(),
            ApiCredentials::Basic { username, .. } => format!("basic:{username}"),
        };
        self.credentials.lock().unwrap().push(kind);
        self.fetcher.clone()
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
