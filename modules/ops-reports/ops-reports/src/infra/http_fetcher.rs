use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::domain::ports::{ApiCredentials, FetcherProvider, ResilientFetcher};

/// Shares one connection pool across every caller-bound fetcher.
#[derive(Clone)]
pub struct HttpFetcherProvider {
    client: Client,
}

impl HttpFetcherProvider {
    /// # Errors
    /// Fails when the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ops-reports/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl FetcherProvider for HttpFetcherProvider {
    fn fetcher(&self, credentials: ApiCredentials) -> Arc<dyn ResilientFetcher> {
        Arc::new(HttpJsonFetcher {
            client: self.client.clone(),
            credentials,
        })
    }
}

/// GETs JSON objects with one caller's credentials attached.
pub struct HttpJsonFetcher {
    client: Client,
    credentials: ApiCredentials,
}

#[async_trait]
impl ResilientFetcher for HttpJsonFetcher {
    #[instrument(skip_all, fields(url = %url))]
    async fn try_fetch(&self, url: &Url) -> Option<Value> {
        let request = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/json");
        let request = match &self.credentials {
            ApiCredentials::Bearer(token) => request.bearer_auth(token.expose_secret()),
            ApiCredentials::Basic { username, password } => {
                request.basic_auth(username, Some(password.expose_secret()))
            }
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(%url, %error, "request failed");
                return None;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            warn!(%url, status = status.as_u16(), "request returned non-200 status");
            return None;
        }

        match response.json::<Value>().await {
            Ok(body @ Value::Object(_)) => {
                debug!(%url, "fetched");
                Some(body)
            }
            Ok(_) => {
                warn!(%url, "response body is not a JSON object");
                None
            }
            Err(error) => {
                warn!(%url, %error, "response body is not valid JSON");
                None
            }
        }
    }
}
