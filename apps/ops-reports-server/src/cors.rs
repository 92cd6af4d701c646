use std::time::Duration;

use anyhow::{Result, ensure};
use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::config::CorsConfig;

/// Build a CORS layer from config.
///
/// # Errors
/// Returns an error if `allow_credentials` is combined with a `"*"` origin.
pub fn build_cors_layer(cfg: &CorsConfig) -> Result<CorsLayer> {
    let has_wildcard_origin = cfg.allowed_origins.iter().any(|o| o == "*");

    ensure!(
        !(has_wildcard_origin && cfg.allow_credentials),
        "CORS misconfiguration: allowed_origins=['*'] cannot be combined with \
         allow_credentials=true; list explicit origins instead"
    );

    if has_wildcard_origin {
        warn!("CORS allows any origin; list explicit origins for production deployments");
    }

    let mut layer = CorsLayer::new();

    if has_wildcard_origin {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = cfg
            .allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();
        if !origins.is_empty() {
            layer = layer.allow_origin(origins);
        }
    }

    if cfg.allowed_methods.iter().any(|m| m == "*") {
        layer = layer.allow_methods(Any);
    } else {
        let methods: Vec<Method> = cfg
            .allowed_methods
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        if !methods.is_empty() {
            layer = layer.allow_methods(methods);
        }
    }

    if cfg.allowed_headers.iter().any(|h| h == "*") {
        layer = layer.allow_headers(Any);
    } else {
        let headers: Vec<HeaderName> = cfg
            .allowed_headers
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        if !headers.is_empty() {
            layer = layer.allow_headers(headers);
        }
    }

    if cfg.allow_credentials {
        layer = layer.allow_credentials(true);
    }

    if cfg.max_age_seconds > 0 {
        layer = layer.max_age(Duration::from_secs(cfg.max_age_seconds));
    }

    Ok(layer)
}
