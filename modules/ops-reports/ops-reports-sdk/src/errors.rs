//! Error types for the ops-reports SDK.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpsReportsError {
    /// The caller supplied input the report cannot work with.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The first page of an upstream listing could not be fetched.
    #[error("Upstream unavailable: {resource}")]
    UpstreamUnavailable { resource: String },

    #[error("Internal error")]
    Internal,
}

impl OpsReportsError {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn upstream_unavailable(resource: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            resource: resource.into(),
        }
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::Internal
    }
}
