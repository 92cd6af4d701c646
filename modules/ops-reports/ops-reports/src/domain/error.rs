use ops_reports_sdk::errors::OpsReportsError;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Missing column: {column}")]
    MissingColumn { column: String },

    #[error("Validation error on field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Unreadable spreadsheet: {0}")]
    InvalidSpreadsheet(String),

    #[error("Upstream unavailable: {resource}")]
    UpstreamUnavailable { resource: String },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DomainError {
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn upstream_unavailable(resource: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            resource: resource.into(),
        }
    }
}

impl From<DomainError> for OpsReportsError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::MissingColumn { column } => {
                Self::validation(format!("Missing column: {column}"))
            }
            DomainError::Validation { field, message } => {
                Self::validation(format!("{field}: {message}"))
            }
            DomainError::InvalidSpreadsheet(message) => Self::validation(message),
            DomainError::UpstreamUnavailable { resource } => Self::upstream_unavailable(resource),
            DomainError::Internal(err) => {
                tracing::error!(error = ?err, "unexpected failure while building report");
                Self::internal()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_message_names_the_column() {
        let sdk: OpsReportsError = DomainError::missing_column("Voicemails").into();
        assert_eq!(
            sdk,
            OpsReportsError::validation("Missing column: Voicemails")
        );
    }

    #[test]
    fn internal_detail_is_not_forwarded() {
        let sdk: OpsReportsError = DomainError::Internal(anyhow::anyhow!("db password wrong")).into();
        assert_eq!(sdk, OpsReportsError::Internal);
        assert!(!sdk.to_string().contains("password"));
    }
}
