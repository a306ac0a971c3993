use thiserror::Error;

use crate::types::CostKind;

/// Boxed error returned by external collaborators (secret store, runtime).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures talking to the Datadog HTTP API.
#[derive(Debug, Error)]
pub enum DatadogApiError {
    #[error("request to Datadog failed")]
    Transport(#[from] reqwest::Error),
    #[error("Datadog returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode Datadog response")]
    Decode(#[from] serde_json::Error),
    #[error("Datadog reported the API key as invalid")]
    InvalidCredentials,
}

/// Why a metric batch was not accepted.
#[derive(Debug, Error)]
pub enum SubmissionFailure {
    #[error(transparent)]
    Transport(#[from] DatadogApiError),
    #[error("Datadog rejected the batch: {}", .0.join("; "))]
    Rejected(Vec<String>),
}

/// Everything that can abort a cost synchronization run.
#[derive(Debug, Error)]
pub enum CostSyncError {
    #[error("missing required configuration: {}", .names.join(", "))]
    MissingConfiguration { names: Vec<String> },

    #[error("invalid value `{value}` for {name}: {reason}")]
    InvalidConfiguration {
        name: String,
        value: String,
        reason: String,
    },

    #[error("failed to retrieve secret {secret_id}")]
    SecretAccess {
        secret_id: String,
        #[source]
        source: BoxError,
    },

    #[error("secret {secret_id} does not hold a usable string payload")]
    SecretFormat {
        secret_id: String,
        #[source]
        source: BoxError,
    },

    #[error("key `{key}` not found in secret {secret_id} (path `{path}`)")]
    SecretPath {
        secret_id: String,
        path: String,
        key: String,
    },

    #[error("value at path `{path}` in secret {secret_id} is not a string")]
    SecretType { secret_id: String, path: String },

    #[error("failed to validate Datadog credentials for site {site}")]
    CredentialValidation {
        site: String,
        #[source]
        source: DatadogApiError,
    },

    #[error("failed to retrieve {kind} costs")]
    CostQuery {
        kind: CostKind,
        #[source]
        source: DatadogApiError,
    },

    #[error("{kind} costs are not available in the Datadog response")]
    CostDataUnavailable { kind: CostKind },

    #[error("failed to send metrics to Datadog")]
    MetricSubmission(#[source] SubmissionFailure),
}

impl CostSyncError {
    /// Per-series errors reported by Datadog, if the batch was rejected.
    pub fn rejected_series(&self) -> Option<&[String]> {
        match self {
            CostSyncError::MetricSubmission(SubmissionFailure::Rejected(errors)) => Some(errors),
            _ => None,
        }
    }
}
