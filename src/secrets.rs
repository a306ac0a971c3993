use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use crate::error::{BoxError, CostSyncError};
use crate::types::SecretReference;

/// Read-only access to a secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// `Ok(None)` means the secret exists but has no string payload.
    async fn fetch(&self, secret_id: &str) -> Result<Option<String>, BoxError>;
}

/// AWS Secrets Manager backed store.
pub struct AwsSecretStore {
    client: aws_sdk_secretsmanager::Client,
}

impl AwsSecretStore {
    pub fn new(client: aws_sdk_secretsmanager::Client) -> Self {
        Self { client }
    }

    /// Uses the default credential and region chain.
    pub async fn from_env() -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_secretsmanager::Client::new(&sdk_config))
    }
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    async fn fetch(&self, secret_id: &str) -> Result<Option<String>, BoxError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| BoxError::from(DisplayErrorContext(e).to_string()))?;
        Ok(output.secret_string().map(str::to_string))
    }
}

/// In-memory store for tests; records every requested id.
#[derive(Debug, Default)]
pub struct MockSecretStore {
    secrets: HashMap<String, MockSecret>,
    requests: Mutex<Vec<String>>,
}

#[derive(Debug, Clone)]
enum MockSecret {
    Text(String),
    Binary,
    Denied(String),
}

impl MockSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, secret_id: impl Into<String>, payload: impl Into<String>) -> Self {
        self.secrets
            .insert(secret_id.into(), MockSecret::Text(payload.into()));
        self
    }

    pub fn with_binary_secret(mut self, secret_id: impl Into<String>) -> Self {
        self.secrets.insert(secret_id.into(), MockSecret::Binary);
        self
    }

    pub fn with_denied_secret(mut self, secret_id: impl Into<String>, reason: impl Into<String>) -> Self {
        self.secrets
            .insert(secret_id.into(), MockSecret::Denied(reason.into()));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SecretStore for MockSecretStore {
    async fn fetch(&self, secret_id: &str) -> Result<Option<String>, BoxError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(secret_id.to_string());
        match self.secrets.get(secret_id) {
            Some(MockSecret::Text(payload)) => Ok(Some(payload.clone())),
            Some(MockSecret::Binary) => Ok(None),
            Some(MockSecret::Denied(reason)) => Err(reason.clone().into()),
            None => Err(format!("secret {} not found", secret_id).into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum PathLookupError {
    #[error("secret payload is not valid JSON")]
    InvalidJson(#[from] serde_json::Error),
    #[error("key not found in JSON: {0}")]
    MissingKey(String),
    #[error("value is not a string")]
    NotAString,
}

/// Walks a dotted path (`a.b.0.c`) through a JSON document.
pub fn extract_at_path(payload: &str, path: &str) -> Result<String, PathLookupError> {
    let document: Value = serde_json::from_str(payload)?;
    let mut value = &document;
    for key in path.split('.') {
        let next = match value {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        value = next.ok_or_else(|| PathLookupError::MissingKey(key.to_string()))?;
    }
    match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(PathLookupError::NotAString),
    }
}

pub async fn resolve_secret<S: SecretStore + ?Sized>(
    store: &S,
    reference: &SecretReference,
) -> Result<String, CostSyncError> {
    let secret_id = reference.secret_id.as_str();
    info!(secret_id, path = reference.path.as_deref(), "Retrieving secret");

    let payload = match store.fetch(secret_id).await {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            error!(secret_id, "Secret is not a string");
            return Err(CostSyncError::SecretFormat {
                secret_id: secret_id.to_string(),
                source: "secret has no string payload".into(),
            });
        }
        Err(e) => {
            error!(secret_id, error = %e, "Error retrieving secret");
            return Err(CostSyncError::SecretAccess {
                secret_id: secret_id.to_string(),
                source: e,
            });
        }
    };

    let Some(path) = reference.path.as_deref() else {
        return Ok(payload.trim().to_string());
    };

    match extract_at_path(&payload, path) {
        Ok(value) => Ok(value.trim().to_string()),
        Err(e) => {
            error!(secret_id, path, error = %e, "Error extracting value from secret");
            Err(match e {
                PathLookupError::InvalidJson(source) => CostSyncError::SecretFormat {
                    secret_id: secret_id.to_string(),
                    source: Box::new(source),
                },
                PathLookupError::MissingKey(key) => CostSyncError::SecretPath {
                    secret_id: secret_id.to_string(),
                    path: path.to_string(),
                    key,
                },
                PathLookupError::NotAString => CostSyncError::SecretType {
                    secret_id: secret_id.to_string(),
                    path: path.to_string(),
                },
            })
        }
    }
}
