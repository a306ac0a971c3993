use tracing::{error, info};

use crate::datadog::MetricsPlatform;
use crate::error::{CostSyncError, DatadogApiError};

/// A platform whose credentials Datadog has accepted.
///
/// Only [`verify_credentials`] creates one, and every cost query and
/// submission takes one, so nothing is read from or written to Datadog
/// under unverified credentials.
#[derive(Debug)]
pub struct VerifiedPlatform<P> {
    inner: P,
}

impl<P> VerifiedPlatform<P> {
    pub fn platform(&self) -> &P {
        &self.inner
    }
}

pub async fn verify_credentials<P: MetricsPlatform>(
    platform: P,
    site: &str,
) -> Result<VerifiedPlatform<P>, CostSyncError> {
    match platform.validate().await {
        Ok(true) => {
            info!(site, "API key is valid");
            Ok(VerifiedPlatform { inner: platform })
        }
        Ok(false) => {
            error!(site, "API key is invalid");
            Err(CostSyncError::CredentialValidation {
                site: site.to_string(),
                source: DatadogApiError::InvalidCredentials,
            })
        }
        Err(e) => {
            error!(site, error = %e, "Error validating API key");
            Err(CostSyncError::CredentialValidation {
                site: site.to_string(),
                source: e,
            })
        }
    }
}
