// Datadog API access
pub mod client;
pub mod mock;

use async_trait::async_trait;

use crate::error::DatadogApiError;
use crate::types::{DatadogCredentials, IntakeResponse, MonthWindow, SeriesPayload};

pub use client::{DatadogClient, DatadogClientFactory};
pub use mock::{MockPlatform, PlatformCall};

/// The subset of the Datadog API the cost sync needs.
#[async_trait]
pub trait MetricsPlatform: Send + Sync {
    async fn validate(&self) -> Result<bool, DatadogApiError>;

    async fn estimated_cost(&self, window: &MonthWindow) -> Result<Option<f64>, DatadogApiError>;

    async fn projected_cost(&self) -> Result<Option<f64>, DatadogApiError>;

    async fn submit_series(&self, payload: &SeriesPayload) -> Result<IntakeResponse, DatadogApiError>;
}

/// Builds an authenticated platform handle for one run.
pub trait PlatformFactory: Send + Sync {
    type Platform: MetricsPlatform;

    fn connect(&self, credentials: DatadogCredentials, site: &str) -> Self::Platform;
}
