// Public modules
pub mod types;
pub mod error;
pub mod config;
pub mod dates;
pub mod secrets;
pub mod datadog;
pub mod gate;
pub mod costs;
pub mod submit;
pub mod job;

// Re-export commonly used items
pub use types::*;
pub use error::{BoxError, CostSyncError, DatadogApiError, SubmissionFailure};
pub use config::{load_config, load_config_with_env, EnvironmentProvider, SystemEnvironment, MockEnvironment};
pub use dates::{month_window, start_of_month, start_of_next_month, truncate_to_seconds};
pub use secrets::{extract_at_path, resolve_secret, AwsSecretStore, MockSecretStore, SecretStore};
pub use datadog::{DatadogClient, DatadogClientFactory, MetricsPlatform, MockPlatform, PlatformCall, PlatformFactory};
pub use gate::{verify_credentials, VerifiedPlatform};
pub use costs::{apply_missing_cost_policy, fetch_estimated_cost, fetch_projected_cost};
pub use submit::{build_series_payload, submit_metrics};
pub use job::{CostMetricsJob, RunSummary};
