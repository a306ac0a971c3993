use chrono::{DateTime, Utc};
use tracing::info;

use crate::costs::{apply_missing_cost_policy, fetch_estimated_cost, fetch_projected_cost};
use crate::dates::truncate_to_seconds;
use crate::datadog::PlatformFactory;
use crate::error::CostSyncError;
use crate::gate::verify_credentials;
use crate::secrets::{resolve_secret, SecretStore};
use crate::submit::submit_metrics;
use crate::types::{Config, CostKind, CostMetric, DatadogCredentials};

/// One cost synchronization: secrets, validation, cost queries, submission.
pub struct CostMetricsJob<S, F> {
    config: Config,
    secrets: S,
    platforms: F,
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub timestamp: DateTime<Utc>,
    pub submitted: Vec<CostMetric>,
    pub skipped: Vec<CostKind>,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

impl<S, F> CostMetricsJob<S, F>
where
    S: SecretStore,
    F: PlatformFactory,
{
    pub fn new(config: Config, secrets: S, platforms: F) -> Self {
        Self {
            config,
            secrets,
            platforms,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunSummary, CostSyncError> {
        let cfg = &self.config;
        info!(
            api_key_secret = %cfg.api_key_secret.secret_id,
            api_key_secret_path = cfg.api_key_secret.path.as_deref(),
            app_key_secret = %cfg.app_key_secret.secret_id,
            app_key_secret_path = cfg.app_key_secret.path.as_deref(),
            site = %cfg.site,
            estimated_costs_metric = %cfg.estimated_cost_metric,
            projected_costs_metric = %cfg.projected_cost_metric,
            "Starting"
        );

        let credentials = DatadogCredentials {
            api_key: resolve_secret(&self.secrets, &cfg.api_key_secret).await?,
            app_key: resolve_secret(&self.secrets, &cfg.app_key_secret).await?,
        };
        info!(site = %cfg.site, "Datadog API key and app key retrieved");

        let platform = self.platforms.connect(credentials, &cfg.site);
        let platform = verify_credentials(platform, &cfg.site).await?;

        let timestamp = truncate_to_seconds(now);
        let mut metrics = Vec::with_capacity(2);
        let mut skipped = Vec::new();

        let estimated = fetch_estimated_cost(&platform, &timestamp).await?;
        match apply_missing_cost_policy(CostKind::Estimated, estimated, cfg.missing_cost_policy)? {
            Some(value) => metrics.push(CostMetric::new(cfg.estimated_cost_metric.as_str(), value)),
            None => skipped.push(CostKind::Estimated),
        }

        let projected = fetch_projected_cost(&platform).await?;
        match apply_missing_cost_policy(CostKind::Projected, projected, cfg.missing_cost_policy)? {
            Some(value) => metrics.push(CostMetric::new(cfg.projected_cost_metric.as_str(), value)),
            None => skipped.push(CostKind::Projected),
        }

        submit_metrics(&platform, &metrics, timestamp).await?;

        info!(
            submitted = metrics.len(),
            skipped = skipped.len(),
            "Cost metrics run finished"
        );
        Ok(RunSummary {
            timestamp,
            submitted: metrics,
            skipped,
        })
    }
}
