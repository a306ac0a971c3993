use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use lambda_runtime::{service_fn, LambdaEvent};
use tracing::info;

use datadog_costs_metrics_sender::{load_config, AwsSecretStore, CostMetricsJob, DatadogClientFactory};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cfg = load_config().context("Invalid configuration")?;
    info!(site = %cfg.site, "Configuration retrieved from environment");

    let secrets = AwsSecretStore::from_env().await;
    let factory = DatadogClientFactory::new(cfg.api_url.clone());
    let job = Arc::new(CostMetricsJob::new(cfg, secrets, factory));

    // Outside Lambda (cron, container job, local) do a single run.
    if std::env::var_os("AWS_LAMBDA_RUNTIME_API").is_none() {
        let summary = job.run(Utc::now()).await?;
        info!(submitted = summary.submitted.len(), "Single run complete");
        return Ok(());
    }

    // The scheduled event carries nothing we need.
    lambda_runtime::run(service_fn(move |_event: LambdaEvent<serde_json::Value>| {
        let job = Arc::clone(&job);
        async move {
            job.run(Utc::now())
                .await
                .map(|_| ())
                .map_err(lambda_runtime::Error::from)
        }
    }))
    .await
    .map_err(|e| anyhow!(e))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_current_span(false)
        .try_init();
}
