use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::datadog::MetricsPlatform;
use crate::error::{CostSyncError, SubmissionFailure};
use crate::gate::VerifiedPlatform;
use crate::types::{CostMetric, Point, Series, SeriesPayload};

pub const COST_UNIT: &str = "dollar";

/// Datadog intake type code for gauges.
pub const GAUGE_TYPE: u8 = 3;

pub fn build_series_payload(metrics: &[CostMetric], timestamp: DateTime<Utc>) -> SeriesPayload {
    let ts = timestamp.timestamp();
    SeriesPayload {
        series: metrics
            .iter()
            .map(|m| Series {
                metric: m.name.clone(),
                metric_type: GAUGE_TYPE,
                points: vec![Point {
                    timestamp: ts,
                    value: m.value,
                }],
                unit: COST_UNIT.to_string(),
            })
            .collect(),
    }
}

/// Sends all metrics in one batch. Returns how many series were sent.
pub async fn submit_metrics<P: MetricsPlatform>(
    platform: &VerifiedPlatform<P>,
    metrics: &[CostMetric],
    timestamp: DateTime<Utc>,
) -> Result<usize, CostSyncError> {
    if metrics.is_empty() {
        info!("No metrics to send to Datadog");
        return Ok(0);
    }

    let payload = build_series_payload(metrics, timestamp);
    let names: Vec<&str> = metrics.iter().map(|m| m.name.as_str()).collect();
    info!(metrics = ?names, timestamp = timestamp.timestamp(), "Sending metrics to Datadog");

    let response = match platform.platform().submit_series(&payload).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "Error sending metrics to Datadog");
            return Err(CostSyncError::MetricSubmission(SubmissionFailure::Transport(e)));
        }
    };

    if !response.errors.is_empty() {
        error!(errors = ?response.errors, "Errors sending metrics to Datadog");
        return Err(CostSyncError::MetricSubmission(SubmissionFailure::Rejected(
            response.errors,
        )));
    }

    info!(count = payload.series.len(), "Metrics sent to Datadog");
    Ok(payload.series.len())
}
