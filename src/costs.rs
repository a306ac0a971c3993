use chrono::{DateTime, TimeZone};
use tracing::{error, info, warn};

use crate::dates::month_window;
use crate::datadog::MetricsPlatform;
use crate::error::CostSyncError;
use crate::gate::VerifiedPlatform;
use crate::types::{CostKind, MissingCostPolicy};

/// Month-to-date cost for the organization, for the month containing `now`.
pub async fn fetch_estimated_cost<P, Tz>(
    platform: &VerifiedPlatform<P>,
    now: &DateTime<Tz>,
) -> Result<Option<f64>, CostSyncError>
where
    P: MetricsPlatform,
    Tz: TimeZone,
{
    let window = month_window(now);
    info!(
        start_month = %window.start,
        end_month = %window.end,
        "Retrieving estimated costs"
    );
    let cost = platform
        .platform()
        .estimated_cost(&window)
        .await
        .map_err(|e| query_failed(CostKind::Estimated, e))?;
    info!(estimated_costs = ?cost, "Estimated costs");
    Ok(cost)
}

/// Forecast for the current billing period.
pub async fn fetch_projected_cost<P: MetricsPlatform>(
    platform: &VerifiedPlatform<P>,
) -> Result<Option<f64>, CostSyncError> {
    info!("Retrieving projected costs");
    let cost = platform
        .platform()
        .projected_cost()
        .await
        .map_err(|e| query_failed(CostKind::Projected, e))?;
    info!(projected_costs = ?cost, "Projected costs");
    Ok(cost)
}

/// Decides what an absent cost means for the run.
pub fn apply_missing_cost_policy(
    kind: CostKind,
    cost: Option<f64>,
    policy: MissingCostPolicy,
) -> Result<Option<f64>, CostSyncError> {
    match (cost, policy) {
        (Some(value), _) => Ok(Some(value)),
        (None, MissingCostPolicy::Skip) => {
            warn!(%kind, "No cost value returned, skipping metric");
            Ok(None)
        }
        (None, MissingCostPolicy::Fail) => {
            error!(%kind, "No cost value returned");
            Err(CostSyncError::CostDataUnavailable { kind })
        }
    }
}

fn query_failed(kind: CostKind, source: crate::error::DatadogApiError) -> CostSyncError {
    error!(%kind, error = %source, "Error retrieving costs");
    CostSyncError::CostQuery { kind, source }
}
