use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key_secret: SecretReference,
    pub app_key_secret: SecretReference,
    pub site: String,
    pub estimated_cost_metric: String,
    pub projected_cost_metric: String,
    pub missing_cost_policy: MissingCostPolicy,
    pub api_url: Option<String>,
}

/// A secret id plus an optional dotted JSON path inside the secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretReference {
    pub secret_id: String,
    pub path: Option<String>,
}

impl SecretReference {
    pub fn new(secret_id: impl Into<String>, path: Option<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            path,
        }
    }
}

/// What to do when Datadog answers a cost query without a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingCostPolicy {
    /// Log and leave the metric out of the batch.
    #[default]
    Skip,
    /// Abort the run.
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostKind {
    Estimated,
    Projected,
}

impl fmt::Display for CostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostKind::Estimated => f.write_str("estimated"),
            CostKind::Projected => f.write_str("projected"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct DatadogCredentials {
    pub api_key: String,
    pub app_key: String,
}

// Keys must never reach the logs.
impl fmt::Debug for DatadogCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatadogCredentials")
            .field("api_key", &"<redacted>")
            .field("app_key", &"<redacted>")
            .finish()
    }
}

/// Half-open interval `[start, end)` covering one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostMetric {
    pub name: String,
    pub value: f64,
}

impl CostMetric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Body of `POST /api/v2/series`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPayload {
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub metric: String,
    #[serde(rename = "type")]
    pub metric_type: u8,
    pub points: Vec<Point>,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub timestamp: i64,
    pub value: f64,
}

/// Intake answer; `errors` is non-empty when some series were refused.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IntakeResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}
