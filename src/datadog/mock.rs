use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{MetricsPlatform, PlatformFactory};
use crate::error::DatadogApiError;
use crate::types::{DatadogCredentials, IntakeResponse, MonthWindow, SeriesPayload};

#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    Validate,
    EstimatedCost(MonthWindow),
    ProjectedCost,
    SubmitSeries(SeriesPayload),
}

#[derive(Debug)]
struct MockState {
    valid: Result<bool, u16>,
    estimated_cost: Option<f64>,
    projected_cost: Option<f64>,
    cost_query_status: Option<u16>,
    intake_errors: Vec<String>,
    connections: Vec<(DatadogCredentials, String)>,
    calls: Vec<PlatformCall>,
}

/// Scripted, recording stand-in for the Datadog API.
///
/// Clones share state, so a test can keep one handle while the job
/// consumes another through [`PlatformFactory::connect`].
#[derive(Debug, Clone)]
pub struct MockPlatform {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                valid: Ok(true),
                estimated_cost: None,
                projected_cost: None,
                cost_query_status: None,
                intake_errors: Vec::new(),
                connections: Vec::new(),
                calls: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_valid_credentials(self, valid: bool) -> Self {
        self.state().valid = Ok(valid);
        self
    }

    /// Validation fails at the HTTP level with `status`.
    pub fn with_validation_status(self, status: u16) -> Self {
        self.state().valid = Err(status);
        self
    }

    pub fn with_estimated_cost(self, cost: Option<f64>) -> Self {
        self.state().estimated_cost = cost;
        self
    }

    pub fn with_projected_cost(self, cost: Option<f64>) -> Self {
        self.state().projected_cost = cost;
        self
    }

    /// Both cost queries fail at the HTTP level with `status`.
    pub fn with_cost_query_status(self, status: u16) -> Self {
        self.state().cost_query_status = Some(status);
        self
    }

    pub fn with_intake_errors(self, errors: Vec<String>) -> Self {
        self.state().intake_errors = errors;
        self
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state().calls.clone()
    }

    pub fn connections(&self) -> Vec<(DatadogCredentials, String)> {
        self.state().connections.clone()
    }

    pub fn submitted(&self) -> Vec<SeriesPayload> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                PlatformCall::SubmitSeries(payload) => Some(payload.clone()),
                _ => None,
            })
            .collect()
    }

    fn status_error(status: u16) -> DatadogApiError {
        DatadogApiError::Status {
            status,
            body: "mock failure".to_string(),
        }
    }
}

#[async_trait]
impl MetricsPlatform for MockPlatform {
    async fn validate(&self) -> Result<bool, DatadogApiError> {
        let mut state = self.state();
        state.calls.push(PlatformCall::Validate);
        state.valid.map_err(Self::status_error)
    }

    async fn estimated_cost(&self, window: &MonthWindow) -> Result<Option<f64>, DatadogApiError> {
        let mut state = self.state();
        state.calls.push(PlatformCall::EstimatedCost(*window));
        match state.cost_query_status {
            Some(status) => Err(Self::status_error(status)),
            None => Ok(state.estimated_cost),
        }
    }

    async fn projected_cost(&self) -> Result<Option<f64>, DatadogApiError> {
        let mut state = self.state();
        state.calls.push(PlatformCall::ProjectedCost);
        match state.cost_query_status {
            Some(status) => Err(Self::status_error(status)),
            None => Ok(state.projected_cost),
        }
    }

    async fn submit_series(&self, payload: &SeriesPayload) -> Result<IntakeResponse, DatadogApiError> {
        let mut state = self.state();
        state.calls.push(PlatformCall::SubmitSeries(payload.clone()));
        Ok(IntakeResponse {
            errors: state.intake_errors.clone(),
        })
    }
}

impl PlatformFactory for MockPlatform {
    type Platform = MockPlatform;

    fn connect(&self, credentials: DatadogCredentials, site: &str) -> MockPlatform {
        self.state().connections.push((credentials, site.to_string()));
        self.clone()
    }
}
