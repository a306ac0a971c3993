use std::collections::HashMap;

use crate::error::CostSyncError;
use crate::types::{Config, MissingCostPolicy, SecretReference};

pub const API_KEY_SECRET_ARN: &str = "DATADOG_API_KEY_SECRET_ARN";
pub const API_KEY_SECRET_PATH: &str = "DATADOG_API_KEY_SECRET_PATH";
pub const APP_KEY_SECRET_ARN: &str = "DATADOG_APP_KEY_SECRET_ARN";
pub const APP_KEY_SECRET_PATH: &str = "DATADOG_APP_KEY_SECRET_PATH";
pub const SITE: &str = "DATADOG_SITE";
pub const ESTIMATED_COSTS_METRIC_NAME: &str = "ESTIMATED_COSTS_METRIC_NAME";
pub const PROJECTED_COSTS_METRIC_NAME: &str = "PROJECTED_COSTS_METRIC_NAME";
pub const MISSING_COST_POLICY: &str = "MISSING_COST_POLICY";
pub const API_URL: &str = "DATADOG_API_URL";

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Unset and empty are the same thing.
pub fn get_optional<E: EnvironmentProvider>(env: &E, name: &str) -> Option<String> {
    env.get_var(name).filter(|v| !v.is_empty())
}

pub fn get_required<E: EnvironmentProvider>(env: &E, name: &str) -> Result<String, CostSyncError> {
    get_optional(env, name).ok_or_else(|| CostSyncError::MissingConfiguration {
        names: vec![name.to_string()],
    })
}

pub fn load_config() -> Result<Config, CostSyncError> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config, CostSyncError> {
    let mut missing = Vec::new();
    let mut required = |name: &str| match get_required(env, name) {
        Ok(value) => value,
        Err(_) => {
            missing.push(name.to_string());
            String::new()
        }
    };

    let api_key_secret_arn = required(API_KEY_SECRET_ARN);
    let app_key_secret_arn = required(APP_KEY_SECRET_ARN);
    let site = required(SITE);
    let estimated_cost_metric = required(ESTIMATED_COSTS_METRIC_NAME);
    let projected_cost_metric = required(PROJECTED_COSTS_METRIC_NAME);

    if !missing.is_empty() {
        return Err(CostSyncError::MissingConfiguration { names: missing });
    }

    let missing_cost_policy = match get_optional(env, MISSING_COST_POLICY) {
        None => MissingCostPolicy::default(),
        Some(value) => parse_missing_cost_policy(&value)?,
    };

    Ok(Config {
        api_key_secret: SecretReference::new(
            api_key_secret_arn,
            get_optional(env, API_KEY_SECRET_PATH),
        ),
        app_key_secret: SecretReference::new(
            app_key_secret_arn,
            get_optional(env, APP_KEY_SECRET_PATH),
        ),
        site,
        estimated_cost_metric,
        projected_cost_metric,
        missing_cost_policy,
        api_url: get_optional(env, API_URL),
    })
}

fn parse_missing_cost_policy(value: &str) -> Result<MissingCostPolicy, CostSyncError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "skip" => Ok(MissingCostPolicy::Skip),
        "fail" => Ok(MissingCostPolicy::Fail),
        _ => Err(CostSyncError::InvalidConfiguration {
            name: MISSING_COST_POLICY.to_string(),
            value: value.to_string(),
            reason: "expected `skip` or `fail`".to_string(),
        }),
    }
}
