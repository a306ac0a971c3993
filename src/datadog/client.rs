use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error};

use super::{MetricsPlatform, PlatformFactory};
use crate::error::DatadogApiError;
use crate::types::{DatadogCredentials, IntakeResponse, MonthWindow, SeriesPayload};

const API_KEY_HEADER: &str = "DD-API-KEY";
const APP_KEY_HEADER: &str = "DD-APPLICATION-KEY";

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    #[serde(default)]
    valid: bool,
}

#[derive(Debug, Deserialize)]
struct DataList<A> {
    #[serde(default = "Vec::new")]
    data: Vec<DataItem<A>>,
}

#[derive(Debug, Deserialize)]
struct DataItem<A> {
    attributes: Option<A>,
}

#[derive(Debug, Deserialize)]
struct EstimatedCostAttributes {
    total_cost: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProjectedCostAttributes {
    projected_total_cost: Option<f64>,
}

impl<A> DataList<A> {
    fn first_attributes(self) -> Option<A> {
        self.data.into_iter().next().and_then(|item| item.attributes)
    }
}

/// HTTP client for one Datadog site.
pub struct DatadogClient {
    http: reqwest::Client,
    base_url: String,
    credentials: DatadogCredentials,
}

impl DatadogClient {
    pub fn new(credentials: DatadogCredentials, site: &str) -> Self {
        Self::with_base_url(credentials, format!("https://api.{}", site))
    }

    pub fn with_base_url(credentials: DatadogCredentials, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, &self.credentials.api_key)
            .header(APP_KEY_HEADER, &self.credentials.app_key)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, DatadogApiError> {
        let res = request.send().await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            error!(status = status.as_u16(), body = %body, "Datadog request failed");
            return Err(DatadogApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        debug!(status = status.as_u16(), "Datadog request succeeded");
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl MetricsPlatform for DatadogClient {
    async fn validate(&self) -> Result<bool, DatadogApiError> {
        // validation only takes the API key
        let request = self
            .http
            .get(self.url("/api/v1/validate"))
            .header(API_KEY_HEADER, &self.credentials.api_key);
        let response: ValidateResponse = self.send(request).await?;
        Ok(response.valid)
    }

    async fn estimated_cost(&self, window: &MonthWindow) -> Result<Option<f64>, DatadogApiError> {
        let start_month = window.start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let end_month = window.end.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let request = self
            .authenticated(self.http.get(self.url("/api/v2/usage/estimated_cost")))
            .query(&[("start_month", start_month), ("end_month", end_month)]);
        let response: DataList<EstimatedCostAttributes> = self.send(request).await?;
        Ok(response.first_attributes().and_then(|a| a.total_cost))
    }

    async fn projected_cost(&self) -> Result<Option<f64>, DatadogApiError> {
        let request = self.authenticated(self.http.get(self.url("/api/v2/usage/projected_cost")));
        let response: DataList<ProjectedCostAttributes> = self.send(request).await?;
        Ok(response.first_attributes().and_then(|a| a.projected_total_cost))
    }

    async fn submit_series(&self, payload: &SeriesPayload) -> Result<IntakeResponse, DatadogApiError> {
        let request = self
            .http
            .post(self.url("/api/v2/series"))
            .header(API_KEY_HEADER, &self.credentials.api_key)
            .json(payload);
        self.send(request).await
    }
}

/// Connects to `https://api.{site}` unless a base URL override is set.
#[derive(Debug, Clone, Default)]
pub struct DatadogClientFactory {
    base_url_override: Option<String>,
}

impl DatadogClientFactory {
    pub fn new(base_url_override: Option<String>) -> Self {
        Self { base_url_override }
    }
}

impl PlatformFactory for DatadogClientFactory {
    type Platform = DatadogClient;

    fn connect(&self, credentials: DatadogCredentials, site: &str) -> DatadogClient {
        match &self.base_url_override {
            Some(url) => DatadogClient::with_base_url(credentials, url.clone()),
            None => DatadogClient::new(credentials, site),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mockito::{Matcher, Server};

    fn credentials() -> DatadogCredentials {
        DatadogCredentials {
            api_key: "KEY1".to_string(),
            app_key: "KEY2".to_string(),
        }
    }

    #[test]
    fn test_factory_builds_site_url() {
        let client = DatadogClientFactory::default().connect(credentials(), "datadoghq.eu");
        assert_eq!(client.base_url(), "https://api.datadoghq.eu");

        let client = DatadogClientFactory::new(Some("http://127.0.0.1:9000/".to_string()))
            .connect(credentials(), "datadoghq.eu");
        assert_eq!(client.base_url(), "http://127.0.0.1:9000");
    }

    #[tokio::test]
    async fn test_validate() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/validate")
            .match_header("DD-API-KEY", "KEY1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"valid":true}"#)
            .create_async()
            .await;

        let client = DatadogClient::with_base_url(credentials(), server.url());
        assert!(client.validate().await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_validate_forbidden_is_status_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/validate")
            .with_status(403)
            .with_body(r#"{"errors":["Forbidden"]}"#)
            .create_async()
            .await;

        let client = DatadogClient::with_base_url(credentials(), server.url());
        match client.validate().await {
            Err(DatadogApiError::Status { status, body }) => {
                assert_eq!(status, 403);
                assert!(body.contains("Forbidden"));
            }
            other => panic!("expected Status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_estimated_cost_sends_month_window() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v2/usage/estimated_cost")
            .match_header("DD-API-KEY", "KEY1")
            .match_header("DD-APPLICATION-KEY", "KEY2")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("start_month".into(), "2024-03-01T00:00:00Z".into()),
                Matcher::UrlEncoded("end_month".into(), "2024-04-01T00:00:00Z".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"data":[{"id":"1","type":"cost_by_org","attributes":{"org_name":"acme","total_cost":42.5}}]}"#,
            )
            .create_async()
            .await;

        let window = MonthWindow {
            start: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
        };
        let client = DatadogClient::with_base_url(credentials(), server.url());
        assert_eq!(client.estimated_cost(&window).await.unwrap(), Some(42.5));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_projected_cost_missing_values() {
        for body in [r#"{"data":[]}"#, r#"{}"#, r#"{"data":[{"attributes":{"org_name":"acme"}}]}"#] {
            let mut server = Server::new_async().await;
            let _mock = server
                .mock("GET", "/api/v2/usage/projected_cost")
                .with_status(200)
                .with_body(body)
                .create_async()
                .await;
            let client = DatadogClient::with_base_url(credentials(), server.url());
            assert_eq!(client.projected_cost().await.unwrap(), None, "body: {}", body);
        }

        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v2/usage/projected_cost")
            .match_header("DD-APPLICATION-KEY", "KEY2")
            .with_status(200)
            .with_body(r#"{"data":[{"attributes":{"projected_total_cost":100.0}}]}"#)
            .create_async()
            .await;
        let client = DatadogClient::with_base_url(credentials(), server.url());
        assert_eq!(client.projected_cost().await.unwrap(), Some(100.0));
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v2/usage/projected_cost")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let client = DatadogClient::with_base_url(credentials(), server.url());
        assert!(matches!(
            client.projected_cost().await,
            Err(DatadogApiError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_series_returns_intake_errors() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/series")
            .match_header("DD-API-KEY", "KEY1")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Regex(r#""metric":"cost.est""#.to_string()))
            .with_status(202)
            .with_body(r#"{"errors":["metric cost.est: invalid point"]}"#)
            .create_async()
            .await;

        let payload = SeriesPayload {
            series: vec![crate::types::Series {
                metric: "cost.est".to_string(),
                metric_type: 3,
                points: vec![crate::types::Point { timestamp: 1, value: 1.0 }],
                unit: "dollar".to_string(),
            }],
        };
        let client = DatadogClient::with_base_url(credentials(), server.url());
        let response = client.submit_series(&payload).await.unwrap();
        assert_eq!(response.errors, vec!["metric cost.est: invalid point"]);
        mock.assert_async().await;
    }
}
