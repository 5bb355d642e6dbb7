//! Snyk HTTP client.
//!
//! Thin wrapper over the Snyk REST (JSON:API) and legacy v1 endpoints.
//! Fetches a single page per call (`limit=50`, matching the upstream
//! scripts); retry and pagination policy intentionally live elsewhere.

use crate::config::ApiConfig;
use crate::models::{IntegrationSettings, Issue, JsonApiDocument, Target};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Page size for list endpoints.
const PAGE_LIMIT: usize = 50;

/// Accept header for the REST (JSON:API) endpoints.
const JSON_API_ACCEPT: &str = "application/vnd.api+json";

/// Accept header for the legacy v1 endpoints.
const V1_ACCEPT: &str = "application/json; charset=utf-8";

/// Client for the Snyk APIs.
pub struct SnykClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl SnykClient {
    /// Create a client from an explicit configuration.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http, config })
    }

    /// Fetch one page of issues, typed.
    pub async fn list_issues(&self) -> Result<Vec<Issue>> {
        let doc: JsonApiDocument<Issue> = self.get_json(&self.issues_url(), JSON_API_ACCEPT).await?;
        info!("Fetched {} issues", doc.data.len());
        Ok(doc.data)
    }

    /// Fetch one page of issues as raw JSON objects.
    ///
    /// The flatten path works on the untyped tree so arbitrary attribute
    /// shapes survive into the CSV.
    pub async fn list_raw_issues(&self) -> Result<Vec<Map<String, Value>>> {
        let doc: JsonApiDocument<Map<String, Value>> =
            self.get_json(&self.issues_url(), JSON_API_ACCEPT).await?;
        info!("Fetched {} issues", doc.data.len());
        Ok(doc.data)
    }

    /// Fetch one page of targets for a source type (e.g. "github").
    pub async fn list_targets(&self, source_type: &str) -> Result<Vec<Target>> {
        let doc: JsonApiDocument<Target> = self
            .get_json(&self.targets_url(source_type), JSON_API_ACCEPT)
            .await?;
        info!("Fetched {} targets", doc.data.len());
        Ok(doc.data)
    }

    /// Fetch an integration's settings from the legacy v1 API.
    pub async fn integration_settings(&self, integration_id: &str) -> Result<IntegrationSettings> {
        self.get_json(&self.settings_url(integration_id), V1_ACCEPT)
            .await
    }

    fn issues_url(&self) -> String {
        format!(
            "{}/orgs/{}/issues?version={}&limit={}",
            self.config.rest_base_url, self.config.org_id, self.config.api_version, PAGE_LIMIT
        )
    }

    fn targets_url(&self, source_type: &str) -> String {
        format!(
            "{}/orgs/{}/targets?version={}&source_types={}",
            self.config.rest_base_url, self.config.org_id, self.config.api_version, source_type
        )
    }

    fn settings_url(&self, integration_id: &str) -> String {
        format!(
            "{}/org/{}/integrations/{}/settings",
            self.config.v1_base_url, self.config.org_id, integration_id
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, accept: &str) -> Result<T> {
        debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .header("Accept", accept)
            .header("Authorization", format!("token {}", self.config.api_token))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!(
                        "Request timed out after {}s",
                        self.config.timeout_seconds
                    )
                } else if e.is_connect() {
                    anyhow::anyhow!("Cannot connect to Snyk API at {}", url)
                } else {
                    anyhow::anyhow!("Failed to send request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Snyk API error {}: {}", status, body));
        }

        response.json().await.context("Failed to parse Snyk response")
    }
}

/// Keep only the targets that belong to the given integration.
pub fn filter_targets_by_integration(targets: Vec<Target>, integration_id: &str) -> Vec<Target> {
    targets
        .into_iter()
        .filter(|t| t.integration_id() == Some(integration_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ApiConfig {
        ApiConfig {
            api_token: "secret".to_string(),
            org_id: "org-1".to_string(),
            api_version: "2024-04-29".to_string(),
            rest_base_url: "https://api.snyk.io/rest".to_string(),
            v1_base_url: "https://api.snyk.io/v1".to_string(),
            timeout_seconds: 30,
        }
    }

    fn target_with_integration(id: &str, integration: Option<&str>) -> Target {
        serde_json::from_value(match integration {
            Some(integration) => serde_json::json!({
                "id": id,
                "relationships": {"integration": {"data": {"id": integration}}}
            }),
            None => serde_json::json!({"id": id}),
        })
        .unwrap()
    }

    #[test]
    fn test_issues_url() {
        let client = SnykClient::new(test_config()).unwrap();
        assert_eq!(
            client.issues_url(),
            "https://api.snyk.io/rest/orgs/org-1/issues?version=2024-04-29&limit=50"
        );
    }

    #[test]
    fn test_targets_url() {
        let client = SnykClient::new(test_config()).unwrap();
        assert_eq!(
            client.targets_url("github"),
            "https://api.snyk.io/rest/orgs/org-1/targets?version=2024-04-29&source_types=github"
        );
    }

    #[test]
    fn test_settings_url() {
        let client = SnykClient::new(test_config()).unwrap();
        assert_eq!(
            client.settings_url("int-9"),
            "https://api.snyk.io/v1/org/org-1/integrations/int-9/settings"
        );
    }

    #[test]
    fn test_filter_targets_by_integration() {
        let targets = vec![
            target_with_integration("t1", Some("int-9")),
            target_with_integration("t2", Some("other")),
            target_with_integration("t3", None),
            target_with_integration("t4", Some("int-9")),
        ];

        let kept = filter_targets_by_integration(targets, "int-9");

        let ids: Vec<_> = kept.iter().map(|t| t.id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["t1", "t4"]);
    }
}
