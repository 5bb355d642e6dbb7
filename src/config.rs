//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `snykboard.toml` files. Credentials never live in the file; they come
//! from the environment or CLI flags and are combined with file settings
//! into an explicit [`ApiConfig`] handed to the client constructor.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "snykboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API endpoint settings.
    #[serde(default)]
    pub api: ApiSettings,

    /// Default output paths.
    #[serde(default)]
    pub output: OutputSettings,
}

/// Snyk API endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the REST (JSON:API) endpoints.
    #[serde(default = "default_rest_base_url")]
    pub rest_base_url: String,

    /// Base URL of the legacy v1 endpoints.
    #[serde(default = "default_v1_base_url")]
    pub v1_base_url: String,

    /// REST API version date.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Default source type for target listing (e.g. "github").
    #[serde(default = "default_source_type")]
    pub source_type: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            rest_base_url: default_rest_base_url(),
            v1_base_url: default_v1_base_url(),
            api_version: default_api_version(),
            timeout_seconds: default_timeout(),
            source_type: default_source_type(),
        }
    }
}

fn default_rest_base_url() -> String {
    "https://api.snyk.io/rest".to_string()
}

fn default_v1_base_url() -> String {
    "https://api.snyk.io/v1".to_string()
}

fn default_api_version() -> String {
    "2024-04-29".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_source_type() -> String {
    "github".to_string()
}

/// Default output file paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Flat issues CSV, written by `fetch` and read by `scatter`.
    #[serde(default = "default_csv_output")]
    pub csv: String,

    /// Activity figure JSON, written by `activity`.
    #[serde(default = "default_activity_output")]
    pub activity: String,

    /// Scatter figure JSON, written by `scatter`.
    #[serde(default = "default_scatter_output")]
    pub scatter: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            csv: default_csv_output(),
            activity: default_activity_output(),
            scatter: default_scatter_output(),
        }
    }
}

fn default_csv_output() -> String {
    "snyk_issues_flat.csv".to_string()
}

fn default_activity_output() -> String {
    "activity_figure.json".to_string()
}

fn default_scatter_output() -> String {
    "scatter_figure.json".to_string()
}

/// Runtime API configuration passed to `SnykClient::new`.
///
/// Built from file settings plus environment/CLI credentials; the core
/// transforms never see this.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Static API token sent as `Authorization: token ...`.
    pub api_token: String,
    /// Organization id.
    pub org_id: String,
    /// REST API version date.
    pub api_version: String,
    /// REST base URL.
    pub rest_base_url: String,
    /// Legacy v1 base URL.
    pub v1_base_url: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists
    /// but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings; values
    /// are only overridden when the CLI provides them explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref api_version) = args.api_version {
            self.api.api_version = api_version.clone();
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }
    }

    /// Build the runtime [`ApiConfig`], requiring credentials.
    pub fn api_config(&self, args: &crate::cli::Args) -> Result<ApiConfig> {
        let api_token = args
            .api_token
            .clone()
            .context("Snyk API token not set (use --api-token or SNYK_API_TOKEN)")?;
        let org_id = args
            .org_id
            .clone()
            .context("Snyk organization id not set (use --org-id or SNYK_ORG_ID)")?;

        Ok(ApiConfig {
            api_token,
            org_id,
            api_version: self.api.api_version.clone(),
            rest_base_url: self.api.rest_base_url.clone(),
            v1_base_url: self.api.v1_base_url.clone(),
            timeout_seconds: self.api.timeout_seconds,
        })
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.rest_base_url, "https://api.snyk.io/rest");
        assert_eq!(config.api.api_version, "2024-04-29");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.output.csv, "snyk_issues_flat.csv");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[api]
api_version = "2024-03-12"
timeout_seconds = 60

[output]
csv = "custom_issues.csv"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.api.api_version, "2024-03-12");
        assert_eq!(config.api.timeout_seconds, 60);
        assert_eq!(config.output.csv, "custom_issues.csv");
        // Untouched sections keep their defaults.
        assert_eq!(config.api.source_type, "github");
        assert_eq!(config.output.scatter, "scatter_figure.json");
    }

    #[test]
    fn test_merge_with_args_cli_wins() {
        let mut config = Config::default();
        let mut args = crate::cli::tests_support::make_args();
        args.api_version = Some("2025-01-01".to_string());
        args.timeout = Some(120);

        config.merge_with_args(&args);

        assert_eq!(config.api.api_version, "2025-01-01");
        assert_eq!(config.api.timeout_seconds, 120);
    }

    #[test]
    fn test_api_config_requires_credentials() {
        let config = Config::default();
        let mut args = crate::cli::tests_support::make_args();
        args.api_token = None;

        assert!(config.api_config(&args).is_err());

        args.api_token = Some("tok".to_string());
        args.org_id = Some("org".to_string());
        let api = config.api_config(&args).unwrap();
        assert_eq!(api.api_token, "tok");
        assert_eq!(api.org_id, "org");
        assert_eq!(api.rest_base_url, "https://api.snyk.io/rest");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[output]"));
        // Credentials must never appear in the generated file.
        assert!(!toml_str.contains("token"));
    }
}
