//! Data models for the Snyk APIs.
//!
//! This module contains the typed representations of Snyk REST and v1
//! responses used throughout the application: issues, targets, and
//! integration settings.
//!
//! Attribute fields are deliberately optional: a malformed issue should
//! degrade to a skipped record downstream, never abort deserialization
//! of the whole response.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IssueStatus {
    /// The issue is open and counts toward created activity.
    Open,
    /// The issue has been resolved; its resolution date counts toward
    /// resolved activity.
    Resolved,
    /// The issue was ignored in Snyk; it contributes to no counter.
    Ignored,
    /// Any status this build does not know about.
    Other(String),
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueStatus::Open => write!(f, "open"),
            IssueStatus::Resolved => write!(f, "resolved"),
            IssueStatus::Ignored => write!(f, "ignored"),
            IssueStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for IssueStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "open" => IssueStatus::Open,
            "resolved" => IssueStatus::Resolved,
            "ignored" => IssueStatus::Ignored,
            other => IssueStatus::Other(other.to_string()),
        }
    }
}

/// Generic JSON:API document envelope: `{ "data": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonApiDocument<T> {
    /// The primary data array.
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// A single issue as returned by `GET /rest/orgs/{org}/issues`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Issue {
    /// Top-level issue id.
    #[serde(default)]
    pub id: Option<String>,
    /// Nested attribute payload.
    #[serde(default)]
    pub attributes: IssueAttributes,
}

/// The `attributes` object of an issue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueAttributes {
    /// Human-readable issue title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Raw status string ("open", "resolved", "ignored", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Creation timestamp, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last-update timestamp, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Resolution details, present once the issue is resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

/// The `resolution` object nested in a resolved issue's attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resolution {
    /// When the issue was resolved, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
    /// Resolution kind reported by Snyk (e.g. "fix", "disappeared").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub resolution_type: Option<String>,
}

impl Issue {
    /// Typed view of the raw status string. Missing status maps to
    /// `Other("")`, which contributes to no counter.
    pub fn status(&self) -> IssueStatus {
        IssueStatus::from(self.attributes.status.as_deref().unwrap_or(""))
    }

    /// Creation timestamp truncated to a calendar date.
    pub fn created_date(&self) -> Option<NaiveDate> {
        self.attributes
            .created_at
            .as_deref()
            .and_then(parse_calendar_date)
    }

    /// Resolution timestamp truncated to a calendar date.
    pub fn resolved_date(&self) -> Option<NaiveDate> {
        self.attributes
            .resolution
            .as_ref()
            .and_then(|r| r.resolved_at.as_deref())
            .and_then(parse_calendar_date)
    }
}

/// Parse a timestamp string down to calendar-date granularity.
///
/// Accepts RFC 3339 ("2024-01-01T12:30:00Z"), offset-less ISO datetimes
/// ("2024-01-01T12:30:00"), and bare dates ("2024-01-01"). Returns `None`
/// for anything else; callers treat that as a skippable record, not an
/// error.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Extract issues from a saved issues document.
///
/// Local snapshots wrap the array as `{"issues": [...]}`, raw API pages
/// as `{"data": [...]}`; a bare array also works. Null and non-object
/// entries are dropped, the way the downstream scan skips rather than
/// aborts.
pub fn parse_issues_document(value: serde_json::Value) -> Vec<Issue> {
    let entries = match value {
        serde_json::Value::Array(entries) => entries,
        serde_json::Value::Object(mut map) => {
            match map.remove("issues").or_else(|| map.remove("data")) {
                Some(serde_json::Value::Array(entries)) => entries,
                _ => return Vec::new(),
            }
        }
        _ => return Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<Issue>(entry).ok())
        .collect()
}

/// A target as returned by `GET /rest/orgs/{org}/targets`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Target {
    /// Top-level target id.
    #[serde(default)]
    pub id: Option<String>,
    /// Nested attribute payload.
    #[serde(default)]
    pub attributes: TargetAttributes,
    /// Relationship links; carries the owning integration.
    #[serde(default)]
    pub relationships: TargetRelationships,
}

/// The `attributes` object of a target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetAttributes {
    /// Display name, usually `owner/repo`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Target URL if Snyk knows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// The `relationships` object of a target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetRelationships {
    /// The integration that imported this target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration: Option<RelationshipRef>,
}

/// A JSON:API relationship wrapper: `{ "data": { "id": ... } }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipRef {
    /// The related resource identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResourceId>,
}

/// A bare JSON:API resource identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceId {
    /// Resource id.
    #[serde(default)]
    pub id: Option<String>,
}

impl Target {
    /// Id of the integration this target belongs to, if present.
    pub fn integration_id(&self) -> Option<&str> {
        self.relationships
            .integration
            .as_ref()
            .and_then(|rel| rel.data.as_ref())
            .and_then(|data| data.id.as_deref())
    }

    /// Best-effort label for printing: display name, then url, then id.
    pub fn label(&self) -> &str {
        self.attributes
            .display_name
            .as_deref()
            .or(self.attributes.url.as_deref())
            .or(self.id.as_deref())
            .unwrap_or("<unnamed target>")
    }
}

/// Integration settings from the legacy v1 API
/// (`GET /v1/org/{org}/integrations/{integration}/settings`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationSettings {
    /// Whether Snyk tests pull requests for this integration.
    #[serde(default)]
    pub pull_request_test_enabled: bool,
    /// Whether failing PR checks block merges.
    #[serde(default)]
    pub pull_request_fail_on_any_vulns: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_str() {
        assert_eq!(IssueStatus::from("open"), IssueStatus::Open);
        assert_eq!(IssueStatus::from("Resolved"), IssueStatus::Resolved);
        assert_eq!(IssueStatus::from("IGNORED"), IssueStatus::Ignored);
        assert_eq!(
            IssueStatus::from("pending"),
            IssueStatus::Other("pending".to_string())
        );
    }

    #[test]
    fn test_parse_calendar_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_calendar_date("2024-01-15T08:30:00Z"), Some(expected));
        assert_eq!(
            parse_calendar_date("2024-01-15T08:30:00.123456Z"),
            Some(expected)
        );
        assert_eq!(parse_calendar_date("2024-01-15T08:30:00"), Some(expected));
        assert_eq!(parse_calendar_date("2024-01-15"), Some(expected));
        assert_eq!(parse_calendar_date("not a date"), None);
        assert_eq!(parse_calendar_date(""), None);
    }

    #[test]
    fn test_issue_deserializes_leniently() {
        // A bare issue with nothing but an id must still parse.
        let issue: Issue = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(issue.id.as_deref(), Some("abc"));
        assert_eq!(issue.status(), IssueStatus::Other(String::new()));
        assert!(issue.created_date().is_none());
    }

    #[test]
    fn test_issue_dates() {
        let issue: Issue = serde_json::from_str(
            r#"{
                "id": "abc",
                "attributes": {
                    "status": "resolved",
                    "created_at": "2024-01-01T10:00:00Z",
                    "resolution": {"resolved_at": "2024-01-03T09:00:00Z"}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(issue.status(), IssueStatus::Resolved);
        assert_eq!(issue.created_date(), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(issue.resolved_date(), NaiveDate::from_ymd_opt(2024, 1, 3));
    }

    #[test]
    fn test_target_integration_id() {
        let target: Target = serde_json::from_str(
            r#"{
                "id": "t1",
                "attributes": {"display_name": "acme/api"},
                "relationships": {"integration": {"data": {"id": "int-9"}}}
            }"#,
        )
        .unwrap();

        assert_eq!(target.integration_id(), Some("int-9"));
        assert_eq!(target.label(), "acme/api");

        let bare: Target = serde_json::from_str(r#"{"id": "t2"}"#).unwrap();
        assert_eq!(bare.integration_id(), None);
        assert_eq!(bare.label(), "t2");
    }

    #[test]
    fn test_integration_settings_camel_case() {
        let settings: IntegrationSettings =
            serde_json::from_str(r#"{"pullRequestTestEnabled": true}"#).unwrap();
        assert!(settings.pull_request_test_enabled);
        assert!(!settings.pull_request_fail_on_any_vulns);
    }

    #[test]
    fn test_parse_issues_document_shapes() {
        let from_issues = serde_json::json!({"issues": [{"id": "a"}, null, 42]});
        let parsed = parse_issues_document(from_issues);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id.as_deref(), Some("a"));

        let from_data = serde_json::json!({"data": [{"id": "a"}, {"id": "b"}]});
        assert_eq!(parse_issues_document(from_data).len(), 2);

        let bare = serde_json::json!([{"id": "a"}]);
        assert_eq!(parse_issues_document(bare).len(), 1);

        assert!(parse_issues_document(serde_json::json!({"other": []})).is_empty());
        assert!(parse_issues_document(serde_json::json!("nope")).is_empty());
    }

    #[test]
    fn test_json_api_document() {
        let doc: JsonApiDocument<Issue> =
            serde_json::from_str(r#"{"data": [{"id": "a"}, {"id": "b"}]}"#).unwrap();
        assert_eq!(doc.data.len(), 2);

        // Missing "data" degrades to an empty page.
        let empty: JsonApiDocument<Issue> = serde_json::from_str("{}").unwrap();
        assert!(empty.data.is_empty());
    }
}
