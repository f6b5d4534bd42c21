use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Plan tier the rebuild workflow manages and recreates by default
pub const FREE_PLAN: &str = "free";

/// Account that owns every resource touched by a rebuild
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Kind of a compute service on the control plane
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    WebService,
    PrivateService,
    BackgroundWorker,
    StaticSite,
    CronJob,
    #[serde(other)]
    Other,
}

/// A compute service that may depend on the database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ServiceKind,
    #[serde(default)]
    pub suspended: Option<String>,
}

impl Service {
    /// Only web services are redeployed by the rebuild workflow
    pub fn is_redeployable(&self) -> bool {
        self.kind == ServiceKind::WebService
    }
}

/// Provisioning status reported for a managed database
///
/// Unknown values reported by the control plane are preserved verbatim in
/// [`DatabaseStatus::Other`] so they can be surfaced in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DatabaseStatus {
    Creating,
    Available,
    Unavailable,
    Suspended,
    RecoveryFailed,
    Other(String),
}

impl DatabaseStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DatabaseStatus::Creating => "creating",
            DatabaseStatus::Available => "available",
            DatabaseStatus::Unavailable => "unavailable",
            DatabaseStatus::Suspended => "suspended",
            DatabaseStatus::RecoveryFailed => "recovery_failed",
            DatabaseStatus::Other(value) => value,
        }
    }

    /// `creating` is the only transitional status; everything else is terminal
    pub fn is_transitional(&self) -> bool {
        matches!(self, DatabaseStatus::Creating)
    }
}

impl From<String> for DatabaseStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "creating" => DatabaseStatus::Creating,
            "available" => DatabaseStatus::Available,
            "unavailable" => DatabaseStatus::Unavailable,
            "suspended" => DatabaseStatus::Suspended,
            "recovery_failed" => DatabaseStatus::RecoveryFailed,
            _ => DatabaseStatus::Other(value),
        }
    }
}

impl From<DatabaseStatus> for String {
    fn from(status: DatabaseStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for DatabaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A managed PostgreSQL database on the control plane
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseResource {
    pub id: String,
    pub name: String,
    pub status: DatabaseStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl DatabaseResource {
    pub fn is_free_tier(&self) -> bool {
        self.plan.as_deref() == Some(FREE_PLAN)
    }
}

/// Connection strings for a database. Never logged.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub internal_connection_string: String,
    #[serde(default)]
    pub external_connection_string: Option<String>,
    #[serde(default)]
    pub psql_command: Option<String>,
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("internal_connection_string", &"<redacted>")
            .field(
                "external_connection_string",
                &self.external_connection_string.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Event types emitted on a service's event feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeployEventType {
    DeployStarted,
    DeployEnded,
    BuildStarted,
    BuildEnded,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeployEventDetails {
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub deploy_id: Option<String>,
}

/// One entry from a service's event feed, newest first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeployEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: DeployEventType,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub details: DeployEventDetails,
}

/// Handle returned when a deploy is triggered
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Deploy {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Final outcome of a deploy as reported by a `deploy_ended` event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeployOutcome {
    Deployed,
    NotDeployed,
    Error,
}

impl DeployOutcome {
    /// Maps the status code embedded in a `deploy_ended` event
    pub fn from_status_code(code: Option<i64>) -> Self {
        match code {
            Some(2) => DeployOutcome::Deployed,
            Some(3) => DeployOutcome::NotDeployed,
            _ => DeployOutcome::Error,
        }
    }
}

/// Body for `POST postgres`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatabaseRequest {
    pub enable_high_availability: bool,
    pub plan: String,
    pub version: String,
    pub name: String,
    pub owner_id: String,
    pub region: String,
}

/// Build cache behaviour for a triggered deploy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClearCache {
    Clear,
    DoNotClear,
}

/// Body for `POST services/{id}/deploys`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub clear_cache: ClearCache,
}

/// Body for `PUT services/{id}/env-vars/{key}`
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvVarUpdate {
    pub value: String,
}

impl fmt::Debug for EnvVarUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvVarUpdate").field("value", &"<redacted>").finish()
    }
}
