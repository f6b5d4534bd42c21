//! Error types for the rebuild workflow

use std::fmt;

use dbcycle_models::DatabaseStatus;
use serde::Serialize;
use thiserror::Error;

/// A failed call to the control plane
///
/// Built once, at the client boundary, with the activity name that failed and the
/// remote status and message when the control plane returned them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteError {
    pub operation: &'static str,
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(operation: &'static str, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            operation,
            status,
            message: message.into(),
        }
    }

    /// Short activity name, e.g. `get-owner`
    pub fn short_operation(&self) -> &'static str {
        self.operation.rsplit("::").next().unwrap_or(self.operation)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error in {}: {}", self.short_operation(), self.message)?;
        if let Some(status) = self.status {
            write!(f, " (status code: {})", status)?;
        }
        Ok(())
    }
}

impl std::error::Error for RemoteError {}

/// Conditions that stop the rebuild before any service is touched
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum AbortReason {
    #[error("deletion of database {database_id} was not confirmed: {detail}")]
    DeletionFailed { database_id: String, detail: String },

    #[error("database {database_id} finished provisioning with status '{status}'")]
    ProvisioningFailed {
        database_id: String,
        status: DatabaseStatus,
    },

    #[error("database {database_id} was still provisioning after {attempts} polls")]
    ProvisioningTimedOut { database_id: String, attempts: u32 },
}

/// Top-level error returned by [`crate::Orchestrator::rebuild`]
#[derive(Debug, Error)]
pub enum RebuildError {
    #[error("missing required configuration: {}", .missing.join(", "))]
    Configuration { missing: Vec<&'static str> },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("rebuild aborted: {0}")]
    Aborted(AbortReason),

    #[error("rebuild cancelled")]
    Cancelled,
}

/// A failure scoped to one dependent service; recorded in the report, never fatal
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ServiceFailure {
    #[error("failed to write {key}: {source}")]
    ConfigWriteFailed { key: String, source: RemoteError },

    #[error("failed to trigger deploy: {source}")]
    DeployTriggerFailed { source: RemoteError },

    #[error("deploy outcome unknown: {reason}")]
    DeployOutcomeError { reason: String },
}
