//! Input and output types for the rebuild orchestration

use std::fmt;

use chrono::{DateTime, Utc};
use dbcycle_models::{DatabaseResource, DatabaseStatus, Service, FREE_PLAN};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{RebuildError, ServiceFailure};
use crate::polling::PollPolicy;

// ============================================================================
// Rebuild Configuration
// ============================================================================

/// Parameters for one rebuild run, fixed for the run's duration
///
/// The four required settings are optional here so that every missing one can be
/// reported together by [`RebuildConfig::validate`].
#[derive(Clone, PartialEq)]
pub struct RebuildConfig {
    /// Display name of the replacement database
    pub database_name: Option<String>,
    /// Environment variable that receives the connection string on each service
    pub env_key: Option<String>,
    /// Region for the replacement database
    pub region: Option<String>,
    /// Control-plane API credential
    pub api_key: Option<String>,
    /// Plan tier (default: "free")
    pub plan: String,
    /// PostgreSQL engine version (default: "16")
    pub postgres_version: String,
    pub database_poll: PollPolicy,
    pub deploy_poll: PollPolicy,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            database_name: None,
            env_key: None,
            region: None,
            api_key: None,
            plan: FREE_PLAN.to_string(),
            postgres_version: "16".to_string(),
            database_poll: PollPolicy::default(),
            deploy_poll: PollPolicy::default(),
        }
    }
}

impl fmt::Debug for RebuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RebuildConfig")
            .field("database_name", &self.database_name)
            .field("env_key", &self.env_key)
            .field("region", &self.region)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("plan", &self.plan)
            .field("postgres_version", &self.postgres_version)
            .field("database_poll", &self.database_poll)
            .field("deploy_poll", &self.deploy_poll)
            .finish()
    }
}

impl RebuildConfig {
    /// Checks every required setting and reports all missing ones at once
    pub fn validate(&self) -> Result<ValidatedConfig, RebuildError> {
        let mut missing = Vec::new();
        let database_name = present(&self.database_name, "database_name", &mut missing);
        let env_key = present(&self.env_key, "env_key", &mut missing);
        let region = present(&self.region, "region", &mut missing);
        present(&self.api_key, "api_key", &mut missing);

        match (database_name, env_key, region) {
            (Some(name), Some(env_key), Some(region)) if missing.is_empty() => Ok(ValidatedConfig {
                blueprint: DatabaseBlueprint {
                    name,
                    region: region.to_lowercase(),
                    plan: self.plan.clone(),
                    version: self.postgres_version.clone(),
                },
                env_key,
            }),
            _ => Err(RebuildError::Configuration { missing }),
        }
    }
}

fn present(value: &Option<String>, field: &'static str, missing: &mut Vec<&'static str>) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            missing.push(field);
            None
        }
    }
}

/// Required settings after validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    pub blueprint: DatabaseBlueprint,
    pub env_key: String,
}

/// Fixed shape of the replacement database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseBlueprint {
    pub name: String,
    pub region: String,
    pub plan: String,
    pub version: String,
}

// ============================================================================
// Rebuild Report
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RebuildOutcome {
    /// Database replaced and every dependent service deployed
    Completed,
    /// Database replaced but at least one service did not deploy
    CompletedWithFailures,
}

/// Summary of the replacement database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseSummary {
    pub id: String,
    pub name: String,
    pub status: DatabaseStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub plan: Option<String>,
    pub region: Option<String>,
}

impl DatabaseSummary {
    pub fn new(database: &DatabaseResource, status: DatabaseStatus) -> Self {
        Self {
            id: database.id.clone(),
            name: database.name.clone(),
            status,
            created_at: database.created_at,
            plan: database.plan.clone(),
            region: database.region.clone(),
        }
    }
}

/// What happened to one dependent service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ServiceOutcome {
    Deployed,
    NotDeployed,
    Error(ServiceFailure),
    /// Config write failed, so no deploy was triggered
    Skipped(ServiceFailure),
}

impl ServiceOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ServiceOutcome::Deployed => "deployed",
            ServiceOutcome::NotDeployed => "not deployed",
            ServiceOutcome::Error(_) => "error",
            ServiceOutcome::Skipped(_) => "skipped",
        }
    }

    pub fn failure(&self) -> Option<&ServiceFailure> {
        match self {
            ServiceOutcome::Error(failure) | ServiceOutcome::Skipped(failure) => Some(failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceReport {
    pub id: String,
    pub name: String,
    pub outcome: ServiceOutcome,
}

impl ServiceReport {
    pub fn new(service: &Service, outcome: ServiceOutcome) -> Self {
        Self {
            id: service.id.clone(),
            name: service.name.clone(),
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    pub run_id: Uuid,
    pub outcome: RebuildOutcome,
    pub owner_id: String,
    /// Database removed in step 3, if there was one
    pub deleted_database_id: Option<String>,
    pub database: DatabaseSummary,
    /// In discovery order
    pub services: Vec<ServiceReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RebuildReport {
    pub fn all_deployed(&self) -> bool {
        self.outcome == RebuildOutcome::Completed
    }
}
