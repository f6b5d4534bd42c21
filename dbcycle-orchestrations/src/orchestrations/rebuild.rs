//! Rebuild orchestration: replace the database and redeploy every web service

use std::sync::Arc;

use chrono::Utc;
use dbcycle_models::{DatabaseStatus, Deploy, DeployOutcome, Service};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::activities::{database_lifecycle, queries, service_sync};
use crate::control_plane::ControlPlane;
use crate::error::{AbortReason, RebuildError, ServiceFailure};
use crate::names::orchestrations;
use crate::polling::PollFailure;
use crate::types::{
    DatabaseSummary, RebuildConfig, RebuildOutcome, RebuildReport, ServiceOutcome, ServiceReport,
};

/// Runs the rebuild workflow against one control plane with one fixed configuration
pub struct Orchestrator {
    client: Arc<dyn ControlPlane>,
    config: RebuildConfig,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn ControlPlane>, config: RebuildConfig) -> Self {
        Self { client, config }
    }

    /// Deletes the current database, creates a replacement, waits for it, then
    /// writes its connection string to every web service and redeploys them
    ///
    /// Cancelling `cancel` stops any poll in progress. Before the database is
    /// available that aborts the run; while deploys are being followed it marks
    /// the unfinished services as errors in the report.
    pub async fn rebuild(&self, cancel: CancellationToken) -> Result<RebuildReport, RebuildError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("orchestration", name = orchestrations::REBUILD, %run_id);

        let result = self.run(run_id, &cancel).instrument(span.clone()).await;
        if let Err(e) = &result {
            span.in_scope(|| error!("Rebuild failed: {}", e));
        }
        result
    }

    async fn run(&self, run_id: Uuid, cancel: &CancellationToken) -> Result<RebuildReport, RebuildError> {
        // Step 1: Nothing remote happens until the configuration is complete
        info!("Step 1: Validating configuration");
        let validated = self.config.validate()?;
        let started_at = Utc::now();
        let client = self.client.as_ref();

        // Step 2: Independent reads
        info!("Step 2: Discovering owner, services and current database");
        let (owner, services, current) = tokio::try_join!(
            queries::get_owner(client),
            queries::list_dependent_services(client),
            queries::get_current_database(client),
        )?;
        info!(
            "Owner {}, {} dependent service(s), current database: {}",
            owner.id,
            services.len(),
            current.as_ref().map(|db| db.id.as_str()).unwrap_or("none")
        );

        if cancel.is_cancelled() {
            return Err(RebuildError::Cancelled);
        }

        // Step 3: Delete before create
        let deleted_database_id = match current {
            Some(existing) => {
                info!("Step 3: Deleting database {} ({})", existing.name, existing.id);
                database_lifecycle::delete(client, &existing.id)
                    .await
                    .map_err(RebuildError::Aborted)?;
                Some(existing.id)
            }
            None => {
                info!("Step 3: No existing database, nothing to delete");
                None
            }
        };

        // Step 4: Create and read the connection string
        info!("Step 4: Creating replacement database");
        let database = database_lifecycle::create(client, &owner.id, &validated.blueprint).await?;
        let connection = database_lifecycle::get_connection_info(client, &database.id).await?;

        // Step 5: Wait for provisioning
        info!("Step 5: Waiting for database {} to become available", database.id);
        let status = database_lifecycle::await_available(client, &database.id, &self.config.database_poll, cancel)
            .await
            .map_err(|failure| match failure {
                PollFailure::Check(e) => RebuildError::Remote(e),
                PollFailure::TimedOut { attempts } => RebuildError::Aborted(AbortReason::ProvisioningTimedOut {
                    database_id: database.id.clone(),
                    attempts,
                }),
                PollFailure::Cancelled => RebuildError::Cancelled,
            })?;

        if status != DatabaseStatus::Available {
            return Err(RebuildError::Aborted(AbortReason::ProvisioningFailed {
                database_id: database.id.clone(),
                status,
            }));
        }
        info!("Database {} is available", database.id);

        if cancel.is_cancelled() {
            return Err(RebuildError::Cancelled);
        }

        // Step 6: Config write then deploy, one service at a time
        info!("Step 6: Updating {} service(s)", services.len());
        let mut synced = Vec::with_capacity(services.len());
        for service in &services {
            let sync = self
                .sync_service(service, &validated.env_key, &connection.internal_connection_string)
                .await;
            synced.push((service, sync));
        }

        // Step 7: Follow every triggered deploy concurrently
        info!("Step 7: Waiting for deploy outcomes");
        let reports: Vec<ServiceReport> = join_all(synced.into_iter().map(|(service, sync)| async move {
            let outcome = match sync {
                Ok(deploy) => self.await_service(service, &deploy, cancel).await,
                Err(outcome) => outcome,
            };
            ServiceReport::new(service, outcome)
        }))
        .await;

        // Step 8: Report
        let outcome = if reports.iter().all(|r| r.outcome == ServiceOutcome::Deployed) {
            RebuildOutcome::Completed
        } else {
            RebuildOutcome::CompletedWithFailures
        };
        info!("Rebuild finished: {:?}", outcome);

        Ok(RebuildReport {
            run_id,
            outcome,
            owner_id: owner.id,
            deleted_database_id,
            database: DatabaseSummary::new(&database, status),
            services: reports,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Writes the connection string, then triggers a deploy. The error side is
    /// the final outcome for a service whose deploy never started.
    async fn sync_service(&self, service: &Service, env_key: &str, connection_string: &str) -> Result<Deploy, ServiceOutcome> {
        let client = self.client.as_ref();
        info!("Updating {} ({})", service.name, service.id);

        if let Err(source) = service_sync::set_config_value(client, &service.id, env_key, connection_string).await {
            warn!("Skipping deploy of {}: {}", service.name, source);
            return Err(ServiceOutcome::Skipped(ServiceFailure::ConfigWriteFailed {
                key: env_key.to_string(),
                source,
            }));
        }

        service_sync::trigger_deploy(client, &service.id).await.map_err(|source| {
            warn!("Failed to deploy {}: {}", service.name, source);
            ServiceOutcome::Error(ServiceFailure::DeployTriggerFailed { source })
        })
    }

    async fn await_service(&self, service: &Service, deploy: &Deploy, cancel: &CancellationToken) -> ServiceOutcome {
        let span = info_span!(
            "orchestration",
            name = orchestrations::AWAIT_DEPLOY_OUTCOME,
            service = %service.name,
            deploy_id = %deploy.id
        );

        async {
            let result = service_sync::await_deploy_outcome(
                self.client.as_ref(),
                &service.id,
                Some(deploy),
                &self.config.deploy_poll,
                cancel,
            )
            .await;

            let reason = match result {
                Ok(DeployOutcome::Deployed) => {
                    info!("{} is deployed", service.name);
                    return ServiceOutcome::Deployed;
                }
                Ok(DeployOutcome::NotDeployed) => {
                    warn!("{} is not deployed", service.name);
                    return ServiceOutcome::NotDeployed;
                }
                Ok(DeployOutcome::Error) => "deploy ended with an error status".to_string(),
                Err(PollFailure::Check(e)) => e.to_string(),
                Err(PollFailure::TimedOut { attempts }) => {
                    format!("no deploy_ended event after {} polls", attempts)
                }
                Err(PollFailure::Cancelled) => "stopped waiting: cancelled".to_string(),
            };

            error!("Error deploying {}: {}", service.name, reason);
            ServiceOutcome::Error(ServiceFailure::DeployOutcomeError { reason })
        }
        .instrument(span)
        .await
    }
}
