//! Delete, create and await a managed database

use std::sync::Mutex;

use dbcycle_models::{ConnectionInfo, CreateDatabaseRequest, DatabaseResource, DatabaseStatus};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::control_plane::ControlPlane;
use crate::error::{AbortReason, RemoteError};
use crate::names::orchestrations;
use crate::polling::{poll_until, PollFailure, PollPolicy, PollStep};
use crate::types::DatabaseBlueprint;

/// Only this status confirms a deletion
pub const DELETE_CONFIRMED_STATUS: u16 = 204;

/// Provisioning state of a newly requested database, as seen by polling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningState {
    Requested,
    Provisioning,
    Available,
    Failed(DatabaseStatus),
}

impl ProvisioningState {
    pub fn from_status(status: &DatabaseStatus) -> ProvisioningState {
        if status.is_transitional() {
            ProvisioningState::Provisioning
        } else if *status == DatabaseStatus::Available {
            ProvisioningState::Available
        } else {
            ProvisioningState::Failed(status.clone())
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProvisioningState::Available | ProvisioningState::Failed(_))
    }
}

/// Destroys a database. Anything but a `204` is a [`AbortReason::DeletionFailed`].
pub async fn delete(client: &dyn ControlPlane, database_id: &str) -> Result<(), AbortReason> {
    info!("Deleting existing database {}", database_id);

    let detail = match client.delete_database(database_id).await {
        Ok(DELETE_CONFIRMED_STATUS) => {
            info!("Database {} deleted", database_id);
            return Ok(());
        }
        Ok(status) => format!("unexpected status code {}", status),
        Err(e) => e.to_string(),
    };

    Err(AbortReason::DeletionFailed {
        database_id: database_id.to_string(),
        detail,
    })
}

/// Requests a replacement database; high availability is always off
pub async fn create(
    client: &dyn ControlPlane,
    owner_id: &str,
    blueprint: &DatabaseBlueprint,
) -> Result<DatabaseResource, RemoteError> {
    info!(
        "Creating database {} (plan: {}, version: {}, region: {})",
        blueprint.name, blueprint.plan, blueprint.version, blueprint.region
    );

    let request = CreateDatabaseRequest {
        enable_high_availability: false,
        plan: blueprint.plan.clone(),
        version: blueprint.version.clone(),
        name: blueprint.name.clone(),
        owner_id: owner_id.to_string(),
        region: blueprint.region.clone(),
    };

    let database = client.create_database(&request).await?;
    info!("Database {} requested (status: {})", database.id, database.status);
    Ok(database)
}

pub async fn get_connection_info(client: &dyn ControlPlane, database_id: &str) -> Result<ConnectionInfo, RemoteError> {
    client.get_connection_info(database_id).await
}

/// Polls `GET postgres/{id}` until the status leaves `creating`
///
/// Returns the first non-transitional status observed, whether or not it is
/// `available`; the caller decides what a failed terminal status means.
pub async fn await_available(
    client: &dyn ControlPlane,
    database_id: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<DatabaseStatus, PollFailure<RemoteError>> {
    let span = info_span!(
        "orchestration",
        name = orchestrations::AWAIT_DATABASE_AVAILABLE,
        database_id
    );

    async move {
        info!("Waiting for database...");
        let state = Mutex::new(ProvisioningState::Requested);
        let state = &state;

        poll_until(policy, cancel, move |attempt| async move {
            let status = client.get_database(database_id).await?.status;

            let mut current = state.lock().unwrap_or_else(|e| e.into_inner());
            let next = ProvisioningState::from_status(&status);
            if next != *current {
                info!("Database {:?} -> {:?} (status: {})", *current, next, status);
            } else {
                debug!("Database still {} (attempt {})", status, attempt);
            }
            let terminal = next.is_terminal();
            *current = next;

            Ok(if terminal {
                PollStep::Ready(status)
            } else {
                PollStep::Pending
            })
        })
        .await
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity_names::activities;
    use crate::polling::BackoffStrategy;
    use crate::testing::*;
    use std::time::Duration;

    fn policy() -> PollPolicy {
        PollPolicy::new(10).with_backoff(BackoffStrategy::Fixed(Duration::from_secs(10)))
    }

    fn blueprint() -> DatabaseBlueprint {
        DatabaseBlueprint {
            name: "app-db".to_string(),
            region: "oregon".to_string(),
            plan: "free".to_string(),
            version: "16".to_string(),
        }
    }

    #[tokio::test]
    async fn test_delete_confirmed_by_204() {
        let fake = FakeControlPlane::new().with_delete(Ok(204));
        assert!(delete(&fake, "db-old").await.is_ok());
        assert_eq!(fake.calls(), vec![Call::DeleteDatabase("db-old".to_string())]);
    }

    #[tokio::test]
    async fn test_delete_other_success_status_is_not_confirmation() {
        let fake = FakeControlPlane::new().with_delete(Ok(200));
        match delete(&fake, "db-old").await {
            Err(AbortReason::DeletionFailed { database_id, detail }) => {
                assert_eq!(database_id, "db-old");
                assert!(detail.contains("200"));
            }
            other => panic!("expected deletion failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_remote_error_is_deletion_failure() {
        let fake = FakeControlPlane::new().with_delete(Err(remote_error(activities::DELETE_DATABASE, 404)));
        assert!(matches!(
            delete(&fake, "db-old").await,
            Err(AbortReason::DeletionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_sends_fixed_configuration() {
        let fake = FakeControlPlane::new();
        let created = create(&fake, "own-1", &blueprint()).await.unwrap();
        assert_eq!(created.id, "db-1");

        match &fake.calls()[0] {
            Call::CreateDatabase(request) => {
                assert!(!request.enable_high_availability);
                assert_eq!(request.owner_id, "own-1");
                assert_eq!(request.plan, "free");
                assert_eq!(request.version, "16");
                assert_eq!(request.region, "oregon");
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_available_polls_until_status_changes() {
        let fake = FakeControlPlane::new().with_statuses(vec![
            Ok(DatabaseStatus::Creating),
            Ok(DatabaseStatus::Creating),
            Ok(DatabaseStatus::Available),
        ]);

        let status = await_available(&fake, "db-1", &policy(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(status, DatabaseStatus::Available);
        assert_eq!(fake.count(|c| matches!(c, Call::GetDatabase(_))), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_available_waits_between_polls() {
        let fake = FakeControlPlane::new().with_statuses(vec![
            Ok(DatabaseStatus::Creating),
            Ok(DatabaseStatus::Available),
        ]);

        let started = tokio::time::Instant::now();
        await_available(&fake, "db-1", &policy(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_available_returns_failed_terminal_status() {
        let fake = FakeControlPlane::new().with_statuses(vec![
            Ok(DatabaseStatus::Creating),
            Ok(DatabaseStatus::RecoveryFailed),
        ]);

        let status = await_available(&fake, "db-1", &policy(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(status, DatabaseStatus::RecoveryFailed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_available_times_out() {
        let fake = FakeControlPlane::new();
        let result = await_available(&fake, "db-1", &PollPolicy::new(3), &CancellationToken::new()).await;
        assert_eq!(result, Err(PollFailure::TimedOut { attempts: 3 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_available_surfaces_remote_error() {
        let fake = FakeControlPlane::new().with_statuses(vec![
            Ok(DatabaseStatus::Creating),
            Err(remote_error(activities::GET_DATABASE, 503)),
        ]);

        let result = await_available(&fake, "db-1", &policy(), &CancellationToken::new()).await;
        assert!(matches!(result, Err(PollFailure::Check(e)) if e.status == Some(503)));
    }

    #[test]
    fn test_provisioning_state_transitions() {
        assert!(!ProvisioningState::Requested.is_terminal());
        let state = ProvisioningState::from_status(&DatabaseStatus::Creating);
        assert_eq!(state, ProvisioningState::Provisioning);
        assert!(!state.is_terminal());
        assert_eq!(
            ProvisioningState::from_status(&DatabaseStatus::Available),
            ProvisioningState::Available
        );
        assert_eq!(
            ProvisioningState::from_status(&DatabaseStatus::Suspended),
            ProvisioningState::Failed(DatabaseStatus::Suspended)
        );
        assert!(ProvisioningState::from_status(&DatabaseStatus::Suspended).is_terminal());
    }
}
