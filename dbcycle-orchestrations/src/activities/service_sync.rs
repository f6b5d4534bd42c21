//! Point a service at the new database and follow its redeploy

use std::sync::Mutex;

use dbcycle_models::{ClearCache, Deploy, DeployEvent, DeployEventType, DeployOutcome, DeployRequest};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::control_plane::ControlPlane;
use crate::error::RemoteError;
use crate::polling::{poll_until, PollFailure, PollPolicy, PollStep};

/// How many recent events each poll asks for
pub const EVENT_PAGE_SIZE: u32 = 10;

/// Deploy progress of one service, as seen through its event feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployPhase {
    Pending,
    InProgress,
    Ended(DeployOutcome),
}

impl DeployPhase {
    /// Advances on one event. A `deploy_ended` that names a different deploy
    /// than `deploy_id` belongs to an earlier deploy and is ignored.
    pub fn observe(self, event: &DeployEvent, deploy_id: Option<&str>) -> DeployPhase {
        match event.event_type {
            DeployEventType::DeployEnded => {
                if is_stale(event, deploy_id) {
                    self
                } else {
                    DeployPhase::Ended(DeployOutcome::from_status_code(event.details.status))
                }
            }
            DeployEventType::DeployStarted | DeployEventType::BuildStarted | DeployEventType::BuildEnded => {
                DeployPhase::InProgress
            }
            DeployEventType::Other => self,
        }
    }
}

fn is_stale(event: &DeployEvent, deploy_id: Option<&str>) -> bool {
    matches!(
        (event.details.deploy_id.as_deref(), deploy_id),
        (Some(seen), Some(expected)) if seen != expected
    )
}

/// Picks the event of a newest-first page that decides the phase. Unrelated
/// events above a matching `deploy_ended` are skipped; the scan stops at the
/// first `deploy_started` since anything older belongs to an earlier deploy.
fn deciding_event<'a>(events: &'a [DeployEvent], deploy_id: Option<&str>) -> Option<&'a DeployEvent> {
    events
        .iter()
        .find(|event| match event.event_type {
            DeployEventType::DeployEnded => !is_stale(event, deploy_id),
            DeployEventType::DeployStarted => true,
            _ => false,
        })
        .or_else(|| events.first())
}

/// Upserts one environment variable on a service
pub async fn set_config_value(
    client: &dyn ControlPlane,
    service_id: &str,
    key: &str,
    value: &str,
) -> Result<(), RemoteError> {
    client.set_env_var(service_id, key, value).await?;
    debug!("Updated {} on service {}", key, service_id);
    Ok(())
}

/// Starts a deploy with the build cache cleared so the new value is picked up
pub async fn trigger_deploy(client: &dyn ControlPlane, service_id: &str) -> Result<Deploy, RemoteError> {
    let request = DeployRequest {
        clear_cache: ClearCache::Clear,
    };
    let deploy = client.trigger_deploy(service_id, &request).await?;
    info!("Deploy {} triggered for service {}", deploy.id, service_id);
    Ok(deploy)
}

/// Polls the service's event feed until the triggered deploy ends
pub async fn await_deploy_outcome(
    client: &dyn ControlPlane,
    service_id: &str,
    deploy: Option<&Deploy>,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<DeployOutcome, PollFailure<RemoteError>> {
    let deploy_id = deploy.map(|d| d.id.as_str());
    let phase = Mutex::new(DeployPhase::Pending);
    let phase = &phase;

    poll_until(policy, cancel, move |attempt| async move {
        let events = client.list_events(service_id, EVENT_PAGE_SIZE).await?;

        let mut current = phase.lock().unwrap_or_else(|e| e.into_inner());
        let next = match deciding_event(&events, deploy_id) {
            Some(latest) => current.observe(latest, deploy_id),
            None => *current,
        };
        if next != *current {
            debug!("Service {} deploy {:?} -> {:?}", service_id, *current, next);
        } else {
            debug!("Service {} deploy still {:?} (attempt {})", service_id, next, attempt);
        }
        *current = next;

        Ok(match next {
            DeployPhase::Ended(outcome) => PollStep::Ready(outcome),
            _ => PollStep::Pending,
        })
    })
    .await
}
