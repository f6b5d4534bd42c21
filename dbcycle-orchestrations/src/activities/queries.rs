//! Read-only discovery of the owner, dependent services and current database

use dbcycle_models::{DatabaseResource, Owner, Service};
use tracing::debug;

use crate::activity_names::activities;
use crate::control_plane::ControlPlane;
use crate::error::RemoteError;

/// The acting account. An empty owner list is an error.
pub async fn get_owner(client: &dyn ControlPlane) -> Result<Owner, RemoteError> {
    client
        .list_owners()
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| RemoteError::new(activities::GET_OWNER, None, "No owner returned"))
}

/// Web services in discovery order
pub async fn list_dependent_services(client: &dyn ControlPlane) -> Result<Vec<Service>, RemoteError> {
    let services = client.list_services().await?;
    let total = services.len();

    let dependent: Vec<Service> = services
        .into_iter()
        .filter(Service::is_redeployable)
        .collect();

    debug!("{} of {} services are redeployable", dependent.len(), total);
    Ok(dependent)
}

/// The database this workflow manages: the first free-tier one found
pub async fn get_current_database(client: &dyn ControlPlane) -> Result<Option<DatabaseResource>, RemoteError> {
    let databases = client.list_databases().await?;
    let total = databases.len();
    let current = databases.into_iter().find(DatabaseResource::is_free_tier);

    match &current {
        Some(db) if total > 1 => debug!(
            "Selected database {} ({}) out of {} visible databases",
            db.name, db.id, total
        ),
        Some(_) => {}
        None => debug!("No free-tier database among {} visible databases", total),
    }
    Ok(current)
}
