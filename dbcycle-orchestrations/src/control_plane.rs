//! The narrow interface the workflow uses to talk to the control plane

use async_trait::async_trait;
use dbcycle_models::{
    ConnectionInfo, CreateDatabaseRequest, DatabaseResource, Deploy, DeployEvent, DeployRequest,
    Owner, Service,
};

use crate::error::RemoteError;

/// Typed request/response boundary to the remote control plane
///
/// Implementations turn every non-success response into a [`RemoteError`] tagged
/// with the matching name from [`crate::activity_names::activities`]. Nothing is
/// retried at this layer or above it.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn list_owners(&self) -> Result<Vec<Owner>, RemoteError>;

    /// Every service the owner can see, in control-plane order. Entries that do not
    /// parse are dropped by the implementation.
    async fn list_services(&self) -> Result<Vec<Service>, RemoteError>;

    async fn list_databases(&self) -> Result<Vec<DatabaseResource>, RemoteError>;

    async fn get_database(&self, database_id: &str) -> Result<DatabaseResource, RemoteError>;

    async fn get_connection_info(&self, database_id: &str) -> Result<ConnectionInfo, RemoteError>;

    async fn create_database(
        &self,
        request: &CreateDatabaseRequest,
    ) -> Result<DatabaseResource, RemoteError>;

    /// Returns the HTTP status of a successful response; callers decide what
    /// counts as confirmed.
    async fn delete_database(&self, database_id: &str) -> Result<u16, RemoteError>;

    async fn set_env_var(&self, service_id: &str, key: &str, value: &str)
        -> Result<(), RemoteError>;

    async fn trigger_deploy(
        &self,
        service_id: &str,
        request: &DeployRequest,
    ) -> Result<Deploy, RemoteError>;

    /// Most recent events first
    async fn list_events(&self, service_id: &str, limit: u32)
        -> Result<Vec<DeployEvent>, RemoteError>;
}
