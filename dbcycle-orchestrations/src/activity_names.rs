//! Name constants for control-plane activities
//!
//! Following the naming convention: {crate-name}::{type}::{name}
//!
//! Every remote call is tagged with one of these names so a [`crate::RemoteError`]
//! always says which operation failed.

/// Activity names
pub mod activities {
    /// Resolve the acting account
    ///
    /// **Endpoint:** `GET owners?limit=1`
    /// **Output:** [`dbcycle_models::Owner`]
    pub const GET_OWNER: &str = "dbcycle-orchestrations::activity::get-owner";

    /// List services and keep the redeployable ones
    ///
    /// **Endpoint:** `GET services`
    /// **Output:** `Vec<`[`dbcycle_models::Service`]`>`
    pub const LIST_SERVICES: &str = "dbcycle-orchestrations::activity::list-services";

    /// List databases visible to the owner
    ///
    /// **Endpoint:** `GET postgres`
    pub const LIST_DATABASES: &str = "dbcycle-orchestrations::activity::list-databases";

    /// Fetch one database, used by the availability poll
    ///
    /// **Endpoint:** `GET postgres/{id}`
    /// **Idempotent:** Yes
    pub const GET_DATABASE: &str = "dbcycle-orchestrations::activity::get-database";

    /// Fetch connection strings for a database
    ///
    /// **Endpoint:** `GET postgres/{id}/connection-info`
    /// **Idempotent:** Yes
    pub const GET_CONNECTION_INFO: &str = "dbcycle-orchestrations::activity::get-connection-info";

    /// Create a replacement database
    ///
    /// **Endpoint:** `POST postgres`
    /// **Input:** [`dbcycle_models::CreateDatabaseRequest`]
    /// **Idempotent:** No
    pub const CREATE_DATABASE: &str = "dbcycle-orchestrations::activity::create-database";

    /// Destroy a database
    ///
    /// **Endpoint:** `DELETE postgres/{id}`
    /// **Idempotent:** No (only `204` confirms deletion)
    pub const DELETE_DATABASE: &str = "dbcycle-orchestrations::activity::delete-database";

    /// Upsert one environment variable on a service
    ///
    /// **Endpoint:** `PUT services/{id}/env-vars/{key}`
    /// **Idempotent:** Yes
    pub const SET_ENV_VAR: &str = "dbcycle-orchestrations::activity::set-env-var";

    /// Trigger a deploy with the build cache cleared
    ///
    /// **Endpoint:** `POST services/{id}/deploys`
    /// **Input:** [`dbcycle_models::DeployRequest`]
    /// **Output:** [`dbcycle_models::Deploy`]
    pub const TRIGGER_DEPLOY: &str = "dbcycle-orchestrations::activity::trigger-deploy";

    /// Read the most recent events of a service
    ///
    /// **Endpoint:** `GET services/{id}/events?limit=10`
    pub const LIST_EVENTS: &str = "dbcycle-orchestrations::activity::list-events";
}
