//! Name constants for dbcycle orchestrations
//!
//! Following the naming convention: {crate-name}::{type}::{name}

/// Orchestration names
pub mod orchestrations {
    /// Delete, recreate and re-point every web service at a fresh database
    ///
    /// **Input:** [`crate::types::RebuildConfig`]
    /// **Output:** [`crate::types::RebuildReport`]
    /// **Activities used:** everything in [`crate::activity_names::activities`]
    /// **Duration:** several minutes (database provisioning dominates)
    pub const REBUILD: &str = "dbcycle-orchestrations::orchestration::rebuild";

    /// Poll a database until it leaves the `creating` status
    pub const AWAIT_DATABASE_AVAILABLE: &str =
        "dbcycle-orchestrations::orchestration::await-database-available";

    /// Poll a service's event feed until its deploy ends
    pub const AWAIT_DEPLOY_OUTCOME: &str =
        "dbcycle-orchestrations::orchestration::await-deploy-outcome";
}
