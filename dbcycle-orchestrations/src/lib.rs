//! dbcycle Orchestrations - rebuild workflow for a managed PostgreSQL database
//!
//! This crate deletes the current database on the control plane, provisions a
//! replacement, and redeploys every dependent web service against it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dbcycle_orchestrations::{Orchestrator, RebuildConfig, RenderClient, DEFAULT_BASE_URL};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RebuildConfig {
//!     database_name: Some("app-db".to_string()),
//!     env_key: Some("DATABASE_URL".to_string()),
//!     region: Some("oregon".to_string()),
//!     api_key: Some("rnd_xxx".to_string()),
//!     ..Default::default()
//! };
//! let client = Arc::new(RenderClient::new(DEFAULT_BASE_URL, "rnd_xxx")?);
//!
//! let report = Orchestrator::new(client, config)
//!     .rebuild(CancellationToken::new())
//!     .await?;
//! println!("{:?}", report.outcome);
//! # Ok(())
//! # }
//! ```

// Orchestration exports
pub mod names;
pub mod types;
pub mod error;
pub mod polling;

// Activity exports
pub mod activity_names;
pub mod activities;
pub mod control_plane;
pub mod render_client;

mod orchestrations;

#[cfg(test)]
mod testing;

// Re-export key types for convenience
pub use control_plane::ControlPlane;
pub use error::{AbortReason, RebuildError, RemoteError, ServiceFailure};
pub use orchestrations::rebuild::Orchestrator;
pub use polling::{BackoffStrategy, PollPolicy};
pub use render_client::{RenderClient, DEFAULT_BASE_URL};
pub use types::*;
