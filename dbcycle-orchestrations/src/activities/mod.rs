//! Single-purpose steps of the rebuild workflow
//!
//! Each step makes one kind of control-plane call (or polls one) and knows
//! nothing about the steps around it; ordering lives in the orchestration.

pub mod database_lifecycle;
pub mod queries;
pub mod service_sync;
