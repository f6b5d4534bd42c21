pub mod inspect;
pub mod rebuild;
pub mod system;

use std::sync::Arc;

use anyhow::{Context, Result};
use dbcycle_orchestrations::RenderClient;

use crate::config::Config;

/// Client for commands that only read; these need the API key up front
pub(crate) fn read_only_client(config: &Config) -> Result<Arc<RenderClient>> {
    let client = RenderClient::new(config.base_url.clone(), config.api_key()?)
        .context("Failed to build HTTP client")?;
    Ok(Arc::new(client))
}
