use std::time::Duration;

use anyhow::{Context, Result};
use dbcycle_orchestrations::{PollPolicy, RebuildConfig, DEFAULT_BASE_URL};

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub rebuild: RebuildConfig,
}

impl Config {
    /// Reads the process environment; `main` has already merged `.env` into it
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Required values that are
    /// absent stay `None` so the rebuild can report all of them together.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = RebuildConfig::default();

        let database_poll = poll_policy(&lookup, "DATABASE_POLL_SECONDS", "DATABASE_POLL_MAX_ATTEMPTS")?;
        let deploy_poll = poll_policy(&lookup, "DEPLOY_POLL_SECONDS", "DEPLOY_POLL_MAX_ATTEMPTS")?;

        Ok(Self {
            base_url: lookup("RENDER_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            rebuild: RebuildConfig {
                database_name: lookup("DATABASE_NAME"),
                env_key: lookup("DATABASE_ENV_KEY"),
                region: lookup("REGION").map(|r| r.to_lowercase()),
                api_key: lookup("RENDER_API_KEY"),
                plan: lookup("DATABASE_PLAN").unwrap_or(defaults.plan),
                postgres_version: lookup("POSTGRES_VERSION").unwrap_or(defaults.postgres_version),
                database_poll,
                deploy_poll,
            },
        })
    }

    /// The API key, for commands that only read
    pub fn api_key(&self) -> Result<&str> {
        self.rebuild
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .context("RENDER_API_KEY must be set")
    }
}

/// Maps a missing-field name reported by the rebuild back to its variable
pub fn env_var_for(field: &str) -> &'static str {
    match field {
        "database_name" => "DATABASE_NAME",
        "env_key" => "DATABASE_ENV_KEY",
        "region" => "REGION",
        "api_key" => "RENDER_API_KEY",
        _ => "unknown",
    }
}

fn poll_policy(lookup: &impl Fn(&str) -> Option<String>, seconds_key: &str, attempts_key: &str) -> Result<PollPolicy> {
    let mut policy = PollPolicy::default();

    if let Some(seconds) = lookup(seconds_key) {
        let seconds: u64 = seconds
            .parse()
            .with_context(|| format!("{} must be a whole number of seconds", seconds_key))?;
        policy = policy.with_backoff(dbcycle_orchestrations::BackoffStrategy::Fixed(Duration::from_secs(seconds)));
    }

    if let Some(attempts) = lookup(attempts_key) {
        let attempts: u32 = attempts
            .parse()
            .with_context(|| format!("{} must be a positive number", attempts_key))?;
        policy.max_attempts = if attempts == 0 { None } else { Some(attempts) };
    }

    Ok(policy)
}
