//! Render REST client
//!
//! reqwest-based implementation of [`ControlPlane`] for the Render v1 API.
//! List endpoints wrap each record (`[{"service": {...}, "cursor": "..."}]`);
//! records that fail to parse are skipped rather than failing the whole call.

use std::time::Duration;

use async_trait::async_trait;
use dbcycle_models::{
    ConnectionInfo, CreateDatabaseRequest, DatabaseResource, Deploy, DeployEvent, DeployRequest,
    EnvVarUpdate, Owner, Service,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::activity_names::activities;
use crate::control_plane::ControlPlane;
use crate::error::RemoteError;

pub const DEFAULT_BASE_URL: &str = "https://api.render.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const UNKNOWN_ERROR: &str = "An unknown error occurred";

/// Render control-plane client
pub struct RenderClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for RenderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl RenderClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn send(&self, operation: &'static str, builder: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;
        check_response(operation, response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, operation: &'static str, path: &str) -> Result<T, RemoteError> {
        let response = self.send(operation, self.http_client.get(self.url(path))).await?;
        read_json(operation, response).await
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        wrapper_key: &str,
    ) -> Result<Vec<T>, RemoteError> {
        let items: Vec<Value> = self.get_json(operation, path).await?;
        Ok(parse_wrapped_list(operation, items, wrapper_key))
    }
}

#[async_trait]
impl ControlPlane for RenderClient {
    async fn list_owners(&self) -> Result<Vec<Owner>, RemoteError> {
        self.get_list(activities::GET_OWNER, "owners?limit=1", "owner").await
    }

    async fn list_services(&self) -> Result<Vec<Service>, RemoteError> {
        self.get_list(activities::LIST_SERVICES, "services", "service").await
    }

    async fn list_databases(&self) -> Result<Vec<DatabaseResource>, RemoteError> {
        self.get_list(activities::LIST_DATABASES, "postgres", "postgres").await
    }

    async fn get_database(&self, database_id: &str) -> Result<DatabaseResource, RemoteError> {
        self.get_json(activities::GET_DATABASE, &format!("postgres/{}", database_id))
            .await
    }

    async fn get_connection_info(&self, database_id: &str) -> Result<ConnectionInfo, RemoteError> {
        self.get_json(
            activities::GET_CONNECTION_INFO,
            &format!("postgres/{}/connection-info", database_id),
        )
        .await
    }

    async fn create_database(&self, request: &CreateDatabaseRequest) -> Result<DatabaseResource, RemoteError> {
        let operation = activities::CREATE_DATABASE;
        let builder = self.http_client.post(self.url("postgres")).json(request);
        let response = self.send(operation, builder).await?;
        read_json(operation, response).await
    }

    async fn delete_database(&self, database_id: &str) -> Result<u16, RemoteError> {
        let builder = self
            .http_client
            .delete(self.url(&format!("postgres/{}", database_id)));
        let response = self.send(activities::DELETE_DATABASE, builder).await?;
        Ok(response.status().as_u16())
    }

    async fn set_env_var(&self, service_id: &str, key: &str, value: &str) -> Result<(), RemoteError> {
        let body = EnvVarUpdate {
            value: value.to_string(),
        };
        let builder = self
            .http_client
            .put(self.url(&format!("services/{}/env-vars/{}", service_id, key)))
            .json(&body);
        self.send(activities::SET_ENV_VAR, builder).await?;
        Ok(())
    }

    async fn trigger_deploy(&self, service_id: &str, request: &DeployRequest) -> Result<Deploy, RemoteError> {
        let operation = activities::TRIGGER_DEPLOY;
        let builder = self
            .http_client
            .post(self.url(&format!("services/{}/deploys", service_id)))
            .json(request);
        let response = self.send(operation, builder).await?;
        read_json(operation, response).await
    }

    async fn list_events(&self, service_id: &str, limit: u32) -> Result<Vec<DeployEvent>, RemoteError> {
        self.get_list(
            activities::LIST_EVENTS,
            &format!("services/{}/events?limit={}", service_id, limit),
            "event",
        )
        .await
    }
}

/// The one place a non-success response becomes a [`RemoteError`]
async fn check_response(operation: &'static str, response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::new(
        operation,
        Some(status.as_u16()),
        extract_message(&body),
    ))
}

async fn read_json<T: DeserializeOwned>(operation: &'static str, response: Response) -> Result<T, RemoteError> {
    let status = response.status().as_u16();
    response
        .json::<T>()
        .await
        .map_err(|e| RemoteError::new(operation, Some(status), format!("Invalid response body: {}", e)))
}

fn transport_error(operation: &'static str, err: reqwest::Error) -> RemoteError {
    RemoteError::new(operation, err.status().map(|s| s.as_u16()), err.to_string())
}

/// Pulls the `message` field out of an error body
fn extract_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

/// Unwraps `[{"<key>": {...}}]` lists, dropping entries that are missing or malformed
fn parse_wrapped_list<T: DeserializeOwned>(operation: &'static str, items: Vec<Value>, wrapper_key: &str) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, mut item)| {
            let inner = item.get_mut(wrapper_key).map(Value::take)?;
            if inner.is_null() {
                debug!(operation, index, "Skipping empty {} entry", wrapper_key);
                return None;
            }
            match serde_json::from_value(inner) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    debug!(operation, index, "Skipping malformed {} entry: {}", wrapper_key, e);
                    None
                }
            }
        })
        .collect()
}
