//! Scripted in-memory control plane for tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use dbcycle_models::{
    ClearCache, ConnectionInfo, CreateDatabaseRequest, DatabaseResource, DatabaseStatus, Deploy,
    DeployEvent, DeployEventDetails, DeployEventType, DeployRequest, Owner, Service, ServiceKind,
};

use crate::control_plane::ControlPlane;
use crate::error::RemoteError;
use crate::polling::{BackoffStrategy, PollPolicy};
use crate::types::RebuildConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListOwners,
    ListServices,
    ListDatabases,
    GetDatabase(String),
    GetConnectionInfo(String),
    CreateDatabase(CreateDatabaseRequest),
    DeleteDatabase(String),
    SetEnvVar {
        service_id: String,
        key: String,
        value: String,
    },
    TriggerDeploy {
        service_id: String,
        clear_cache: ClearCache,
    },
    ListEvents(String),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::CreateDatabase(_)
                | Call::DeleteDatabase(_)
                | Call::SetEnvVar { .. }
                | Call::TriggerDeploy { .. }
        )
    }
}

struct FakeState {
    calls: Vec<Call>,
    owners: Result<Vec<Owner>, RemoteError>,
    services: Result<Vec<Service>, RemoteError>,
    databases: Result<Vec<DatabaseResource>, RemoteError>,
    delete: Result<u16, RemoteError>,
    create: Result<DatabaseResource, RemoteError>,
    connection: Result<ConnectionInfo, RemoteError>,
    statuses: VecDeque<Result<DatabaseStatus, RemoteError>>,
    env_var_failures: HashSet<String>,
    deploy_failures: HashSet<String>,
    events: HashMap<String, VecDeque<Result<Vec<DeployEvent>, RemoteError>>>,
}

pub struct FakeControlPlane {
    state: Mutex<FakeState>,
}

pub fn owner(id: &str) -> Owner {
    Owner {
        id: id.to_string(),
        name: None,
        email: None,
    }
}

pub fn web_service(id: &str) -> Service {
    Service {
        id: id.to_string(),
        name: format!("{}-name", id),
        kind: ServiceKind::WebService,
        suspended: None,
    }
}

pub fn database(id: &str, status: DatabaseStatus, plan: &str) -> DatabaseResource {
    DatabaseResource {
        id: id.to_string(),
        name: format!("{}-name", id),
        status,
        created_at: None,
        plan: Some(plan.to_string()),
        region: Some("oregon".to_string()),
        version: Some("16".to_string()),
    }
}

pub fn deploy_ended(status: i64) -> DeployEvent {
    DeployEvent {
        id: None,
        event_type: DeployEventType::DeployEnded,
        timestamp: None,
        details: DeployEventDetails {
            status: Some(status),
            deploy_id: None,
        },
    }
}

pub fn event(event_type: DeployEventType) -> DeployEvent {
    DeployEvent {
        id: None,
        event_type,
        timestamp: None,
        details: DeployEventDetails::default(),
    }
}

pub fn remote_error(operation: &'static str, status: u16) -> RemoteError {
    RemoteError::new(operation, Some(status), "scripted failure")
}

/// Complete config with a 10 second fixed poll and a small ceiling
pub fn test_config() -> RebuildConfig {
    let poll = PollPolicy::new(5).with_backoff(BackoffStrategy::Fixed(Duration::from_secs(10)));
    RebuildConfig {
        database_name: Some("app-db".to_string()),
        env_key: Some("DATABASE_URL".to_string()),
        region: Some("oregon".to_string()),
        api_key: Some("rnd_test".to_string()),
        database_poll: poll.clone(),
        deploy_poll: poll,
        ..Default::default()
    }
}

impl FakeControlPlane {
    /// Owner `own-1`, no services, no databases, create returns `db-1` creating
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                calls: Vec::new(),
                owners: Ok(vec![owner("own-1")]),
                services: Ok(Vec::new()),
                databases: Ok(Vec::new()),
                delete: Ok(204),
                create: Ok(database("db-1", DatabaseStatus::Creating, "free")),
                connection: Ok(ConnectionInfo {
                    internal_connection_string: "postgres://internal/db-1".to_string(),
                    external_connection_string: None,
                    psql_command: None,
                }),
                statuses: VecDeque::new(),
                env_var_failures: HashSet::new(),
                deploy_failures: HashSet::new(),
                events: HashMap::new(),
            }),
        }
    }

    fn state(&mut self) -> &mut FakeState {
        self.state.get_mut().unwrap()
    }

    pub fn with_owners(mut self, owners: Result<Vec<Owner>, RemoteError>) -> Self {
        self.state().owners = owners;
        self
    }

    pub fn with_services(mut self, services: Vec<Service>) -> Self {
        self.state().services = Ok(services);
        self
    }

    pub fn with_databases(mut self, databases: Vec<DatabaseResource>) -> Self {
        self.state().databases = Ok(databases);
        self
    }

    pub fn with_delete(mut self, delete: Result<u16, RemoteError>) -> Self {
        self.state().delete = delete;
        self
    }

    pub fn with_create(mut self, create: Result<DatabaseResource, RemoteError>) -> Self {
        self.state().create = create;
        self
    }

    /// Statuses returned by successive `get_database` calls; `creating` once exhausted
    pub fn with_statuses(mut self, statuses: Vec<Result<DatabaseStatus, RemoteError>>) -> Self {
        self.state().statuses = statuses.into();
        self
    }

    pub fn failing_env_var(mut self, service_id: &str) -> Self {
        self.state().env_var_failures.insert(service_id.to_string());
        self
    }

    pub fn failing_deploy(mut self, service_id: &str) -> Self {
        self.state().deploy_failures.insert(service_id.to_string());
        self
    }

    /// Event pages for successive polls of one service; the last page repeats
    pub fn with_events(mut self, service_id: &str, pages: Vec<Result<Vec<DeployEvent>, RemoteError>>) -> Self {
        self.state().events.insert(service_id.to_string(), pages.into());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, call: Call) -> std::sync::MutexGuard<'_, FakeState> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn list_owners(&self) -> Result<Vec<Owner>, RemoteError> {
        self.record(Call::ListOwners).owners.clone()
    }

    async fn list_services(&self) -> Result<Vec<Service>, RemoteError> {
        self.record(Call::ListServices).services.clone()
    }

    async fn list_databases(&self) -> Result<Vec<DatabaseResource>, RemoteError> {
        self.record(Call::ListDatabases).databases.clone()
    }

    async fn get_database(&self, database_id: &str) -> Result<DatabaseResource, RemoteError> {
        let mut state = self.record(Call::GetDatabase(database_id.to_string()));
        let status = state
            .statuses
            .pop_front()
            .unwrap_or(Ok(DatabaseStatus::Creating))?;
        Ok(database(database_id, status, "free"))
    }

    async fn get_connection_info(&self, database_id: &str) -> Result<ConnectionInfo, RemoteError> {
        self.record(Call::GetConnectionInfo(database_id.to_string()))
            .connection
            .clone()
    }

    async fn create_database(&self, request: &CreateDatabaseRequest) -> Result<DatabaseResource, RemoteError> {
        self.record(Call::CreateDatabase(request.clone())).create.clone()
    }

    async fn delete_database(&self, database_id: &str) -> Result<u16, RemoteError> {
        self.record(Call::DeleteDatabase(database_id.to_string()))
            .delete
            .clone()
    }

    async fn set_env_var(&self, service_id: &str, key: &str, value: &str) -> Result<(), RemoteError> {
        let state = self.record(Call::SetEnvVar {
            service_id: service_id.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        });
        if state.env_var_failures.contains(service_id) {
            return Err(remote_error(crate::activity_names::activities::SET_ENV_VAR, 500));
        }
        Ok(())
    }

    async fn trigger_deploy(&self, service_id: &str, request: &DeployRequest) -> Result<Deploy, RemoteError> {
        let state = self.record(Call::TriggerDeploy {
            service_id: service_id.to_string(),
            clear_cache: request.clear_cache,
        });
        if state.deploy_failures.contains(service_id) {
            return Err(remote_error(crate::activity_names::activities::TRIGGER_DEPLOY, 500));
        }
        Ok(Deploy {
            id: format!("dep-{}", service_id),
            status: Some("created".to_string()),
            created_at: None,
        })
    }

    async fn list_events(&self, service_id: &str, _limit: u32) -> Result<Vec<DeployEvent>, RemoteError> {
        let mut state = self.record(Call::ListEvents(service_id.to_string()));
        match state.events.get_mut(service_id) {
            Some(pages) if pages.len() > 1 => pages.pop_front().unwrap_or(Ok(Vec::new())),
            Some(pages) => pages.front().cloned().unwrap_or(Ok(Vec::new())),
            None => Ok(Vec::new()),
        }
    }
}
