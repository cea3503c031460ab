// ABOUTME: In-memory engine double for unit tests of discovery and deployment.
// ABOUTME: Records every lifecycle call and can be told to fail specific operations.

use super::record::{ContainerRecord, ListFilter, PortRecord};
use super::traits::sealed::Sealed;
use super::traits::{CliError, ContainerError, ContainerOps, SessionExit, StreamingOps};
use crate::service::CreatePayload;
use crate::types::{ContainerId, ImageRef};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Lifecycle call observed by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List { include_stopped: bool },
    Create { name: String },
    Inspect(String),
    Start(String),
    Stop(String, Duration),
    Remove(String),
    Restart(String),
    Pull(String),
    FollowLogs(String),
    Attach(String),
    Exec(String, Vec<String>),
    InteractiveExec(String, Vec<String>),
}

/// Operation a scripted failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Create,
    Inspect,
    Start,
    Stop,
    Remove,
    Restart,
}

type FailureFn = Box<dyn Fn(&str) -> Option<ContainerError> + Send + Sync>;

#[derive(Default)]
pub struct FakeEngine {
    containers: Mutex<Vec<ContainerRecord>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<Op, FailureFn>>,
    created: Mutex<Vec<(String, CreatePayload)>>,
    session_code: Mutex<Option<i32>>,
}

impl FakeEngine {
    pub fn new(containers: Vec<ContainerRecord>) -> Self {
        Self {
            containers: Mutex::new(containers),
            ..Default::default()
        }
    }

    /// Make `op` fail for ids (or names, for create) where `f` returns an error.
    pub fn fail_on(
        &self,
        op: Op,
        f: impl Fn(&str) -> Option<ContainerError> + Send + Sync + 'static,
    ) {
        self.failures.lock().insert(op, Box::new(f));
    }

    /// Exit status reported by the next interactive sessions.
    pub fn set_session_code(&self, code: Option<i32>) {
        *self.session_code.lock() = code;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn created(&self) -> Vec<(String, CreatePayload)> {
        self.created.lock().clone()
    }

    pub fn stopped_ids(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Stop(id, _) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn removed_ids(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Remove(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn container(&self, id: &str) -> Option<ContainerRecord> {
        self.containers
            .lock()
            .iter()
            .find(|c| c.id.as_str() == id)
            .cloned()
    }

    fn record_call(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn scripted(&self, op: Op, key: &str) -> Result<(), ContainerError> {
        match self.failures.lock().get(&op).and_then(|f| f(key)) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn with_container(
        &self,
        id: &ContainerId,
        f: impl FnOnce(&mut ContainerRecord),
    ) -> Result<(), ContainerError> {
        let mut containers = self.containers.lock();
        let container = containers
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        f(container);
        Ok(())
    }
}

impl Sealed for FakeEngine {}

#[async_trait]
impl ContainerOps for FakeEngine {
    async fn create(
        &self,
        name: &str,
        config: &CreatePayload,
    ) -> Result<ContainerId, ContainerError> {
        self.record_call(Call::Create {
            name: name.to_string(),
        });
        self.scripted(Op::Create, name)?;

        let mut containers = self.containers.lock();
        let id = format!("new{}", containers.len());
        containers.push(ContainerRecord {
            id: ContainerId::new(id.clone()),
            names: vec![format!("/{name}")],
            image: config.image.clone(),
            ports: Vec::new(),
            status: "Created".to_string(),
            created: Utc::now(),
        });
        self.created.lock().push((name.to_string(), config.clone()));
        Ok(ContainerId::new(id))
    }

    async fn inspect(&self, id: &ContainerId) -> Result<serde_json::Value, ContainerError> {
        self.record_call(Call::Inspect(id.to_string()));
        self.scripted(Op::Inspect, id.as_str())?;
        Ok(serde_json::json!({ "Id": id.as_str() }))
    }

    async fn list(&self, filter: ListFilter) -> Result<Vec<ContainerRecord>, ContainerError> {
        self.record_call(Call::List {
            include_stopped: filter.include_stopped,
        });
        self.scripted(Op::List, "")?;
        Ok(self
            .containers
            .lock()
            .iter()
            .filter(|c| filter.include_stopped || !c.is_exited())
            .cloned()
            .collect())
    }

    async fn start(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.record_call(Call::Start(id.to_string()));
        self.scripted(Op::Start, id.as_str())?;
        self.with_container(id, |c| c.status = "Up Less than a second".to_string())
    }

    async fn stop(&self, id: &ContainerId, timeout: Duration) -> Result<(), ContainerError> {
        self.record_call(Call::Stop(id.to_string(), timeout));
        self.scripted(Op::Stop, id.as_str())?;
        self.with_container(id, |c| c.status = "Exited (0) Less than a second ago".to_string())
    }

    async fn remove(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.record_call(Call::Remove(id.to_string()));
        self.scripted(Op::Remove, id.as_str())?;
        let mut containers = self.containers.lock();
        let before = containers.len();
        containers.retain(|c| &c.id != id);
        if containers.len() == before {
            return Err(ContainerError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn restart(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.record_call(Call::Restart(id.to_string()));
        self.scripted(Op::Restart, id.as_str())?;
        self.with_container(id, |c| c.status = "Up Less than a second".to_string())
    }
}

#[async_trait]
impl StreamingOps for FakeEngine {
    async fn pull(&self, image: &ImageRef) -> Result<(), CliError> {
        self.record_call(Call::Pull(image.to_string()));
        Ok(())
    }

    async fn follow_logs(&self, id: &ContainerId) -> Result<(), CliError> {
        self.record_call(Call::FollowLogs(id.to_string()));
        Ok(())
    }

    async fn attach(&self, id: &ContainerId) -> Result<(), CliError> {
        self.record_call(Call::Attach(id.to_string()));
        Ok(())
    }

    async fn exec(&self, id: &ContainerId, command: &[String]) -> Result<(), CliError> {
        self.record_call(Call::Exec(id.to_string(), command.to_vec()));
        Ok(())
    }

    async fn interactive_exec(
        &self,
        id: &ContainerId,
        command: &[String],
    ) -> Result<SessionExit, CliError> {
        self.record_call(Call::InteractiveExec(id.to_string(), command.to_vec()));
        Ok(SessionExit {
            code: *self.session_code.lock(),
        })
    }
}

/// Container with one published port (8080 -> 80/tcp) created `created_secs` after the epoch.
pub fn record(id: &str, name: &str, status: &str, created_secs: i64) -> ContainerRecord {
    ContainerRecord {
        id: ContainerId::new(id),
        names: vec![name.to_string()],
        image: "nginx:1.25".to_string(),
        ports: vec![PortRecord {
            host_ip: Some("0.0.0.0".to_string()),
            container_port: 80,
            host_port: Some(8080),
            protocol: "tcp".to_string(),
        }],
        status: status.to_string(),
        created: DateTime::<Utc>::from_timestamp(created_secs, 0).unwrap_or_default(),
    }
}
