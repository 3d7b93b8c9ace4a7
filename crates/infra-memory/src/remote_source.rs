// In-Process Remote Task Source
//
// Remote-style backend (tagged notion or todoist) with the same contract as
// a real service adapter: it needs an API token, an access grant before any
// data operation, and can be told to fail the next call with a transport
// error.

use async_trait::async_trait;
use chrono::NaiveDate;
use focusblox_core::domain::{Importance, SourceSystem, TaskType, Urgency};
use focusblox_core::error::{AppError, Result};
use focusblox_core::port::{TaskDraft, TaskPatch, TaskSource, TaskSourceData, TaskSourceWritable};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Backend-native record of the remote source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTask {
    pub id: String,
    pub title: String,
    pub is_completed: bool,
    pub priority: Option<Importance>,
    pub urgency: Option<Urgency>,
    pub tags: Vec<String>,
    pub due_date: Option<NaiveDate>,
    pub estimated_duration: Option<u32>,
    pub task_type: Option<TaskType>,
    pub description: Option<String>,
    #[serde(default = "default_remote_system")]
    source_system: SourceSystem,
}

fn default_remote_system() -> SourceSystem {
    SourceSystem::Notion
}

impl RemoteTask {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            is_completed: false,
            priority: None,
            urgency: None,
            tags: Vec::new(),
            due_date: None,
            estimated_duration: None,
            task_type: None,
            description: None,
            source_system: default_remote_system(),
        }
    }
}

impl TaskSourceData for RemoteTask {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn is_completed(&self) -> bool {
        self.is_completed
    }

    fn importance(&self) -> Option<Importance> {
        self.priority
    }

    fn urgency(&self) -> Option<Urgency> {
        self.urgency
    }

    fn source_system(&self) -> SourceSystem {
        self.source_system
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    fn estimated_duration(&self) -> Option<u32> {
        self.estimated_duration
    }

    fn task_type(&self) -> Option<TaskType> {
        self.task_type
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn external_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Access {
    #[default]
    NotRequested,
    Granted,
    Denied,
}

#[derive(Debug, Default)]
struct RemoteState {
    access: Access,
    deny_requests: bool,
    fail_next: Option<String>,
    records: Vec<RemoteTask>,
    next_id: u64,
}

/// Remote-style task source kept in process memory
#[derive(Debug, Clone)]
pub struct MemoryRemoteSource {
    source_system: SourceSystem,
    api_token: Option<String>,
    state: Arc<RwLock<RemoteState>>,
}

impl MemoryRemoteSource {
    /// Source tagged `source_system`; unconfigured without a token
    pub fn new(source_system: SourceSystem, api_token: Option<String>) -> Self {
        Self {
            source_system,
            api_token: api_token.filter(|t| !t.trim().is_empty()),
            state: Arc::new(RwLock::new(RemoteState::default())),
        }
    }

    pub fn notion(api_token: impl Into<String>) -> Self {
        Self::new(SourceSystem::Notion, Some(api_token.into()))
    }

    pub fn todoist(api_token: impl Into<String>) -> Self {
        Self::new(SourceSystem::Todoist, Some(api_token.into()))
    }

    /// Make every later access request fail (user declined)
    pub fn deny_access(&self) -> Result<()> {
        let mut state = self.lock()?;
        state.deny_requests = true;
        state.access = Access::Denied;
        Ok(())
    }

    /// Fail the next data operation with a transport error
    pub fn fail_next(&self, message: impl Into<String>) -> Result<()> {
        self.lock()?.fail_next = Some(message.into());
        Ok(())
    }

    /// Put a record straight into the backend, bypassing access checks
    pub fn seed(&self, mut record: RemoteTask) -> Result<()> {
        record.source_system = self.source_system;
        self.lock()?.records.push(record);
        Ok(())
    }

    /// Snapshot of every record, in creation order
    pub fn records(&self) -> Result<Vec<RemoteTask>> {
        Ok(self.lock()?.records.clone())
    }

    fn lock(&self) -> Result<RwLockWriteGuard<'_, RemoteState>> {
        self.state
            .write()
            .map_err(|e| AppError::Internal(format!("Remote state lock poisoned: {e}")))
    }

    /// Lock the state for a data operation: requires a grant, then consumes
    /// an injected fault.
    fn guarded(&self, operation: &str) -> Result<RwLockWriteGuard<'_, RemoteState>> {
        let mut state = self.lock()?;
        if state.access != Access::Granted {
            warn!(source = %self.source_system, operation = operation, "Access not granted");
            return Err(AppError::Authorization(format!(
                "{} access has not been granted",
                self.source_system.display_name()
            )));
        }
        if let Some(message) = state.fail_next.take() {
            warn!(source = %self.source_system, operation = operation, error = %message, "Remote call failed");
            return Err(AppError::Transport(message));
        }
        Ok(state)
    }

    fn set_completed(&self, task_id: &str, completed: bool) -> Result<()> {
        let mut state = self.guarded("set_completed")?;
        match state.records.iter_mut().find(|r| r.id == task_id) {
            Some(record) => record.is_completed = completed,
            None => debug!(source = %self.source_system, task_id = %task_id, "Unknown remote task"),
        }
        Ok(())
    }

    fn grant(&self) -> Result<()> {
        if self.api_token.is_none() {
            return Err(AppError::Authorization(format!(
                "{} API token is not configured",
                self.source_system.display_name()
            )));
        }

        let mut state = self.lock()?;
        if state.deny_requests {
            state.access = Access::Denied;
            return Err(AppError::Authorization(format!(
                "{} access was denied",
                self.source_system.display_name()
            )));
        }
        state.access = Access::Granted;
        Ok(())
    }

    fn insert_draft(&self, draft: TaskDraft) -> Result<RemoteTask> {
        draft.validate()?;

        let mut state = self.guarded("create_task")?;
        state.next_id += 1;
        let record = RemoteTask {
            id: format!("{}-{}", self.source_system.as_str(), state.next_id),
            title: draft.title.trim().to_string(),
            is_completed: false,
            priority: draft.importance,
            urgency: draft.urgency,
            tags: draft.tags,
            due_date: draft.due_date,
            estimated_duration: draft.estimated_duration,
            task_type: draft.task_type,
            description: draft.description,
            source_system: self.source_system,
        };
        state.records.push(record.clone());
        Ok(record)
    }

    fn apply_patch(&self, task_id: &str, patch: TaskPatch) -> Result<()> {
        patch.validate()?;

        let mut state = self.guarded("update_task")?;
        let Some(record) = state.records.iter_mut().find(|r| r.id == task_id) else {
            debug!(source = %self.source_system, task_id = %task_id, "Unknown remote task");
            return Ok(());
        };

        if let Some(title) = patch.title {
            record.title = title.trim().to_string();
        }
        if let Some(tags) = patch.tags {
            record.tags = tags;
        }
        if patch.due_date.is_some() {
            record.due_date = patch.due_date;
        }
        if patch.importance.is_some() {
            record.priority = patch.importance;
        }
        if patch.urgency.is_some() {
            record.urgency = patch.urgency;
        }
        if patch.estimated_duration.is_some() {
            record.estimated_duration = patch.estimated_duration;
        }
        if patch.task_type.is_some() {
            record.task_type = patch.task_type;
        }
        if patch.description.is_some() {
            record.description = patch.description;
        }
        Ok(())
    }

    fn remove(&self, task_id: &str) -> Result<bool> {
        let mut state = self.guarded("delete_task")?;
        let before = state.records.len();
        state.records.retain(|r| r.id != task_id);
        Ok(state.records.len() < before)
    }

    fn incomplete(&self) -> Result<Vec<RemoteTask>> {
        let state = self.guarded("fetch_incomplete_tasks")?;
        Ok(state
            .records
            .iter()
            .filter(|r| !r.is_completed)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaskSource for MemoryRemoteSource {
    type Record = RemoteTask;

    fn source_system(&self) -> SourceSystem {
        self.source_system
    }

    fn is_configured(&self) -> bool {
        self.api_token.is_some()
    }

    async fn request_access(&self) -> Result<()> {
        self.grant()?;
        info!(source = %self.source_system, "Access granted");
        Ok(())
    }

    async fn fetch_incomplete_tasks(&self) -> Result<Vec<RemoteTask>> {
        let records = self.incomplete()?;
        debug!(source = %self.source_system, count = records.len(), "Fetched remote tasks");
        Ok(records)
    }

    async fn mark_complete(&self, task_id: &str) -> Result<()> {
        self.set_completed(task_id, true)
    }

    async fn mark_incomplete(&self, task_id: &str) -> Result<()> {
        self.set_completed(task_id, false)
    }
}

#[async_trait]
impl TaskSourceWritable for MemoryRemoteSource {
    async fn create_task(&self, draft: TaskDraft) -> Result<RemoteTask> {
        let record = self.insert_draft(draft)?;
        info!(source = %self.source_system, task_id = %record.id, "Remote task created");
        Ok(record)
    }

    async fn update_task(&self, task_id: &str, patch: TaskPatch) -> Result<()> {
        self.apply_patch(task_id, patch)
    }

    async fn delete_task(&self, task_id: &str) -> Result<()> {
        if self.remove(task_id)? {
            info!(source = %self.source_system, task_id = %task_id, "Remote task deleted");
        }
        Ok(())
    }
}
