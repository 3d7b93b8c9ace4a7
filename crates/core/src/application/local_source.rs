// Local Task Source
//
// TaskSource backed by the local TaskRepository (the on-device store).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::undo::{CompletionSnapshot, CompletionUndo};
use crate::domain::recurrence::next_instance;
use crate::domain::{SourceSystem, Task};
use crate::error::Result;
use crate::port::time_provider::MILLIS_PER_DAY;
use crate::port::{
    IdProvider, TaskDraft, TaskPatch, TaskRepository, TaskSource, TaskSourceWritable,
    TimeProvider,
};

/// Task source for locally stored tasks.
///
/// Always configured, access is always granted. Remembers the last
/// completion so it can be undone.
pub struct LocalTaskSource {
    repo: Arc<dyn TaskRepository>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    undo: CompletionUndo,
}

impl LocalTaskSource {
    pub fn new(
        repo: Arc<dyn TaskRepository>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            repo,
            id_provider,
            time_provider,
            undo: CompletionUndo::new(),
        }
    }

    pub async fn find_task(&self, task_id: &str) -> Result<Option<Task>> {
        self.repo.find_by_id(task_id).await
    }

    /// Tasks completed within the last `days` days, latest completion first
    pub async fn fetch_completed_tasks(&self, days: u32) -> Result<Vec<Task>> {
        let cutoff = self.time_provider.now_millis() - i64::from(days) * MILLIS_PER_DAY;
        self.repo.find_completed_since(cutoff).await
    }

    /// Every tag in use, most used first (ties alphabetical)
    pub async fn fetch_all_used_tags(&self) -> Result<Vec<String>> {
        let tasks = self.repo.find_all().await?;

        let mut counts: HashMap<String, usize> = HashMap::new();
        for tag in tasks.into_iter().flat_map(|t| t.tags) {
            *counts.entry(tag).or_default() += 1;
        }

        let mut tags: Vec<(String, usize)> = counts.into_iter().collect();
        tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(tags.into_iter().map(|(tag, _)| tag).collect())
    }

    async fn next_sort_order(&self) -> Result<i64> {
        Ok(self.repo.max_sort_order().await?.map_or(0, |max| max + 1))
    }

    /// Store the follow-up instance unless the series already has an open one
    async fn spawn_next_instance(&self, mut instance: Task) -> Result<Option<String>> {
        let group_id = instance.recurrence_group_id.clone().unwrap_or_default();
        if self.repo.has_open_instance(&group_id).await? {
            debug!(group_id = %group_id, "Series already has an open instance");
            return Ok(None);
        }

        instance.sort_order = self.next_sort_order().await?;
        self.repo.insert(&instance).await?;

        info!(
            task_id = %instance.id,
            group_id = %group_id,
            due_date = ?instance.due_date,
            "Created next recurring instance"
        );
        Ok(Some(instance.id))
    }

    pub fn can_undo_completion(&self) -> Result<bool> {
        self.undo.can_undo()
    }

    /// Revert the most recent completion.
    ///
    /// Reopens the task with its Next Up staging and focus block restored and
    /// deletes the recurring instance the completion spawned. Returns the
    /// task title, or `None` when there is nothing to undo or the task was
    /// reopened or deleted in the meantime.
    pub async fn undo_last_completion(&self) -> Result<Option<String>> {
        let Some(snapshot) = self.undo.take()? else {
            return Ok(None);
        };
        let Some(mut task) = self.repo.find_by_id(&snapshot.task_id).await? else {
            debug!(task_id = %snapshot.task_id, "Undo target no longer exists");
            return Ok(None);
        };
        if !task.is_completed {
            debug!(task_id = %task.id, "Undo target already reopened");
            return Ok(None);
        }

        snapshot.restore(&mut task);
        self.repo.update(&task).await?;

        if let Some(instance_id) = &snapshot.created_instance_id {
            self.repo.delete(instance_id).await?;
        }

        info!(
            task_id = %task.id,
            removed_instance = ?snapshot.created_instance_id,
            "Completion undone"
        );
        Ok(Some(task.title))
    }
}

#[async_trait]
impl TaskSource for LocalTaskSource {
    type Record = Task;

    fn source_system(&self) -> SourceSystem {
        SourceSystem::Local
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn request_access(&self) -> Result<()> {
        Ok(())
    }

    async fn fetch_incomplete_tasks(&self) -> Result<Vec<Task>> {
        let today = self.time_provider.today();
        let tasks = self.repo.find_incomplete().await?;
        Ok(tasks
            .into_iter()
            .filter(|t| t.is_visible_in_backlog(today))
            .collect())
    }

    async fn mark_complete(&self, task_id: &str) -> Result<()> {
        let Some(mut task) = self.repo.find_by_id(task_id).await? else {
            debug!(task_id = %task_id, "mark_complete: unknown task");
            return Ok(());
        };

        let mut snapshot = CompletionSnapshot::capture(&task);
        let now = self.time_provider.now_millis();
        if !task.mark_complete(now) {
            debug!(task_id = %task_id, "Task already completed");
            return Ok(());
        }

        let instance = next_instance(
            &mut task,
            self.id_provider.generate_id(),
            now,
            self.time_provider.today(),
        );

        self.repo.update(&task).await?;
        info!(task_id = %task_id, "Task completed");

        if let Some(instance) = instance {
            snapshot.created_instance_id = self.spawn_next_instance(instance).await?;
        }
        self.undo.record(snapshot)?;
        Ok(())
    }

    async fn mark_incomplete(&self, task_id: &str) -> Result<()> {
        let Some(mut task) = self.repo.find_by_id(task_id).await? else {
            debug!(task_id = %task_id, "mark_incomplete: unknown task");
            return Ok(());
        };

        if task.mark_incomplete() {
            self.repo.update(&task).await?;
            self.undo.forget(task_id)?;
            info!(task_id = %task_id, "Task reopened");
        }
        Ok(())
    }
}

#[async_trait]
impl TaskSourceWritable for LocalTaskSource {
    async fn create_task(&self, draft: TaskDraft) -> Result<Task> {
        draft.validate()?;

        let sort_order = self.next_sort_order().await?;
        let task = draft.into_task(
            self.id_provider.generate_id(),
            self.time_provider.now_millis(),
            sort_order,
            SourceSystem::Local,
        );
        self.repo.insert(&task).await?;

        info!(task_id = %task.id, sort_order = sort_order, tbd = task.is_tbd(), "Task created");
        Ok(task)
    }

    async fn update_task(&self, task_id: &str, patch: TaskPatch) -> Result<()> {
        patch.validate()?;

        let Some(mut task) = self.repo.find_by_id(task_id).await? else {
            debug!(task_id = %task_id, "update_task: unknown task");
            return Ok(());
        };

        patch.apply(&mut task);
        self.repo.update(&task).await?;
        debug!(task_id = %task_id, "Task updated");
        Ok(())
    }

    async fn delete_task(&self, task_id: &str) -> Result<()> {
        self.undo.forget(task_id)?;
        if self.repo.delete(task_id).await? {
            info!(task_id = %task_id, "Task deleted");
        } else {
            debug!(task_id = %task_id, "delete_task: unknown task");
        }
        Ok(())
    }
}
