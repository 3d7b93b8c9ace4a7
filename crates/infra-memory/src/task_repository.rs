// In-Memory TaskRepository Implementation

use async_trait::async_trait;
use focusblox_core::domain::{SourceSystem, Task};
use focusblox_core::error::{AppError, Result};
use focusblox_core::port::TaskRepository;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory task repository.
///
/// Mirrors the SQLite adapter's semantics: duplicate ids fail with a
/// transport error, updates of unknown ids change nothing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<HashMap<String, Task>>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Task>>> {
        self.tasks
            .read()
            .map_err(|e| AppError::Internal(format!("Task store lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Task>>> {
        self.tasks
            .write()
            .map_err(|e| AppError::Internal(format!("Task store lock poisoned: {e}")))
    }

    fn collect_sorted(
        &self,
        filter: impl Fn(&Task) -> bool,
        newest_first_by: impl Fn(&Task) -> i64,
    ) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self.read()?.values().filter(|t| filter(t)).cloned().collect();
        tasks.sort_by(|a, b| {
            newest_first_by(b)
                .cmp(&newest_first_by(a))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(tasks)
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert(&self, task: &Task) -> Result<()> {
        let mut tasks = self.write()?;
        if tasks.contains_key(&task.id) {
            return Err(AppError::Transport(format!(
                "Unique constraint violation: task {} already exists",
                task.id
            )));
        }
        tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.read()?.get(id).cloned())
    }

    async fn find_by_external_id(
        &self,
        source_system: SourceSystem,
        external_id: &str,
    ) -> Result<Option<Task>> {
        Ok(self
            .read()?
            .values()
            .find(|t| {
                t.source_system == source_system && t.external_id.as_deref() == Some(external_id)
            })
            .cloned())
    }

    async fn update(&self, task: &Task) -> Result<()> {
        if let Some(stored) = self.write()?.get_mut(&task.id) {
            *stored = task.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.write()?.remove(id).is_some())
    }

    async fn find_incomplete(&self) -> Result<Vec<Task>> {
        self.collect_sorted(|t| !t.is_completed, |t| t.created_at)
    }

    async fn find_completed_since(&self, cutoff_millis: i64) -> Result<Vec<Task>> {
        self.collect_sorted(
            |t| t.is_completed && t.completed_at.is_some_and(|at| at >= cutoff_millis),
            |t| t.completed_at.unwrap_or_default(),
        )
    }

    async fn find_all(&self) -> Result<Vec<Task>> {
        self.collect_sorted(|_| true, |t| t.sort_order)
    }

    async fn max_sort_order(&self) -> Result<Option<i64>> {
        Ok(self.read()?.values().map(|t| t.sort_order).max())
    }

    async fn has_open_instance(&self, recurrence_group_id: &str) -> Result<bool> {
        Ok(self.read()?.values().any(|t| {
            !t.is_completed && t.recurrence_group_id.as_deref() == Some(recurrence_group_id)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_find_delete() {
        let repo = InMemoryTaskRepository::new();
        let task = Task::new("t-1", 1, "Einkaufen");

        repo.insert(&task).await.unwrap();
        assert_eq!(repo.find_by_id("t-1").await.unwrap(), Some(task.clone()));

        let err = repo.insert(&task).await.unwrap_err();
        assert!(err.is_transport());

        assert!(repo.delete("t-1").await.unwrap());
        assert!(!repo.delete("t-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_unknown_is_ignored() {
        let repo = InMemoryTaskRepository::new();
        repo.update(&Task::new("ghost", 1, "Geist")).await.unwrap();
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_orderings() {
        let repo = InMemoryTaskRepository::new();
        for (id, created_at) in [("a", 1), ("c", 3), ("b", 2)] {
            repo.insert(&Task::new(id, created_at, id)).await.unwrap();
        }
        let mut done = Task::new("d", 4, "d");
        done.mark_complete(50);
        repo.insert(&done).await.unwrap();

        let open: Vec<String> = repo
            .find_incomplete()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(open, vec!["c", "b", "a"]);

        assert_eq!(repo.find_completed_since(50).await.unwrap().len(), 1);
        assert!(repo.find_completed_since(51).await.unwrap().is_empty());
    }
}
