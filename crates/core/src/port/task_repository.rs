// Task Repository Port (Interface)

use crate::domain::{SourceSystem, Task};
use crate::error::Result;
use async_trait::async_trait;

/// Persistence interface for locally stored tasks
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new task
    async fn insert(&self, task: &Task) -> Result<()>;

    /// Find task by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Task>>;

    /// Find the local mirror of a record owned by another backend
    async fn find_by_external_id(
        &self,
        source_system: SourceSystem,
        external_id: &str,
    ) -> Result<Option<Task>>;

    /// Overwrite every field of an existing task
    async fn update(&self, task: &Task) -> Result<()>;

    /// Delete task, returns whether a row was removed
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Incomplete tasks, newest first (created_at DESC)
    async fn find_incomplete(&self) -> Result<Vec<Task>>;

    /// Tasks completed at or after `cutoff_millis`, latest completion first
    async fn find_completed_since(&self, cutoff_millis: i64) -> Result<Vec<Task>>;

    /// All tasks regardless of state
    async fn find_all(&self) -> Result<Vec<Task>>;

    /// Highest sort order in use, None when empty
    async fn max_sort_order(&self) -> Result<Option<i64>>;

    /// Whether the recurrence series still has an incomplete instance
    async fn has_open_instance(&self, recurrence_group_id: &str) -> Result<bool>;
}
