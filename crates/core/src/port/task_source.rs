// Task Source Port (Interface)
//
// Uniform read/write contract over heterogeneous task backends: the local
// store, Notion, Todoist, ...

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::task::validate_recurrence;
use crate::domain::{
    DomainError, Importance, RecurrencePattern, SourceSystem, Task, TaskType, Urgency,
};
use crate::error::Result;

/// Record returned by a task source.
///
/// Identity, title, completion, importance, urgency and source tag must be
/// exposed by every backend (importance and urgency may still be unset on a
/// TBD task). The remaining accessors default to "not supported".
pub trait TaskSourceData {
    fn id(&self) -> &str;
    fn title(&self) -> &str;
    fn is_completed(&self) -> bool;
    fn importance(&self) -> Option<Importance>;
    fn urgency(&self) -> Option<Urgency>;
    fn source_system(&self) -> SourceSystem;

    fn tags(&self) -> &[String] {
        &[]
    }

    fn due_date(&self) -> Option<NaiveDate> {
        None
    }

    fn estimated_duration(&self) -> Option<u32> {
        None
    }

    fn task_type(&self) -> Option<TaskType> {
        None
    }

    fn recurrence_pattern(&self) -> RecurrencePattern {
        RecurrencePattern::Never
    }

    fn recurrence_weekdays(&self) -> Option<&[u8]> {
        None
    }

    fn recurrence_month_day(&self) -> Option<u8> {
        None
    }

    fn description(&self) -> Option<&str> {
        None
    }

    /// Identifier of this record in a foreign system (e.g. a Notion page ID)
    fn external_id(&self) -> Option<&str> {
        None
    }
}

impl TaskSourceData for Task {
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
        self.importance
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

    fn recurrence_pattern(&self) -> RecurrencePattern {
        self.recurrence_pattern
    }

    fn recurrence_weekdays(&self) -> Option<&[u8]> {
        self.recurrence_weekdays.as_deref()
    }

    fn recurrence_month_day(&self) -> Option<u8> {
        self.recurrence_month_day
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }
}

/// Read-only task source
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Backend-native record type
    type Record: TaskSourceData + Send + Sync;

    /// Which backend this is
    fn source_system(&self) -> SourceSystem;

    /// Human-readable name for display
    fn display_name(&self) -> &str {
        self.source_system().display_name()
    }

    /// Whether the source is configured and ready to use (no side effects)
    fn is_configured(&self) -> bool;

    /// Request access (permissions, tokens, ...).
    ///
    /// Fails with `AppError::Authorization` when denied or not configured.
    async fn request_access(&self) -> Result<()>;

    /// Fetch all incomplete tasks.
    ///
    /// Fails with `AppError::Transport` on network/storage failure.
    async fn fetch_incomplete_tasks(&self) -> Result<Vec<Self::Record>>;

    /// Mark a task as complete. Idempotent; unknown IDs are a no-op.
    async fn mark_complete(&self, task_id: &str) -> Result<()>;

    /// Mark a task as incomplete. Idempotent; unknown IDs are a no-op.
    async fn mark_incomplete(&self, task_id: &str) -> Result<()>;
}

/// Task source that supports creating, updating and deleting tasks
#[async_trait]
pub trait TaskSourceWritable: TaskSource {
    /// Create a new task
    async fn create_task(&self, draft: TaskDraft) -> Result<Self::Record>;

    /// Partial update: `None` fields are left unchanged. Unknown IDs are a no-op.
    async fn update_task(&self, task_id: &str, patch: TaskPatch) -> Result<()>;

    /// Delete a task. Unknown IDs are a no-op.
    async fn delete_task(&self, task_id: &str) -> Result<()>;
}

/// Fields accepted when creating a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,

    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub importance: Option<Importance>,
    #[serde(default)]
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub task_type: Option<TaskType>,
    #[serde(default)]
    pub recurrence_pattern: RecurrencePattern,
    #[serde(default)]
    pub recurrence_weekdays: Option<Vec<u8>>,
    #[serde(default)]
    pub recurrence_month_day: Option<u8>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TaskDraft {
    /// TBD draft with only a title
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> std::result::Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::EmptyTitle);
        }
        validate_recurrence(
            self.recurrence_weekdays.as_deref(),
            self.recurrence_month_day,
        )
    }

    /// Materialize the draft into a task record
    pub fn into_task(
        self,
        id: impl Into<String>,
        created_at: i64,
        sort_order: i64,
        source_system: SourceSystem,
    ) -> Task {
        let mut task = Task::new(id, created_at, self.title.trim());
        task.tags = self.tags;
        task.due_date = self.due_date;
        task.importance = self.importance;
        task.estimated_duration = self.estimated_duration;
        task.urgency = self.urgency;
        task.task_type = self.task_type;
        task.recurrence_pattern = self.recurrence_pattern;
        task.recurrence_weekdays = self.recurrence_weekdays;
        task.recurrence_month_day = self.recurrence_month_day;
        task.description = self.description;
        task.sort_order = sort_order;
        task.source_system = source_system;
        task
    }
}

/// Partial update: every `None` leaves the stored value unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub importance: Option<Importance>,
    #[serde(default)]
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub task_type: Option<TaskType>,
    #[serde(default)]
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[serde(default)]
    pub recurrence_weekdays: Option<Vec<u8>>,
    #[serde(default)]
    pub recurrence_month_day: Option<u8>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    pub fn validate(&self) -> std::result::Result<(), DomainError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(DomainError::EmptyTitle);
            }
        }
        validate_recurrence(
            self.recurrence_weekdays.as_deref(),
            self.recurrence_month_day,
        )
    }

    /// Apply the set fields to `task`
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title.trim().to_string();
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(importance) = self.importance {
            task.importance = Some(importance);
        }
        if let Some(duration) = self.estimated_duration {
            task.estimated_duration = Some(duration);
        }
        if let Some(urgency) = self.urgency {
            task.urgency = Some(urgency);
        }
        if let Some(task_type) = self.task_type {
            task.task_type = Some(task_type);
        }
        if let Some(pattern) = self.recurrence_pattern {
            task.recurrence_pattern = pattern;
        }
        if let Some(weekdays) = self.recurrence_weekdays {
            task.recurrence_weekdays = Some(weekdays);
        }
        if let Some(month_day) = self.recurrence_month_day {
            task.recurrence_month_day = Some(month_day);
        }
        if let Some(description) = self.description {
            task.description = Some(description);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_leaves_unspecified_fields_unchanged() {
        let mut task = TaskDraft {
            title: "Original".into(),
            tags: vec!["a".into()],
            importance: Some(Importance::Low),
            description: Some("notes".into()),
            ..Default::default()
        }
        .into_task("id", 1, 0, SourceSystem::Local);

        TaskPatch {
            title: Some("Renamed".into()),
            urgency: Some(Urgency::Urgent),
            ..Default::default()
        }
        .apply(&mut task);

        assert_eq!(task.title, "Renamed");
        assert_eq!(task.urgency, Some(Urgency::Urgent));
        assert_eq!(task.tags, vec!["a".to_string()]);
        assert_eq!(task.importance, Some(Importance::Low));
        assert_eq!(task.description.as_deref(), Some("notes"));
    }

    #[test]
    fn test_empty_patch() {
        assert!(TaskPatch::default().is_empty());
        assert!(!TaskPatch {
            estimated_duration: Some(5),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn test_draft_validation() {
        assert_eq!(TaskDraft::titled(" ").validate(), Err(DomainError::EmptyTitle));
        let draft = TaskDraft {
            title: "Weekly".into(),
            recurrence_pattern: RecurrencePattern::Weekly,
            recurrence_weekdays: Some(vec![0]),
            ..Default::default()
        };
        assert_eq!(draft.validate(), Err(DomainError::InvalidWeekday(0)));
    }

    #[test]
    fn test_title_only_draft_becomes_tbd_task() {
        let task = TaskDraft::titled("  Nur Titel ").into_task("id", 7, 3, SourceSystem::Local);
        assert_eq!(task.title, "Nur Titel");
        assert_eq!(task.sort_order, 3);
        assert!(task.is_tbd());
        assert_eq!(task.source_system, SourceSystem::Local);
    }
}
