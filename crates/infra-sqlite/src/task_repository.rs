// SQLite TaskRepository Implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use focusblox_core::domain::{
    EnergyLevel, Importance, RecurrencePattern, SourceSystem, Task, TaskType, Urgency,
};
use focusblox_core::error::{AppError, Result};
use focusblox_core::port::TaskRepository;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::query::Query;
use sqlx::SqlitePool;
use tracing::debug;

// Every storage failure surfaces as a transport error to the task source layer
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => AppError::Transport(format!(
                        "Unique constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "5" => AppError::Transport(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "13" => AppError::Transport(format!("Database full: {}", db_err.message())),
                    _ => AppError::Transport(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            }
            None => AppError::Transport(format!("Database error: {}", db_err.message())),
        },
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Transport(format!("Column not found: {}", col))
        }
        sqlx::Error::ColumnDecode { index, source } => {
            AppError::Transport(format!("Failed to decode column {}: {}", index, source))
        }
        _ => AppError::Transport(err.to_string()),
    }
}

// Non-id columns in canonical order; `id` is always bound last.
const INSERT_SQL: &str = r#"
    INSERT INTO tasks (
        title, is_completed, importance, tags, due_date,
        created_at, sort_order, estimated_duration, urgency, task_type,
        recurrence_pattern, recurrence_weekdays, recurrence_month_day, recurrence_group_id, description,
        is_next_up, next_up_sort_order, assigned_focus_block_id, reschedule_count, completed_at,
        external_id, source_system, ai_score, ai_energy_level,
        id
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_SQL: &str = r#"
    UPDATE tasks
    SET title = ?, is_completed = ?, importance = ?, tags = ?, due_date = ?,
        created_at = ?, sort_order = ?, estimated_duration = ?, urgency = ?, task_type = ?,
        recurrence_pattern = ?, recurrence_weekdays = ?, recurrence_month_day = ?,
        recurrence_group_id = ?, description = ?,
        is_next_up = ?, next_up_sort_order = ?, assigned_focus_block_id = ?,
        reschedule_count = ?, completed_at = ?,
        external_id = ?, source_system = ?, ai_score = ?, ai_energy_level = ?
    WHERE id = ?
"#;

pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Column names of the `tasks` table, in table order
    pub async fn column_names(&self) -> Result<Vec<String>> {
        sqlx::query_scalar("SELECT name FROM pragma_table_info('tasks') ORDER BY cid")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

fn into_tasks(rows: Vec<TaskRow>) -> Result<Vec<Task>> {
    rows.into_iter().map(TaskRow::into_task).collect()
}

/// Text columns that need encoding before binding
struct EncodedColumns {
    tags: String,
    recurrence_weekdays: Option<String>,
}

impl EncodedColumns {
    fn new(task: &Task) -> Result<Self> {
        Ok(Self {
            tags: serde_json::to_string(&task.tags)?,
            recurrence_weekdays: task
                .recurrence_weekdays
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
        })
    }
}

fn bind_task<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    task: &'q Task,
    encoded: &'q EncodedColumns,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    query
        .bind(&task.title)
        .bind(task.is_completed)
        .bind(task.importance.map(|i| i64::from(i.value())))
        .bind(&encoded.tags)
        .bind(task.due_date)
        .bind(task.created_at)
        .bind(task.sort_order)
        .bind(task.estimated_duration.map(i64::from))
        .bind(task.urgency.map(Urgency::as_str))
        .bind(task.task_type.map_or("", TaskType::as_str))
        .bind(task.recurrence_pattern.as_str())
        .bind(&encoded.recurrence_weekdays)
        .bind(task.recurrence_month_day.map(i64::from))
        .bind(&task.recurrence_group_id)
        .bind(&task.description)
        .bind(task.is_next_up)
        .bind(task.next_up_sort_order)
        .bind(&task.assigned_focus_block_id)
        .bind(i64::from(task.reschedule_count))
        .bind(task.completed_at)
        .bind(&task.external_id)
        .bind(task.source_system.as_str())
        .bind(task.ai_score)
        .bind(task.ai_energy_level.map(EnergyLevel::as_str))
        .bind(&task.id)
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn insert(&self, task: &Task) -> Result<()> {
        let encoded = EncodedColumns::new(task)?;
        bind_task(sqlx::query(INSERT_SQL), task, &encoded)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        debug!(task_id = %task.id, "Task row inserted");
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(TaskRow::into_task).transpose()
    }

    async fn find_by_external_id(
        &self,
        source_system: SourceSystem,
        external_id: &str,
    ) -> Result<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            "SELECT * FROM tasks WHERE source_system = ? AND external_id = ?",
        )
        .bind(source_system.as_str())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(TaskRow::into_task).transpose()
    }

    async fn update(&self, task: &Task) -> Result<()> {
        let encoded = EncodedColumns::new(task)?;
        bind_task(sqlx::query(UPDATE_SQL), task, &encoded)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_incomplete(&self) -> Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            "SELECT * FROM tasks WHERE is_completed = 0 ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        into_tasks(rows)
    }

    async fn find_completed_since(&self, cutoff_millis: i64) -> Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            "SELECT * FROM tasks WHERE is_completed = 1 AND completed_at >= ? ORDER BY completed_at DESC",
        )
        .bind(cutoff_millis)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        into_tasks(rows)
    }

    async fn find_all(&self) -> Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            "SELECT * FROM tasks ORDER BY sort_order DESC, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        into_tasks(rows)
    }

    async fn max_sort_order(&self) -> Result<Option<i64>> {
        sqlx::query_scalar("SELECT MAX(sort_order) FROM tasks")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn has_open_instance(&self, recurrence_group_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE recurrence_group_id = ? AND is_completed = 0",
        )
        .bind(recurrence_group_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(count > 0)
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: String,
    title: String,
    is_completed: bool,
    importance: Option<i64>,
    tags: String, // JSON array
    due_date: Option<NaiveDate>,
    created_at: i64,
    sort_order: i64,
    estimated_duration: Option<i64>,
    urgency: Option<String>,
    task_type: String, // '' when unset
    recurrence_pattern: String,
    recurrence_weekdays: Option<String>, // JSON array
    recurrence_month_day: Option<i64>,
    recurrence_group_id: Option<String>,
    description: Option<String>,
    is_next_up: bool,
    next_up_sort_order: Option<i64>,
    assigned_focus_block_id: Option<String>,
    reschedule_count: i64,
    completed_at: Option<i64>,
    external_id: Option<String>,
    source_system: String,
    ai_score: Option<i32>,
    ai_energy_level: Option<String>,
}

impl TaskRow {
    fn into_task(self) -> Result<Task> {
        let task_type = match self.task_type.as_str() {
            "" => None,
            other => Some(other.parse::<TaskType>()?),
        };

        Ok(Task {
            id: self.id,
            title: self.title,
            is_completed: self.is_completed,
            importance: self.importance.map(Importance::try_from).transpose()?,
            tags: serde_json::from_str(&self.tags)?,
            due_date: self.due_date,
            created_at: self.created_at,
            sort_order: self.sort_order,
            estimated_duration: self
                .estimated_duration
                .map(|v| narrow("estimated_duration", v))
                .transpose()?,
            urgency: self.urgency.as_deref().map(str::parse::<Urgency>).transpose()?,
            task_type,
            recurrence_pattern: self.recurrence_pattern.parse::<RecurrencePattern>()?,
            recurrence_weekdays: self
                .recurrence_weekdays
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            recurrence_month_day: self
                .recurrence_month_day
                .map(|v| narrow("recurrence_month_day", v))
                .transpose()?,
            recurrence_group_id: self.recurrence_group_id,
            description: self.description,
            is_next_up: self.is_next_up,
            next_up_sort_order: self.next_up_sort_order,
            assigned_focus_block_id: self.assigned_focus_block_id,
            reschedule_count: narrow("reschedule_count", self.reschedule_count)?,
            completed_at: self.completed_at,
            external_id: self.external_id,
            source_system: self.source_system.parse::<SourceSystem>()?,
            ai_score: self.ai_score,
            ai_energy_level: self
                .ai_energy_level
                .as_deref()
                .map(str::parse::<EnergyLevel>)
                .transpose()?,
        })
    }
}

fn narrow<T: TryFrom<i64>>(column: &str, value: i64) -> Result<T> {
    T::try_from(value)
        .map_err(|_| AppError::Validation(format!("{column} out of range: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use focusblox_core::domain::TASK_FIELDS;

    async fn setup_test_db() -> SqliteTaskRepository {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteTaskRepository::new(pool)
    }

    fn enriched_task(id: &str, created_at: i64) -> Task {
        let mut task = Task::new(id, created_at, "Steuererklärung");
        task.importance = Some(Importance::High);
        task.tags = vec!["finanzen".into(), "privat".into()];
        task.due_date = NaiveDate::from_ymd_opt(2026, 5, 31);
        task.estimated_duration = Some(90);
        task.urgency = Some(Urgency::NotUrgent);
        task.task_type = Some(TaskType::Maintenance);
        task.recurrence_pattern = RecurrencePattern::Weekly;
        task.recurrence_weekdays = Some(vec![1, 4]);
        task.description = Some("Belege sammeln".into());
        task.ai_score = Some(72);
        task.ai_energy_level = Some(EnergyLevel::High);
        task
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = setup_test_db().await;
        let task = enriched_task("t-1", 1_000);

        repo.insert(&task).await.unwrap();

        let found = repo.find_by_id("t-1").await.unwrap();
        assert_eq!(found, Some(task));
    }

    #[tokio::test]
    async fn test_tbd_task_stores_empty_task_type() {
        let repo = setup_test_db().await;
        repo.insert(&Task::new("tbd", 1, "Nur Titel")).await.unwrap();

        let stored: String = sqlx::query_scalar("SELECT task_type FROM tasks WHERE id = 'tbd'")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(stored, "");

        let task = repo.find_by_id("tbd").await.unwrap().unwrap();
        assert!(task.is_tbd());
        assert_eq!(task.task_type, None);
    }

    #[tokio::test]
    async fn test_update_overwrites_fields() {
        let repo = setup_test_db().await;
        let mut task = enriched_task("t-1", 1_000);
        repo.insert(&task).await.unwrap();

        task.title = "Steuererklärung 2025".into();
        task.mark_complete(5_000);
        task.tags.clear();
        repo.update(&task).await.unwrap();

        let found = repo.find_by_id("t-1").await.unwrap().unwrap();
        assert_eq!(found, task);
    }

    #[tokio::test]
    async fn test_incomplete_newest_first() {
        let repo = setup_test_db().await;
        repo.insert(&Task::new("old", 1, "Alt")).await.unwrap();
        repo.insert(&Task::new("new", 2, "Neu")).await.unwrap();
        let mut done = Task::new("done", 3, "Erledigt");
        done.mark_complete(4);
        repo.insert(&done).await.unwrap();

        let ids: Vec<String> = repo
            .find_incomplete()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_completed_since_respects_cutoff() {
        let repo = setup_test_db().await;
        for (id, completed_at) in [("a", 100), ("b", 300), ("c", 200)] {
            let mut task = Task::new(id, 1, id);
            task.mark_complete(completed_at);
            repo.insert(&task).await.unwrap();
        }

        let ids: Vec<String> = repo
            .find_completed_since(150)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_max_sort_order_and_delete() {
        let repo = setup_test_db().await;
        assert_eq!(repo.max_sort_order().await.unwrap(), None);

        let mut task = Task::new("t", 1, "Sortiert");
        task.sort_order = 7;
        repo.insert(&task).await.unwrap();
        assert_eq!(repo.max_sort_order().await.unwrap(), Some(7));

        assert!(repo.delete("t").await.unwrap());
        assert!(!repo.delete("t").await.unwrap());
    }

    #[tokio::test]
    async fn test_open_instance_and_external_lookup() {
        let repo = setup_test_db().await;
        let mut task = Task::new("r-2", 1, "Wöchentlich");
        task.recurrence_pattern = RecurrencePattern::Weekly;
        task.recurrence_group_id = Some("r-1".into());
        task.external_id = Some("page-9".into());
        task.source_system = SourceSystem::Notion;
        repo.insert(&task).await.unwrap();

        assert!(repo.has_open_instance("r-1").await.unwrap());
        assert!(!repo.has_open_instance("other").await.unwrap());

        let mirror = repo
            .find_by_external_id(SourceSystem::Notion, "page-9")
            .await
            .unwrap();
        assert_eq!(mirror.map(|t| t.id), Some("r-2".to_string()));
        assert!(repo
            .find_by_external_id(SourceSystem::Todoist, "page-9")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_transport_error() {
        let repo = setup_test_db().await;
        let task = Task::new("dup", 1, "Doppelt");
        repo.insert(&task).await.unwrap();

        let err = repo.insert(&task).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_columns_match_canonical_fields() {
        let repo = setup_test_db().await;
        let columns = repo.column_names().await.unwrap();
        assert_eq!(columns, TASK_FIELDS.to_vec());
    }
}
