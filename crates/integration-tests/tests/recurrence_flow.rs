//! Recurring Task Flow
//!
//! Completing a recurring task over the SQLite store spawns exactly one open
//! follow-up instance per series, hidden from the backlog until its due day.

use chrono::NaiveDate;
use std::sync::Arc;

use focusblox_core::application::LocalTaskSource;
use focusblox_core::domain::{RecurrencePattern, Task};
use focusblox_core::port::id_provider::SequentialIdProvider;
use focusblox_core::port::time_provider::FixedTimeProvider;
use focusblox_core::port::{TaskDraft, TaskRepository, TaskSource, TaskSourceWritable};
use focusblox_infra_sqlite::{create_pool, run_migrations, SqliteTaskRepository};

const NOW: i64 = 1_773_144_000_000; // 2026-03-10T12:00:00Z

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn setup() -> (Arc<SqliteTaskRepository>, LocalTaskSource) {
    let pool = create_pool(":memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let repo = Arc::new(SqliteTaskRepository::new(pool));

    let source = LocalTaskSource::new(
        repo.clone(),
        Arc::new(SequentialIdProvider::new("task")),
        // Tuesday
        Arc::new(FixedTimeProvider::new(NOW, date(2026, 3, 10))),
    );
    (repo, source)
}

#[tokio::test]
async fn test_weekly_completion_spawns_one_instance() {
    let (repo, source) = setup().await;

    let task = source
        .create_task(TaskDraft {
            title: "Wochenplanung".into(),
            due_date: Some(date(2026, 3, 10)),
            recurrence_pattern: RecurrencePattern::Weekly,
            recurrence_weekdays: Some(vec![3]), // Wednesday
            tags: vec!["routine".into()],
            estimated_duration: Some(20),
            ..Default::default()
        })
        .await
        .unwrap();

    source.mark_complete(&task.id).await.unwrap();

    let completed = repo.find_by_id(&task.id).await.unwrap().unwrap();
    assert!(completed.is_completed);
    assert_eq!(completed.completed_at, Some(NOW));
    assert_eq!(completed.recurrence_group_id.as_deref(), Some(task.id.as_str()));

    let open: Vec<Task> = repo.find_incomplete().await.unwrap();
    assert_eq!(open.len(), 1);
    let instance = &open[0];
    assert_ne!(instance.id, task.id);
    assert_eq!(instance.title, "Wochenplanung");
    assert_eq!(instance.due_date, Some(date(2026, 3, 11)));
    assert_eq!(instance.recurrence_group_id.as_deref(), Some(task.id.as_str()));
    assert_eq!(instance.tags, vec!["routine".to_string()]);
    assert_eq!(instance.estimated_duration, Some(20));
    assert!(instance.sort_order > completed.sort_order);

    // Due tomorrow: hidden from the backlog today
    assert!(source.fetch_incomplete_tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_recompleting_does_not_duplicate_instances() {
    let (repo, source) = setup().await;

    let task = source
        .create_task(TaskDraft {
            title: "Blumen gießen".into(),
            recurrence_pattern: RecurrencePattern::Daily,
            ..Default::default()
        })
        .await
        .unwrap();

    source.mark_complete(&task.id).await.unwrap();
    source.mark_incomplete(&task.id).await.unwrap();
    source.mark_complete(&task.id).await.unwrap();

    let series: Vec<Task> = repo
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.recurrence_group_id.as_deref() == Some(task.id.as_str()))
        .collect();
    assert_eq!(series.len(), 2);
    assert_eq!(series.iter().filter(|t| !t.is_completed).count(), 1);

    // No due date: next instance is based on today
    let open = series.iter().find(|t| !t.is_completed).unwrap();
    assert_eq!(open.due_date, Some(date(2026, 3, 11)));
}

#[tokio::test]
async fn test_monthly_last_day_series() {
    let (repo, source) = setup().await;

    let task = source
        .create_task(TaskDraft {
            title: "Miete prüfen".into(),
            due_date: Some(date(2026, 1, 31)),
            recurrence_pattern: RecurrencePattern::Monthly,
            recurrence_month_day: Some(32),
            ..Default::default()
        })
        .await
        .unwrap();

    source.mark_complete(&task.id).await.unwrap();

    let open = repo.find_incomplete().await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].due_date, Some(date(2026, 2, 28)));
    assert_eq!(open[0].recurrence_month_day, Some(32));
}

#[tokio::test]
async fn test_completion_clears_planning_state() {
    let (repo, source) = setup().await;
    let task = source
        .create_task(TaskDraft::titled("Fokus"))
        .await
        .unwrap();

    let mut staged = repo.find_by_id(&task.id).await.unwrap().unwrap();
    staged.set_next_up(true);
    staged.assign_focus_block(Some("block-1".into()));
    repo.update(&staged).await.unwrap();

    source.mark_complete(&task.id).await.unwrap();

    let done = repo.find_by_id(&task.id).await.unwrap().unwrap();
    assert!(!done.is_next_up);
    assert_eq!(done.next_up_sort_order, None);
    assert_eq!(done.assigned_focus_block_id, None);

    source.mark_incomplete(&task.id).await.unwrap();
    let reopened = repo.find_by_id(&task.id).await.unwrap().unwrap();
    assert!(!reopened.is_completed);
    assert_eq!(reopened.completed_at, None);
}

#[tokio::test]
async fn test_undo_leaves_one_open_task_per_series() {
    let (repo, source) = setup().await;
    let task = source
        .create_task(TaskDraft {
            title: "Tagebuch".into(),
            recurrence_pattern: RecurrencePattern::Daily,
            ..Default::default()
        })
        .await
        .unwrap();

    let mut staged = repo.find_by_id(&task.id).await.unwrap().unwrap();
    staged.set_next_up(true);
    staged.next_up_sort_order = Some(0);
    staged.assign_focus_block(Some("abend".into()));
    repo.update(&staged).await.unwrap();

    source.mark_complete(&task.id).await.unwrap();
    assert_eq!(repo.find_all().await.unwrap().len(), 2);

    let title = source.undo_last_completion().await.unwrap();
    assert_eq!(title.as_deref(), Some("Tagebuch"));

    let all = repo.find_all().await.unwrap();
    assert_eq!(all.len(), 1);
    let restored = &all[0];
    assert_eq!(restored.id, task.id);
    assert!(!restored.is_completed);
    assert!(restored.is_next_up);
    assert_eq!(restored.next_up_sort_order, Some(0));
    assert_eq!(restored.assigned_focus_block_id.as_deref(), Some("abend"));

    // The snapshot is single-use
    assert!(source.undo_last_completion().await.unwrap().is_none());
}

#[tokio::test]
async fn test_undo_skips_task_reopened_by_hand() {
    let (repo, source) = setup().await;
    let task = source
        .create_task(TaskDraft::titled("Einmalig"))
        .await
        .unwrap();

    source.mark_complete(&task.id).await.unwrap();
    source.mark_incomplete(&task.id).await.unwrap();

    assert!(!source.can_undo_completion().unwrap());
    assert!(source.undo_last_completion().await.unwrap().is_none());
    assert!(!repo.find_by_id(&task.id).await.unwrap().unwrap().is_completed);
}
