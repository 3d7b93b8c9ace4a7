//! Source Reconciliation Tests
//!
//! Mirrors a remote-style source into the SQLite store and checks that
//! completions travel in both directions without losing local enrichment.

use chrono::NaiveDate;
use std::sync::Arc;

use focusblox_core::application::{LocalTaskSource, SourceReconciler, SyncReport};
use focusblox_core::domain::{Importance, SourceSystem};
use focusblox_core::AppError;
use focusblox_core::port::id_provider::SequentialIdProvider;
use focusblox_core::port::time_provider::FixedTimeProvider;
use focusblox_core::port::{
    TaskDraft, TaskPatch, TaskRepository, TaskSource, TaskSourceWritable,
};
use focusblox_infra_memory::{MemoryRemoteSource, RemoteTask};
use focusblox_infra_sqlite::{create_pool, run_migrations, SqliteTaskRepository};

const NOW: i64 = 1_773_144_000_000;

async fn setup() -> (Arc<SqliteTaskRepository>, SourceReconciler) {
    let pool = create_pool(":memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let repo = Arc::new(SqliteTaskRepository::new(pool));

    let reconciler = SourceReconciler::new(
        repo.clone(),
        Arc::new(SequentialIdProvider::new("local")),
        Arc::new(FixedTimeProvider::new(
            NOW,
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        )),
    );
    (repo, reconciler)
}

fn seeded_notion() -> MemoryRemoteSource {
    let source = MemoryRemoteSource::notion("secret_abc");
    let mut report = RemoteTask::new("page-1", "Quartalsbericht");
    report.tags = vec!["arbeit".into()];
    source.seed(report).unwrap();
    source.seed(RemoteTask::new("page-2", "Zahnarzt anrufen")).unwrap();
    source
}

#[tokio::test]
async fn test_unconfigured_source_is_rejected() {
    let (repo, reconciler) = setup().await;
    let source = MemoryRemoteSource::new(SourceSystem::Todoist, None);

    let err = reconciler.reconcile(&source).await.unwrap_err();
    assert!(err.is_authorization());
    assert!(repo.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_denied_access_is_rejected() {
    let (repo, reconciler) = setup().await;
    let source = seeded_notion();
    source.deny_access().unwrap();

    let err = reconciler.reconcile(&source).await.unwrap_err();
    assert!(err.is_authorization());
    assert!(repo.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_first_run_imports_open_records() {
    let (repo, reconciler) = setup().await;
    let source = seeded_notion();

    let report = reconciler.reconcile(&source).await.unwrap();
    assert_eq!(
        report,
        SyncReport {
            imported: 2,
            ..Default::default()
        }
    );

    let mirror = repo
        .find_by_external_id(SourceSystem::Notion, "page-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(mirror.title, "Quartalsbericht");
    assert_eq!(mirror.tags, vec!["arbeit".to_string()]);
    assert_eq!(mirror.source_system, SourceSystem::Notion);
    assert_eq!(mirror.created_at, NOW);
    assert!(mirror.id.starts_with("local-"));

    // Nothing changed remotely: second run is quiet
    let report = reconciler.reconcile(&source).await.unwrap();
    assert_eq!(report, SyncReport::default());
    assert_eq!(repo.find_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_remote_edit_keeps_local_enrichment() {
    let (repo, reconciler) = setup().await;
    let source = seeded_notion();
    reconciler.reconcile(&source).await.unwrap();

    // Enrich the mirror locally
    let mut mirror = repo
        .find_by_external_id(SourceSystem::Notion, "page-1")
        .await
        .unwrap()
        .unwrap();
    mirror.importance = Some(Importance::High);
    mirror.estimated_duration = Some(90);
    repo.update(&mirror).await.unwrap();

    // Rename remotely
    source.request_access().await.unwrap();
    source
        .update_task(
            "page-1",
            TaskPatch {
                title: Some("Quartalsbericht Q1".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let report = reconciler.reconcile(&source).await.unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(report.imported, 0);

    let mirror = repo.find_by_id(&mirror.id).await.unwrap().unwrap();
    assert_eq!(mirror.title, "Quartalsbericht Q1");
    assert_eq!(mirror.importance, Some(Importance::High));
    assert_eq!(mirror.estimated_duration, Some(90));
}

#[tokio::test]
async fn test_remote_completion_closes_mirror() {
    let (repo, reconciler) = setup().await;
    let source = seeded_notion();
    reconciler.reconcile(&source).await.unwrap();

    source.mark_complete("page-2").await.unwrap();

    let report = reconciler.reconcile(&source).await.unwrap();
    assert_eq!(report.completed_locally, 1);

    let mirror = repo
        .find_by_external_id(SourceSystem::Notion, "page-2")
        .await
        .unwrap()
        .unwrap();
    assert!(mirror.is_completed);
    assert_eq!(mirror.completed_at, Some(NOW));
}

#[tokio::test]
async fn test_local_completion_is_pushed() {
    let (repo, reconciler) = setup().await;
    let source = seeded_notion();
    reconciler.reconcile(&source).await.unwrap();

    let mut mirror = repo
        .find_by_external_id(SourceSystem::Notion, "page-1")
        .await
        .unwrap()
        .unwrap();
    mirror.mark_complete(NOW);
    repo.update(&mirror).await.unwrap();

    let report = reconciler.reconcile(&source).await.unwrap();
    assert_eq!(report.pushed_completions, 1);

    let remote = source.records().unwrap();
    let page = remote.iter().find(|r| r.id == "page-1").unwrap();
    assert!(page.is_completed);

    // Once the remote agrees, nothing is left to push
    let report = reconciler.reconcile(&source).await.unwrap();
    assert_eq!(report, SyncReport::default());
}

#[tokio::test]
async fn test_sources_do_not_touch_each_other() {
    let (repo, reconciler) = setup().await;
    let notion = seeded_notion();
    reconciler.reconcile(&notion).await.unwrap();

    // An empty todoist account must not close notion mirrors
    let todoist = MemoryRemoteSource::todoist("token");
    let report = reconciler.reconcile(&todoist).await.unwrap();
    assert_eq!(report, SyncReport::default());
    assert_eq!(repo.find_incomplete().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_transport_failure_aborts_run() {
    let (repo, reconciler) = setup().await;
    let source = seeded_notion();
    source.request_access().await.unwrap();
    source.fail_next("connection reset").unwrap();

    let err = reconciler.reconcile(&source).await.unwrap_err();
    assert!(err.is_transport());
    assert!(repo.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_local_source_cannot_be_reconciled() {
    let (repo, reconciler) = setup().await;
    let local = LocalTaskSource::new(
        repo.clone(),
        Arc::new(SequentialIdProvider::new("task")),
        Arc::new(FixedTimeProvider::new(
            NOW,
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        )),
    );
    local.create_task(TaskDraft::titled("Nur lokal")).await.unwrap();

    for _ in 0..3 {
        let err = reconciler.reconcile(&local).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
    assert_eq!(repo.find_all().await.unwrap().len(), 1);
}
