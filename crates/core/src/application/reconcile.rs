// Source Reconciliation
//
// Mirrors the incomplete records of a remote task source into the local
// repository and reconciles completion state in both directions.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{SourceSystem, Task};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, TaskRepository, TaskSource, TaskSourceData, TimeProvider};

/// Outcome of one reconciliation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Remote records mirrored for the first time
    pub imported: usize,
    /// Existing mirrors that picked up remote changes
    pub updated: usize,
    /// Mirrors closed because the remote no longer lists them as open
    pub completed_locally: usize,
    /// Local completions pushed to the remote
    pub pushed_completions: usize,
}

pub struct SourceReconciler {
    repo: Arc<dyn TaskRepository>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl SourceReconciler {
    pub fn new(
        repo: Arc<dyn TaskRepository>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            repo,
            id_provider,
            time_provider,
        }
    }

    pub async fn reconcile<S: TaskSource>(&self, source: &S) -> Result<SyncReport> {
        let system = source.source_system();
        // Local tasks have no external id to match on
        if system == SourceSystem::Local {
            return Err(AppError::Validation(
                "the local task source cannot be reconciled with itself".to_string(),
            ));
        }
        if !source.is_configured() {
            warn!(source = %system, "Task source is not configured");
            return Err(AppError::Authorization(format!(
                "{} is not configured",
                source.display_name()
            )));
        }
        source.request_access().await?;

        let records = source.fetch_incomplete_tasks().await?;
        let now = self.time_provider.now_millis();
        let mut report = SyncReport::default();
        let mut seen: HashSet<String> = HashSet::with_capacity(records.len());

        for record in &records {
            let remote_id = record.id();
            seen.insert(remote_id.to_string());

            match self.repo.find_by_external_id(system, remote_id).await? {
                Some(local) if local.is_completed => {
                    source.mark_complete(remote_id).await?;
                    report.pushed_completions += 1;
                    debug!(source = %system, external_id = %remote_id, "Pushed local completion");
                }
                Some(mut local) => {
                    let before = local.clone();
                    merge_record(&mut local, record);
                    if local != before {
                        self.repo.update(&local).await?;
                        report.updated += 1;
                    }
                }
                None => {
                    let mut local = Task::new(self.id_provider.generate_id(), now, record.title());
                    merge_record(&mut local, record);
                    local.external_id = Some(remote_id.to_string());
                    local.source_system = system;
                    local.sort_order = self.repo.max_sort_order().await?.map_or(0, |m| m + 1);
                    self.repo.insert(&local).await?;
                    report.imported += 1;
                }
            }
        }

        for mut local in self.repo.find_incomplete().await? {
            if local.source_system != system {
                continue;
            }
            let Some(external_id) = local.external_id.as_deref() else {
                continue;
            };
            if seen.contains(external_id) {
                continue;
            }
            if local.mark_complete(now) {
                self.repo.update(&local).await?;
                report.completed_locally += 1;
            }
        }

        info!(
            source = %system,
            imported = report.imported,
            updated = report.updated,
            completed_locally = report.completed_locally,
            pushed = report.pushed_completions,
            "Task source reconciled"
        );
        Ok(report)
    }
}

/// Copy remote fields onto a local mirror without erasing local enrichment
fn merge_record<R: TaskSourceData>(local: &mut Task, record: &R) {
    local.title = record.title().to_string();
    if !record.tags().is_empty() {
        local.tags = record.tags().to_vec();
    }
    if let Some(due) = record.due_date() {
        local.due_date = Some(due);
    }
    if let Some(description) = record.description() {
        local.description = Some(description.to_string());
    }
    local.safe_set_importance(record.importance());
    local.safe_set_urgency(record.urgency());
    local.safe_set_duration(record.estimated_duration());
    local.safe_set_task_type(record.task_type());
}
