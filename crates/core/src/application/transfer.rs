// Export / Import Use Cases
//
// Tasks travel between platforms as a JSON array of canonical records.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::domain::schema::verify_record;
use crate::domain::{SourceSystem, Task};
use crate::error::{AppError, Result};
use crate::port::TaskRepository;

/// Import counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Serialize every stored task as a pretty JSON array
pub async fn export(repo: &dyn TaskRepository) -> Result<String> {
    let tasks = repo.find_all().await?;
    let json = serde_json::to_string_pretty(&tasks)?;
    info!(count = tasks.len(), "Tasks exported");
    Ok(json)
}

/// Import a JSON array of task records.
///
/// The whole file is checked before anything is written: one drifted record,
/// or a record whose `(source_system, external_id)` is already mirrored by
/// another task, rejects it. Records whose id is already stored (or repeated
/// within the file) are skipped. Only a storage failure during the insert
/// phase can leave a partial import behind.
pub async fn import(repo: &dyn TaskRepository, json: &str) -> Result<ImportReport> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(records) = value else {
        return Err(AppError::Validation(
            "expected a JSON array of task records".to_string(),
        ));
    };

    let mut tasks = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        if let Err(e) = verify_record(&record) {
            warn!(index = index, error = %e, "Rejected task record");
            return Err(e.into());
        }
        let task: Task = serde_json::from_value(record)?;
        task.validate()?;
        tasks.push(task);
    }

    let mut report = ImportReport::default();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_external: HashSet<(SourceSystem, String)> = HashSet::new();
    let mut pending = Vec::with_capacity(tasks.len());

    for task in tasks {
        if !seen_ids.insert(task.id.clone()) || repo.find_by_id(&task.id).await?.is_some() {
            debug!(task_id = %task.id, "Task already stored, skipping");
            report.skipped += 1;
            continue;
        }

        if let Some(external_id) = &task.external_id {
            let key = (task.source_system, external_id.clone());
            let taken = !seen_external.insert(key)
                || repo
                    .find_by_external_id(task.source_system, external_id)
                    .await?
                    .is_some();
            if taken {
                warn!(task_id = %task.id, external_id = %external_id, "Duplicate mirror in import");
                return Err(AppError::Validation(format!(
                    "task {} mirrors {} record {} which is already stored",
                    task.id, task.source_system, external_id
                )));
            }
        }
        pending.push(task);
    }

    for task in &pending {
        repo.insert(task).await?;
        report.inserted += 1;
    }

    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        "Tasks imported"
    );
    Ok(report)
}
