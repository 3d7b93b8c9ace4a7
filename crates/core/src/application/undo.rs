// Completion Undo
//
// Single-slot snapshot of a task's planning state taken right before it is
// completed, so the last completion can be reverted exactly.

use std::sync::{Mutex, MutexGuard};

use crate::domain::Task;
use crate::error::{AppError, Result};

/// Task state captured before completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSnapshot {
    pub task_id: String,
    pub was_next_up: bool,
    pub next_up_sort_order: Option<i64>,
    pub assigned_focus_block_id: Option<String>,
    /// Recurring follow-up created by the completion, if any
    pub created_instance_id: Option<String>,
}

impl CompletionSnapshot {
    pub fn capture(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            was_next_up: task.is_next_up,
            next_up_sort_order: task.next_up_sort_order,
            assigned_focus_block_id: task.assigned_focus_block_id.clone(),
            created_instance_id: None,
        }
    }

    /// Put the captured planning state back onto a reopened task
    pub fn restore(&self, task: &mut Task) {
        task.mark_incomplete();
        task.is_next_up = self.was_next_up;
        task.next_up_sort_order = self.next_up_sort_order;
        task.assigned_focus_block_id = self.assigned_focus_block_id.clone();
    }
}

/// Holds at most one snapshot; a newer completion replaces the older one.
#[derive(Debug, Default)]
pub struct CompletionUndo {
    last: Mutex<Option<CompletionSnapshot>>,
}

impl CompletionUndo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_undo(&self) -> Result<bool> {
        Ok(self.lock()?.is_some())
    }

    pub fn record(&self, snapshot: CompletionSnapshot) -> Result<()> {
        *self.lock()? = Some(snapshot);
        Ok(())
    }

    pub fn take(&self) -> Result<Option<CompletionSnapshot>> {
        Ok(self.lock()?.take())
    }

    /// Drop the snapshot if it belongs to `task_id`
    pub fn forget(&self, task_id: &str) -> Result<()> {
        let mut last = self.lock()?;
        if last.as_ref().is_some_and(|s| s.task_id == task_id) {
            *last = None;
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<CompletionSnapshot>>> {
        self.last
            .lock()
            .map_err(|e| AppError::Internal(format!("Undo state lock poisoned: {e}")))
    }
}
