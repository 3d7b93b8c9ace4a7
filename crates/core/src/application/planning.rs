// Planning Service
//
// Backlog ordering, "Next Up" staging and focus-block assignment over the
// TaskRepository port.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::scoring::{calculate_score, PriorityTier};
use crate::domain::{Importance, Task, TaskType, Urgency};
use crate::error::Result;
use crate::port::time_provider::MILLIS_PER_DAY;
use crate::port::{TaskRepository, TimeProvider};

/// Duration assumed when neither an estimate nor a title hint exists
pub const DEFAULT_DURATION_MINUTES: u32 = 15;

/// Where an item's effective duration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationSource {
    Manual,
    Parsed,
    Default,
}

/// Planning view of a task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanItem {
    pub id: String,
    pub title: String,
    pub is_completed: bool,
    pub importance: Option<Importance>,
    pub urgency: Option<Urgency>,
    pub task_type: Option<TaskType>,
    pub tags: Vec<String>,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub rank: i64,
    pub effective_duration: u32,
    pub duration_source: DurationSource,
    pub is_next_up: bool,
    pub next_up_sort_order: Option<i64>,
    pub assigned_focus_block_id: Option<String>,
    pub completed_at: Option<i64>,
    pub is_tbd: bool,
    pub priority_score: u8,
    pub priority_tier: PriorityTier,
}

impl PlanItem {
    pub fn from_task(task: &Task, today: NaiveDate) -> Self {
        let (effective_duration, duration_source) = effective_duration(task);
        let priority_score = calculate_score(task, today);

        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            is_completed: task.is_completed,
            importance: task.importance,
            urgency: task.urgency,
            task_type: task.task_type,
            tags: task.tags.clone(),
            due_date: task.due_date,
            description: task.description.clone(),
            rank: task.sort_order,
            effective_duration,
            duration_source,
            is_next_up: task.is_next_up,
            next_up_sort_order: task.next_up_sort_order,
            assigned_focus_block_id: task.assigned_focus_block_id.clone(),
            completed_at: task.completed_at,
            is_tbd: task.is_tbd(),
            priority_score,
            priority_tier: PriorityTier::from_score(priority_score),
        }
    }
}

/// Manual estimate, else a `#<n>min` hint in the title, else the default
pub fn effective_duration(task: &Task) -> (u32, DurationSource) {
    if let Some(minutes) = task.estimated_duration {
        return (minutes, DurationSource::Manual);
    }
    match parse_duration_hint(&task.title) {
        Some(minutes) => (minutes, DurationSource::Parsed),
        None => (DEFAULT_DURATION_MINUTES, DurationSource::Default),
    }
}

/// First positive `#<n>min` hint in `title`
pub fn parse_duration_hint(title: &str) -> Option<u32> {
    title.match_indices('#').find_map(|(pos, _)| {
        let rest = &title[pos + 1..];
        let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits_len == 0 || !rest[digits_len..].starts_with("min") {
            return None;
        }
        rest[..digits_len].parse::<u32>().ok().filter(|m| *m > 0)
    })
}

pub struct PlanningService {
    repo: Arc<dyn TaskRepository>,
    time_provider: Arc<dyn TimeProvider>,
}

impl PlanningService {
    pub fn new(repo: Arc<dyn TaskRepository>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            repo,
            time_provider,
        }
    }

    /// Visible incomplete tasks, highest rank first
    pub async fn sync(&self) -> Result<Vec<PlanItem>> {
        let today = self.time_provider.today();
        let mut items: Vec<PlanItem> = self
            .repo
            .find_incomplete()
            .await?
            .iter()
            .filter(|t| t.is_visible_in_backlog(today))
            .map(|t| PlanItem::from_task(t, today))
            .collect();

        items.sort_by(|a, b| b.rank.cmp(&a.rank));
        debug!(count = items.len(), "Backlog synced");
        Ok(items)
    }

    /// Tasks completed within the last `days` days, latest completion first
    pub async fn sync_completed(&self, days: u32) -> Result<Vec<PlanItem>> {
        let today = self.time_provider.today();
        let cutoff = self.time_provider.now_millis() - i64::from(days) * MILLIS_PER_DAY;
        Ok(self
            .repo
            .find_completed_since(cutoff)
            .await?
            .iter()
            .map(|t| PlanItem::from_task(t, today))
            .collect())
    }

    /// Staged tasks in staging order
    pub async fn next_up(&self) -> Result<Vec<PlanItem>> {
        let today = self.time_provider.today();
        let mut staged: Vec<Task> = self
            .repo
            .find_incomplete()
            .await?
            .into_iter()
            .filter(|t| t.is_next_up)
            .collect();
        staged.sort_by_key(|t| t.next_up_sort_order.unwrap_or(i64::MAX));
        Ok(staged.iter().map(|t| PlanItem::from_task(t, today)).collect())
    }

    /// Persist a new backlog order; the first id gets the highest rank
    pub async fn update_sort_order(&self, ordered_ids: &[String]) -> Result<()> {
        let len = ordered_ids.len() as i64;
        for (index, id) in ordered_ids.iter().enumerate() {
            let Some(mut task) = self.repo.find_by_id(id).await? else {
                debug!(task_id = %id, "update_sort_order: unknown task");
                continue;
            };
            task.sort_order = len - 1 - index as i64;
            self.repo.update(&task).await?;
        }
        info!(count = ordered_ids.len(), "Backlog reordered");
        Ok(())
    }

    /// Stage or unstage a task. Staging appends to the end of Next Up.
    pub async fn update_next_up(&self, task_id: &str, is_next_up: bool) -> Result<()> {
        let Some(mut task) = self.repo.find_by_id(task_id).await? else {
            debug!(task_id = %task_id, "update_next_up: unknown task");
            return Ok(());
        };

        let was_staged = task.is_next_up;
        task.set_next_up(is_next_up);
        if is_next_up && !was_staged {
            task.next_up_sort_order = Some(self.next_up_end().await?);
        }

        self.repo.update(&task).await?;
        info!(task_id = %task_id, is_next_up = is_next_up, "Next Up updated");
        Ok(())
    }

    /// Persist a new Next Up order, first id first
    pub async fn update_next_up_sort_order(&self, ordered_ids: &[String]) -> Result<()> {
        for (index, id) in ordered_ids.iter().enumerate() {
            let Some(mut task) = self.repo.find_by_id(id).await? else {
                debug!(task_id = %id, "update_next_up_sort_order: unknown task");
                continue;
            };
            task.next_up_sort_order = Some(index as i64);
            self.repo.update(&task).await?;
        }
        Ok(())
    }

    /// Set or clear the manual duration estimate
    pub async fn update_duration(&self, task_id: &str, minutes: Option<u32>) -> Result<()> {
        let Some(mut task) = self.repo.find_by_id(task_id).await? else {
            debug!(task_id = %task_id, "update_duration: unknown task");
            return Ok(());
        };
        task.estimated_duration = minutes;
        self.repo.update(&task).await
    }

    /// Assign to (or release from) a focus block
    pub async fn update_assigned_focus_block(
        &self,
        task_id: &str,
        focus_block_id: Option<String>,
    ) -> Result<()> {
        let Some(mut task) = self.repo.find_by_id(task_id).await? else {
            debug!(task_id = %task_id, "update_assigned_focus_block: unknown task");
            return Ok(());
        };

        task.assign_focus_block(focus_block_id);
        self.repo.update(&task).await?;
        info!(
            task_id = %task_id,
            focus_block = ?task.assigned_focus_block_id,
            reschedule_count = task.reschedule_count,
            "Focus block assignment updated"
        );
        Ok(())
    }

    async fn next_up_end(&self) -> Result<i64> {
        let last = self
            .repo
            .find_incomplete()
            .await?
            .iter()
            .filter(|t| t.is_next_up)
            .filter_map(|t| t.next_up_sort_order)
            .max();
        Ok(last.map_or(0, |order| order.saturating_add(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::task_repository::MockTaskRepository;
    use crate::port::time_provider::FixedTimeProvider;

    fn service(repo: MockTaskRepository) -> PlanningService {
        PlanningService::new(
            Arc::new(repo),
            Arc::new(FixedTimeProvider::new(
                0,
                NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            )),
        )
    }

    #[test]
    fn test_parse_duration_hint() {
        assert_eq!(parse_duration_hint("Mails #30min"), Some(30));
        assert_eq!(parse_duration_hint("#5min Anruf"), Some(5));
        assert_eq!(parse_duration_hint("#tag #45min"), Some(45));
        assert_eq!(parse_duration_hint("#0min"), None);
        assert_eq!(parse_duration_hint("#30 min"), None);
        assert_eq!(parse_duration_hint("Ohne Hinweis"), None);
    }

    #[test]
    fn test_effective_duration_precedence() {
        let mut task = Task::new("t", 0, "Bericht #40min");
        assert_eq!(effective_duration(&task), (40, DurationSource::Parsed));

        task.estimated_duration = Some(25);
        assert_eq!(effective_duration(&task), (25, DurationSource::Manual));

        let plain = Task::new("p", 0, "Bericht");
        assert_eq!(
            effective_duration(&plain),
            (DEFAULT_DURATION_MINUTES, DurationSource::Default)
        );
    }

    #[tokio::test]
    async fn test_sync_orders_by_rank_and_hides_future_recurring() {
        let mut repo = MockTaskRepository::new();
        repo.expect_find_incomplete().returning(|| {
            let mut low = Task::new("low", 0, "Low");
            low.sort_order = 1;
            let mut high = Task::new("high", 0, "High");
            high.sort_order = 9;
            let mut future = Task::new("future", 0, "Future");
            future.recurrence_pattern = crate::domain::RecurrencePattern::Daily;
            future.due_date = NaiveDate::from_ymd_opt(2026, 3, 11);
            Ok(vec![low, future, high])
        });

        let ids: Vec<String> = service(repo)
            .sync()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["high", "low"]);
    }

    #[tokio::test]
    async fn test_staging_appends_to_end() {
        let mut repo = MockTaskRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(Task::new(id, 0, "Neu"))));
        repo.expect_find_incomplete().returning(|| {
            let mut staged = Task::new("s", 0, "Staged");
            staged.set_next_up(true);
            staged.next_up_sort_order = Some(3);
            Ok(vec![staged])
        });
        repo.expect_update()
            .withf(|t: &Task| t.is_next_up && t.next_up_sort_order == Some(4))
            .times(1)
            .returning(|_| Ok(()));

        service(repo).update_next_up("n", true).await.unwrap();
    }

    #[tokio::test]
    async fn test_moving_between_blocks_counts_reschedule() {
        let mut repo = MockTaskRepository::new();
        repo.expect_find_by_id().returning(|id| {
            let mut task = Task::new(id, 0, "Block");
            task.assigned_focus_block_id = Some("block-a".into());
            Ok(Some(task))
        });
        repo.expect_update()
            .withf(|t: &Task| {
                t.reschedule_count == 1 && t.assigned_focus_block_id.as_deref() == Some("block-b")
            })
            .times(1)
            .returning(|_| Ok(()));

        service(repo)
            .update_assigned_focus_block("t", Some("block-b".into()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reorder_gives_first_id_highest_rank() {
        let mut repo = MockTaskRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(Task::new(id, 0, "x"))));
        repo.expect_update()
            .withf(|t: &Task| (t.id == "a" && t.sort_order == 1) || (t.id == "b" && t.sort_order == 0))
            .times(2)
            .returning(|_| Ok(()));

        service(repo)
            .update_sort_order(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
    }
}
