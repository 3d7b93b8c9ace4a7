// Application Layer - Use Cases and Services

pub mod local_source;
pub mod planning;
pub mod reconcile;
pub mod scoring;
pub mod transfer;
pub mod undo;

// Re-exports
pub use local_source::LocalTaskSource;
pub use planning::{DurationSource, PlanItem, PlanningService};
pub use reconcile::{SourceReconciler, SyncReport};
pub use scoring::{calculate_score, PriorityTier};
pub use transfer::ImportReport;
pub use undo::{CompletionSnapshot, CompletionUndo};
