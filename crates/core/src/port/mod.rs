// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod task_repository;
pub mod task_source;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use task_repository::TaskRepository;
pub use task_source::{TaskDraft, TaskPatch, TaskSource, TaskSourceData, TaskSourceWritable};
pub use time_provider::TimeProvider;
