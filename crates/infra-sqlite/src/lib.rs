// FocusBlox Infrastructure - SQLite Adapter
// Implements: TaskRepository (local persistent task store)

mod connection;
mod migration;
mod task_repository;

pub use connection::{create_pool, database_url};
pub use migration::run_migrations;
pub use task_repository::SqliteTaskRepository;

// Note: sqlx::Error conversion is handled by `map_sqlx_error` due to Rust's
// orphan rules (cannot implement From<sqlx::Error> for AppError here)
