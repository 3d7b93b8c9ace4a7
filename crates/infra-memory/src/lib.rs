// FocusBlox Infrastructure - In-Memory Adapters
// Implements: TaskRepository (volatile store), TaskSource + TaskSourceWritable (remote-style backend)

mod remote_source;
mod task_repository;

pub use remote_source::{MemoryRemoteSource, RemoteTask};
pub use task_repository::InMemoryTaskRepository;
