//! Repositories for database operations.

pub mod checkpoint_repo;
pub mod task_repo;

pub use checkpoint_repo::CheckpointRepository;
pub use task_repo::{TaskRepository, TaskStatistics};
