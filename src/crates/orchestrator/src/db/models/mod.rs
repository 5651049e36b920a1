//! Database models.

pub mod checkpoint;
pub mod task;

pub use checkpoint::Checkpoint;
pub use task::Task;
