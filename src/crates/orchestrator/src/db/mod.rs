//! Database layer: connection pooling, schema, models, and repositories.

pub mod connection;
pub mod models;
pub mod repositories;
pub mod schema;

pub use connection::{connect, DatabasePool};
pub use models::{Checkpoint, Task};
pub use repositories::{CheckpointRepository, TaskRepository};
pub use schema::init_schema;
