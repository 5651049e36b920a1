//! Checkpoint model for database persistence.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A durable record of a completed workflow stage.
///
/// Checkpoints are append-only: revisions and retries append another row
/// with the same name rather than mutating an existing one. The most recent
/// row for a task is its resume point.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Checkpoint {
    /// Unique checkpoint identifier (UUID string).
    pub id: String,

    /// Owning task.
    pub task_id: String,

    /// Stage name: workflow_start, after_planning, start_implementation,
    /// after_implementation, after_review, after_verification.
    pub checkpoint_name: String,

    /// Stage payload as JSON.
    pub checkpoint_data: String,

    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

impl Checkpoint {
    /// Deserialize the payload.
    pub fn data(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.checkpoint_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_round_trip() {
        let checkpoint = Checkpoint {
            id: "cp-1".to_string(),
            task_id: "task-1".to_string(),
            checkpoint_name: "after_planning".to_string(),
            checkpoint_data: r#"{"plan":"1. do the thing"}"#.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        let data = checkpoint.data().unwrap();
        assert_eq!(data["plan"], "1. do the thing");
    }
}
