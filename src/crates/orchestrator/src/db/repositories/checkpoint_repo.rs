//! Checkpoint repository for database operations.

use crate::db::connection::DatabasePool;
use crate::db::models::Checkpoint;
use chrono::Utc;

/// Checkpoint repository for the append-only checkpoint log.
///
/// Rows are never updated or deleted; ordering is by insertion
/// (`created_at`, then rowid for same-instant appends).
pub struct CheckpointRepository;

impl CheckpointRepository {
    /// Append a checkpoint.
    pub async fn create(
        pool: &DatabasePool,
        id: String,
        task_id: &str,
        checkpoint_name: &str,
        checkpoint_data: String,
    ) -> Result<Checkpoint, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query_as::<_, Checkpoint>(
            "INSERT INTO checkpoints (id, task_id, checkpoint_name, checkpoint_data, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&id)
        .bind(task_id)
        .bind(checkpoint_name)
        .bind(&checkpoint_data)
        .bind(&now)
        .fetch_one(pool)
        .await
    }

    /// All checkpoints for a task, in insertion order.
    pub async fn list_for_task(
        pool: &DatabasePool,
        task_id: &str,
    ) -> Result<Vec<Checkpoint>, sqlx::Error> {
        sqlx::query_as::<_, Checkpoint>(
            "SELECT * FROM checkpoints WHERE task_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// The most recent checkpoint for a task; this is the resume point.
    pub async fn latest_for_task(
        pool: &DatabasePool,
        task_id: &str,
    ) -> Result<Option<Checkpoint>, sqlx::Error> {
        sqlx::query_as::<_, Checkpoint>(
            "SELECT * FROM checkpoints WHERE task_id = ?
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
        )
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }

    /// The most recent checkpoint with a given name, if any.
    pub async fn latest_named(
        pool: &DatabasePool,
        task_id: &str,
        checkpoint_name: &str,
    ) -> Result<Option<Checkpoint>, sqlx::Error> {
        sqlx::query_as::<_, Checkpoint>(
            "SELECT * FROM checkpoints WHERE task_id = ? AND checkpoint_name = ?
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
        )
        .bind(task_id)
        .bind(checkpoint_name)
        .fetch_optional(pool)
        .await
    }

    /// Number of checkpoints recorded for a task.
    pub async fn count_for_task(pool: &DatabasePool, task_id: &str) -> Result<i64, sqlx::Error> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM checkpoints WHERE task_id = ?")
            .bind(task_id)
            .fetch_one(pool)
            .await?;
        Ok(result.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::TaskRepository;
    use crate::db::{connect, init_schema};
    use uuid::Uuid;

    async fn pool_with_task() -> DatabasePool {
        let pool = connect("sqlite::memory:").await.unwrap();
        init_schema(&pool).await.unwrap();
        TaskRepository::create(&pool, "t1".to_string(), "r".to_string())
            .await
            .unwrap();
        pool
    }

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    #[tokio::test]
    async fn test_append_and_order() {
        let pool = pool_with_task().await;

        for name in ["workflow_start", "after_planning", "start_implementation"] {
            CheckpointRepository::create(&pool, new_id(), "t1", name, "{}".to_string())
                .await
                .unwrap();
        }

        let all = CheckpointRepository::list_for_task(&pool, "t1").await.unwrap();
        let names: Vec<&str> = all.iter().map(|c| c.checkpoint_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["workflow_start", "after_planning", "start_implementation"]
        );

        let latest = CheckpointRepository::latest_for_task(&pool, "t1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.checkpoint_name, "start_implementation");
    }

    #[tokio::test]
    async fn test_repeated_names_append() {
        let pool = pool_with_task().await;

        CheckpointRepository::create(
            &pool,
            new_id(),
            "t1",
            "after_planning",
            r#"{"plan":"v1"}"#.to_string(),
        )
        .await
        .unwrap();
        CheckpointRepository::create(
            &pool,
            new_id(),
            "t1",
            "after_planning",
            r#"{"plan":"v2"}"#.to_string(),
        )
        .await
        .unwrap();

        assert_eq!(
            CheckpointRepository::count_for_task(&pool, "t1").await.unwrap(),
            2
        );
        let latest = CheckpointRepository::latest_named(&pool, "t1", "after_planning")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.data().unwrap()["plan"], "v2");
    }
}
