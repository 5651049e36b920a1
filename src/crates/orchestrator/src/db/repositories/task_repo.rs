//! Task repository for database operations.

use crate::db::connection::DatabasePool;
use crate::db::models::Task;
use chrono::Utc;

/// Counts of tasks grouped by workflow state.
#[derive(Debug, Clone)]
pub struct TaskStatistics {
    /// Total number of tasks.
    pub total: i64,

    /// (workflow_state, count) pairs, densest first.
    pub by_workflow_state: Vec<(String, i64)>,
}

/// Task repository for managing workflow task rows.
pub struct TaskRepository;

impl TaskRepository {
    /// Create a new task in the pending state.
    pub async fn create(
        pool: &DatabasePool,
        id: String,
        request: String,
    ) -> Result<Task, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (id, request, status, workflow_state, created_at, updated_at)
             VALUES (?, ?, 'pending', 'pending', ?, ?)
             RETURNING *",
        )
        .bind(&id)
        .bind(&request)
        .bind(&now)
        .bind(&now)
        .fetch_one(pool)
        .await
    }

    /// Get a task by ID.
    pub async fn get_by_id(pool: &DatabasePool, id: &str) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all tasks, most recently created first.
    pub async fn list(pool: &DatabasePool) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
    }

    /// List tasks whose workflow state is one of the given values.
    pub async fn list_by_workflow_states(
        pool: &DatabasePool,
        states: &[&str],
    ) -> Result<Vec<Task>, sqlx::Error> {
        if states.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; states.len()].join(", ");
        let sql = format!(
            "SELECT * FROM tasks WHERE workflow_state IN ({}) ORDER BY updated_at DESC",
            placeholders
        );
        let mut query = sqlx::query_as::<_, Task>(&sql);
        for state in states {
            query = query.bind(*state);
        }
        query.fetch_all(pool).await
    }

    /// Update the workflow state and coarse status of a task.
    pub async fn update_state(
        pool: &DatabasePool,
        id: &str,
        workflow_state: &str,
        status: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET workflow_state = ?, status = ?, updated_at = ? WHERE id = ?")
            .bind(workflow_state)
            .bind(status)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Store (or overwrite) the plan.
    pub async fn set_plan(pool: &DatabasePool, id: &str, plan: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET plan = ?, updated_at = ? WHERE id = ?")
            .bind(plan)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Store the implementation artifact (JSON).
    pub async fn set_implementation(
        pool: &DatabasePool,
        id: &str,
        implementation: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET implementation = ?, updated_at = ? WHERE id = ?")
            .bind(implementation)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Store the lead's review text.
    pub async fn set_review(pool: &DatabasePool, id: &str, review: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET review = ?, updated_at = ? WHERE id = ?")
            .bind(review)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Store the verification report (JSON).
    pub async fn set_verification(
        pool: &DatabasePool,
        id: &str,
        verification: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET verification_result = ?, updated_at = ? WHERE id = ?")
            .bind(verification)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record plan approval.
    pub async fn record_plan_approval(
        pool: &DatabasePool,
        id: &str,
        approved_by: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET plan_approved_at = ?, plan_approved_by = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(approved_by)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record plan rejection with the operator's reason.
    pub async fn record_plan_rejection(
        pool: &DatabasePool,
        id: &str,
        reason: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET plan_rejection_reason = ?, updated_at = ? WHERE id = ?")
            .bind(reason)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record implementation approval.
    pub async fn record_implementation_approval(
        pool: &DatabasePool,
        id: &str,
        approved_by: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET implementation_approved_at = ?, implementation_approved_by = ?,
             updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(approved_by)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record implementation rejection with the operator's reason.
    pub async fn record_implementation_rejection(
        pool: &DatabasePool,
        id: &str,
        reason: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET implementation_rejection_reason = ?, updated_at = ? WHERE id = ?",
        )
        .bind(reason)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Increment the retry counter and discard prior implementation
    /// artifacts; the approved plan is kept.
    pub async fn begin_retry(pool: &DatabasePool, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET retry_count = retry_count + 1,
             implementation = NULL, review = NULL, verification_result = NULL,
             updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a failure with its details.
    pub async fn record_failure(
        pool: &DatabasePool,
        id: &str,
        error_details: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET workflow_state = 'failed', status = 'failed',
             error_details = ?, updated_at = ? WHERE id = ?",
        )
        .bind(error_details)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Counts of tasks grouped by workflow state.
    pub async fn statistics(pool: &DatabasePool) -> Result<TaskStatistics, sqlx::Error> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(pool)
            .await?;
        let by_workflow_state: Vec<(String, i64)> = sqlx::query_as(
            "SELECT workflow_state, COUNT(*) FROM tasks
             GROUP BY workflow_state ORDER BY COUNT(*) DESC",
        )
        .fetch_all(pool)
        .await?;

        Ok(TaskStatistics {
            total: total.0,
            by_workflow_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect, init_schema};

    async fn pool() -> DatabasePool {
        let pool = connect("sqlite::memory:").await.unwrap();
        init_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let pool = pool().await;
        let task = TaskRepository::create(&pool, "t1".to_string(), "add tests".to_string())
            .await
            .unwrap();
        assert_eq!(task.workflow_state, "pending");

        let fetched = TaskRepository::get_by_id(&pool, "t1").await.unwrap().unwrap();
        assert_eq!(fetched.request, "add tests");
    }

    #[tokio::test]
    async fn test_update_state_and_plan() {
        let pool = pool().await;
        TaskRepository::create(&pool, "t1".to_string(), "r".to_string())
            .await
            .unwrap();

        TaskRepository::update_state(&pool, "t1", "planning", "in_progress")
            .await
            .unwrap();
        TaskRepository::set_plan(&pool, "t1", "1. write code").await.unwrap();

        let task = TaskRepository::get_by_id(&pool, "t1").await.unwrap().unwrap();
        assert_eq!(task.workflow_state, "planning");
        assert_eq!(task.status, "in_progress");
        assert_eq!(task.plan.as_deref(), Some("1. write code"));
    }

    #[tokio::test]
    async fn test_begin_retry_clears_artifacts_keeps_plan() {
        let pool = pool().await;
        TaskRepository::create(&pool, "t1".to_string(), "r".to_string())
            .await
            .unwrap();
        TaskRepository::set_plan(&pool, "t1", "the plan").await.unwrap();
        TaskRepository::set_implementation(&pool, "t1", "{}").await.unwrap();
        TaskRepository::set_review(&pool, "t1", "looks ok").await.unwrap();

        TaskRepository::begin_retry(&pool, "t1").await.unwrap();

        let task = TaskRepository::get_by_id(&pool, "t1").await.unwrap().unwrap();
        assert_eq!(task.retry_count, 1);
        assert!(task.implementation.is_none());
        assert!(task.review.is_none());
        assert_eq!(task.plan.as_deref(), Some("the plan"));
    }

    #[tokio::test]
    async fn test_list_by_workflow_states() {
        let pool = pool().await;
        TaskRepository::create(&pool, "t1".to_string(), "a".to_string())
            .await
            .unwrap();
        TaskRepository::create(&pool, "t2".to_string(), "b".to_string())
            .await
            .unwrap();
        TaskRepository::update_state(&pool, "t2", "plan_awaiting_approval", "in_progress")
            .await
            .unwrap();

        let waiting =
            TaskRepository::list_by_workflow_states(&pool, &["plan_awaiting_approval"])
                .await
                .unwrap();
        assert_eq!(waiting.len(), 1);
        assert_eq!(waiting[0].id, "t2");
    }

    #[tokio::test]
    async fn test_record_failure() {
        let pool = pool().await;
        TaskRepository::create(&pool, "t1".to_string(), "r".to_string())
            .await
            .unwrap();
        TaskRepository::record_failure(&pool, "t1", "model unavailable")
            .await
            .unwrap();

        let task = TaskRepository::get_by_id(&pool, "t1").await.unwrap().unwrap();
        assert_eq!(task.workflow_state, "failed");
        assert_eq!(task.status, "failed");
        assert_eq!(task.error_details.as_deref(), Some("model unavailable"));
    }

    #[tokio::test]
    async fn test_statistics() {
        let pool = pool().await;
        TaskRepository::create(&pool, "t1".to_string(), "a".to_string())
            .await
            .unwrap();
        TaskRepository::create(&pool, "t2".to_string(), "b".to_string())
            .await
            .unwrap();

        let stats = TaskRepository::statistics(&pool).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_workflow_state[0].0, "pending");
        assert_eq!(stats.by_workflow_state[0].1, 2);
    }
}
