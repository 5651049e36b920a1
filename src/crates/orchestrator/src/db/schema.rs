//! Idempotent schema creation.
//!
//! The schema has a single version and is applied with `CREATE TABLE IF NOT
//! EXISTS` at startup; there is no migration history to manage for an
//! embedded SQLite database.

use crate::db::connection::DatabasePool;

const CREATE_TASKS: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    request TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    workflow_state TEXT NOT NULL DEFAULT 'pending',
    plan TEXT,
    implementation TEXT,
    review TEXT,
    verification_result TEXT,
    error_details TEXT,
    retry_count INTEGER NOT NULL DEFAULT 0,
    plan_approved_at TEXT,
    plan_approved_by TEXT,
    plan_rejection_reason TEXT,
    implementation_approved_at TEXT,
    implementation_approved_by TEXT,
    implementation_rejection_reason TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

const CREATE_CHECKPOINTS: &str = r#"
CREATE TABLE IF NOT EXISTS checkpoints (
    id TEXT PRIMARY KEY,
    task_id TEXT NOT NULL REFERENCES tasks(id),
    checkpoint_name TEXT NOT NULL,
    checkpoint_data TEXT NOT NULL,
    created_at TEXT NOT NULL
)
"#;

const CREATE_CHECKPOINT_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_checkpoints_task
    ON checkpoints (task_id, created_at)
"#;

/// Create all tables and indexes if they do not exist.
pub async fn init_schema(pool: &DatabasePool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_TASKS).execute(pool).await?;
    sqlx::query(CREATE_CHECKPOINTS).execute(pool).await?;
    sqlx::query(CREATE_CHECKPOINT_INDEX).execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::connect;

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let pool = connect("sqlite::memory:").await.unwrap();
        init_schema(&pool).await.unwrap();
        init_schema(&pool).await.unwrap();

        sqlx::query("SELECT id FROM tasks").fetch_all(&pool).await.unwrap();
        sqlx::query("SELECT id FROM checkpoints")
            .fetch_all(&pool)
            .await
            .unwrap();
    }
}
