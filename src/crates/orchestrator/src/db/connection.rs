//! Database connection management.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Type alias for the database connection pool.
pub type DatabasePool = SqlitePool;

/// Open a connection pool for the given SQLite URL, creating the database
/// file when it does not exist yet.
///
/// # Arguments
/// * `database_url` - e.g. "sqlite:workflows.db" or "sqlite::memory:"
pub async fn connect(database_url: &str) -> Result<DatabasePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    // an in-memory database exists per connection, so the pool must not
    // hand out a second one
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}
