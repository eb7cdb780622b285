use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tasksync_core::{models::Task, SyncResult};

/// SQL queries for client database operations
pub struct Queries;

impl Queries {
    // Key/value blob queries
    pub const GET_VALUE: &'static str = "SELECT value FROM kv_store WHERE key = ?1";

    pub const UPSERT_VALUE: &'static str = r#"
        INSERT INTO kv_store (key, value, updated_at)
        VALUES (?1, ?2, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
    "#;

    pub const DELETE_VALUE: &'static str = "DELETE FROM kv_store WHERE key = ?1";

    pub const COUNT_KEYS: &'static str = "SELECT COUNT(*) as count FROM kv_store";
}

/// Helper functions for common database operations
pub struct DbHelpers;

impl DbHelpers {
    /// Decode the task list blob from a `kv_store` row
    pub fn parse_task_list(row: &SqliteRow) -> SyncResult<Vec<Task>> {
        let value: String = row.try_get("value")?;
        Self::decode_task_list(&value)
    }

    /// Blank blobs are treated as an empty list
    pub fn decode_task_list(value: &str) -> SyncResult<Vec<Task>> {
        if value.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(value)?)
    }

    pub fn encode_task_list(tasks: &[Task]) -> SyncResult<String> {
        Ok(serde_json::to_string(tasks)?)
    }

    pub async fn count_keys(pool: &SqlitePool) -> SyncResult<i64> {
        let row = sqlx::query(Queries::COUNT_KEYS).fetch_one(pool).await?;
        Ok(row.try_get("count")?)
    }
}
