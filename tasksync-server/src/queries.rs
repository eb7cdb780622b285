use sqlx::{sqlite::SqliteRow, Row};
use tasksync_core::protocol::TaskRecord;

/// SQL queries for server database operations
pub struct Queries;

impl Queries {
    pub const CREATE_TASK: &'static str = r#"
        INSERT INTO tasks (id, title, description, completed, updated_at, created_at, modified_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
    "#;

    pub const GET_TASK: &'static str = r#"
        SELECT id, title, description, completed, updated_at, created_at
        FROM tasks
        WHERE id = ?1
    "#;

    pub const LIST_TASKS: &'static str = r#"
        SELECT id, title, description, completed, updated_at, created_at
        FROM tasks
        ORDER BY seq ASC
    "#;

    // Absent fields keep their stored value
    pub const UPDATE_TASK: &'static str = r#"
        UPDATE tasks
        SET title = COALESCE(?2, title),
            description = COALESCE(?3, description),
            completed = COALESCE(?4, completed),
            updated_at = COALESCE(?5, updated_at),
            modified_at = ?6
        WHERE id = ?1
    "#;

    pub const DELETE_TASK: &'static str = "DELETE FROM tasks WHERE id = ?1";
}

/// Helper functions for common database operations
pub struct DbHelpers;

impl DbHelpers {
    pub fn parse_task_record(row: &SqliteRow) -> Result<TaskRecord, sqlx::Error> {
        Ok(TaskRecord {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            completed: row.try_get("completed")?,
            updated_at: row.try_get("updated_at")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// Server ids are 32 hex characters, distinct from the hyphenated
    /// UUIDs clients assign locally.
    pub fn new_task_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}
