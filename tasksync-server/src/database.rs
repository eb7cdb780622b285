use crate::queries::{DbHelpers, Queries};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use tasksync_core::protocol::{TaskPayload, TaskRecord, TaskUpdate};

pub struct ServerDatabase {
    pub pool: SqlitePool,
}

impl ServerDatabase {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // An in-memory database lives and dies with its single connection
        let pool = if database_url.contains(":memory:") || database_url.contains("mode=memory") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(10)
                .connect_with(options)
                .await?
        };

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Insert a task under a fresh server id. The title must already be
    /// validated.
    pub async fn create_task(&self, payload: &TaskPayload) -> Result<TaskRecord, sqlx::Error> {
        let record = TaskRecord {
            id: DbHelpers::new_task_id(),
            title: payload.title.clone(),
            description: payload.description.clone(),
            completed: payload.completed,
            updated_at: payload.updated_at,
            created_at: chrono::Utc::now(),
        };

        sqlx::query(Queries::CREATE_TASK)
            .bind(&record.id)
            .bind(&record.title)
            .bind(&record.description)
            .bind(record.completed)
            .bind(record.updated_at)
            .bind(record.created_at)
            .execute(&self.pool)
            .await?;

        Ok(record)
    }

    /// Every task, oldest first.
    pub async fn list_tasks(&self) -> Result<Vec<TaskRecord>, sqlx::Error> {
        let rows = sqlx::query(Queries::LIST_TASKS)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(DbHelpers::parse_task_record).collect()
    }

    pub async fn get_task(&self, id: &str) -> Result<Option<TaskRecord>, sqlx::Error> {
        let row = sqlx::query(Queries::GET_TASK)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(DbHelpers::parse_task_record).transpose()
    }

    /// Apply the fields present in `update`. `None` if no such task exists.
    pub async fn update_task(
        &self,
        id: &str,
        update: &TaskUpdate,
    ) -> Result<Option<TaskRecord>, sqlx::Error> {
        let result = sqlx::query(Queries::UPDATE_TASK)
            .bind(id)
            .bind(&update.title)
            .bind(&update.description)
            .bind(update.completed)
            .bind(update.updated_at)
            .bind(chrono::Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_task(id).await
    }

    /// Returns whether a task was removed.
    pub async fn delete_task(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(Queries::DELETE_TASK)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> ServerDatabase {
        let db = ServerDatabase::new("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        db
    }

    fn payload(title: &str, updated_at: i64) -> TaskPayload {
        TaskPayload {
            title: title.to_string(),
            description: String::new(),
            completed: false,
            updated_at,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = setup().await;

        let created = db.create_task(&payload("Buy milk", 42)).await.unwrap();
        assert_eq!(created.id.len(), 32);

        let loaded = db.get_task(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Buy milk");
        assert_eq!(loaded.updated_at, 42);
        assert!(!loaded.completed);
        assert_eq!(
            loaded.created_at.timestamp_millis(),
            created.created_at.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_list_in_creation_order() {
        let db = setup().await;
        for title in ["first", "second", "third"] {
            db.create_task(&payload(title, 1)).await.unwrap();
        }

        let titles: Vec<String> = db
            .list_tasks()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let db = setup().await;
        let mut body = payload("Buy milk", 1);
        body.description = "2 litres".to_string();
        let created = db.create_task(&body).await.unwrap();

        let update = TaskUpdate {
            completed: Some(true),
            updated_at: Some(5),
            ..Default::default()
        };
        let updated = db.update_task(&created.id, &update).await.unwrap().unwrap();

        assert!(updated.completed);
        assert_eq!(updated.updated_at, 5);
        assert_eq!(updated.title, "Buy milk");
        assert_eq!(updated.description, "2 litres");
    }

    #[tokio::test]
    async fn test_missing_task() {
        let db = setup().await;

        assert!(db.get_task("nope").await.unwrap().is_none());
        assert!(db
            .update_task("nope", &TaskUpdate::default())
            .await
            .unwrap()
            .is_none());
        assert!(!db.delete_task("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = setup().await;
        let created = db.create_task(&payload("temporary", 1)).await.unwrap();

        assert!(db.delete_task(&created.id).await.unwrap());
        assert!(db.get_task(&created.id).await.unwrap().is_none());
        assert!(db.list_tasks().await.unwrap().is_empty());
    }
}
