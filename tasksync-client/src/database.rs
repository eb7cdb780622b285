use crate::queries::{DbHelpers, Queries};
use crate::storage::{LocalStore, TASKS_KEY};
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row, SqlitePool,
};
use std::str::FromStr;
use tasksync_core::{models::Task, SyncResult};

/// SQLite-backed local store. Every value is an opaque blob under a fixed key.
pub struct ClientDatabase {
    pub pool: SqlitePool,
}

impl ClientDatabase {
    pub async fn new(database_url: &str) -> SyncResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Each connection to an in-memory database gets its own private
        // database, so the pool must hold exactly one connection for its lifetime
        let pool = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        Ok(Self { pool })
    }

    /// Open the database and bring its schema up to date.
    pub async fn open(database_url: &str) -> SyncResult<Self> {
        let db = Self::new(database_url).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn run_migrations(&self) -> SyncResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn get_value(&self, key: &str) -> SyncResult<Option<String>> {
        let row = sqlx::query(Queries::GET_VALUE)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    /// A single upsert statement, so readers see either the old or the new blob
    pub async fn put_value(&self, key: &str, value: &str) -> SyncResult<()> {
        sqlx::query(Queries::UPSERT_VALUE)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete_value(&self, key: &str) -> SyncResult<()> {
        sqlx::query(Queries::DELETE_VALUE)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl LocalStore for ClientDatabase {
    async fn read(&self) -> SyncResult<Vec<Task>> {
        let row = sqlx::query(Queries::GET_VALUE)
            .bind(TASKS_KEY)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => DbHelpers::parse_task_list(&row),
            None => Ok(Vec::new()),
        }
    }

    async fn write(&self, tasks: &[Task]) -> SyncResult<()> {
        let blob = DbHelpers::encode_task_list(tasks)?;
        tracing::debug!("Persisting {} task(s) to local store", tasks.len());
        self.put_value(TASKS_KEY, &blob).await
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}
