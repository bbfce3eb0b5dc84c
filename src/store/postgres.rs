//! PostgreSQL backend on top of `sqlx`.
//!
//! One pooled connection is held per session, inside a `sqlx::Transaction`.
//! `sqlx` rolls the transaction back when it is dropped uncommitted.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::{Session, Store, StoreError, StoreResult, TaskRepository, UserRepository};
use crate::models::{Task, TaskQuery, UserRecord};

const TASK_COLUMNS: &str = "id, title, description, status, created_at, updated_at, user_id";
const USER_COLUMNS: &str = "id, email, password_hash, created_at";

// SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> StoreError {
        match error {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                let field = match db_err.constraint() {
                    Some(constraint) if constraint.contains("email") => "email".to_string(),
                    Some(constraint) => constraint.to_string(),
                    None => "value".to_string(),
                };
                StoreError::Duplicate(field)
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(error.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        log::info!("connected to PostgreSQL (max {} connections)", max_connections);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the migrations embedded from `./migrations`.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn Session>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSession { tx }))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

struct PgSession {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl Session for PgSession {
    fn users(&mut self) -> &mut dyn UserRepository {
        self
    }

    fn tasks(&mut self) -> &mut dyn TaskRepository {
        self
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgSession {
    async fn create(&mut self, user: &UserRecord) -> StoreResult<UserRecord> {
        let sql = format!(
            "INSERT INTO users (id, email, password_hash, created_at) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(record)
    }

    async fn find_by_id(&mut self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(record)
    }

    async fn find_by_email(&mut self, email: &str) -> StoreResult<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(record)
    }
}

#[async_trait]
impl TaskRepository for PgSession {
    async fn create(&mut self, task: &Task) -> StoreResult<Task> {
        let sql = format!(
            "INSERT INTO tasks (id, title, description, status, created_at, updated_at, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {TASK_COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.created_at)
            .bind(task.updated_at)
            .bind(task.user_id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(task)
    }

    async fn find_by_id(&mut self, id: Uuid) -> StoreResult<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(task)
    }

    async fn find_by_owner(&mut self, owner: Uuid, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        // A NULL status matches every row and a NULL limit means no limit.
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE user_id = $1 AND ($2::task_status IS NULL OR status = $2) \
             ORDER BY created_at, id \
             OFFSET $3 LIMIT $4"
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(owner)
            .bind(query.status)
            .bind(i64::from(query.skip.unwrap_or(0)))
            .bind(query.limit.map(i64::from))
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(tasks)
    }

    async fn update(&mut self, task: &Task) -> StoreResult<Option<Task>> {
        let sql = format!(
            "UPDATE tasks SET title = $1, description = $2, status = $3, updated_at = $4 \
             WHERE id = $5 AND user_id = $6 \
             RETURNING {TASK_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Task>(&sql)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.updated_at)
            .bind(task.id)
            .bind(task.user_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(updated)
    }

    async fn delete(&mut self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
