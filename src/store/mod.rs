//! Persistence boundary.
//!
//! Business logic talks to storage only through the traits in this module.
//! A [`Store`] hands out one [`Session`] per unit of work; the session is a
//! transactional handle that exposes the user and task repositories. A
//! session that is dropped without [`Session::commit`] discards its writes,
//! so every early return (validation failure, store error, panic) releases
//! the handle without side effects.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Task, TaskQuery, UserRecord};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The datastore could not be reached or the pool is exhausted.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A unique constraint rejected the write. Carries the offending field.
    #[error("duplicate {0}")]
    Duplicate(String),
    #[error("store error: {0}")]
    Backend(String),
    #[error("migration failed: {0}")]
    Migration(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Opens a transactional session.
    async fn begin(&self) -> StoreResult<Box<dyn Session>>;

    /// Cheap round trip used by the health check.
    async fn ping(&self) -> StoreResult<()>;
}

#[async_trait]
pub trait Session: Send {
    fn users(&mut self) -> &mut dyn UserRepository;

    fn tasks(&mut self) -> &mut dyn TaskRepository;

    /// Makes every write of this session durable.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

#[async_trait]
pub trait UserRepository: Send {
    async fn create(&mut self, user: &UserRecord) -> StoreResult<UserRecord>;

    async fn find_by_id(&mut self, id: Uuid) -> StoreResult<Option<UserRecord>>;

    async fn find_by_email(&mut self, email: &str) -> StoreResult<Option<UserRecord>>;
}

/// Plain task persistence. Performs no access control; callers decide who
/// may see a row.
#[async_trait]
pub trait TaskRepository: Send {
    async fn create(&mut self, task: &Task) -> StoreResult<Task>;

    async fn find_by_id(&mut self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Tasks of `owner` in insertion order, narrowed and sliced by `query`.
    async fn find_by_owner(&mut self, owner: Uuid, query: &TaskQuery) -> StoreResult<Vec<Task>>;

    /// Overwrites the mutable columns of an existing row. Returns `None` when
    /// no row with that id and owner exists.
    async fn update(&mut self, task: &Task) -> StoreResult<Option<Task>>;

    /// Returns whether a row was removed.
    async fn delete(&mut self, id: Uuid) -> StoreResult<bool>;
}

/// Opens the backend named by `DATABASE_URL`: `memory://` selects the
/// in-process store, anything else is treated as a PostgreSQL URL.
pub async fn connect(config: &Config) -> StoreResult<Arc<dyn Store>> {
    if config.database_url.starts_with("memory:") {
        log::warn!("using the in-memory store; data is lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = PgStore::connect(&config.database_url, config.database_max_connections).await?;
    store.migrate().await?;
    Ok(Arc::new(store))
}
