//! In-process store.
//!
//! A session takes the store lock for its whole lifetime and works on a
//! staged copy of the tables; `commit` publishes the copy. Sessions are
//! therefore serialized, which is fine for development and tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{Session, Store, StoreError, StoreResult, TaskRepository, UserRepository};
use crate::models::{Task, TaskQuery, UserRecord};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: Vec<UserRecord>,
    // Kept in insertion order.
    tasks: Vec<Task>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates losing (or regaining) the datastore. While offline, `begin`
    /// and `ping` fail with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn Session>> {
        self.ensure_online()?;
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemorySession { guard, staged }))
    }

    async fn ping(&self) -> StoreResult<()> {
        self.ensure_online()
    }
}

struct MemorySession {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl Session for MemorySession {
    fn users(&mut self) -> &mut dyn UserRepository {
        self
    }

    fn tasks(&mut self) -> &mut dyn TaskRepository {
        self
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemorySession { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemorySession {
    async fn create(&mut self, user: &UserRecord) -> StoreResult<UserRecord> {
        let users = &mut self.staged.users;
        if users.iter().any(|existing| existing.email == user.email) {
            return Err(StoreError::Duplicate("email".into()));
        }
        if users.iter().any(|existing| existing.id == user.id) {
            return Err(StoreError::Duplicate("user id".into()));
        }
        users.push(user.clone());
        Ok(user.clone())
    }

    async fn find_by_id(&mut self, id: Uuid) -> StoreResult<Option<UserRecord>> {
        Ok(self.staged.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&mut self, email: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.staged.users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl TaskRepository for MemorySession {
    async fn create(&mut self, task: &Task) -> StoreResult<Task> {
        if !self.staged.users.iter().any(|u| u.id == task.user_id) {
            return Err(StoreError::Backend(format!(
                "task owner {} does not exist",
                task.user_id
            )));
        }
        if self.staged.tasks.iter().any(|t| t.id == task.id) {
            return Err(StoreError::Duplicate("task id".into()));
        }
        self.staged.tasks.push(task.clone());
        Ok(task.clone())
    }

    async fn find_by_id(&mut self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.staged.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_owner(&mut self, owner: Uuid, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let skip = query.skip.unwrap_or(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);

        Ok(self
            .staged
            .tasks
            .iter()
            .filter(|t| t.user_id == owner)
            .filter(|t| query.status.map_or(true, |status| t.status == status))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update(&mut self, task: &Task) -> StoreResult<Option<Task>> {
        let row = self
            .staged
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id && t.user_id == task.user_id);

        Ok(row.map(|row| {
            row.title = task.title.clone();
            row.description = task.description.clone();
            row.status = task.status;
            row.updated_at = task.updated_at;
            row.clone()
        }))
    }

    async fn delete(&mut self, id: Uuid) -> StoreResult<bool> {
        let before = self.staged.tasks.len();
        self.staged.tasks.retain(|t| t.id != id);
        Ok(self.staged.tasks.len() != before)
    }
}
