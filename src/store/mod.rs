//! Repository interfaces shared by every backend.
//!
//! Every task operation takes the owner id first and the task id second. A task
//! that exists under another owner is indistinguishable from one that does not
//! exist at all.

use async_trait::async_trait;

use crate::auth::repo_types::{NewUser, User};
use crate::tasks::repo_types::{NewTask, Task};

mod errors;
pub mod memory;
pub mod sql;

pub use errors::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Validates, hashes the password and persists. The returned record carries
    /// the assigned id and the hash only.
    async fn create(&self, user: NewUser) -> StoreResult<User>;
    async fn find_by_email(&self, email: &str) -> StoreResult<User>;
    async fn find_by_id(&self, id: i64) -> StoreResult<User>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, owner_id: i64, task: NewTask) -> StoreResult<Task>;
    async fn delete(&self, owner_id: i64, task_id: i64) -> StoreResult<()>;
    /// One-way and idempotent.
    async fn mark_done(&self, owner_id: i64, task_id: i64) -> StoreResult<()>;
    /// `NoRecords` when the owner has no tasks.
    async fn get_all(&self, owner_id: i64) -> StoreResult<Vec<Task>>;
    /// `NoRecords` when nothing matches.
    async fn get_by_status(&self, owner_id: i64, done: bool) -> StoreResult<Vec<Task>>;
    async fn get_by_id(&self, owner_id: i64, task_id: i64) -> StoreResult<Task>;
}

/// A configured backend: one user repository and one task repository.
pub trait Store: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn tasks(&self) -> &dyn TaskRepository;
}
