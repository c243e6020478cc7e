//! Persistent backend on PostgreSQL.

use sqlx::PgPool;

use crate::auth::password::PasswordCodec;

use super::{Store, TaskRepository, UserRepository};

mod tasks;
mod users;

pub use tasks::SqlTaskRepository;
pub use users::SqlUserRepository;

pub struct SqlStore {
    users: SqlUserRepository,
    tasks: SqlTaskRepository,
}

impl SqlStore {
    pub fn new(db: PgPool, codec: PasswordCodec) -> Self {
        Self {
            users: SqlUserRepository::new(db.clone(), codec),
            tasks: SqlTaskRepository::new(db),
        }
    }
}

impl Store for SqlStore {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn tasks(&self) -> &dyn TaskRepository {
        &self.tasks
    }
}
