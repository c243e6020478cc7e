//! Ephemeral backend kept in process memory.
//!
//! Each entity type lives in its own [`Arena`] behind a `tokio` `RwLock`. Ids
//! come from a per-arena counter and are never reused, even after deletes.

use std::collections::BTreeMap;

use crate::auth::password::PasswordCodec;

use super::{Store, TaskRepository, UserRepository};

mod tasks;
mod users;

pub use tasks::MemoryTaskRepository;
pub use users::MemoryUserRepository;

/// Id-indexed rows plus the next id to hand out.
#[derive(Debug)]
pub(crate) struct Arena<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Arena<T> {
    pub(crate) fn insert_with(&mut self, build: impl FnOnce(i64) -> T) -> &T {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.entry(id).or_insert_with(|| build(id))
    }

    pub(crate) fn get(&self, id: i64) -> Option<&T> {
        self.rows.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: i64) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: i64) -> Option<T> {
        self.rows.remove(&id)
    }

    /// Rows in ascending id order.
    pub(crate) fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }
}

pub struct MemoryStore {
    users: MemoryUserRepository,
    tasks: MemoryTaskRepository,
}

impl MemoryStore {
    pub fn new(codec: PasswordCodec) -> Self {
        Self {
            users: MemoryUserRepository::new(codec),
            tasks: MemoryTaskRepository::default(),
        }
    }
}

impl Store for MemoryStore {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn tasks(&self) -> &dyn TaskRepository {
        &self.tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_ids_are_not_reused_after_remove() {
        let mut arena: Arena<&str> = Arena::default();
        arena.insert_with(|_| "a");
        arena.insert_with(|_| "b");
        assert_eq!(arena.remove(1), Some("a"));

        let mut assigned = 0;
        arena.insert_with(|id| {
            assigned = id;
            "c"
        });
        assert_eq!(assigned, 3);
        assert_eq!(arena.values().copied().collect::<Vec<_>>(), vec!["b", "c"]);
    }
}
