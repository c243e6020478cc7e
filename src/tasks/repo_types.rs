use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::validation::{check_required, ValidationErrors};

/// Task row. `user_id` is the owner and is only ever set by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub done: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Caller-supplied part of a task.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
}

impl NewTask {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "title", &self.title);
        check_required(&mut errors, "description", &self.description);
        errors.into_result()
    }
}

#[cfg(test)]
pub(crate) fn test_task() -> NewTask {
    NewTask {
        title: "Create TodoApp".into(),
        description: "Add new features".into(),
    }
}
