use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::instrument;

use crate::store::{StoreError, StoreResult, TaskRepository};
use crate::tasks::repo_types::{NewTask, Task};

pub struct SqlTaskRepository {
    db: PgPool,
}

impl SqlTaskRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn non_empty(tasks: Vec<Task>) -> StoreResult<Vec<Task>> {
    if tasks.is_empty() {
        Err(StoreError::NoRecords)
    } else {
        Ok(tasks)
    }
}

/// Zero rows touched means the task is missing or owned by someone else.
fn one_row_affected(rows: u64) -> StoreResult<()> {
    if rows == 0 {
        Err(StoreError::InvalidId)
    } else {
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for SqlTaskRepository {
    #[instrument(skip(self, task))]
    async fn create(&self, owner_id: i64, task: NewTask) -> StoreResult<Task> {
        task.validate()?;
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, title, description, done, created_at)
            VALUES ($1, $2, $3, FALSE, $4)
            RETURNING id, user_id, title, description, done, created_at
            "#,
        )
        .bind(owner_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.db)
        .await
        .map_err(|e| StoreError::internal("insert task", e))
    }

    #[instrument(skip(self))]
    async fn delete(&self, owner_id: i64, task_id: i64) -> StoreResult<()> {
        let res = sqlx::query(r#"DELETE FROM tasks WHERE id = $1 AND user_id = $2"#)
            .bind(task_id)
            .bind(owner_id)
            .execute(&self.db)
            .await
            .map_err(|e| StoreError::internal("delete task", e))?;
        one_row_affected(res.rows_affected())
    }

    #[instrument(skip(self))]
    async fn mark_done(&self, owner_id: i64, task_id: i64) -> StoreResult<()> {
        // Postgres counts matched rows, so a second call still reports 1
        let res = sqlx::query(r#"UPDATE tasks SET done = TRUE WHERE id = $1 AND user_id = $2"#)
            .bind(task_id)
            .bind(owner_id)
            .execute(&self.db)
            .await
            .map_err(|e| StoreError::internal("mark task done", e))?;
        one_row_affected(res.rows_affected())
    }

    async fn get_all(&self, owner_id: i64) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, done, created_at
            FROM tasks
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| StoreError::internal("list tasks", e))?;
        non_empty(rows)
    }

    async fn get_by_status(&self, owner_id: i64, done: bool) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, done, created_at
            FROM tasks
            WHERE user_id = $1 AND done = $2
            ORDER BY id
            "#,
        )
        .bind(owner_id)
        .bind(done)
        .fetch_all(&self.db)
        .await
        .map_err(|e| StoreError::internal("list tasks by status", e))?;
        non_empty(rows)
    }

    async fn get_by_id(&self, owner_id: i64, task_id: i64) -> StoreResult<Task> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, done, created_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(task_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| StoreError::internal("get task", e))?
        .ok_or(StoreError::InvalidId)
    }
}
