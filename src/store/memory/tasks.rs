use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::Arena;
use crate::store::{StoreError, StoreResult, TaskRepository};
use crate::tasks::repo_types::{NewTask, Task};

#[derive(Default)]
pub struct MemoryTaskRepository {
    tasks: RwLock<Arena<Task>>,
}

fn owned_by(owner_id: i64) -> impl Fn(&&Task) -> bool {
    move |t: &&Task| t.user_id == owner_id
}

fn non_empty(tasks: Vec<Task>) -> StoreResult<Vec<Task>> {
    if tasks.is_empty() {
        Err(StoreError::NoRecords)
    } else {
        Ok(tasks)
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn create(&self, owner_id: i64, task: NewTask) -> StoreResult<Task> {
        task.validate()?;
        let NewTask { title, description } = task;
        let created_at = OffsetDateTime::now_utc();
        let mut tasks = self.tasks.write().await;
        Ok(tasks
            .insert_with(|id| Task {
                id,
                user_id: owner_id,
                title,
                description,
                done: false,
                created_at,
            })
            .clone())
    }

    async fn delete(&self, owner_id: i64, task_id: i64) -> StoreResult<()> {
        let mut tasks = self.tasks.write().await;
        if !tasks.get(task_id).is_some_and(|t| t.user_id == owner_id) {
            return Err(StoreError::InvalidId);
        }
        tasks.remove(task_id);
        Ok(())
    }

    async fn mark_done(&self, owner_id: i64, task_id: i64) -> StoreResult<()> {
        match self.tasks.write().await.get_mut(task_id) {
            Some(t) if t.user_id == owner_id => {
                t.done = true;
                Ok(())
            }
            _ => Err(StoreError::InvalidId),
        }
    }

    async fn get_all(&self, owner_id: i64) -> StoreResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        non_empty(tasks.values().filter(owned_by(owner_id)).cloned().collect())
    }

    async fn get_by_status(&self, owner_id: i64, done: bool) -> StoreResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        non_empty(
            tasks
                .values()
                .filter(owned_by(owner_id))
                .filter(|t| t.done == done)
                .cloned()
                .collect(),
        )
    }

    async fn get_by_id(&self, owner_id: i64, task_id: i64) -> StoreResult<Task> {
        self.tasks
            .read()
            .await
            .get(task_id)
            .filter(|t| t.user_id == owner_id)
            .cloned()
            .ok_or(StoreError::InvalidId)
    }
}
