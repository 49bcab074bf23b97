use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{BestPick, SearchResult, Task, TaskKind, TaskStatus};
use crate::utils::error::{AppError, Result};

/// In-memory store of task state, keyed by task id.
///
/// Only the map itself is locked. Each task is written by the single run
/// that owns it, so there is no per-task locking.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<String, Task>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, id: &str, product: &str, kind: TaskKind) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(id) {
            return Err(AppError::Validation(format!("Task {} already exists", id)));
        }

        let task = Task::new(id, product, kind);
        tasks.insert(id.to_string(), task.clone());
        Ok(task)
    }

    /// Snapshot of the task as it is right now.
    pub async fn get(&self, id: &str) -> Result<Task> {
        let tasks = self.tasks.read().await;
        tasks.get(id).cloned().ok_or_else(|| not_found(id))
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Forward-only status change. Returns `false` when the transition was refused.
    pub async fn advance(&self, id: &str, status: TaskStatus) -> Result<bool> {
        self.update(id, |task| {
            let from = task.status;
            let moved = task.advance(status);
            if !moved {
                tracing::warn!("Task {}: refused status change {} -> {}", task.id, from, status);
            }
            moved
        })
        .await
    }

    /// First write per app wins. Returns `false` if the app already had a result.
    pub async fn record_result(&self, id: &str, result: SearchResult) -> Result<bool> {
        self.update(id, |task| {
            let app = result.app;
            let recorded = task.record_result(result);
            if !recorded {
                tracing::warn!("Task {}: result for {} already recorded", task.id, app);
            }
            recorded
        })
        .await
    }

    /// Store the best pick and mark the task completed in one step, so no
    /// snapshot shows `completed` without its best pick.
    pub async fn complete(&self, id: &str, best: Option<BestPick>) -> Result<bool> {
        self.update(id, |task| {
            if !task.status.can_advance_to(TaskStatus::Completed) {
                return false;
            }
            task.set_best(best);
            task.advance(TaskStatus::Completed)
        })
        .await
    }

    pub async fn set_message(&self, id: &str, message: &str) -> Result<()> {
        self.update(id, |task| task.set_message(message)).await
    }

    async fn update<R>(&self, id: &str, f: impl FnOnce(&mut Task) -> R) -> Result<R> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(id).ok_or_else(|| not_found(id))?;
        Ok(f(task))
    }
}

fn not_found(id: &str) -> AppError {
    AppError::TaskNotFound {
        task_id: id.to_string(),
    }
}
