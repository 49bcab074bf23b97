use serde::{Deserialize, Serialize};

use super::{BestPick, ResultMap, SearchResult, TargetApp, Task, TaskStatus};

/// Transition notification pushed to a task's subscribers. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskEvent {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_app: Option<TargetApp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_complete: Option<TargetApp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SearchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best: Option<BestPick>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<TargetApp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskEvent {
    fn base(task_id: &str, status: TaskStatus) -> Self {
        Self {
            task_id: task_id.to_string(),
            status,
            current_app: None,
            app_complete: None,
            result: None,
            results: None,
            best: None,
            app: None,
            message: None,
            error: None,
        }
    }

    pub fn started(task_id: &str) -> Self {
        Self {
            message: Some("Starting...".to_string()),
            ..Self::base(task_id, TaskStatus::Searching)
        }
    }

    pub fn app_started(task_id: &str, app: TargetApp) -> Self {
        Self {
            current_app: Some(app),
            message: Some(format!("Searching {}...", app.display_name())),
            ..Self::base(task_id, TaskStatus::Searching)
        }
    }

    pub fn app_complete(task_id: &str, result: SearchResult) -> Self {
        Self {
            app_complete: Some(result.app),
            result: Some(result),
            ..Self::base(task_id, TaskStatus::Searching)
        }
    }

    pub fn completed(task_id: &str, results: ResultMap, best: Option<BestPick>) -> Self {
        Self {
            results: Some(results),
            best,
            ..Self::base(task_id, TaskStatus::Completed)
        }
    }

    /// Terminal event of a single-app run: carries the one result both on its own and as the map.
    pub fn single_completed(task_id: &str, result: SearchResult) -> Self {
        let mut results = ResultMap::new();
        results.insert(result.app, result.clone());
        Self {
            app_complete: Some(result.app),
            result: Some(result),
            results: Some(results),
            ..Self::base(task_id, TaskStatus::Completed)
        }
    }

    pub fn order_completed(task_id: &str, app: TargetApp, summary: impl Into<String>) -> Self {
        Self {
            app: Some(app),
            message: Some(summary.into()),
            ..Self::base(task_id, TaskStatus::Completed)
        }
    }

    pub fn failed(task_id: &str, app: Option<TargetApp>, error: impl Into<String>) -> Self {
        Self {
            app,
            error: Some(error.into()),
            ..Self::base(task_id, TaskStatus::Error)
        }
    }

    /// Current state of `task` as a single event, for observers that attach late.
    pub fn snapshot(task: &Task) -> Self {
        let mut event = Self::base(&task.id, task.status);
        if !task.results.is_empty() {
            event.results = Some(task.results.clone());
        }
        event.best = task.best.clone();
        match task.status {
            TaskStatus::Error => event.error = task.message.clone(),
            _ => event.message = task.message.clone(),
        }
        event
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
