use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;

use crate::config::AppConfig;
use crate::core::broadcaster::{EventBroadcaster, SubscriberId, Subscription};
use crate::core::orchestrator::{OrchestratorSettings, SearchOrchestrator};
use crate::core::registry::TaskRegistry;
use crate::models::{generate_id, TargetApp, Task, TaskEvent, TaskKind, TaskStatus};
use crate::plugins::traits::{AutomationEngine, DeviceProbe};
use crate::utils::error::{truncate_message, AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    pub total_tasks: usize,
    pub running_jobs: usize,
    pub uptime_seconds: u64,
}

/// Entry point for callers: registers tasks and runs them in the background.
///
/// Every run is wrapped by a supervisor. A run that returns an error or
/// panics still leaves its task in a terminal state with an error event.
#[derive(Clone)]
pub struct TaskService {
    registry: TaskRegistry,
    broadcaster: EventBroadcaster,
    orchestrator: SearchOrchestrator,
    probe: Arc<dyn DeviceProbe>,
    running_jobs: Arc<Mutex<HashMap<String, AbortHandle>>>, // task_id -> job
    error_message_limit: usize,
    start_time: DateTime<Utc>,
}

impl TaskService {
    pub fn new(
        config: &AppConfig,
        engine: Arc<dyn AutomationEngine>,
        probe: Arc<dyn DeviceProbe>,
    ) -> Self {
        Self::with_settings(
            OrchestratorSettings::from_config(config),
            config.orchestrator.subscriber_buffer,
            engine,
            probe,
        )
    }

    pub fn with_settings(
        settings: OrchestratorSettings,
        subscriber_buffer: usize,
        engine: Arc<dyn AutomationEngine>,
        probe: Arc<dyn DeviceProbe>,
    ) -> Self {
        let registry = TaskRegistry::new();
        let broadcaster = EventBroadcaster::new(subscriber_buffer);
        let error_message_limit = settings.error_message_limit;
        let orchestrator = SearchOrchestrator::new(
            registry.clone(),
            broadcaster.clone(),
            engine,
            Arc::clone(&probe),
            settings,
        );

        Self {
            registry,
            broadcaster,
            orchestrator,
            probe,
            running_jobs: Arc::new(Mutex::new(HashMap::new())),
            error_message_limit,
            start_time: Utc::now(),
        }
    }

    /// Register a search task and start it. `app` narrows the run to one app.
    pub async fn start_search(&self, product: &str, app: Option<TargetApp>) -> Result<String> {
        let product = normalize_product(product)?;
        let task_id = generate_id();
        self.registry.create(&task_id, &product, TaskKind::Search).await?;

        let orchestrator = self.orchestrator.clone();
        let id = task_id.clone();
        match app {
            Some(app) => {
                tracing::info!("Starting search {} for '{}' on {}", task_id, product, app);
                self.submit(&task_id, TaskKind::Search, async move {
                    orchestrator.run_single(&id, &product, app).await
                })
                .await;
            }
            None => {
                tracing::info!("Starting search {} for '{}' on all apps", task_id, product);
                self.submit(&task_id, TaskKind::Search, async move {
                    orchestrator.run_all(&id, &product).await
                })
                .await;
            }
        }

        Ok(task_id)
    }

    /// Register an order task and start it.
    pub async fn place_order(&self, product: &str, app: TargetApp) -> Result<String> {
        let product = normalize_product(product)?;
        let task_id = generate_id();
        self.registry.create(&task_id, &product, TaskKind::Order).await?;

        tracing::info!("Starting order {} for '{}' on {}", task_id, product, app);
        let orchestrator = self.orchestrator.clone();
        let id = task_id.clone();
        self.submit(&task_id, TaskKind::Order, async move {
            orchestrator.run_order(&id, app, &product).await
        })
        .await;

        Ok(task_id)
    }

    pub async fn get_task(&self, task_id: &str) -> Result<Task> {
        self.registry.get(task_id).await
    }

    pub async fn check_device(&self) -> bool {
        self.probe.is_connected().await
    }

    pub async fn subscribe(&self, task_id: &str) -> Subscription {
        self.broadcaster.subscribe(task_id).await
    }

    pub async fn unsubscribe(&self, task_id: &str, id: SubscriberId) {
        self.broadcaster.unsubscribe(task_id, id).await
    }

    pub async fn running_jobs(&self) -> usize {
        self.running_jobs.lock().await.len()
    }

    pub async fn is_running(&self, task_id: &str) -> bool {
        self.running_jobs.lock().await.contains_key(task_id)
    }

    pub async fn stats(&self) -> ServiceStats {
        let uptime = Utc::now().signed_duration_since(self.start_time);
        ServiceStats {
            total_tasks: self.registry.len().await,
            running_jobs: self.running_jobs().await,
            uptime_seconds: uptime.num_seconds().max(0) as u64,
        }
    }

    /// Abort every run still in flight. Their tasks are left as they are.
    pub async fn shutdown(&self) {
        let mut running_jobs = self.running_jobs.lock().await;
        for (task_id, handle) in running_jobs.drain() {
            handle.abort();
            tracing::debug!("Cancelled running job for task: {}", task_id);
        }
        tracing::info!("Task service shutdown");
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn broadcaster(&self) -> &EventBroadcaster {
        &self.broadcaster
    }

    async fn submit<F>(&self, task_id: &str, kind: TaskKind, job: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        metrics::counter!("price_hunter_tasks_started_total", "kind" => kind.as_str()).increment(1);

        // Held until the handle is stored, so the supervisor's removal always comes after it
        let mut running_jobs = self.running_jobs.lock().await;

        let job_handle = tokio::spawn(job);
        running_jobs.insert(task_id.to_string(), job_handle.abort_handle());

        let registry = self.registry.clone();
        let broadcaster = self.broadcaster.clone();
        let jobs = Arc::clone(&self.running_jobs);
        let limit = self.error_message_limit;
        let id = task_id.to_string();

        tokio::spawn(async move {
            let failure = match job_handle.await {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(e) if e.is_cancelled() => {
                    tracing::debug!("Job for task {} was cancelled", id);
                    None
                }
                Err(e) => Some(format!("Internal error: {}", panic_message(e))),
            };

            if let Some(message) = failure {
                tracing::error!("Job for task {} failed: {}", id, message);
                fail_task(&registry, &broadcaster, &id, &truncate_message(&message, limit)).await;
            }

            jobs.lock().await.remove(&id);
        });
    }
}

fn normalize_product(product: &str) -> Result<String> {
    let product = product.trim();
    if product.is_empty() {
        return Err(AppError::Validation("Product must not be empty".to_string()));
    }
    Ok(product.to_string())
}

fn panic_message(error: tokio::task::JoinError) -> String {
    match error.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "job panicked".to_string()),
        Err(e) => e.to_string(),
    }
}

async fn fail_task(registry: &TaskRegistry, broadcaster: &EventBroadcaster, task_id: &str, message: &str) {
    match registry.advance(task_id, TaskStatus::Error).await {
        Ok(true) => {
            let _ = registry.set_message(task_id, message).await;
            broadcaster
                .publish(task_id, TaskEvent::failed(task_id, None, message))
                .await;
        }
        Ok(false) => {}
        Err(e) => tracing::warn!("Could not mark task {} as failed: {}", task_id, e),
    }
}
