use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::core::aggregator::BestPriceAggregator;
use crate::core::broadcaster::EventBroadcaster;
use crate::core::registry::TaskRegistry;
use crate::core::scripts::{order_script, search_script};
use crate::models::{FailureKind, SearchResult, TargetApp, TaskEvent, TaskStatus};
use crate::plugins::extractors::{PriceExtractor, ProductLabelExtractor};
use crate::plugins::traits::{AutomationEngine, AutomationRequest, DeviceProbe, SessionContext};
use crate::utils::error::{truncate_message, AppError, Result};

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub cooldown: Duration,
    pub search_max_steps: u32,
    pub order_max_steps: u32,
    pub error_message_limit: usize,
    pub session: SessionContext,
}

impl OrchestratorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            cooldown: Duration::from_millis(config.orchestrator.cooldown_ms),
            search_max_steps: config.agent.search_max_steps,
            order_max_steps: config.agent.order_max_steps,
            error_message_limit: config.orchestrator.error_message_limit,
            session: SessionContext {
                device_serial: config.agent.device_serial.clone(),
                provider: config.agent.provider.clone(),
                model: config.agent.model.clone(),
            },
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Drives a task's automation attempts and records what they found.
///
/// Apps within one task always run one after another: the device hosts a
/// single automation session at a time. Per-app failures are turned into
/// recorded results; only registry misses come back as errors.
#[derive(Clone)]
pub struct SearchOrchestrator {
    registry: TaskRegistry,
    broadcaster: EventBroadcaster,
    engine: Arc<dyn AutomationEngine>,
    probe: Arc<dyn DeviceProbe>,
    price_extractor: Arc<PriceExtractor>,
    label_extractor: Arc<ProductLabelExtractor>,
    settings: OrchestratorSettings,
}

impl SearchOrchestrator {
    pub fn new(
        registry: TaskRegistry,
        broadcaster: EventBroadcaster,
        engine: Arc<dyn AutomationEngine>,
        probe: Arc<dyn DeviceProbe>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            engine,
            probe,
            price_extractor: Arc::new(PriceExtractor::new()),
            label_extractor: Arc::new(ProductLabelExtractor::new()),
            settings,
        }
    }

    /// Search every app in priority order, then pick the best price.
    pub async fn run_all(&self, task_id: &str, product: &str) -> Result<()> {
        self.registry.advance(task_id, TaskStatus::Searching).await?;
        self.broadcaster.publish(task_id, TaskEvent::started(task_id)).await;
        tracing::info!("Task {}: searching all apps for '{}'", task_id, product);

        let apps = TargetApp::PRIORITY;
        for (index, app) in apps.iter().copied().enumerate() {
            let result = if self.probe.is_connected().await {
                self.broadcaster
                    .publish(task_id, TaskEvent::app_started(task_id, app))
                    .await;
                self.attempt(app, product).await
            } else {
                tracing::warn!("Task {}: device disconnected, skipping {}", task_id, app);
                Self::count_attempt(app, "device_unavailable");
                SearchResult::device_unavailable(app, product)
            };

            let attempted = result.failure != Some(FailureKind::DeviceUnavailable);
            self.record(task_id, result).await?;

            let has_next = index + 1 < apps.len();
            if attempted && has_next && !self.settings.cooldown.is_zero() {
                tokio::time::sleep(self.settings.cooldown).await;
            }
        }

        let snapshot = self.registry.get(task_id).await?;
        let best = BestPriceAggregator::aggregate(&snapshot.results);
        self.registry.complete(task_id, best.clone()).await?;

        match &best {
            Some(pick) => tracing::info!("Task {}: best price ₹{} on {}", task_id, pick.price, pick.app),
            None => tracing::info!("Task {}: no price found on any app", task_id),
        }

        self.broadcaster
            .publish(task_id, TaskEvent::completed(task_id, snapshot.results, best))
            .await;
        Ok(())
    }

    /// Search one app. No cooldown and no best pick.
    pub async fn run_single(&self, task_id: &str, product: &str, app: TargetApp) -> Result<()> {
        self.registry.advance(task_id, TaskStatus::Searching).await?;
        self.broadcaster
            .publish(task_id, TaskEvent::app_started(task_id, app))
            .await;
        tracing::info!("Task {}: searching {} for '{}'", task_id, app, product);

        let result = self.search_app(app, product).await;
        self.registry.record_result(task_id, result.clone()).await?;
        self.registry.complete(task_id, None).await?;

        self.broadcaster
            .publish(task_id, TaskEvent::single_completed(task_id, result))
            .await;
        Ok(())
    }

    /// Place a cash-on-delivery order. An engine failure ends the task in `Error`.
    pub async fn run_order(&self, task_id: &str, app: TargetApp, product: &str) -> Result<()> {
        self.registry.advance(task_id, TaskStatus::Searching).await?;
        tracing::info!("Task {}: ordering '{}' from {}", task_id, product, app);

        let request = AutomationRequest {
            script: order_script(app, product),
            max_steps: self.settings.order_max_steps,
            session: self.settings.session.clone(),
        };

        match self.engine.run(request).await {
            Ok(outcome) => {
                let summary = outcome.result;
                self.registry.set_message(task_id, &summary).await?;
                self.registry.complete(task_id, None).await?;
                tracing::info!("Task {}: order on {} finished: {}", task_id, app, summary);
                self.broadcaster
                    .publish(task_id, TaskEvent::order_completed(task_id, app, summary))
                    .await;
            }
            Err(e) => {
                let message = self.bounded_message(&e);
                tracing::warn!("Task {}: order on {} failed: {}", task_id, app, message);
                self.registry.set_message(task_id, &message).await?;
                self.registry.advance(task_id, TaskStatus::Error).await?;
                self.broadcaster
                    .publish(task_id, TaskEvent::failed(task_id, Some(app), message))
                    .await;
            }
        }

        Ok(())
    }

    /// Probe the device, then run one search attempt.
    pub async fn search_app(&self, app: TargetApp, product: &str) -> SearchResult {
        if !self.probe.is_connected().await {
            tracing::warn!("Device disconnected, skipping {}", app);
            Self::count_attempt(app, "device_unavailable");
            return SearchResult::device_unavailable(app, product);
        }
        self.attempt(app, product).await
    }

    async fn attempt(&self, app: TargetApp, product: &str) -> SearchResult {
        let request = AutomationRequest {
            script: search_script(app, product),
            max_steps: self.settings.search_max_steps,
            session: self.settings.session.clone(),
        };

        let outcome = match self.engine.run(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = self.bounded_message(&e);
                tracing::warn!("{} attempt failed: {}", app, message);
                Self::count_attempt(app, "agent_failure");
                return SearchResult::agent_failure(app, product, message);
            }
        };

        let text = outcome.full_text();
        tracing::debug!("{} transcript: {} chars", app, text.len());

        match self.price_extractor.extract(&text) {
            Some(price) => {
                let label = self.label_extractor.extract(&text, product);
                tracing::info!("{}: found ₹{} for '{}'", app, price, label);
                Self::count_attempt(app, "found");
                SearchResult::found(app, label, price)
            }
            None => {
                tracing::info!("{}: no price in transcript", app);
                Self::count_attempt(app, "extraction_miss");
                SearchResult::extraction_miss(app, product)
            }
        }
    }

    async fn record(&self, task_id: &str, result: SearchResult) -> Result<()> {
        if self.registry.record_result(task_id, result.clone()).await? {
            self.broadcaster
                .publish(task_id, TaskEvent::app_complete(task_id, result))
                .await;
        }
        Ok(())
    }

    fn bounded_message(&self, error: &AppError) -> String {
        let raw = match error {
            AppError::Agent(message) => message.clone(),
            other => other.to_string(),
        };
        truncate_message(&raw, self.settings.error_message_limit)
    }

    fn count_attempt(app: TargetApp, outcome: &'static str) {
        metrics::counter!(
            "price_hunter_app_attempts_total",
            "app" => app.as_str(),
            "outcome" => outcome
        )
        .increment(1);
    }
}
