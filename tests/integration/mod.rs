// Integration tests for Price Hunter
// These tests drive the service and HTTP API against a scripted engine and probe

pub mod orchestrator_tests;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use price_hunter::{
    core::OrchestratorSettings,
    models::TargetApp,
    plugins::traits::{AutomationEngine, AutomationOutcome, AutomationRequest, DeviceProbe},
    web::AppState,
    AppConfig, AppError, TaskService,
};

/// Engine that answers each app with a canned reply.
#[derive(Default)]
pub struct ScriptedEngine {
    replies: HashMap<TargetApp, Result<String, String>>,
    order_reply: Option<String>,
    delay: Duration,
    calls: Mutex<Vec<AutomationRequest>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, app: TargetApp, text: &str) -> Self {
        self.replies.insert(app, Ok(text.to_string()));
        self
    }

    pub fn fail(mut self, app: TargetApp, error: &str) -> Self {
        self.replies.insert(app, Err(error.to_string()));
        self
    }

    /// Reply for order scripts, whatever the app.
    pub fn order_reply(mut self, text: &str) -> Self {
        self.order_reply = Some(text.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<AutomationRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn app_for(script: &str) -> Option<TargetApp> {
        TargetApp::PRIORITY
            .into_iter()
            .find(|app| script.contains(app.display_name()))
    }
}

#[async_trait]
impl AutomationEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn run(&self, request: AutomationRequest) -> Result<AutomationOutcome, AppError> {
        self.calls.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let is_order = request.script.contains("Cash on Delivery");
        let reply = match &self.order_reply {
            Some(text) if is_order => Some(Ok(text.clone())),
            _ => Self::app_for(&request.script).and_then(|app| self.replies.get(&app).cloned()),
        };
        match reply {
            Some(Ok(text)) => Ok(AutomationOutcome::new("step 1: open app", text)),
            Some(Err(error)) => Err(AppError::Agent(error)),
            None => Ok(AutomationOutcome::new("step 1: open app", "gave up")),
        }
    }
}

/// Probe whose answer can be flipped while a test runs.
pub struct ScriptedProbe {
    connected: AtomicBool,
}

impl ScriptedProbe {
    pub fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeviceProbe for ScriptedProbe {
    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Test configuration for integration tests
pub fn get_test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.orchestrator.cooldown_ms = 0;
    config.orchestrator.subscriber_buffer = 64;
    config
}

/// Engine with a price on every app; Amazon is the cheapest
pub fn priced_engine() -> ScriptedEngine {
    ScriptedEngine::new()
        .reply(TargetApp::Flipkart, "PRICE: ₹1,299 for Boat Rockerz 450")
        .reply(TargetApp::Amazon, "PRICE: ₹1,199 for boAt Rockerz 450 Bluetooth")
        .reply(TargetApp::Blinkit, "The price is ₹1,349")
        .reply(TargetApp::Zepto, "PRICE: ₹1,250 for Rockerz 450")
}

pub fn create_test_service(engine: Arc<ScriptedEngine>, probe: Arc<ScriptedProbe>) -> TaskService {
    TaskService::new(&get_test_config(), engine, probe)
}

pub fn service_with_settings(
    settings: OrchestratorSettings,
    engine: Arc<ScriptedEngine>,
    probe: Arc<ScriptedProbe>,
) -> TaskService {
    TaskService::with_settings(settings, 64, engine, probe)
}

/// Create test app state with all components initialized
pub fn create_test_app_state(engine: ScriptedEngine, connected: bool) -> AppState {
    let service = create_test_service(Arc::new(engine), Arc::new(ScriptedProbe::new(connected)));
    AppState::new(service, get_test_config())
}

/// Helper to make HTTP requests to the test app
pub async fn make_request(
    app: &mut axum::Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> anyhow::Result<axum::response::Response> {
    let mut request = Request::builder().method(method).uri(uri);

    if body.is_some() {
        request = request.header("content-type", "application/json");
    }

    let request = request.body(match body {
        Some(json) => Body::from(json.to_string()),
        None => Body::empty(),
    })?;

    let response = app.clone().oneshot(request).await?;
    Ok(response)
}

pub async fn read_json(response: axum::response::Response) -> anyhow::Result<serde_json::Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Helper to wait for async operations
pub async fn wait_for_condition<F, Fut>(mut condition: F, timeout_seconds: u64) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_secs(timeout_seconds);

    while start.elapsed() < timeout {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    false
}

/// Wait until the task is terminal and its job has been reaped.
pub async fn wait_for_task(service: &TaskService, task_id: &str) -> bool {
    wait_for_condition(
        move || async move {
            let terminal = match service.get_task(task_id).await {
                Ok(task) => task.status.is_terminal(),
                Err(_) => false,
            };
            terminal && !service.is_running(task_id).await
        },
        5,
    )
    .await
}
