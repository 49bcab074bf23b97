use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::{IntoResponse, Json},
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ApiError, AppState, DeviceStatus, TaskStarted};
use crate::core::{Subscription, TaskService};
use crate::models::{TargetApp, Task, TaskEvent};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 1, max = 200, message = "Product must be 1-200 characters"))]
    pub product: String,
    pub app: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderRequest {
    #[validate(length(min = 1, max = 200, message = "Product must be 1-200 characters"))]
    pub product: String,
    pub app: String,
}

impl SearchRequest {
    fn normalized(mut self) -> Self {
        self.product = self.product.trim().to_string();
        self
    }

    /// A blank or missing app means every app.
    fn target(&self) -> Result<Option<TargetApp>, ApiError> {
        match self.app.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => Ok(Some(name.parse()?)),
        }
    }
}

impl OrderRequest {
    fn normalized(mut self) -> Self {
        self.product = self.product.trim().to_string();
        self
    }
}

// Task handlers

pub async fn start_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<TaskStarted>, ApiError> {
    let request = request.normalized();
    request.validate()?;
    let app = request.target()?;

    let task_id = state.service.start_search(&request.product, app).await?;
    Ok(Json(TaskStarted::search(task_id)))
}

pub async fn place_order(
    State(state): State<AppState>,
    Json(request): Json<OrderRequest>,
) -> Result<Json<TaskStarted>, ApiError> {
    let request = request.normalized();
    request.validate()?;
    let app: TargetApp = request.app.parse()?;

    let task_id = state.service.place_order(&request.product, app).await?;
    Ok(Json(TaskStarted::order(task_id)))
}

pub async fn get_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let task = state.service.get_task(&task_id).await?;
    Ok(Json(task))
}

pub async fn check_device(State(state): State<AppState>) -> Json<DeviceStatus> {
    let connected = state.service.check_device().await;
    tracing::debug!("Device check: connected={}", connected);
    Json(DeviceStatus { connected })
}

pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.service.stats().await;
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "price-hunter",
        "total_tasks": stats.total_tasks,
        "running_jobs": stats.running_jobs,
        "uptime_seconds": stats.uptime_seconds,
    }))
}

// Live task events

pub async fn task_events_ws(
    ws: WebSocketUpgrade,
    Path(task_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_task_ws(socket, state.service, task_id))
}

async fn handle_task_ws(socket: WebSocket, service: TaskService, task_id: String) {
    let mut subscription = service.subscribe(&task_id).await;
    let (mut sender, mut receiver) = socket.split();

    if let Some(snapshot) = catch_up(&service, &mut subscription).await {
        match serde_json::to_string(&snapshot) {
            Ok(text) => {
                if sender.send(Message::Text(text)).await.is_err() {
                    service.unsubscribe(&task_id, subscription.id).await;
                    return;
                }
            }
            Err(e) => tracing::warn!("Could not encode snapshot for task {}: {}", task_id, e),
        }
    }

    loop {
        tokio::select! {
            event = subscription.recv() => {
                // None once the broadcaster dropped us
                let Some(event) = event else { break };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!("Could not encode event for task {}: {}", task_id, e);
                        continue;
                    }
                };
                if sender.send(Message::Text(text)).await.is_err() {
                    break; // client disconnected
                }
            }
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    service.unsubscribe(&task_id, subscription.id).await;
    tracing::debug!("WebSocket for task {} closed", task_id);
}

/// Snapshot for a socket that attached after its task already finished.
/// Anything buffered before the check is covered by the snapshot and discarded.
async fn catch_up(service: &TaskService, subscription: &mut Subscription) -> Option<TaskEvent> {
    let task = service.get_task(&subscription.task_id).await.ok()?;
    if !task.status.is_terminal() {
        return None;
    }
    while subscription.try_recv().is_some() {}
    Some(TaskEvent::snapshot(&task))
}
