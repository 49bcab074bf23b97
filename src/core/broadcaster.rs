use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};

use crate::models::TaskEvent;

pub type SubscriberId = u64;

/// One observer's end of a task's event stream.
pub struct Subscription {
    pub id: SubscriberId,
    pub task_id: String,
    receiver: mpsc::Receiver<TaskEvent>,
}

impl Subscription {
    /// Next event, or `None` once the subscriber has been removed.
    pub async fn recv(&mut self) -> Option<TaskEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<TaskEvent> {
        self.receiver.try_recv().ok()
    }
}

/// Per-task fan-out of task events.
///
/// Delivery is best effort: a subscriber whose channel is closed or full is
/// dropped on the spot, and the remaining subscribers still get the event.
#[derive(Clone)]
pub struct EventBroadcaster {
    subscribers: Arc<RwLock<HashMap<String, HashMap<SubscriberId, mpsc::Sender<TaskEvent>>>>>,
    next_id: Arc<AtomicU64>,
    buffer: usize,
}

impl EventBroadcaster {
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            buffer: buffer.max(1),
        }
    }

    pub async fn subscribe(&self, task_id: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut subscribers = self.subscribers.write().await;
        prune_closed(&mut subscribers);
        subscribers.entry(task_id.to_string()).or_default().insert(id, tx);
        tracing::debug!("Subscriber {} attached to task {}", id, task_id);

        Subscription {
            id,
            task_id: task_id.to_string(),
            receiver: rx,
        }
    }

    /// Removing an unknown or already removed subscriber is a no-op.
    pub async fn unsubscribe(&self, task_id: &str, id: SubscriberId) {
        let mut subscribers = self.subscribers.write().await;
        if let Some(set) = subscribers.get_mut(task_id) {
            if set.remove(&id).is_some() {
                tracing::debug!("Subscriber {} detached from task {}", id, task_id);
            }
            if set.is_empty() {
                subscribers.remove(task_id);
            }
        }
    }

    /// Deliver `event` to every current subscriber of `task_id`. Returns how many received it.
    pub async fn publish(&self, task_id: &str, event: TaskEvent) -> usize {
        let mut failed = Vec::new();
        let mut delivered = 0;

        {
            let subscribers = self.subscribers.read().await;
            let Some(set) = subscribers.get(task_id) else {
                return 0;
            };
            for (id, tx) in set {
                match tx.try_send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(e) => {
                        tracing::debug!("Dropping subscriber {} of task {}: {}", id, task_id, e);
                        failed.push(*id);
                    }
                }
            }
        }

        if !failed.is_empty() {
            metrics::counter!("price_hunter_events_dropped_subscribers_total")
                .increment(failed.len() as u64);
            for id in failed {
                self.unsubscribe(task_id, id).await;
            }
        }

        delivered
    }

    pub async fn subscriber_count(&self, task_id: &str) -> usize {
        let subscribers = self.subscribers.read().await;
        subscribers.get(task_id).map(|set| set.len()).unwrap_or(0)
    }
}

/// Drop senders whose `Subscription` went away without unsubscribing, and
/// any task left with no subscribers.
fn prune_closed(subscribers: &mut HashMap<String, HashMap<SubscriberId, mpsc::Sender<TaskEvent>>>) {
    subscribers.retain(|_, set| {
        set.retain(|_, tx| !tx.is_closed());
        !set.is_empty()
    });
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}
