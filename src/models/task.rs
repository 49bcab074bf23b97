use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{BestPick, SearchResult, TargetApp, TaskKind, TaskStatus};

/// Results keyed by app; iteration follows app priority order.
pub type ResultMap = BTreeMap<TargetApp, SearchResult>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub product: String,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub results: ResultMap,
    pub best: Option<BestPick>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: impl Into<String>, product: impl Into<String>, kind: TaskKind) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            product: product.into(),
            kind,
            status: TaskStatus::Pending,
            results: BTreeMap::new(),
            best: None,
            message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next` if that is a forward transition. Returns whether it moved.
    pub fn advance(&mut self, next: TaskStatus) -> bool {
        if !self.status.can_advance_to(next) {
            return false;
        }
        self.status = next;
        self.touch();
        true
    }

    /// Store the result for its app unless one is already recorded.
    pub fn record_result(&mut self, result: SearchResult) -> bool {
        if self.results.contains_key(&result.app) {
            return false;
        }
        self.results.insert(result.app, result);
        self.touch();
        true
    }

    /// Best pick is written once.
    pub fn set_best(&mut self, best: Option<BestPick>) -> bool {
        if self.best.is_some() {
            return false;
        }
        self.best = best;
        self.touch();
        true
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
