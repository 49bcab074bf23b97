use serde::{Deserialize, Serialize};

use super::TargetApp;

/// Why an app attempt produced no price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    DeviceUnavailable,
    AgentFailure,
    ExtractionMiss,
}

pub const DEVICE_DISCONNECTED: &str = "device disconnected";
pub const PRICE_NOT_FOUND: &str = "price not found";

/// Outcome of one app attempt. Built once and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub app: TargetApp,
    pub product: String,
    pub found: bool,
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl SearchResult {
    pub fn found(app: TargetApp, product: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            app,
            product: product.into(),
            found: true,
            price: Some(price.into()),
            error: None,
            failure: None,
        }
    }

    pub fn device_unavailable(app: TargetApp, product: impl Into<String>) -> Self {
        Self::failed(app, product, FailureKind::DeviceUnavailable, DEVICE_DISCONNECTED)
    }

    pub fn extraction_miss(app: TargetApp, product: impl Into<String>) -> Self {
        Self::failed(app, product, FailureKind::ExtractionMiss, PRICE_NOT_FOUND)
    }

    pub fn agent_failure(app: TargetApp, product: impl Into<String>, error: impl Into<String>) -> Self {
        Self::failed(app, product, FailureKind::AgentFailure, error)
    }

    fn failed(
        app: TargetApp,
        product: impl Into<String>,
        failure: FailureKind,
        error: impl Into<String>,
    ) -> Self {
        Self {
            app,
            product: product.into(),
            found: false,
            price: None,
            error: Some(error.into()),
            failure: Some(failure),
        }
    }
}

/// Cheapest (app, price) pair across a task's results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BestPick {
    pub app: TargetApp,
    pub price: String,
}
