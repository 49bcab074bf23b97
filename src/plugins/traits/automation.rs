use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

/// Session/tool context handed to the automation engine for one invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionContext {
    pub device_serial: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutomationRequest {
    pub script: String,
    pub max_steps: u32,
    pub session: SessionContext,
}

/// What one engine invocation produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AutomationOutcome {
    /// Free-text log of the run
    pub transcript: String,
    /// Terminal result reported by the agent
    pub result: String,
}

impl AutomationOutcome {
    pub fn new(transcript: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            result: result.into(),
        }
    }

    /// Transcript followed by the terminal result, the text the extractors scan.
    pub fn full_text(&self) -> String {
        if self.result.is_empty() {
            self.transcript.clone()
        } else if self.transcript.is_empty() {
            self.result.clone()
        } else {
            format!("{}\n{}", self.transcript, self.result)
        }
    }
}

/// Drives on-device interaction from a natural-language script.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AutomationEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, request: AutomationRequest) -> Result<AutomationOutcome, AppError>;
}
