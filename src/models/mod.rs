use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub mod event;
pub mod search_result;
pub mod task;

// Re-exports for convenience
pub use event::*;
pub use search_result::*;
pub use task::*;

/// Shopping app targeted by an automation run.
///
/// Declaration order is the priority order: it drives the multi-app run
/// sequence and breaks ties when picking the best price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TargetApp {
    Flipkart,
    Amazon,
    Blinkit,
    Zepto,
}

impl TargetApp {
    pub const PRIORITY: [TargetApp; 4] = [
        TargetApp::Flipkart,
        TargetApp::Amazon,
        TargetApp::Blinkit,
        TargetApp::Zepto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetApp::Flipkart => "flipkart",
            TargetApp::Amazon => "amazon",
            TargetApp::Blinkit => "blinkit",
            TargetApp::Zepto => "zepto",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TargetApp::Flipkart => "Flipkart",
            TargetApp::Amazon => "Amazon",
            TargetApp::Blinkit => "Blinkit",
            TargetApp::Zepto => "Zepto",
        }
    }

    /// Label of the launcher icon the agent opens on the device.
    pub fn launcher_label(&self) -> &'static str {
        match self {
            TargetApp::Amazon => "Amazon Shopping",
            other => other.display_name(),
        }
    }
}

impl fmt::Display for TargetApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetApp {
    type Err = crate::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flipkart" => Ok(TargetApp::Flipkart),
            "amazon" => Ok(TargetApp::Amazon),
            "blinkit" => Ok(TargetApp::Blinkit),
            "zepto" => Ok(TargetApp::Zepto),
            other => Err(crate::AppError::Validation(format!("Unknown app: {}", other))),
        }
    }
}

/// Lifecycle of a task. Transitions only move forward:
/// `Pending -> Searching -> {Completed | Error}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Searching,
    Completed,
    Error,
}

impl TaskStatus {
    pub fn rank(&self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Searching => 1,
            TaskStatus::Completed | TaskStatus::Error => 2,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rank() == 2
    }

    pub fn can_advance_to(&self, next: TaskStatus) -> bool {
        next.rank() > self.rank()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Searching => "searching",
            TaskStatus::Completed => "completed",
            TaskStatus::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Search,
    Order,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Search => "search",
            TaskKind::Order => "order",
        }
    }
}

// Utility function to generate task IDs
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
