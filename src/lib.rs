pub mod config;
pub mod core;
pub mod models;
pub mod plugins;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use config::AppConfig;
pub use core::{SearchOrchestrator, TaskService};
pub use models::{SearchResult, TargetApp, Task, TaskEvent, TaskStatus};
pub use utils::error::AppError;
