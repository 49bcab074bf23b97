use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Bound a failure message to `limit` characters before it is stored or sent.
pub fn truncate_message(message: &str, limit: usize) -> String {
    match message.char_indices().nth(limit) {
        Some((idx, _)) => message[..idx].to_string(),
        None => message.to_string(),
    }
}
