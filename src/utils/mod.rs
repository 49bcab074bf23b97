pub mod error;

pub use error::{truncate_message, AppError};
