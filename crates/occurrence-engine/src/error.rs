//! Error types for occurrence-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A timed event without a usable zone. Fatal to that event, not the batch.
    #[error("Invalid event record '{uid}': {reason}")]
    InvalidEventRecord { uid: String, reason: String },

    /// A rule the normalizer could not repair. Callers degrade to non-recurring.
    #[error("Unsupported recurrence: {0}")]
    UnsupportedRecurrence(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Failed to fetch feed '{source_id}': {message}")]
    FeedFetch { source_id: String, message: String },

    #[error("Failed to decode feed '{source_id}': {message}")]
    FeedDecode { source_id: String, message: String },

    #[error("Invalid query window: {0}")]
    WindowComputation(String),

    #[error("All {0} feeds failed")]
    AllFeedsFailed(usize),
}

pub type Result<T> = std::result::Result<T, EngineError>;
