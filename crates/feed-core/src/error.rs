//! Error types for feed decoding, fetching and caching.

use occurrence_engine::EngineError;
use thiserror::Error;

/// Errors that can occur while turning a feed location into event records.
#[derive(Error, Debug)]
pub enum FeedError {
    /// The document is not a readable iCalendar stream.
    #[error("ICS decode error: {0}")]
    Decode(String),

    /// The feed could not be retrieved and no cached copy exists.
    #[error("Fetch error for {location}: {message}")]
    Fetch { location: String, message: String },

    /// A feed location that is neither a supported URL nor a file path.
    #[error("Invalid feed source '{0}'")]
    InvalidSource(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeedError {
    /// Engine-level error for the feed identified by `source_id`.
    pub fn into_engine_error(self, source_id: &str) -> EngineError {
        match self {
            FeedError::Decode(message) => EngineError::FeedDecode {
                source_id: source_id.to_string(),
                message,
            },
            other => EngineError::FeedFetch {
                source_id: source_id.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Convenience alias used throughout feed-core.
pub type Result<T> = std::result::Result<T, FeedError>;
