//! Multi-feed aggregation with partial-failure tolerance.
//!
//! Accepts N decoded feeds (or the reason a feed could not be decoded), materializes
//! every event of every feed over one window, and merges the result into a single
//! start-ordered list. One broken feed never hides the others; the aggregate only
//! fails when every feed did.

use crate::error::{EngineError, Result};
use crate::event::{EventRecord, Occurrence};
use crate::materializer::materialize;
use crate::window::QueryWindow;

/// The decoded events of one feed.
#[derive(Debug, Clone)]
pub struct FeedStream {
    /// Opaque identifier for this feed (e.g., "family", "work-ics").
    pub source_id: String,
    pub events: Vec<EventRecord>,
}

/// A feed that contributed nothing, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedFailure {
    pub source_id: String,
    pub error: EngineError,
}

/// Merged occurrences plus the feeds that failed along the way.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Occurrences from every successful feed, sorted by start.
    pub occurrences: Vec<Occurrence>,
    /// Feeds that contributed no occurrences because they failed.
    pub failures: Vec<FeedFailure>,
    /// Events skipped because their records were invalid.
    pub skipped_events: usize,
}

/// Materialize and merge `feeds` over `window`.
///
/// Each feed is independent: its events are materialized, stamped with the feed's
/// `source_id`, and concatenated. The final list is stable-sorted by start, so
/// occurrences with equal starts keep feed order.
///
/// # Errors
/// Returns `EngineError::AllFeedsFailed` when at least one feed was given and every
/// one of them failed.
pub fn aggregate(
    feeds: Vec<std::result::Result<FeedStream, FeedFailure>>,
    window: &QueryWindow,
) -> Result<Aggregation> {
    let total = feeds.len();
    let mut aggregation = Aggregation::default();

    for feed in feeds {
        match feed {
            Ok(stream) => {
                let (occurrences, skipped) = materialize_stream(&stream, window);
                aggregation.occurrences.extend(occurrences);
                aggregation.skipped_events += skipped;
            }
            Err(failure) => {
                tracing::warn!(source = %failure.source_id, error = %failure.error, "feed failed");
                aggregation.failures.push(failure);
            }
        }
    }

    if total > 0 && aggregation.failures.len() == total {
        return Err(EngineError::AllFeedsFailed(total));
    }

    aggregation.occurrences.sort_by_key(|occ| occ.start);
    Ok(aggregation)
}

/// Materialize every event of one feed. Invalid events are logged and counted.
fn materialize_stream(stream: &FeedStream, window: &QueryWindow) -> (Vec<Occurrence>, usize) {
    let mut occurrences = Vec::new();
    let mut skipped = 0;

    for event in &stream.events {
        match materialize(event, window) {
            Ok(materialized) => {
                occurrences.extend(materialized.into_iter().map(|occ| Occurrence {
                    source_id: stream.source_id.clone(),
                    ..occ
                }));
            }
            Err(err) => {
                tracing::warn!(source = %stream.source_id, uid = %event.uid, error = %err, "skipping event");
                skipped += 1;
            }
        }
    }

    tracing::debug!(
        source = %stream.source_id,
        events = stream.events.len(),
        occurrences = occurrences.len(),
        "materialized feed"
    );
    (occurrences, skipped)
}
