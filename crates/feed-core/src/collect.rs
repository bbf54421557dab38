//! Concurrent fetch-decode-aggregate over many feeds.

use futures::future::join_all;
use occurrence_engine::{aggregate, Aggregation, EventRecord, FeedFailure, FeedStream, QueryWindow};

use crate::cache::FeedCache;
use crate::decode::decode;
use crate::error::Result;
use crate::http::HttpClient;
use crate::source::{FeedLocation, FeedSource};

/// Fetch (through the cache) and decode one feed. Floating and DATE values are read
/// in `window`'s zone.
///
/// # Errors
/// Returns `FeedError::Fetch`/`FeedError::Io` when the bytes cannot be obtained and
/// `FeedError::Decode` when they are not iCalendar.
pub async fn load(
    source: &FeedSource,
    client: &HttpClient,
    cache: &FeedCache,
    window: &QueryWindow,
) -> Result<Vec<EventRecord>> {
    let raw = match &source.location {
        FeedLocation::Remote(url) => cache.fetch(client, url).await?,
        FeedLocation::File(path) => tokio::fs::read_to_string(path).await?,
    };
    decode(&raw, window.timezone)
}

/// Load every feed concurrently, then materialize and merge them over `window`.
///
/// # Errors
/// Returns `EngineError::AllFeedsFailed` when at least one source was given and
/// none of them could be loaded.
pub async fn collect(
    sources: &[FeedSource],
    client: &HttpClient,
    cache: &FeedCache,
    window: &QueryWindow,
) -> occurrence_engine::error::Result<Aggregation> {
    let loads = sources.iter().map(|source| async move {
        match load(source, client, cache, window).await {
            Ok(events) => {
                tracing::debug!(source = %source.id, events = events.len(), "loaded feed");
                Ok(FeedStream {
                    source_id: source.id.clone(),
                    events,
                })
            }
            Err(err) => Err(FeedFailure {
                source_id: source.id.clone(),
                error: err.into_engine_error(&source.id),
            }),
        }
    });

    let feeds = join_all(loads).await;
    aggregate(feeds, window)
}
