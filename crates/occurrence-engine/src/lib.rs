//! # occurrence-engine
//!
//! Turns decoded calendar entries into the concrete occurrences a weekly grid shows.
//!
//! Given one event record (possibly recurring, possibly all-day, possibly carrying
//! exception dates and per-instance overrides) and a query window in a target zone,
//! the engine produces the exact, deduplicated set of occurrences inside the window,
//! with wall-clock times that stay put across DST transitions. It wraps the `rrule`
//! crate for iteration and re-derives every instant itself via `chrono-tz`.
//!
//! ## Modules
//!
//! - [`event`] — `EventRecord`, `RecurrenceRule`, `Occurrence`, classification
//! - [`rule`] — recurrence rule normalization and RRULE rendering
//! - [`iterator`] — the recurrence iterator seam and its `rrule` implementation
//! - [`dst`] — wall-clock → instant resolution (gap and fold policies)
//! - [`resolver`] — exception and override resolution per candidate date
//! - [`materializer`] — event → occurrences
//! - [`window`] — query windows, clipping, per-day splitting
//! - [`aggregate`] — merge many feeds with partial-failure tolerance
//! - [`error`] — Error types

pub mod aggregate;
pub mod dst;
pub mod error;
pub mod event;
pub mod iterator;
pub mod materializer;
pub mod resolver;
pub mod rule;
pub mod window;

pub use aggregate::{aggregate, Aggregation, FeedFailure, FeedStream};
pub use dst::DstPolicy;
pub use error::EngineError;
pub use event::{EventKind, EventRecord, Frequency, Occurrence, RecurrenceRule, WeekdayNum};
pub use iterator::{DateEnumerator, RRuleEnumerator};
pub use materializer::{materialize, Materializer};
pub use resolver::{resolve, Resolution};
pub use rule::normalize;
pub use window::{clip, QueryWindow};
