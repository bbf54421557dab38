//! # feed-core
//!
//! Gets calendar feeds from wherever they live into the occurrence engine.
//!
//! ## Modules
//!
//! - [`source`] — feed locations (`https://`, `webcal://`, local files)
//! - [`http`] — HTTP client with bounded retries
//! - [`cache`] — on-disk TTL cache with stale fallback
//! - [`decode`] — ICS → `EventRecord`s (series, exceptions, overrides)
//! - [`recurrence`] — RRULE text → `RecurrenceRule`
//! - [`collect`] — concurrent fetch, decode and aggregation
//! - [`error`] — Error types

pub mod cache;
pub mod collect;
pub mod decode;
pub mod error;
pub mod http;
pub mod recurrence;
pub mod source;

pub use cache::{FeedCache, DEFAULT_TTL};
pub use collect::{collect, load};
pub use decode::decode;
pub use error::FeedError;
pub use http::HttpClient;
pub use recurrence::parse_rrule;
pub use source::{FeedLocation, FeedSource};
