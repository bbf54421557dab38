//! `weekgrid` CLI — a weekly agenda over ICS calendar feeds.
//!
//! ## Usage
//!
//! ```sh
//! # Today and the next six days from two feeds, in the system zone
//! weekgrid agenda --feed work=webcal://cal.example.com/team.ics --feed ~/family.ics
//!
//! # Feeds, zone and window from ~/.config/weekgrid/config.toml
//! weekgrid agenda
//!
//! # A week back and two ahead, as JSON, with debug logs on stderr
//! weekgrid agenda --past 7 --future 14 --format json -vv
//!
//! # Materialize a local file over explicit dates (both inclusive)
//! weekgrid expand -i calendar.ics --from 2025-03-01 --to 2025-03-31 --tz Europe/Berlin
//! ```

mod config;
mod logging;
mod render;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{Days, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{ArgAction, Parser, Subcommand};
use feed_core::{FeedCache, FeedSource, HttpClient, DEFAULT_TTL};
use occurrence_engine::dst::local_midnight;
use occurrence_engine::{aggregate, Aggregation, EngineError, FeedStream, QueryWindow};

use crate::config::Config;
use crate::render::Format;

const DEFAULT_DAYS_PAST: u32 = 0;
const DEFAULT_DAYS_FUTURE: u32 = 6;

#[derive(Parser)]
#[command(name = "weekgrid", version, about = "Weekly agenda over ICS calendar feeds")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show occurrences from today - PAST through today + FUTURE
    Agenda {
        /// Feed as ID=LOCATION or LOCATION (https://, webcal://, or a file path).
        /// Repeatable; replaces the feeds from the config file.
        #[arg(long = "feed", value_name = "SRC")]
        feeds: Vec<String>,
        /// IANA zone the agenda is read in (default: config, then system zone)
        #[arg(long, value_name = "ZONE")]
        tz: Option<String>,
        /// Whole days before today
        #[arg(long, value_name = "N")]
        past: Option<u32>,
        /// Whole days after today
        #[arg(long, value_name = "N")]
        future: Option<u32>,
        #[arg(long, value_enum, default_value_t)]
        format: Format,
        /// Config file (default: <config_dir>/weekgrid/config.toml)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Directory for cached feed bodies
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,
        /// Minutes a cached feed is served without refetching
        #[arg(long, value_name = "N")]
        ttl_minutes: Option<u64>,
    },
    /// Materialize one local ICS file over explicit dates
    Expand {
        /// ICS file to read
        #[arg(short, long)]
        input: PathBuf,
        /// First day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
        /// IANA zone the days are read in (default: system zone)
        #[arg(long, value_name = "ZONE")]
        tz: Option<String>,
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Agenda {
            feeds,
            tz,
            past,
            future,
            format,
            config,
            cache_dir,
            ttl_minutes,
        } => {
            let config = Config::load(config.as_deref())?;
            let zone = resolve_zone(tz.as_deref().or(config.timezone.as_deref()))?;
            let window = QueryWindow::around(
                zone,
                Utc::now(),
                past.or(config.days_past).unwrap_or(DEFAULT_DAYS_PAST),
                future.or(config.days_future).unwrap_or(DEFAULT_DAYS_FUTURE),
            )?;

            let sources = feed_sources(&feeds, &config)?;
            let cache = FeedCache::new(
                cache_dir
                    .or(config.cache_dir.clone())
                    .unwrap_or_else(default_cache_dir),
                ttl_minutes
                    .or(config.cache_ttl_minutes)
                    .map_or(DEFAULT_TTL, |minutes| Duration::from_secs(minutes.saturating_mul(60))),
            );
            let client = HttpClient::new()?;

            tracing::info!(
                feeds = sources.len(),
                zone = zone.name(),
                from = %window.range_start,
                to = %window.range_end,
                "building agenda"
            );
            let aggregation = feed_core::collect(&sources, &client, &cache, &window)
                .await
                .context("No feed could be loaded")?;

            report_failures(&aggregation);
            print!("{}", render::render(&aggregation.occurrences, &window, format)?);
        }
        Commands::Expand {
            input,
            from,
            to,
            tz,
            format,
        } => {
            let zone = resolve_zone(tz.as_deref())?;
            let window = day_window(zone, from, to)?;

            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read file: {}", input.display()))?;
            let events = feed_core::decode(&raw, zone)
                .with_context(|| format!("Failed to decode {}", input.display()))?;

            let stream = FeedStream {
                source_id: file_id(&input),
                events,
            };
            let aggregation = aggregate(vec![Ok(stream)], &window)?;

            report_failures(&aggregation);
            print!("{}", render::render(&aggregation.occurrences, &window, format)?);
        }
    }

    Ok(())
}

/// Named zone, else the system zone, else UTC.
fn resolve_zone(name: Option<&str>) -> Result<Tz> {
    if let Some(name) = name {
        return Ok(name
            .parse::<Tz>()
            .map_err(|_| EngineError::InvalidTimezone(name.to_string()))?);
    }

    match iana_time_zone::get_timezone() {
        Ok(system) => match system.parse::<Tz>() {
            Ok(zone) => Ok(zone),
            Err(_) => {
                tracing::warn!(zone = %system, "system zone unknown, using UTC");
                Ok(chrono_tz::UTC)
            }
        },
        Err(err) => {
            tracing::warn!(error = %err, "could not determine system zone, using UTC");
            Ok(chrono_tz::UTC)
        }
    }
}

/// Local midnight of `from` through the last second of `to`.
fn day_window(zone: Tz, from: NaiveDate, to: NaiveDate) -> Result<QueryWindow> {
    if to < from {
        let message = format!("--to {} is before --from {}", to, from);
        return Err(EngineError::WindowComputation(message).into());
    }
    let after_last = to
        .checked_add_days(Days::new(1))
        .ok_or_else(|| EngineError::WindowComputation(format!("no day after {}", to)))?;
    Ok(QueryWindow::new(
        zone,
        local_midnight(zone, from),
        local_midnight(zone, after_last) - chrono::Duration::seconds(1),
    )?)
}

/// Feeds from the command line, or from the config file when none were given.
fn feed_sources(flags: &[String], config: &Config) -> Result<Vec<FeedSource>> {
    let sources = if flags.is_empty() {
        config
            .feeds
            .iter()
            .map(|feed| FeedSource::new(feed.id.clone(), &feed.url))
            .collect::<std::result::Result<Vec<_>, _>>()?
    } else {
        flags
            .iter()
            .map(|flag| FeedSource::parse(flag))
            .collect::<std::result::Result<Vec<_>, _>>()?
    };

    if sources.is_empty() {
        bail!("No feeds given. Pass --feed, or add [[feeds]] entries to the config file");
    }
    Ok(sources)
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("weekgrid")
}

fn file_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string())
}

fn report_failures(aggregation: &Aggregation) {
    for failure in &aggregation.failures {
        eprintln!("warning: feed '{}' skipped: {}", failure.source_id, failure.error);
    }
    if aggregation.skipped_events > 0 {
        eprintln!("warning: {} invalid event(s) skipped", aggregation.skipped_events);
    }
}
