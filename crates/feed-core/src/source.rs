//! Feed locations.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::error::{FeedError, Result};

/// Where a feed's ICS bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedLocation {
    /// An `http(s)` URL. `webcal://` URLs are rewritten to `https://`.
    Remote(Url),
    File(PathBuf),
}

impl FromStr for FeedLocation {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FeedError::InvalidSource(s.to_string()));
        }

        let Some((scheme, rest)) = s.split_once("://") else {
            return Ok(FeedLocation::File(PathBuf::from(s)));
        };

        let normalized = match scheme.to_ascii_lowercase().as_str() {
            "http" | "https" => s.to_string(),
            "webcal" | "webcals" => format!("https://{}", rest),
            "file" => {
                let url = Url::parse(s).map_err(|_| FeedError::InvalidSource(s.to_string()))?;
                let path = url
                    .to_file_path()
                    .map_err(|()| FeedError::InvalidSource(s.to_string()))?;
                return Ok(FeedLocation::File(path));
            }
            _ => return Err(FeedError::InvalidSource(s.to_string())),
        };

        Url::parse(&normalized)
            .map(FeedLocation::Remote)
            .map_err(|e| FeedError::InvalidSource(format!("{}: {}", s, e)))
    }
}

impl fmt::Display for FeedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedLocation::Remote(url) => write!(f, "{}", url),
            FeedLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A named feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    /// Opaque identifier stamped on every occurrence from this feed.
    pub id: String,
    pub location: FeedLocation,
}

impl FeedSource {
    /// # Errors
    /// Returns `FeedError::InvalidSource` when `location` is not a supported URL.
    pub fn new(id: impl Into<String>, location: &str) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            location: location.parse()?,
        })
    }

    /// Parse `ID=LOCATION`, or a bare location whose id is derived from it (the URL
    /// host, or the file stem).
    ///
    /// # Errors
    /// Returns `FeedError::InvalidSource` when the location is not supported.
    pub fn parse(arg: &str) -> Result<Self> {
        if let Some((id, location)) = arg.split_once('=') {
            // A bare URL can contain '=' in its query, so only treat the prefix as an
            // id when it looks like one.
            if !id.is_empty() && !id.contains([':', '/', '\\', '?']) {
                return Self::new(id.trim(), location);
            }
        }

        let location: FeedLocation = arg.parse()?;
        let id = match &location {
            FeedLocation::Remote(url) => url.host_str().unwrap_or("remote").to_string(),
            FeedLocation::File(path) => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "file".to_string()),
        };
        Ok(Self { id, location })
    }
}
