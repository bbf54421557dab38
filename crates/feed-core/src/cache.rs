//! On-disk cache of remote feed bodies.
//!
//! One file per URL, named by the BLAKE3 digest of the URL. A file modified within
//! the TTL is served without touching the network. When a refresh fails, the last
//! cached body is served instead, however old.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use url::Url;

use crate::error::Result;
use crate::http::HttpClient;

/// How long a cached body is served without revalidation.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
pub struct FeedCache {
    dir: PathBuf,
    ttl: Duration,
}

impl FeedCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    /// Cache file for `url`.
    pub fn path_for(&self, url: &Url) -> PathBuf {
        let digest = blake3::hash(url.as_str().as_bytes());
        self.dir.join(format!("{}.ics", hex::encode(digest.as_bytes())))
    }

    /// Body for `url`, from disk when fresh, else from the network.
    ///
    /// # Errors
    /// Returns `FeedError::Fetch` when the download failed and nothing is cached.
    pub async fn fetch(&self, client: &HttpClient, url: &Url) -> Result<String> {
        let path = self.path_for(url);

        if self.is_fresh(&path).await {
            if let Ok(body) = tokio::fs::read_to_string(&path).await {
                tracing::debug!(%url, path = %path.display(), "serving feed from cache");
                return Ok(body);
            }
        }

        match client.get_text(url).await {
            Ok(body) => {
                if let Err(err) = self.store(&path, &body).await {
                    tracing::warn!(%url, path = %path.display(), error = %err, "could not write feed cache");
                }
                Ok(body)
            }
            Err(err) => match tokio::fs::read_to_string(&path).await {
                Ok(stale) => {
                    tracing::warn!(%url, error = %err, "feed refresh failed, serving stale cache");
                    Ok(stale)
                }
                Err(_) => Err(err),
            },
        }
    }

    async fn is_fresh(&self, path: &Path) -> bool {
        let Ok(metadata) = tokio::fs::metadata(path).await else {
            return false;
        };
        metadata
            .modified()
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age < self.ttl)
    }

    async fn store(&self, path: &Path, body: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let partial = path.with_extension("ics.part");
        tokio::fs::write(&partial, body).await?;
        tokio::fs::rename(&partial, path).await?;
        Ok(())
    }
}
