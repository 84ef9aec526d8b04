//! HTTP fetcher that refreshes per-source cache files.
//!
//! Each refresh is a conditional GET: the last strong `ETag` the upstream
//! sent is stored next to the cache file and replayed as `If-None-Match`,
//! so unchanged lists cost one round-trip and no bandwidth. New content is
//! streamed through the line transformer into a temp file and renamed over
//! the cache file only once the whole body has been consumed.

use anyhow::Context;
use futures::StreamExt;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::{Client, StatusCode};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::{Config, Source};
use crate::error::FetchError;
use crate::transform::StreamTransformer;
use crate::utils::format_bytes;

const TIMEOUT_SECS: u64 = 30;

/// Weak validators are never stored as preconditions.
const WEAK_VALIDATOR_PREFIX: &str = "W/";

/// Outcome of a successful refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// New content was downloaded and the cache file replaced.
    Updated,
    /// Upstream reported the cached content is still current.
    NotModified,
}

/// HTTP client for fetching lists.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Create a new fetcher with default settings.
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(format!("oustdom/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    /// Refresh one source's cache file.
    ///
    /// The existing cache file is replaced only by the final rename; every
    /// failure path leaves it and the validator token untouched.
    pub async fn refresh(
        &self,
        config: &Config,
        source: &Source,
    ) -> Result<FetchOutcome, FetchError> {
        let cache_path = config.cache_path(source);
        let etag_path = config.etag_path(source);

        let mut request = self.client.get(source.url.clone());
        if let Some(validator) = read_validator(&etag_path) {
            request = request.header(IF_NONE_MATCH, validator);
        }

        let response = request.send().await?;

        if response.status() == StatusCode::NOT_MODIFIED {
            debug!("{}: not modified", source.name);
            return Ok(FetchOutcome::NotModified);
        }
        if response.status().as_u16() >= 400 {
            return Err(FetchError::UpstreamStatus(response.status()));
        }

        // Capture the validator before the body stream consumes the response
        let validator = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let tmp = NamedTempFile::new_in(&config.temp_dir)?;
        let mut writer = BufWriter::new(tmp.as_file());
        let mut transformer = StreamTransformer::new(config.format);
        let mut bytes_read: u64 = 0;

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            bytes_read += chunk.len() as u64;
            transformer.push(&chunk, &mut writer)?;
        }
        transformer.finish(&mut writer)?;
        writer.flush()?;
        drop(writer);
        tmp.as_file().sync_all()?;

        tmp.persist(&cache_path)?;
        debug!(
            "{}: read {}, cache file replaced",
            source.name,
            format_bytes(bytes_read)
        );

        match validator {
            Some(tag) if !tag.starts_with(WEAK_VALIDATOR_PREFIX) => {
                write_validator(&config.temp_dir, &etag_path, &tag)?;
            }
            _ => {}
        }

        Ok(FetchOutcome::Updated)
    }
}

// Note: Default is intentionally not implemented for Fetcher
// because new() can fail and we want explicit error handling.

/// Read the stored validator token, if any. Absence is a normal state.
fn read_validator(path: &Path) -> Option<String> {
    let tag = fs::read_to_string(path).ok()?;
    let tag = tag.trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_string())
    }
}

/// Persist a validator token atomically, same temp-then-rename discipline
/// as the cache files it guards.
fn write_validator(dir: &Path, path: &Path, tag: &str) -> std::io::Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(tag.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validator_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ads.etag");

        assert_eq!(read_validator(&path), None);

        write_validator(dir.path(), &path, "\"abc123\"").unwrap();
        assert_eq!(read_validator(&path), Some("\"abc123\"".to_string()));

        write_validator(dir.path(), &path, "\"def456\"").unwrap();
        assert_eq!(read_validator(&path), Some("\"def456\"".to_string()));
    }

    #[test]
    fn test_validator_empty_file_is_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ads.etag");
        fs::write(&path, "  \n").unwrap();
        assert_eq!(read_validator(&path), None);
    }

    #[test]
    fn test_validator_is_trimmed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ads.etag");
        fs::write(&path, "\"abc\"\n").unwrap();
        assert_eq!(read_validator(&path), Some("\"abc\"".to_string()));
    }

    #[test]
    fn test_weak_validator_prefix() {
        assert!("W/\"abc\"".starts_with(WEAK_VALIDATOR_PREFIX));
        assert!(!"\"abc\"".starts_with(WEAK_VALIDATOR_PREFIX));
    }

    #[test]
    fn test_fetcher_new() {
        assert!(Fetcher::new().is_ok());
    }
}
