//! Configuration management for oustdom.
//!
//! All configuration is read from environment variables once at startup.
//! Sources are declared one per variable: `OUSTDOM_LIST_<NAME>=<URL>`, where
//! the suffix becomes the source name, the cache file name and the metric
//! label.

use anyhow::{bail, Context, Result};
use reqwest::Url;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::transform::OutputFormat;

pub const ENV_LISTEN_ADDR: &str = "OUSTDOM_LISTEN_ADDR";
pub const ENV_TARGET_FILE: &str = "OUSTDOM_TARGET_FILE";
pub const ENV_TEMP_DIR: &str = "OUSTDOM_TEMP_DIR";
pub const ENV_INTERVAL: &str = "OUSTDOM_INTERVAL";
pub const ENV_FORMAT: &str = "OUSTDOM_FORMAT";
/// Prefix for source declarations, eg: OUSTDOM_LIST_spamhaus=https://...
pub const ENV_LIST_PREFIX: &str = "OUSTDOM_LIST_";

const DEFAULT_INTERVAL: Duration = Duration::from_secs(4 * 3600);

/// A single blocklist source.
///
/// The name doubles as the cache file name under the working directory and
/// as the metric label, so it must be unique.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub url: Url,
}

/// Process configuration, immutable after startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address for the metrics endpoint; unset disables it.
    pub listen_addr: Option<SocketAddr>,

    /// Path of the merged output file.
    pub target_file: PathBuf,

    /// Working directory holding per-source caches and validator tokens.
    pub temp_dir: PathBuf,

    /// Reload cycle period.
    pub interval: Duration,

    /// Rendering applied to normalized lines.
    pub format: OutputFormat,

    /// Sources in fetch/merge/priority order (sorted by name).
    pub sources: Vec<Source>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from an arbitrary key/value map.
    ///
    /// Tests inject maps here instead of mutating the process environment;
    /// any flat key/value store satisfies the same contract.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();
        let get = |key: &str| vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());

        // Empty values behave as unset, the way shells usually leave them
        let listen_addr = match get(ENV_LISTEN_ADDR) {
            Some(v) if !v.is_empty() => Some(
                v.parse::<SocketAddr>()
                    .with_context(|| format!("cannot parse {ENV_LISTEN_ADDR} {v:?}"))?,
            ),
            _ => None,
        };

        let target_file = match get(ENV_TARGET_FILE) {
            Some(v) if !v.is_empty() => PathBuf::from(v),
            _ => bail!("{ENV_TARGET_FILE} not set"),
        };

        let temp_dir = match get(ENV_TEMP_DIR) {
            Some(v) if !v.is_empty() => PathBuf::from(v),
            _ => std::env::temp_dir(),
        };

        let interval = match get(ENV_INTERVAL) {
            Some(v) if !v.is_empty() => {
                parse_interval(v).with_context(|| format!("cannot parse {ENV_INTERVAL}"))?
            }
            _ => DEFAULT_INTERVAL,
        };

        let format = match get(ENV_FORMAT) {
            Some(v) if !v.is_empty() => v
                .parse::<OutputFormat>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("cannot parse {ENV_FORMAT}"))?,
            _ => OutputFormat::default(),
        };

        let sources = collect_sources(&vars)?;

        Ok(Self {
            listen_addr,
            target_file,
            temp_dir,
            interval,
            format,
            sources,
        })
    }

    /// Cache file path for a source.
    pub fn cache_path(&self, source: &Source) -> PathBuf {
        self.temp_dir.join(&source.name)
    }

    /// Validator token path for a source.
    pub fn etag_path(&self, source: &Source) -> PathBuf {
        self.temp_dir.join(format!("{}.etag", source.name))
    }
}

/// Scan the key/value map for `OUSTDOM_LIST_*` source declarations.
///
/// The result is sorted by name: environments are unordered, and merge
/// priority follows this order, so sorting keeps precedence deterministic.
fn collect_sources(vars: &[(String, String)]) -> Result<Vec<Source>> {
    let mut sources = Vec::new();

    for (key, value) in vars {
        let Some(name) = key.strip_prefix(ENV_LIST_PREFIX) else {
            continue;
        };
        if name.is_empty() {
            bail!("source variable {key} has an empty name suffix");
        }

        let url = Url::parse(value)
            .with_context(|| format!("blocklist {name:?}: invalid url {value:?}"))?;

        sources.push(Source {
            name: name.to_string(),
            url,
        });
    }

    if sources.is_empty() {
        bail!("no blocklist configured, set {ENV_LIST_PREFIX}<NAME>");
    }

    sources.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(sources)
}

/// Parse an interval like "4h", "30m" or "1d": one integer, one unit suffix.
pub fn parse_interval(interval: &str) -> Result<Duration> {
    // Reject non-ASCII up front so split_at below stays on char boundaries
    if !interval.is_ascii() || interval.len() < 2 {
        bail!("invalid interval {interval:?}, use a form like 4h, 30m or 1d");
    }

    let (num_part, suffix) = interval.split_at(interval.len() - 1);
    let n: u64 = num_part
        .parse()
        .with_context(|| format!("invalid interval {interval:?}"))?;

    let seconds = match suffix {
        "s" => n,
        "m" => n * 60,
        "h" => n * 3600,
        "d" => n * 86_400,
        _ => bail!("invalid interval unit {suffix:?}, valid units: s, m, h, d"),
    };

    if seconds == 0 {
        bail!("interval must be greater than zero");
    }

    Ok(Duration::from_secs(seconds))
}
