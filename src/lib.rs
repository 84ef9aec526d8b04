//! # oustdom - Blocklist Fetcher for DNS Filters
//!
//! A small daemon that periodically downloads domain blocklists, normalizes
//! each into a canonical line format, and publishes a single deduplicated
//! file for a downstream resolver filter (dnscrypt-proxy and friends).
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                       oustdom                          │
//! ├────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                            │
//! │    └── Commands: run, once, version                    │
//! ├────────────────────────────────────────────────────────┤
//! │  Config (environment variables)                        │
//! │    └── OUSTDOM_LIST_<NAME> source declarations         │
//! ├────────────────────────────────────────────────────────┤
//! │  Fetcher (reqwest + rustls)                            │
//! │    └── Conditional GET with ETag validators            │
//! ├────────────────────────────────────────────────────────┤
//! │  Transform / Merge                                     │
//! │    └── Normalized per-source caches, dedup into target │
//! ├────────────────────────────────────────────────────────┤
//! │  Metrics (prometheus + axum)                           │
//! │    └── Per-source status, timing, entry counts         │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Every published file (per-source cache, validator token, merged target)
//! is written to a temp file and renamed into place, so readers never see a
//! partial write and a crashed cycle leaves the previous state serving.
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Fetch error taxonomy
//! - [`fetcher`] - Conditional HTTP refresh of per-source caches
//! - [`lock`] - Working-directory locking
//! - [`merge`] - Cross-source dedup into the target file
//! - [`metrics`] - Observability gauges
//! - [`reload`] - One reload cycle (fetch all, merge once)
//! - [`server`] - Metrics exposition endpoint
//! - [`signal`] - Graceful shutdown signal handling
//! - [`transform`] - Line normalization
//! - [`utils`] - Formatting helpers and temp-file hygiene

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod lock;
pub mod merge;
pub mod metrics;
pub mod reload;
pub mod server;
pub mod signal;
pub mod transform;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::Config;
