//! Observability gauges shared between the reload worker and the metrics
//! endpoint.
//!
//! One `Metrics` value is built at startup and passed to every component
//! that reports signals. The underlying prometheus gauges are atomic, so
//! the exposition endpoint reads concurrently while the single reload
//! worker writes.

use anyhow::Result;
use prometheus::{Encoder, GaugeVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::Source;

pub struct Metrics {
    registry: Registry,
    list_status: IntGaugeVec,
    list_reload_seconds: GaugeVec,
    list_last_fetch: IntGaugeVec,
    list_entries: IntGaugeVec,
    merged_entries: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let list_status = IntGaugeVec::new(
            Opts::new("oustdom_list_status", "1=Successful reload 0=Failure"),
            &["name"],
        )?;
        let list_reload_seconds = GaugeVec::new(
            Opts::new(
                "oustdom_list_reload_time_seconds",
                "Time taken by the last reload attempt of a list",
            ),
            &["name"],
        )?;
        let list_last_fetch = IntGaugeVec::new(
            Opts::new(
                "oustdom_list_last_fetch_unix",
                "Unix timestamp of the last fetch that returned new content",
            ),
            &["name"],
        )?;
        let list_entries = IntGaugeVec::new(
            Opts::new(
                "oustdom_list_entries",
                "Raw entries read from a list during the last merge",
            ),
            &["name"],
        )?;
        let merged_entries = IntGauge::new(
            "oustdom_merged_entries",
            "Deduplicated entries in the merged target file",
        )?;

        registry.register(Box::new(list_status.clone()))?;
        registry.register(Box::new(list_reload_seconds.clone()))?;
        registry.register(Box::new(list_last_fetch.clone()))?;
        registry.register(Box::new(list_entries.clone()))?;
        registry.register(Box::new(merged_entries.clone()))?;

        Ok(Self {
            registry,
            list_status,
            list_reload_seconds,
            list_last_fetch,
            list_entries,
            merged_entries,
        })
    }

    pub fn set_status(&self, name: &str, ok: bool) {
        self.list_status
            .with_label_values(&[name])
            .set(if ok { 1 } else { 0 });
    }

    pub fn observe_reload_time(&self, name: &str, seconds: f64) {
        self.list_reload_seconds
            .with_label_values(&[name])
            .set(seconds);
    }

    /// Record that a fetch just returned new content. Not-modified checks
    /// deliberately leave this untouched, see DESIGN.md.
    pub fn mark_fetched(&self, name: &str) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.list_last_fetch
            .with_label_values(&[name])
            .set(now as i64);
    }

    /// Zero the entry gauges before a merge cycle starts counting.
    pub fn reset_entry_counts(&self, sources: &[Source]) {
        for source in sources {
            self.list_entries
                .with_label_values(&[source.name.as_str()])
                .set(0);
        }
        self.merged_entries.set(0);
    }

    pub fn inc_entries(&self, name: &str) {
        self.list_entries.with_label_values(&[name]).inc();
    }

    pub fn set_merged_total(&self, total: i64) {
        self.merged_entries.set(total);
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}
