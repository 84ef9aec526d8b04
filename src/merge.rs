//! Cross-source merge into the published target file.
//!
//! Every cycle rebuilds the target from scratch out of whatever cache files
//! exist on disk. Lines are deduplicated across sources with first-seen-wins
//! ordering: configuration order between sources, file order within one.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::Config;
use crate::metrics::Metrics;
use crate::utils::format_count;

/// Rebuild the target file from every cache file currently on disk.
///
/// Sources without a cache file yet are skipped silently. The previous
/// target keeps serving until the final rename lands, so any failure here
/// leaves downstream consumers on the last good merge.
pub fn merge(config: &Config, metrics: &Metrics) -> Result<()> {
    metrics.reset_entry_counts(&config.sources);

    let target_dir = config
        .target_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let tmp = NamedTempFile::new_in(target_dir).with_context(|| {
        format!("Failed to create temp file in {}", target_dir.display())
    })?;
    let mut out = BufWriter::new(tmp.as_file());

    let mut seen: HashSet<String> = HashSet::new();

    for source in &config.sources {
        let cache_path = config.cache_path(source);
        let file = match File::open(&cache_path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{}: no cache file yet, skipping", source.name);
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to open cache file {}", cache_path.display())
                });
            }
        };

        for line in BufReader::new(file).lines() {
            let line = line.with_context(|| {
                format!("Failed to read cache file {}", cache_path.display())
            })?;

            metrics.inc_entries(&source.name);

            if seen.contains(&line) {
                continue;
            }
            out.write_all(line.as_bytes())?;
            out.write_all(b"\n")?;
            seen.insert(line);
        }
    }

    out.flush()?;
    drop(out);
    tmp.as_file().sync_all()?;
    tmp.persist(&config.target_file)
        .with_context(|| format!("Failed to publish {}", config.target_file.display()))?;

    metrics.set_merged_total(seen.len() as i64);
    info!("lists merged, {} unique entries", format_count(seen.len()));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Source;
    use crate::transform::OutputFormat;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir, names: &[&str]) -> Config {
        Config {
            listen_addr: None,
            target_file: dir.path().join("merged.txt"),
            temp_dir: dir.path().to_path_buf(),
            interval: Duration::from_secs(60),
            format: OutputFormat::NameOnly,
            sources: names
                .iter()
                .map(|name| Source {
                    name: name.to_string(),
                    url: format!("https://example.com/{name}").parse().unwrap(),
                })
                .collect(),
        }
    }

    fn read_target(config: &Config) -> String {
        fs::read_to_string(&config.target_file).unwrap()
    }

    #[test]
    fn test_merge_dedup_first_seen_wins() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, &["one", "two"]);
        fs::write(dir.path().join("one"), "a\nb\na\nc\n").unwrap();
        fs::write(dir.path().join("two"), "b\nd\n").unwrap();

        let metrics = Metrics::new().unwrap();
        merge(&config, &metrics).unwrap();

        assert_eq!(read_target(&config), "a\nb\nc\nd\n");
    }

    #[test]
    fn test_merge_counts_raw_and_unique_entries() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, &["one", "two"]);
        fs::write(dir.path().join("one"), "a\nb\na\nc\n").unwrap();
        fs::write(dir.path().join("two"), "b\nd\n").unwrap();

        let metrics = Metrics::new().unwrap();
        merge(&config, &metrics).unwrap();

        let exposition = metrics.encode().unwrap();
        assert!(exposition.contains("oustdom_list_entries{name=\"one\"} 4"));
        assert!(exposition.contains("oustdom_list_entries{name=\"two\"} 2"));
        assert!(exposition.contains("oustdom_merged_entries 4"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, &["one", "two"]);
        fs::write(dir.path().join("one"), "x\ny\n").unwrap();
        fs::write(dir.path().join("two"), "y\nz\n").unwrap();

        let metrics = Metrics::new().unwrap();
        merge(&config, &metrics).unwrap();
        let first = read_target(&config);
        merge(&config, &metrics).unwrap();
        let second = read_target(&config);

        assert_eq!(first, second);
    }

    #[test]
    fn test_merge_skips_missing_cache_files() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, &["absent", "present"]);
        fs::write(dir.path().join("present"), "a\n").unwrap();

        let metrics = Metrics::new().unwrap();
        merge(&config, &metrics).unwrap();

        assert_eq!(read_target(&config), "a\n");
    }

    #[test]
    fn test_merge_with_no_cache_files_publishes_empty_target() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, &["absent"]);

        let metrics = Metrics::new().unwrap();
        merge(&config, &metrics).unwrap();

        assert_eq!(read_target(&config), "");
    }

    #[test]
    fn test_merge_failure_preserves_previous_target() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, &["broken"]);
        fs::write(&config.target_file, "previous\n").unwrap();
        // A directory in place of the cache file makes the read fail after open
        fs::create_dir(dir.path().join("broken")).unwrap();

        let metrics = Metrics::new().unwrap();
        assert!(merge(&config, &metrics).is_err());

        assert_eq!(read_target(&config), "previous\n");
    }

    #[test]
    fn test_merge_resets_counters_each_cycle() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, &["one"]);
        fs::write(dir.path().join("one"), "a\nb\n").unwrap();

        let metrics = Metrics::new().unwrap();
        merge(&config, &metrics).unwrap();

        // Shrinking input must not leave stale counts behind
        fs::write(dir.path().join("one"), "a\n").unwrap();
        merge(&config, &metrics).unwrap();

        let exposition = metrics.encode().unwrap();
        assert!(exposition.contains("oustdom_list_entries{name=\"one\"} 1"));
        assert!(exposition.contains("oustdom_merged_entries 1"));
    }

    #[test]
    fn test_merge_overwrites_stale_target() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, &["one"]);
        fs::write(&config.target_file, "stale\ncontent\n").unwrap();
        fs::write(dir.path().join("one"), "fresh\n").unwrap();

        let metrics = Metrics::new().unwrap();
        merge(&config, &metrics).unwrap();

        assert_eq!(read_target(&config), "fresh\n");
    }
}
