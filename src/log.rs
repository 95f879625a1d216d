//! Ambient logging (§9 "Global logging"): process-wide diagnostics via
//! `log`/`env_logger`, plus the `KEEP_LOG` CSV summary line (§6
//! Environment). Deliberately kept separate from the core — the core
//! never imports this module, it only returns a [`crate::scheduler::RepartitionStats`]
//! that a caller (the CLI) may choose to log.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::scheduler::RepartitionStats;

/// Initialize the process-wide `env_logger` sink. Safe to call more than
/// once; only the first call has an effect.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
}

/// Append one CSV row — "seeks, peak memory (B), read time (s), write
/// time (s), elapsed time (s)" — to the file named by the `KEEP_LOG`
/// environment variable, if set. Creates the file (without a header row,
/// matching the original's bare-append behavior) on first use.
pub fn record(stats: &RepartitionStats) -> Result<()> {
    let Ok(path) = std::env::var("KEEP_LOG") else {
        return Ok(());
    };
    append_csv_row(Path::new(&path), stats)
}

fn append_csv_row(path: &Path, stats: &RepartitionStats) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open KEEP_LOG file {}", path.display()))?;
    writeln!(
        file,
        "{},{},{},{},{}",
        stats.seeks,
        stats.peak_mem,
        stats.read_time.as_secs_f64(),
        stats.write_time.as_secs_f64(),
        stats.elapsed().as_secs_f64(),
    )
    .with_context(|| format!("cannot write to KEEP_LOG file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn appends_one_row_per_call() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keep.csv");
        let stats = RepartitionStats {
            total_bytes: 16,
            seeks: 3,
            peak_mem: 8,
            read_time: Duration::from_millis(10),
            write_time: Duration::from_millis(5),
        };
        append_csv_row(&path, &stats).unwrap();
        append_csv_row(&path, &stats).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.lines().next().unwrap().starts_with("3,8,"));
    }
}
