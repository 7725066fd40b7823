//! Health check of the memory directory.
//!
//! Prints a JSON status and exits 0 when the memory root exists and is
//! writable, 1 otherwise.

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::debug;
use memory_common::print_json;
use memory_core::{RecordStore, default_root};
use serde::Serialize;
use std::fs;

const WRITE_TEST_FILE: &str = ".write_test";

/// Check that the memory store is usable.
#[derive(Parser)]
#[command(name = "memory-health", version)]
struct Cli {
    /// Memory root directory (default: $AUTO_MEMORY_PATH or ~/.config/ai/auto-memory/sessions)
    #[arg(long)]
    root: Option<Utf8PathBuf>,
}

#[derive(Debug, Serialize)]
struct MemoryDirStatus {
    path: String,
    exists: bool,
    writable: bool,
    /// Free bytes on the root's filesystem
    #[serde(skip_serializing_if = "Option::is_none")]
    available_bytes: Option<u64>,
}

#[derive(Debug, Serialize)]
struct HealthReport {
    healthy: bool,
    memory_dir: MemoryDirStatus,
    records: usize,
    sessions: usize,
    malformed: usize,
}

fn main() -> Result<()> {
    memory_common::init_logging();
    let cli = Cli::parse();

    let report = check(&cli.root.unwrap_or_else(default_root));
    print_json(&report)?;
    if !report.healthy {
        std::process::exit(1);
    }
    Ok(())
}

fn check(root: &Utf8Path) -> HealthReport {
    let memory_dir = check_memory_dir(root);
    let stats = RecordStore::new(root).stats();
    HealthReport {
        healthy: memory_dir.exists && memory_dir.writable,
        memory_dir,
        records: stats.records,
        sessions: stats.sessions,
        malformed: stats.malformed,
    }
}

fn check_memory_dir(root: &Utf8Path) -> MemoryDirStatus {
    let exists = root.is_dir();
    let writable = exists && check_writable(root);
    let available_bytes = if exists {
        fs2::available_space(root)
            .inspect_err(|e| debug!("could not query free space for {root}: {e}"))
            .ok()
    } else {
        None
    };

    MemoryDirStatus {
        path: root.to_string(),
        exists,
        writable,
        available_bytes,
    }
}

/// Write then remove a scratch file.
fn check_writable(root: &Utf8Path) -> bool {
    let scratch = root.join(WRITE_TEST_FILE);
    match fs::write(&scratch, "test").and_then(|()| fs::remove_file(&scratch)) {
        Ok(()) => true,
        Err(e) => {
            debug!("write test failed in {root}: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn utf8(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_healthy_empty_root() {
        let dir = tempdir().unwrap();
        let report = check(&utf8(&dir));
        assert!(report.healthy);
        assert!(report.memory_dir.available_bytes.is_some());
        assert_eq!(report.records, 0);
        assert!(!utf8(&dir).join(WRITE_TEST_FILE).exists());
    }

    #[test]
    fn test_missing_root_is_unhealthy() {
        let dir = tempdir().unwrap();
        let report = check(&utf8(&dir).join("absent"));
        assert!(!report.healthy);
        assert!(!report.memory_dir.exists);
        assert!(!report.memory_dir.writable);
        assert_eq!(report.memory_dir.available_bytes, None);
    }

    #[test]
    fn test_counts_records_and_malformed() {
        let dir = tempdir().unwrap();
        let root = utf8(&dir);
        let store = RecordStore::new(root.clone());
        let record =
            memory_core::MemoryRecord::create("intent", "experience", 0.5, "s1", None).unwrap();
        store.save(&record).unwrap();
        fs::write(root.join("s1").join("broken.json"), "{").unwrap();

        let report = check(&root);
        assert_eq!(report.records, 1);
        assert_eq!(report.sessions, 1);
        assert_eq!(report.malformed, 1);
    }
}
