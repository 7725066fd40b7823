//! JSONL audit log of CLI and hook decisions.
//!
//! Enabled by `AUTO_MEMORY_DEBUG` or by a `.auto-memory-debug` marker file
//! next to the memory root. Writes are best-effort.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;

pub const DEBUG_ENV: &str = "AUTO_MEMORY_DEBUG";
pub const DEBUG_MARKER: &str = ".auto-memory-debug";

/// One log line.
#[derive(Debug, Serialize)]
pub struct MemoryDebugLog {
    pub timestamp: DateTime<Utc>,
    /// Binary that produced the entry (e.g. "prune-memories")
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// e.g. "stored", "injected", "skip"
    pub decision: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl MemoryDebugLog {
    pub fn new(operation: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: operation.to_string(),
            session_id: None,
            decision: String::new(),
            reason: String::new(),
            context: None,
        }
    }

    pub fn with_session(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    pub fn with_decision(mut self, decision: &str, reason: &str) -> Self {
        self.decision = decision.to_string();
        self.reason = reason.to_string();
        self
    }

    /// Attach free-form context, truncated to 200 characters.
    pub fn with_context(mut self, context: &str) -> Self {
        self.context = Some(match context.char_indices().nth(200) {
            Some((cut, _)) => format!("{}...", &context[..cut]),
            None => context.to_string(),
        });
        self
    }

    /// Append the entry to the log for `memory_root`, if logging is enabled.
    pub fn write(&self, memory_root: &Utf8Path) -> std::io::Result<()> {
        if !is_debug_enabled(memory_root) {
            return Ok(());
        }

        let log_path = debug_log_path(memory_root);
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        let json = serde_json::to_string(self)?;
        writeln!(file, "{json}")?;
        Ok(())
    }

    /// Like [`write`](Self::write), logging failures instead of returning them.
    pub fn record(&self, memory_root: &Utf8Path) {
        if let Err(err) = self.write(memory_root) {
            log::debug!("debug log write failed: {err}");
        }
    }
}

fn base_dir(memory_root: &Utf8Path) -> &Utf8Path {
    memory_root.parent().unwrap_or(memory_root)
}

pub fn is_debug_enabled(memory_root: &Utf8Path) -> bool {
    std::env::var_os(DEBUG_ENV).is_some() || base_dir(memory_root).join(DEBUG_MARKER).exists()
}

/// `<root parent>/logs/memory-debug.jsonl`
pub fn debug_log_path(memory_root: &Utf8Path) -> Utf8PathBuf {
    base_dir(memory_root).join("logs").join("memory-debug.jsonl")
}

/// Record a decision, ignoring write failures.
pub fn log_decision(memory_root: &Utf8Path, operation: &str, decision: &str, reason: &str) {
    MemoryDebugLog::new(operation)
        .with_decision(decision, reason)
        .record(memory_root);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_debug_log_serialization() {
        let entry = MemoryDebugLog::new("warmstart-memories")
            .with_session("s-1")
            .with_decision("skip", "already injected");

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"operation\":\"warmstart-memories\""));
        assert!(json.contains("\"session_id\":\"s-1\""));
        assert!(!json.contains("\"context\""));
    }

    #[test]
    fn test_context_truncation() {
        let entry = MemoryDebugLog::new("store-memory").with_context(&"é".repeat(500));
        let context = entry.context.unwrap();
        assert_eq!(context.chars().count(), 203);
    }

    #[test]
    fn test_marker_enables_log() {
        let dir = tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let root = base.join("sessions");
        std::fs::write(base.join(DEBUG_MARKER), "").unwrap();

        MemoryDebugLog::new("prune-memories")
            .with_decision("pruned", "2 removed")
            .write(&root)
            .unwrap();

        let content = std::fs::read_to_string(debug_log_path(&root)).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("2 removed"));
    }

    #[test]
    fn test_record_swallows_write_failure() {
        let dir = tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let root = base.join("sessions");
        std::fs::write(base.join(DEBUG_MARKER), "").unwrap();
        // `logs` exists as a file, so the log directory cannot be created
        std::fs::write(base.join("logs"), "").unwrap();

        let entry = MemoryDebugLog::new("warmstart-memories").with_decision("skip", "none");
        assert!(entry.write(&root).is_err());
        entry.record(&root);
    }
}
