//! Per-session state files for hooks.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::time::{Duration, SystemTime};

/// Manager for small JSON state files, one per key.
#[derive(Debug, Clone)]
pub struct StateManager {
    base_dir: Utf8PathBuf,
    prefix: String,
}

impl StateManager {
    /// State files under the system temp directory.
    pub fn new(prefix: impl Into<String>) -> Self {
        let temp = std::env::temp_dir();
        let base_dir = Utf8PathBuf::from_path_buf(temp).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"));
        Self::new_in(base_dir, prefix)
    }

    pub fn new_in(base_dir: impl Into<Utf8PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Path of the state file for `key`.
    pub fn state_path(&self, key: &str) -> Utf8PathBuf {
        self.base_dir.join(format!("{}-{}.json", self.prefix, key))
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.state_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read state file: {path}"))?;
        let state = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {path}"))?;
        Ok(Some(state))
    }

    pub fn save<T: Serialize>(&self, key: &str, state: &T) -> Result<()> {
        fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("Failed to create state directory: {}", self.base_dir))?;
        let path = self.state_path(key);
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content).with_context(|| format!("Failed to write state file: {path}"))?;
        Ok(())
    }

    /// True when no state file exists for `key` or it was last written more
    /// than `max_age` ago.
    pub fn is_stale(&self, key: &str, max_age: Duration) -> bool {
        let modified = fs::metadata(self.state_path(key)).and_then(|meta| meta.modified());
        match modified {
            Ok(modified) => {
                let age = SystemTime::now()
                    .duration_since(modified)
                    .unwrap_or(Duration::ZERO);
                age > max_age
            }
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct InjectedState {
        memory_ids: Vec<String>,
    }

    fn manager(dir: &tempfile::TempDir) -> StateManager {
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        StateManager::new_in(base, "warmstart")
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let manager = manager(&dir);

        let state = InjectedState {
            memory_ids: vec!["a".to_string(), "b".to_string()],
        };
        manager.save("session-1", &state).unwrap();

        let loaded: Option<InjectedState> = manager.load("session-1").unwrap();
        assert_eq!(loaded, Some(state));
        assert!(manager.state_path("session-1").ends_with("warmstart-session-1.json"));
    }

    #[test]
    fn test_load_missing() {
        let dir = tempdir().unwrap();
        let loaded: Option<InjectedState> = manager(&dir).load("nonexistent").unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn test_staleness() {
        let dir = tempdir().unwrap();
        let manager = manager(&dir);
        assert!(manager.is_stale("s", Duration::from_secs(3600)));

        manager.save("s", &InjectedState::default()).unwrap();
        assert!(!manager.is_stale("s", Duration::from_secs(3600)));
    }
}
