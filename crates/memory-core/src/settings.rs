//! Tunables and storage location.

use camino::Utf8PathBuf;

/// Environment variable overriding the memory root.
pub const MEMORY_PATH_ENV: &str = "AUTO_MEMORY_PATH";

/// Default location below the home directory.
const DEFAULT_RELATIVE_ROOT: &str = ".config/ai/auto-memory/sessions";

/// Retrieval and eviction defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySettings {
    /// Phase A similarity cutoff (exclusive)
    pub threshold: f64,
    /// Phase B blend between similarity (0.0) and utility (1.0)
    pub lambda: f64,
    /// Phase A result size
    pub candidate_k: usize,
    /// Phase B result size
    pub top_k: usize,
    /// Records older than this many days are evicted
    pub max_age_days: i64,
    /// Records below this utility are evicted
    pub min_utility: f64,
    /// Newest records kept per session
    pub per_session_limit: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            lambda: 0.5,
            candidate_k: 20,
            top_k: 5,
            max_age_days: 90,
            min_utility: 0.1,
            per_session_limit: 100,
        }
    }
}

/// Get default memory root.
///
/// Priority:
/// 1. AUTO_MEMORY_PATH environment variable (if set)
/// 2. ~/.config/ai/auto-memory/sessions
pub fn default_root() -> Utf8PathBuf {
    if let Ok(custom_path) = std::env::var(MEMORY_PATH_ENV) {
        if !custom_path.trim().is_empty() {
            return Utf8PathBuf::from(custom_path);
        }
    }

    dirs::home_dir()
        .and_then(|home| Utf8PathBuf::from_path_buf(home).ok())
        .map(|home| home.join(DEFAULT_RELATIVE_ROOT))
        .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_RELATIVE_ROOT))
}
