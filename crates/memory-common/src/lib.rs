//! Shared plumbing for the memory binaries.
//!
//! - JSON input parsing from stdin
//! - Hook and CLI output on stdout
//! - Per-session state files
//! - JSONL debug log
//! - Logger setup

pub mod debug;
pub mod input;
pub mod output;
pub mod state;

pub use input::{ContextPayload, HookInput, StorePayload};
pub use output::{HookOutput, print_json};
pub use state::StateManager;

/// Initialise `env_logger` on stderr, driven by `RUST_LOG`.
pub fn init_logging() {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
}

/// Re-export commonly used types
pub mod prelude {
    pub use crate::debug::{MemoryDebugLog, log_decision};
    pub use crate::input::{HookInput, StorePayload};
    pub use crate::output::{HookOutput, print_json};
    pub use crate::state::StateManager;
    pub use anyhow::{Context, Result};
    pub use memory_core::{MemoryEngine, MemorySettings, RetrieveRequest, default_root};
}
