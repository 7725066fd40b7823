//! Store one intent/experience/utility memory.
//!
//! Either positional arguments or a JSON object on stdin (`--stdin`):
//!
//! ```text
//! store-memory <SESSION_ID> <INTENT> [EXPERIENCE] [UTILITY]
//! echo '{"intent": "...", "experience": "...", "utility": 0.85}' | store-memory --stdin
//! ```

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use memory_common::debug::MemoryDebugLog;
use memory_common::{ContextPayload, StorePayload, print_json};
use memory_core::{MemoryEngine, UNKNOWN_PROJECT, default_root};
use serde::Serialize;

/// Store a memory in the session-partitioned memory directory.
#[derive(Parser)]
#[command(name = "store-memory", version)]
struct Cli {
    /// Read the memory as a JSON object from stdin
    #[arg(long)]
    stdin: bool,
    /// Session id (default: $CLAUDE_SESSION_ID, then "unknown")
    session_id: Option<String>,
    /// What was being attempted
    intent: Option<String>,
    /// What was learned
    experience: Option<String>,
    /// How valuable the memory is, 0 to 1
    utility: Option<f64>,
    /// Source file the memory relates to
    #[arg(long)]
    file: Option<String>,
    /// Kind of the source file, e.g. "typescript-react"
    #[arg(long)]
    file_type: Option<String>,
    /// Kind of change, e.g. "Edit"
    #[arg(long)]
    change_type: Option<String>,
    /// Project label (default: $CLAUDE_PROJECT_NAME, then "unknown")
    #[arg(long)]
    project: Option<String>,
    /// Memory root directory (default: $AUTO_MEMORY_PATH or ~/.config/ai/auto-memory/sessions)
    #[arg(long)]
    root: Option<Utf8PathBuf>,
}

#[derive(Serialize)]
struct StoreReceipt<'a> {
    success: bool,
    memory_id: &'a str,
    utility: f64,
    stored_at: &'a str,
}

fn main() -> Result<()> {
    memory_common::init_logging();
    let cli = Cli::parse();

    let root = cli.root.clone().unwrap_or_else(default_root);
    let payload = if cli.stdin {
        StorePayload::from_stdin().context("Error reading JSON from stdin")?
    } else {
        payload_from_args(cli)
    };

    let session_id = payload
        .session_id
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| env_or_unknown("CLAUDE_SESSION_ID"));
    let context = payload
        .context
        .and_then(|c| c.into_context(&env_or_unknown("CLAUDE_PROJECT_NAME")));

    let engine = MemoryEngine::new(root.clone());
    let stored = engine
        .store(
            &payload.intent,
            &payload.experience,
            payload.utility,
            &session_id,
            context,
        )
        .context("Error storing memory")?;

    MemoryDebugLog::new("store-memory")
        .with_session(&session_id)
        .with_decision("stored", &stored.record.id)
        .with_context(&stored.record.intent)
        .record(&root);

    print_json(&StoreReceipt {
        success: true,
        memory_id: &stored.record.id,
        utility: stored.record.utility.value(),
        stored_at: stored.path.as_str(),
    })
}

fn payload_from_args(cli: Cli) -> StorePayload {
    let context = ContextPayload {
        file: cli.file,
        file_type: cli.file_type,
        change_type: cli.change_type,
        project: cli.project,
    };
    StorePayload {
        intent: cli.intent.unwrap_or_default(),
        experience: cli.experience.unwrap_or_default(),
        utility: cli.utility.unwrap_or(0.5),
        session_id: cli.session_id,
        context: Some(context),
    }
}

fn env_or_unknown(key: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| UNKNOWN_PROJECT.to_string())
}
