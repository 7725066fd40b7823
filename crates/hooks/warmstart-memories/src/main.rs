//! UserPromptSubmit hook: inject the most useful past memories.
//!
//! Runs a two-phase retrieval with the user's prompt as the query and the
//! working directory name as project context, then hands the hits back as
//! additional context. Injection happens once per session.

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use memory_common::prelude::*;
use memory_core::{RankedMemory, validate_session_id};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const STATE_PREFIX: &str = "auto-memory-warmstart";
const STATE_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Serialize, Deserialize)]
struct WarmstartState {
    injected_at: DateTime<Utc>,
    memory_ids: Vec<String>,
}

fn main() -> Result<()> {
    memory_common::init_logging();
    let input = HookInput::from_stdin()?;
    let state = StateManager::new(STATE_PREFIX);

    if let Some(output) = warmstart(&input, &default_root(), &state)? {
        output.write_stdout()?;
    }
    Ok(())
}

/// Hook output for `input`, or `None` when nothing should be injected.
///
/// The per-session state file and the debug log are best-effort: failing to
/// write either never suppresses the output.
fn warmstart(
    input: &HookInput,
    root: &Utf8Path,
    state: &StateManager,
) -> Result<Option<HookOutput>> {
    let session_id = input
        .session_id
        .clone()
        .or_else(|| std::env::var("CLAUDE_SESSION_ID").ok())
        .filter(|id| validate_session_id(id).is_ok());

    if let Some(session_id) = &session_id {
        if !state.is_stale(session_id, STATE_MAX_AGE) {
            if let Ok(Some(previous)) = state.load::<WarmstartState>(session_id) {
                debug!(
                    "{} memories already injected for session {} at {}",
                    previous.memory_ids.len(),
                    session_id,
                    previous.injected_at
                );
            }
            return Ok(None);
        }
    }

    let Some(prompt) = input.prompt_text() else {
        return Ok(None);
    };

    let mut request = RetrieveRequest::new(prompt);
    if let Some(project) = input.project_name() {
        request = request.with_project(project);
    }
    let ranked = MemoryEngine::new(root.to_path_buf()).retrieve(&request)?;

    let mut entry = MemoryDebugLog::new("warmstart-memories");
    if let Some(session_id) = &session_id {
        entry = entry.with_session(session_id);
    }
    if ranked.is_empty() {
        entry
            .with_decision("skip", "no relevant memories")
            .record(root);
        return Ok(None);
    }

    if let Some(session_id) = &session_id {
        let injected = WarmstartState {
            injected_at: Utc::now(),
            memory_ids: ranked.iter().map(|r| r.record.id.clone()).collect(),
        };
        if let Err(err) = state.save(session_id, &injected) {
            warn!("could not record warm start for session {session_id}: {err:#}");
        }
    }
    entry
        .with_decision("injected", &format!("{} memories", ranked.len()))
        .with_context(prompt)
        .record(root);

    let event = input
        .hook_event_name
        .as_deref()
        .unwrap_or("UserPromptSubmit");
    Ok(Some(
        HookOutput::for_event(event).with_context(format_context(&ranked)),
    ))
}

fn format_context(memories: &[RankedMemory]) -> String {
    let mut lines = vec![
        "## Relevant memories from past sessions".to_string(),
        String::new(),
    ];
    for memory in memories {
        lines.push(format!(
            "- **{}** (utility {:.2}, score {:.2})",
            memory.record.intent,
            memory.record.utility.value(),
            memory.final_score
        ));
        lines.push(format!("  {}", memory.record.experience));
    }
    lines.join("\n")
}
