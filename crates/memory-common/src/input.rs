//! JSON input parsing from stdin.

use memory_core::MemoryContext;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Read};

/// Read stdin to the end and parse it as JSON.
pub fn read_stdin_json<T: DeserializeOwned>() -> anyhow::Result<T> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let parsed = serde_json::from_str(&input)?;
    Ok(parsed)
}

/// Memory submitted as JSON on stdin.
///
/// `{"intent": "...", "experience": "...", "utility": 0.7, "sessionId": "...", "context": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorePayload {
    #[serde(default)]
    pub intent: String,

    #[serde(default)]
    pub experience: String,

    #[serde(default = "default_utility")]
    pub utility: f64,

    #[serde(default)]
    pub session_id: Option<String>,

    #[serde(default)]
    pub context: Option<ContextPayload>,
}

fn default_utility() -> f64 {
    0.5
}

/// Context fields as submitted; any of them may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextPayload {
    #[serde(default)]
    pub file: Option<String>,

    #[serde(default)]
    pub file_type: Option<String>,

    #[serde(default)]
    pub change_type: Option<String>,

    #[serde(default)]
    pub project: Option<String>,
}

impl ContextPayload {
    /// Convert to a record context, filling a missing project with
    /// `default_project`. An entirely empty payload yields `None`.
    pub fn into_context(self, default_project: &str) -> Option<MemoryContext> {
        if self.file.is_none()
            && self.file_type.is_none()
            && self.change_type.is_none()
            && self.project.is_none()
        {
            return None;
        }
        Some(MemoryContext {
            file: self.file.unwrap_or_default(),
            file_type: self.file_type.unwrap_or_default(),
            change_type: self.change_type.unwrap_or_default(),
            project: self
                .project
                .unwrap_or_else(|| default_project.to_string()),
        })
    }
}

impl StorePayload {
    pub fn from_stdin() -> anyhow::Result<Self> {
        read_stdin_json()
    }
}

/// Session hook input received from the host on stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookInput {
    /// Session ID
    #[serde(default)]
    pub session_id: Option<String>,

    /// Hook event name (e.g. "SessionStart", "UserPromptSubmit")
    #[serde(default)]
    pub hook_event_name: Option<String>,

    /// User prompt (UserPromptSubmit)
    #[serde(default, alias = "user_prompt")]
    pub prompt: Option<String>,

    /// Working directory of the session
    #[serde(default)]
    pub cwd: Option<String>,

    /// Additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl HookInput {
    pub fn from_stdin() -> anyhow::Result<Self> {
        read_stdin_json()
    }

    /// The prompt text, if any non-blank prompt was sent.
    pub fn prompt_text(&self) -> Option<&str> {
        self.prompt.as_deref().filter(|p| !p.trim().is_empty())
    }

    /// Last path component of `cwd`, used as the project label.
    pub fn project_name(&self) -> Option<&str> {
        let cwd = self.cwd.as_deref()?.trim_end_matches(['/', '\\']);
        cwd.rsplit(['/', '\\']).next().filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_store_payload() {
        let json = r#"{"intent": "How to fix React state", "experience": "Use functional setState", "utility": 0.85}"#;
        let payload: StorePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.intent, "How to fix React state");
        assert_eq!(payload.utility, 0.85);
        assert!(payload.session_id.is_none());
        assert!(payload.context.is_none());
    }

    #[test]
    fn test_store_payload_defaults() {
        let payload: StorePayload = serde_json::from_str(r#"{"intent": "x"}"#).unwrap();
        assert_eq!(payload.utility, 0.5);
        assert_eq!(payload.experience, "");
    }

    #[test]
    fn test_context_payload_conversion() {
        let json = r#"{"intent": "i", "sessionId": "abc",
            "context": {"file": "src/test.tsx", "fileType": "typescript-react", "changeType": "Edit"}}"#;
        let payload: StorePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.session_id.as_deref(), Some("abc"));

        let context = payload.context.unwrap().into_context("my-project").unwrap();
        assert_eq!(context.file, "src/test.tsx");
        assert_eq!(context.file_type, "typescript-react");
        assert_eq!(context.change_type, "Edit");
        assert_eq!(context.project, "my-project");

        assert!(ContextPayload::default().into_context("p").is_none());
    }

    #[test]
    fn test_parse_hook_input() {
        let json = r#"{"session_id": "s-1", "hook_event_name": "UserPromptSubmit",
            "prompt": "fix the react state bug", "cwd": "/home/me/projects/webapp/"}"#;
        let input: HookInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.session_id.as_deref(), Some("s-1"));
        assert_eq!(input.prompt_text(), Some("fix the react state bug"));
        assert_eq!(input.project_name(), Some("webapp"));
    }

    #[test]
    fn test_hook_input_user_prompt_alias() {
        let json = r#"{"hook_event_name": "UserPromptSubmit", "user_prompt": "Hello"}"#;
        let input: HookInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.prompt_text(), Some("Hello"));
        assert_eq!(input.project_name(), None);
    }
}
