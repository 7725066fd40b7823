//! Memory schema - intent / experience / utility triplets.

use crate::error::{MemoryError, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use uuid::Uuid;

/// Stored when a record is created without an experience text.
pub const DEFAULT_EXPERIENCE: &str = "No experience description provided";

/// Project label for records without context.
pub const UNKNOWN_PROJECT: &str = "unknown";

/// Session ids and record ids become directory and file names.
static PATH_COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+$").expect("path component pattern is valid")
});

/// Learned value of a memory, always within `[0.0, 1.0]`.
///
/// Deserialization goes through [`Utility::new`], so a stored unit with an
/// out-of-range utility fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Utility(f64);

impl Utility {
    pub fn new(value: f64) -> Result<Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(MemoryError::Validation(format!(
                "utility must be between 0 and 1, got {value}"
            )))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Utility {
    type Error = MemoryError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Utility> for f64 {
    fn from(utility: Utility) -> Self {
        utility.0
    }
}

impl fmt::Display for Utility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Where a memory came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryContext {
    /// File being worked on
    #[serde(default)]
    pub file: String,

    /// Kind of file (e.g. "typescript-react")
    #[serde(default)]
    pub file_type: String,

    /// Kind of change (e.g. "Edit")
    #[serde(default)]
    pub change_type: String,

    /// Project label
    #[serde(default = "default_project")]
    pub project: String,
}

impl Default for MemoryContext {
    fn default() -> Self {
        Self {
            file: String::new(),
            file_type: String::new(),
            change_type: String::new(),
            project: default_project(),
        }
    }
}

fn default_project() -> String {
    UNKNOWN_PROJECT.to_string()
}

fn default_experience() -> String {
    DEFAULT_EXPERIENCE.to_string()
}

fn default_session() -> String {
    "unknown".to_string()
}

/// A persisted memory record.
///
/// Field names on disk are camelCase:
/// `id, intent, experience, utility, sessionId, timestamp, embedding[, context]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    /// Unique identifier, never reused
    pub id: String,

    /// What was being attempted
    pub intent: String,

    /// Outcome or lesson
    #[serde(default = "default_experience")]
    pub experience: String,

    /// Learned value
    pub utility: Utility,

    /// Owning session, also the storage partition
    #[serde(default = "default_session")]
    pub session_id: String,

    /// Creation time (ISO 8601, UTC). Kept verbatim so an unparsable value
    /// can still be loaded and aged out.
    #[serde(default)]
    pub timestamp: String,

    /// Reserved for semantic embeddings; always null today
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,

    /// Optional origin information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<MemoryContext>,
}

impl MemoryRecord {
    /// Create a new record with a fresh id and the current UTC time.
    ///
    /// Rejects out-of-range utility, an empty intent and session ids that
    /// cannot be used as a directory name. An empty experience is replaced
    /// by [`DEFAULT_EXPERIENCE`].
    pub fn create(
        intent: &str,
        experience: &str,
        utility: f64,
        session_id: &str,
        context: Option<MemoryContext>,
    ) -> Result<Self> {
        let utility = Utility::new(utility)?;

        let intent = intent.trim();
        if intent.is_empty() {
            return Err(MemoryError::Validation("intent is required".to_string()));
        }

        validate_session_id(session_id)?;

        let experience = match experience.trim() {
            "" => DEFAULT_EXPERIENCE,
            trimmed => trimmed,
        };

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            intent: intent.to_string(),
            experience: experience.to_string(),
            utility,
            session_id: session_id.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            embedding: None,
            context,
        })
    }

    /// Parsed creation time; `None` when the stored timestamp is unparsable.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    /// Age in whole days relative to `now`; `None` when the timestamp is
    /// unparsable (callers treat that as maximally old).
    pub fn age_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.created_at()
            .map(|created| now.signed_duration_since(created).num_days())
    }

    /// Project label from context, defaulting to "unknown".
    pub fn project(&self) -> &str {
        match &self.context {
            Some(context) if !context.project.is_empty() => &context.project,
            _ => UNKNOWN_PROJECT,
        }
    }
}

/// Check that a session id is usable as a partition directory name.
pub fn validate_session_id(session_id: &str) -> Result<()> {
    validate_path_component("session id", session_id)
}

/// Check that a record id is usable as a file stem.
pub(crate) fn validate_record_id(id: &str) -> Result<()> {
    validate_path_component("record id", id)
}

fn validate_path_component(kind: &str, value: &str) -> Result<()> {
    if value == "." || value == ".." || !PATH_COMPONENT.is_match(value) {
        return Err(MemoryError::Validation(format!("invalid {kind}: {value:?}")));
    }
    Ok(())
}

/// Parse an ISO 8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_memory_record_creation() {
        let record = MemoryRecord::create(
            "  Fix React state  ",
            " Use functional setState ",
            0.7,
            "session-1",
            None,
        )
        .unwrap();

        assert_eq!(record.intent, "Fix React state");
        assert_eq!(record.experience, "Use functional setState");
        assert_eq!(record.utility.value(), 0.7);
        assert_eq!(record.session_id, "session-1");
        assert!(record.embedding.is_none());
        assert!(record.created_at().is_some());
    }

    #[test]
    fn test_empty_experience_gets_placeholder() {
        let record = MemoryRecord::create("intent", "   ", 0.5, "s", None).unwrap();
        assert_eq!(record.experience, DEFAULT_EXPERIENCE);
    }

    #[test]
    fn test_utility_bounds() {
        for utility in [0.0, 0.5, 1.0] {
            let record = MemoryRecord::create("test", "test", utility, "s", None).unwrap();
            assert_eq!(record.utility.value(), utility);
        }

        for utility in [-0.1, 1.1, f64::NAN, f64::INFINITY] {
            let err = MemoryRecord::create("test", "test", utility, "s", None).unwrap_err();
            assert!(err.is_validation(), "utility {utility} should be rejected");
        }
    }

    #[test]
    fn test_empty_intent_rejected() {
        let err = MemoryRecord::create("  ", "experience", 0.5, "s", None).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_session_id_validation() {
        assert!(validate_session_id("abc-123_x.y").is_ok());
        for bad in ["", ".", "..", "a/b", "a\\b", "with space"] {
            assert!(validate_session_id(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let a = MemoryRecord::create("same", "same", 0.7, "s", None).unwrap();
        let b = MemoryRecord::create("same", "same", 0.7, "s", None).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_serialization() {
        let record = MemoryRecord::create("Test", "Exp", 0.5, "s", None).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"sessionId\":\"s\""));
        assert!(json.contains("\"embedding\":null"));
        assert!(json.contains("\"utility\":0.5"));
        assert!(!json.contains("context"));

        let context = MemoryContext {
            file: "src/test.tsx".to_string(),
            file_type: "typescript-react".to_string(),
            change_type: "Edit".to_string(),
            project: "test-project".to_string(),
        };
        let record = MemoryRecord::create("Test", "Exp", 0.5, "s", Some(context)).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"fileType\":\"typescript-react\""));
        assert!(json.contains("\"changeType\":\"Edit\""));
        assert_eq!(record.project(), "test-project");
    }

    #[test]
    fn test_out_of_range_utility_fails_to_parse() {
        let json = r#"{"id":"x","intent":"i","experience":"e","utility":1.5,
            "sessionId":"s","timestamp":"2025-01-01T00:00:00+00:00","embedding":null}"#;
        assert!(serde_json::from_str::<MemoryRecord>(json).is_err());
    }

    #[test]
    fn test_timestamp_parsing() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_timestamp("2025-01-02T03:04:05Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-02T03:04:05+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-02T03:04:05"), Some(expected));
        assert!(parse_timestamp("2025-01-02T03:04:05.123456+00:00").is_some());
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_age_days() {
        let now = Utc::now();
        let mut record = MemoryRecord::create("i", "e", 0.5, "s", None).unwrap();
        record.timestamp = (now - Duration::days(10) - Duration::hours(3)).to_rfc3339();
        assert_eq!(record.age_days(now), Some(10));

        record.timestamp = "not a date".to_string();
        assert_eq!(record.age_days(now), None);
    }

    #[test]
    fn test_project_defaults_to_unknown() {
        let mut record = MemoryRecord::create("i", "e", 0.5, "s", None).unwrap();
        assert_eq!(record.project(), UNKNOWN_PROJECT);

        record.context = Some(MemoryContext {
            project: String::new(),
            ..MemoryContext::default()
        });
        assert_eq!(record.project(), UNKNOWN_PROJECT);
    }
}
