//! Eviction of old, low-utility and over-capacity memories.
//!
//! Removal is decided over one snapshot of the whole store. The capacity rule
//! groups records by session first, so which records fall past the limit
//! never depends on enumeration order.

use crate::error::{MemoryError, Result};
use crate::settings::MemorySettings;
use crate::storage::{RecordStore, StoredRecord};
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Why a record is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneReason {
    /// Older than `max_age_days`, or timestamp unparsable
    TooOld,
    /// Utility below `min_utility`
    LowUtility,
    /// Beyond the newest `per_session_limit` records of its session
    SessionLimit,
}

/// Eviction thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrunePolicy {
    pub max_age_days: i64,
    pub min_utility: f64,
    pub per_session_limit: usize,
}

impl Default for PrunePolicy {
    fn default() -> Self {
        Self::from(&MemorySettings::default())
    }
}

impl From<&MemorySettings> for PrunePolicy {
    fn from(settings: &MemorySettings) -> Self {
        Self {
            max_age_days: settings.max_age_days,
            min_utility: settings.min_utility,
            per_session_limit: settings.per_session_limit,
        }
    }
}

impl PrunePolicy {
    pub fn validate(&self) -> Result<()> {
        if self.max_age_days < 0 {
            return Err(MemoryError::Validation(format!(
                "max age must not be negative, got {}",
                self.max_age_days
            )));
        }
        if !(0.0..=1.0).contains(&self.min_utility) {
            return Err(MemoryError::Validation(format!(
                "min utility must be between 0 and 1, got {}",
                self.min_utility
            )));
        }
        Ok(())
    }
}

/// One record selected for removal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovalCandidate {
    pub id: String,
    pub reasons: Vec<PruneReason>,
    /// `None` when the timestamp is unparsable
    pub age_days: Option<i64>,
    pub utility: f64,
}

/// Per-session view of a prune.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionPruneDetail {
    /// Records in the session before pruning
    pub total: usize,
    /// Newest first
    pub to_remove: Vec<RemovalCandidate>,
}

/// Outcome of a prune run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PruneReport {
    pub dry_run: bool,
    pub total_memories_before: usize,
    /// Marked records in a dry run, deleted records otherwise
    pub removed_memories: usize,
    /// Marked records whose deletion failed (always 0 in a dry run)
    pub failed: usize,
    pub sessions_cleaned: usize,
    pub session_details: BTreeMap<String, SessionPruneDetail>,
}

/// Removal decisions computed from a snapshot of the store.
#[derive(Debug, Clone)]
pub struct PrunePlan {
    total: usize,
    sessions: BTreeMap<String, SessionPruneDetail>,
    marked: Vec<StoredRecord>,
}

impl PrunePlan {
    /// Decide removals for `records` as of `now`.
    pub fn build(records: Vec<StoredRecord>, policy: &PrunePolicy, now: DateTime<Utc>) -> Self {
        let total = records.len();
        let created: Vec<Option<DateTime<Utc>>> =
            records.iter().map(|r| r.record.created_at()).collect();

        // First pass: complete per-session membership, newest first.
        let mut by_session: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (index, stored) in records.iter().enumerate() {
            by_session
                .entry(stored.record.session_id.as_str())
                .or_default()
                .push(index);
        }
        for indices in by_session.values_mut() {
            indices.sort_by(|&a, &b| {
                created[b]
                    .cmp(&created[a])
                    .then_with(|| records[a].record.id.cmp(&records[b].record.id))
            });
        }

        // Second pass: apply all three rules.
        let mut sessions = BTreeMap::new();
        let mut marked_indices = Vec::new();
        for (session_id, indices) in &by_session {
            let mut detail = SessionPruneDetail {
                total: indices.len(),
                to_remove: Vec::new(),
            };

            for (position, &index) in indices.iter().enumerate() {
                let record = &records[index].record;
                let age_days = created[index].map(|t| now.signed_duration_since(t).num_days());

                let mut reasons = Vec::new();
                if age_days.is_none_or(|age| age > policy.max_age_days) {
                    reasons.push(PruneReason::TooOld);
                }
                if record.utility.value() < policy.min_utility {
                    reasons.push(PruneReason::LowUtility);
                }
                if position >= policy.per_session_limit {
                    reasons.push(PruneReason::SessionLimit);
                }

                if !reasons.is_empty() {
                    detail.to_remove.push(RemovalCandidate {
                        id: record.id.clone(),
                        reasons,
                        age_days,
                        utility: record.utility.value(),
                    });
                    marked_indices.push(index);
                }
            }

            sessions.insert(session_id.to_string(), detail);
        }

        let marked_set: BTreeSet<usize> = marked_indices.into_iter().collect();
        let marked = records
            .into_iter()
            .enumerate()
            .filter(|(index, _)| marked_set.contains(index))
            .map(|(_, stored)| stored)
            .collect();

        Self {
            total,
            sessions,
            marked,
        }
    }

    /// Records selected for removal, in store order.
    pub fn marked(&self) -> &[StoredRecord] {
        &self.marked
    }

    /// Report what would be removed without touching storage.
    pub fn dry_run_report(self) -> PruneReport {
        let sessions_cleaned = self
            .sessions
            .values()
            .filter(|detail| !detail.to_remove.is_empty())
            .count();

        PruneReport {
            dry_run: true,
            total_memories_before: self.total,
            removed_memories: self.marked.len(),
            failed: 0,
            sessions_cleaned,
            session_details: self.sessions,
        }
    }

    /// Delete every marked record. Individual failures are counted, not fatal.
    pub fn execute(self, store: &RecordStore) -> PruneReport {
        let mut removed = 0;
        let mut failed = 0;
        let mut cleaned = BTreeSet::new();

        for stored in &self.marked {
            match store.delete(stored) {
                Ok(()) => {
                    removed += 1;
                    cleaned.insert(stored.record.session_id.as_str());
                }
                Err(_) => failed += 1,
            }
        }

        let sessions_cleaned = cleaned.len();
        info!(
            "memory pruning complete (before={}, removed={}, failed={}, sessions_cleaned={})",
            self.total, removed, failed, sessions_cleaned
        );

        PruneReport {
            dry_run: false,
            total_memories_before: self.total,
            removed_memories: removed,
            failed,
            sessions_cleaned,
            session_details: self.sessions,
        }
    }
}

/// Scan `store` and prune it under `policy`.
pub fn prune_store(store: &RecordStore, policy: &PrunePolicy, dry_run: bool) -> Result<PruneReport> {
    policy.validate()?;
    let plan = PrunePlan::build(store.scan(), policy, Utc::now());
    Ok(if dry_run {
        plan.dry_run_report()
    } else {
        plan.execute(store)
    })
}
