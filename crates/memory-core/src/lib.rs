//! Scored memory store for work sessions.
//!
//! Provides:
//! - Intent / experience / utility record schema
//! - Per-session JSON file storage
//! - Two-phase retrieval (similarity filter, value-aware ranking)
//! - Age, utility and per-session capacity eviction

pub mod engine;
pub mod error;
pub mod prune;
pub mod ranking;
pub mod schema;
pub mod settings;
pub mod similarity;
pub mod storage;

pub use engine::{MemoryEngine, RetrieveRequest};
pub use error::MemoryError;
pub use prune::{PrunePlan, PrunePolicy, PruneReason, PruneReport, SessionPruneDetail};
pub use ranking::{RankedMemory, RetrievalHit};
pub use schema::{MemoryContext, MemoryRecord, UNKNOWN_PROJECT, Utility, validate_session_id};
pub use settings::{MEMORY_PATH_ENV, MemorySettings, default_root};
pub use similarity::Candidate;
pub use storage::{RecordStore, StoreStats, StoredRecord};
