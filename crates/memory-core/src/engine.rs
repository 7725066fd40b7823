//! Engine facade: `store`, `retrieve`, `prune` over one record store.

use crate::error::{MemoryError, Result};
use crate::prune::{PrunePolicy, PruneReport, prune_store};
use crate::ranking::{RankedMemory, validate_lambda, value_aware_select};
use crate::schema::{MemoryContext, MemoryRecord};
use crate::settings::MemorySettings;
use crate::similarity::similarity_recall;
use crate::storage::{RecordStore, StoredRecord};
use camino::Utf8PathBuf;
use log::debug;

/// Parameters for a two-phase retrieval. Unset fields fall back to the
/// engine settings.
#[derive(Debug, Clone, Default)]
pub struct RetrieveRequest {
    pub query: String,
    pub project_context: Option<String>,
    pub lambda: Option<f64>,
    pub top_k: Option<usize>,
    pub threshold: Option<f64>,
}

impl RetrieveRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project_context = Some(project.into());
        self
    }

    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = Some(lambda);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

/// Scored memory store.
#[derive(Debug, Clone)]
pub struct MemoryEngine {
    store: RecordStore,
    settings: MemorySettings,
}

impl MemoryEngine {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self::with_settings(root, MemorySettings::default())
    }

    pub fn with_settings(root: impl Into<Utf8PathBuf>, settings: MemorySettings) -> Self {
        Self {
            store: RecordStore::new(root),
            settings,
        }
    }

    pub fn store_ref(&self) -> &RecordStore {
        &self.store
    }

    /// Create and persist a record.
    pub fn store(
        &self,
        intent: &str,
        experience: &str,
        utility: f64,
        session_id: &str,
        context: Option<MemoryContext>,
    ) -> Result<StoredRecord> {
        let record = MemoryRecord::create(intent, experience, utility, session_id, context)?;
        let path = self.store.save(&record)?;
        Ok(StoredRecord { path, record })
    }

    /// Phase A then Phase B over the whole store.
    pub fn retrieve(&self, request: &RetrieveRequest) -> Result<Vec<RankedMemory>> {
        let lambda = request.lambda.unwrap_or(self.settings.lambda);
        let top_k = request.top_k.unwrap_or(self.settings.top_k);
        let threshold = request.threshold.unwrap_or(self.settings.threshold);

        validate_lambda(lambda)?;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(MemoryError::Validation(format!(
                "threshold must be a non-negative number, got {threshold}"
            )));
        }

        let records = self.store.load_all();
        if records.is_empty() {
            debug!("no memories found in {}", self.store.root());
            return Ok(Vec::new());
        }
        let loaded = records.len();

        let candidates = similarity_recall(
            &request.query,
            request.project_context.as_deref(),
            records,
            threshold,
            self.settings.candidate_k,
        );
        let candidate_count = candidates.len();
        let ranked = value_aware_select(candidates, lambda, top_k)?;

        debug!(
            "retrieved memories (loaded={}, candidates={}, returned={})",
            loaded,
            candidate_count,
            ranked.len()
        );
        Ok(ranked)
    }

    /// Evict records under `policy`.
    pub fn prune(&self, policy: &PrunePolicy, dry_run: bool) -> Result<PruneReport> {
        prune_store(&self.store, policy, dry_run)
    }

    /// Evict records under the engine's default policy.
    pub fn prune_with_defaults(&self, dry_run: bool) -> Result<PruneReport> {
        self.prune(&PrunePolicy::from(&self.settings), dry_run)
    }
}
