//! Phase B: value-aware selection.
//!
//! `final = (1 - λ) * similarity + λ * utility`

use crate::error::{MemoryError, Result};
use crate::schema::MemoryRecord;
use crate::similarity::{Candidate, round_score};
use serde::Serialize;

/// A retrieval result with both scores attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMemory {
    pub record: MemoryRecord,
    pub project: String,
    pub similarity: f64,
    pub final_score: f64,
}

/// Output shape of one retrieval hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalHit<'a> {
    pub id: &'a str,
    pub session_id: &'a str,
    pub project: &'a str,
    pub utility: f64,
    pub similarity: f64,
    pub final_score: f64,
    pub intent: &'a str,
    pub experience: &'a str,
    pub timestamp: &'a str,
}

impl RankedMemory {
    pub fn hit(&self) -> RetrievalHit<'_> {
        RetrievalHit {
            id: &self.record.id,
            session_id: &self.record.session_id,
            project: &self.project,
            utility: self.record.utility.value(),
            similarity: self.similarity,
            final_score: self.final_score,
            intent: &self.record.intent,
            experience: &self.record.experience,
            timestamp: &self.record.timestamp,
        }
    }
}

/// Check that a blend factor lies in `[0, 1]`.
pub fn validate_lambda(lambda: f64) -> Result<()> {
    if (0.0..=1.0).contains(&lambda) {
        Ok(())
    } else {
        Err(MemoryError::Validation(format!(
            "lambda must be between 0 and 1, got {lambda}"
        )))
    }
}

/// Blend similarity with utility.
///
/// With λ = 0 the result is exactly the similarity, with λ = 1 exactly the
/// utility.
pub fn blend(similarity: f64, utility: f64, lambda: f64) -> f64 {
    (1.0 - lambda) * similarity + lambda * utility
}

/// Re-score candidates and keep the best `top_k`.
///
/// Ordered by the unrounded blended score descending, then similarity
/// descending, then id ascending. Only the reported `final_score` is rounded
/// to 4 decimal places.
pub fn value_aware_select(
    candidates: Vec<Candidate>,
    lambda: f64,
    top_k: usize,
) -> Result<Vec<RankedMemory>> {
    validate_lambda(lambda)?;

    let mut scored: Vec<(f64, Candidate)> = candidates
        .into_iter()
        .map(|candidate| {
            let score = blend(
                candidate.similarity,
                candidate.record.utility.value(),
                lambda,
            );
            (score, candidate)
        })
        .collect();

    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .total_cmp(score_a)
            .then_with(|| b.similarity.total_cmp(&a.similarity))
            .then_with(|| a.record.id.cmp(&b.record.id))
    });
    scored.truncate(top_k);

    Ok(scored
        .into_iter()
        .map(|(score, candidate)| RankedMemory {
            final_score: round_score(score),
            similarity: candidate.similarity,
            project: candidate.project,
            record: candidate.record,
        })
        .collect())
}
