//! Phase A: keyword-overlap similarity filter.
//!
//! Query and records are reduced to sets of lower-cased whitespace tokens and
//! compared with a set cosine: `|Q ∩ R| / (sqrt|Q| * sqrt|R|)`.

use crate::schema::MemoryRecord;
use std::collections::HashSet;

/// A record that passed the similarity cutoff.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub record: MemoryRecord,
    /// Rounded to 4 decimal places
    pub similarity: f64,
    /// Resolved project label
    pub project: String,
}

/// Lower-case and split on whitespace.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Tokens a record is compared on: intent, experience and, when present,
/// the context file and file type.
pub fn record_tokens(record: &MemoryRecord) -> HashSet<String> {
    let mut text = format!("{} {}", record.intent, record.experience);
    if let Some(context) = &record.context {
        text.push(' ');
        text.push_str(&context.file);
        text.push(' ');
        text.push_str(&context.file_type);
    }
    tokenize(&text)
}

/// Set cosine between two token sets; 0 when either is empty.
pub fn keyword_similarity(query: &HashSet<String>, text: &HashSet<String>) -> f64 {
    if query.is_empty() || text.is_empty() {
        return 0.0;
    }
    let overlap = query.intersection(text).count() as f64;
    overlap / ((query.len() as f64).sqrt() * (text.len() as f64).sqrt())
}

/// Round to 4 decimal places.
pub(crate) fn round_score(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Score every record against the query and keep the best `top_k` whose
/// similarity is strictly above `threshold`.
///
/// Ordered by similarity descending, then id ascending. An empty query
/// yields no candidates.
pub fn similarity_recall<I>(
    query: &str,
    project_context: Option<&str>,
    records: I,
    threshold: f64,
    top_k: usize,
) -> Vec<Candidate>
where
    I: IntoIterator<Item = MemoryRecord>,
{
    let combined = match project_context {
        Some(project) if !project.trim().is_empty() => format!("{query} {project}"),
        _ => query.to_string(),
    };
    let query_tokens = tokenize(&combined);
    if query_tokens.is_empty() {
        return Vec::new();
    }

    let mut candidates: Vec<Candidate> = records
        .into_iter()
        .filter_map(|record| {
            let similarity = keyword_similarity(&query_tokens, &record_tokens(&record));
            (similarity > threshold).then(|| Candidate {
                similarity: round_score(similarity),
                project: record.project().to_string(),
                record,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.record.id.cmp(&b.record.id))
    });
    candidates.truncate(top_k);
    candidates
}
