//! Two-phase memory retrieval.
//!
//! Phase A keeps records whose keyword similarity to the query clears the
//! threshold; Phase B re-ranks them by `(1 - λ) * similarity + λ * utility`.
//! Hits are printed as a JSON array; no hits print `[]`.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use log::debug;
use memory_common::print_json;
use memory_core::{MemoryEngine, RetrievalHit, RetrieveRequest, default_root};

/// Retrieve the memories most relevant to a query.
#[derive(Parser)]
#[command(name = "retrieve-memory", version)]
struct Cli {
    /// Search query text
    query: String,
    /// Balance between similarity (0) and utility (1) [default: 0.5]
    #[arg(long)]
    lambda: Option<f64>,
    /// Number of results to return [default: 5]
    #[arg(long)]
    top_k: Option<usize>,
    /// Minimum similarity, exclusive [default: 0.1]
    #[arg(long)]
    threshold: Option<f64>,
    /// Project or context words appended to the query
    #[arg(long)]
    project: Option<String>,
    /// Memory root directory (default: $AUTO_MEMORY_PATH or ~/.config/ai/auto-memory/sessions)
    #[arg(long)]
    root: Option<Utf8PathBuf>,
}

impl Cli {
    fn request(&self) -> RetrieveRequest {
        let mut request = RetrieveRequest::new(&self.query);
        if let Some(project) = &self.project {
            request = request.with_project(project);
        }
        if let Some(lambda) = self.lambda {
            request = request.with_lambda(lambda);
        }
        if let Some(top_k) = self.top_k {
            request = request.with_top_k(top_k);
        }
        if let Some(threshold) = self.threshold {
            request = request.with_threshold(threshold);
        }
        request
    }
}

fn main() -> Result<()> {
    memory_common::init_logging();
    let cli = Cli::parse();

    let engine = MemoryEngine::new(cli.root.clone().unwrap_or_else(default_root));
    let stats = engine.store_ref().stats();
    debug!(
        "loaded {} memories from {} sessions ({} malformed)",
        stats.records, stats.sessions, stats.malformed
    );

    let ranked = engine
        .retrieve(&cli.request())
        .context("Error retrieving memories")?;
    let hits: Vec<RetrievalHit<'_>> = ranked.iter().map(|r| r.hit()).collect();
    print_json(&hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_falls_back_to_settings() {
        let cli = Cli::parse_from(["retrieve-memory", "react state"]);
        let request = cli.request();
        assert_eq!(request.query, "react state");
        assert_eq!(request.lambda, None);
        assert_eq!(request.top_k, None);
        assert_eq!(request.project_context, None);
    }

    #[test]
    fn test_request_overrides() {
        let cli = Cli::parse_from([
            "retrieve-memory",
            "deploy",
            "--lambda",
            "0.2",
            "--top-k",
            "3",
            "--threshold",
            "0.05",
            "--project",
            "infra",
        ]);
        let request = cli.request();
        assert_eq!(request.lambda, Some(0.2));
        assert_eq!(request.top_k, Some(3));
        assert_eq!(request.threshold, Some(0.05));
        assert_eq!(request.project_context.as_deref(), Some("infra"));
    }
}
