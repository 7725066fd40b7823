//! Evict memories that are too old, of low utility, or beyond a session's
//! capacity.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use memory_common::debug::log_decision;
use memory_common::print_json;
use memory_core::{MemoryEngine, PrunePolicy, PruneReport, default_root};
use std::fmt::Write as _;

/// Prune the memory store.
#[derive(Parser)]
#[command(name = "prune-memories", version)]
struct Cli {
    /// Show what would be removed without deleting anything
    #[arg(long)]
    dry_run: bool,
    /// Remove memories older than this many days
    #[arg(long, value_name = "DAYS", default_value_t = PrunePolicy::default().max_age_days)]
    age: i64,
    /// Remove memories with utility below this value
    #[arg(long, default_value_t = PrunePolicy::default().min_utility)]
    min_utility: f64,
    /// Maximum memories kept per session
    #[arg(long, default_value_t = PrunePolicy::default().per_session_limit)]
    limit: usize,
    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
    /// Memory root directory (default: $AUTO_MEMORY_PATH or ~/.config/ai/auto-memory/sessions)
    #[arg(long)]
    root: Option<Utf8PathBuf>,
}

impl Cli {
    fn policy(&self) -> PrunePolicy {
        PrunePolicy {
            max_age_days: self.age,
            min_utility: self.min_utility,
            per_session_limit: self.limit,
        }
    }
}

fn main() -> Result<()> {
    memory_common::init_logging();
    let cli = Cli::parse();

    let root = cli.root.clone().unwrap_or_else(default_root);
    let engine = MemoryEngine::new(root.clone());
    let report = engine
        .prune(&cli.policy(), cli.dry_run)
        .context("Error pruning memories")?;

    let decision = if report.dry_run { "dry-run" } else { "pruned" };
    log_decision(
        &root,
        "prune-memories",
        decision,
        &format!(
            "{} of {} memories, {} failed",
            report.removed_memories, report.total_memories_before, report.failed
        ),
    );

    if cli.json {
        print_json(&report)
    } else {
        print!("{}", summary(&report));
        Ok(())
    }
}

fn summary(report: &PruneReport) -> String {
    let mut out = String::new();
    if report.dry_run {
        out.push_str("DRY RUN - No files would be modified\n");
    } else {
        out.push_str("Memory pruning complete\n");
    }

    let _ = writeln!(out, "\nTotal memories: {}", report.total_memories_before);
    let _ = writeln!(out, "Removed memories: {}", report.removed_memories);
    if report.failed > 0 {
        let _ = writeln!(out, "Failed deletions: {}", report.failed);
    }
    let _ = writeln!(out, "Sessions cleaned: {}", report.sessions_cleaned);

    if report.dry_run && report.removed_memories > 0 {
        out.push_str("\nSession details:\n");
        for (session_id, detail) in &report.session_details {
            if detail.to_remove.is_empty() {
                continue;
            }
            let _ = writeln!(
                out,
                "  {}: {} total, {} to remove",
                session_id,
                detail.total,
                detail.to_remove.len()
            );
        }
    }
    out
}
