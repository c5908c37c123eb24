//! Inspect and evict cached proofs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use df_runtime::{FileProofCache, OrchestratorConfig, ProofCache, TestCaseId};
use df_zk::CircuitKind;

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// List cached proofs
    List(List),

    /// Remove one cached proof
    Evict(Evict),
}

impl CacheCommand {
    pub fn execute(self, config: &OrchestratorConfig) -> Result<()> {
        let cache_dir = config.cache_dir();
        let cache = FileProofCache::new(&cache_dir)
            .with_context(|| format!("Failed to open cache: {}", cache_dir.display()))?;

        match self {
            CacheCommand::List(cmd) => cmd.execute(&cache),
            CacheCommand::Evict(cmd) => cmd.execute(&cache),
        }
    }
}

#[derive(Debug, Parser)]
pub struct List {
    /// Only show entries for this circuit
    #[arg(short, long)]
    kind: Option<CircuitKind>,
}

impl List {
    fn execute(&self, cache: &FileProofCache) -> Result<()> {
        let entries: Vec<_> = cache
            .entries()
            .context("Failed to read cache index")?
            .into_iter()
            .filter(|entry| self.kind.is_none_or(|kind| entry.kind() == kind))
            .collect();

        println!(
            "{} {}",
            style("Cache:").bold().cyan(),
            style(cache.root().display()).dim()
        );
        if entries.is_empty() {
            println!("  (no cached proofs)");
            return Ok(());
        }

        for entry in &entries {
            let status = if cache.is_valid(entry, entry.content_hash()) {
                style("ok").green()
            } else {
                style("missing").red()
            };
            println!(
                "  {:<32} {:>7} bytes  {}  {}  {}  [{}]",
                style(entry.key()).bold(),
                entry.size,
                &entry.content_hash().to_hex()[..16],
                entry.metadata.generated_at.format("%Y-%m-%d %H:%M:%S"),
                format!("{:?}", entry.metadata.backend).to_lowercase(),
                status
            );
        }
        println!("{} entries", entries.len());
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Evict {
    /// Circuit kind (init, reveal, move, whitelist, biomebase)
    kind: CircuitKind,

    /// Test case id
    test_case: TestCaseId,
}

impl Evict {
    fn execute(&self, cache: &FileProofCache) -> Result<()> {
        if cache
            .evict(self.kind, &self.test_case)
            .context("Failed to evict cache entry")?
        {
            println!(
                "{} {}/{}",
                style("✓ Evicted").green().bold(),
                self.kind,
                self.test_case
            );
        } else {
            println!(
                "{}",
                style(format!("No cached proof for {}/{}", self.kind, self.test_case)).yellow()
            );
        }
        Ok(())
    }
}
