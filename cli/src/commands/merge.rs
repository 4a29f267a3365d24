//! Merge-lists command implementation.

use clap::Parser;
use std::path::PathBuf;

/// Merge-lists command arguments.
#[derive(Parser)]
pub struct MergeListsCommand {
    /// Source word counts, `count<TAB>word`
    pub srcs: PathBuf,

    /// Target word counts, `count<TAB>word`
    pub trgs: PathBuf,

    /// Candidate cognates, `dist<TAB>src<TAB>trg`
    pub cognates: PathBuf,

    /// Output cognate corpus
    pub output: PathBuf,

    /// Minimum count of a word kept outside a cognate pair
    #[arg(long, default_value_t = 2)]
    pub count_threshold: u64,
}

use anyhow::{Context, Result as AnyhowResult};
use cogmorph::io::{merge_word_lists, read_cognate_list, read_word_counts, write_merged, MergeConfig};
use log::info;

pub fn run(cmd: MergeListsCommand) -> AnyhowResult<()> {
    let srcs = read_word_counts(&cmd.srcs)
        .with_context(|| format!("failed to read {}", cmd.srcs.display()))?;
    let trgs = read_word_counts(&cmd.trgs)
        .with_context(|| format!("failed to read {}", cmd.trgs.display()))?;
    let cognates = read_cognate_list(&cmd.cognates)
        .with_context(|| format!("failed to read {}", cmd.cognates.display()))?;

    let config = MergeConfig {
        count_threshold: cmd.count_threshold,
    };
    let merged = merge_word_lists(&srcs, &trgs, &cognates, &config)?;
    write_merged(&cmd.output, &merged)
        .with_context(|| format!("failed to write {}", cmd.output.display()))?;
    info!("Wrote {} corpus entries to {}", merged.len(), cmd.output.display());
    Ok(())
}
