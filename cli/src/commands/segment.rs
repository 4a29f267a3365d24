//! Segment command implementation.

use clap::Parser;
use std::path::PathBuf;

/// Segment command arguments.
#[derive(Parser)]
pub struct SegmentCommand {
    /// Path to the saved model
    #[arg(short, long)]
    pub model: PathBuf,

    /// Corpus to segment, in the model's corpus format
    pub input: PathBuf,

    /// Output segmentation file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Write the n cheapest segmentations of each entry with their costs
    #[arg(short, long)]
    pub nbest: Option<usize>,

    /// Write forward log-probabilities instead of segmentations
    #[arg(long, default_value_t = false, conflicts_with = "nbest")]
    pub score: bool,
}

use anyhow::{Context, Result as AnyhowResult};
use cogmorph::AnyModel;
use log::info;
use std::time::Instant;

pub fn run(cmd: SegmentCommand) -> AnyhowResult<()> {
    let model = AnyModel::load(&cmd.model)
        .with_context(|| format!("failed to load model {}", cmd.model.display()))?;
    info!("Loaded {} model from {}", model.kind(), cmd.model.display());

    let start = Instant::now();
    if cmd.score {
        let entries = model
            .score_corpus(&cmd.input, &cmd.output)
            .with_context(|| format!("failed to score {}", cmd.input.display()))?;
        info!(
            "Scored {} entries in {:.2}s",
            entries,
            start.elapsed().as_secs_f64()
        );
        return Ok(());
    }
    if let Some(n) = cmd.nbest {
        let lines = model
            .segment_corpus_nbest(&cmd.input, &cmd.output, n)
            .with_context(|| format!("failed to segment {}", cmd.input.display()))?;
        info!(
            "Wrote {} segmentations in {:.2}s",
            lines,
            start.elapsed().as_secs_f64()
        );
        return Ok(());
    }
    let stats = model
        .segment_corpus(&cmd.input, &cmd.output)
        .with_context(|| format!("failed to segment {}", cmd.input.display()))?;
    info!(
        "Segmented in {:.2}s; {} distinct compounds cached (capacity {})",
        start.elapsed().as_secs_f64(),
        stats.entries,
        stats.capacity
    );

    Ok(())
}
