//! Train command implementation.

use clap::Parser;
use cogmorph::{ConstructionKind, CorpusWeight, NormalizationForm, TrainingAlgorithm};
use std::path::PathBuf;

/// Train command arguments.
#[derive(Parser)]
pub struct TrainCommand {
    /// Training corpus
    pub corpus: Option<PathBuf>,

    /// Construction kind: baseline, parallel or cognate
    #[arg(short, long, default_value = "baseline")]
    pub kind: ConstructionKind,

    /// Initialize from an existing segmentation file
    #[arg(short = 'L', long)]
    pub load_segmentation: Option<PathBuf>,

    /// Training algorithm: viterbi, recursive or flatten
    #[arg(long, default_value = "viterbi")]
    pub algorithm: TrainingAlgorithm,

    /// Corpus weight, shared (`a`) or per side (`src,trg`)
    #[arg(short, long, default_value = "1.0")]
    pub alpha: CorpusWeight,

    /// Edit weight of cognate models
    #[arg(long, default_value_t = 1.0)]
    pub ew: f64,

    /// Additive smoothing of the Viterbi search
    #[arg(long, default_value_t = 1.0)]
    pub smoothing: f64,

    /// Maximum construction length per side
    #[arg(long, default_value_t = 30)]
    pub max_len: usize,

    /// Minimum cost improvement per compound token to keep training
    #[arg(long, default_value_t = 0.005)]
    pub finish_threshold: f64,

    /// Maximum number of epochs
    #[arg(long)]
    pub max_epochs: Option<usize>,

    /// Re-segment in parallel against a per-epoch snapshot
    #[arg(short, long, default_value_t = false)]
    pub parallel: bool,

    /// Unicode normalization of the input
    #[arg(long, default_value = "nfc")]
    pub normalization: NormalizationForm,

    /// Drop the analyses before saving
    #[arg(long, default_value_t = false)]
    pub segment_only: bool,

    /// Save the trained model (`.json` for JSON, bincode otherwise)
    #[arg(short, long)]
    pub save: Option<PathBuf>,

    /// Write the final segmentations
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the edit-operation report of a cognate model
    #[arg(long)]
    pub edit_report: Option<PathBuf>,

    /// Write the model parameters as JSON
    #[arg(long)]
    pub params: Option<PathBuf>,
}

use anyhow::{bail, Context, Result as AnyhowResult};
use cogmorph::ModelBuilder;
use log::info;
use std::fs;
use std::time::Instant;

pub fn run(cmd: TrainCommand) -> AnyhowResult<()> {
    if cmd.corpus.is_none() && cmd.load_segmentation.is_none() {
        bail!("nothing to train on: give a corpus or --load-segmentation");
    }

    let mut builder = ModelBuilder::new()
        .corpus_weight(cmd.alpha)
        .edit_weight(cmd.ew)
        .algorithm(cmd.algorithm)
        .smoothing(cmd.smoothing)
        .max_len(cmd.max_len)
        .finish_threshold(cmd.finish_threshold)
        .parallel(cmd.parallel)
        .normalization(cmd.normalization);
    if let Some(epochs) = cmd.max_epochs {
        builder = builder.max_epochs(epochs);
    }
    let mut model = builder
        .build_any(cmd.kind)
        .context("invalid model configuration")?;

    if let Some(path) = &cmd.load_segmentation {
        model
            .load_segmentations(path)
            .with_context(|| format!("failed to load segmentation {}", path.display()))?;
    }
    if let Some(path) = &cmd.corpus {
        model
            .load_corpus(path)
            .with_context(|| format!("failed to load corpus {}", path.display()))?;
    }

    let start = Instant::now();
    let report = model.train_batch().context("training failed")?;
    info!(
        "Trained {} model in {:.2}s: {} epochs, cost {:.3} -> {:.3} ({:?})",
        cmd.kind,
        start.elapsed().as_secs_f64(),
        report.epochs,
        report.initial_cost,
        report.final_cost,
        report.stop_reason
    );

    if let Some(path) = &cmd.output {
        model
            .write_segmentations(path)
            .with_context(|| format!("failed to write segmentations to {}", path.display()))?;
        info!("Segmentations written to {}", path.display());
    }
    if let Some(path) = &cmd.edit_report {
        model
            .write_edit_report(path)
            .with_context(|| format!("failed to write edit report to {}", path.display()))?;
        info!("Edit report written to {}", path.display());
    }
    if cmd.segment_only {
        model.make_segment_only();
    }
    if let Some(path) = &cmd.params {
        let params = serde_json::to_string_pretty(&model.params()?)?;
        fs::write(path, params)
            .with_context(|| format!("failed to write parameters to {}", path.display()))?;
    }
    if let Some(path) = &cmd.save {
        model
            .save(path)
            .with_context(|| format!("failed to save model to {}", path.display()))?;
    }

    Ok(())
}
