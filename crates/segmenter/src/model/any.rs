//! Runtime choice of construction kind.

use super::{Model, ModelConfig, ModelParams};
use crate::cache::{CacheStats, SegmentationCache};
use crate::io::{format_segmentation, read_corpus, write_edit_report, ModelLoader};
use cogmorph_core::{
    render_parts, Baseline, Cognate, ConstructionKind, CorpusWeight, EditOp, MorphError,
    Parallel, Result,
};
use cogmorph_training::TrainingReport;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A model of any construction kind.
#[derive(Debug, Clone)]
pub enum AnyModel {
    Baseline(Model<Baseline>),
    Parallel(Model<Parallel>),
    Cognate(Model<Cognate>),
}

macro_rules! dispatch {
    ($self:expr, $model:ident => $body:expr) => {
        match $self {
            AnyModel::Baseline($model) => $body,
            AnyModel::Parallel($model) => $body,
            AnyModel::Cognate($model) => $body,
        }
    };
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| MorphError::io(path, e))?;
    Ok(BufWriter::new(file))
}

fn flush(mut writer: BufWriter<File>, path: &Path) -> Result<()> {
    writer
        .flush()
        .map_err(|e| MorphError::Save(format!("Failed to flush {}: {}", path.display(), e)))
}

impl AnyModel {
    pub fn new(kind: ConstructionKind, config: ModelConfig) -> Result<Self> {
        Ok(match kind {
            ConstructionKind::Baseline => AnyModel::Baseline(Model::new(config)?),
            ConstructionKind::Parallel => AnyModel::Parallel(Model::new(config)?),
            ConstructionKind::Cognate => AnyModel::Cognate(Model::new(config)?),
        })
    }

    pub fn kind(&self) -> ConstructionKind {
        match self {
            AnyModel::Baseline(_) => ConstructionKind::Baseline,
            AnyModel::Parallel(_) => ConstructionKind::Parallel,
            AnyModel::Cognate(_) => ConstructionKind::Cognate,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        dispatch!(self, m => m.config())
    }

    pub fn load_corpus(&mut self, path: &Path) -> Result<usize> {
        dispatch!(self, m => m.load_corpus(path))
    }

    pub fn load_segmentations(&mut self, path: &Path) -> Result<usize> {
        dispatch!(self, m => m.load_segmentations(path))
    }

    pub fn train_batch(&mut self) -> Result<TrainingReport> {
        dispatch!(self, m => m.train_batch())
    }

    pub fn cost(&self) -> Result<f64> {
        dispatch!(self, m => m.cost())
    }

    pub fn params(&self) -> Result<ModelParams> {
        dispatch!(self, m => m.params())
    }

    pub fn set_corpus_weight(&mut self, weight: CorpusWeight) -> Result<()> {
        dispatch!(self, m => m.set_corpus_weight(weight))
    }

    pub fn set_edit_weight(&mut self, weight: f64) -> Result<()> {
        dispatch!(self, m => m.set_edit_weight(weight))
    }

    pub fn clear_segmentation(&mut self) -> Result<()> {
        dispatch!(self, m => m.clear_segmentation())
    }

    pub fn make_segment_only(&mut self) {
        dispatch!(self, m => m.make_segment_only())
    }

    pub fn is_segment_only(&self) -> bool {
        dispatch!(self, m => m.is_segment_only())
    }

    /// Edit operations by descending count; `None` unless this is a cognate model.
    pub fn edit_report(&self) -> Option<Vec<(EditOp, u64)>> {
        match self {
            AnyModel::Cognate(m) => Some(m.edit_report()),
            _ => None,
        }
    }

    /// Write the edit report of a cognate model to `path`.
    pub fn write_edit_report(&self, path: &Path) -> Result<()> {
        let report = self.edit_report().ok_or_else(|| {
            MorphError::InvalidConfig(format!(
                "edit report needs a cognate model, this one is {}",
                self.kind()
            ))
        })?;
        write_edit_report(&mut create(path)?, &report)
    }

    pub fn write_segmentations(&self, path: &Path) -> Result<()> {
        dispatch!(self, m => m.write_segmentations(path))
    }

    /// Segment every entry of a corpus file and write one line per entry.
    ///
    /// Entries keep their input order and count; repeated compounds are
    /// answered from a cache of the configured capacity.
    pub fn segment_corpus(&self, input: &Path, output: &Path) -> Result<CacheStats> {
        let mut writer = create(output)?;
        let stats = dispatch!(self, m => {
            let data = read_corpus(input, &m.normalizer())?;
            let mut cache = SegmentationCache::with_capacity(m.config().cache_capacity);
            for dp in &data {
                let parts = cache.get_or_segment(&dp.compound, |c| m.segment(c))?;
                writeln!(writer, "{}", format_segmentation(dp.count, &parts)).map_err(|e| {
                    MorphError::Save(format!("Failed to write segmentation: {}", e))
                })?;
            }
            cache.stats()
        });
        flush(writer, output)?;
        info!(
            "Segmented {} with {} cached compounds (hit rate {:.2})",
            input.display(),
            stats.entries,
            stats.hit_rate.unwrap_or(0.0)
        );
        Ok(stats)
    }

    /// Write the `n` cheapest segmentations of every corpus entry.
    ///
    /// Each line is `rank<TAB>cost<TAB>c1 + c2 + ...`, ranks counting from 1
    /// per entry. Returns the number of lines written.
    pub fn segment_corpus_nbest(&self, input: &Path, output: &Path, n: usize) -> Result<usize> {
        let mut writer = create(output)?;
        let lines = dispatch!(self, m => {
            let data = read_corpus(input, &m.normalizer())?;
            let mut lines = 0;
            for dp in &data {
                for (rank, seg) in m.viterbi_nbest(&dp.compound, n)?.iter().enumerate() {
                    writeln!(
                        writer,
                        "{}\t{:.6}\t{}",
                        rank + 1,
                        seg.cost,
                        render_parts(&seg.constructions)
                    )
                    .map_err(|e| MorphError::Save(format!("Failed to write segmentation: {}", e)))?;
                    lines += 1;
                }
            }
            lines
        });
        flush(writer, output)?;
        info!("Wrote {} ranked segmentations of {}", lines, input.display());
        Ok(lines)
    }

    /// Write `compound<TAB>cost` for every corpus entry, where the cost is
    /// the forward negative log-probability.
    pub fn score_corpus(&self, input: &Path, output: &Path) -> Result<usize> {
        let mut writer = create(output)?;
        let entries = dispatch!(self, m => {
            let data = read_corpus(input, &m.normalizer())?;
            for dp in &data {
                let cost = m.forward_logprob(&dp.compound)?;
                writeln!(writer, "{}\t{:.6}", dp.compound, cost)
                    .map_err(|e| MorphError::Save(format!("Failed to write score: {}", e)))?;
            }
            data.len()
        });
        flush(writer, output)?;
        Ok(entries)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        dispatch!(self, m => m.save(path))
    }

    /// Load a model of whatever kind the file holds.
    pub fn load(path: &Path) -> Result<Self> {
        let header = ModelLoader::load_header(path)?;
        Ok(match header.kind {
            ConstructionKind::Baseline => AnyModel::Baseline(Model::load(path)?),
            ConstructionKind::Parallel => AnyModel::Parallel(Model::load(path)?),
            ConstructionKind::Cognate => AnyModel::Cognate(Model::load(path)?),
        })
    }
}

impl From<Model<Baseline>> for AnyModel {
    fn from(model: Model<Baseline>) -> Self {
        AnyModel::Baseline(model)
    }
}

impl From<Model<Parallel>> for AnyModel {
    fn from(model: Model<Parallel>) -> Self {
        AnyModel::Parallel(model)
    }
}

impl From<Model<Cognate>> for AnyModel {
    fn from(model: Model<Cognate>) -> Self {
        AnyModel::Cognate(model)
    }
}
