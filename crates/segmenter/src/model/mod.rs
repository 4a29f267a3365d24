//! Segmentation model façade.
//!
//! A [`Model`] bundles the configuration, the corpus analyses and the cost
//! model they are counted into. It is generic over the construction kind;
//! [`AnyModel`] picks the kind at runtime.

pub mod any;

pub use any::AnyModel;

use crate::io::{
    read_corpus, read_segmentations, save_segmentations, CorpusFormat, ModelHeader, ModelLoader,
    ModelSaver,
};
use crate::normalize::{NormalizationForm, Normalizer};
use cogmorph_core::{
    Cognate, Construction, ConstructionKind, CorpusWeight, CostModel, CostWeights, DataPoint,
    EditOp, MorphError, Result, Segmentation,
};
use cogmorph_training::{
    most_common, Analysis, BatchTrainer, SegmentationState, TrainingAlgorithm, TrainingConfig,
    TrainingReport,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for building a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Corpus and edit weights of the cost model
    pub weights: CostWeights,
    /// Batch training and Viterbi search
    pub training: TrainingConfig,
    /// Unicode normalization of corpus input
    pub normalization: NormalizationForm,
    /// Capacity of the segmentation cache used on running text
    pub cache_capacity: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights: CostWeights::default(),
            training: TrainingConfig::default(),
            normalization: NormalizationForm::Nfc,
            cache_capacity: 10_000,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        self.weights.corpus.validate()?;
        if !self.weights.edit_weight.is_finite() || self.weights.edit_weight < 0.0 {
            return Err(MorphError::CostModel(format!(
                "edit weight must be finite and non-negative, got {}",
                self.weights.edit_weight
            )));
        }
        self.training.validate()
    }
}

/// Builder for creating a model.
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    config: ModelConfig,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Corpus weight (`alpha`), shared or per side.
    pub fn corpus_weight(mut self, weight: CorpusWeight) -> Self {
        self.config.weights.corpus = weight;
        self
    }

    /// Edit weight (`ew`); only cognate models use it.
    pub fn edit_weight(mut self, weight: f64) -> Self {
        self.config.weights.edit_weight = weight;
        self
    }

    pub fn training(mut self, training: TrainingConfig) -> Self {
        self.config.training = training;
        self
    }

    /// Re-analysis used by each training epoch.
    pub fn algorithm(mut self, algorithm: TrainingAlgorithm) -> Self {
        self.config.training.algorithm = algorithm;
        self
    }

    pub fn smoothing(mut self, smoothing: f64) -> Self {
        self.config.training.smoothing = smoothing;
        self
    }

    pub fn max_len(mut self, max_len: usize) -> Self {
        self.config.training.max_len = max_len;
        self
    }

    pub fn finish_threshold(mut self, threshold: f64) -> Self {
        self.config.training.finish_threshold = threshold;
        self
    }

    pub fn max_epochs(mut self, epochs: usize) -> Self {
        self.config.training.max_epochs = Some(epochs);
        self
    }

    /// Run epochs sharded over the rayon pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.training.parallel = parallel;
        self
    }

    pub fn normalization(mut self, form: NormalizationForm) -> Self {
        self.config.normalization = form;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    pub fn build<C: Construction>(self) -> Result<Model<C>> {
        Model::new(self.config)
    }

    /// Build a model whose construction kind is chosen at runtime.
    pub fn build_any(self, kind: ConstructionKind) -> Result<AnyModel> {
        AnyModel::new(kind, self.config)
    }
}

/// Hyperparameters and size of a model, for reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub kind: ConstructionKind,
    pub corpus_weight: CorpusWeight,
    pub edit_weight: f64,
    pub algorithm: TrainingAlgorithm,
    pub smoothing: f64,
    pub max_len: usize,
    pub finish_threshold: f64,
    pub max_epochs: Option<usize>,
    pub parallel: bool,
    pub normalization: NormalizationForm,
    pub segment_only: bool,
    /// Distinct compounds with an analysis
    pub compounds: usize,
    /// Compound tokens counted in the cost model
    pub compound_tokens: u64,
    /// Distinct constructions in the lexicon
    pub construction_types: usize,
    /// Construction tokens in the corpus code
    pub construction_tokens: u64,
    /// Total code length
    pub cost: f64,
}

/// Trainable segmentation model for one construction kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Model<C: Construction> {
    /// Configuration
    config: ModelConfig,
    /// Analyses and cost model
    state: SegmentationState<C>,
    /// Analyses dropped; only segmentation of new compounds remains
    segment_only: bool,
}

impl<C: Construction> Model<C> {
    /// Create an empty model.
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        let state = SegmentationState::with_weights(&config.weights)?;
        Ok(Self {
            config,
            state,
            segment_only: false,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn state(&self) -> &SegmentationState<C> {
        &self.state
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.config.normalization)
    }

    pub fn is_segment_only(&self) -> bool {
        self.segment_only
    }

    fn ensure_trainable(&self, operation: &str) -> Result<()> {
        if self.segment_only {
            return Err(MorphError::SegmentOnly(format!(
                "cannot {} a segment-only model",
                operation
            )));
        }
        Ok(())
    }

    /// Add corpus entries. Repeated compounds accumulate their counts.
    ///
    /// Returns the number of distinct compounds in the model afterwards.
    pub fn load_data(&mut self, data: Vec<DataPoint<C>>) -> Result<usize> {
        self.ensure_trainable("load data into")?;
        let entries = data.len();
        for dp in data {
            self.state.add_data(dp)?;
        }
        info!(
            "Loaded {} entries; {} distinct compounds",
            entries,
            self.state.len()
        );
        Ok(self.state.len())
    }

    /// Seed the analyses from a segmentation file (`count c1 + c2 ...`).
    pub fn load_segmentations(&mut self, path: &Path) -> Result<usize> {
        let data = read_segmentations(path, &self.normalizer())?;
        self.load_data(data)
    }

    /// Train with batch epochs of the configured algorithm until convergence.
    pub fn train_batch(&mut self) -> Result<TrainingReport> {
        self.ensure_trainable("train")?;
        let trainer = BatchTrainer::new(self.config.training.clone())?;
        trainer.train(&mut self.state)
    }

    /// Cheapest segmentation of `compound` under the current model.
    pub fn viterbi_segment(&self, compound: &C) -> Result<Segmentation<C>> {
        self.config
            .training
            .segmenter()?
            .segment(compound, self.state.cost_model())
    }

    /// The `n` cheapest segmentations of `compound`, cheapest first.
    pub fn viterbi_nbest(&self, compound: &C, n: usize) -> Result<Vec<Segmentation<C>>> {
        self.config
            .training
            .segmenter()?
            .segment_nbest(compound, self.state.cost_model(), n)
    }

    /// Negative log-probability of `compound` over all its segmentations.
    pub fn forward_logprob(&self, compound: &C) -> Result<f64> {
        self.config
            .training
            .segmenter()?
            .forward_logprob(compound, self.state.cost_model())
    }

    /// Stored analysis of a training compound, else its Viterbi segmentation.
    pub fn segment(&self, compound: &C) -> Result<Vec<C>> {
        match self.state.get(compound) {
            Some(analysis) => Ok(analysis.parts.clone()),
            None => self.viterbi_segment(compound).map(|s| s.constructions),
        }
    }

    /// Current analyses of all training compounds, in load order.
    pub fn segmentations(&self) -> Result<&[Analysis<C>]> {
        self.ensure_trainable("list the compounds of")?;
        Ok(self.state.analyses())
    }

    /// Lexicon contents, sorted by construction.
    pub fn constructions(&self) -> Vec<(C, u64)> {
        self.state.cost_model().constructions()
    }

    /// Total code length.
    pub fn cost(&self) -> Result<f64> {
        self.state.cost()
    }

    pub fn set_corpus_weight(&mut self, weight: CorpusWeight) -> Result<()> {
        self.state.cost_model_mut().set_corpus_weight(weight)?;
        self.config.weights.corpus = weight;
        Ok(())
    }

    pub fn set_edit_weight(&mut self, weight: f64) -> Result<()> {
        self.state.cost_model_mut().set_edit_weight(weight)?;
        self.config.weights.edit_weight = weight;
        Ok(())
    }

    /// Reset every training compound to a single construction.
    pub fn clear_segmentation(&mut self) -> Result<()> {
        self.ensure_trainable("clear")?;
        self.state.clear_segmentation()
    }

    /// Drop the analyses, keeping the lexicon for segmenting new compounds.
    pub fn make_segment_only(&mut self) {
        self.state.drop_analyses();
        self.segment_only = true;
    }

    pub fn params(&self) -> Result<ModelParams> {
        let cost = self.state.cost_model();
        let weights = cost.weights();
        let training = &self.config.training;
        Ok(ModelParams {
            kind: C::KIND,
            corpus_weight: weights.corpus,
            edit_weight: weights.edit_weight,
            algorithm: training.algorithm,
            smoothing: training.smoothing,
            max_len: training.max_len,
            finish_threshold: training.finish_threshold,
            max_epochs: training.max_epochs,
            parallel: training.parallel,
            normalization: self.config.normalization,
            segment_only: self.segment_only,
            compounds: self.state.len(),
            compound_tokens: cost.compound_tokens(),
            construction_types: cost.types(),
            construction_tokens: cost.tokens(),
            cost: cost.cost()?,
        })
    }

    /// Write the analyses as `count c1 + c2 + ...` lines in load order.
    pub fn write_segmentations(&self, path: &Path) -> Result<()> {
        let analyses = self.segmentations()?;
        save_segmentations(
            path,
            analyses.iter().map(|a| (a.count, a.parts.as_slice())),
        )
    }

    /// Save the model; `.json` paths are written as JSON, others as bincode.
    pub fn save(&self, path: &Path) -> Result<()> {
        let header = ModelHeader::new(C::KIND, self.segment_only);
        ModelSaver::save(path, &header, self)?;
        info!("Saved {} model to {}", C::KIND, path.display());
        Ok(())
    }

    /// Load a model saved with [`Model::save`].
    pub fn load(path: &Path) -> Result<Self> {
        ModelLoader::load_header(path)?.expect_kind(C::KIND)?;
        let (header, model): (ModelHeader, Self) = ModelLoader::load(path)?;
        if header.segment_only != model.segment_only {
            return Err(MorphError::Load(format!(
                "Header of {} disagrees with its body",
                path.display()
            )));
        }
        model.config.validate()?;
        Ok(model)
    }
}

impl<C: CorpusFormat> Model<C> {
    /// Read a corpus file and add its entries.
    pub fn load_corpus(&mut self, path: &Path) -> Result<usize> {
        let data = read_corpus(path, &self.normalizer())?;
        self.load_data(data)
    }
}

impl Model<Cognate> {
    /// Edit operations by descending count.
    pub fn edit_report(&self) -> Vec<(EditOp, u64)> {
        most_common(self.state.cost_model().edit_model().table(), None)
    }
}
