//! Batch training.
//!
//! Each epoch re-analyses every compound in load order against the current
//! model, either with the Viterbi search or by recursive binary splitting.
//! Training stops once an epoch improves the total cost by less than
//! `finish_threshold` per compound token, or at the epoch cap.

use super::state::SegmentationState;
use cogmorph_core::{
    Construction, CostModel, MorphError, Result, ViterbiSegmenter, DEFAULT_MAX_LEN,
    DEFAULT_SMOOTHING,
};
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default minimum improvement per compound token for another epoch.
pub const DEFAULT_FINISH_THRESHOLD: f64 = 0.005;

/// How an epoch re-analyses a compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingAlgorithm {
    /// Cheapest segmentation from the Viterbi search
    #[default]
    Viterbi,
    /// Recursive binary splitting against the total cost
    Recursive,
    /// No epochs; analyses are stored flat, so only their counts are verified
    Flatten,
}

impl fmt::Display for TrainingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrainingAlgorithm::Viterbi => "viterbi",
            TrainingAlgorithm::Recursive => "recursive",
            TrainingAlgorithm::Flatten => "flatten",
        };
        f.write_str(name)
    }
}

impl FromStr for TrainingAlgorithm {
    type Err = MorphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "viterbi" => Ok(TrainingAlgorithm::Viterbi),
            "recursive" => Ok(TrainingAlgorithm::Recursive),
            "flatten" => Ok(TrainingAlgorithm::Flatten),
            other => Err(MorphError::InvalidConfig(format!(
                "unknown training algorithm '{}'",
                other
            ))),
        }
    }
}

/// Configuration for batch training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Re-analysis used in each epoch
    #[serde(default)]
    pub algorithm: TrainingAlgorithm,
    /// Minimum cost improvement per compound token to keep going
    pub finish_threshold: f64,
    /// Upper bound on the number of epochs
    pub max_epochs: Option<usize>,
    /// Additive smoothing for the Viterbi search
    pub smoothing: f64,
    /// Maximum piece length per side
    pub max_len: usize,
    /// Re-segment against a per-epoch snapshot on the rayon pool
    pub parallel: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            algorithm: TrainingAlgorithm::default(),
            finish_threshold: DEFAULT_FINISH_THRESHOLD,
            max_epochs: None,
            smoothing: DEFAULT_SMOOTHING,
            max_len: DEFAULT_MAX_LEN,
            parallel: false,
        }
    }
}

impl TrainingConfig {
    pub fn builder() -> TrainingConfigBuilder {
        TrainingConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.finish_threshold.is_finite() || self.finish_threshold < 0.0 {
            return Err(MorphError::InvalidConfig(format!(
                "finish threshold must be finite and non-negative, got {}",
                self.finish_threshold
            )));
        }
        if self.max_epochs == Some(0) {
            return Err(MorphError::InvalidConfig(
                "max epochs must be at least 1".to_string(),
            ));
        }
        if self.parallel && self.algorithm != TrainingAlgorithm::Viterbi {
            return Err(MorphError::InvalidConfig(format!(
                "parallel epochs need the viterbi algorithm, not {}",
                self.algorithm
            )));
        }
        ViterbiSegmenter::new(self.smoothing, self.max_len).map(|_| ())
    }

    pub fn segmenter(&self) -> Result<ViterbiSegmenter> {
        ViterbiSegmenter::new(self.smoothing, self.max_len)
    }
}

/// Builder for [`TrainingConfig`].
#[derive(Debug, Clone, Default)]
pub struct TrainingConfigBuilder {
    config: TrainingConfig,
}

impl TrainingConfigBuilder {
    pub fn algorithm(mut self, algorithm: TrainingAlgorithm) -> Self {
        self.config.algorithm = algorithm;
        self
    }

    pub fn finish_threshold(mut self, threshold: f64) -> Self {
        self.config.finish_threshold = threshold;
        self
    }

    pub fn max_epochs(mut self, epochs: usize) -> Self {
        self.config.max_epochs = Some(epochs);
        self
    }

    pub fn smoothing(mut self, smoothing: f64) -> Self {
        self.config.smoothing = smoothing;
        self
    }

    pub fn max_len(mut self, max_len: usize) -> Self {
        self.config.max_len = max_len;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    pub fn build(self) -> Result<TrainingConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Why training stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Improvement fell below the finish threshold
    Converged,
    /// The epoch cap was reached
    MaxEpochs,
    /// Nothing to train on
    EmptyCorpus,
    /// Analyses were verified without training
    Flattened,
}

/// Summary of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub epochs: usize,
    pub initial_cost: f64,
    pub final_cost: f64,
    pub stop_reason: StopReason,
}

/// Batch trainer.
#[derive(Debug, Clone)]
pub struct BatchTrainer {
    /// Configuration
    config: TrainingConfig,
    /// Search used for every re-segmentation
    segmenter: ViterbiSegmenter,
}

impl BatchTrainer {
    pub fn new(config: TrainingConfig) -> Result<Self> {
        let segmenter = config.segmenter()?;
        config.validate()?;
        Ok(Self { config, segmenter })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train until convergence or the epoch cap.
    ///
    /// A caller stopping between epochs always finds `state` consistent; an
    /// error inside an epoch leaves every compound with a valid analysis.
    pub fn train<C: Construction>(
        &self,
        state: &mut SegmentationState<C>,
    ) -> Result<TrainingReport> {
        let initial_cost = state.cost()?;
        if state.is_empty() {
            return Ok(TrainingReport {
                epochs: 0,
                initial_cost,
                final_cost: initial_cost,
                stop_reason: StopReason::EmptyCorpus,
            });
        }

        info!(
            "Compounds in training data: {} types / {} tokens",
            state.len(),
            state.compound_tokens()
        );
        if self.config.algorithm == TrainingAlgorithm::Flatten {
            info!("Flattening analyses");
            state.check_consistency()?;
            return Ok(TrainingReport {
                epochs: 0,
                initial_cost,
                final_cost: initial_cost,
                stop_reason: StopReason::Flattened,
            });
        }
        info!("Starting batch training ({})", self.config.algorithm);

        let mut epochs = 0;
        let mut new_cost = initial_cost;
        let stop_reason = loop {
            let changed = self.run_epoch(state)?;
            epochs += 1;

            let old_cost = new_cost;
            new_cost = state.cost()?;
            info!("Epochs: {}\tCost: {}", epochs, new_cost);
            debug!("{} analyses changed in epoch {}", changed, epochs);

            let tolerance =
                self.config.finish_threshold * state.cost_model().compound_tokens() as f64;
            if new_cost >= old_cost - tolerance {
                break StopReason::Converged;
            }
            if self.config.max_epochs.is_some_and(|max| epochs >= max) {
                break StopReason::MaxEpochs;
            }
        };
        info!("Done ({:?})", stop_reason);

        Ok(TrainingReport {
            epochs,
            initial_cost,
            final_cost: new_cost,
            stop_reason,
        })
    }

    /// Re-analyse every compound once. Returns how many analyses changed.
    pub fn run_epoch<C: Construction>(&self, state: &mut SegmentationState<C>) -> Result<usize> {
        match self.config.algorithm {
            TrainingAlgorithm::Viterbi if self.config.parallel => self.run_sharded_epoch(state),
            TrainingAlgorithm::Viterbi => {
                let mut changed = 0;
                for idx in 0..state.len() {
                    if state.resegment(idx, &self.segmenter)? {
                        changed += 1;
                    }
                }
                Ok(changed)
            }
            TrainingAlgorithm::Recursive => {
                let mut changed = 0;
                for idx in 0..state.len() {
                    if state.resplit(idx)? {
                        changed += 1;
                    }
                }
                Ok(changed)
            }
            TrainingAlgorithm::Flatten => Ok(0),
        }
    }

    /// Segment all compounds against a snapshot taken at the epoch start,
    /// then apply the new analyses with a single writer.
    fn run_sharded_epoch<C: Construction>(
        &self,
        state: &mut SegmentationState<C>,
    ) -> Result<usize> {
        let snapshot = state.cost_model().clone();
        let segmenter = &self.segmenter;
        let proposals: Vec<Result<Vec<C>>> = state
            .analyses()
            .par_iter()
            .map(|analysis| {
                segmenter
                    .segment(&analysis.compound, &snapshot)
                    .map(|s| s.constructions)
            })
            .collect();

        let mut changed = 0;
        for (idx, proposal) in proposals.into_iter().enumerate() {
            let parts = proposal?;
            if parts != state.analyses()[idx].parts {
                state.set_parts(idx, parts)?;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogmorph_core::{Baseline, Cognate, CostWeights, DataPoint, Side};

    fn baseline_state(words: &[(&str, u64)]) -> SegmentationState<Baseline> {
        let mut st = SegmentationState::with_weights(&CostWeights::default()).unwrap();
        for &(w, n) in words {
            st.add_data(DataPoint::new(n, Baseline::new(w))).unwrap();
        }
        st
    }

    #[test]
    fn test_config_validation() {
        assert!(TrainingConfig::builder().max_epochs(0).build().is_err());
        assert!(TrainingConfig::builder().smoothing(-1.0).build().is_err());
        assert!(TrainingConfig::builder().max_len(0).build().is_err());
        assert!(TrainingConfig::builder()
            .finish_threshold(f64::NAN)
            .build()
            .is_err());
        let config = TrainingConfig::builder().max_epochs(3).build().unwrap();
        assert_eq!(config.max_epochs, Some(3));
    }

    #[test]
    fn test_empty_corpus() {
        let mut st = baseline_state(&[]);
        let trainer = BatchTrainer::new(TrainingConfig::default()).unwrap();
        let report = trainer.train(&mut st).unwrap();
        assert_eq!(report.epochs, 0);
        assert_eq!(report.stop_reason, StopReason::EmptyCorpus);
    }

    #[test]
    fn test_training_does_not_increase_cost() {
        let mut st = baseline_state(&[
            ("walking", 4),
            ("talking", 3),
            ("walked", 2),
            ("talked", 2),
            ("walks", 1),
        ]);
        let trainer = BatchTrainer::new(TrainingConfig::default()).unwrap();
        let report = trainer.train(&mut st).unwrap();
        assert!(report.epochs >= 1);
        assert!(report.final_cost.is_finite());
        st.check_consistency().unwrap();
        for a in st.analyses() {
            assert_eq!(Baseline::concat(&a.parts).unwrap(), a.compound);
        }
    }

    #[test]
    fn test_max_epochs_cap() {
        let mut st = baseline_state(&[("unbelievable", 3), ("believe", 2)]);
        let config = TrainingConfig::builder()
            .max_epochs(1)
            .finish_threshold(0.0)
            .build()
            .unwrap();
        let report = BatchTrainer::new(config).unwrap().train(&mut st).unwrap();
        assert_eq!(report.epochs, 1);
    }

    #[test]
    fn test_single_compound_idempotent() {
        let mut st = baseline_state(&[("unbelievable", 5)]);
        let trainer = BatchTrainer::new(TrainingConfig::default()).unwrap();
        trainer.train(&mut st).unwrap();
        let first = st.analyses()[0].parts.clone();
        let cost = st.cost().unwrap();
        trainer.train(&mut st).unwrap();
        assert_eq!(st.analyses()[0].parts, first);
        assert!((st.cost().unwrap() - cost).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_epoch_consistent() {
        let mut st = baseline_state(&[("walking", 4), ("talking", 3), ("walked", 2)]);
        let config = TrainingConfig::builder().parallel(true).build().unwrap();
        BatchTrainer::new(config).unwrap().train(&mut st).unwrap();
        st.check_consistency().unwrap();
    }

    #[test]
    fn test_algorithm_parse() {
        for algorithm in [
            TrainingAlgorithm::Viterbi,
            TrainingAlgorithm::Recursive,
            TrainingAlgorithm::Flatten,
        ] {
            assert_eq!(
                algorithm.to_string().parse::<TrainingAlgorithm>().unwrap(),
                algorithm
            );
        }
        assert!("random".parse::<TrainingAlgorithm>().is_err());
        assert_eq!(TrainingConfig::default().algorithm, TrainingAlgorithm::Viterbi);
    }

    #[test]
    fn test_parallel_needs_viterbi() {
        let err = TrainingConfig::builder()
            .parallel(true)
            .algorithm(TrainingAlgorithm::Recursive)
            .build()
            .unwrap_err();
        assert!(matches!(err, MorphError::InvalidConfig(_)));
    }

    #[test]
    fn test_recursive_training_consistent() {
        let mut st = baseline_state(&[
            ("walking", 4),
            ("talking", 3),
            ("walked", 2),
            ("talked", 2),
            ("walks", 1),
        ]);
        let initial = st.cost().unwrap();
        let config = TrainingConfig::builder()
            .algorithm(TrainingAlgorithm::Recursive)
            .max_epochs(1)
            .build()
            .unwrap();
        let report = BatchTrainer::new(config).unwrap().train(&mut st).unwrap();
        assert_eq!(report.epochs, 1);
        assert!(report.final_cost <= initial + 1e-9);
        st.check_consistency().unwrap();
        for a in st.analyses() {
            assert_eq!(Baseline::concat(&a.parts).unwrap(), a.compound);
        }

        let config = TrainingConfig::builder()
            .algorithm(TrainingAlgorithm::Recursive)
            .build()
            .unwrap();
        BatchTrainer::new(config).unwrap().train(&mut st).unwrap();
        st.check_consistency().unwrap();
    }

    #[test]
    fn test_recursive_cognate_training_keeps_wildcards_in_step() {
        let mut st: SegmentationState<Cognate> =
            SegmentationState::with_weights(&CostWeights::default()).unwrap();
        for (src, trg, n) in [
            ("walking", "marche", 3),
            ("walking", "", 1),
            ("", "marche", 2),
            ("talking", "parle", 2),
        ] {
            st.add_data(DataPoint::new(n, Cognate::compound(src, trg).unwrap()))
                .unwrap();
        }
        let config = TrainingConfig::builder()
            .algorithm(TrainingAlgorithm::Recursive)
            .build()
            .unwrap();
        BatchTrainer::new(config).unwrap().train(&mut st).unwrap();
        st.check_consistency().unwrap();
        for a in st.analyses() {
            assert_eq!(Cognate::concat(&a.parts).unwrap(), a.compound);
        }

        // a pair is re-analysed last here, so its one-sided cognates follow it
        let pair = st.position(&Cognate::compound("walking", "marche").unwrap()).unwrap();
        st.resplit(pair).unwrap();
        let pair_parts = &st.analyses()[pair].parts;
        let src_only = st.get(&Cognate::compound("walking", "").unwrap()).unwrap();
        let trg_only = st.get(&Cognate::compound("", "marche").unwrap()).unwrap();
        let sides = |parts: &[Cognate], pick: fn(&Cognate) -> &Side| -> Vec<String> {
            parts.iter().map(|p| pick(p).as_str().to_string()).collect()
        };
        assert_eq!(sides(&src_only.parts, Cognate::src), sides(pair_parts, Cognate::src));
        assert_eq!(sides(&trg_only.parts, Cognate::trg), sides(pair_parts, Cognate::trg));
        assert!(src_only.parts.iter().all(|p| p.trg().is_wildcard()));
        assert!(trg_only.parts.iter().all(|p| p.src().is_wildcard()));
        st.check_consistency().unwrap();
    }

    #[test]
    fn test_flatten_only_verifies() {
        let mut st = baseline_state(&[("walking", 2), ("talking", 1)]);
        let before = st.analyses().to_vec();
        let config = TrainingConfig::builder()
            .algorithm(TrainingAlgorithm::Flatten)
            .build()
            .unwrap();
        let report = BatchTrainer::new(config).unwrap().train(&mut st).unwrap();
        assert_eq!(report.stop_reason, StopReason::Flattened);
        assert_eq!(report.epochs, 0);
        assert_eq!(st.analyses(), before.as_slice());
    }

    #[test]
    fn test_cognate_training_records_edits() {
        let mut st: SegmentationState<Cognate> = SegmentationState::with_weights(&CostWeights {
            edit_weight: 10.0,
            ..Default::default()
        })
        .unwrap();
        st.add_data(DataPoint::new(3, Cognate::compound("walking", "marche").unwrap()))
            .unwrap();
        st.add_data(DataPoint::new(1, Cognate::compound("talking", "").unwrap()))
            .unwrap();
        let trainer = BatchTrainer::new(TrainingConfig::default()).unwrap();
        trainer.train(&mut st).unwrap();
        st.check_consistency().unwrap();
        assert!(!st.cost_model().edit_model().is_empty());
        for a in st.analyses() {
            assert_eq!(Cognate::concat(&a.parts).unwrap(), a.compound);
        }
    }
}
