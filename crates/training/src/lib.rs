//! cogmorph-training - batch training for segmentation models
//!
//! This crate keeps the current analysis of every compound in the corpus
//! together with the cost model that counts them, and trains it by
//! repeated Viterbi re-segmentation or recursive binary splitting.
//!
//! # Features
//!
//! - Delta updates only: the cost model is never rebuilt from scratch
//! - Optional sharded epochs on the rayon pool
//! - Most-common reports over any frequency table
//!
//! # Example
//!
//! ```rust
//! use cogmorph_core::{Baseline, CostWeights, DataPoint};
//! use cogmorph_training::{BatchTrainer, SegmentationState, TrainingConfig};
//!
//! let mut state = SegmentationState::<Baseline>::with_weights(&CostWeights::default()).unwrap();
//! state.add_data(DataPoint::new(3, Baseline::new("walking"))).unwrap();
//! state.add_data(DataPoint::new(2, Baseline::new("talking"))).unwrap();
//!
//! let trainer = BatchTrainer::new(TrainingConfig::default()).unwrap();
//! let report = trainer.train(&mut state).unwrap();
//! assert!(report.epochs >= 1);
//! ```

pub use cogmorph_core::{MorphError, Result};

pub mod training;
pub use training::{
    most_common, Analysis, BatchTrainer, FrequencyQueue, SegmentationState, StopReason,
    TrainingAlgorithm, TrainingConfig, TrainingConfigBuilder, TrainingReport,
    DEFAULT_FINISH_THRESHOLD,
};
