//! cogmorph - unsupervised morphological segmentation
//!
//! This crate is the user-facing layer over `cogmorph-core` and
//! `cogmorph-training`: it reads corpora, trains and persists models, and
//! segments new words with them.
//!
//! # Features
//!
//! - Plain word, grapheme/phoneme and cognate-pair models
//! - Builder-style configuration of weights, smoothing and training
//! - Binary and JSON model files
//! - Segmentation cache for running text
//! - Corpus tools for cognate data (segmentation maps, list merging)
//!
//! # Example
//!
//! ```rust
//! use cogmorph::{Baseline, Construction, DataPoint, ModelBuilder};
//!
//! let mut model = ModelBuilder::new().build::<Baseline>()?;
//! model.load_data(vec![
//!     DataPoint::new(4, Baseline::new("walking")),
//!     DataPoint::new(3, Baseline::new("talking")),
//!     DataPoint::new(2, Baseline::new("walked")),
//! ])?;
//! model.train_batch()?;
//!
//! let parts = model.segment(&Baseline::new("talked"))?;
//! assert_eq!(Baseline::concat(&parts)?, Baseline::new("talked"));
//! # Ok::<(), cogmorph::MorphError>(())
//! ```

// Re-export core types
pub use cogmorph_core::{
    Baseline, Cognate, Construction, ConstructionKind, CorpusWeight, CostWeights, DataPoint,
    EditKind, EditOp, MorphError, Parallel, Result, Side,
};
pub use cogmorph_training::{
    Analysis, StopReason, TrainingAlgorithm, TrainingConfig, TrainingReport,
};

// Model API
pub mod model;
pub use model::{AnyModel, Model, ModelBuilder, ModelConfig, ModelParams};

// IO
pub mod io;
pub use io::{CorpusFormat, ModelFormat, ModelLoader, ModelSaver};

pub mod normalize;
pub use normalize::{NormalizationForm, Normalizer};

pub mod cache;
pub use cache::{CacheStats, SegmentationCache};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
