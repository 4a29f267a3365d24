//! cogmorph-core - constructions, cost models and Viterbi segmentation
//!
//! This crate holds the algorithmic core of cogmorph: the construction
//! kinds a model can segment, the two-part MDL code that scores a
//! segmentation, and the dynamic-programming search that finds the
//! cheapest segmentation of a compound under the current model.
//!
//! # Features
//!
//! - Plain, grapheme/phoneme and cognate-pair constructions behind one trait
//! - Incremental lexicon and corpus code lengths with exact add/remove
//! - Edit-operation cost between the two sides of a cognate
//! - Deterministic Viterbi segmentation with additive smoothing
//!
//! # Example
//!
//! ```rust
//! use cogmorph_core::{Baseline, CostModel, CostWeights, MdlCost, ViterbiSegmenter};
//!
//! let mut cost = MdlCost::<Baseline>::with_weights(&CostWeights::default()).unwrap();
//! let word = Baseline::new("walking");
//! cost.update_boundaries(&word, 1).unwrap();
//! cost.update(&word, 1).unwrap();
//!
//! let seg = ViterbiSegmenter::default().segment(&word, &cost).unwrap();
//! assert_eq!(seg.constructions, vec![word]);
//! ```

pub mod error;
pub use error::{MorphError, Result};

pub mod construction;
pub use construction::{
    render_parts, Baseline, Cognate, Construction, ConstructionKind, Parallel, Side, BOUNDARY,
    DELIM, PIECE_SEPARATOR,
};

pub mod corpus;
pub use corpus::DataPoint;

pub mod cost;
pub use cost::{
    Atoms, CognateCost, CorpusWeight, CostModel, CostWeights, Lexicon, MdlCost, Smoothing, Symbol,
};

pub mod edit;
pub use edit::{edit_ops, EditCostModel, EditKind, EditOp};

pub mod viterbi;
pub use viterbi::{Segmentation, ViterbiSegmenter, DEFAULT_MAX_LEN, DEFAULT_SMOOTHING};
