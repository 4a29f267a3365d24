//! MDL cost accounting.
//!
//! A cost model tracks the lexicon of constructions in the current
//! segmentation of the corpus and prices it with a two-part code: a
//! lexicon code for spelling every construction type out of atoms, and a
//! corpus code for writing the corpus as references into the lexicon.
//! All mutation goes through count deltas, so removing exactly what was
//! added restores the previous cost.

pub mod cognate;
pub mod encoding;
pub mod lexicon;
pub mod mdl;

pub use cognate::CognateCost;
pub use encoding::{log_factorial, CorpusEncoding, LexiconEncoding};
pub use lexicon::Lexicon;
pub use mdl::MdlCost;

use crate::error::{MorphError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// A value usable as a lexicon key or code-book entry.
pub trait Symbol:
    Clone + Eq + Hash + Ord + fmt::Debug + Serialize + DeserializeOwned + Send + Sync
{
}

impl<T> Symbol for T where
    T: Clone + Eq + Hash + Ord + fmt::Debug + Serialize + DeserializeOwned + Send + Sync
{
}

/// A lexicon entry spelled out of atoms for the lexicon code.
pub trait Atoms: Symbol {
    type Atom: Symbol;

    fn atoms(&self) -> Vec<Self::Atom>;
}

impl Atoms for compact_str::CompactString {
    type Atom = char;

    fn atoms(&self) -> Vec<char> {
        self.chars().collect()
    }
}

/// Corpus-code weights, one per side. Single-sided models use `src`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorpusWeight {
    /// Weight of the source (or only) side
    pub src: f64,
    /// Weight of the target side
    pub trg: f64,
}

impl CorpusWeight {
    pub fn uniform(weight: f64) -> Self {
        Self {
            src: weight,
            trg: weight,
        }
    }

    /// Reject weights that would make the corpus code meaningless.
    pub fn validate(&self) -> Result<()> {
        validate_corpus_weight(self.src)?;
        validate_corpus_weight(self.trg)
    }
}

impl Default for CorpusWeight {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl fmt::Display for CorpusWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.src == self.trg {
            write!(f, "{}", self.src)
        } else {
            write!(f, "{},{}", self.src, self.trg)
        }
    }
}

/// Parses `a` or `src,trg`.
impl FromStr for CorpusWeight {
    type Err = MorphError;

    fn from_str(s: &str) -> Result<Self> {
        let parse = |v: &str| {
            v.trim().parse::<f64>().map_err(|_| {
                MorphError::InvalidConfig(format!("invalid corpus weight '{}'", v.trim()))
            })
        };
        let weight = match s.split_once(',') {
            Some((src, trg)) => Self {
                src: parse(src)?,
                trg: parse(trg)?,
            },
            None => Self::uniform(parse(s)?),
        };
        weight.validate()?;
        Ok(weight)
    }
}

/// All weights a cost model is built with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostWeights {
    /// Corpus-code weights (`alpha`)
    pub corpus: CorpusWeight,
    /// Scale of the edit-cost model (`ew`), cognate models only
    pub edit_weight: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            corpus: CorpusWeight::default(),
            edit_weight: 1.0,
        }
    }
}

pub(crate) fn validate_corpus_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(MorphError::CostModel(format!(
            "corpus weight must be finite and positive, got {}",
            weight
        )));
    }
    Ok(())
}

pub(crate) fn validate_edit_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(MorphError::CostModel(format!(
            "edit weight must be finite and non-negative, got {}",
            weight
        )));
    }
    Ok(())
}

/// Drift allowed below zero before a total code length counts as negative.
pub const COST_TOLERANCE: f64 = 1e-6;

/// Fail on NaN or infinite code lengths.
pub(crate) fn check_finite(what: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MorphError::CostModel(format!("{} is not finite ({})", what, value)))
    }
}

/// Fail on a total code length that is not finite or is negative.
///
/// Incremental `c·ln c` sums drift slightly; values within
/// [`COST_TOLERANCE`] below zero are clamped to zero.
pub(crate) fn check_total(what: &str, value: f64) -> Result<f64> {
    let value = check_finite(what, value)?;
    if value < -COST_TOLERANCE {
        return Err(MorphError::CostModel(format!("{} is negative ({})", what, value)));
    }
    Ok(value.max(0.0))
}

/// Cost accountant for one construction kind.
///
/// `update` and `update_boundaries` are the only mutators; every other
/// method is a pure read used by the segmenter.
pub trait CostModel<C>: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync {
    /// Empty model with the given weights.
    fn with_weights(weights: &CostWeights) -> Result<Self>;

    /// Change the count of `construction` by `delta`.
    fn update(&mut self, construction: &C, delta: i64) -> Result<()>;

    /// Change the number of compound tokens (corpus boundaries) by `delta`.
    fn update_boundaries(&mut self, compound: &C, delta: i64) -> Result<()>;

    /// Current count of `construction` as seen by the segmenter.
    fn construction_count(&self, construction: &C) -> u64;

    /// Total code length of lexicon and corpus.
    fn cost(&self) -> Result<f64>;

    /// Construction tokens in the corpus.
    fn tokens(&self) -> u64;

    /// Compound tokens (boundaries) in the corpus.
    fn compound_tokens(&self) -> u64;

    fn all_tokens(&self) -> u64 {
        self.tokens() + self.compound_tokens()
    }

    /// Distinct constructions in the lexicon.
    fn types(&self) -> usize;

    /// Extra cost of adding `count` construction boundaries to the lexicon.
    fn newbound_cost(&self, count: f64) -> Result<f64>;

    /// Cost of an out-of-lexicon atom of `compound`.
    fn bad_likelihood(&self, compound: &C, addcount: f64) -> Result<f64>;

    /// Lexicon coding length of a new construction.
    fn coding_cost(&self, construction: &C) -> Result<f64>;

    /// Extra cost of a piece beyond its lexicon and corpus terms.
    fn alignment_cost(&self, _construction: &C, _addcount: f64) -> Result<f64> {
        Ok(0.0)
    }

    /// Lexicon contents, sorted by construction.
    fn constructions(&self) -> Vec<(C, u64)>;

    fn weights(&self) -> CostWeights;

    fn set_corpus_weight(&mut self, weight: CorpusWeight) -> Result<()>;

    fn set_edit_weight(&mut self, _weight: f64) -> Result<()> {
        Err(MorphError::InvalidConfig(
            "edit weight only applies to cognate models".to_string(),
        ))
    }
}

/// Per-search constants of the smoothed transition cost.
#[derive(Debug, Clone, Copy)]
pub struct Smoothing {
    /// Additive count floor
    pub addcount: f64,
    /// `ln(all_tokens + addcount)`, or 0 on an empty model
    pub logtokens: f64,
    /// Boundary cost of one new lexicon entry
    pub newbound: f64,
    /// True when the model holds no construction tokens yet
    pub empty: bool,
}

impl Smoothing {
    pub fn new(addcount: f64, all_tokens: u64, tokens: u64, newbound: f64) -> Self {
        let total = all_tokens as f64 + addcount;
        Self {
            addcount,
            logtokens: if total > 0.0 { total.ln() } else { 0.0 },
            newbound: if addcount > 0.0 { newbound } else { 0.0 },
            empty: tokens == 0,
        }
    }

    /// Cost of a piece seen `count` times.
    ///
    /// `None` means the piece is unknown and smoothing is off; the caller
    /// decides whether an atom penalty applies.
    pub fn piece_cost(
        &self,
        count: u64,
        coding: impl FnOnce() -> Result<f64>,
    ) -> Result<Option<f64>> {
        let a = self.addcount;
        if count > 0 {
            return Ok(Some(self.logtokens - (count as f64 + a).ln()));
        }
        if a > 0.0 {
            let base = if self.empty {
                a * a.ln()
            } else {
                self.logtokens - a.ln()
            };
            return Ok(Some(base + self.newbound + coding()?));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_weight_parse() {
        let w: CorpusWeight = "0.5".parse().unwrap();
        assert_eq!(w, CorpusWeight::uniform(0.5));
        let w: CorpusWeight = "1.0, 2.0".parse().unwrap();
        assert_eq!(w.src, 1.0);
        assert_eq!(w.trg, 2.0);
        assert_eq!(w.to_string(), "1,2");
    }

    #[test]
    fn test_corpus_weight_rejects_bad_values() {
        assert!("0".parse::<CorpusWeight>().is_err());
        assert!("-1".parse::<CorpusWeight>().is_err());
        assert!("abc".parse::<CorpusWeight>().is_err());
        assert!("inf".parse::<CorpusWeight>().is_err());
    }

    #[test]
    fn test_edit_weight_validation() {
        assert!(validate_edit_weight(0.0).is_ok());
        assert!(validate_edit_weight(-0.1).is_err());
        assert!(validate_edit_weight(f64::NAN).is_err());
    }

    #[test]
    fn test_check_total() {
        assert_eq!(check_total("cost", 3.5).unwrap(), 3.5);
        assert_eq!(check_total("cost", -1e-9).unwrap(), 0.0);
        assert!(matches!(
            check_total("cost", -0.5),
            Err(MorphError::CostModel(_))
        ));
        assert!(check_total("cost", f64::NAN).is_err());
        assert!(check_total("cost", f64::INFINITY).is_err());
    }

    #[test]
    fn test_smoothing_known_piece() {
        let s = Smoothing::new(1.0, 9, 5, 2.0);
        let cost = s.piece_cost(4, || Ok(100.0)).unwrap().unwrap();
        assert!((cost - (10f64.ln() - 5f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn test_smoothing_unknown_piece() {
        let s = Smoothing::new(1.0, 9, 5, 2.0);
        let cost = s.piece_cost(0, || Ok(3.0)).unwrap().unwrap();
        assert!((cost - (10f64.ln() + 2.0 + 3.0)).abs() < 1e-12);

        let empty = Smoothing::new(2.0, 0, 0, 1.0);
        let cost = empty.piece_cost(0, || Ok(0.5)).unwrap().unwrap();
        assert!((cost - (2.0 * 2f64.ln() + 1.0 + 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_no_smoothing_leaves_unknown_to_caller() {
        let s = Smoothing::new(0.0, 9, 5, 2.0);
        assert!(s.piece_cost(0, || Ok(1.0)).unwrap().is_none());
        assert_eq!(s.newbound, 0.0);
    }
}
