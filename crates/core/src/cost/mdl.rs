//! Single-lexicon MDL cost model.

use super::{
    check_finite, check_total, validate_corpus_weight, Atoms, CorpusEncoding, CorpusWeight,
    CostModel, CostWeights, Lexicon, LexiconEncoding, Smoothing,
};
use crate::error::{MorphError, Result};
use serde::{Deserialize, Serialize};

/// Lexicon plus its lexicon and corpus codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct MdlCost<K: Atoms> {
    /// Construction frequencies
    lexicon: Lexicon<K>,
    /// Code for the lexicon entries
    lexicon_coding: LexiconEncoding<K::Atom>,
    /// Code for the corpus
    corpus_coding: CorpusEncoding,
}

impl<K: Atoms> MdlCost<K> {
    pub fn new(corpus_weight: f64) -> Result<Self> {
        Ok(Self {
            lexicon: Lexicon::new(),
            lexicon_coding: LexiconEncoding::new(),
            corpus_coding: CorpusEncoding::new(corpus_weight)?,
        })
    }

    /// Change the count of `key` by `delta`.
    ///
    /// The first occurrence adds the entry to the lexicon code and the last
    /// removal takes it out again.
    pub fn update_count(&mut self, key: &K, delta: i64) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        let (old, new) = self.lexicon.update(key, delta)?;
        if old == 0 {
            self.lexicon_coding.add(&key.atoms());
        }
        self.corpus_coding.update_count(old, new);
        if new == 0 {
            self.lexicon_coding.remove(&key.atoms());
        }
        Ok(())
    }

    pub fn add_boundaries(&mut self, delta: i64) -> Result<()> {
        let new = self.corpus_coding.boundaries() as i64 + delta;
        if new < 0 {
            return Err(MorphError::CostModel(format!(
                "compound tokens would become negative ({} {:+})",
                self.corpus_coding.boundaries(),
                delta
            )));
        }
        self.corpus_coding.set_boundaries(new as u64);
        Ok(())
    }

    pub fn count(&self, key: &K) -> u64 {
        self.lexicon.count(key)
    }

    pub fn lexicon(&self) -> &Lexicon<K> {
        &self.lexicon
    }

    pub fn corpus_weight(&self) -> f64 {
        self.corpus_coding.weight()
    }

    pub fn set_weight(&mut self, weight: f64) -> Result<()> {
        self.corpus_coding.set_weight(weight)
    }

    pub fn lexicon_cost(&self) -> Result<f64> {
        self.lexicon_coding.cost()
    }

    pub fn corpus_cost(&self) -> Result<f64> {
        self.corpus_coding.cost(self.lexicon_coding.boundaries())
    }

    pub fn total_cost(&self) -> Result<f64> {
        check_total("total cost", self.lexicon_cost()? + self.corpus_cost()?)
    }

    pub fn token_count(&self) -> u64 {
        self.corpus_coding.tokens()
    }

    pub fn boundary_count(&self) -> u64 {
        self.corpus_coding.boundaries()
    }

    /// Cost of `count` additional lexicon boundaries.
    pub fn newbound(&self, count: f64) -> Result<f64> {
        let lb = self.lexicon_coding.boundaries() as f64;
        let total = lb + count;
        let mut cost = if total > 0.0 { total * total.ln() } else { 0.0 };
        if lb > 0.0 {
            cost -= lb * lb.ln();
        }
        check_finite("boundary cost", cost / self.corpus_coding.weight())
    }

    /// Penalty for an atom the lexicon has never seen.
    pub fn unknown_cost(&self, key: &K, addcount: f64) -> Result<f64> {
        let atoms = key.atoms();
        let (lt, nb) = if addcount > 0.0 {
            let all = (self.token_count() + self.boundary_count()) as f64;
            ((all + addcount).ln(), self.newbound(addcount)?)
        } else {
            (0.0, 0.0)
        };
        let cost = 1.0
            + atoms.len() as f64 * lt
            + nb
            + self.lexicon_coding.codelength(&atoms) / self.corpus_coding.weight();
        check_finite("unknown atom cost", cost)
    }

    /// Lexicon coding length of `key` in corpus-weight units.
    pub fn codelength(&self, key: &K) -> Result<f64> {
        check_finite(
            "coding cost",
            self.lexicon_coding.codelength(&key.atoms()) / self.corpus_coding.weight(),
        )
    }

    /// Transition constants for scoring pieces against this model.
    pub fn smoothing(&self, addcount: f64) -> Result<Smoothing> {
        let newbound = if addcount > 0.0 {
            self.newbound(addcount)?
        } else {
            0.0
        };
        Ok(Smoothing::new(
            addcount,
            self.token_count() + self.boundary_count(),
            self.token_count(),
            newbound,
        ))
    }

    /// Cost of emitting `key` once more, with unknown entries priced as new.
    pub fn marginal_cost(&self, key: &K, smoothing: &Smoothing) -> Result<f64> {
        match smoothing.piece_cost(self.count(key), || self.codelength(key))? {
            Some(cost) => Ok(cost),
            None => self.unknown_cost(key, 0.0),
        }
    }
}

impl<K: Atoms> CostModel<K> for MdlCost<K> {
    fn with_weights(weights: &CostWeights) -> Result<Self> {
        validate_corpus_weight(weights.corpus.src)?;
        Self::new(weights.corpus.src)
    }

    fn update(&mut self, construction: &K, delta: i64) -> Result<()> {
        self.update_count(construction, delta)
    }

    fn update_boundaries(&mut self, _compound: &K, delta: i64) -> Result<()> {
        self.add_boundaries(delta)
    }

    fn construction_count(&self, construction: &K) -> u64 {
        self.count(construction)
    }

    fn cost(&self) -> Result<f64> {
        self.total_cost()
    }

    fn tokens(&self) -> u64 {
        self.token_count()
    }

    fn compound_tokens(&self) -> u64 {
        self.boundary_count()
    }

    fn types(&self) -> usize {
        self.lexicon.len()
    }

    fn newbound_cost(&self, count: f64) -> Result<f64> {
        self.newbound(count)
    }

    fn bad_likelihood(&self, compound: &K, addcount: f64) -> Result<f64> {
        self.unknown_cost(compound, addcount)
    }

    fn coding_cost(&self, construction: &K) -> Result<f64> {
        self.codelength(construction)
    }

    fn constructions(&self) -> Vec<(K, u64)> {
        self.lexicon.sorted()
    }

    fn weights(&self) -> CostWeights {
        CostWeights {
            corpus: CorpusWeight::uniform(self.corpus_weight()),
            edit_weight: 0.0,
        }
    }

    fn set_corpus_weight(&mut self, weight: CorpusWeight) -> Result<()> {
        self.set_weight(weight.src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::Baseline;

    fn model() -> MdlCost<Baseline> {
        MdlCost::new(1.0).unwrap()
    }

    fn b(s: &str) -> Baseline {
        Baseline::new(s)
    }

    #[test]
    fn test_empty_model_costs_nothing() {
        assert_eq!(model().total_cost().unwrap(), 0.0);
    }

    #[test]
    fn test_add_remove_exact_inverse() {
        let mut cost = model();
        cost.add_boundaries(2).unwrap();
        cost.update_count(&b("walking"), 1).unwrap();
        cost.update_count(&b("talking"), 1).unwrap();
        let before = cost.total_cost().unwrap();

        cost.update_count(&b("walking"), -1).unwrap();
        cost.update_count(&b("walk"), 1).unwrap();
        cost.update_count(&b("ing"), 1).unwrap();
        assert!((cost.total_cost().unwrap() - before).abs() > 1e-6);

        cost.update_count(&b("ing"), -1).unwrap();
        cost.update_count(&b("walk"), -1).unwrap();
        cost.update_count(&b("walking"), 1).unwrap();
        assert!((cost.total_cost().unwrap() - before).abs() < 1e-9);
    }

    #[test]
    fn test_lexicon_counts_match_tokens() {
        let mut cost = model();
        cost.update_count(&b("un"), 2).unwrap();
        cost.update_count(&b("able"), 3).unwrap();
        cost.update_count(&b("un"), -2).unwrap();
        assert_eq!(cost.token_count(), 3);
        assert_eq!(cost.lexicon().tokens(), 3);
        assert_eq!(CostModel::<Baseline>::types(&cost), 1);
    }

    #[test]
    fn test_negative_boundaries_rejected() {
        let mut cost = model();
        assert!(cost.add_boundaries(-1).is_err());
    }

    #[test]
    fn test_zero_weight_rejected() {
        assert!(MdlCost::<Baseline>::new(0.0).is_err());
        let weights = CostWeights {
            corpus: CorpusWeight::uniform(-1.0),
            edit_weight: 1.0,
        };
        assert!(MdlCost::<Baseline>::with_weights(&weights).is_err());
    }

    #[test]
    fn test_higher_weight_prefers_fewer_tokens() {
        // Same corpus, two analyses: one long construction vs. two short ones.
        let score = |weight: f64, split: bool| {
            let mut cost = MdlCost::<Baseline>::new(weight).unwrap();
            cost.add_boundaries(10).unwrap();
            if split {
                cost.update_count(&b("walk"), 10).unwrap();
                cost.update_count(&b("ing"), 10).unwrap();
            } else {
                cost.update_count(&b("walking"), 10).unwrap();
            }
            cost.total_cost().unwrap()
        };
        let gap_low = score(0.1, true) - score(0.1, false);
        let gap_high = score(10.0, true) - score(10.0, false);
        assert!(gap_high > gap_low);
    }

    #[test]
    fn test_newbound_on_empty_lexicon() {
        let cost = model();
        let nb = cost.newbound(2.0).unwrap();
        assert!((nb - 2.0 * 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_marginal_cost_prefers_known() {
        let mut cost = model();
        cost.add_boundaries(1).unwrap();
        cost.update_count(&b("walk"), 5).unwrap();
        let s = cost.smoothing(1.0).unwrap();
        let known = cost.marginal_cost(&b("walk"), &s).unwrap();
        let unknown = cost.marginal_cost(&b("zzzz"), &s).unwrap();
        assert!(known < unknown);
    }
}
