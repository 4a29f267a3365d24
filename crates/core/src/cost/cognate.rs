//! Composite cost model for cognate pairs.
//!
//! Source and target sides each keep an independent lexicon and code. The
//! pair lexicon only answers count queries for pieces with both sides
//! present; one-sided pieces are counted through their side's lexicon, so
//! `walk` seen in a pair also counts as a known `walk` on its own.

use super::{
    check_total, validate_corpus_weight, CorpusWeight, CostModel, CostWeights, Lexicon, MdlCost,
};
use crate::construction::{Cognate, Side};
use crate::edit::EditCostModel;
use crate::error::Result;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Cost of a cognate segmentation: `src + trg + ew * edits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CognateCost {
    /// Pair frequencies, including one-sided pieces
    pairs: Lexicon<Cognate>,
    /// Source-side model
    src: MdlCost<CompactString>,
    /// Target-side model
    trg: MdlCost<CompactString>,
    /// Edit operations between aligned pieces
    edits: EditCostModel,
}

impl CognateCost {
    pub fn new(corpus_weight: CorpusWeight, edit_weight: f64) -> Result<Self> {
        corpus_weight.validate()?;
        Ok(Self {
            pairs: Lexicon::new(),
            src: MdlCost::new(corpus_weight.src)?,
            trg: MdlCost::new(corpus_weight.trg)?,
            edits: EditCostModel::new(edit_weight)?,
        })
    }

    pub fn src_model(&self) -> &MdlCost<CompactString> {
        &self.src
    }

    pub fn trg_model(&self) -> &MdlCost<CompactString> {
        &self.trg
    }

    pub fn edit_model(&self) -> &EditCostModel {
        &self.edits
    }

    /// Apply `f` to the model of each present side.
    fn each_side<T>(
        &self,
        c: &Cognate,
        mut f: impl FnMut(&MdlCost<CompactString>, &CompactString) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut out = Vec::with_capacity(2);
        if let Side::Form(s) = c.src() {
            out.push(f(&self.src, s)?);
        }
        if let Side::Form(t) = c.trg() {
            out.push(f(&self.trg, t)?);
        }
        Ok(out)
    }
}

impl CostModel<Cognate> for CognateCost {
    fn with_weights(weights: &CostWeights) -> Result<Self> {
        Self::new(weights.corpus, weights.edit_weight)
    }

    fn update(&mut self, construction: &Cognate, delta: i64) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        self.pairs.update(construction, delta)?;
        if let Side::Form(s) = construction.src() {
            self.src.update_count(s, delta)?;
        }
        if let Side::Form(t) = construction.trg() {
            self.trg.update_count(t, delta)?;
        }
        if let (Side::Form(s), Side::Form(t)) = (construction.src(), construction.trg()) {
            self.edits.record(s, t, delta)?;
        }
        Ok(())
    }

    fn update_boundaries(&mut self, compound: &Cognate, delta: i64) -> Result<()> {
        if !compound.src().is_wildcard() {
            self.src.add_boundaries(delta)?;
        }
        if !compound.trg().is_wildcard() {
            self.trg.add_boundaries(delta)?;
        }
        if compound.is_pair() {
            self.edits.add_boundaries(delta)?;
        }
        Ok(())
    }

    fn construction_count(&self, construction: &Cognate) -> u64 {
        match (construction.src(), construction.trg()) {
            (Side::Wildcard, Side::Form(t)) => self.trg.count(t),
            (Side::Form(s), Side::Wildcard) => self.src.count(s),
            _ => self.pairs.count(construction),
        }
    }

    fn cost(&self) -> Result<f64> {
        let total = self.src.total_cost()? + self.trg.total_cost()? + self.edits.cost()?;
        check_total("cognate cost", total)
    }

    fn tokens(&self) -> u64 {
        self.src.token_count() + self.trg.token_count()
    }

    fn compound_tokens(&self) -> u64 {
        self.src.boundary_count() + self.trg.boundary_count()
    }

    fn types(&self) -> usize {
        self.pairs.len()
    }

    fn newbound_cost(&self, count: f64) -> Result<f64> {
        Ok(self.src.newbound(count)? + self.trg.newbound(count)?)
    }

    fn bad_likelihood(&self, compound: &Cognate, addcount: f64) -> Result<f64> {
        let parts = self.each_side(compound, |model, side| model.unknown_cost(side, addcount))?;
        Ok(parts.into_iter().sum())
    }

    fn coding_cost(&self, construction: &Cognate) -> Result<f64> {
        let parts = self.each_side(construction, |model, side| model.codelength(side))?;
        Ok(parts.into_iter().sum())
    }

    fn alignment_cost(&self, construction: &Cognate, addcount: f64) -> Result<f64> {
        match (construction.src(), construction.trg()) {
            (Side::Form(s), Side::Form(t)) => self.edits.alignment_cost(s, t, addcount),
            _ => Ok(0.0),
        }
    }

    fn constructions(&self) -> Vec<(Cognate, u64)> {
        self.pairs.sorted()
    }

    fn weights(&self) -> CostWeights {
        CostWeights {
            corpus: CorpusWeight {
                src: self.src.corpus_weight(),
                trg: self.trg.corpus_weight(),
            },
            edit_weight: self.edits.weight(),
        }
    }

    fn set_corpus_weight(&mut self, weight: CorpusWeight) -> Result<()> {
        validate_corpus_weight(weight.src)?;
        validate_corpus_weight(weight.trg)?;
        self.src.set_weight(weight.src)?;
        self.trg.set_weight(weight.trg)
    }

    fn set_edit_weight(&mut self, weight: f64) -> Result<()> {
        self.edits.set_weight(weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(s: &str, t: &str) -> Cognate {
        Cognate::new(Side::new(s), Side::new(t)).unwrap()
    }

    fn model() -> CognateCost {
        CognateCost::new(CorpusWeight::uniform(1.0), 1.0).unwrap()
    }

    #[test]
    fn test_pair_updates_both_sides_and_edits() {
        let mut cost = model();
        let compound = Cognate::compound("walk", "marche").unwrap();
        cost.update_boundaries(&compound, 3).unwrap();
        cost.update(&compound, 3).unwrap();
        assert_eq!(cost.src_model().count(&"walk\u{2059}".into()), 3);
        assert_eq!(cost.trg_model().count(&"marche\u{2059}".into()), 3);
        assert!(!cost.edit_model().is_empty());
        assert_eq!(cost.compound_tokens(), 6);
    }

    #[test]
    fn test_wildcard_side_costs_nothing() {
        let mut cost = model();
        let compound = Cognate::compound("walking", "").unwrap();
        cost.update_boundaries(&compound, 2).unwrap();
        cost.update(&compound, 2).unwrap();
        assert_eq!(cost.trg_model().total_cost().unwrap(), 0.0);
        assert!(cost.edit_model().is_empty());
        assert!(cost.cost().unwrap() > 0.0);
    }

    #[test]
    fn test_one_sided_count_uses_side_lexicon() {
        let mut cost = model();
        cost.update(&pair("walk", "march"), 2).unwrap();
        assert_eq!(cost.construction_count(&pair("walk", "")), 2);
        assert_eq!(cost.construction_count(&pair("", "march")), 2);
        assert_eq!(cost.construction_count(&pair("walk", "marche")), 0);
    }

    #[test]
    fn test_add_remove_exact_inverse() {
        let mut cost = model();
        let compound = Cognate::compound("walking", "marche").unwrap();
        cost.update_boundaries(&compound, 1).unwrap();
        cost.update(&compound, 1).unwrap();
        let before = cost.cost().unwrap();

        let parts = [pair("walk", "march"), pair("ing\u{2059}", "e\u{2059}")];
        cost.update(&compound, -1).unwrap();
        for p in &parts {
            cost.update(p, 1).unwrap();
        }
        for p in &parts {
            cost.update(p, -1).unwrap();
        }
        cost.update(&compound, 1).unwrap();
        assert!((cost.cost().unwrap() - before).abs() < 1e-9);
    }

    #[test]
    fn test_edit_weight_changes_cost() {
        let mut cost = model();
        let compound = Cognate::compound("walking", "marche").unwrap();
        cost.update_boundaries(&compound, 1).unwrap();
        cost.update(&compound, 1).unwrap();
        let low = cost.cost().unwrap();
        cost.set_edit_weight(10.0).unwrap();
        assert!(cost.cost().unwrap() > low);
        assert_eq!(cost.weights().edit_weight, 10.0);
    }

    #[test]
    fn test_asymmetric_corpus_weights() {
        let cost = CognateCost::new(CorpusWeight { src: 0.5, trg: 2.0 }, 1.0).unwrap();
        let w = cost.weights();
        assert_eq!(w.corpus.src, 0.5);
        assert_eq!(w.corpus.trg, 2.0);
        assert!(CognateCost::new(CorpusWeight::uniform(0.0), 1.0).is_err());
    }
}
