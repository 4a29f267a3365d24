//! Corpus analyses and the cost model they are counted into.
//!
//! Every compound owns exactly one analysis. The cost model always holds
//! the counts of the current analyses: each change is applied as a delta,
//! removing the old pieces before adding the new ones.

use ahash::AHashMap;
use cogmorph_core::{
    Construction, CostModel, CostWeights, DataPoint, MorphError, Result, ViterbiSegmenter,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Current analysis of one compound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Analysis<C: Construction> {
    /// The undivided compound
    pub compound: C,
    /// Occurrences in the corpus
    pub count: u64,
    /// Pieces in order; they concatenate to `compound`
    pub parts: Vec<C>,
}

#[derive(Deserialize)]
#[serde(bound = "")]
struct StoredState<C: Construction> {
    cost: C::Cost,
    analyses: Vec<Analysis<C>>,
}

/// Cost model plus the analyses whose counts it holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "", from = "StoredState<C>")]
pub struct SegmentationState<C: Construction> {
    /// Cost model holding the counts of `analyses`
    cost: C::Cost,
    /// Analyses in corpus load order
    analyses: Vec<Analysis<C>>,
    /// Compound -> position in `analyses`
    #[serde(skip)]
    index: AHashMap<C, usize>,
}

impl<C: Construction> From<StoredState<C>> for SegmentationState<C> {
    fn from(stored: StoredState<C>) -> Self {
        let index = stored
            .analyses
            .iter()
            .enumerate()
            .map(|(i, a)| (a.compound.clone(), i))
            .collect();
        Self {
            cost: stored.cost,
            analyses: stored.analyses,
            index,
        }
    }
}

impl<C: Construction> SegmentationState<C> {
    /// Empty state around an existing cost model.
    pub fn new(cost: C::Cost) -> Self {
        Self {
            cost,
            analyses: Vec::new(),
            index: AHashMap::new(),
        }
    }

    pub fn with_weights(weights: &CostWeights) -> Result<Self> {
        Ok(Self::new(C::Cost::with_weights(weights)?))
    }

    /// Add a corpus entry, seeding its analysis from its split locations.
    ///
    /// A compound seen before accumulates the count and takes the new seed.
    /// Returns the position of the compound's analysis.
    pub fn add_data(&mut self, data: DataPoint<C>) -> Result<usize> {
        if data.count == 0 {
            return Err(MorphError::InvalidConstruction(format!(
                "compound '{}' has zero count",
                data.compound
            )));
        }
        let parts = data.initial_parts()?;
        let delta = data.count as i64;

        let idx = match self.index.get(&data.compound) {
            Some(&idx) => {
                self.count_parts(idx, -1)?;
                self.analyses[idx].count += data.count;
                self.analyses[idx].parts = parts;
                idx
            }
            None => {
                let idx = self.analyses.len();
                self.index.insert(data.compound.clone(), idx);
                self.analyses.push(Analysis {
                    compound: data.compound,
                    count: data.count,
                    parts,
                });
                idx
            }
        };
        self.cost
            .update_boundaries(&self.analyses[idx].compound, delta)?;
        self.count_parts(idx, 1)?;
        Ok(idx)
    }

    /// Add (`sign = 1`) or remove (`sign = -1`) the pieces of one analysis.
    fn count_parts(&mut self, idx: usize, sign: i64) -> Result<()> {
        let analysis = &self.analyses[idx];
        let delta = sign * analysis.count as i64;
        for part in &analysis.parts {
            self.cost.update(part, delta)?;
        }
        Ok(())
    }

    /// Replace the analysis at `idx`. The pieces must concatenate to the compound.
    pub fn set_parts(&mut self, idx: usize, parts: Vec<C>) -> Result<()> {
        let compound = &self.analyses[idx].compound;
        if C::concat(&parts)? != *compound {
            return Err(MorphError::InvalidConstruction(format!(
                "pieces do not concatenate to '{}'",
                compound
            )));
        }
        self.count_parts(idx, -1)?;
        self.analyses[idx].parts = parts;
        self.count_parts(idx, 1)
    }

    /// Re-segment one compound against the model without its own pieces.
    ///
    /// Returns true when the analysis changed. On a search failure the old
    /// analysis is restored before the error is returned.
    pub fn resegment(&mut self, idx: usize, segmenter: &ViterbiSegmenter) -> Result<bool> {
        self.count_parts(idx, -1)?;
        let result = segmenter.segment(&self.analyses[idx].compound, &self.cost);
        let segmentation = match result {
            Ok(s) => s,
            Err(err) => {
                self.count_parts(idx, 1)?;
                return Err(err);
            }
        };
        let changed = segmentation.constructions != self.analyses[idx].parts;
        if changed {
            debug!(
                "{} -> {}",
                self.analyses[idx].compound,
                cogmorph_core::render_parts(&segmentation.constructions)
            );
        }
        self.analyses[idx].parts = segmentation.constructions;
        self.count_parts(idx, 1)?;
        Ok(changed)
    }

    /// Re-analyse one compound by recursive binary splitting.
    ///
    /// Starting from the whole compound, each piece is split where the
    /// total cost is lowest, or kept whole when no split is cheaper, and
    /// both halves are treated the same way. A later location wins a tie,
    /// and so does a split over keeping the piece whole. Shadow compounds
    /// in the corpus (the one-sided cognates of a pair) are split in step
    /// with the compound. Returns true when the analysis changed; on an
    /// error every count is restored.
    pub fn resplit(&mut self, idx: usize) -> Result<bool> {
        let compound = self.analyses[idx].compound.clone();
        let mut members = vec![idx];
        members.extend(
            compound
                .shadows()
                .iter()
                .filter_map(|shadow| self.position(shadow)),
        );
        let root: Vec<(C, i64)> = members
            .iter()
            .map(|&m| (self.analyses[m].compound.clone(), self.analyses[m].count as i64))
            .collect();

        for &m in &members {
            self.count_parts(m, -1)?;
        }
        let mut journal = Vec::new();
        let mut leaves = Leaves::new(members.len());
        if let Err(err) = self.split_recursive(&root, &mut journal, &mut leaves) {
            for (piece, delta) in journal.into_iter().rev() {
                self.cost.update(&piece, -delta)?;
            }
            for &m in &members {
                self.count_parts(m, 1)?;
            }
            return Err(err);
        }

        let mut changed = false;
        for (&m, parts) in members.iter().zip(leaves.parts) {
            if parts != self.analyses[m].parts {
                if m == idx {
                    changed = true;
                }
                debug!(
                    "{} -> {}",
                    self.analyses[m].compound,
                    cogmorph_core::render_parts(&parts)
                );
            }
            self.analyses[m].parts = parts;
        }
        Ok(changed)
    }

    /// Decide the split of `pieces[0]`, carrying its shadows along.
    ///
    /// The chosen leaves stay counted in the cost model.
    fn split_recursive(
        &mut self,
        pieces: &[(C, i64)],
        journal: &mut Vec<(C, i64)>,
        leaves: &mut Leaves<C>,
    ) -> Result<()> {
        let Some((piece, _)) = pieces.first() else {
            return Ok(());
        };

        let mut min_cost = self.priced_with(pieces, journal)?;
        let mut best = None;
        for loc in piece.split_locations() {
            let (prefix, suffix) = halves(pieces, loc)?;
            self.apply(&prefix, 1, journal)?;
            self.apply(&suffix, 1, journal)?;
            let cost = self.cost.cost();
            self.apply(&suffix, -1, journal)?;
            self.apply(&prefix, -1, journal)?;
            let cost = cost?;
            if cost <= min_cost {
                min_cost = cost;
                best = Some(loc);
            }
        }

        let loc = match best {
            Some(loc) => loc,
            None => {
                self.apply(pieces, 1, journal)?;
                leaves.push(pieces);
                return Ok(());
            }
        };
        let (prefix, suffix) = halves(pieces, loc)?;
        if prefix == suffix {
            // identical halves share one analysis at twice the count
            let doubled: Vec<(C, i64)> = prefix.into_iter().map(|(c, n)| (c, 2 * n)).collect();
            let marks = leaves.marks();
            self.split_recursive(&doubled, journal, leaves)?;
            leaves.repeat_from(&marks);
            return Ok(());
        }
        self.apply(&suffix, 1, journal)?;
        self.split_recursive(&prefix, journal, leaves)?;
        self.apply(&suffix, -1, journal)?;
        self.split_recursive(&suffix, journal, leaves)
    }

    /// Total cost with `pieces` counted in.
    fn priced_with(&mut self, pieces: &[(C, i64)], journal: &mut Vec<(C, i64)>) -> Result<f64> {
        self.apply(pieces, 1, journal)?;
        let cost = self.cost.cost();
        self.apply(pieces, -1, journal)?;
        cost
    }

    fn apply(&mut self, pieces: &[(C, i64)], sign: i64, journal: &mut Vec<(C, i64)>) -> Result<()> {
        for (piece, count) in pieces {
            let delta = sign * count;
            self.cost.update(piece, delta)?;
            journal.push((piece.clone(), delta));
        }
        Ok(())
    }

    /// Reset every compound to a single piece.
    pub fn clear_segmentation(&mut self) -> Result<()> {
        for idx in 0..self.analyses.len() {
            let whole = vec![self.analyses[idx].compound.clone()];
            self.set_parts(idx, whole)?;
        }
        Ok(())
    }

    /// Forget the analyses but keep the counts they left in the cost model.
    pub fn drop_analyses(&mut self) {
        self.analyses.clear();
        self.index.clear();
    }

    /// Check that the lexicon equals the counts implied by the analyses.
    pub fn check_consistency(&self) -> Result<()> {
        let mut expected: AHashMap<&C, u64> = AHashMap::new();
        for analysis in &self.analyses {
            for part in &analysis.parts {
                *expected.entry(part).or_insert(0) += analysis.count;
            }
        }
        let actual = self.cost.constructions();
        if actual.len() != expected.len() {
            return Err(MorphError::CostModel(format!(
                "lexicon holds {} types, analyses imply {}",
                actual.len(),
                expected.len()
            )));
        }
        for (construction, count) in &actual {
            let want = expected.get(construction).copied().unwrap_or(0);
            if *count != want {
                return Err(MorphError::CostModel(format!(
                    "count of '{}' is {}, analyses imply {}",
                    construction, count, want
                )));
            }
        }
        Ok(())
    }

    pub fn analyses(&self) -> &[Analysis<C>] {
        &self.analyses
    }

    pub fn get(&self, compound: &C) -> Option<&Analysis<C>> {
        self.index.get(compound).map(|&idx| &self.analyses[idx])
    }

    pub fn position(&self, compound: &C) -> Option<usize> {
        self.index.get(compound).copied()
    }

    /// Number of distinct compounds.
    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }

    /// Sum of compound counts.
    pub fn compound_tokens(&self) -> u64 {
        self.analyses.iter().map(|a| a.count).sum()
    }

    pub fn cost_model(&self) -> &C::Cost {
        &self.cost
    }

    pub fn cost_model_mut(&mut self) -> &mut C::Cost {
        &mut self.cost
    }

    pub fn cost(&self) -> Result<f64> {
        self.cost.cost()
    }
}

/// Split every piece at `loc`, mapping it into each shadow's lattice.
fn halves<C: Construction>(
    pieces: &[(C, i64)],
    loc: C::Loc,
) -> Result<(Vec<(C, i64)>, Vec<(C, i64)>)> {
    let mut prefix = Vec::with_capacity(pieces.len());
    let mut suffix = Vec::with_capacity(pieces.len());
    if let Some((main, _)) = pieces.first() {
        for (k, (piece, count)) in pieces.iter().enumerate() {
            let at = if k == 0 { loc } else { main.shadow_loc(piece, loc) };
            let (left, right) = piece.split(at)?;
            prefix.push((left, *count));
            suffix.push((right, *count));
        }
    }
    Ok((prefix, suffix))
}

/// Leaves of a recursive split: the compound first, then its shadows.
struct Leaves<C> {
    parts: Vec<Vec<C>>,
}

impl<C: Clone> Leaves<C> {
    fn new(members: usize) -> Self {
        Self {
            parts: vec![Vec::new(); members],
        }
    }

    fn push(&mut self, pieces: &[(C, i64)]) {
        for (parts, (piece, _)) in self.parts.iter_mut().zip(pieces) {
            parts.push(piece.clone());
        }
    }

    fn marks(&self) -> Vec<usize> {
        self.parts.iter().map(Vec::len).collect()
    }

    /// Append a second copy of everything pushed since `marks`.
    fn repeat_from(&mut self, marks: &[usize]) {
        for (parts, &mark) in self.parts.iter_mut().zip(marks) {
            let tail = parts[mark..].to_vec();
            parts.extend(tail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogmorph_core::{Baseline, Cognate};

    fn state() -> SegmentationState<Baseline> {
        SegmentationState::with_weights(&CostWeights::default()).unwrap()
    }

    fn b(s: &str) -> Baseline {
        Baseline::new(s)
    }

    #[test]
    fn test_add_data_counts_parts() {
        let mut st = state();
        st.add_data(DataPoint::with_splitlocs(3, b("walking"), vec![4]))
            .unwrap();
        assert_eq!(st.cost_model().count(&b("walk")), 3);
        assert_eq!(st.cost_model().count(&b("ing")), 3);
        assert_eq!(st.cost_model().boundary_count(), 3);
        st.check_consistency().unwrap();
    }

    #[test]
    fn test_duplicate_compound_accumulates() {
        let mut st = state();
        st.add_data(DataPoint::new(2, b("walk"))).unwrap();
        st.add_data(DataPoint::new(3, b("walk"))).unwrap();
        assert_eq!(st.len(), 1);
        assert_eq!(st.get(&b("walk")).map(|a| a.count), Some(5));
        assert_eq!(st.compound_tokens(), 5);
        assert_eq!(st.cost_model().boundary_count(), 5);
        st.check_consistency().unwrap();
    }

    #[test]
    fn test_zero_count_rejected() {
        let mut st = state();
        assert!(st.add_data(DataPoint::new(0, b("walk"))).is_err());
    }

    #[test]
    fn test_set_parts_requires_concatenation() {
        let mut st = state();
        let idx = st.add_data(DataPoint::new(1, b("walking"))).unwrap();
        assert!(st.set_parts(idx, vec![b("talk"), b("ing")]).is_err());
        st.set_parts(idx, vec![b("walk"), b("ing")]).unwrap();
        st.check_consistency().unwrap();
    }

    #[test]
    fn test_set_parts_inverse_restores_cost() {
        let mut st = state();
        st.add_data(DataPoint::new(2, b("talking"))).unwrap();
        let idx = st.add_data(DataPoint::new(1, b("walking"))).unwrap();
        let before = st.cost().unwrap();
        st.set_parts(idx, vec![b("walk"), b("ing")]).unwrap();
        st.set_parts(idx, vec![b("walking")]).unwrap();
        assert!((st.cost().unwrap() - before).abs() < 1e-9);
    }

    #[test]
    fn test_clear_segmentation() {
        let mut st = state();
        st.add_data(DataPoint::with_splitlocs(1, b("walking"), vec![4]))
            .unwrap();
        st.clear_segmentation().unwrap();
        assert_eq!(st.analyses()[0].parts, vec![b("walking")]);
        st.check_consistency().unwrap();
    }

    #[test]
    fn test_resegment_keeps_consistency() {
        let mut st = state();
        let idx = st.add_data(DataPoint::new(4, b("unbelievable"))).unwrap();
        st.add_data(DataPoint::new(2, b("believable"))).unwrap();
        st.resegment(idx, &ViterbiSegmenter::default()).unwrap();
        st.check_consistency().unwrap();
        let parts = &st.analyses()[idx].parts;
        assert_eq!(Baseline::concat(parts).unwrap(), b("unbelievable"));
    }

    #[test]
    fn test_resplit_keeps_consistency() {
        let mut st = state();
        st.add_data(DataPoint::new(3, b("walking"))).unwrap();
        st.add_data(DataPoint::new(3, b("talking"))).unwrap();
        let idx = st
            .add_data(DataPoint::with_splitlocs(1, b("walked"), vec![1, 2]))
            .unwrap();
        st.resplit(idx).unwrap();
        st.check_consistency().unwrap();
        assert_eq!(Baseline::concat(&st.analyses()[idx].parts).unwrap(), b("walked"));
        // a second pass over an unchanged model settles on the same analysis
        let parts = st.analyses()[idx].parts.clone();
        assert!(!st.resplit(idx).unwrap());
        assert_eq!(st.analyses()[idx].parts, parts);
    }

    #[test]
    fn test_failed_resegment_restores_counts() {
        let mut st: SegmentationState<Cognate> =
            SegmentationState::with_weights(&CostWeights::default()).unwrap();
        let idx = st
            .add_data(DataPoint::new(1, Cognate::compound("a", "abcdefg").unwrap()))
            .unwrap();
        let before = st.cost().unwrap();
        let tight = ViterbiSegmenter::new(1.0, 3).unwrap();
        assert!(st.resegment(idx, &tight).is_err());
        assert!((st.cost().unwrap() - before).abs() < 1e-9);
        st.check_consistency().unwrap();
    }

    #[test]
    fn test_json_round_trip_rebuilds_index() {
        let mut st = state();
        st.add_data(DataPoint::with_splitlocs(2, b("walking"), vec![4]))
            .unwrap();
        let json = serde_json::to_string(&st).unwrap();
        let back: SegmentationState<Baseline> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.position(&b("walking")), Some(0));
        assert!((back.cost().unwrap() - st.cost().unwrap()).abs() < 1e-9);
        back.check_consistency().unwrap();
    }
}
