//! Minimum-cost segmentation by dynamic programming.
//!
//! The search runs over the lattice of a compound: every location keeps the
//! cheapest path reaching it and a back-pointer to its predecessor. Each
//! piece is priced against the cost model as if it were added once more,
//! with `smoothing` as an additive count floor so unseen multi-atom pieces
//! remain possible.

use crate::construction::Construction;
use crate::cost::{CostModel, Smoothing};
use crate::error::{MorphError, Result};
use ahash::AHashMap;
use dary_heap::QuaternaryHeap;
use std::cmp::Ordering;

/// Default additive smoothing.
pub const DEFAULT_SMOOTHING: f64 = 1.0;

/// Default maximum piece length per side, in atoms.
pub const DEFAULT_MAX_LEN: usize = 30;

/// Result of a search: the pieces in order and the path cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation<C> {
    pub constructions: Vec<C>,
    pub cost: f64,
}

/// Viterbi search parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViterbiSegmenter {
    /// Additive count floor
    smoothing: f64,
    /// Maximum piece length per side
    max_len: usize,
}

impl ViterbiSegmenter {
    pub fn new(smoothing: f64, max_len: usize) -> Result<Self> {
        if !smoothing.is_finite() || smoothing < 0.0 {
            return Err(MorphError::InvalidConfig(format!(
                "smoothing must be finite and non-negative, got {}",
                smoothing
            )));
        }
        if max_len == 0 {
            return Err(MorphError::InvalidConfig(
                "maximum construction length must be at least 1".to_string(),
            ));
        }
        Ok(Self { smoothing, max_len })
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Find the cheapest segmentation of `compound` under `cost`.
    ///
    /// Predecessors are tried in ascending order and only a strictly
    /// cheaper path replaces the incumbent, so ties keep the longest final
    /// piece.
    pub fn segment<C: Construction>(
        &self,
        compound: &C,
        cost: &C::Cost,
    ) -> Result<Segmentation<C>> {
        let origin = check_nonempty(compound)?;
        let terminal = compound.terminal();
        let pricing = Pricing::new(compound, cost, self.smoothing)?;

        let mut grid: AHashMap<C::Loc, (f64, C::Loc)> = AHashMap::new();
        grid.insert(origin, (0.0, origin));

        for stop in compound.positions() {
            let mut best: Option<(f64, C::Loc)> = None;
            for start in compound.predecessors(stop, self.max_len) {
                let base = match grid.get(&start) {
                    Some(&(c, _)) => c,
                    None => continue,
                };
                let step = match pricing.step(&compound.slice(start, stop))? {
                    Some(step) => step,
                    None => continue,
                };
                let total = base + step;
                if best.map_or(true, |(b, _)| total < b) {
                    best = Some((total, start));
                }
            }
            if let Some(entry) = best {
                grid.insert(stop, entry);
            }
        }

        let (total, mut back) = match grid.get(&terminal) {
            Some(&entry) => entry,
            None => return Err(self.unreachable(compound)),
        };

        let mut splitlocs = Vec::new();
        while back != origin {
            splitlocs.push(back);
            back = match grid.get(&back) {
                Some(&(_, prev)) => prev,
                None => return Err(segmentation_error(compound, "broken back-pointer")),
            };
        }
        splitlocs.reverse();

        Ok(Segmentation {
            constructions: compound.splitn(&splitlocs)?,
            cost: total + pricing.boundary(),
        })
    }

    /// The `n` cheapest segmentations of `compound`, cheapest first.
    ///
    /// Every location keeps its `n` best partial paths. Candidates are
    /// ranked by cost and then by the order they are generated in, which
    /// follows the tie rule of [`Self::segment`]; the first result always
    /// equals the single best segmentation.
    pub fn segment_nbest<C: Construction>(
        &self,
        compound: &C,
        cost: &C::Cost,
        n: usize,
    ) -> Result<Vec<Segmentation<C>>> {
        if n == 0 {
            return Err(MorphError::InvalidConfig(
                "n-best search needs n of at least 1".to_string(),
            ));
        }
        let origin = check_nonempty(compound)?;
        let terminal = compound.terminal();
        let pricing = Pricing::new(compound, cost, self.smoothing)?;

        let mut grid: AHashMap<C::Loc, Vec<Candidate<C::Loc>>> = AHashMap::new();
        grid.insert(
            origin,
            vec![Candidate {
                cost: 0.0,
                seq: 0,
                start: origin,
                rank: 0,
            }],
        );

        for stop in compound.positions() {
            let mut heap: QuaternaryHeap<Candidate<C::Loc>> = QuaternaryHeap::with_capacity(n);
            let mut seq = 0;
            for start in compound.predecessors(stop, self.max_len) {
                let paths = match grid.get(&start) {
                    Some(paths) => paths,
                    None => continue,
                };
                let step = match pricing.step(&compound.slice(start, stop))? {
                    Some(step) => step,
                    None => continue,
                };
                for (rank, path) in paths.iter().enumerate() {
                    let candidate = Candidate {
                        cost: path.cost + step,
                        seq,
                        start,
                        rank,
                    };
                    seq += 1;
                    if heap.len() < n {
                        heap.push(candidate);
                    } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                        heap.pop();
                        heap.push(candidate);
                    } else {
                        // paths are sorted, so the rest are no better
                        break;
                    }
                }
            }
            if !heap.is_empty() {
                grid.insert(stop, heap.into_sorted_vec());
            }
        }

        let finals = match grid.get(&terminal) {
            Some(finals) => finals,
            None => return Err(self.unreachable(compound)),
        };

        let boundary = pricing.boundary();
        let mut results = Vec::with_capacity(finals.len());
        for last in finals {
            let mut splitlocs = Vec::new();
            let mut entry = *last;
            while entry.start != origin {
                splitlocs.push(entry.start);
                entry = match grid.get(&entry.start).and_then(|paths| paths.get(entry.rank)) {
                    Some(&prev) => prev,
                    None => return Err(segmentation_error(compound, "broken back-pointer")),
                };
            }
            splitlocs.reverse();
            results.push(Segmentation {
                constructions: compound.splitn(&splitlocs)?,
                cost: last.cost + boundary,
            });
        }
        Ok(results)
    }

    /// Negative log-probability of `compound` summed over all segmentations.
    ///
    /// Uses the same step costs as [`Self::segment`], so the result never
    /// exceeds the cost of the best single segmentation.
    pub fn forward_logprob<C: Construction>(&self, compound: &C, cost: &C::Cost) -> Result<f64> {
        let origin = check_nonempty(compound)?;
        let pricing = Pricing::new(compound, cost, self.smoothing)?;

        let mut grid: AHashMap<C::Loc, f64> = AHashMap::new();
        grid.insert(origin, 0.0);

        let mut paths = Vec::new();
        for stop in compound.positions() {
            paths.clear();
            for start in compound.predecessors(stop, self.max_len) {
                let base = match grid.get(&start) {
                    Some(&c) => c,
                    None => continue,
                };
                if let Some(step) = pricing.step(&compound.slice(start, stop))? {
                    paths.push(base + step);
                }
            }
            if let Some(total) = neg_log_sum_exp(&paths) {
                grid.insert(stop, total);
            }
        }

        match grid.get(&compound.terminal()) {
            Some(&total) => Ok(total + pricing.boundary()),
            None => Err(self.unreachable(compound)),
        }
    }

    fn unreachable<C: Construction>(&self, compound: &C) -> MorphError {
        segmentation_error(
            compound,
            &format!("no path within maximum length {}", self.max_len),
        )
    }
}

/// Step costs of one search, fixed against the model at search start.
struct Pricing<'a, C: Construction> {
    cost: &'a C::Cost,
    smoothing: Smoothing,
    bad_likelihood: f64,
}

impl<'a, C: Construction> Pricing<'a, C> {
    fn new(compound: &C, cost: &'a C::Cost, addcount: f64) -> Result<Self> {
        let newbound = if addcount > 0.0 {
            cost.newbound_cost(addcount)?
        } else {
            0.0
        };
        Ok(Self {
            cost,
            smoothing: Smoothing::new(addcount, cost.all_tokens(), cost.tokens(), newbound),
            bad_likelihood: cost.bad_likelihood(compound, addcount)?,
        })
    }

    /// Cost of one piece, or `None` when the piece may not be used.
    fn step(&self, piece: &C) -> Result<Option<f64>> {
        let count = self.cost.construction_count(piece);
        let step = match self
            .smoothing
            .piece_cost(count, || self.cost.coding_cost(piece))?
        {
            Some(step) => step,
            None if piece.is_atom() => self.bad_likelihood,
            None => return Ok(None),
        };
        let alignment = self.cost.alignment_cost(piece, self.smoothing.addcount)?;
        Ok(Some(step + alignment))
    }

    /// Cost of the corpus boundary closing the compound.
    fn boundary(&self) -> f64 {
        let compound_tokens = self.cost.compound_tokens();
        if compound_tokens == 0 {
            return 0.0;
        }
        let ct = compound_tokens as f64;
        (self.cost.tokens() as f64 + ct).ln() - ct.ln()
    }
}

/// A partial path in the n-best grid.
#[derive(Debug, Clone, Copy)]
struct Candidate<L> {
    cost: f64,
    /// Generation order within one location
    seq: usize,
    /// Location the last piece starts at
    start: L,
    /// Index of the extended path among the paths of `start`
    rank: usize,
}

impl<L> PartialEq for Candidate<L> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<L> Eq for Candidate<L> {}

impl<L> Ord for Candidate<L> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl<L> PartialOrd for Candidate<L> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `-ln Σ exp(-c)`, or `None` for no terms.
fn neg_log_sum_exp(costs: &[f64]) -> Option<f64> {
    let min = costs.iter().copied().reduce(f64::min)?;
    let sum: f64 = costs.iter().map(|c| (min - c).exp()).sum();
    Some(min - sum.ln())
}

fn check_nonempty<C: Construction>(compound: &C) -> Result<C::Loc> {
    let origin = compound.origin();
    if origin == compound.terminal() {
        return Err(segmentation_error(compound, "empty compound"));
    }
    Ok(origin)
}

impl Default for ViterbiSegmenter {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
            max_len: DEFAULT_MAX_LEN,
        }
    }
}

fn segmentation_error<C: Construction>(compound: &C, reason: &str) -> MorphError {
    MorphError::Segmentation {
        compound: compound.to_string(),
        reason: reason.to_string(),
    }
}
