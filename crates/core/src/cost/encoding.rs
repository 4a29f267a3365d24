//! Two-part code-length accumulators.
//!
//! Both encodings keep `Σ c·ln c` over their counts so that a count change
//! costs O(1) to account for; the code length itself is derived on demand.

use super::{check_finite, validate_corpus_weight, Symbol};
use crate::error::Result;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const EXACT_FACTORIAL_LIMIT: u64 = 20;

/// Natural log of `n!`; exact for small `n`, Stirling's approximation above.
pub fn log_factorial(n: u64) -> f64 {
    if n < 2 {
        return 0.0;
    }
    if n < EXACT_FACTORIAL_LIMIT {
        return (2..=n).map(|k| (k as f64).ln()).sum();
    }
    let n = n as f64;
    n * n.ln() - n + 0.5 * (n.ln() + (2.0 * PI).ln())
}

/// Running totals shared by both encodings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Totals {
    /// Σ c·ln c over counts greater than one
    logtokensum: f64,
    /// Sum of counts
    tokens: u64,
    /// Number of boundaries (compounds or lexicon entries)
    boundaries: u64,
}

impl Totals {
    fn update_count(&mut self, old: u64, new: u64) {
        if old > 1 {
            self.logtokensum -= old as f64 * (old as f64).ln();
        }
        if new > 1 {
            self.logtokensum += new as f64 * (new as f64).ln();
        }
        self.tokens = self.tokens - old + new;
    }

    /// `n ln n − b ln b − Σ c ln c` with `n = tokens + boundaries`.
    fn entropy(&self) -> f64 {
        let b = self.boundaries as f64;
        let n = (self.tokens + self.boundaries) as f64;
        n * n.ln() - b * b.ln() - self.logtokensum
    }
}

/// Code for the corpus written as a sequence of lexicon references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusEncoding {
    totals: Totals,
    /// Corpus weight (`alpha`)
    weight: f64,
}

impl CorpusEncoding {
    pub fn new(weight: f64) -> Result<Self> {
        validate_corpus_weight(weight)?;
        Ok(Self {
            totals: Totals::default(),
            weight,
        })
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) -> Result<()> {
        validate_corpus_weight(weight)?;
        self.weight = weight;
        Ok(())
    }

    pub fn tokens(&self) -> u64 {
        self.totals.tokens
    }

    pub fn boundaries(&self) -> u64 {
        self.totals.boundaries
    }

    pub fn update_count(&mut self, old: u64, new: u64) {
        self.totals.update_count(old, new);
    }

    pub fn set_boundaries(&mut self, boundaries: u64) {
        self.totals.boundaries = boundaries;
    }

    /// Code length given the number of lexicon entries.
    pub fn cost(&self, lexicon_types: u64) -> Result<f64> {
        if self.totals.boundaries == 0 {
            return Ok(0.0);
        }
        let cost = self.totals.entropy() * self.weight + self.frequency_cost(lexicon_types);
        check_finite("corpus cost", cost)
    }

    fn frequency_cost(&self, lexicon_types: u64) -> f64 {
        let types = lexicon_types + 1;
        if types < 2 {
            return 0.0;
        }
        let tokens = self.totals.tokens + self.totals.boundaries;
        log_factorial(tokens.saturating_sub(1))
            - log_factorial(types - 2)
            - log_factorial((tokens + 1).saturating_sub(types))
    }
}

/// Code for spelling each lexicon entry out of atoms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct LexiconEncoding<A: Symbol> {
    totals: Totals,
    /// Atom frequencies over all lexicon entries
    #[serde(with = "super::lexicon::entries")]
    atoms: AHashMap<A, u64>,
}

impl<A: Symbol> LexiconEncoding<A> {
    pub fn new() -> Self {
        Self {
            totals: Totals::default(),
            atoms: AHashMap::new(),
        }
    }

    /// Number of lexicon entries.
    pub fn boundaries(&self) -> u64 {
        self.totals.boundaries
    }

    /// Atom tokens over all lexicon entries.
    pub fn tokens(&self) -> u64 {
        self.totals.tokens
    }

    pub fn atom_types(&self) -> usize {
        self.atoms.len()
    }

    pub fn add(&mut self, atoms: &[A]) {
        for atom in atoms {
            let count = self.atoms.entry(atom.clone()).or_insert(0);
            let old = *count;
            *count += 1;
            self.totals.update_count(old, old + 1);
        }
        self.totals.boundaries += 1;
    }

    pub fn remove(&mut self, atoms: &[A]) {
        for atom in atoms {
            let old = match self.atoms.get_mut(atom) {
                Some(count) => {
                    let old = *count;
                    *count -= 1;
                    old
                }
                None => continue,
            };
            if old == 1 {
                self.atoms.remove(atom);
            }
            self.totals.update_count(old, old - 1);
        }
        self.totals.boundaries = self.totals.boundaries.saturating_sub(1);
    }

    /// Coding length of an entry spelled by `atoms`, in the current code.
    ///
    /// Unseen atoms are priced as if seen once.
    pub fn codelength(&self, atoms: &[A]) -> f64 {
        let l = (atoms.len() + 1) as f64;
        let mut cost = l * (self.totals.tokens as f64 + l).ln();
        cost -= (self.totals.boundaries as f64 + 1.0).ln();
        for atom in atoms {
            let c = self.atoms.get(atom).copied().unwrap_or(1);
            cost -= (c as f64).ln();
        }
        cost
    }

    pub fn cost(&self) -> Result<f64> {
        if self.totals.boundaries == 0 {
            return Ok(0.0);
        }
        let permutations = -log_factorial(self.totals.boundaries);
        let cost = self.totals.entropy() + permutations + self.frequency_cost();
        check_finite("lexicon cost", cost)
    }

    fn frequency_cost(&self) -> f64 {
        let types = self.atoms.len() as u64 + 1;
        let tokens = self.totals.tokens;
        if types < 2 {
            return 0.0;
        }
        log_factorial(tokens.saturating_sub(1))
            - log_factorial(types - 1)
            - log_factorial(tokens.saturating_sub(types))
    }
}

impl<A: Symbol> Default for LexiconEncoding<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_log_factorial_exact_and_stirling() {
        assert_eq!(log_factorial(0), 0.0);
        assert_eq!(log_factorial(1), 0.0);
        assert!((log_factorial(5) - 120f64.ln()).abs() < 1e-12);
        let exact: f64 = (2..=25u64).map(|k| (k as f64).ln()).sum();
        assert!((log_factorial(25) - exact).abs() < 0.01);
    }

    #[test]
    fn test_corpus_empty_costs_nothing() {
        let enc = CorpusEncoding::new(1.0).unwrap();
        assert_eq!(enc.cost(0).unwrap(), 0.0);
    }

    #[test]
    fn test_corpus_weight_scales_entropy() {
        let mut a = CorpusEncoding::new(1.0).unwrap();
        let mut b = CorpusEncoding::new(2.0).unwrap();
        for enc in [&mut a, &mut b] {
            enc.update_count(0, 3);
            enc.update_count(0, 2);
            enc.set_boundaries(2);
        }
        let freq = a.frequency_cost(2);
        let ea = a.cost(2).unwrap() - freq;
        let eb = b.cost(2).unwrap() - freq;
        assert!((eb - 2.0 * ea).abs() < 1e-9);
    }

    #[test]
    fn test_corpus_rejects_zero_weight() {
        assert!(CorpusEncoding::new(0.0).is_err());
        let mut enc = CorpusEncoding::new(1.0).unwrap();
        assert!(enc.set_weight(f64::NAN).is_err());
        assert_eq!(enc.weight(), 1.0);
    }

    #[test]
    fn test_lexicon_add_remove_inverse() {
        let mut enc: LexiconEncoding<char> = LexiconEncoding::new();
        enc.add(&chars("walk"));
        let before = enc.cost().unwrap();
        enc.add(&chars("ing"));
        enc.add(&chars("walking"));
        enc.remove(&chars("walking"));
        enc.remove(&chars("ing"));
        assert!((enc.cost().unwrap() - before).abs() < 1e-9);
        assert_eq!(enc.boundaries(), 1);
        assert_eq!(enc.atom_types(), 4);
    }

    #[test]
    fn test_codelength_grows_with_length() {
        let mut enc: LexiconEncoding<char> = LexiconEncoding::new();
        enc.add(&chars("abc"));
        assert!(enc.codelength(&chars("abcabc")) > enc.codelength(&chars("ab")));
    }

    #[test]
    fn test_remove_drops_zero_atoms() {
        let mut enc: LexiconEncoding<char> = LexiconEncoding::new();
        enc.add(&chars("xy"));
        enc.remove(&chars("xy"));
        assert_eq!(enc.atom_types(), 0);
        assert_eq!(enc.tokens(), 0);
        assert_eq!(enc.cost().unwrap(), 0.0);
    }
}
