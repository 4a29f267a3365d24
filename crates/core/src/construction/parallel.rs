//! Grapheme/phoneme parallel constructions.
//!
//! The grapheme side is indexed by extended grapheme clusters so that a
//! combining sequence is never split. Both sides advance on every step.

use super::{window, Construction, ConstructionKind, DELIM};
use crate::cost::{Atoms, MdlCost};
use crate::error::{MorphError, Result};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_segmentation::UnicodeSegmentation;

/// A grapheme string aligned with a phoneme sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Parallel {
    /// Written form
    graphemes: CompactString,
    /// Pronunciation, one symbol per entry
    phonemes: Vec<CompactString>,
}

/// Atom of a parallel construction; the two alphabets are kept apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParallelAtom {
    Grapheme(CompactString),
    Phoneme(CompactString),
}

impl Parallel {
    /// Build a parallel construction. Both sides must be non-empty.
    pub fn new<S: AsRef<str>>(graphemes: &str, phonemes: &[S]) -> Result<Self> {
        if graphemes.is_empty() || phonemes.is_empty() {
            return Err(MorphError::InvalidConstruction(format!(
                "parallel construction needs both sides, got '{}' / {} phonemes",
                graphemes,
                phonemes.len()
            )));
        }
        if phonemes.iter().any(|p| p.as_ref().trim().is_empty()) {
            return Err(MorphError::InvalidConstruction(
                "empty phoneme symbol".to_string(),
            ));
        }
        Ok(Self {
            graphemes: CompactString::new(graphemes),
            phonemes: phonemes
                .iter()
                .map(|p| CompactString::new(p.as_ref()))
                .collect(),
        })
    }

    pub fn graphemes(&self) -> &str {
        &self.graphemes
    }

    pub fn phonemes(&self) -> &[CompactString] {
        &self.phonemes
    }

    fn clusters(&self) -> Vec<&str> {
        self.graphemes.graphemes(true).collect()
    }

    fn grapheme_len(&self) -> usize {
        self.graphemes.graphemes(true).count()
    }
}

impl fmt::Display for Parallel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.graphemes, DELIM)?;
        for (i, p) in self.phonemes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(p)?;
        }
        Ok(())
    }
}

impl Atoms for Parallel {
    type Atom = ParallelAtom;

    fn atoms(&self) -> Vec<ParallelAtom> {
        self.clusters()
            .into_iter()
            .map(|g| ParallelAtom::Grapheme(CompactString::new(g)))
            .chain(self.phonemes.iter().cloned().map(ParallelAtom::Phoneme))
            .collect()
    }
}

impl Construction for Parallel {
    type Loc = (usize, usize);
    type Cost = MdlCost<Parallel>;

    const KIND: ConstructionKind = ConstructionKind::Parallel;

    fn origin(&self) -> (usize, usize) {
        (0, 0)
    }

    fn terminal(&self) -> (usize, usize) {
        (self.grapheme_len(), self.phonemes.len())
    }

    fn positions(&self) -> Vec<(usize, usize)> {
        let (g, p) = self.terminal();
        let mut out = Vec::with_capacity(g * p);
        for i in 1..=g {
            for j in 1..=p {
                out.push((i, j));
            }
        }
        out
    }

    fn predecessors(&self, stop: (usize, usize), max_len: usize) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for i in window(stop.0, max_len) {
            for j in window(stop.1, max_len) {
                // Only the origin has a zero coordinate.
                if (i == 0) == (j == 0) {
                    out.push((i, j));
                }
            }
        }
        out
    }

    fn is_step(&self, start: (usize, usize), stop: (usize, usize)) -> bool {
        let (g, p) = self.terminal();
        start.0 < stop.0 && start.1 < stop.1 && stop.0 <= g && stop.1 <= p
    }

    fn slice(&self, start: (usize, usize), stop: (usize, usize)) -> Self {
        let clusters = self.clusters();
        Self {
            graphemes: clusters[start.0..stop.0].concat().into(),
            phonemes: self.phonemes[start.1..stop.1].to_vec(),
        }
    }

    fn parts_to_splitlocs(parts: &[Self]) -> Vec<(usize, usize)> {
        let mut locs = Vec::with_capacity(parts.len().saturating_sub(1));
        let (mut i, mut j) = (0, 0);
        for part in parts.iter().take(parts.len().saturating_sub(1)) {
            i += part.grapheme_len();
            j += part.phonemes.len();
            locs.push((i, j));
        }
        locs
    }

    fn concat(parts: &[Self]) -> Result<Self> {
        if parts.is_empty() {
            return Err(MorphError::InvalidConstruction(
                "cannot concatenate zero parallel parts".to_string(),
            ));
        }
        let mut graphemes = CompactString::default();
        let mut phonemes = Vec::new();
        for part in parts {
            graphemes.push_str(&part.graphemes);
            phonemes.extend(part.phonemes.iter().cloned());
        }
        Ok(Self {
            graphemes,
            phonemes,
        })
    }

    fn is_atom(&self) -> bool {
        self.grapheme_len() <= 1 && self.phonemes.len() <= 1
    }

    fn parse(s: &str) -> Result<Self> {
        let (graphemes, phonemes) = s.split_once(DELIM).ok_or_else(|| {
            MorphError::InvalidConstruction(format!("missing side delimiter in '{}'", s))
        })?;
        let phonemes: Vec<&str> = phonemes.split_whitespace().collect();
        Self::new(graphemes, &phonemes)
    }
}
