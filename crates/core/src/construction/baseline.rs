//! Plain string constructions.

use super::{byte_offset, window, Construction, ConstructionKind};
use crate::cost::{Atoms, MdlCost};
use crate::error::{MorphError, Result};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A plain string, indexed by character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Baseline(CompactString);

impl Baseline {
    pub fn new(s: &str) -> Self {
        Self(CompactString::new(s))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Baseline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Baseline {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Atoms for Baseline {
    type Atom = char;

    fn atoms(&self) -> Vec<char> {
        self.0.chars().collect()
    }
}

impl Construction for Baseline {
    type Loc = usize;
    type Cost = MdlCost<Baseline>;

    const KIND: ConstructionKind = ConstructionKind::Baseline;

    fn origin(&self) -> usize {
        0
    }

    fn terminal(&self) -> usize {
        self.char_len()
    }

    fn positions(&self) -> Vec<usize> {
        (1..=self.char_len()).collect()
    }

    fn predecessors(&self, stop: usize, max_len: usize) -> Vec<usize> {
        window(stop, max_len).collect()
    }

    fn is_step(&self, start: usize, stop: usize) -> bool {
        start < stop && stop <= self.char_len()
    }

    fn slice(&self, start: usize, stop: usize) -> Self {
        let s = self.as_str();
        let (a, b) = (byte_offset(s, start), byte_offset(s, stop));
        Self::new(&s[a..b])
    }

    fn parts_to_splitlocs(parts: &[Self]) -> Vec<usize> {
        let mut locs = Vec::with_capacity(parts.len().saturating_sub(1));
        let mut pos = 0;
        for part in parts.iter().take(parts.len().saturating_sub(1)) {
            pos += part.char_len();
            locs.push(pos);
        }
        locs
    }

    fn concat(parts: &[Self]) -> Result<Self> {
        let mut s = CompactString::default();
        for part in parts {
            s.push_str(part.as_str());
        }
        Ok(Self(s))
    }

    fn is_atom(&self) -> bool {
        self.char_len() <= 1
    }

    fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(MorphError::InvalidConstruction(
                "empty baseline construction".to_string(),
            ));
        }
        Ok(Self::new(s))
    }
}
