//! Source/target cognate constructions.
//!
//! A cognate pairs a source word with a target word. Either side may be a
//! wildcard when the word has no counterpart; a wildcard side never moves
//! in the lattice, so a one-sided cognate segments like a plain string.

use super::{byte_offset, window, Construction, ConstructionKind, BOUNDARY, DELIM};
use crate::cost::CognateCost;
use crate::error::{MorphError, Result};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One side of a cognate.
///
/// `Wildcard` orders before every form and renders as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Wildcard,
    Form(CompactString),
}

impl Side {
    /// Empty text becomes the wildcard.
    pub fn new(s: &str) -> Self {
        if s.is_empty() {
            Side::Wildcard
        } else {
            Side::Form(CompactString::new(s))
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Side::Wildcard)
    }

    pub fn as_form(&self) -> Option<&CompactString> {
        match self {
            Side::Wildcard => None,
            Side::Form(s) => Some(s),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Side::Wildcard => "",
            Side::Form(s) => s.as_str(),
        }
    }

    /// Length in characters; zero for the wildcard.
    pub fn char_len(&self) -> usize {
        self.as_str().chars().count()
    }

    /// The text with the end-of-word marker removed.
    pub fn surface(&self) -> &str {
        self.as_str().trim_end_matches(BOUNDARY)
    }

    fn slice(&self, start: usize, stop: usize) -> Side {
        match self {
            Side::Wildcard => Side::Wildcard,
            Side::Form(s) => {
                let (a, b) = (byte_offset(s, start), byte_offset(s, stop));
                Side::Form(CompactString::new(&s[a..b]))
            }
        }
    }

    /// Valid coordinates excluding 0, or just 0 for the wildcard.
    fn coordinates(&self) -> std::ops::RangeInclusive<usize> {
        match self {
            Side::Wildcard => 0..=0,
            Side::Form(_) => 1..=self.char_len(),
        }
    }

    fn step_ok(&self, start: usize, stop: usize) -> bool {
        match self {
            Side::Wildcard => start == 0 && stop == 0,
            Side::Form(_) => start < stop && stop <= self.char_len(),
        }
    }

    fn before(&self, stop: usize, max_len: usize) -> Vec<usize> {
        match self {
            Side::Wildcard => vec![0],
            Side::Form(_) => window(stop, max_len).collect(),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source/target pair; at most one side is a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cognate {
    src: Side,
    trg: Side,
}

impl Cognate {
    /// Build a pair from two sides. Two wildcards are rejected.
    pub fn new(src: Side, trg: Side) -> Result<Self> {
        if src.is_wildcard() && trg.is_wildcard() {
            return Err(MorphError::InvalidConstruction(
                "cognate with two wildcard sides".to_string(),
            ));
        }
        Ok(Self { src, trg })
    }

    /// Build a compound from raw corpus words.
    ///
    /// An empty word becomes the wildcard; any other word gets the
    /// end-of-word marker appended.
    pub fn compound(src: &str, trg: &str) -> Result<Self> {
        let mark = |w: &str| {
            if w.is_empty() {
                Side::Wildcard
            } else {
                let mut s = CompactString::new(w);
                s.push(BOUNDARY);
                Side::Form(s)
            }
        };
        Self::new(mark(src), mark(trg))
    }

    pub fn src(&self) -> &Side {
        &self.src
    }

    pub fn trg(&self) -> &Side {
        &self.trg
    }

    /// Both sides present.
    pub fn is_pair(&self) -> bool {
        !self.src.is_wildcard() && !self.trg.is_wildcard()
    }
}

impl fmt::Display for Cognate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.src, DELIM, self.trg)
    }
}

impl Construction for Cognate {
    type Loc = (usize, usize);
    type Cost = CognateCost;

    const KIND: ConstructionKind = ConstructionKind::Cognate;

    fn origin(&self) -> (usize, usize) {
        (0, 0)
    }

    fn terminal(&self) -> (usize, usize) {
        (self.src.char_len(), self.trg.char_len())
    }

    fn positions(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for i in self.src.coordinates() {
            for j in self.trg.coordinates() {
                out.push((i, j));
            }
        }
        out
    }

    fn predecessors(&self, stop: (usize, usize), max_len: usize) -> Vec<(usize, usize)> {
        let both = self.is_pair();
        let mut out = Vec::new();
        for i in self.src.before(stop.0, max_len) {
            for j in self.trg.before(stop.1, max_len) {
                if !both || (i == 0) == (j == 0) {
                    out.push((i, j));
                }
            }
        }
        out
    }

    /// The one-sided cognates of a pair.
    fn shadows(&self) -> Vec<Self> {
        if !self.is_pair() {
            return Vec::new();
        }
        vec![
            Self {
                src: self.src.clone(),
                trg: Side::Wildcard,
            },
            Self {
                src: Side::Wildcard,
                trg: self.trg.clone(),
            },
        ]
    }

    fn shadow_loc(&self, shadow: &Self, loc: (usize, usize)) -> (usize, usize) {
        if shadow.trg.is_wildcard() {
            (loc.0, 0)
        } else {
            (0, loc.1)
        }
    }

    fn is_step(&self, start: (usize, usize), stop: (usize, usize)) -> bool {
        self.src.step_ok(start.0, stop.0) && self.trg.step_ok(start.1, stop.1)
    }

    fn slice(&self, start: (usize, usize), stop: (usize, usize)) -> Self {
        Self {
            src: self.src.slice(start.0, stop.0),
            trg: self.trg.slice(start.1, stop.1),
        }
    }

    fn parts_to_splitlocs(parts: &[Self]) -> Vec<(usize, usize)> {
        let mut locs = Vec::with_capacity(parts.len().saturating_sub(1));
        let (mut i, mut j) = (0, 0);
        for part in parts.iter().take(parts.len().saturating_sub(1)) {
            i += part.src.char_len();
            j += part.trg.char_len();
            locs.push((i, j));
        }
        locs
    }

    fn concat(parts: &[Self]) -> Result<Self> {
        fn join<'a>(sides: impl Iterator<Item = &'a Side>) -> Result<Side> {
            let mut text: Option<CompactString> = None;
            let mut wild = false;
            for side in sides {
                match side {
                    Side::Wildcard => wild = true,
                    Side::Form(s) => text.get_or_insert_with(CompactString::default).push_str(s),
                }
            }
            match (text, wild) {
                (Some(_), true) => Err(MorphError::InvalidConstruction(
                    "cannot concatenate a wildcard with a form".to_string(),
                )),
                (Some(s), false) => Ok(Side::Form(s)),
                (None, _) => Ok(Side::Wildcard),
            }
        }
        if parts.is_empty() {
            return Err(MorphError::InvalidConstruction(
                "cannot concatenate zero cognate parts".to_string(),
            ));
        }
        Self::new(
            join(parts.iter().map(|p| &p.src))?,
            join(parts.iter().map(|p| &p.trg))?,
        )
    }

    fn is_atom(&self) -> bool {
        self.src.char_len() <= 1 && self.trg.char_len() <= 1
    }

    fn parse(s: &str) -> Result<Self> {
        let (src, trg) = s.split_once(DELIM).ok_or_else(|| {
            MorphError::InvalidConstruction(format!("missing side delimiter in '{}'", s))
        })?;
        Self::new(Side::new(src), Side::new(trg))
    }
}
