//! Construction kinds and the lattice interface the segmenter walks.
//!
//! A construction is either a whole compound (the thing being segmented)
//! or one of its pieces. Every kind exposes a lattice of locations: a
//! segmentation is a strictly increasing path from [`Construction::origin`]
//! to [`Construction::terminal`], and each step of the path is a piece.

pub mod baseline;
pub mod cognate;
pub mod parallel;

pub use baseline::Baseline;
pub use cognate::{Cognate, Side};
pub use parallel::Parallel;

use crate::cost::CostModel;
use crate::error::{MorphError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// Separator between the two sides of a rendered parallel or cognate construction.
pub const DELIM: char = '\u{FFE8}';

/// End-of-word marker appended to every non-empty cognate side.
pub const BOUNDARY: char = '\u{2059}';

/// Separator between constructions in a rendered segmentation.
pub const PIECE_SEPARATOR: &str = " + ";

/// The three supported construction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstructionKind {
    /// Plain strings
    Baseline,
    /// Grapheme string paired with a phoneme sequence
    Parallel,
    /// Source/target word pair with optional wildcard sides
    Cognate,
}

impl fmt::Display for ConstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstructionKind::Baseline => "baseline",
            ConstructionKind::Parallel => "parallel",
            ConstructionKind::Cognate => "cognate",
        };
        f.write_str(name)
    }
}

impl FromStr for ConstructionKind {
    type Err = MorphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "baseline" => Ok(ConstructionKind::Baseline),
            "parallel" => Ok(ConstructionKind::Parallel),
            "cognate" => Ok(ConstructionKind::Cognate),
            other => Err(MorphError::InvalidConfig(format!(
                "unknown construction kind '{}'",
                other
            ))),
        }
    }
}

/// A segmentable value.
///
/// Implementors are immutable values with structural equality and a total
/// order; the order is only used to break ties deterministically.
pub trait Construction:
    Clone
    + Eq
    + Hash
    + Ord
    + fmt::Debug
    + fmt::Display
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// A point in the segmentation lattice.
    type Loc: Copy
        + Eq
        + Ord
        + Hash
        + fmt::Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync;

    /// Cost model that scores analyses of this kind.
    type Cost: CostModel<Self>;

    /// Kind tag, used when persisting models.
    const KIND: ConstructionKind;

    /// Start of the lattice.
    fn origin(&self) -> Self::Loc;

    /// End of the lattice.
    fn terminal(&self) -> Self::Loc;

    /// Every reachable location except the origin, in ascending order.
    ///
    /// The terminal is always the last element.
    fn positions(&self) -> Vec<Self::Loc>;

    /// Locations from which a single piece of at most `max_len` atoms per
    /// side reaches `stop`, in ascending order.
    fn predecessors(&self, stop: Self::Loc, max_len: usize) -> Vec<Self::Loc>;

    /// True when `start..stop` is a valid non-empty piece of `self`.
    fn is_step(&self, start: Self::Loc, stop: Self::Loc) -> bool;

    /// The piece between two locations. Callers check [`Self::is_step`].
    fn slice(&self, start: Self::Loc, stop: Self::Loc) -> Self;

    /// Split locations that would cut the concatenation of `parts` back into `parts`.
    fn parts_to_splitlocs(parts: &[Self]) -> Vec<Self::Loc>;

    /// Concatenate pieces side by side.
    fn concat(parts: &[Self]) -> Result<Self>;

    /// True when the construction cannot be split further.
    fn is_atom(&self) -> bool;

    /// Parse the rendering produced by `Display`.
    fn parse(s: &str) -> Result<Self>;

    /// Split at the given interior locations, in order.
    fn splitn(&self, locs: &[Self::Loc]) -> Result<Vec<Self>> {
        let mut parts = Vec::with_capacity(locs.len() + 1);
        let mut prev = self.origin();
        for &loc in locs.iter().chain(std::iter::once(&self.terminal())) {
            if !self.is_step(prev, loc) {
                return Err(MorphError::InvalidConstruction(format!(
                    "cannot split '{}' between {:?} and {:?}",
                    self, prev, loc
                )));
            }
            parts.push(self.slice(prev, loc));
            prev = loc;
        }
        Ok(parts)
    }

    /// Interior locations where `self` splits into two valid pieces, ascending.
    fn split_locations(&self) -> Vec<Self::Loc> {
        let (origin, terminal) = (self.origin(), self.terminal());
        self.positions()
            .into_iter()
            .filter(|&loc| {
                loc != terminal && self.is_step(origin, loc) && self.is_step(loc, terminal)
            })
            .collect()
    }

    /// Other compounds whose analyses are split in step with this one.
    fn shadows(&self) -> Vec<Self> {
        Vec::new()
    }

    /// The location in `shadow` that mirrors `loc` in `self`.
    fn shadow_loc(&self, _shadow: &Self, loc: Self::Loc) -> Self::Loc {
        loc
    }

    /// Split at a single interior location.
    fn split(&self, loc: Self::Loc) -> Result<(Self, Self)> {
        let mut parts = self.splitn(&[loc])?.into_iter();
        match (parts.next(), parts.next()) {
            (Some(left), Some(right)) => Ok((left, right)),
            _ => Err(MorphError::InvalidConstruction(format!(
                "cannot split '{}' at {:?}",
                self, loc
            ))),
        }
    }
}

/// Render a segmentation as `c1 + c2 + ...`.
pub fn render_parts<C: Construction>(parts: &[C]) -> String {
    parts
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(PIECE_SEPARATOR)
}

/// Character offset to byte offset, clamped to the string end.
pub(crate) fn byte_offset(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Indices `max(0, stop - max_len)..stop`.
pub(crate) fn window(stop: usize, max_len: usize) -> std::ops::Range<usize> {
    stop.saturating_sub(max_len)..stop
}
