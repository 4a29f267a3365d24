//! Observed compounds.

use crate::construction::Construction;
use crate::error::Result;

/// One corpus entry: a compound, how often it occurs, and optional split
/// locations that seed its first analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPoint<C: Construction> {
    pub count: u64,
    pub compound: C,
    pub splitlocs: Vec<C::Loc>,
}

impl<C: Construction> DataPoint<C> {
    /// Unsegmented entry.
    pub fn new(count: u64, compound: C) -> Self {
        Self {
            count,
            compound,
            splitlocs: Vec::new(),
        }
    }

    pub fn with_splitlocs(count: u64, compound: C, splitlocs: Vec<C::Loc>) -> Self {
        Self {
            count,
            compound,
            splitlocs,
        }
    }

    /// Entry seeded from an existing segmentation.
    pub fn from_parts(count: u64, parts: &[C]) -> Result<Self> {
        let compound = C::concat(parts)?;
        Ok(Self::with_splitlocs(count, compound, C::parts_to_splitlocs(parts)))
    }

    /// The seed analysis; the whole compound when no splits are given.
    pub fn initial_parts(&self) -> Result<Vec<C>> {
        self.compound.splitn(&self.splitlocs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::{Baseline, Cognate};

    #[test]
    fn test_unsegmented_initial_parts() {
        let dp = DataPoint::new(2, Baseline::new("walking"));
        assert_eq!(dp.initial_parts().unwrap(), vec![Baseline::new("walking")]);
    }

    #[test]
    fn test_from_parts_round_trip() {
        let parts = vec![Baseline::new("walk"), Baseline::new("ing")];
        let dp = DataPoint::from_parts(1, &parts).unwrap();
        assert_eq!(dp.compound.as_str(), "walking");
        assert_eq!(dp.splitlocs, vec![4]);
        assert_eq!(dp.initial_parts().unwrap(), parts);
    }

    #[test]
    fn test_bad_splitlocs_rejected() {
        let dp = DataPoint::with_splitlocs(1, Cognate::compound("ab", "xy").unwrap(), vec![(1, 0)]);
        assert!(dp.initial_parts().is_err());
    }
}
