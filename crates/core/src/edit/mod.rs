//! Edit operations between the two sides of a cognate and their cost model.
//!
//! Every source/target piece is aligned, and the resulting non-copy
//! operations are counted in their own MDL model. A cognate analysis whose
//! pieces explain each other with few, frequent edits is cheaper.

pub mod align;

pub use align::{distance, opcodes, OpTag, Opcode};

use crate::cost::{validate_edit_weight, Atoms, MdlCost};
use crate::error::Result;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator in the rendering of an edit operation.
pub const EDIT_SEPARATOR: char = '/';

/// What an edit operation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    Copy,
    Substitute,
    Insert,
    Delete,
}

/// A source span rewritten as a target span; either side may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EditOp {
    pub src: CompactString,
    pub trg: CompactString,
}

impl EditOp {
    pub fn new(src: &str, trg: &str) -> Self {
        Self {
            src: CompactString::new(src),
            trg: CompactString::new(trg),
        }
    }

    pub fn kind(&self) -> EditKind {
        match (self.src.is_empty(), self.trg.is_empty()) {
            (true, _) => EditKind::Insert,
            (_, true) => EditKind::Delete,
            _ if self.src == self.trg => EditKind::Copy,
            _ => EditKind::Substitute,
        }
    }
}

impl fmt::Display for EditOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.src, EDIT_SEPARATOR, self.trg)
    }
}

impl Atoms for EditOp {
    type Atom = char;

    fn atoms(&self) -> Vec<char> {
        self.src
            .chars()
            .chain(std::iter::once(EDIT_SEPARATOR))
            .chain(self.trg.chars())
            .collect()
    }
}

/// Non-copy edit operations turning `src` into `trg`.
///
/// Adjacent edits are merged into one replacement, and an insertion or
/// deletion next to a doubled symbol is widened to cover it, so that
/// lengthening reads as `a/aa` instead of `/a`.
pub fn edit_ops(src: &str, trg: &str) -> Vec<EditOp> {
    let s: Vec<char> = src.chars().collect();
    let t: Vec<char> = trg.chars().collect();

    let mut merged: Vec<Opcode> = Vec::new();
    for op in opcodes(&s, &t).into_iter().filter(|o| o.tag != OpTag::Equal) {
        match merged.last_mut() {
            Some(prev) if prev.src_end == op.src_start && prev.trg_end == op.trg_start => {
                prev.tag = OpTag::Replace;
                prev.src_end = op.src_end;
                prev.trg_end = op.trg_end;
            }
            _ => merged.push(op),
        }
    }

    merged
        .into_iter()
        .map(|op| lengthen(&s, &t, op))
        .map(|op| {
            let src: String = s[op.src_start..op.src_end].iter().collect();
            let trg: String = t[op.trg_start..op.trg_end].iter().collect();
            EditOp::new(&src, &trg)
        })
        .collect()
}

fn lengthen(src: &[char], trg: &[char], mut op: Opcode) -> Opcode {
    let src_len = op.src_end - op.src_start;
    let trg_len = op.trg_end - op.trg_start;
    if src_len.min(trg_len) > 0 {
        return op;
    }
    let inserted = src_len == 0;

    if op.src_start > 0 && op.trg_start > 0 {
        let cursor = if inserted {
            trg[op.trg_start]
        } else {
            src[op.src_start]
        };
        if src[op.src_start - 1] == cursor && trg[op.trg_start - 1] == cursor {
            op.src_start -= 1;
            op.trg_start -= 1;
            op.tag = OpTag::Replace;
        }
    }
    if op.src_end + 1 < src.len() && op.trg_end + 1 < trg.len() {
        let cursor = if inserted {
            trg[op.trg_end - 1]
        } else {
            src[op.src_end - 1]
        };
        if src[op.src_end] == cursor && trg[op.trg_end] == cursor {
            op.src_end += 1;
            op.trg_end += 1;
            op.tag = OpTag::Replace;
        }
    }
    op
}

/// MDL model over edit operations, scaled by the edit weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditCostModel {
    /// Operation frequencies and their two-part code
    coding: MdlCost<EditOp>,
    /// Edit weight (`ew`)
    weight: f64,
}

impl EditCostModel {
    pub fn new(weight: f64) -> Result<Self> {
        validate_edit_weight(weight)?;
        Ok(Self {
            coding: MdlCost::new(1.0)?,
            weight,
        })
    }

    /// Count the edits of an aligned piece `delta` times.
    pub fn record(&mut self, src: &str, trg: &str, delta: i64) -> Result<()> {
        for op in edit_ops(src, trg) {
            self.coding.update_count(&op, delta)?;
        }
        Ok(())
    }

    pub fn add_boundaries(&mut self, delta: i64) -> Result<()> {
        self.coding.add_boundaries(delta)
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) -> Result<()> {
        validate_edit_weight(weight)?;
        self.weight = weight;
        Ok(())
    }

    /// Unweighted code length of the edit table.
    pub fn raw_cost(&self) -> Result<f64> {
        self.coding.total_cost()
    }

    /// Weighted contribution to the total cost.
    pub fn cost(&self) -> Result<f64> {
        if self.weight == 0.0 {
            return Ok(0.0);
        }
        Ok(self.weight * self.raw_cost()?)
    }

    pub fn count(&self, op: &EditOp) -> u64 {
        self.coding.count(op)
    }

    /// Distinct operations in the table.
    pub fn len(&self) -> usize {
        self.coding.lexicon().len()
    }

    pub fn is_empty(&self) -> bool {
        self.coding.lexicon().is_empty()
    }

    /// Table contents sorted by operation.
    pub fn table(&self) -> Vec<(EditOp, u64)> {
        self.coding.lexicon().sorted()
    }

    /// Weighted cost of the edits of one more `src`/`trg` piece.
    pub fn alignment_cost(&self, src: &str, trg: &str, addcount: f64) -> Result<f64> {
        if self.weight == 0.0 {
            return Ok(0.0);
        }
        let ops = edit_ops(src, trg);
        if ops.is_empty() {
            return Ok(0.0);
        }
        let smoothing = self.coding.smoothing(addcount)?;
        let mut total = 0.0;
        for op in &ops {
            total += self.coding.marginal_cost(op, &smoothing)?;
        }
        Ok(self.weight * total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(src: &str, trg: &str) -> Vec<String> {
        edit_ops(src, trg).iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_identical_strings_have_no_edits() {
        assert!(edit_ops("walk", "walk").is_empty());
    }

    #[test]
    fn test_substitution() {
        assert_eq!(rendered("cat", "cut"), vec!["a/u"]);
    }

    #[test]
    fn test_adjacent_edits_merge() {
        let ops = edit_ops("abxyc", "abc");
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].to_string(), "xy/");
    }

    #[test]
    fn test_lengthening_becomes_replacement() {
        let ops = edit_ops("kala", "kaala");
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind(), EditKind::Substitute);
        assert!(ops[0].trg.len() > ops[0].src.len());
    }

    #[test]
    fn test_edit_kind() {
        assert_eq!(EditOp::new("", "a").kind(), EditKind::Insert);
        assert_eq!(EditOp::new("a", "").kind(), EditKind::Delete);
        assert_eq!(EditOp::new("a", "a").kind(), EditKind::Copy);
        assert_eq!(EditOp::new("a", "b").kind(), EditKind::Substitute);
    }

    #[test]
    fn test_record_and_remove() {
        let mut model = EditCostModel::new(1.0).unwrap();
        model.add_boundaries(1).unwrap();
        model.record("walking", "marche", 2).unwrap();
        assert!(!model.is_empty());
        assert!(model.raw_cost().unwrap() > 0.0);
        model.record("walking", "marche", -2).unwrap();
        model.add_boundaries(-1).unwrap();
        assert!(model.is_empty());
        assert!(model.raw_cost().unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_weight_scales_cost() {
        let mut model = EditCostModel::new(1.0).unwrap();
        model.add_boundaries(1).unwrap();
        model.record("cat", "cut", 1).unwrap();
        let base = model.cost().unwrap();
        model.set_weight(10.0).unwrap();
        assert!((model.cost().unwrap() - 10.0 * base).abs() < 1e-9);
        assert!(model.set_weight(-1.0).is_err());
        model.set_weight(0.0).unwrap();
        assert_eq!(model.cost().unwrap(), 0.0);
    }

    #[test]
    fn test_alignment_cost_favours_seen_edits() {
        let mut model = EditCostModel::new(1.0).unwrap();
        model.add_boundaries(5).unwrap();
        model.record("cat", "cut", 5).unwrap();
        let seen = model.alignment_cost("bat", "but", 1.0).unwrap();
        let unseen = model.alignment_cost("bat", "bxt", 1.0).unwrap();
        assert!(seen < unseen);
        assert_eq!(model.alignment_cost("same", "same", 1.0).unwrap(), 0.0);
    }
}
