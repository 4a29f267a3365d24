//! Levenshtein alignment with opcode output.
//!
//! The backtrace prefers a diagonal step, then a deletion, then an
//! insertion, so equal-cost alignments always come out the same way.

/// Kind of an aligned span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpTag {
    Equal,
    Replace,
    Insert,
    Delete,
}

/// One aligned span: `src[src_start..src_end]` against `trg[trg_start..trg_end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub tag: OpTag,
    pub src_start: usize,
    pub src_end: usize,
    pub trg_start: usize,
    pub trg_end: usize,
}

/// Minimum number of single-symbol edits turning `src` into `trg`.
pub fn distance<T: PartialEq>(src: &[T], trg: &[T]) -> usize {
    let table = distance_table(src, trg);
    table[src.len() * (trg.len() + 1) + trg.len()]
}

fn distance_table<T: PartialEq>(src: &[T], trg: &[T]) -> Vec<usize> {
    let width = trg.len() + 1;
    let mut d = vec![0usize; (src.len() + 1) * width];
    for j in 0..width {
        d[j] = j;
    }
    for i in 1..=src.len() {
        d[i * width] = i;
        for j in 1..width {
            let sub = d[(i - 1) * width + j - 1] + usize::from(src[i - 1] != trg[j - 1]);
            let del = d[(i - 1) * width + j] + 1;
            let ins = d[i * width + j - 1] + 1;
            d[i * width + j] = sub.min(del).min(ins);
        }
    }
    d
}

/// Alignment of `src` and `trg` as maximal runs of the same tag.
pub fn opcodes<T: PartialEq>(src: &[T], trg: &[T]) -> Vec<Opcode> {
    let width = trg.len() + 1;
    let d = distance_table(src, trg);

    // Backtrace into single-symbol steps, last step first.
    let mut steps = Vec::with_capacity(src.len().max(trg.len()));
    let (mut i, mut j) = (src.len(), trg.len());
    while i > 0 || j > 0 {
        let here = d[i * width + j];
        if i > 0 && j > 0 {
            let diag = d[(i - 1) * width + j - 1];
            let same = src[i - 1] == trg[j - 1];
            if (same && here == diag) || (!same && here == diag + 1) {
                steps.push(if same { OpTag::Equal } else { OpTag::Replace });
                i -= 1;
                j -= 1;
                continue;
            }
        }
        if i > 0 && here == d[(i - 1) * width + j] + 1 {
            steps.push(OpTag::Delete);
            i -= 1;
        } else {
            steps.push(OpTag::Insert);
            j -= 1;
        }
    }
    steps.reverse();

    let mut out: Vec<Opcode> = Vec::new();
    let (mut i, mut j) = (0, 0);
    for tag in steps {
        let (di, dj) = match tag {
            OpTag::Equal | OpTag::Replace => (1, 1),
            OpTag::Delete => (1, 0),
            OpTag::Insert => (0, 1),
        };
        match out.last_mut() {
            Some(last) if last.tag == tag => {
                last.src_end += di;
                last.trg_end += dj;
            }
            _ => out.push(Opcode {
                tag,
                src_start: i,
                src_end: i + di,
                trg_start: j,
                trg_end: j + dj,
            }),
        }
        i += di;
        j += dj;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance(&chars("kitten"), &chars("sitting")), 3);
        assert_eq!(distance(&chars(""), &chars("abc")), 3);
        assert_eq!(distance(&chars("same"), &chars("same")), 0);
    }

    #[test]
    fn test_opcodes_cover_both_strings() {
        let (s, t) = (chars("walking"), chars("marche"));
        let ops = opcodes(&s, &t);
        assert_eq!(ops.first().map(|o| (o.src_start, o.trg_start)), Some((0, 0)));
        assert_eq!(ops.last().map(|o| (o.src_end, o.trg_end)), Some((s.len(), t.len())));
        for pair in ops.windows(2) {
            assert_eq!(pair[0].src_end, pair[1].src_start);
            assert_eq!(pair[0].trg_end, pair[1].trg_start);
        }
    }

    #[test]
    fn test_opcodes_simple_substitution() {
        let ops = opcodes(&chars("cat"), &chars("cut"));
        let tags: Vec<OpTag> = ops.iter().map(|o| o.tag).collect();
        assert_eq!(tags, vec![OpTag::Equal, OpTag::Replace, OpTag::Equal]);
        assert_eq!((ops[1].src_start, ops[1].src_end), (1, 2));
    }

    #[test]
    fn test_opcodes_insertion_and_deletion() {
        let ops = opcodes(&chars("ab"), &chars("abc"));
        assert_eq!(ops.last().map(|o| o.tag), Some(OpTag::Insert));
        let ops = opcodes(&chars("abc"), &chars("ab"));
        assert_eq!(ops.last().map(|o| o.tag), Some(OpTag::Delete));
    }

    #[test]
    fn test_opcodes_empty_inputs() {
        assert!(opcodes::<char>(&[], &[]).is_empty());
        let ops = opcodes(&[], &chars("xy"));
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].tag, OpTag::Insert);
    }
}
