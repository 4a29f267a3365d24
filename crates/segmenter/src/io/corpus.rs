//! Corpus readers.
//!
//! One entry per line. Baseline lines are `[count] compound`; parallel
//! lines are `count<TAB>graphemes<TAB>phonemes` with whitespace-separated
//! phonemes; cognate lines are `count<TAB>source<TAB>target`, where an
//! empty side becomes the wildcard. Blank lines are skipped and any
//! malformed line aborts the whole load.

use crate::normalize::Normalizer;
use cogmorph_core::{Baseline, Cognate, Construction, DataPoint, MorphError, Parallel, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A construction kind with a textual corpus format.
pub trait CorpusFormat: Construction {
    /// Parse one non-blank line; the error is a human-readable reason.
    fn parse_line(line: &str, normalizer: &Normalizer) -> std::result::Result<DataPoint<Self>, String>;
}

fn parse_count(field: &str) -> std::result::Result<u64, String> {
    let count: u64 = field
        .trim()
        .parse()
        .map_err(|_| format!("invalid count '{}'", field.trim()))?;
    if count == 0 {
        return Err("count must be positive".to_string());
    }
    Ok(count)
}

fn tab_fields(line: &str) -> std::result::Result<[&str; 3], String> {
    let fields: Vec<&str> = line.split('\t').collect();
    match fields.as_slice() {
        &[count, a, b] => Ok([count, a, b]),
        _ => Err(format!("expected 3 tab-separated fields, found {}", fields.len())),
    }
}

impl CorpusFormat for Baseline {
    fn parse_line(line: &str, normalizer: &Normalizer) -> std::result::Result<DataPoint<Self>, String> {
        let line = line.trim();
        let (count, word) = match line.split_once(char::is_whitespace) {
            Some((first, rest)) if first.bytes().all(|b| b.is_ascii_digit()) => {
                (parse_count(first)?, rest.trim())
            }
            _ => (1, line),
        };
        if word.is_empty() {
            return Err("empty compound".to_string());
        }
        if word.contains(char::is_whitespace) {
            return Err(format!("compound '{}' contains whitespace", word));
        }
        Ok(DataPoint::new(count, Baseline::new(&normalizer.normalize(word))))
    }
}

impl CorpusFormat for Parallel {
    fn parse_line(line: &str, normalizer: &Normalizer) -> std::result::Result<DataPoint<Self>, String> {
        let [count, graphemes, phonemes] = tab_fields(line)?;
        let count = parse_count(count)?;
        let graphemes = normalizer.normalize(graphemes.trim());
        let phonemes: Vec<_> = phonemes
            .split_whitespace()
            .map(|p| normalizer.normalize(p))
            .collect();
        let compound = Parallel::new(&graphemes, &phonemes[..]).map_err(|e| e.to_string())?;
        Ok(DataPoint::new(count, compound))
    }
}

impl CorpusFormat for Cognate {
    fn parse_line(line: &str, normalizer: &Normalizer) -> std::result::Result<DataPoint<Self>, String> {
        let [count, src, trg] = tab_fields(line)?;
        let count = parse_count(count)?;
        let src = normalizer.normalize(src.trim());
        let trg = normalizer.normalize(trg.trim());
        if src.is_empty() && trg.is_empty() {
            return Err("both sides are empty".to_string());
        }
        let compound = Cognate::compound(&src, &trg).map_err(|e| e.to_string())?;
        Ok(DataPoint::new(count, compound))
    }
}

/// Parse a whole corpus; `source` names the input in error messages.
pub fn parse_corpus<C, R>(reader: R, source: &Path, normalizer: &Normalizer) -> Result<Vec<DataPoint<C>>>
where
    C: CorpusFormat,
    R: BufRead,
{
    let mut data = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| MorphError::io(source, e))?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        let dp = C::parse_line(line, normalizer).map_err(|reason| MorphError::corpus(i + 1, reason))?;
        data.push(dp);
    }
    Ok(data)
}

/// Read a corpus file.
pub fn read_corpus<C: CorpusFormat>(path: &Path, normalizer: &Normalizer) -> Result<Vec<DataPoint<C>>> {
    let file = File::open(path).map_err(|e| MorphError::io(path, e))?;
    parse_corpus(BufReader::new(file), path, normalizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<C: CorpusFormat>(text: &str) -> Result<Vec<DataPoint<C>>> {
        parse_corpus(text.as_bytes(), Path::new("test"), &Normalizer::default())
    }

    #[test]
    fn test_baseline_optional_count() {
        let data: Vec<DataPoint<Baseline>> = parse("3 walking\ntalked\n\n").unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].count, 3);
        assert_eq!(data[0].compound.as_str(), "walking");
        assert_eq!(data[1].count, 1);
    }

    #[test]
    fn test_baseline_rejects_inner_whitespace() {
        let err = parse::<Baseline>("walking\nnew york\n").unwrap_err();
        assert!(matches!(err, MorphError::CorpusFormat { line: 2, .. }));
    }

    #[test]
    fn test_parallel_line() {
        let data: Vec<DataPoint<Parallel>> = parse("2\tshoe\tsh uː\n").unwrap();
        assert_eq!(data[0].compound.graphemes(), "shoe");
        assert_eq!(data[0].compound.phonemes().len(), 2);
    }

    #[test]
    fn test_cognate_wildcards_and_markers() {
        let data: Vec<DataPoint<Cognate>> =
            parse("3\twalking\tmarche\n1\ttalking\t\n").unwrap();
        assert_eq!(data[0].compound.src().as_str(), "walking\u{2059}");
        assert!(data[1].compound.trg().is_wildcard());
    }

    #[test]
    fn test_cognate_errors_carry_line() {
        let err = parse::<Cognate>("1\ta\tb\n0\tc\td\n").unwrap_err();
        assert!(matches!(err, MorphError::CorpusFormat { line: 2, .. }));
        let err = parse::<Cognate>("1\t\t\n").unwrap_err();
        assert!(matches!(err, MorphError::CorpusFormat { line: 1, .. }));
        let err = parse::<Cognate>("1\tonly-two\n").unwrap_err();
        assert!(matches!(err, MorphError::CorpusFormat { line: 1, .. }));
    }

    #[test]
    fn test_normalization_applied() {
        let data: Vec<DataPoint<Baseline>> = parse("1 cafe\u{0301}\n").unwrap();
        assert_eq!(data[0].compound.as_str(), "caf\u{00e9}");
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let normalizer = Normalizer::default();
        let err = read_corpus::<Baseline>(Path::new("/nonexistent/corpus.txt"), &normalizer)
            .unwrap_err();
        assert!(matches!(err, MorphError::Io { .. }));
    }
}
