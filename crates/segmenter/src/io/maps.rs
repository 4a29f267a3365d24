//! Corpus preparation and post-processing tools for cognate models.
//!
//! [`extract_seg_maps`] turns a cognate segmentation file into one
//! morph-segmented word list per side plus a one-to-one list of linked
//! morphs. [`merge_word_lists`] builds a cognate corpus out of two
//! monolingual frequency lists and a list of candidate cognate pairs.

use ahash::{AHashMap, AHashSet};
use cogmorph_core::{MorphError, Result, BOUNDARY, DELIM, PIECE_SEPARATOR};
use cogmorph_training::most_common;
use log::info;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Output of [`extract_seg_maps`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegMaps {
    /// Source morphs of each line, space-joined
    pub src_lines: Vec<String>,
    /// Target morphs of each line, space-joined
    pub trg_lines: Vec<String>,
    /// One-to-one morph links, most frequent first
    pub links: Vec<(String, String)>,
}

/// Split a cognate segmentation file into per-side morph lists and links.
///
/// Boundary markers are stripped, empty sides are dropped from the side
/// lists, and a link is counted once per occurrence of a two-sided piece.
/// The link list is greedy: a morph already linked is never linked again.
pub fn extract_seg_maps<R: BufRead>(reader: R, source: &Path) -> Result<SegMaps> {
    let mut maps = SegMaps::default();
    let mut links: AHashMap<(String, String), u64> = AHashMap::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| MorphError::io(source, e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (_, seg) = line
            .split_once(' ')
            .ok_or_else(|| MorphError::corpus(i + 1, "expected 'count segmentation'"))?;
        let seg = seg.replace(BOUNDARY, "");

        let mut srcs = Vec::new();
        let mut trgs = Vec::new();
        for piece in seg.split(PIECE_SEPARATOR) {
            let (src, trg) = piece.split_once(DELIM).ok_or_else(|| {
                MorphError::corpus(i + 1, format!("piece '{}' has no side delimiter", piece))
            })?;
            if !src.is_empty() && !trg.is_empty() {
                *links.entry((src.to_string(), trg.to_string())).or_default() += 1;
            }
            if !src.is_empty() {
                srcs.push(src);
            }
            if !trg.is_empty() {
                trgs.push(trg);
            }
        }
        if !srcs.is_empty() {
            maps.src_lines.push(srcs.join(" "));
        }
        if !trgs.is_empty() {
            maps.trg_lines.push(trgs.join(" "));
        }
    }

    let mut seen_src = AHashSet::new();
    let mut seen_trg = AHashSet::new();
    for ((src, trg), _) in most_common(links, None) {
        if seen_src.contains(&src) || seen_trg.contains(&trg) {
            continue;
        }
        seen_src.insert(src.clone());
        seen_trg.insert(trg.clone());
        maps.links.push((src, trg));
    }
    Ok(maps)
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| MorphError::io(path, e))?;
    Ok(BufWriter::new(file))
}

fn write_lines<W: Write, I: IntoIterator<Item = String>>(writer: &mut W, lines: I) -> Result<()> {
    for line in lines {
        writeln!(writer, "{}", line)
            .map_err(|e| MorphError::Save(format!("Failed to write line: {}", e)))?;
    }
    writer
        .flush()
        .map_err(|e| MorphError::Save(format!("Failed to flush output: {}", e)))
}

/// Write the three outputs of [`extract_seg_maps`].
pub fn write_seg_maps(maps: &SegMaps, src_path: &Path, trg_path: &Path, links_path: &Path) -> Result<()> {
    write_lines(&mut create(src_path)?, maps.src_lines.iter().cloned())?;
    write_lines(&mut create(trg_path)?, maps.trg_lines.iter().cloned())?;
    write_lines(
        &mut create(links_path)?,
        maps.links.iter().map(|(s, t)| format!("{}\t{}", s, t)),
    )
}

/// A candidate cognate pair with its string distance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CognateCandidate {
    pub dist: u64,
    pub src: String,
    pub trg: String,
}

/// Options for [`merge_word_lists`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConfig {
    /// Minimum unscaled count for a non-cognate word to be kept
    pub count_threshold: u64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self { count_threshold: 2 }
    }
}

/// One line of a merged cognate corpus. Empty sides are wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedEntry {
    pub count: u64,
    pub src: String,
    pub trg: String,
}

impl fmt::Display for MergedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.count, self.src, self.trg)
    }
}

fn to_table(words: &[(String, u64)]) -> AHashMap<&str, u64> {
    words.iter().map(|(w, c)| (w.as_str(), *c)).collect()
}

fn scaled(table: &AHashMap<&str, u64>, mult: f64) -> AHashMap<String, u64> {
    table
        .iter()
        .map(|(w, c)| (w.to_string(), (*c as f64 * mult) as u64))
        .collect()
}

/// Build a cognate corpus from two word-count lists and candidate pairs.
///
/// The list with the smaller total is rescaled to the larger total. Each
/// candidate gets the rounded-up mean of its two scaled counts; candidates
/// are taken best first (lowest distance, then highest count) such that
/// every word is in at most one pair. Words in a selected pair leave the
/// monolingual part of the output, which keeps only words whose unscaled
/// count reaches the threshold. Output order: sources, targets, cognates.
pub fn merge_word_lists(
    srcs: &[(String, u64)],
    trgs: &[(String, u64)],
    cognates: &[CognateCandidate],
    config: &MergeConfig,
) -> Result<Vec<MergedEntry>> {
    let src_raw = to_table(srcs);
    let trg_raw = to_table(trgs);
    let src_sum: u64 = src_raw.values().sum();
    let trg_sum: u64 = trg_raw.values().sum();
    if src_sum == 0 || trg_sum == 0 {
        return Err(MorphError::InvalidConfig(
            "word lists must have a positive total count".to_string(),
        ));
    }

    let (src_counts, trg_counts, mult) = if src_sum < trg_sum {
        let mult = trg_sum as f64 / src_sum as f64;
        (scaled(&src_raw, mult), scaled(&trg_raw, 1.0), mult)
    } else {
        let mult = src_sum as f64 / trg_sum as f64;
        (scaled(&src_raw, 1.0), scaled(&trg_raw, mult), mult)
    };
    info!("Source total: {}, target total: {}, scale: {}", src_sum, trg_sum, mult);

    let mut ranked: Vec<(u64, std::cmp::Reverse<u64>, &str, &str)> = cognates
        .iter()
        .map(|c| {
            let s = src_counts.get(&c.src).copied().unwrap_or(0);
            let t = trg_counts.get(&c.trg).copied().unwrap_or(0);
            let count = (s + t).div_ceil(2);
            (c.dist, std::cmp::Reverse(count), c.src.as_str(), c.trg.as_str())
        })
        .collect();
    ranked.sort();

    let mut cog_src = AHashSet::new();
    let mut cog_trg = AHashSet::new();
    let mut selected = Vec::new();
    for (_, std::cmp::Reverse(count), src, trg) in ranked {
        if cog_src.contains(src) || cog_trg.contains(trg) {
            continue;
        }
        cog_src.insert(src);
        cog_trg.insert(trg);
        selected.push(MergedEntry {
            count: count.max(1),
            src: src.to_string(),
            trg: trg.to_string(),
        });
    }

    let mut merged = Vec::new();
    for (word, count) in most_common(src_counts, None) {
        if cog_src.contains(word.as_str()) {
            continue;
        }
        if src_raw.get(word.as_str()).copied().unwrap_or(0) >= config.count_threshold {
            merged.push(MergedEntry {
                count,
                src: word,
                trg: String::new(),
            });
        }
    }
    for (word, count) in most_common(trg_counts, None) {
        if cog_trg.contains(word.as_str()) {
            continue;
        }
        if trg_raw.get(word.as_str()).copied().unwrap_or(0) >= config.count_threshold {
            merged.push(MergedEntry {
                count,
                src: String::new(),
                trg: word,
            });
        }
    }
    merged.extend(selected);
    Ok(merged)
}

fn parse_u64(field: &str, line: usize) -> Result<u64> {
    field
        .trim()
        .parse()
        .map_err(|_| MorphError::corpus(line, format!("invalid number '{}'", field.trim())))
}

/// Parse `count<TAB>word` lines. A repeated word keeps its last count.
pub fn parse_word_counts<R: BufRead>(reader: R, source: &Path) -> Result<Vec<(String, u64)>> {
    let mut words = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| MorphError::io(source, e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (count, word) = line
            .split_once('\t')
            .ok_or_else(|| MorphError::corpus(i + 1, "expected 'count<TAB>word'"))?;
        words.push((word.to_string(), parse_u64(count, i + 1)?));
    }
    Ok(words)
}

/// Parse `dist<TAB>source<TAB>target` lines.
pub fn parse_cognate_list<R: BufRead>(reader: R, source: &Path) -> Result<Vec<CognateCandidate>> {
    let mut cognates = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| MorphError::io(source, e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let [dist, src, trg] = fields.as_slice() else {
            return Err(MorphError::corpus(
                i + 1,
                format!("expected 3 tab-separated fields, found {}", fields.len()),
            ));
        };
        cognates.push(CognateCandidate {
            dist: parse_u64(dist, i + 1)?,
            src: src.to_string(),
            trg: trg.to_string(),
        });
    }
    Ok(cognates)
}

pub fn read_word_counts(path: &Path) -> Result<Vec<(String, u64)>> {
    let file = File::open(path).map_err(|e| MorphError::io(path, e))?;
    parse_word_counts(BufReader::new(file), path)
}

pub fn read_cognate_list(path: &Path) -> Result<Vec<CognateCandidate>> {
    let file = File::open(path).map_err(|e| MorphError::io(path, e))?;
    parse_cognate_list(BufReader::new(file), path)
}

/// Read a segmentation file from disk and extract its maps.
pub fn read_seg_maps(path: &Path) -> Result<SegMaps> {
    let file = File::open(path).map_err(|e| MorphError::io(path, e))?;
    extract_seg_maps(BufReader::new(file), path)
}

pub fn write_merged(path: &Path, entries: &[MergedEntry]) -> Result<()> {
    write_lines(&mut create(path)?, entries.iter().map(|e| e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(items: &[(&str, u64)]) -> Vec<(String, u64)> {
        items.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    fn cand(dist: u64, src: &str, trg: &str) -> CognateCandidate {
        CognateCandidate {
            dist,
            src: src.to_string(),
            trg: trg.to_string(),
        }
    }

    #[test]
    fn test_extract_seg_maps() {
        let text = "3 walk\u{FFE8}march + ing\u{2059}\u{FFE8}e\u{2059}\n\
                    2 talk\u{FFE8}march + ed\u{2059}\u{FFE8}\n\
                    1 \u{FFE8}chien\u{2059}\n";
        let maps = extract_seg_maps(text.as_bytes(), Path::new("seg")).unwrap();
        assert_eq!(maps.src_lines, vec!["walk ing", "talk ed"]);
        assert_eq!(maps.trg_lines, vec!["march e", "march", "chien"]);
        // all links tie, so key order decides and walk/march loses march
        assert!(maps.links.contains(&("ing".to_string(), "e".to_string())));
        assert_eq!(
            maps.links.iter().filter(|(_, t)| t == "march").count(),
            1
        );
        assert_eq!(maps.links.len(), 2);
    }

    #[test]
    fn test_extract_seg_maps_most_common_wins() {
        let text = "1 a\u{FFE8}x\n1 a\u{FFE8}y\n1 b\u{FFE8}y\n1 b\u{FFE8}y\n";
        let maps = extract_seg_maps(text.as_bytes(), Path::new("seg")).unwrap();
        assert_eq!(
            maps.links,
            vec![
                ("b".to_string(), "y".to_string()),
                ("a".to_string(), "x".to_string())
            ]
        );
    }

    #[test]
    fn test_extract_seg_maps_rejects_missing_delimiter() {
        let err = extract_seg_maps("1 walk + ing\n".as_bytes(), Path::new("seg")).unwrap_err();
        assert!(matches!(err, MorphError::CorpusFormat { line: 1, .. }));
    }

    #[test]
    fn test_merge_word_lists() {
        let srcs = words(&[("walk", 10), ("house", 4), ("rare", 1)]);
        let trgs = words(&[("marche", 6), ("maison", 4), ("chat", 4), ("rarement", 1)]);
        let cogs = vec![
            cand(2, "walk", "marche"),
            cand(1, "house", "maison"),
            cand(3, "walk", "maison"),
        ];
        let merged = merge_word_lists(&srcs, &trgs, &cogs, &MergeConfig::default()).unwrap();
        let lines: Vec<String> = merged.iter().map(|e| e.to_string()).collect();
        // equal totals: no rescaling
        assert_eq!(
            lines,
            vec![
                "4\t\tchat".to_string(),
                "4\thouse\tmaison".to_string(),
                "8\twalk\tmarche".to_string(),
            ]
        );
    }

    #[test]
    fn test_merge_rescales_smaller_list() {
        let srcs = words(&[("a", 2)]);
        let trgs = words(&[("b", 3), ("c", 3)]);
        let merged = merge_word_lists(&srcs, &trgs, &[], &MergeConfig::default()).unwrap();
        assert_eq!(merged[0].count, 6);
        assert_eq!(merged[0].src, "a");
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_merge_unknown_cognate_gets_count_one() {
        let srcs = words(&[("a", 5)]);
        let trgs = words(&[("b", 5)]);
        let cogs = vec![cand(0, "x", "y")];
        let merged = merge_word_lists(&srcs, &trgs, &cogs, &MergeConfig::default()).unwrap();
        let last = merged.last().unwrap();
        assert_eq!((last.count, last.src.as_str(), last.trg.as_str()), (1, "x", "y"));
    }

    #[test]
    fn test_merge_empty_list_is_error() {
        let err = merge_word_lists(&[], &words(&[("b", 1)]), &[], &MergeConfig::default());
        assert!(matches!(err, Err(MorphError::InvalidConfig(_))));
    }

    #[test]
    fn test_parse_lists() {
        let words = parse_word_counts("3\twalk\n\n1\ttalk\n".as_bytes(), Path::new("w")).unwrap();
        assert_eq!(words, vec![("walk".to_string(), 3), ("talk".to_string(), 1)]);

        let cogs = parse_cognate_list("2\twalk\tmarche\n".as_bytes(), Path::new("c")).unwrap();
        assert_eq!(cogs, vec![cand(2, "walk", "marche")]);

        let err = parse_cognate_list("2\twalk\n".as_bytes(), Path::new("c")).unwrap_err();
        assert!(matches!(err, MorphError::CorpusFormat { line: 1, .. }));
    }
}
