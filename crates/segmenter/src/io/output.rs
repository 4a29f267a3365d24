//! Segmentation files and edit-cost reports.
//!
//! A segmentation line is `count c1 + c2 + ...` with each construction in
//! its rendered form. The same format is read back to seed a model.

use crate::normalize::Normalizer;
use cogmorph_core::{
    render_parts, Construction, DataPoint, EditOp, MorphError, Result, PIECE_SEPARATOR,
};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Render one segmentation line.
pub fn format_segmentation<C: Construction>(count: u64, parts: &[C]) -> String {
    format!("{} {}", count, render_parts(parts))
}

/// Parse `count c1 + c2 + ...`.
pub fn parse_segmentation_line<C: Construction>(
    line: &str,
    normalizer: &Normalizer,
) -> std::result::Result<(u64, Vec<C>), String> {
    let line = line.trim_end();
    let (count, rest) = line
        .split_once(' ')
        .ok_or_else(|| "expected 'count segmentation'".to_string())?;
    let count: u64 = count
        .trim()
        .parse()
        .map_err(|_| format!("invalid count '{}'", count.trim()))?;
    if count == 0 {
        return Err("count must be positive".to_string());
    }
    let rest = normalizer.normalize(rest);
    let parts = rest
        .split(PIECE_SEPARATOR)
        .map(|piece| C::parse(piece).map_err(|e| e.to_string()))
        .collect::<std::result::Result<Vec<C>, String>>()?;
    Ok((count, parts))
}

/// Write segmentation lines.
pub fn write_segmentations<'a, C, W, I>(writer: &mut W, entries: I) -> Result<()>
where
    C: Construction + 'a,
    W: Write,
    I: IntoIterator<Item = (u64, &'a [C])>,
{
    for (count, parts) in entries {
        writeln!(writer, "{}", format_segmentation(count, parts))
            .map_err(|e| MorphError::Save(format!("Failed to write segmentation: {}", e)))?;
    }
    writer
        .flush()
        .map_err(|e| MorphError::Save(format!("Failed to flush segmentations: {}", e)))
}

/// Write segmentation lines to a file.
pub fn save_segmentations<'a, C, I>(path: &Path, entries: I) -> Result<()>
where
    C: Construction + 'a,
    I: IntoIterator<Item = (u64, &'a [C])>,
{
    let file = File::create(path).map_err(|e| MorphError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write_segmentations(&mut writer, entries)
}

/// Read a segmentation file as seeded corpus entries.
pub fn read_segmentations<C: Construction>(
    path: &Path,
    normalizer: &Normalizer,
) -> Result<Vec<DataPoint<C>>> {
    let file = File::open(path).map_err(|e| MorphError::io(path, e))?;
    parse_segmentations(BufReader::new(file), path, normalizer)
}

/// Parse segmentation lines; `source` names the input in error messages.
pub fn parse_segmentations<C: Construction, R: BufRead>(
    reader: R,
    source: &Path,
    normalizer: &Normalizer,
) -> Result<Vec<DataPoint<C>>> {
    let mut data = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| MorphError::io(source, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let (count, parts) = parse_segmentation_line::<C>(&line, normalizer)
            .map_err(|reason| MorphError::corpus(i + 1, reason))?;
        let dp = DataPoint::from_parts(count, &parts)
            .map_err(|e| MorphError::corpus(i + 1, e.to_string()))?;
        data.push(dp);
    }
    Ok(data)
}

/// Write `count<TAB>src/trg` lines; entries are written in the given order.
pub fn write_edit_report<W: Write>(writer: &mut W, report: &[(EditOp, u64)]) -> Result<()> {
    for (op, count) in report.iter().filter(|(_, c)| *c > 0) {
        writeln!(writer, "{}\t{}", count, op)
            .map_err(|e| MorphError::Save(format!("Failed to write edit report: {}", e)))?;
    }
    writer
        .flush()
        .map_err(|e| MorphError::Save(format!("Failed to flush edit report: {}", e)))
}
