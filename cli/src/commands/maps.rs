//! Extract-maps command implementation.

use clap::Parser;
use std::path::PathBuf;

/// Extract-maps command arguments.
#[derive(Parser)]
pub struct ExtractMapsCommand {
    /// Cognate segmentation file (`count c1 + c2 ...`)
    pub input: PathBuf,

    /// Output: source morphs, one segmented word per line
    pub src_map: PathBuf,

    /// Output: target morphs, one segmented word per line
    pub trg_map: PathBuf,

    /// Output: one-to-one linked morphs, `src<TAB>trg`
    pub linked_morphs: PathBuf,
}

use anyhow::{Context, Result as AnyhowResult};
use cogmorph::io::{read_seg_maps, write_seg_maps};
use log::info;

pub fn run(cmd: ExtractMapsCommand) -> AnyhowResult<()> {
    let maps = read_seg_maps(&cmd.input)
        .with_context(|| format!("failed to read {}", cmd.input.display()))?;
    write_seg_maps(&maps, &cmd.src_map, &cmd.trg_map, &cmd.linked_morphs)
        .context("failed to write maps")?;
    info!(
        "{} source lines, {} target lines, {} links",
        maps.src_lines.len(),
        maps.trg_lines.len(),
        maps.links.len()
    );
    Ok(())
}
