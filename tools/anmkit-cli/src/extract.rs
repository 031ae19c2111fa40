//! The extract command: write an archive's textures out as PNG files.

use std::fs;
use std::path::{Path, PathBuf};

use anmkit_common::textspec::make_unique_filename;
use anmkit_common::texture::extract_chain;
use anmkit_common::{Archive, Context, Entry};
use anyhow::{Context as _, Result};
use clap::Args;

use crate::common::CommonArgs;

#[derive(Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Archive to extract from
    pub archive: PathBuf,

    /// Entry names to extract (everything when omitted)
    pub names: Vec<String>,

    /// Extract each entry to its own synthesized filename; repeat to also
    /// ignore x/y offsets
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub unique: u8,
}

/// Chain grouping honoring unique-filename mode, where every entry stands
/// alone.
pub fn extraction_chains(archive: &Archive, ctx: &Context) -> Vec<Vec<usize>> {
    if ctx.unique_filenames {
        (0..archive.entries.len()).map(|i| vec![i]).collect()
    } else {
        archive.name_chains()
    }
}

pub fn extract_chains(
    archive: &Archive,
    archive_path: &Path,
    names: &[String],
    game: u32,
    ctx: &Context,
) -> Result<()> {
    for chain in extraction_chains(archive, ctx) {
        let first = &archive.entries[chain[0]];
        if !names.is_empty() && !names.iter().any(|n| *n == first.name) {
            continue;
        }
        let filename = if ctx.unique_filenames {
            make_unique_filename(&first.name, &archive_path.to_string_lossy(), chain[0])
        } else {
            first.name.clone()
        };
        tracing::info!("{}", first.name);
        let members: Vec<&Entry> = chain.iter().map(|&i| &archive.entries[i]).collect();
        extract_chain(&members, Path::new(&filename), game, ctx)
            .with_context(|| format!("could not extract {}", first.name))?;
    }

    for name in names {
        if !archive.entries.iter().any(|e| e.name == *name) {
            tracing::error!("{}: {name} not found in archive", archive_path.display());
        }
    }
    Ok(())
}

pub fn execute(args: ExtractArgs) -> Result<()> {
    let mut ctx = args.common.build_context()?;
    ctx.unique_filenames = args.unique >= 1;
    ctx.no_offset_border = args.unique >= 2;

    let bytes = fs::read(&args.archive)
        .with_context(|| format!("could not open {} for reading", args.archive.display()))?;
    let archive = Archive::read_from_bytes(&bytes, args.common.game)
        .with_context(|| format!("{}: decode failed", args.archive.display()))?;

    extract_chains(&archive, &args.archive, &args.names, args.common.game, &ctx)
}
