//! The extract-many command: extract from several archives at once, joining
//! name chains across archive boundaries.

use std::fs;
use std::path::{Path, PathBuf};

use anmkit_common::textspec::make_unique_filename;
use anmkit_common::texture::extract_chain;
use anmkit_common::{Archive, Entry};
use anyhow::{Context as _, Result};
use clap::Args;

use crate::common::CommonArgs;

#[derive(Args)]
pub struct ExtractManyArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Archives to extract from
    #[arg(required = true)]
    pub archives: Vec<PathBuf>,

    /// Extract each entry to its own synthesized filename; repeat to also
    /// ignore x/y offsets
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub unique: u8,
}

pub fn execute(args: ExtractManyArgs) -> Result<()> {
    let mut ctx = args.common.build_context()?;
    ctx.unique_filenames = args.unique >= 1;
    ctx.no_offset_border = args.unique >= 2;
    let game = args.common.game;

    let mut archives = Vec::new();
    for path in &args.archives {
        let bytes = fs::read(path)
            .with_context(|| format!("could not open {} for reading", path.display()))?;
        let archive = Archive::read_from_bytes(&bytes, game)
            .with_context(|| format!("{}: decode failed", path.display()))?;
        archives.push(archive);
    }

    if ctx.unique_filenames {
        for (archive, path) in archives.iter().zip(&args.archives) {
            for (index, entry) in archive.entries.iter().enumerate() {
                tracing::info!("{}", entry.name);
                let filename =
                    make_unique_filename(&entry.name, &path.to_string_lossy(), index);
                extract_chain(&[entry], Path::new(&filename), game, &ctx)
                    .with_context(|| format!("could not extract {}", entry.name))?;
            }
        }
        return Ok(());
    }

    // Chains span archives: every entry anywhere sharing a name joins the
    // composite, in overall scan order.
    let mut order: Vec<(&str, Vec<&Entry>)> = Vec::new();
    for archive in &archives {
        for entry in &archive.entries {
            let slot = order.iter().position(|(name, _)| *name == entry.name);
            match slot {
                Some(slot) => order[slot].1.push(entry),
                None => order.push((entry.name.as_str(), vec![entry])),
            }
        }
    }

    for (name, members) in &order {
        tracing::info!("{name}");
        extract_chain(members, Path::new(name), game, &ctx)
            .with_context(|| format!("could not extract {name}"))?;
    }
    Ok(())
}
