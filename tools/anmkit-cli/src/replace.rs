//! The replace command: swap one texture chain in place inside an archive.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use anmkit_common::texture::replace_chain;
use anmkit_common::version::is_th19_or_newer;
use anmkit_common::Archive;
use anyhow::{Context as _, Result, bail};
use clap::Args;

use crate::common::CommonArgs;

#[derive(Args)]
pub struct ReplaceArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Archive to patch
    pub archive: PathBuf,

    /// Entry name whose chain gets replaced
    pub name: String,

    /// Replacement image (PNG)
    pub image: PathBuf,
}

pub fn execute(args: ReplaceArgs) -> Result<()> {
    let ctx = args.common.build_context()?;
    let game = args.common.game;
    if is_th19_or_newer(game) {
        bail!("replace does not support game 19 and later");
    }

    let bytes = fs::read(&args.archive)
        .with_context(|| format!("could not open {} for reading", args.archive.display()))?;
    let mut archive = Archive::read_from_bytes(&bytes, game)
        .with_context(|| format!("{}: decode failed", args.archive.display()))?;

    let chain = archive.chain_for_name(&args.name);
    if chain.is_empty() {
        bail!(
            "{}: {} not found in archive",
            args.archive.display(),
            args.name
        );
    }

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&args.archive)
        .with_context(|| format!("could not open {} for writing", args.archive.display()))?;
    replace_chain(&mut archive, &chain, &args.image, Some(&mut file), game, &ctx)?;

    println!(
        "Replaced {} ({} chain member(s))",
        args.name,
        chain.len()
    );
    Ok(())
}
