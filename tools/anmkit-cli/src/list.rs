//! The list command: disassemble an archive to spec text.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anmkit_common::Archive;
use anmkit_common::textspec::dump_archive;
use anyhow::{Context as _, Result};
use clap::Args;

use crate::common::CommonArgs;

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Archive to disassemble
    pub archive: PathBuf,

    /// Prefix each instruction with its file and script offsets
    #[arg(short = 'o', long)]
    pub print_offsets: bool,

    /// Synthesize a unique filename field per entry
    #[arg(short, long)]
    pub unique_filenames: bool,
}

pub fn execute(args: ListArgs) -> Result<()> {
    let mut ctx = args.common.build_context()?;
    ctx.print_offsets = args.print_offsets;
    ctx.unique_filenames = args.unique_filenames;

    let bytes = fs::read(&args.archive)
        .with_context(|| format!("could not open {} for reading", args.archive.display()))?;
    let archive = Archive::read_from_bytes(&bytes, args.common.game)
        .with_context(|| format!("{}: decode failed", args.archive.display()))?;

    let stdout = io::stdout().lock();
    let mut out = io::BufWriter::new(stdout);
    dump_archive(
        &mut out,
        &archive,
        args.common.game,
        &args.archive.to_string_lossy(),
        &ctx,
    )?;
    out.flush()?;
    Ok(())
}
