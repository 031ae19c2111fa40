//! The create command: compile a spec file into an archive.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anmkit_common::texture::replace_chain;
use anmkit_common::{Archive, Context, SymbolTable, resolve_symbols};
use anmkit_common::textspec::parse_spec;
use anyhow::{Context as _, Result};
use clap::Args;

use crate::common::CommonArgs;
use crate::extract::extraction_chains;

#[derive(Args)]
pub struct CreateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Output archive path
    pub archive: PathBuf,

    /// Spec file to compile
    pub spec: PathBuf,

    /// Write sprite/script symbol ids to this file as globaldefs
    #[arg(short, long, value_name = "FILE")]
    pub symbols: Option<PathBuf>,

    /// Treat entries individually instead of composing chains
    #[arg(short, long)]
    pub unique: bool,
}

fn write_symbol_file(path: &PathBuf, symbols: &SymbolTable) -> Result<()> {
    let mut out = fs::File::create(path)
        .with_context(|| format!("could not open {} for writing", path.display()))?;
    for (name, id) in symbols.sprites().iter().chain(symbols.scripts()) {
        writeln!(out, "global {name} = {id};")?;
    }
    Ok(())
}

/// Paint the source images into the freshly allocated texture payloads,
/// chain by chain.
fn compose_textures(archive: &mut Archive, game: u32, ctx: &Context) -> Result<()> {
    for chain in extraction_chains(archive, ctx) {
        let first = &archive.entries[chain[0]];
        if first.header.has_data == 0 {
            continue;
        }
        let image = PathBuf::from(first.image_filename());
        replace_chain(archive, &chain, &image, None, game, ctx)
            .with_context(|| format!("could not compose {}", image.display()))?;
    }
    Ok(())
}

pub fn execute(args: CreateArgs) -> Result<()> {
    let mut ctx = args.common.build_context()?;
    ctx.unique_filenames = args.unique;
    let game = args.common.game;

    let source = fs::read_to_string(&args.spec)
        .with_context(|| format!("could not open {} for reading", args.spec.display()))?;
    let mut output = parse_spec(&source, game, &ctx)
        .with_context(|| format!("{}: parse failed", args.spec.display()))?;
    println!(
        "Compiling {} ({} entries)",
        args.spec.display(),
        output.archive.entries.len()
    );

    if let Some(path) = &args.symbols {
        write_symbol_file(path, &output.symbols)?;
    }

    resolve_symbols(&mut output.archive, &output.symbols, ctx.force)?;
    output.archive.apply_defaults(game)?;
    output.archive.allocate_missing_payloads();
    compose_textures(&mut output.archive, game, &ctx)?;

    let bytes = output.archive.write_to_bytes(game)?;
    fs::write(&args.archive, &bytes)
        .with_context(|| format!("could not write {}", args.archive.display()))?;
    println!("  Output: {} ({} bytes)", args.archive.display(), bytes.len());
    Ok(())
}
