//! anmkit - ANM archive tool
//!
//! # Commands
//!
//! - `anmkit list` - disassemble an archive to spec text
//! - `anmkit extract` - extract textures as PNG files
//! - `anmkit extract-many` - extract from several archives, joining chains
//! - `anmkit replace` - replace one texture chain in place
//! - `anmkit create` - build an archive from a spec file
//!
//! # Usage
//!
//! ```bash
//! # Disassemble with mnemonics from a map file
//! anmkit list -g 17 -m th17.anmm stage1.anm > stage1.spec
//!
//! # Pull every texture out of an archive
//! anmkit extract -g 17 stage1.anm
//!
//! # Swap one texture in place
//! anmkit replace -g 17 stage1.anm face/enemy.png face.png
//!
//! # Build the archive back from the spec
//! anmkit create -g 17 stage1.anm stage1.spec
//! ```

mod common;
mod create;
mod extract;
mod extract_many;
mod list;
mod replace;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// anmkit - ANM archive tool
#[derive(Parser)]
#[command(name = "anmkit")]
#[command(about = "Disassemble, extract, replace and build ANM archives")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Disassemble an archive to spec text on stdout
    List(list::ListArgs),

    /// Extract textures as PNG files
    Extract(extract::ExtractArgs),

    /// Extract from several archives, joining chains across them
    #[command(name = "extract-many")]
    ExtractMany(extract_many::ExtractManyArgs),

    /// Replace one texture chain in place
    Replace(replace::ReplaceArgs),

    /// Build an archive from a spec file
    Create(create::CreateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::List(args) => args.common.verbose,
        Commands::Extract(args) => args.common.verbose,
        Commands::ExtractMany(args) => args.common.verbose,
        Commands::Replace(args) => args.common.verbose,
        Commands::Create(args) => args.common.verbose,
    };
    common::init_logging(verbose);

    match cli.command {
        Commands::List(args) => list::execute(args),
        Commands::Extract(args) => extract::execute(args),
        Commands::ExtractMany(args) => extract_many::execute(args),
        Commands::Replace(args) => replace::execute(args),
        Commands::Create(args) => create::execute(args),
    }
}
