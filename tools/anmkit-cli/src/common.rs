//! Flags shared by every subcommand.

use std::path::PathBuf;

use anmkit_common::version::{SUPPORTED_GAMES, is_supported};
use anmkit_common::{AnmMap, Context};
use anyhow::{Result, bail};
use clap::Args;
use tracing_subscriber::EnvFilter;

#[derive(Args)]
pub struct CommonArgs {
    /// Game version the archive targets (95 means 9.5, 185 means 18.5)
    #[arg(short, long)]
    pub game: u32,

    /// Name map file translating opcode and variable ids (repeatable)
    #[arg(short = 'm', long = "map", value_name = "FILE")]
    pub maps: Vec<PathBuf>,

    /// Ignore errors when possible
    #[arg(short, long)]
    pub force: bool,

    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl CommonArgs {
    pub fn build_context(&self) -> Result<Context> {
        if !is_supported(self.game) {
            bail!(
                "game version {} is unsupported; expected one of {}",
                self.game,
                SUPPORTED_GAMES
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        let mut map = AnmMap::new();
        for path in &self.maps {
            // A broken map only costs mnemonics, not the whole run.
            if let Err(err) = map.load_file(path) {
                tracing::error!("{err:#}");
            }
        }
        let mut ctx = Context::new(map);
        ctx.force = self.force;
        ctx.verbose = self.verbose;
        Ok(ctx)
    }
}

pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(game: u32) -> CommonArgs {
        CommonArgs {
            game,
            maps: vec![],
            force: false,
            verbose: 0,
        }
    }

    #[test]
    fn test_game_validation() {
        assert!(args(17).build_context().is_ok());
        assert!(args(95).build_context().is_ok());
        assert!(args(21).build_context().is_err());
        assert!(args(0).build_context().is_err());
    }

    #[test]
    fn test_force_flag_lands_in_context() {
        let mut a = args(17);
        a.force = true;
        assert!(a.build_context().unwrap().force);
    }
}
