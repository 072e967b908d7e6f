//! `tiles` command: enumerate a viewport without fetching.

use std::io::{self, Write};

use clap::Args;
use tilebins::bounds::TileBounds;
use tilebins::config::ClientConfig;
use tilebins::coord::TileCoord;

use super::common::RegionArgs;
use crate::error::CliError;

/// Arguments for `tiles`.
#[derive(Debug, Args)]
pub struct TilesArgs {
    #[command(flatten)]
    pub region: RegionArgs,

    /// Print merged tile blocks instead of individual tiles
    #[arg(long)]
    pub combine: bool,
}

/// Run the tiles command.
pub fn run(args: TilesArgs, client: ClientConfig) -> Result<(), CliError> {
    let client = args.region.apply(client)?;
    let tiles = args.region.enumerate(&client)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in render(&tiles, args.combine) {
        writeln!(out, "{}", line).map_err(CliError::Output)?;
    }
    Ok(())
}

/// One output line per tile key, or per merged block with `combine`.
fn render(tiles: &[TileCoord], combine: bool) -> Vec<String> {
    if combine {
        TileBounds::combine(tiles.iter().map(TileCoord::key))
            .iter()
            .map(TileBounds::to_string)
            .collect()
    } else {
        tiles.iter().map(|t| t.key().to_string()).collect()
    }
}
