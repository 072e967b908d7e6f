//! Argument types shared between commands.

use std::path::Path;

use clap::Args;
use tilebins::config::{ClientConfig, ConfigFile};
use tilebins::coord::{BinCounts, TileCoord};
use tilebins::iterator::TileIterator;
use tilebins::pyramid::PyramidConfig;

use crate::error::CliError;

/// A viewport at one pyramid level.
#[derive(Debug, Clone, Args)]
pub struct RegionArgs {
    /// Pyramid level to enumerate
    #[arg(long, short)]
    pub level: u8,

    /// Minimum root-space x (longitude for web-mercator)
    #[arg(long, allow_negative_numbers = true)]
    pub min_x: f64,

    /// Minimum root-space y (latitude for web-mercator)
    #[arg(long, allow_negative_numbers = true)]
    pub min_y: f64,

    /// Maximum root-space x
    #[arg(long, allow_negative_numbers = true)]
    pub max_x: f64,

    /// Maximum root-space y
    #[arg(long, allow_negative_numbers = true)]
    pub max_y: f64,

    /// Pyramid: web-mercator or aoi:min_x,min_y,max_x,max_y (default from config)
    #[arg(long)]
    pub pyramid: Option<PyramidConfig>,

    /// Bins per tile along x (default from config)
    #[arg(long)]
    pub x_bins: Option<u32>,

    /// Bins per tile along y (default from config)
    #[arg(long)]
    pub y_bins: Option<u32>,
}

impl RegionArgs {
    /// Applies the pyramid and bin overrides to a client config.
    pub fn apply(&self, mut client: ClientConfig) -> Result<ClientConfig, CliError> {
        if let Some(pyramid) = &self.pyramid {
            client = client.with_pyramid(pyramid.clone());
        }
        if self.x_bins.is_some() || self.y_bins.is_some() {
            let x = self.x_bins.unwrap_or(client.bins.x);
            let y = self.y_bins.unwrap_or(client.bins.y);
            let bins = BinCounts::new(x, y).map_err(|e| CliError::Usage(e.to_string()))?;
            client = client.with_bins(bins);
        }
        Ok(client)
    }

    /// Every tile covering the viewport, row by row.
    pub fn enumerate(&self, client: &ClientConfig) -> Result<Vec<TileCoord>, CliError> {
        let pyramid = client.pyramid.create()?;
        let mut iterator = TileIterator::with_bin_counts(
            pyramid.as_ref(),
            self.level,
            (self.min_x, self.min_y),
            (self.max_x, self.max_y),
            client.bins,
        )?;
        Ok(iterator.produce_all())
    }
}

/// Loads the configuration file, from `path` if given.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> RegionArgs {
        RegionArgs {
            level: 2,
            min_x: 0.1,
            min_y: 0.1,
            max_x: 0.6,
            max_y: 0.3,
            pyramid: Some(PyramidConfig::Aoi {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 1.0,
                max_y: 1.0,
            }),
            x_bins: Some(4),
            y_bins: None,
        }
    }

    #[test]
    fn test_apply_overrides() {
        let client = region().apply(ClientConfig::default()).unwrap();
        assert_eq!(client.pyramid.name(), "aoi");
        assert_eq!(client.bins, BinCounts::new(4, 256).unwrap());
    }

    #[test]
    fn test_apply_rejects_zero_bins() {
        let mut args = region();
        args.y_bins = Some(0);
        assert!(matches!(
            args.apply(ClientConfig::default()),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn test_enumerate() {
        let args = region();
        let client = args.apply(ClientConfig::default()).unwrap();
        let tiles = args.enumerate(&client).unwrap();
        assert_eq!(tiles.len(), 6);
        assert!(tiles.iter().all(|t| t.x_bin_count == 4));
    }

    #[test]
    fn test_load_config_missing_file_gives_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = load_config(Some(&temp_dir.path().join("none.ini"))).unwrap();
        assert_eq!(config, ConfigFile::default());
    }
}
