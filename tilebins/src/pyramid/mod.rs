//! Tile pyramid abstraction
//!
//! A pyramid maps root-space positions to tile coordinates at a level, and
//! tiles (or bins within tiles) back to root-space rectangles. The enumerator
//! and the bin transform only see pyramids through [`TilePyramid`], so hosts
//! can plug in their own projection.
//!
//! # Factory Pattern
//!
//! For configuration-driven creation, use [`PyramidConfig::create`]:
//!
//! ```
//! use tilebins::pyramid::{PyramidConfig, TilePyramid};
//!
//! let pyramid = PyramidConfig::WebMercator.create().unwrap();
//! assert_eq!(pyramid.name(), "web-mercator");
//! ```

mod aoi;
mod factory;
mod mercator;

pub use aoi::AoiPyramid;
pub use factory::PyramidConfig;
pub use mercator::WebMercatorPyramid;

use thiserror::Error;

use crate::coord::{tiles_per_axis, BinCounts, BinIndex, Rect, TileCoord, MAX_LEVEL};

/// Errors raised by pyramid mappings.
///
/// These indicate malformed input to the collaborator, not runtime
/// conditions: an empty viewport is never an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PyramidError {
    /// Level is above the supported maximum
    #[error("Level {0} out of range (max {max})", max = MAX_LEVEL)]
    InvalidLevel(u8),

    /// A root-space coordinate was NaN or infinite
    #[error("Non-finite root coordinate ({x}, {y})")]
    NonFiniteCoordinate { x: f64, y: f64 },

    /// Pyramid root bounds are empty or inverted
    #[error("Invalid pyramid bounds: {0}")]
    InvalidBounds(String),
}

/// Mapping between root space and tile space.
///
/// Implementations must be pure and deterministic, and `root_to_tile` must be
/// monotonic on both axes: a larger root x never yields a smaller tile x,
/// and likewise for y. The enumerator relies on this to visit exactly the
/// covering set of tiles.
pub trait TilePyramid: Send + Sync {
    /// Resolves the tile containing a root-space point at a level.
    ///
    /// # Errors
    ///
    /// Returns [`PyramidError`] for levels above [`MAX_LEVEL`] or non-finite
    /// coordinates.
    fn root_to_tile(
        &self,
        x: f64,
        y: f64,
        level: u8,
        bins: BinCounts,
    ) -> Result<TileCoord, PyramidError>;

    /// Root-space rectangle covered by a tile.
    fn tile_bounds(&self, tile: &TileCoord) -> Rect;

    /// Root-space rectangle covered by one bin of a tile.
    ///
    /// Bin `y = 0` is the top (max-Y) row. The default divides the tile's
    /// rectangle linearly.
    fn tile_bin_bounds(&self, tile: &TileCoord, bin: BinIndex) -> Rect {
        let bounds = self.tile_bounds(tile);
        let bin_width = bounds.width() / tile.x_bin_count as f64;
        let bin_height = bounds.height() / tile.y_bin_count as f64;

        let min_x = bounds.min_x + bin_width * bin.x as f64;
        let max_y = bounds.max_y - bin_height * bin.y as f64;

        Rect::new(min_x, max_y - bin_height, min_x + bin_width, max_y)
    }

    /// Short identifier for logging.
    fn name(&self) -> &str;
}

/// Validates a root-space point and level, returning `2^level` as `f64`.
pub(crate) fn check_input(x: f64, y: f64, level: u8) -> Result<f64, PyramidError> {
    if !x.is_finite() || !y.is_finite() {
        return Err(PyramidError::NonFiniteCoordinate { x, y });
    }
    let n = tiles_per_axis(level).map_err(|_| PyramidError::InvalidLevel(level))?;
    Ok(n as f64)
}

/// Converts a fractional tile position to an index, clamped to `[0, n - 1]`.
///
/// Clamping keeps the mapping monotonic for viewports that extend past the
/// pyramid's edge.
#[inline]
pub(crate) fn clamp_index(position: f64, n: f64) -> u32 {
    position.floor().clamp(0.0, n - 1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UnitGrid;

    impl TilePyramid for UnitGrid {
        fn root_to_tile(
            &self,
            x: f64,
            y: f64,
            level: u8,
            bins: BinCounts,
        ) -> Result<TileCoord, PyramidError> {
            Ok(TileCoord::with_bin_counts(
                level,
                x.floor() as u32,
                y.floor() as u32,
                bins,
            ))
        }

        fn tile_bounds(&self, tile: &TileCoord) -> Rect {
            let x = tile.x_index as f64;
            let y = tile.y_index as f64;
            Rect::new(x, y, x + 1.0, y + 1.0)
        }

        fn name(&self) -> &str {
            "unit-grid"
        }
    }

    #[test]
    fn test_default_bin_bounds_top_row_first() {
        let tile = TileCoord::with_bin_counts(0, 2, 3, BinCounts::new(2, 2).unwrap());

        let top_left = UnitGrid.tile_bin_bounds(&tile, BinIndex::new(0, 0));
        assert_eq!(top_left, Rect::new(2.0, 3.5, 2.5, 4.0));

        let bottom_right = UnitGrid.tile_bin_bounds(&tile, BinIndex::new(1, 1));
        assert_eq!(bottom_right, Rect::new(2.5, 3.0, 3.0, 3.5));
    }

    #[test]
    fn test_check_input_rejects_nan_and_high_levels() {
        assert!(matches!(
            check_input(f64::NAN, 0.0, 1),
            Err(PyramidError::NonFiniteCoordinate { .. })
        ));
        assert_eq!(check_input(0.0, 0.0, 32), Err(PyramidError::InvalidLevel(32)));
        assert_eq!(check_input(0.0, 0.0, 3), Ok(8.0));
    }

    #[test]
    fn test_clamp_index() {
        assert_eq!(clamp_index(-3.2, 8.0), 0);
        assert_eq!(clamp_index(3.7, 8.0), 3);
        assert_eq!(clamp_index(8.0, 8.0), 7);
        assert_eq!(clamp_index(1e12, 8.0), 7);
    }
}
