//! Linear "area of interest" pyramid.
//!
//! Root space is an arbitrary rectangle. Level `L` splits each axis into
//! `2^L` equal tiles; tile y grows with root y.

use super::{check_input, clamp_index, PyramidError, TilePyramid};
use crate::coord::{BinCounts, Rect, TileCoord};

/// Pyramid over a fixed root rectangle with linear subdivision.
#[derive(Debug, Clone, PartialEq)]
pub struct AoiPyramid {
    bounds: Rect,
}

impl AoiPyramid {
    /// Creates a pyramid covering the given root rectangle.
    ///
    /// # Errors
    ///
    /// Returns [`PyramidError::InvalidBounds`] if an edge is non-finite or the
    /// rectangle is empty or inverted.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self, PyramidError> {
        let bounds = Rect::new(min_x, min_y, max_x, max_y);
        let finite = [min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite());

        if !finite || min_x >= max_x || min_y >= max_y {
            return Err(PyramidError::InvalidBounds(format!(
                "[{}, {}] x [{}, {}]",
                min_x, max_x, min_y, max_y
            )));
        }

        Ok(Self { bounds })
    }

    /// The root rectangle this pyramid covers.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }
}

impl TilePyramid for AoiPyramid {
    fn root_to_tile(
        &self,
        x: f64,
        y: f64,
        level: u8,
        bins: BinCounts,
    ) -> Result<TileCoord, PyramidError> {
        let n = check_input(x, y, level)?;

        let fx = (x - self.bounds.min_x) / self.bounds.width() * n;
        let fy = (y - self.bounds.min_y) / self.bounds.height() * n;

        Ok(TileCoord::with_bin_counts(
            level,
            clamp_index(fx, n),
            clamp_index(fy, n),
            bins,
        ))
    }

    fn tile_bounds(&self, tile: &TileCoord) -> Rect {
        let n = 2f64.powi(tile.level as i32);
        let tile_width = self.bounds.width() / n;
        let tile_height = self.bounds.height() / n;

        let min_x = self.bounds.min_x + tile_width * tile.x_index as f64;
        let min_y = self.bounds.min_y + tile_height * tile.y_index as f64;

        Rect::new(min_x, min_y, min_x + tile_width, min_y + tile_height)
    }

    fn name(&self) -> &str {
        "aoi"
    }
}
