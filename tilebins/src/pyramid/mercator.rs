//! Spherical Web Mercator pyramid.
//!
//! Root space is (longitude, latitude) in degrees. Tile rows are counted from
//! the south edge (TMS orientation) so that tile y grows with latitude, which
//! keeps the root-to-tile mapping monotonic on both axes.

use std::f64::consts::PI;

use super::{check_input, clamp_index, PyramidError, TilePyramid};
use crate::coord::{BinCounts, BinIndex, Rect, TileCoord};

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Web Mercator pyramid over the whole globe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebMercatorPyramid;

impl WebMercatorPyramid {
    /// Creates the pyramid.
    pub fn new() -> Self {
        Self
    }
}

/// Fractional tile column of a longitude at a level with `n` tiles per axis.
#[inline]
fn lon_to_tile_x(lon: f64, n: f64) -> f64 {
    (lon + 180.0) / 360.0 * n
}

/// Fractional TMS tile row of a latitude (0 at the south edge).
#[inline]
fn lat_to_tile_y(lat: f64, n: f64) -> f64 {
    let lat_rad = lat * PI / 180.0;
    (1.0 + lat_rad.tan().asinh() / PI) / 2.0 * n
}

#[inline]
fn tile_x_to_lon(x: f64, n: f64) -> f64 {
    x / n * 360.0 - 180.0
}

/// Latitude of a fractional TMS tile row.
#[inline]
fn tile_y_to_lat(y: f64, n: f64) -> f64 {
    let lat_rad = (PI * (2.0 * y / n - 1.0)).sinh().atan();
    lat_rad * 180.0 / PI
}

impl TilePyramid for WebMercatorPyramid {
    fn root_to_tile(
        &self,
        lon: f64,
        lat: f64,
        level: u8,
        bins: BinCounts,
    ) -> Result<TileCoord, PyramidError> {
        let n = check_input(lon, lat, level)?;

        let lon = lon.clamp(MIN_LON, MAX_LON);
        let lat = lat.clamp(MIN_LAT, MAX_LAT);

        Ok(TileCoord::with_bin_counts(
            level,
            clamp_index(lon_to_tile_x(lon, n), n),
            clamp_index(lat_to_tile_y(lat, n), n),
            bins,
        ))
    }

    fn tile_bounds(&self, tile: &TileCoord) -> Rect {
        let n = 2f64.powi(tile.level as i32);
        let x = tile.x_index as f64;
        let y = tile.y_index as f64;

        Rect::new(
            tile_x_to_lon(x, n),
            tile_y_to_lat(y, n),
            tile_x_to_lon(x + 1.0, n),
            tile_y_to_lat(y + 1.0, n),
        )
    }

    /// Bins are equal in projected space, so bin rows are not equal in
    /// latitude.
    fn tile_bin_bounds(&self, tile: &TileCoord, bin: BinIndex) -> Rect {
        let n = 2f64.powi(tile.level as i32);
        let xb = tile.x_bin_count as f64;
        let yb = tile.y_bin_count as f64;

        let left = tile.x_index as f64 + bin.x as f64 / xb;
        let right = tile.x_index as f64 + (bin.x as f64 + 1.0) / xb;
        // Bin row 0 sits at the tile's north edge.
        let top = tile.y_index as f64 + (yb - bin.y as f64) / yb;
        let bottom = tile.y_index as f64 + (yb - bin.y as f64 - 1.0) / yb;

        Rect::new(
            tile_x_to_lon(left, n),
            tile_y_to_lat(bottom, n),
            tile_x_to_lon(right, n),
            tile_y_to_lat(top, n),
        )
    }

    fn name(&self) -> &str {
        "web-mercator"
    }
}
