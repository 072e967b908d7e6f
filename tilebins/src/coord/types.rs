//! Coordinate type definitions

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Bins per tile axis used by deployments that don't say otherwise.
pub const DEFAULT_BIN_COUNT: u32 = 256;

/// Highest supported pyramid level.
///
/// At level 31 a tile index spans `0..2^31`, which still fits `u32`.
pub const MAX_LEVEL: u8 = 31;

/// Errors that can occur while building or parsing coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Tile key text is not `level,x,y`
    #[error("Invalid tile key: '{0}' (expected 'level,x,y')")]
    InvalidTileKey(String),

    /// Bin counts must both be positive
    #[error("Invalid bin counts: {x}x{y} (both must be positive)")]
    InvalidBinCount { x: u32, y: u32 },

    /// Level is above [`MAX_LEVEL`]
    #[error("Invalid level: {0} (must be between 0 and {max})", max = MAX_LEVEL)]
    InvalidLevel(u8),
}

/// Identity of a tile: `(level, x, y)` in that order.
///
/// This is the sole lookup key for cached tile state. Two coordinates with the
/// same level and indices always produce equal keys, whatever their bin counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    /// Pyramid level (zoom)
    pub level: u8,
    /// Column index, increasing with root-space x
    pub x_index: u32,
    /// Row index, increasing with root-space y
    pub y_index: u32,
}

impl TileKey {
    /// Creates a key from its parts.
    pub fn new(level: u8, x_index: u32, y_index: u32) -> Self {
        Self {
            level,
            x_index,
            y_index,
        }
    }

    /// Key of one bin inside this tile.
    pub fn bin_key(&self, bin: BinIndex) -> BinKey {
        BinKey { tile: *self, bin }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.level, self.x_index, self.y_index)
    }
}

impl FromStr for TileKey {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoordError::InvalidTileKey(s.to_string());

        let mut parts = s.split(',').map(str::trim);
        let level = parts.next().ok_or_else(invalid)?;
        let x = parts.next().ok_or_else(invalid)?;
        let y = parts.next().ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        let level: u8 = level.parse().map_err(|_| invalid())?;
        if level > MAX_LEVEL {
            return Err(CoordError::InvalidLevel(level));
        }

        Ok(Self {
            level,
            x_index: x.parse().map_err(|_| invalid())?,
            y_index: y.parse().map_err(|_| invalid())?,
        })
    }
}

impl Serialize for TileKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Size of the bin grid inside one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinCounts {
    /// Bins along x
    pub x: u32,
    /// Bins along y
    pub y: u32,
}

impl BinCounts {
    /// Creates bin counts, rejecting empty grids.
    pub fn new(x: u32, y: u32) -> Result<Self, CoordError> {
        if x == 0 || y == 0 {
            return Err(CoordError::InvalidBinCount { x, y });
        }
        Ok(Self { x, y })
    }

    /// Total number of bins in one tile.
    #[inline]
    pub fn total(&self) -> usize {
        self.x as usize * self.y as usize
    }
}

impl Default for BinCounts {
    fn default() -> Self {
        Self {
            x: DEFAULT_BIN_COUNT,
            y: DEFAULT_BIN_COUNT,
        }
    }
}

/// A tile together with the shape of its bin grid.
///
/// Equality and hashing only look at `(level, x_index, y_index)`; bin counts
/// are a per-deployment constant and not part of identity.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TileCoord {
    /// Pyramid level (zoom)
    pub level: u8,
    /// Column index
    pub x_index: u32,
    /// Row index
    pub y_index: u32,
    /// Bins along x
    pub x_bin_count: u32,
    /// Bins along y
    pub y_bin_count: u32,
}

impl TileCoord {
    /// Creates a tile coordinate with the default 256×256 bin grid.
    pub fn new(level: u8, x_index: u32, y_index: u32) -> Self {
        Self::with_bin_counts(level, x_index, y_index, BinCounts::default())
    }

    /// Creates a tile coordinate with an explicit bin grid.
    pub fn with_bin_counts(level: u8, x_index: u32, y_index: u32, bins: BinCounts) -> Self {
        Self {
            level,
            x_index,
            y_index,
            x_bin_count: bins.x,
            y_bin_count: bins.y,
        }
    }

    /// The cache key for this tile.
    #[inline]
    pub fn key(&self) -> TileKey {
        TileKey::new(self.level, self.x_index, self.y_index)
    }

    /// The bin grid of this tile.
    #[inline]
    pub fn bin_counts(&self) -> BinCounts {
        BinCounts {
            x: self.x_bin_count,
            y: self.y_bin_count,
        }
    }

    /// Returns an iterator over every bin of this tile.
    ///
    /// Bins are yielded in row-major order (x fastest, then y).
    #[inline]
    pub fn bins(&self) -> TileBinsIterator {
        TileBinsIterator {
            counts: self.bin_counts(),
            current: 0,
        }
    }
}

impl PartialEq for TileCoord {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TileCoord {}

impl Hash for TileCoord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl From<TileCoord> for TileKey {
    fn from(coord: TileCoord) -> Self {
        coord.key()
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{},{}/{}, lvl {}]",
            self.x_index, self.x_bin_count, self.y_index, self.y_bin_count, self.level
        )
    }
}

/// Iterator over all bins in a tile.
#[derive(Debug, Clone)]
pub struct TileBinsIterator {
    counts: BinCounts,
    current: usize,
}

impl Iterator for TileBinsIterator {
    type Item = BinIndex;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.counts.total() {
            return None;
        }

        let x = (self.current % self.counts.x as usize) as u32;
        let y = (self.current / self.counts.x as usize) as u32;
        self.current += 1;

        Some(BinIndex { x, y })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.counts.total() - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileBinsIterator {}

/// Position of a bin inside its tile. `y = 0` is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinIndex {
    /// Bin column
    pub x: u32,
    /// Bin row, 0 at the tile's top (max-Y) edge
    pub y: u32,
}

impl BinIndex {
    /// Creates a bin index.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for BinIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Globally unique key of one bin: its tile key plus its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinKey {
    /// Owning tile
    pub tile: TileKey,
    /// Position within the tile
    pub bin: BinIndex,
}

impl fmt::Display for BinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tile, self.bin)
    }
}

impl Serialize for BinKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Axis-aligned rectangle in a pyramid's root coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    /// Creates a rectangle from its edges.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Extent along x.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Extent along y.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}
