//! Tile and bin coordinates
//!
//! Provides the identity types shared by the enumerator and the tile data
//! coordinator: tile coordinates, tile keys, bin positions and bin keys.

mod types;

pub use types::{
    BinCounts, BinIndex, BinKey, CoordError, Rect, TileBinsIterator, TileCoord, TileKey,
    DEFAULT_BIN_COUNT, MAX_LEVEL,
};

/// Number of tiles along each axis at the given level (`2^level`).
///
/// # Errors
///
/// Returns [`CoordError::InvalidLevel`] above [`MAX_LEVEL`].
#[inline]
pub fn tiles_per_axis(level: u8) -> Result<u64, CoordError> {
    if level > MAX_LEVEL {
        return Err(CoordError::InvalidLevel(level));
    }
    Ok(1u64 << level)
}
