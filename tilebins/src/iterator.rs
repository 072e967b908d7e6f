//! Tile enumeration over a root-space rectangle.
//!
//! [`TileIterator`] resolves two root-space corners to tiles through a
//! [`TilePyramid`] and walks the inclusive index rectangle between them in
//! row-major order (x fastest, then y). The walk is single-pass: once
//! drained, the iterator stays empty.
//!
//! ```
//! use tilebins::iterator::TileIterator;
//! use tilebins::pyramid::AoiPyramid;
//!
//! let pyramid = AoiPyramid::new(0.0, 0.0, 1.0, 1.0).unwrap();
//! let mut tiles = TileIterator::new(&pyramid, 2, (0.1, 0.1), (0.6, 0.3)).unwrap();
//!
//! assert_eq!(tiles.len(), 6);
//! assert_eq!(tiles.bounds().to_string(), "<TileBlock[0-2, 0-1, 2]>");
//!
//! let first = tiles.next().unwrap();
//! assert_eq!(first.to_string(), "[0/256,0/256, lvl 2]");
//! assert_eq!(tiles.produce_all().len(), 5);
//! assert!(!tiles.has_next());
//! ```

use std::fmt;
use std::iter::FusedIterator;

use tracing::trace;

use crate::bounds::TileBounds;
use crate::coord::{BinCounts, TileCoord};
use crate::pyramid::{PyramidError, TilePyramid};

/// Lazy, single-pass enumeration of the tiles covering a root rectangle.
///
/// Calling [`Iterator::next`] after the last tile returns `None`; the
/// iterator never restarts.
#[derive(Debug, Clone)]
pub struct TileIterator {
    level: u8,
    bins: BinCounts,
    min_tile: TileCoord,
    max_tile: TileCoord,
    // u64 so stepping past u32::MAX at the edge cannot wrap
    cur_x: u64,
    cur_y: u64,
}

impl TileIterator {
    /// Enumerates tiles between two root-space corners with the default bin
    /// grid.
    ///
    /// Corners are resolved as given. If the resolved minimum exceeds the
    /// maximum on either axis the sequence is empty.
    ///
    /// # Errors
    ///
    /// Propagates [`PyramidError`] from the pyramid mapping.
    pub fn new<P>(
        pyramid: &P,
        level: u8,
        min_corner: (f64, f64),
        max_corner: (f64, f64),
    ) -> Result<Self, PyramidError>
    where
        P: TilePyramid + ?Sized,
    {
        Self::with_bin_counts(pyramid, level, min_corner, max_corner, BinCounts::default())
    }

    /// Enumerates tiles with an explicit bin grid stamped on every coordinate.
    ///
    /// # Errors
    ///
    /// Propagates [`PyramidError`] from the pyramid mapping.
    pub fn with_bin_counts<P>(
        pyramid: &P,
        level: u8,
        min_corner: (f64, f64),
        max_corner: (f64, f64),
        bins: BinCounts,
    ) -> Result<Self, PyramidError>
    where
        P: TilePyramid + ?Sized,
    {
        let min_tile = pyramid.root_to_tile(min_corner.0, min_corner.1, level, bins)?;
        let max_tile = pyramid.root_to_tile(max_corner.0, max_corner.1, level, bins)?;

        trace!(
            pyramid = pyramid.name(),
            level,
            min = %min_tile.key(),
            max = %max_tile.key(),
            "Resolved tile range"
        );

        Ok(Self {
            level,
            bins,
            min_tile,
            max_tile,
            cur_x: min_tile.x_index as u64,
            cur_y: min_tile.y_index as u64,
        })
    }

    /// True while at least one tile remains.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.cur_x <= self.max_tile.x_index as u64 && self.cur_y <= self.max_tile.y_index as u64
    }

    /// Drains every remaining tile in order.
    pub fn produce_all(&mut self) -> Vec<TileCoord> {
        self.by_ref().collect()
    }

    /// Index rectangle of the whole enumeration, independent of the cursor.
    pub fn bounds(&self) -> TileBounds {
        TileBounds::new(
            self.level,
            self.min_tile.x_index,
            self.max_tile.x_index,
            self.min_tile.y_index,
            self.max_tile.y_index,
        )
    }

    /// The pyramid level being enumerated.
    pub fn level(&self) -> u8 {
        self.level
    }

    fn remaining(&self) -> u64 {
        if !self.has_next() {
            return 0;
        }
        let min_x = self.min_tile.x_index as u64;
        let width = self.max_tile.x_index as u64 - min_x + 1;
        let rows = self.max_tile.y_index as u64 - self.cur_y + 1;
        rows * width - (self.cur_x - min_x)
    }
}

impl Iterator for TileIterator {
    type Item = TileCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }

        let tile =
            TileCoord::with_bin_counts(self.level, self.cur_x as u32, self.cur_y as u32, self.bins);

        self.cur_x += 1;
        if self.cur_x > self.max_tile.x_index as u64 {
            self.cur_x = self.min_tile.x_index as u64;
            self.cur_y += 1;
        }

        Some(tile)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileIterator {}

impl FusedIterator for TileIterator {}

/// Renders the remaining tiles joined by `|` without consuming them.
impl fmt::Display for TileIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tile) in self.clone().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{}", tile)?;
        }
        Ok(())
    }
}
