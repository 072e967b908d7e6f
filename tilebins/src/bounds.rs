//! Inclusive tile-index rectangles.
//!
//! [`TileBounds`] describes a block of tiles by index range and level range.
//! An enumerator reports its whole range as one block, and
//! [`TileBounds::combine`] folds an arbitrary tile set into a short list of
//! blocks so a fetch can describe a batch compactly:
//!
//! ```
//! use tilebins::bounds::TileBounds;
//! use tilebins::coord::TileKey;
//!
//! let keys = [TileKey::new(3, 5, 2), TileKey::new(3, 6, 2), TileKey::new(3, 7, 2)];
//! let blocks = TileBounds::combine(keys);
//!
//! assert_eq!(blocks.len(), 1);
//! assert_eq!(blocks[0].to_string(), "<TileBlock[5-7, 2-2, 3]>");
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::coord::TileKey;

/// Inclusive tile-index rectangle over a level range.
///
/// `min > max` on any axis describes an empty block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TileBounds {
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
    pub min_level: u8,
    pub max_level: u8,
}

impl TileBounds {
    /// Creates a single-level block.
    pub fn new(level: u8, min_x: u32, max_x: u32, min_y: u32, max_y: u32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            min_level: level,
            max_level: level,
        }
    }

    /// Block containing exactly one tile.
    pub fn single(key: TileKey) -> Self {
        Self::new(key.level, key.x_index, key.x_index, key.y_index, key.y_index)
    }

    /// Smallest block enclosing every key, or `None` for an empty set.
    pub fn enclosing<I>(keys: I) -> Option<Self>
    where
        I: IntoIterator<Item = TileKey>,
    {
        keys.into_iter().fold(None, |acc, key| {
            Some(match acc {
                None => Self::single(key),
                Some(b) => Self {
                    min_x: b.min_x.min(key.x_index),
                    max_x: b.max_x.max(key.x_index),
                    min_y: b.min_y.min(key.y_index),
                    max_y: b.max_y.max(key.y_index),
                    min_level: b.min_level.min(key.level),
                    max_level: b.max_level.max(key.level),
                },
            })
        })
    }

    /// True if no tile lies inside the block.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y || self.min_level > self.max_level
    }

    /// Number of tiles inside the block.
    pub fn tile_count(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        let width = (self.max_x - self.min_x) as u64 + 1;
        let height = (self.max_y - self.min_y) as u64 + 1;
        let levels = (self.max_level - self.min_level) as u64 + 1;
        width * height * levels
    }

    /// True if the key's level and indices fall inside the block.
    pub fn contains(&self, key: &TileKey) -> bool {
        (self.min_level..=self.max_level).contains(&key.level)
            && (self.min_x..=self.max_x).contains(&key.x_index)
            && (self.min_y..=self.max_y).contains(&key.y_index)
    }

    /// Query parameters understood by the tile server.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("minx".to_string(), self.min_x.to_string()),
            ("maxx".to_string(), self.max_x.to_string()),
            ("miny".to_string(), self.min_y.to_string()),
            ("maxy".to_string(), self.max_y.to_string()),
            ("minz".to_string(), self.min_level.to_string()),
            ("maxz".to_string(), self.max_level.to_string()),
        ]
    }

    /// Merges a tile set into rectangular single-level blocks.
    ///
    /// Two blocks merge when they share a level and their extent on one
    /// axis, and overlap or touch on the other. Merging repeats until no
    /// pair qualifies. The result is sorted by level, then x range, then y
    /// range. Duplicate keys are ignored.
    pub fn combine<I>(keys: I) -> Vec<TileBounds>
    where
        I: IntoIterator<Item = TileKey>,
    {
        let mut keys: Vec<TileKey> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();

        let mut blocks: Vec<TileBounds> = keys.into_iter().map(Self::single).collect();

        while let Some((i, j, merged)) = find_merge(&blocks) {
            // j > i, so removing j first keeps i valid
            blocks.remove(j);
            blocks.remove(i);
            blocks.insert(0, merged);
        }

        blocks.sort_by(block_order);
        blocks
    }

    fn level(&self) -> u8 {
        self.min_level
    }

    fn single_level(&self) -> bool {
        self.min_level == self.max_level
    }

    /// Same x extent, touching or overlapping in y.
    fn merge_along_y(&self, other: &Self) -> Option<Self> {
        if !self.single_level()
            || self.level() != other.level()
            || self.min_x != other.min_x
            || self.max_x != other.max_x
        {
            return None;
        }
        let (lo, hi) = if self.min_y <= other.min_y {
            (self, other)
        } else {
            (other, self)
        };
        if (lo.max_y as u64) + 1 < hi.min_y as u64 {
            return None;
        }
        Some(Self::new(
            self.level(),
            self.min_x,
            self.max_x,
            lo.min_y,
            lo.max_y.max(hi.max_y),
        ))
    }

    /// Same y extent, touching or overlapping in x.
    fn merge_along_x(&self, other: &Self) -> Option<Self> {
        if !self.single_level()
            || self.level() != other.level()
            || self.min_y != other.min_y
            || self.max_y != other.max_y
        {
            return None;
        }
        let (lo, hi) = if self.min_x <= other.min_x {
            (self, other)
        } else {
            (other, self)
        };
        if (lo.max_x as u64) + 1 < hi.min_x as u64 {
            return None;
        }
        Some(Self::new(
            self.level(),
            lo.min_x,
            lo.max_x.max(hi.max_x),
            self.min_y,
            self.max_y,
        ))
    }
}

fn find_merge(blocks: &[TileBounds]) -> Option<(usize, usize, TileBounds)> {
    for (i, a) in blocks.iter().enumerate() {
        for (j, b) in blocks.iter().enumerate().skip(i + 1) {
            if let Some(merged) = a.merge_along_y(b).or_else(|| a.merge_along_x(b)) {
                return Some((i, j, merged));
            }
        }
    }
    None
}

fn block_order(a: &TileBounds, b: &TileBounds) -> Ordering {
    (a.min_level, a.min_x, a.max_x, a.min_y, a.max_y).cmp(&(
        b.min_level,
        b.min_x,
        b.max_x,
        b.min_y,
        b.max_y,
    ))
}

impl fmt::Display for TileBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<TileBlock[{}-{}, {}-{}, ",
            self.min_x, self.max_x, self.min_y, self.max_y
        )?;
        if self.single_level() {
            write!(f, "{}]>", self.min_level)
        } else {
            write!(f, "{}-{}]>", self.min_level, self.max_level)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(level: u8, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> Vec<TileKey> {
        let mut keys = Vec::new();
        for x in xs {
            for y in ys.clone() {
                keys.push(TileKey::new(level, x, y));
            }
        }
        keys
    }

    #[test]
    fn test_tile_count_and_contains() {
        let bounds = TileBounds::new(4, 2, 5, 1, 3);
        assert_eq!(bounds.tile_count(), 12);
        assert!(bounds.contains(&TileKey::new(4, 2, 1)));
        assert!(bounds.contains(&TileKey::new(4, 5, 3)));
        assert!(!bounds.contains(&TileKey::new(4, 6, 3)));
        assert!(!bounds.contains(&TileKey::new(5, 3, 2)));
    }

    #[test]
    fn test_inverted_is_empty() {
        let bounds = TileBounds::new(2, 3, 1, 0, 0);
        assert!(bounds.is_empty());
        assert_eq!(bounds.tile_count(), 0);
        assert!(!bounds.contains(&TileKey::new(2, 2, 0)));
    }

    #[test]
    fn test_enclosing() {
        let keys = [
            TileKey::new(3, 5, 10),
            TileKey::new(3, 6, 9),
            TileKey::new(4, 2, 12),
        ];
        let bounds = TileBounds::enclosing(keys).unwrap();
        assert_eq!((bounds.min_x, bounds.max_x), (2, 6));
        assert_eq!((bounds.min_y, bounds.max_y), (9, 12));
        assert_eq!((bounds.min_level, bounds.max_level), (3, 4));
        assert!(TileBounds::enclosing(Vec::new()).is_none());
    }

    #[test]
    fn test_query_pairs() {
        let pairs = TileBounds::new(3, 5, 6, 10, 10).query_pairs();
        let rendered: Vec<String> = pairs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        assert_eq!(
            rendered,
            vec!["minx=5", "maxx=6", "miny=10", "maxy=10", "minz=3", "maxz=3"]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            TileBounds::new(6, 4, 11, 7, 10).to_string(),
            "<TileBlock[4-11, 7-10, 6]>"
        );
        let multi = TileBounds {
            min_level: 2,
            max_level: 4,
            ..TileBounds::new(0, 0, 1, 0, 1)
        };
        assert_eq!(multi.to_string(), "<TileBlock[0-1, 0-1, 2-4]>");
    }

    #[test]
    fn test_combine_big_square() {
        let blocks = TileBounds::combine(grid(6, 4..12, 7..11));
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].to_string(), "<TileBlock[4-11, 7-10, 6]>");
    }

    #[test]
    fn test_combine_keeps_levels_apart() {
        let mut keys = grid(6, 4..12, 7..11);
        keys.extend(grid(7, 4..12, 7..11));

        let blocks = TileBounds::combine(keys);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].to_string(), "<TileBlock[4-11, 7-10, 6]>");
        assert_eq!(blocks[1].to_string(), "<TileBlock[4-11, 7-10, 7]>");
    }

    #[test]
    fn test_combine_ring_yields_four_blocks() {
        let keys = [
            TileKey::new(6, 7, 10),
            TileKey::new(6, 7, 11),
            TileKey::new(6, 7, 12),
            TileKey::new(6, 8, 12),
            TileKey::new(6, 9, 12),
            TileKey::new(6, 9, 11),
            TileKey::new(6, 9, 10),
            TileKey::new(6, 8, 10),
        ];
        let blocks = TileBounds::combine(keys);
        assert_eq!(blocks.len(), 4);
        let total: u64 = blocks.iter().map(TileBounds::tile_count).sum();
        assert_eq!(total, 8);
    }

    #[test]
    fn test_combine_spaced_tiles_stay_separate() {
        let keys = [
            TileKey::new(6, 14, 20),
            TileKey::new(6, 14, 22),
            TileKey::new(6, 14, 24),
            TileKey::new(6, 16, 24),
            TileKey::new(6, 18, 24),
            TileKey::new(6, 18, 22),
            TileKey::new(6, 18, 20),
            TileKey::new(6, 16, 20),
        ];
        assert_eq!(TileBounds::combine(keys).len(), 8);
    }

    #[test]
    fn test_combine_ignores_duplicates_and_sorts() {
        let keys = [
            TileKey::new(2, 3, 0),
            TileKey::new(1, 0, 0),
            TileKey::new(2, 3, 0),
        ];
        let blocks = TileBounds::combine(keys);
        assert_eq!(
            blocks,
            vec![TileBounds::new(1, 0, 0, 0, 0), TileBounds::new(2, 3, 3, 0, 0)]
        );
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        proptest! {
            #[test]
            fn test_combine_covers_exactly_the_input(
                keys in proptest::collection::vec((0u8..3, 0u32..8, 0u32..8), 0..40)
            ) {
                let keys: HashSet<TileKey> = keys
                    .into_iter()
                    .map(|(l, x, y)| TileKey::new(l, x, y))
                    .collect();
                let blocks = TileBounds::combine(keys.iter().copied());

                let covered: u64 = blocks.iter().map(TileBounds::tile_count).sum();
                prop_assert_eq!(covered, keys.len() as u64);
                for key in &keys {
                    prop_assert_eq!(blocks.iter().filter(|b| b.contains(key)).count(), 1);
                }
            }
        }
    }
}
