//! Tile-to-bin transform.

use serde::Serialize;

use crate::coord::{BinKey, TileKey};
use crate::payload::TileData;
use crate::pyramid::TilePyramid;

/// One addressable bin of a resident tile.
///
/// `longitude`/`latitude` are the top-left corner (min x, max y) of the bin's
/// root-space rectangle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinRecord<T> {
    pub bin_key: BinKey,
    pub tile_key: TileKey,
    pub longitude: f64,
    pub latitude: f64,
    pub bin: T,
}

/// Expands a tile body into bin records, row-major with x fastest.
///
/// An absent tile yields no records. The result depends only on the
/// arguments.
pub fn transform_tile_to_bins<T, P>(
    pyramid: &P,
    key: TileKey,
    tile: Option<&TileData<T>>,
) -> Vec<BinRecord<T>>
where
    T: Clone,
    P: TilePyramid + ?Sized,
{
    let Some(tile) = tile else {
        return Vec::new();
    };

    let coord = tile.coord();
    coord
        .bins()
        .zip(tile.values())
        .map(|(bin, value)| {
            let rect = pyramid.tile_bin_bounds(&coord, bin);
            BinRecord {
                bin_key: key.bin_key(bin),
                tile_key: key,
                longitude: rect.min_x,
                latitude: rect.max_y,
                bin: value.clone(),
            }
        })
        .collect()
}
