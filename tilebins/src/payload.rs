//! Tile payloads as delivered by the tile server.
//!
//! Payloads are validated when they are built or deserialized, so everything
//! downstream (the bin transform, the coordinator) can rely on their shape:
//! the value grid is complete and a present tile matches its index.
//!
//! The JSON form is:
//!
//! ```text
//! {
//!   "index": { "level": 3, "xIndex": 6, "yIndex": 10 },
//!   "tile": {                       // absent or null: no data at this tile
//!     "level": 3, "xIndex": 6, "yIndex": 10,
//!     "xBinCount": 2, "yBinCount": 2,
//!     "default": 0,
//!     "meta": { ... },
//!     "values": [1, 2, 3, 4]
//!   }
//! }
//! ```
//!
//! `tileIndex` is accepted for `index`, and `x`/`y` for `xIndex`/`yIndex`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coord::{BinCounts, BinIndex, TileCoord, TileKey, MAX_LEVEL};

/// Errors raised while validating a tile payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Body is not valid JSON or does not have the payload shape
    #[error("Malformed tile payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Level is above the supported maximum
    #[error("Tile level {0} out of range (max {max})", max = MAX_LEVEL)]
    InvalidLevel(u8),

    /// A bin count was zero
    #[error("Invalid bin counts {x}x{y} for tile {tile}")]
    InvalidBinCount { tile: TileKey, x: u32, y: u32 },

    /// Value grid does not match the bin counts
    #[error("Tile {tile} has {actual} values, expected {expected}")]
    ValueCount {
        tile: TileKey,
        expected: usize,
        actual: usize,
    },

    /// Tile body describes a different tile than the payload index
    #[error("Tile body {tile} does not match payload index {index}")]
    IndexMismatch { index: TileKey, tile: TileKey },
}

/// Tile identity as sent in a payload's `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileIndex {
    pub level: u8,
    #[serde(rename = "xIndex", alias = "x")]
    pub x_index: u32,
    #[serde(rename = "yIndex", alias = "y")]
    pub y_index: u32,
}

impl TileIndex {
    pub fn new(level: u8, x_index: u32, y_index: u32) -> Self {
        Self {
            level,
            x_index,
            y_index,
        }
    }

    pub fn key(&self) -> TileKey {
        TileKey::new(self.level, self.x_index, self.y_index)
    }
}

impl From<TileKey> for TileIndex {
    fn from(key: TileKey) -> Self {
        Self::new(key.level, key.x_index, key.y_index)
    }
}

/// Body of a tile that exists in the pyramid.
///
/// Invariant: `values.len() == x_bin_count * y_bin_count`, both counts
/// positive. Values are row-major with bin row 0 at the top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    try_from = "RawTileData<T>",
    bound(
        serialize = "T: Serialize",
        deserialize = "T: Deserialize<'de>"
    )
)]
pub struct TileData<T> {
    level: u8,
    x_index: u32,
    y_index: u32,
    x_bin_count: u32,
    y_bin_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<serde_json::Value>,
    values: Vec<T>,
}

impl<T> TileData<T> {
    /// Builds a tile body, checking the value grid against the bin counts.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] for a level above [`MAX_LEVEL`], a zero bin
    /// count, or a value grid of the wrong size.
    pub fn new(
        level: u8,
        x_index: u32,
        y_index: u32,
        x_bin_count: u32,
        y_bin_count: u32,
        values: Vec<T>,
    ) -> Result<Self, PayloadError> {
        let tile = TileKey::new(level, x_index, y_index);
        if level > MAX_LEVEL {
            return Err(PayloadError::InvalidLevel(level));
        }
        let bins = BinCounts::new(x_bin_count, y_bin_count).map_err(|_| {
            PayloadError::InvalidBinCount {
                tile,
                x: x_bin_count,
                y: y_bin_count,
            }
        })?;
        if values.len() != bins.total() {
            return Err(PayloadError::ValueCount {
                tile,
                expected: bins.total(),
                actual: values.len(),
            });
        }

        Ok(Self {
            level,
            x_index,
            y_index,
            x_bin_count,
            y_bin_count,
            default: None,
            meta: None,
            values,
        })
    }

    /// Sets the value used for bins with no data.
    pub fn with_default(mut self, default: T) -> Self {
        self.default = Some(default);
        self
    }

    /// Attaches creator-defined metadata.
    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn key(&self) -> TileKey {
        TileKey::new(self.level, self.x_index, self.y_index)
    }

    pub fn bin_counts(&self) -> BinCounts {
        BinCounts {
            x: self.x_bin_count,
            y: self.y_bin_count,
        }
    }

    /// The tile coordinate, carrying this tile's bin grid.
    pub fn coord(&self) -> TileCoord {
        TileCoord::with_bin_counts(self.level, self.x_index, self.y_index, self.bin_counts())
    }

    pub fn default_value(&self) -> Option<&T> {
        self.default.as_ref()
    }

    pub fn meta(&self) -> Option<&serde_json::Value> {
        self.meta.as_ref()
    }

    /// All bin values, row-major.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Value of one bin, or `None` outside the grid.
    pub fn value(&self, bin: BinIndex) -> Option<&T> {
        if bin.x >= self.x_bin_count || bin.y >= self.y_bin_count {
            return None;
        }
        self.values
            .get(bin.y as usize * self.x_bin_count as usize + bin.x as usize)
    }
}

/// Unvalidated wire shape of [`TileData`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTileData<T> {
    level: u8,
    #[serde(alias = "x")]
    x_index: u32,
    #[serde(alias = "y")]
    y_index: u32,
    x_bin_count: u32,
    y_bin_count: u32,
    #[serde(default = "none")]
    default: Option<T>,
    #[serde(default)]
    meta: Option<serde_json::Value>,
    values: Vec<T>,
}

fn none<T>() -> Option<T> {
    None
}

impl<T> TryFrom<RawTileData<T>> for TileData<T> {
    type Error = PayloadError;

    fn try_from(raw: RawTileData<T>) -> Result<Self, Self::Error> {
        let mut tile = TileData::new(
            raw.level,
            raw.x_index,
            raw.y_index,
            raw.x_bin_count,
            raw.y_bin_count,
            raw.values,
        )?;
        tile.default = raw.default;
        tile.meta = raw.meta;
        Ok(tile)
    }
}

/// Answer to one tile fetch.
///
/// `tile` is `None` when the pyramid has no data at `index`; that is a valid
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RawTilePayload<T>",
    bound(
        serialize = "T: Serialize",
        deserialize = "T: Deserialize<'de>"
    )
)]
pub struct TilePayload<T> {
    index: TileIndex,
    tile: Option<TileData<T>>,
}

impl<T> TilePayload<T> {
    /// Pairs an index with an optional tile body.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::IndexMismatch`] if a present tile describes a
    /// different tile than `index`, or [`PayloadError::InvalidLevel`] for an
    /// index above [`MAX_LEVEL`].
    pub fn new(index: TileIndex, tile: Option<TileData<T>>) -> Result<Self, PayloadError> {
        if index.level > MAX_LEVEL {
            return Err(PayloadError::InvalidLevel(index.level));
        }
        if let Some(data) = &tile {
            if data.key() != index.key() {
                return Err(PayloadError::IndexMismatch {
                    index: index.key(),
                    tile: data.key(),
                });
            }
        }
        Ok(Self { index, tile })
    }

    /// A payload for a tile with body, indexed by the body's own key.
    pub fn with_data(tile: TileData<T>) -> Self {
        Self {
            index: tile.key().into(),
            tile: Some(tile),
        }
    }

    /// A payload reporting that the pyramid has no data at `key`.
    pub fn gap(key: TileKey) -> Self {
        Self {
            index: key.into(),
            tile: None,
        }
    }

    pub fn index(&self) -> TileIndex {
        self.index
    }

    pub fn key(&self) -> TileKey {
        self.index.key()
    }

    pub fn tile(&self) -> Option<&TileData<T>> {
        self.tile.as_ref()
    }

    pub fn into_tile(self) -> Option<TileData<T>> {
        self.tile
    }

    pub fn is_gap(&self) -> bool {
        self.tile.is_none()
    }
}

impl<T: DeserializeOwned> TilePayload<T> {
    /// Parses and validates a JSON payload.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, PayloadError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Parses and validates a JSON payload.
    pub fn from_json_str(text: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Deserialize)]
struct RawTilePayload<T> {
    #[serde(alias = "tileIndex")]
    index: TileIndex,
    #[serde(default = "none")]
    tile: Option<TileData<T>>,
}

impl<T> TryFrom<RawTilePayload<T>> for TilePayload<T> {
    type Error = PayloadError;

    fn try_from(raw: RawTilePayload<T>) -> Result<Self, Self::Error> {
        TilePayload::new(raw.index, raw.tile)
    }
}
