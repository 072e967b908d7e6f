//! Tile fetch transport
//!
//! The coordinator hands each fetch to a [`TileTransport`] together with a
//! completion. Transports run the fetch however they like and call the
//! completion exactly once, with either a validated [`TilePayload`] or a
//! [`TransportError`].
//!
//! [`RestTransport`] fetches tiles from the tile server's REST endpoint
//! through an [`AsyncHttpClient`] on a tokio runtime:
//!
//! ```ignore
//! use tilebins::transport::{AsyncReqwestClient, RestTransport};
//!
//! let client = AsyncReqwestClient::with_timeout(30)?;
//! let transport = RestTransport::new(client, "http://localhost:8080/tile/", "heatmap", handle);
//! ```

mod http;
mod rest;

pub use http::{AsyncHttpClient, AsyncReqwestClient};
pub use rest::RestTransport;

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;

use std::sync::Arc;

use thiserror::Error;

use crate::bounds::TileBounds;
use crate::coord::{TileCoord, TileKey};
use crate::payload::{PayloadError, TilePayload};

/// Errors a transport reports through a fetch completion.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request could not be sent or the body could not be read
    #[error("HTTP error: {0}")]
    Http(String),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Body was not a valid tile payload
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// Server answered with a different tile than requested
    #[error("Requested tile {requested} but received {received}")]
    UnexpectedTile {
        requested: TileKey,
        received: TileKey,
    },

    /// Transport cannot run fetches any more
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Which tiles a fetch belongs to, forwarded so the server can batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FetchScope {
    #[default]
    None,
    /// Index rectangle of the whole request
    Bounds(TileBounds),
    /// Every tile of the request
    TileSet(Arc<[TileCoord]>),
}

/// Extra context attached to every fetch of one `request_tiles` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchContext {
    pub scope: FetchScope,
    /// Free-form query parameters appended after the scope
    pub params: Vec<(String, String)>,
}

impl FetchContext {
    /// Context with no scope and no parameters.
    pub fn none() -> Self {
        Self::default()
    }

    /// Context carrying the request's index rectangle.
    pub fn bounds(bounds: TileBounds) -> Self {
        Self {
            scope: FetchScope::Bounds(bounds),
            params: Vec::new(),
        }
    }

    /// Context carrying every tile of the request.
    pub fn tile_set<I>(tiles: I) -> Self
    where
        I: IntoIterator<Item = TileCoord>,
    {
        Self {
            scope: FetchScope::TileSet(tiles.into_iter().collect()),
            params: Vec::new(),
        }
    }

    /// Adds a query parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Query parameters for this context, scope first.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = match &self.scope {
            FetchScope::None => Vec::new(),
            FetchScope::Bounds(bounds) => bounds.query_pairs(),
            FetchScope::TileSet(tiles) => {
                let joined = tiles
                    .iter()
                    .map(TileCoord::to_string)
                    .collect::<Vec<_>>()
                    .join("|");
                vec![("tileset".to_string(), joined)]
            }
        };
        pairs.extend(self.params.iter().cloned());
        pairs
    }
}

/// One tile fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub coord: TileCoord,
    pub context: FetchContext,
}

impl FetchRequest {
    pub fn new(coord: TileCoord, context: FetchContext) -> Self {
        Self { coord, context }
    }

    pub fn key(&self) -> TileKey {
        self.coord.key()
    }
}

/// Continuation a transport calls once per fetch.
pub type FetchCompletion<T> =
    Box<dyn FnOnce(Result<TilePayload<T>, TransportError>) + Send + 'static>;

/// Asynchronous tile fetch primitive.
///
/// `fetch` must not block on the network. It may call `completion` before
/// returning (for example from a cache) or later from another thread.
pub trait TileTransport<T>: Send + Sync {
    fn fetch(&self, request: FetchRequest, completion: FetchCompletion<T>);
}
