//! Tilebins - pyramid tile enumeration and bin-level tile data caching
//!
//! This library enumerates the tiles a viewport needs at one level of a
//! tile pyramid, fetches their data through a pluggable transport, and keeps
//! each resident tile expanded into per-bin records with root-space
//! positions.
//!
//! # High-Level API
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilebins::coordinator::TileDataCoordinator;
//! use tilebins::iterator::TileIterator;
//! use tilebins::pyramid::WebMercatorPyramid;
//! use tilebins::transport::{AsyncReqwestClient, FetchContext, RestTransport};
//!
//! let pyramid = Arc::new(WebMercatorPyramid::new());
//! let client = AsyncReqwestClient::new()?;
//! let transport = Arc::new(RestTransport::new(client, base_url, "tweets", handle));
//! let coordinator = TileDataCoordinator::<f64, _>::new(pyramid.clone(), transport);
//!
//! let tiles = TileIterator::new(&*pyramid, 4, (-74.1, 40.6), (-73.8, 40.9))?.produce_all();
//! coordinator.request_tiles(&tiles, FetchContext::none(), on_ready);
//! ```

pub mod bins;
pub mod bounds;
pub mod config;
pub mod coord;
pub mod coordinator;
pub mod iterator;
pub mod logging;
pub mod payload;
pub mod pyramid;
pub mod transport;
