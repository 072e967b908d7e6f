//! REST transport against the tile server's JSON endpoint.

use std::marker::PhantomData;
use std::sync::Arc;

use reqwest::Url;
use serde::de::DeserializeOwned;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::{AsyncHttpClient, FetchCompletion, FetchRequest, TileTransport, TransportError};
use crate::payload::TilePayload;

/// API version segment of the tile endpoint.
const API_VERSION: &str = "1.0.0";

/// Fetches tiles from `{base_url}/1.0.0/{layer}/{level}/{x}/{y}.json`.
///
/// Each fetch runs as a task on the given runtime handle; the fetch context
/// is sent as query parameters.
pub struct RestTransport<C, T> {
    client: Arc<C>,
    base_url: String,
    layer: String,
    handle: Handle,
    _payload: PhantomData<fn() -> T>,
}

impl<C, T> RestTransport<C, T>
where
    C: AsyncHttpClient + 'static,
{
    pub fn new(
        client: C,
        base_url: impl Into<String>,
        layer: impl Into<String>,
        handle: Handle,
    ) -> Self {
        Self {
            client: Arc::new(client),
            base_url: base_url.into(),
            layer: layer.into(),
            handle,
            _payload: PhantomData,
        }
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Full URL for a request, including the context query.
    pub fn tile_url(&self, request: &FetchRequest) -> Result<Url, TransportError> {
        let key = request.key();
        let raw = format!(
            "{}/{}/{}/{}/{}/{}.json",
            self.base_url.trim_end_matches('/'),
            API_VERSION,
            self.layer,
            key.level,
            key.x_index,
            key.y_index
        );

        let mut url = Url::parse(&raw)
            .map_err(|e| TransportError::Http(format!("Invalid tile URL '{}': {}", raw, e)))?;

        let pairs = request.context.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }
}

impl<C, T> TileTransport<T> for RestTransport<C, T>
where
    C: AsyncHttpClient + 'static,
    T: DeserializeOwned + Send + 'static,
{
    fn fetch(&self, request: FetchRequest, completion: FetchCompletion<T>) {
        let url = match self.tile_url(&request) {
            Ok(url) => url,
            Err(e) => {
                completion(Err(e));
                return;
            }
        };

        let client = Arc::clone(&self.client);
        let key = request.key();

        self.handle.spawn(async move {
            debug!(tile = %key, url = %url, "Fetching tile");

            let result = match client.get(url.as_str()).await {
                Ok(body) => TilePayload::from_json_slice(&body).map_err(TransportError::from),
                Err(e) => Err(e),
            };

            if let Err(e) = &result {
                warn!(tile = %key, error = %e, "Tile fetch failed");
            }
            completion(result);
        });
    }
}
