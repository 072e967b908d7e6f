//! Client configuration values.

use std::time::Duration;

use crate::coord::BinCounts;
use crate::pyramid::PyramidConfig;

/// Default tile server endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/tile/";

/// Default layer name.
pub const DEFAULT_LAYER: &str = "default";

/// Default fetch timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Tile server settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Service root; tiles live under `{base_url}/1.0.0/{layer}/...`
    pub base_url: String,
    /// Layer to fetch
    pub layer: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            layer: DEFAULT_LAYER.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Everything a client needs to enumerate and fetch tiles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientConfig {
    pub server: ServerConfig,
    /// Bin grid of every tile
    pub bins: BinCounts,
    pub pyramid: PyramidConfig,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.server.base_url = base_url.into();
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.server.layer = layer.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.server.timeout_secs = secs;
        self
    }

    pub fn with_bins(mut self, bins: BinCounts) -> Self {
        self.bins = bins;
        self
    }

    pub fn with_pyramid(mut self, pyramid: PyramidConfig) -> Self {
        self.pyramid = pyramid;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.server.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.server.layer, "default");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.bins, BinCounts::default());
        assert_eq!(config.pyramid, PyramidConfig::WebMercator);
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::new()
            .with_base_url("http://tiles.example/")
            .with_layer("twitter")
            .with_timeout_secs(5)
            .with_bins(BinCounts::new(8, 8).unwrap())
            .with_pyramid(PyramidConfig::Aoi {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 1.0,
                max_y: 1.0,
            });

        assert_eq!(config.server.base_url, "http://tiles.example/");
        assert_eq!(config.server.layer, "twitter");
        assert_eq!(config.server.timeout_secs, 5);
        assert_eq!(config.bins.total(), 64);
        assert_eq!(config.pyramid.name(), "aoi");
    }
}
