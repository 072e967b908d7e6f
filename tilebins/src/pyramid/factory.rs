//! Configuration-driven pyramid creation.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::{AoiPyramid, PyramidError, TilePyramid, WebMercatorPyramid};

/// Configuration for the pyramid a deployment tiles its data with.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PyramidConfig {
    /// Spherical Web Mercator over (longitude, latitude)
    #[default]
    WebMercator,
    /// Linear pyramid over a fixed root rectangle
    Aoi {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },
}

impl PyramidConfig {
    /// Short name used in configuration files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            PyramidConfig::WebMercator => "web-mercator",
            PyramidConfig::Aoi { .. } => "aoi",
        }
    }

    /// Builds the configured pyramid.
    ///
    /// # Errors
    ///
    /// Returns [`PyramidError::InvalidBounds`] for an AOI with empty or
    /// inverted bounds.
    pub fn create(&self) -> Result<Arc<dyn TilePyramid>, PyramidError> {
        Ok(match *self {
            PyramidConfig::WebMercator => Arc::new(WebMercatorPyramid::new()),
            PyramidConfig::Aoi {
                min_x,
                min_y,
                max_x,
                max_y,
            } => Arc::new(AoiPyramid::new(min_x, min_y, max_x, max_y)?),
        })
    }
}

impl fmt::Display for PyramidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PyramidConfig::WebMercator => write!(f, "web-mercator"),
            PyramidConfig::Aoi {
                min_x,
                min_y,
                max_x,
                max_y,
            } => write!(f, "aoi:{},{},{},{}", min_x, min_y, max_x, max_y),
        }
    }
}

impl FromStr for PyramidConfig {
    type Err = PyramidError;

    /// Parses `web-mercator` or `aoi:min_x,min_y,max_x,max_y`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "web-mercator" | "webmercator" | "mercator" => return Ok(PyramidConfig::WebMercator),
            _ => {}
        }

        let invalid = || PyramidError::InvalidBounds(s.to_string());
        let rest = s
            .strip_prefix("aoi:")
            .or_else(|| s.strip_prefix("AOI:"))
            .ok_or_else(invalid)?;

        let edges = rest
            .split(',')
            .map(|part| part.trim().parse::<f64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        match edges.as_slice() {
            [min_x, min_y, max_x, max_y] => {
                let config = PyramidConfig::Aoi {
                    min_x: *min_x,
                    min_y: *min_y,
                    max_x: *max_x,
                    max_y: *max_y,
                };
                // Reject bad bounds at parse time rather than at first use.
                config.create()?;
                Ok(config)
            }
            _ => Err(invalid()),
        }
    }
}
