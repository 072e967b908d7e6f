//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`tiles`] - Enumerate the tiles covering a viewport
//! - [`fetch`] - Fetch a viewport's tiles and print their bins
//! - [`config`] - Configuration management (init, show, path)

pub mod common;
pub mod config;
pub mod fetch;
pub mod tiles;
