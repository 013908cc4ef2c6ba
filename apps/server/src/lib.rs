//! Academy directory server - Rust implementation
//!
//! A directory/search service for art and sports academies:
//! - Multi-dimensional filtering (free text, type, rating, fees, geography)
//! - Proximity search with an in-memory fallback when the store's native
//!   geospatial support is unavailable
//! - Distance and price sort modes beyond the store's native ordering
//! - Stable pagination envelope across all executor paths

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod search;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
