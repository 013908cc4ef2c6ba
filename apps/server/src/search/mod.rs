//! The search/ranking query engine.
//!
//! A request flows through:
//! parameter parsing ([`params`]) -> predicate compilation ([`filter`]) ->
//! the executor ([`engine`]), which prefers the store's native facilities and
//! drops to the in-memory path ([`fallback`]) for distance/fee ordering or
//! when native proximity is unavailable -> the response envelope ([`page`]).

pub mod engine;
pub mod fallback;
pub mod fees;
pub mod filter;
pub mod page;
pub mod params;

pub use engine::SearchEngine;
pub use filter::{CompiledQuery, GeoQuery, Predicate};
pub use page::SearchPage;
pub use params::{SearchParams, SortMode};
