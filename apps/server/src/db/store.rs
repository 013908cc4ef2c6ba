//! Core trait for academy storage backends.
//!
//! The search engine talks to storage exclusively through [`AcademyStore`];
//! any backend (PostgreSQL, an in-memory table, a remote document store) can
//! implement it. Error text is inspected in exactly one place —
//! [`StoreError::kind`] — so the engine only ever branches on a closed
//! classification.

use std::sync::OnceLock;

use academy_geo::GeoPoint;
use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;

use crate::models::AcademyRecord;
use crate::search::filter::Predicate;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("store connection error: {0}")]
    Connection(String),
}

/// Closed classification of store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The backend cannot serve a proximity query: missing geospatial
    /// index/extension, bad geometry, or near-query misuse. Recoverable via
    /// the in-memory path.
    IndexMissing,
    /// Connectivity or timeout; surfaced, never retried here.
    Transient,
    /// Everything else.
    Fatal,
}

/// Signatures of "proximity is unavailable" across the backends this service
/// runs against: document-store style (2dsphere / $geoNear) and the
/// PostgreSQL earthdistance functions.
fn geo_failure_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)2dsphere|geoNear|near must be a point|ll_to_earth|earth_distance|earth_box|earthdistance")
            .expect("geo failure pattern is valid")
    })
}

impl StoreError {
    pub fn kind(&self) -> FailureKind {
        match self {
            StoreError::Connection(_) => FailureKind::Transient,
            StoreError::Backend(message) => {
                if geo_failure_pattern().is_match(message) {
                    FailureKind::IndexMissing
                } else {
                    FailureKind::Fatal
                }
            }
        }
    }
}

/// Native proximity constraint: nearest-first ordering within a radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearQuery {
    pub center: GeoPoint,
    pub max_distance_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSortKey {
    CreatedAt,
    StartedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSort {
    pub key: StoreSortKey,
    pub ascending: bool,
}

/// Options for a paginated native lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FindOptions {
    pub skip: u64,
    pub limit: u64,
    /// Explicit scalar sort; without one, proximity queries order
    /// nearest-first and everything else keeps the store's natural order.
    pub sort: Option<StoreSort>,
    pub near: Option<NearQuery>,
}

#[async_trait]
pub trait AcademyStore: Send + Sync {
    /// Find matching records with native pagination/sort/proximity.
    async fn find(
        &self,
        predicate: &Predicate,
        opts: &FindOptions,
    ) -> StoreResult<Vec<AcademyRecord>>;

    /// Count records matching the same constraints (without pagination).
    async fn count(&self, predicate: &Predicate, near: Option<&NearQuery>) -> StoreResult<u64>;

    /// Materialize every matching record, in natural order. Used by the
    /// in-memory executor paths.
    async fn find_all(&self, predicate: &Predicate) -> StoreResult<Vec<AcademyRecord>>;

    /// Look up a single record by either identity key (external id or the
    /// store's own id).
    async fn get(&self, key: &str) -> StoreResult<Option<AcademyRecord>>;
}
