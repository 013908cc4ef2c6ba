//! In-memory `AcademyStore`.
//!
//! Evaluates predicates with the same reference implementation the tests
//! use (`Predicate::matches`). Proximity behaves like a real document store:
//! with a geo index it filters by radius and orders nearest-first; built
//! without one, proximity queries fail with the index-missing signature,
//! which is how the fallback path gets exercised end to end.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::db::store::{
    AcademyStore, FindOptions, NearQuery, StoreError, StoreResult, StoreSort, StoreSortKey,
};
use crate::models::AcademyRecord;
use crate::search::filter::Predicate;

pub struct MemoryAcademyStore {
    records: RwLock<Vec<AcademyRecord>>,
    geo_indexed: bool,
}

impl MemoryAcademyStore {
    pub fn new(records: Vec<AcademyRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            geo_indexed: true,
        }
    }

    /// Same store, but proximity queries fail as if the geospatial index was
    /// never created.
    pub fn without_geo_index(records: Vec<AcademyRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            geo_indexed: false,
        }
    }

    pub fn insert(&self, record: AcademyRecord) {
        self.records.write().expect("store lock").push(record);
    }

    fn matching(&self, predicate: &Predicate) -> Vec<AcademyRecord> {
        self.records
            .read()
            .expect("store lock")
            .iter()
            .filter(|r| predicate.matches(r))
            .cloned()
            .collect()
    }

    /// Apply the proximity constraint the way an indexed store would:
    /// records without usable coordinates never match, matches are radius-
    /// bounded and nearest-first.
    fn near_pass(
        &self,
        records: Vec<AcademyRecord>,
        near: &NearQuery,
    ) -> StoreResult<Vec<AcademyRecord>> {
        if !self.geo_indexed {
            return Err(StoreError::Backend(
                "unable to find index for $geoNear query: no 2dsphere index on {location}"
                    .to_string(),
            ));
        }

        let mut pairs: Vec<(f64, AcademyRecord)> = records
            .into_iter()
            .filter_map(|record| {
                let point = record.point()?;
                Some((near.center.distance_km(&point) * 1000.0, record))
            })
            .filter(|(d, _)| *d <= near.max_distance_m)
            .collect();
        pairs.sort_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Ok(pairs.into_iter().map(|(_, r)| r).collect())
    }
}

fn apply_sort(records: &mut [AcademyRecord], sort: &StoreSort) {
    let key = |r: &AcademyRecord| -> i64 {
        let ts = match sort.key {
            StoreSortKey::CreatedAt => r.created_at,
            StoreSortKey::StartedAt => r.academy_startat,
        };
        ts.map(|t| t.timestamp_millis()).unwrap_or(0)
    };
    if sort.ascending {
        records.sort_by_key(key);
    } else {
        records.sort_by_key(|r| std::cmp::Reverse(key(r)));
    }
}

#[async_trait]
impl AcademyStore for MemoryAcademyStore {
    async fn find(
        &self,
        predicate: &Predicate,
        opts: &FindOptions,
    ) -> StoreResult<Vec<AcademyRecord>> {
        let mut records = self.matching(predicate);
        if let Some(near) = &opts.near {
            records = self.near_pass(records, near)?;
        }
        if let Some(sort) = &opts.sort {
            apply_sort(&mut records, sort);
        }
        Ok(records
            .into_iter()
            .skip(opts.skip as usize)
            .take(opts.limit as usize)
            .collect())
    }

    async fn count(&self, predicate: &Predicate, near: Option<&NearQuery>) -> StoreResult<u64> {
        let mut records = self.matching(predicate);
        if let Some(near) = near {
            records = self.near_pass(records, near)?;
        }
        Ok(records.len() as u64)
    }

    async fn find_all(&self, predicate: &Predicate) -> StoreResult<Vec<AcademyRecord>> {
        Ok(self.matching(predicate))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<AcademyRecord>> {
        Ok(self
            .records
            .read()
            .expect("store lock")
            .iter()
            .find(|r| {
                r.id == key
                    || r.extra
                        .get("_id")
                        .and_then(|v| v.as_str())
                        .is_some_and(|store_id| store_id == key)
            })
            .cloned())
    }
}
