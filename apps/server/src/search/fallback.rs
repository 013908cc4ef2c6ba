//! The in-memory executor.
//!
//! Runs whenever native proximity is unavailable, or when the requested
//! ordering (distance, fees) is beyond the store's native sort. The whole
//! filtered superset is materialized once; everything after that is pure
//! computation on the request's own working set.

use crate::db::store::{AcademyStore, StoreResult};
use crate::models::AcademyRecord;
use crate::search::fees;
use crate::search::filter::{GeoQuery, Predicate};
use crate::search::page::{Page, SearchPage};
use crate::search::params::SortMode;

/// Execute the query entirely in memory against the non-geo predicate.
pub async fn execute<S: AcademyStore + ?Sized>(
    store: &S,
    predicate: &Predicate,
    geo: Option<&GeoQuery>,
    sort: SortMode,
    page: &Page,
) -> StoreResult<SearchPage> {
    let records = store.find_all(predicate).await?;
    Ok(resolve(records, geo, sort, page))
}

/// Pure half of the fallback: distance filtering, ordering, pagination.
pub fn resolve(
    records: Vec<AcademyRecord>,
    geo: Option<&GeoQuery>,
    sort: SortMode,
    page: &Page,
) -> SearchPage {
    let mut records = match geo {
        Some(geo) => narrow_by_distance(records, geo, sort),
        None => records,
    };

    match sort {
        // Distance ordering already applied during narrowing.
        SortMode::Distance => {}
        SortMode::Newest => {
            records.sort_by_key(|r| std::cmp::Reverse(epoch_millis(r.created_at.as_ref())))
        }
        SortMode::StartedNewest => {
            records.sort_by_key(|r| std::cmp::Reverse(epoch_millis(r.academy_startat.as_ref())))
        }
        SortMode::StartedOldest => {
            records.sort_by_key(|r| epoch_millis(r.academy_startat.as_ref()))
        }
        SortMode::PriceLowHigh | SortMode::PriceHighLow => fees::sort_records(&mut records, sort),
        // Natural order (or nearest-first when geo narrowed above).
        SortMode::Relevance => {}
    }

    SearchPage::slice(records, page)
}

/// Distance pass: drop records without a valid coordinate pair, cut off at
/// the radius only when the caller explicitly supplied one, and order
/// nearest-first (the native proximity ordering this path stands in for).
fn narrow_by_distance(
    records: Vec<AcademyRecord>,
    geo: &GeoQuery,
    sort: SortMode,
) -> Vec<AcademyRecord> {
    let mut pairs: Vec<(f64, AcademyRecord)> = records
        .into_iter()
        .filter_map(|record| {
            let point = record.point()?;
            Some((geo.center.distance_km(&point), record))
        })
        .filter(|(d, _)| !geo.explicit_radius || *d <= geo.radius_km)
        .collect();

    if matches!(sort, SortMode::Distance | SortMode::Relevance) {
        pairs.sort_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    }

    pairs.into_iter().map(|(_, record)| record).collect()
}

/// Missing timestamps sort as epoch zero.
fn epoch_millis(ts: Option<&chrono::DateTime<chrono::Utc>>) -> i64 {
    ts.map(|t| t.timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_geo::GeoPoint;
    use serde_json::json;

    fn at(id: &str, lat: f64, lng: f64) -> AcademyRecord {
        serde_json::from_value(json!({
            "id": id,
            "location": {"type": "Point", "coordinates": [lng, lat]}
        }))
        .unwrap()
    }

    fn created(id: &str, ts: Option<&str>) -> AcademyRecord {
        let mut doc = json!({"id": id});
        if let Some(ts) = ts {
            doc["created_at"] = json!(ts);
        }
        serde_json::from_value(doc).unwrap()
    }

    fn page() -> Page {
        Page {
            page: 1,
            limit: 12,
        }
    }

    fn geo(lat: f64, lng: f64, radius_km: f64, explicit: bool) -> GeoQuery {
        GeoQuery {
            center: GeoPoint::new(lat, lng),
            radius_km,
            explicit_radius: explicit,
        }
    }

    #[test]
    fn distance_sort_orders_nearest_first_without_cutting() {
        let records = vec![at("far", 0.0, 5.0), at("near", 0.0, 1.0)];
        let result = resolve(
            records,
            Some(&geo(0.0, 0.0, 10.0, false)),
            SortMode::Distance,
            &page(),
        );
        let ids: Vec<&str> = result.results.iter().map(|r| r.id.as_str()).collect();
        // (0,5) is ~556 km out, far beyond the default radius, but without an
        // explicit radius nothing is excluded.
        assert_eq!(ids, vec!["near", "far"]);
    }

    #[test]
    fn explicit_radius_cuts_off() {
        let records = vec![at("inside", 0.0, 0.05), at("outside", 0.0, 0.2)];
        // 0.2 degrees of longitude at the equator is ~22 km.
        let result = resolve(
            records,
            Some(&geo(0.0, 0.0, 10.0, true)),
            SortMode::Distance,
            &page(),
        );
        let ids: Vec<&str> = result.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["inside"]);
        assert_eq!(result.total, 1);
    }

    #[test]
    fn records_without_coordinates_are_dropped_from_geo_results() {
        let records = vec![
            at("located", 0.0, 0.01),
            serde_json::from_value(json!({"id": "bare"})).unwrap(),
            serde_json::from_value(json!({
                "id": "broken",
                "location": {"type": "Point", "coordinates": [1.0]}
            }))
            .unwrap(),
        ];
        let result = resolve(
            records,
            Some(&geo(0.0, 0.0, 10.0, false)),
            SortMode::Relevance,
            &page(),
        );
        let ids: Vec<&str> = result.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["located"]);
    }

    #[test]
    fn newest_sorts_descending_with_missing_as_epoch_zero() {
        let records = vec![
            created("old", Some("2020-01-01T00:00:00Z")),
            created("unknown", None),
            created("new", Some("2024-06-01T00:00:00Z")),
        ];
        let result = resolve(records, None, SortMode::Newest, &page());
        let ids: Vec<&str> = result.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "unknown"]);
    }

    #[test]
    fn started_oldest_puts_missing_first() {
        let mut a = created("a", None);
        a.academy_startat = Some("2021-01-01T00:00:00Z".parse().unwrap());
        let mut b = created("b", None);
        b.academy_startat = Some("2018-01-01T00:00:00Z".parse().unwrap());
        let c = created("c", None);

        let result = resolve(vec![a, b, c], None, SortMode::StartedOldest, &page());
        let ids: Vec<&str> = result.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn empty_superset_is_a_valid_page() {
        let result = resolve(Vec::new(), None, SortMode::Relevance, &page());
        assert_eq!(result.total, 0);
        assert_eq!(result.total_pages, 1);
    }
}
