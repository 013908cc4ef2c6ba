//! Fee extraction for price sorting.
//!
//! A record's sortable fee spread pools every finite fee across BOTH program
//! arrays; the type field says which array is semantically populated, but
//! stored documents are not trusted on that point.

use std::cmp::Ordering;

use crate::models::AcademyRecord;
use crate::search::params::SortMode;

/// Per-record min/max over the pooled fee values.
///
/// A record with no fee entries carries `min = +inf` / `max = -inf`, which
/// pushes it to the end under both comparators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeSpread {
    pub min: f64,
    pub max: f64,
}

impl FeeSpread {
    pub fn of(record: &AcademyRecord) -> Self {
        let mut spread = Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        };
        for fee in record.fees() {
            spread.min = spread.min.min(fee);
            spread.max = spread.max.max(fee);
        }
        spread
    }
}

/// Order two records for a fee sort.
///
/// - low-to-high: ascending min fee, ties broken by ascending max fee
/// - high-to-low: descending max fee, ties broken by descending min fee
///
/// Ordering beyond the two keys is unspecified; `sort_by` is stable, so
/// fully tied records keep their incoming order.
pub fn compare(a: &FeeSpread, b: &FeeSpread, mode: SortMode) -> Ordering {
    match mode {
        SortMode::PriceLowHigh => total(a.min, b.min).then(total(a.max, b.max)),
        SortMode::PriceHighLow => total(b.max, a.max).then(total(b.min, a.min)),
        _ => Ordering::Equal,
    }
}

fn total(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Sort records in place by fee spread for the given mode.
pub fn sort_records(records: &mut Vec<AcademyRecord>, mode: SortMode) {
    let mut keyed: Vec<(FeeSpread, AcademyRecord)> = records
        .drain(..)
        .map(|r| (FeeSpread::of(&r), r))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| compare(a, b, mode));
    records.extend(keyed.into_iter().map(|(_, r)| r));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_fees(id: &str, art: &[f64], sports: &[f64]) -> AcademyRecord {
        let art: Vec<_> = art
            .iter()
            .map(|f| json!({"art_name": "p", "fees_per_month": f}))
            .collect();
        let sports: Vec<_> = sports
            .iter()
            .map(|f| json!({"sport_name": "p", "fees_per_month": f}))
            .collect();
        serde_json::from_value(json!({"id": id, "artprogram": art, "sportsprogram": sports}))
            .unwrap()
    }

    #[test]
    fn spread_pools_both_arrays() {
        let spread = FeeSpread::of(&with_fees("a", &[1500.0, 900.0], &[2200.0]));
        assert_eq!(spread.min, 900.0);
        assert_eq!(spread.max, 2200.0);
    }

    #[test]
    fn feeless_records_sort_last_both_ways() {
        let mut records = vec![
            with_fees("none", &[], &[]),
            with_fees("mid", &[2000.0], &[]),
            with_fees("low", &[500.0], &[]),
        ];

        sort_records(&mut records, SortMode::PriceLowHigh);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["low", "mid", "none"]);

        sort_records(&mut records, SortMode::PriceHighLow);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["mid", "low", "none"]);
    }

    #[test]
    fn low_high_breaks_min_ties_by_max() {
        let mut records = vec![
            with_fees("wide", &[1000.0, 4000.0], &[]),
            with_fees("narrow", &[1000.0, 1200.0], &[]),
        ];
        sort_records(&mut records, SortMode::PriceLowHigh);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["narrow", "wide"]);
    }

    #[test]
    fn high_low_breaks_max_ties_by_min() {
        let mut records = vec![
            with_fees("low-floor", &[800.0, 3000.0], &[]),
            with_fees("high-floor", &[2500.0, 3000.0], &[]),
        ];
        sort_records(&mut records, SortMode::PriceHighLow);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["high-floor", "low-floor"]);
    }
}
