//! The filter compiler: request parameters in, typed predicate out.
//!
//! The predicate is a struct of optional clauses rather than a dynamic query
//! object; clause groups combine with AND, fields inside the free-text group
//! and the two program arrays inside the fee group combine with OR. The same
//! predicate drives the SQL builder and the in-memory evaluation, so both
//! executors filter identically.

use academy_geo::GeoPoint;

use crate::config::SearchConfig;
use crate::models::AcademyRecord;
use crate::search::page::Page;
use crate::search::params::{SearchParams, SortMode};

/// Store-agnostic filter constraints compiled from request parameters.
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    /// Case-insensitive substring, OR-combined over name, type, phone,
    /// address city, and program names.
    pub text: Option<String>,
    /// Exact match on the stored `type` value.
    pub kind: Option<String>,
    /// Exact match on the externally-assigned id.
    pub external_id: Option<String>,
    /// Case-insensitive substring on `address.state`.
    pub state: Option<String>,
    /// Case-insensitive substring on `address.country`.
    pub country: Option<String>,
    pub rating: Option<RatingBucket>,
    /// At least one program entry (either array) must have a fee in range.
    pub fee: Option<FeeRange>,
}

/// Rating bucket: selector 1-4 covers `[v, v+1)`, selector 5 is exactly 5.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RatingBucket {
    Band { min: f64, below: f64 },
    Exactly(f64),
}

impl RatingBucket {
    /// Out-of-range selectors (including 0) mean "no constraint".
    pub fn from_selector(value: f64) -> Option<Self> {
        if !value.is_finite() || value <= 0.0 {
            None
        } else if value == 5.0 {
            Some(Self::Exactly(5.0))
        } else if (1.0..=4.0).contains(&value) {
            Some(Self::Band {
                min: value,
                below: value + 1.0,
            })
        } else {
            None
        }
    }

    pub fn contains(&self, rating: f64) -> bool {
        match self {
            Self::Band { min, below } => rating >= *min && rating < *below,
            Self::Exactly(v) => rating == *v,
        }
    }
}

/// Inclusive fee bounds; a missing side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeeRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl FeeRange {
    pub fn contains(&self, fee: f64) -> bool {
        self.min.map_or(true, |min| fee >= min) && self.max.map_or(true, |max| fee <= max)
    }
}

/// Resolved proximity request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoQuery {
    pub center: GeoPoint,
    /// Always positive: an absent, zero, or negative request resolves to the
    /// configured default radius.
    pub radius_km: f64,
    /// Whether the caller supplied a positive radius themselves. The
    /// in-memory path only cuts results off at the radius when this is set.
    pub explicit_radius: bool,
}

impl GeoQuery {
    pub fn radius_meters(&self) -> f64 {
        self.radius_km * 1000.0
    }
}

/// Everything the executors need: predicate plus resolved sort/geo/paging.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub predicate: Predicate,
    pub geo: Option<GeoQuery>,
    pub sort: SortMode,
    pub page: Page,
}

/// Compile a parameter bag into a query. Pure; performs no I/O.
pub fn compile(params: &SearchParams, config: &SearchConfig) -> CompiledQuery {
    let fee = if params.min_fee.is_some() || params.max_fee.is_some() {
        Some(FeeRange {
            min: params.min_fee,
            max: params.max_fee,
        })
    } else {
        None
    };

    let predicate = Predicate {
        text: params.q.clone(),
        kind: params.kind.clone(),
        external_id: params.id.clone(),
        state: params.state.clone(),
        country: params.country.clone(),
        rating: RatingBucket::from_selector(params.min_rating),
        fee,
    };

    let geo = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => {
            let explicit_radius = params.radius_km.is_some_and(|r| r > 0.0);
            let radius_km = if explicit_radius {
                params.radius_km.unwrap_or(config.default_radius_km)
            } else {
                config.default_radius_km
            };
            Some(GeoQuery {
                center: GeoPoint::new(lat, lng),
                radius_km,
                explicit_radius,
            })
        }
        _ => None,
    };

    CompiledQuery {
        predicate,
        geo,
        sort: params.sort,
        page: Page::resolve(params.page, params.limit, config),
    }
}

impl Predicate {
    /// Reference in-memory evaluation; the memory store and the test suite
    /// filter with this, the SQL builder mirrors it clause for clause.
    pub fn matches(&self, record: &AcademyRecord) -> bool {
        if let Some(needle) = &self.text {
            if !self.text_matches(needle, record) {
                return false;
            }
        }

        if let Some(kind) = &self.kind {
            if record.kind != *kind {
                return false;
            }
        }

        if let Some(id) = &self.external_id {
            if record.id != *id {
                return false;
            }
        }

        if let Some(state) = &self.state {
            if !contains_ci(&record.address.state, state) {
                return false;
            }
        }

        if let Some(country) = &self.country {
            if !contains_ci(&record.address.country, country) {
                return false;
            }
        }

        if let Some(bucket) = &self.rating {
            match record.average_rating {
                Some(rating) if bucket.contains(rating) => {}
                _ => return false,
            }
        }

        if let Some(range) = &self.fee {
            if !record.fees().any(|fee| range.contains(fee)) {
                return false;
            }
        }

        true
    }

    fn text_matches(&self, needle: &str, record: &AcademyRecord) -> bool {
        contains_ci(&record.name, needle)
            || contains_ci(&record.kind, needle)
            || contains_ci(&record.phone, needle)
            || contains_ci(&record.address.city, needle)
            || record
                .artprogram
                .iter()
                .any(|p| p.art_name.as_deref().is_some_and(|n| contains_ci(n, needle)))
            || record
                .sportsprogram
                .iter()
                .any(|p| p.sport_name.as_deref().is_some_and(|n| contains_ci(n, needle)))
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(doc: serde_json::Value) -> AcademyRecord {
        serde_json::from_value(doc).unwrap()
    }

    fn config() -> SearchConfig {
        SearchConfig::default()
    }

    #[test]
    fn rating_selector_buckets() {
        let three = RatingBucket::from_selector(3.0).unwrap();
        assert!(three.contains(3.0));
        assert!(three.contains(3.9));
        assert!(!three.contains(4.0));

        let five = RatingBucket::from_selector(5.0).unwrap();
        assert!(five.contains(5.0));
        assert!(!five.contains(4.9));

        assert_eq!(RatingBucket::from_selector(0.0), None);
        assert_eq!(RatingBucket::from_selector(-2.0), None);
        assert_eq!(RatingBucket::from_selector(7.0), None);
        assert_eq!(RatingBucket::from_selector(f64::NAN), None);
    }

    #[test]
    fn free_text_matches_type_and_city_substrings() {
        let predicate = Predicate {
            text: Some("art".to_string()),
            ..Default::default()
        };

        assert!(predicate.matches(&record(json!({"id": "a", "type": "Art"}))));
        assert!(predicate.matches(&record(
            json!({"id": "b", "type": "Sports", "address": {"city": "Smartville"}})
        )));
        assert!(!predicate.matches(&record(
            json!({"id": "c", "type": "Sports", "address": {"city": "Plainfield"}})
        )));
    }

    #[test]
    fn free_text_reaches_program_names() {
        let predicate = Predicate {
            text: Some("kathak".to_string()),
            ..Default::default()
        };
        assert!(predicate.matches(&record(json!({
            "id": "a",
            "artprogram": [{"art_name": "Kathak Dance", "level": "Beginner"}]
        }))));
    }

    #[test]
    fn clause_groups_combine_with_and() {
        // Text matches but fee does not: the record must be rejected.
        let predicate = Predicate {
            text: Some("art".to_string()),
            fee: Some(FeeRange {
                min: Some(1000.0),
                max: None,
            }),
            ..Default::default()
        };
        let cheap = record(json!({
            "id": "a",
            "type": "Art",
            "artprogram": [{"art_name": "Sketching", "fees_per_month": 500}]
        }));
        assert!(!predicate.matches(&cheap));

        let pricey = record(json!({
            "id": "b",
            "type": "Art",
            "artprogram": [{"art_name": "Sketching", "fees_per_month": 1500}]
        }));
        assert!(predicate.matches(&pricey));
    }

    #[test]
    fn fee_range_reads_both_program_arrays() {
        let predicate = Predicate {
            fee: Some(FeeRange {
                min: Some(700.0),
                max: Some(900.0),
            }),
            ..Default::default()
        };
        // An Art academy whose only in-range fee sits in the sports array.
        let cross = record(json!({
            "id": "a",
            "type": "Art",
            "artprogram": [{"art_name": "Violin", "fees_per_month": 2000}],
            "sportsprogram": [{"sport_name": "Yoga", "fees_per_month": 800}]
        }));
        assert!(predicate.matches(&cross));
    }

    #[test]
    fn geo_resolution_defaults_and_overrides() {
        let mut params = SearchParams {
            lat: Some(10.0),
            lng: Some(20.0),
            ..Default::default()
        };

        let compiled = compile(&params, &config());
        let geo = compiled.geo.unwrap();
        assert_eq!(geo.radius_km, config().default_radius_km);
        assert!(!geo.explicit_radius);

        params.radius_km = Some(0.0);
        let geo = compile(&params, &config()).geo.unwrap();
        assert_eq!(geo.radius_km, config().default_radius_km);
        assert!(!geo.explicit_radius);

        params.radius_km = Some(-3.0);
        let geo = compile(&params, &config()).geo.unwrap();
        assert!(!geo.explicit_radius);

        params.radius_km = Some(25.0);
        let geo = compile(&params, &config()).geo.unwrap();
        assert_eq!(geo.radius_km, 25.0);
        assert!(geo.explicit_radius);
    }

    #[test]
    fn geo_requires_both_coordinates() {
        let params = SearchParams {
            lat: Some(10.0),
            ..Default::default()
        };
        assert!(compile(&params, &config()).geo.is_none());
    }

    #[test]
    fn rating_constraint_requires_a_rating() {
        let predicate = Predicate {
            rating: RatingBucket::from_selector(2.0),
            ..Default::default()
        };
        assert!(!predicate.matches(&record(json!({"id": "a"}))));
        assert!(predicate.matches(&record(json!({"id": "b", "average_rating": 2.5}))));
    }
}
