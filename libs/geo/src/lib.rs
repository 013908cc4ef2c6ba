#![forbid(unsafe_code)]

//! Great-circle geometry for the academy directory.
//!
//! The store keeps locations as GeoJSON-style `[longitude, latitude]` pairs;
//! this crate validates that shape and computes haversine distances for the
//! in-memory proximity path.

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A validated geographic point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build a point from a GeoJSON coordinate pair (`[lng, lat]`).
    ///
    /// Returns `None` unless the slice is exactly two finite numbers; callers
    /// treat that as "no usable location" rather than an error.
    pub fn from_lng_lat_slice(coords: &[f64]) -> Option<Self> {
        match coords {
            [lng, lat] if lng.is_finite() && lat.is_finite() => Some(Self {
                lat: *lat,
                lng: *lng,
            }),
            _ => None,
        }
    }

    /// Haversine distance to another point, in kilometers.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        distance_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Haversine distance in kilometers between two lat/lng points.
///
/// Pure and total: NaN inputs propagate NaN, identical points yield zero.
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_are_zero_distance() {
        assert_eq!(distance_km(48.1, 11.5, 48.1, 11.5), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let there = distance_km(52.52, 13.405, 48.8566, 2.3522);
        let back = distance_km(48.8566, 2.3522, 52.52, 13.405);
        assert_eq!(there, back);
    }

    #[test]
    fn one_degree_of_longitude_at_the_equator() {
        // 2 * pi * 6371 / 360 ~= 111.19 km
        let d = distance_km(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111.19).abs() < 0.05, "got {d}");
    }

    #[test]
    fn nan_propagates() {
        assert!(distance_km(f64::NAN, 0.0, 0.0, 0.0).is_nan());
    }

    #[test]
    fn from_lng_lat_slice_requires_two_finite_members() {
        assert_eq!(
            GeoPoint::from_lng_lat_slice(&[11.5, 48.1]),
            Some(GeoPoint::new(48.1, 11.5))
        );
        assert_eq!(GeoPoint::from_lng_lat_slice(&[11.5]), None);
        assert_eq!(GeoPoint::from_lng_lat_slice(&[11.5, 48.1, 0.0]), None);
        assert_eq!(GeoPoint::from_lng_lat_slice(&[f64::NAN, 48.1]), None);
        assert_eq!(GeoPoint::from_lng_lat_slice(&[]), None);
    }
}
