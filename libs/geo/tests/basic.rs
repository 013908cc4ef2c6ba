use academy_geo::{distance_km, GeoPoint};

#[test]
fn paris_to_berlin_is_roughly_878_km() {
    let d = distance_km(48.8566, 2.3522, 52.52, 13.405);
    assert!((d - 878.0).abs() < 2.0, "got {d}");
}

#[test]
fn point_distance_matches_free_function() {
    let a = GeoPoint::new(19.076, 72.8777);
    let b = GeoPoint::new(28.6139, 77.209);
    assert_eq!(a.distance_km(&b), distance_km(a.lat, a.lng, b.lat, b.lng));
}

#[test]
fn antipodal_points_are_half_the_circumference() {
    let d = distance_km(0.0, 0.0, 0.0, 180.0);
    let half = std::f64::consts::PI * academy_geo::EARTH_RADIUS_KM;
    assert!((d - half).abs() < 0.01, "got {d}");
}
