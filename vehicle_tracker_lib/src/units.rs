use geo_types::Point;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// km -> miles factor. Lossy display conversion; everything is stored metric.
pub const MILES_PER_KM: f64 = 0.621371;

pub const KPH_PER_MPS: f64 = 3.6;

/// Great-circle distance between two points in km, haversine formula.
pub fn haversine_km(from: Point, to: Point) -> f64 {
    let d_lat = (to.y() - from.y()).to_radians();
    let d_lon = (to.x() - from.x()).to_radians();
    let lat1 = from.y().to_radians();
    let lat2 = to.y().to_radians();

    let a = f64::sin(d_lat / 2.).powi(2)
        + f64::cos(lat1) * f64::cos(lat2) * f64::sin(d_lon / 2.).powi(2);
    let c = 2. * f64::atan2(f64::sqrt(a), f64::sqrt(1. - a));

    EARTH_RADIUS_KM * c
}

pub fn km_to_miles(km: f64) -> f64 {
    km * MILES_PER_KM
}

pub fn miles_to_km(miles: f64) -> f64 {
    miles / MILES_PER_KM
}

pub fn kph_to_mph(kph: f64) -> f64 {
    kph * MILES_PER_KM
}

pub fn mps_to_kph(mps: f64) -> f64 {
    mps * KPH_PER_MPS
}

#[test]
fn test_haversine_degenerate() {
    let p = Point::new(9.0, 55.0);
    assert_eq!(haversine_km(p, p), 0.0);
}

#[test]
fn test_haversine_two_meters_east() {
    // ~2.2 m east along the equator
    let from = Point::new(0.0, 0.0);
    let to = Point::new(0.00002, 0.0);
    let d = haversine_km(from, to);
    assert!((d - 0.0022239).abs() < 1e-6, "got {d}");
}

#[test]
fn test_haversine_known_distance() {
    // Copenhagen -> Aarhus, roughly 157 km
    let cph = Point::new(12.5683, 55.6761);
    let aar = Point::new(10.2039, 56.1629);
    let d = haversine_km(cph, aar);
    assert!((150.0..165.0).contains(&d), "got {d}");
}

#[test]
fn test_mile_round_trip() {
    let km = 9.5;
    let back = miles_to_km(km_to_miles(km));
    assert!((back - km).abs() < 1e-12);
}

#[test]
fn test_speed_conversions() {
    assert!((mps_to_kph(10.0) - 36.0).abs() < 1e-12);
    assert!((kph_to_mph(100.0) - 62.1371).abs() < 1e-9);
}
