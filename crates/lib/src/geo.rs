//! Great-circle distance between two points given in decimal degrees.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between `(lat, lng)` pairs.
pub fn haversine_km(origin: (f64, f64), destination: (f64, f64)) -> f64 {
    let (lat1, lng1) = origin;
    let (lat2, lng2) = destination;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
