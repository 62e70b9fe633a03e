//! Great-circle distance.

use crate::events::types::GeoPoint;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points, in kilometres.
#[must_use]
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_for_same_point() {
        let p = GeoPoint::new(41.2709, -72.9463);
        assert!(haversine_km(p, p).abs() < 1e-9);
    }

    #[test]
    fn west_haven_to_new_haven_is_a_few_km() {
        let west_haven = GeoPoint::new(41.2709, -72.9463);
        let new_haven = GeoPoint::new(41.3083, -72.9279);
        let d = haversine_km(west_haven, new_haven);
        assert!((3.5..5.0).contains(&d), "got {d}");
        assert!((haversine_km(new_haven, west_haven) - d).abs() < 1e-9);
    }

    #[test]
    fn new_haven_to_hartford() {
        let new_haven = GeoPoint::new(41.3083, -72.9279);
        let hartford = GeoPoint::new(41.7658, -72.6734);
        let d = haversine_km(new_haven, hartford);
        assert!((50.0..60.0).contains(&d), "got {d}");
    }
}
