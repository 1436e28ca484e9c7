pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points via the Haversine formula.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    // Clamp against rounding drift before asin.
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Inclusive radius check: a marker at exactly `radius_km` counts as inside.
pub fn within_radius(lat: f64, lng: f64, marker_lat: f64, marker_lng: f64, radius_km: f64) -> bool {
    haversine_km(lat, lng, marker_lat, marker_lng) <= radius_km
}

/// Closed latitude interval containing every point within `radius_km` of
/// `lat`. Used as a coarse, index-friendly prefilter before the exact
/// Haversine check.
pub fn lat_window(lat: f64, radius_km: f64) -> (f64, f64) {
    let delta = (radius_km / EARTH_RADIUS_KM).to_degrees();
    ((lat - delta).max(-90.0), (lat + delta).min(90.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance() {
        assert_eq!(haversine_km(37.5, 127.0, 37.5, 127.0), 0.0);
    }

    #[test]
    fn seoul_city_hall_to_gangnam() {
        // ~8.8 km apart.
        let d = haversine_km(37.5663, 126.9779, 37.4979, 127.0276);
        assert!((8.4..=9.2).contains(&d), "distance was {d}");
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = haversine_km(0.0, 0.0, 0.0, 180.0);
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((d - half).abs() < 1.0, "distance was {d}");
    }

    #[test]
    fn within_radius_is_inclusive_at_the_boundary() {
        // Seoul City Hall to Gangnam station; query with the exact distance.
        let d = haversine_km(37.5663, 126.9779, 37.4979, 127.0276);
        assert!(within_radius(37.5663, 126.9779, 37.4979, 127.0276, d));
        // One millimetre less and the point falls outside.
        assert!(!within_radius(37.5663, 126.9779, 37.4979, 127.0276, d - 1e-6));
    }

    #[test]
    fn within_radius_excludes_far_points_at_tiny_radius() {
        // ~50 km apart, queried with a 0.1 m radius.
        assert!(!within_radius(37.5, 127.0, 37.95, 127.0, 0.0001));
        assert!(within_radius(37.5, 127.0, 37.5, 127.0, 0.0001));
    }

    #[test]
    fn lat_window_contains_radius() {
        let (min, max) = lat_window(37.5, 10.0);
        // 10 km is just under 0.09 degrees of latitude.
        assert!(min < 37.5 - 0.089 && min > 37.5 - 0.1);
        assert!(max > 37.5 + 0.089 && max < 37.5 + 0.1);
    }

    #[test]
    fn lat_window_clamps_at_poles() {
        let (min, max) = lat_window(89.99, 50.0);
        assert!(min < 89.99);
        assert_eq!(max, 90.0);
        let (min, _) = lat_window(-89.99, 50.0);
        assert_eq!(min, -90.0);
    }
}
