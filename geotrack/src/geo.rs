//! Great-circle distance on a spherical Earth.

/// Mean Earth radius in meters used for all distance calculations.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two `(latitude, longitude)` points
/// given in degrees.
///
/// # Example
///
/// ```
/// use geotrack::geo::distance_m;
///
/// // One degree of latitude is roughly 111 km
/// let d = distance_m((0.0, 0.0), (1.0, 0.0));
/// assert!((d - 111_195.0).abs() < 10.0);
/// ```
pub fn distance_m(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = from;
    let (lat2, lon2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    // Clamp guards against a slightly > 1.0 from rounding at antipodes
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Point reached by travelling `distance_m` meters due north from `origin`.
///
/// Used to place positions at exact distances from a zone center.
pub fn offset_north(origin: (f64, f64), distance_m: f64) -> (f64, f64) {
    let dlat = (distance_m / EARTH_RADIUS_M).to_degrees();
    (origin.0 + dlat, origin.1)
}

/// Returns true if the pair is a usable coordinate: finite, in range, and
/// not the `(0, 0)`-style placeholder a platform reports before its first fix.
pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && latitude != 0.0
        && longitude != 0.0
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_distance() {
        assert_eq!(distance_m((10.0, 10.0), (10.0, 10.0)), 0.0);
    }

    #[test]
    fn test_known_distance() {
        // Paris to London is about 343.5 km
        let d = distance_m((48.8566, 2.3522), (51.5074, -0.1278));
        assert!((d - 343_500.0).abs() < 1_000.0, "got {}", d);
    }

    #[test]
    fn test_offset_north_round_trips_distance() {
        let origin = (10.0, 10.0);
        let moved = offset_north(origin, 50.0);
        let d = distance_m(origin, moved);
        assert!((d - 50.0).abs() < 1e-6, "got {}", d);
    }

    #[test]
    fn test_valid_coordinate() {
        assert!(is_valid_coordinate(19.43, -99.13));
        assert!(!is_valid_coordinate(0.0, -99.13));
        assert!(!is_valid_coordinate(19.43, 0.0));
        assert!(!is_valid_coordinate(91.0, 10.0));
        assert!(!is_valid_coordinate(10.0, 181.0));
        assert!(!is_valid_coordinate(f64::NAN, 10.0));
    }

    proptest! {
        #[test]
        fn prop_distance_is_symmetric(
            lat1 in -89.0f64..89.0, lon1 in -179.0f64..179.0,
            lat2 in -89.0f64..89.0, lon2 in -179.0f64..179.0,
        ) {
            let a = distance_m((lat1, lon1), (lat2, lon2));
            let b = distance_m((lat2, lon2), (lat1, lon1));
            prop_assert!((a - b).abs() < 1e-6);
        }

        #[test]
        fn prop_distance_is_bounded(
            lat1 in -90.0f64..90.0, lon1 in -180.0f64..180.0,
            lat2 in -90.0f64..90.0, lon2 in -180.0f64..180.0,
        ) {
            let d = distance_m((lat1, lon1), (lat2, lon2));
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_M + 1.0);
        }
    }
}
