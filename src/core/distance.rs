use crate::models::PropertyAttributes;

/// Earth's radius in miles
const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Calculate the Haversine distance between two points in miles
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in miles. A pair at `(0, 0)`, or one outside the valid
/// latitude/longitude ranges, is treated as unknown and yields 0; callers
/// must read 0 as "distance unknown", not "co-located".
#[inline]
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if is_unknown_pair(lat1, lon1) || is_unknown_pair(lat2, lon2) {
        return 0.0;
    }

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Distance between two properties, 0 when either location is unknown
#[inline]
pub fn distance_between(a: &PropertyAttributes, b: &PropertyAttributes) -> f64 {
    match (a.latitude, a.longitude, b.latitude, b.longitude) {
        (Some(lat1), Some(lon1), Some(lat2), Some(lon2)) => haversine_miles(lat1, lon1, lat2, lon2),
        _ => 0.0,
    }
}

/// Whether a coordinate pair carries no usable location
#[inline]
pub fn is_unknown_pair(lat: f64, lon: f64) -> bool {
    !lat.is_finite()
        || !lon.is_finite()
        || !(-90.0..=90.0).contains(&lat)
        || !(-180.0..=180.0).contains(&lon)
        || (lat == 0.0 && lon == 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points() {
        let distance = haversine_miles(25.7617, -80.1918, 25.7617, -80.1918);
        assert_eq!(distance, 0.0);
    }

    #[test]
    fn test_one_degree_latitude() {
        let distance = haversine_miles(25.0, -80.0, 26.0, -80.0);
        assert!((distance - 69.0).abs() < 1.0, "Distance should be ~69mi, got {}", distance);
    }

    #[test]
    fn test_miami_to_orlando() {
        // Roughly 200 miles as the crow flies
        let distance = haversine_miles(25.7617, -80.1918, 28.5383, -81.3792);
        assert!((distance - 205.0).abs() < 10.0, "Distance should be ~205mi, got {}", distance);
    }

    #[test]
    fn test_unknown_coordinates() {
        assert_eq!(haversine_miles(0.0, 0.0, 25.7617, -80.1918), 0.0);
        assert_eq!(haversine_miles(25.7617, -80.1918, f64::NAN, -80.0), 0.0);

        let known = PropertyAttributes {
            latitude: Some(25.7617),
            longitude: Some(-80.1918),
            ..Default::default()
        };
        let missing = PropertyAttributes::default();
        assert_eq!(distance_between(&known, &missing), 0.0);
    }

    #[test]
    fn test_out_of_range_coordinates_are_unknown() {
        // lat 257.617 is a misplaced decimal point, not a location
        assert_eq!(haversine_miles(257.617, -80.1918, 25.79, -80.13), 0.0);
        assert_eq!(haversine_miles(25.7617, -190.0, 25.79, -80.13), 0.0);
        assert!(is_unknown_pair(-91.0, 10.0));
        assert!(!is_unknown_pair(-90.0, 180.0));
    }
}
