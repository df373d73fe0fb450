use geo::{point, HaversineDistance};

use crate::models::BoundingBox;

/// Mean Earth radius in kilometers, matching the radius `geo` uses
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let origin = point!(x: lon1, y: lat1);
    let destination = point!(x: lon2, y: lat2);

    origin.haversine_distance(&destination) / 1000.0
}

/// Calculate a bounding box around a center point
///
/// Used to narrow the seeker pool before exact distances are computed.
/// 1° latitude ≈ 111km, 1° longitude ≈ 111km * cos(latitude). Using 111
/// (slightly under the true 111.19) keeps the box a little larger than the
/// circle, so nothing inside the radius is cut.
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / 111.0;

    let cos_lat = lat.to_radians().cos().abs();
    let lon_delta = if cos_lat < 1e-6 {
        180.0
    } else {
        radius_km / (111.0 * cos_lat)
    };

    BoundingBox {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    lat >= bbox.min_lat && lat <= bbox.max_lat && lon >= bbox.min_lon && lon <= bbox.max_lon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point() {
        let distance = haversine_distance(18.52, 73.85, 18.52, 73.85);
        assert!(distance.abs() < 1e-9);
    }

    #[test]
    fn test_haversine_pune_to_mumbai() {
        // Pune to Mumbai is roughly 120 km as the crow flies
        let distance = haversine_distance(18.5204, 73.8567, 19.0760, 72.8777);
        assert!(distance > 110.0 && distance < 130.0, "got {}", distance);
    }

    #[test]
    fn test_haversine_along_meridian() {
        let one_degree = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((one_degree - EARTH_RADIUS_KM.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_bounding_box_contains_radius() {
        let bbox = calculate_bounding_box(18.52, 73.85, 50.0);

        // A point 49.9 km due north must survive the pre-filter
        let north = 18.52 + (49.9 / EARTH_RADIUS_KM).to_degrees();
        assert!(is_within_bounding_box(north, 73.85, &bbox));

        assert!(!is_within_bounding_box(19.5, 73.85, &bbox));
    }

    #[test]
    fn test_bounding_box_near_pole() {
        let bbox = calculate_bounding_box(90.0, 0.0, 10.0);
        assert!(is_within_bounding_box(89.95, 120.0, &bbox));
    }
}
