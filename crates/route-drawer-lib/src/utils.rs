//! Web Mercator conversions shared by segment projection and screen projection

use crate::Coordinate;
use geo::Point;

/// Web Mercator bounds in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;
pub const EARTH_MERCATOR_MIN: f64 = -20037508.34;
pub const EARTH_SIZE_METERS: f64 = EARTH_MERCATOR_MAX - EARTH_MERCATOR_MIN;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Side length in pixels of a slippy-map tile
pub const TILE_SIZE_PX: f64 = 256.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / 180.0
const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / PI
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / std::f64::consts::PI;

/// Precomputed constant: 180.0 / EARTH_MERCATOR_MAX
const X_TO_LON_FACTOR: f64 = 180.0 / EARTH_MERCATOR_MAX;

/// Precomputed constant: PI / EARTH_MERCATOR_MAX
const Y_TO_LAT_FACTOR: f64 = std::f64::consts::PI / EARTH_MERCATOR_MAX;

/// Convert WGS84 (lat, lon) to Web Mercator (x, y) in meters
///
/// Latitude is clamped to the representable range first.
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

    let x = lon * LON_TO_X_FACTOR;
    let lat_rad = lat.to_radians();
    let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * Y_FACTOR;

    Point::new(x, y)
}

/// Convert Web Mercator (x, y) in meters to WGS84 (lat, lon) in degrees
#[inline(always)]
pub fn mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = x * X_TO_LON_FACTOR;
    let lat =
        (std::f64::consts::PI / 2.0 - 2.0 * ((-y * Y_TO_LAT_FACTOR).exp()).atan()).to_degrees();
    (lat, lon)
}

/// Convert a coordinate to its Web Mercator point
#[inline(always)]
pub fn coordinate_to_mercator(coordinate: Coordinate) -> Point<f64> {
    wgs84_to_mercator(coordinate.lat, coordinate.lng)
}

/// Convert a Web Mercator point back to a coordinate
#[inline(always)]
pub fn mercator_to_coordinate(point: Point<f64>) -> Coordinate {
    let (lat, lng) = mercator_to_wgs84(point.x(), point.y());
    Coordinate::new(lat, lng)
}

/// Screen pixels per Web Mercator meter at a fractional zoom level
#[inline]
pub fn pixels_per_meter(zoom: f64) -> f64 {
    TILE_SIZE_PX * zoom.exp2() / EARTH_SIZE_METERS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs84_to_mercator_origin() {
        let point = wgs84_to_mercator(0.0, 0.0);
        assert!((point.x() - 0.0).abs() < 0.01);
        assert!((point.y() - 0.0).abs() < 0.01);
    }

    #[test]
    fn test_wgs84_to_mercator_bounds() {
        let west = wgs84_to_mercator(0.0, -180.0);
        assert!((west.x() - EARTH_MERCATOR_MIN).abs() < 1.0);

        let east = wgs84_to_mercator(0.0, 180.0);
        assert!((east.x() - EARTH_MERCATOR_MAX).abs() < 1.0);
    }

    #[test]
    fn test_coordinate_roundtrip_tokyo() {
        let tokyo = Coordinate::new(35.6854, 139.7528);
        let back = mercator_to_coordinate(coordinate_to_mercator(tokyo));

        assert!((tokyo.lat - back.lat).abs() < 1e-9);
        assert!((tokyo.lng - back.lng).abs() < 1e-9);
    }

    #[test]
    fn test_polar_latitude_is_clamped() {
        let north = wgs84_to_mercator(90.0, 0.0);
        assert!(north.y().is_finite());
        assert!((north.y() - EARTH_MERCATOR_MAX).abs() < 1.0);
    }

    #[test]
    fn test_zoom_zero_fits_world_in_one_tile() {
        let world_px = EARTH_SIZE_METERS * pixels_per_meter(0.0);
        assert!((world_px - TILE_SIZE_PX).abs() < 1e-9);

        // Each zoom level doubles the scale
        assert!((pixels_per_meter(3.0) / pixels_per_meter(2.0) - 2.0).abs() < 1e-12);
    }
}
