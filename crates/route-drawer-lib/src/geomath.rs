//! Spherical geometry primitives
//!
//! Distances use the Haversine formula on a spherical Earth. Projection onto a
//! segment is solved in Web Mercator, which is conformal, so the perpendicular
//! foot found there matches what a user sees on the map.

use crate::utils;

/// Earth's radius in meters
pub const EARTH_RADIUS_M: f64 = 6371000.0;

/// A WGS84 position in degrees
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[inline]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(c: Coordinate) -> Self {
        geo::Point::new(c.lng, c.lat)
    }
}

impl From<geo::Point<f64>> for Coordinate {
    fn from(p: geo::Point<f64>) -> Self {
        Coordinate::new(p.y(), p.x())
    }
}

/// Anything with a position on the map
pub trait Located {
    fn coordinate(&self) -> Coordinate;
}

impl Located for Coordinate {
    #[inline]
    fn coordinate(&self) -> Coordinate {
        *self
    }
}

/// Closest point on a segment, with its parameter along the segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentProjection {
    pub point: Coordinate,
    /// Position along the segment, 0 at the start and 1 at the end
    pub t: f64,
}

/// Great-circle distance between two coordinates in meters
#[inline]
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lng - a.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Point at `fraction` of the great-circle arc from `a` to `b`
pub fn intermediate_point(a: Coordinate, b: Coordinate, fraction: f64) -> Coordinate {
    let delta = distance_meters(a, b) / EARTH_RADIUS_M;
    if delta == 0.0 {
        return a;
    }

    let (lat1, lon1) = (a.lat.to_radians(), a.lng.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lng.to_radians());
    let wa = ((1.0 - fraction) * delta).sin() / delta.sin();
    let wb = (fraction * delta).sin() / delta.sin();

    let x = wa * lat1.cos() * lon1.cos() + wb * lat2.cos() * lon2.cos();
    let y = wa * lat1.cos() * lon1.sin() + wb * lat2.cos() * lon2.sin();
    let z = wa * lat1.sin() + wb * lat2.sin();

    Coordinate::new(
        z.atan2(x.hypot(y)).to_degrees(),
        y.atan2(x).to_degrees(),
    )
}

/// Project `p` onto the segment `[start, end]`
///
/// `t` is clamped to `[0, 1]`, so the result never extends past either
/// endpoint. A degenerate segment yields `start` with `t = 0`.
pub fn project_onto_segment(p: Coordinate, start: Coordinate, end: Coordinate) -> SegmentProjection {
    let degenerate = SegmentProjection { point: start, t: 0.0 };
    if start == end {
        return degenerate;
    }

    let a = utils::coordinate_to_mercator(start);
    let b = utils::coordinate_to_mercator(end);
    let q = utils::coordinate_to_mercator(p);

    let dx = b.x() - a.x();
    let dy = b.y() - a.y();
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return degenerate;
    }

    let t = (((q.x() - a.x()) * dx + (q.y() - a.y()) * dy) / len_sq).clamp(0.0, 1.0);

    // Endpoints are returned exactly to avoid Mercator round-trip drift
    let point = if t == 0.0 {
        start
    } else if t == 1.0 {
        end
    } else {
        utils::mercator_to_coordinate(geo::Point::new(a.x() + t * dx, a.y() + t * dy))
    };

    SegmentProjection { point, t }
}

/// Sum of consecutive segment distances in meters, 0 for fewer than 2 points
pub fn polyline_length<P: Located>(points: &[P]) -> f64 {
    points
        .windows(2)
        .map(|pair| distance_meters(pair[0].coordinate(), pair[1].coordinate()))
        .sum()
}
