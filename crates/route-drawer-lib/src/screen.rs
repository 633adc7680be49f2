//! Screen-space hit testing
//!
//! The map widget owns the real projection; this module only needs the
//! [`ScreenProjector`] seam to answer "did the click land on a waypoint",
//! "did it land on the route line" and "which points are inside the
//! selection box". All tests are plain pixel-distance comparisons.

use crate::geomath::{Coordinate, Located};
use crate::route::{PointId, RoutePoint};
use crate::utils;
use crate::waypoint::Waypoint;
use geo::{Closest, ClosestPoint, Coord, Line, Point, Rect};

/// Pixel position, x to the right and y downwards
pub type ScreenPoint = Coord<f64>;

/// Conversion between geographic and screen coordinates
pub trait ScreenProjector {
    fn project(&self, coordinate: Coordinate) -> ScreenPoint;
    fn unproject(&self, pixel: ScreenPoint) -> Coordinate;
}

/// Slippy-map projection centered on a coordinate
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WebMercatorProjector {
    pub center: Coordinate,
    /// Fractional zoom level (0 fits the world in one 256 px tile)
    pub zoom: f64,
    /// Viewport size in pixels (width, height)
    pub viewport: (f64, f64),
}

impl WebMercatorProjector {
    pub fn new(center: Coordinate, zoom: f64, viewport: (f64, f64)) -> Self {
        Self {
            center,
            zoom,
            viewport,
        }
    }
}

impl ScreenProjector for WebMercatorProjector {
    fn project(&self, coordinate: Coordinate) -> ScreenPoint {
        let scale = utils::pixels_per_meter(self.zoom);
        let center = utils::coordinate_to_mercator(self.center);
        let point = utils::coordinate_to_mercator(coordinate);
        Coord {
            x: (point.x() - center.x()) * scale + self.viewport.0 / 2.0,
            y: (center.y() - point.y()) * scale + self.viewport.1 / 2.0,
        }
    }

    fn unproject(&self, pixel: ScreenPoint) -> Coordinate {
        let scale = utils::pixels_per_meter(self.zoom);
        let center = utils::coordinate_to_mercator(self.center);
        let x = center.x() + (pixel.x - self.viewport.0 / 2.0) / scale;
        let y = center.y() - (pixel.y - self.viewport.1 / 2.0) / scale;
        utils::mercator_to_coordinate(Point::new(x, y))
    }
}

#[inline]
fn pixel_distance(a: ScreenPoint, b: ScreenPoint) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Whether `click` lands strictly within `radius_px` of any waypoint marker
pub fn is_near_existing_waypoint(
    click: ScreenPoint,
    waypoints: &[Waypoint],
    projector: &impl ScreenProjector,
    radius_px: f64,
) -> bool {
    waypoints
        .iter()
        .any(|w| pixel_distance(click, projector.project(w.coordinate())) < radius_px)
}

/// Whether `click` lands within `radius_px` of the drawn route line
pub fn is_near_route_line(
    click: ScreenPoint,
    points: &[RoutePoint],
    projector: &impl ScreenProjector,
    radius_px: f64,
) -> bool {
    if points.len() < 2 {
        return false;
    }

    let click_point = Point::from(click);
    let projected: Vec<ScreenPoint> = points
        .iter()
        .map(|p| projector.project(p.coordinate()))
        .collect();

    projected.windows(2).any(|pair| {
        let foot = match Line::new(pair[0], pair[1]).closest_point(&click_point) {
            Closest::Intersection(p) | Closest::SinglePoint(p) => p,
            Closest::Indeterminate => Point::from(pair[0]),
        };
        pixel_distance(click, foot.into()) <= radius_px
    })
}

/// Ids of the points whose markers fall inside the box spanned by two corners
///
/// Corners may be given in any order; edges count as inside.
pub fn points_in_screen_rect(
    points: &[RoutePoint],
    corner_a: ScreenPoint,
    corner_b: ScreenPoint,
    projector: &impl ScreenProjector,
) -> Vec<PointId> {
    let rect = Rect::new(corner_a, corner_b);
    let (min, max) = (rect.min(), rect.max());

    points
        .iter()
        .filter(|p| {
            let pixel = projector.project(p.coordinate());
            pixel.x >= min.x && pixel.x <= max.x && pixel.y >= min.y && pixel.y <= max.y
        })
        .map(|p| p.id())
        .collect()
}
