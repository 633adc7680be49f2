//! Route storage and structural editing
//!
//! A [`Route`] is an ordered list of [`RoutePoint`]s plus its cached total
//! length. Every editing operation borrows the route and returns a new value,
//! so callers never see a route change underneath them; the length is always
//! recomputed as part of building that new value.

use crate::geomath::{self, Coordinate, Located};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_POINT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, never reused identifier of a route point
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointId(u64);

impl PointId {
    /// Allocate a fresh identifier
    pub fn next() -> Self {
        Self(NEXT_POINT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pt-{}", self.0)
    }
}

/// A single vertex of the route polyline
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoutePoint {
    id: PointId,
    pub lat: f64,
    pub lng: f64,
    pub elevation: Option<f64>,
}

impl RoutePoint {
    fn create(point: NewPoint) -> Self {
        Self {
            id: PointId::next(),
            lat: point.lat,
            lng: point.lng,
            elevation: point.elevation,
        }
    }

    #[inline]
    pub fn id(&self) -> PointId {
        self.id
    }
}

impl Located for RoutePoint {
    #[inline]
    fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Point data before an id has been assigned
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewPoint {
    pub lat: f64,
    pub lng: f64,
    pub elevation: Option<f64>,
}

impl NewPoint {
    pub fn with_elevation(coordinate: Coordinate, elevation: Option<f64>) -> Self {
        Self {
            lat: coordinate.lat,
            lng: coordinate.lng,
            elevation,
        }
    }
}

impl From<Coordinate> for NewPoint {
    fn from(c: Coordinate) -> Self {
        Self::with_elevation(c, None)
    }
}

/// Partial update for a route point; `None` leaves a field untouched
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointPatch {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// `Some(None)` clears the elevation
    pub elevation: Option<Option<f64>>,
}

impl PointPatch {
    /// Patch that only moves a point
    pub fn position(coordinate: Coordinate) -> Self {
        Self {
            lat: Some(coordinate.lat),
            lng: Some(coordinate.lng),
            elevation: None,
        }
    }

    fn apply(&self, point: &mut RoutePoint) {
        if let Some(lat) = self.lat {
            point.lat = lat;
        }
        if let Some(lng) = self.lng {
            point.lng = lng;
        }
        if let Some(elevation) = self.elevation {
            point.elevation = elevation;
        }
    }
}

/// Snapped position on the route polyline
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClosestPoint {
    pub coordinate: Coordinate,
    /// Index `i` of the segment `[points[i], points[i + 1]]` holding `coordinate`
    pub nearest_point_index: usize,
}

/// The route being drawn
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    points: Vec<RoutePoint>,
    /// Polyline length in meters, derived from `points`
    distance: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Route {
    /// Create an empty route
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a route from point data, assigning fresh ids
    pub fn from_points<I, P>(points: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<NewPoint>,
    {
        Self::with_points(
            points
                .into_iter()
                .map(|p| RoutePoint::create(p.into()))
                .collect(),
        )
    }

    fn with_points(points: Vec<RoutePoint>) -> Self {
        let distance = geomath::polyline_length(&points);
        Self { points, distance }
    }

    /// All points in drawing order
    #[inline]
    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    /// Total length in meters
    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Find a point by id
    pub fn get(&self, id: PointId) -> Option<&RoutePoint> {
        self.points.iter().find(|p| p.id == id)
    }

    /// Position of a point in the route
    pub fn index_of(&self, id: PointId) -> Option<usize> {
        self.points.iter().position(|p| p.id == id)
    }

    /// Append a new point at the end
    pub fn add_point(&self, point: impl Into<NewPoint>) -> Route {
        let mut points = Vec::with_capacity(self.points.len() + 1);
        points.extend_from_slice(&self.points);
        points.push(RoutePoint::create(point.into()));
        Self::with_points(points)
    }

    /// Insert a new point so that it ends up at `index`
    ///
    /// `index` must be within `0..=len`. Violations are a caller bug: they
    /// panic in debug builds and are clamped to the end otherwise.
    pub fn insert_point(&self, index: usize, point: impl Into<NewPoint>) -> Route {
        debug_assert!(
            index <= self.points.len(),
            "insert index {} out of range for route of {} points",
            index,
            self.points.len()
        );
        let index = if index > self.points.len() {
            tracing::warn!(
                "Clamping insert index {} to route length {}",
                index,
                self.points.len()
            );
            self.points.len()
        } else {
            index
        };

        let mut points = Vec::with_capacity(self.points.len() + 1);
        points.extend_from_slice(&self.points[..index]);
        points.push(RoutePoint::create(point.into()));
        points.extend_from_slice(&self.points[index..]);
        Self::with_points(points)
    }

    /// Merge `patch` into the point with `id`; unknown ids leave the points as they are
    pub fn update_point(&self, id: PointId, patch: &PointPatch) -> Route {
        let points = self
            .points
            .iter()
            .map(|p| {
                let mut p = p.clone();
                if p.id == id {
                    patch.apply(&mut p);
                }
                p
            })
            .collect();
        Self::with_points(points)
    }

    /// Move a point; called for every frame of a drag
    pub fn move_point(&self, id: PointId, coordinate: Coordinate) -> Route {
        self.update_point(id, &PointPatch::position(coordinate))
    }

    /// Remove the point with `id`, if present
    pub fn delete_point(&self, id: PointId) -> Route {
        self.retain_points(|p| p.id != id)
    }

    /// Remove every point whose id is in `ids`, recomputing the length once
    pub fn delete_multiple_points(&self, ids: &HashSet<PointId>) -> Route {
        self.retain_points(|p| !ids.contains(&p.id))
    }

    fn retain_points(&self, keep: impl Fn(&RoutePoint) -> bool) -> Route {
        Self::with_points(self.points.iter().filter(|p| keep(p)).cloned().collect())
    }

    /// Insertion index for a click near the line
    ///
    /// Returns `i + 1` for the segment `i` closest to `coordinate`, measured
    /// to the perpendicular foot on each segment. The first minimal segment in
    /// point order wins ties, so a click exactly on a shared vertex inserts
    /// before that vertex. Routes with fewer than 2 points have no segments;
    /// the append position is returned for them.
    pub fn find_closest_segment_index(&self, coordinate: Coordinate) -> usize {
        if self.points.len() < 2 {
            return self.points.len();
        }

        let mut min_distance = f64::INFINITY;
        let mut insert_index = 1;

        for (i, pair) in self.points.windows(2).enumerate() {
            let projection = geomath::project_onto_segment(
                coordinate,
                pair[0].coordinate(),
                pair[1].coordinate(),
            );
            let distance = geomath::distance_meters(coordinate, projection.point);
            if distance < min_distance {
                min_distance = distance;
                insert_index = i + 1;
            }
        }

        insert_index
    }

    /// Snap `coordinate` onto this route; see [`find_closest_point_on_route`]
    pub fn closest_point(&self, coordinate: Coordinate) -> ClosestPoint {
        find_closest_point_on_route(coordinate, &self.points)
    }

    #[cfg(test)]
    pub(crate) fn points_mut(&mut self) -> &mut [RoutePoint] {
        &mut self.points
    }
}

/// Snap `coordinate` onto the polyline through `points`
///
/// With fewer than 2 points there is nothing to snap to: the input comes back
/// unchanged with segment index 0. Ties resolve to the first segment.
pub fn find_closest_point_on_route<P: Located>(coordinate: Coordinate, points: &[P]) -> ClosestPoint {
    let mut closest = ClosestPoint {
        coordinate,
        nearest_point_index: 0,
    };
    if points.len() < 2 {
        return closest;
    }

    let mut min_distance = f64::INFINITY;
    for (i, pair) in points.windows(2).enumerate() {
        let projection =
            geomath::project_onto_segment(coordinate, pair[0].coordinate(), pair[1].coordinate());
        let distance = geomath::distance_meters(coordinate, projection.point);
        if distance < min_distance {
            min_distance = distance;
            closest = ClosestPoint {
                coordinate: projection.point,
                nearest_point_index: i,
            };
        }
    }

    closest
}
