//! Named waypoints anchored to route segments
//!
//! A waypoint's `nearest_point_index` names the segment `[points[k], points[k + 1]]`
//! it sits on. Its `distance_from_start` (kilometers) is the route length up
//! to `points[k]` plus the distance from `points[k]` to the waypoint's
//! projection onto that segment. Because the anchor is an index, any change to
//! the route's points invalidates the cached distances, and
//! [`recalculate_all_distances`] must run after every route edit.

use crate::geomath::{self, Coordinate, Located};
use crate::route::{RoutePoint, find_closest_point_on_route};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_WAYPOINT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, never reused identifier of a waypoint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaypointId(u64);

impl WaypointId {
    /// Allocate a fresh identifier
    pub fn next() -> Self {
        Self(NEXT_WAYPOINT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for WaypointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wpt-{}", self.0)
    }
}

/// Marker category of a waypoint
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WaypointKind {
    #[default]
    Pin,
    Food,
    Rest,
    Scenic,
    Danger,
    Info,
}

impl WaypointKind {
    pub fn all() -> &'static [Self] {
        &[
            Self::Pin,
            Self::Food,
            Self::Rest,
            Self::Scenic,
            Self::Danger,
            Self::Info,
        ]
    }

    /// Lowercase name, as written to GPX `<type>`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pin => "pin",
            Self::Food => "food",
            Self::Rest => "rest",
            Self::Scenic => "scenic",
            Self::Danger => "danger",
            Self::Info => "info",
        }
    }

    /// Map a free-form GPX `<type>` value, falling back to [`WaypointKind::Pin`]
    pub fn from_gpx_type(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "food" | "restaurant" => Self::Food,
            "rest" | "rest area" => Self::Rest,
            "scenic" | "viewpoint" => Self::Scenic,
            "danger" | "warning" => Self::Danger,
            "info" | "information" => Self::Info,
            _ => Self::Pin,
        }
    }
}

impl fmt::Display for WaypointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named point of interest along the route
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waypoint {
    id: WaypointId,
    pub lat: f64,
    pub lng: f64,
    pub elevation: Option<f64>,
    pub name: String,
    pub description: Option<String>,
    pub kind: WaypointKind,
    /// Segment the waypoint is anchored to; `None` while detached
    pub nearest_point_index: Option<usize>,
    /// Along-route distance from the first point, in kilometers
    pub distance_from_start: f64,
}

impl Waypoint {
    #[inline]
    pub fn id(&self) -> WaypointId {
        self.id
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.nearest_point_index.is_some()
    }

    fn with_recomputed_distance(mut self, points: &[RoutePoint]) -> Self {
        self.distance_from_start =
            distance_from_start_km(self.coordinate(), self.nearest_point_index, points);
        self
    }
}

impl Located for Waypoint {
    #[inline]
    fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Waypoint data before an id and distance have been assigned
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewWaypoint {
    pub lat: f64,
    pub lng: f64,
    pub elevation: Option<f64>,
    pub name: String,
    pub description: Option<String>,
    pub kind: WaypointKind,
    pub nearest_point_index: Option<usize>,
}

impl NewWaypoint {
    pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            lat: coordinate.lat,
            lng: coordinate.lng,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn kind(mut self, kind: WaypointKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn anchored_at(mut self, nearest_point_index: usize) -> Self {
        self.nearest_point_index = Some(nearest_point_index);
        self
    }

    /// Build the waypoint with a fresh id and its along-route distance
    pub fn build(self, points: &[RoutePoint]) -> Waypoint {
        Waypoint {
            id: WaypointId::next(),
            lat: self.lat,
            lng: self.lng,
            elevation: self.elevation,
            name: self.name,
            description: self.description,
            kind: self.kind,
            nearest_point_index: self.nearest_point_index,
            distance_from_start: 0.0,
        }
        .with_recomputed_distance(points)
    }
}

/// Partial update for a waypoint; `None` leaves a field untouched
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaypointPatch {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// `Some(None)` clears the elevation
    pub elevation: Option<Option<f64>>,
    pub name: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub kind: Option<WaypointKind>,
    pub nearest_point_index: Option<usize>,
}

impl WaypointPatch {
    /// Patch that moves a waypoint to a snapped position on a segment
    pub fn anchor(coordinate: Coordinate, nearest_point_index: usize) -> Self {
        Self {
            lat: Some(coordinate.lat),
            lng: Some(coordinate.lng),
            nearest_point_index: Some(nearest_point_index),
            ..Default::default()
        }
    }

    /// Whether applying this patch can change the along-route distance
    pub fn changes_position(&self) -> bool {
        self.lat.is_some() || self.lng.is_some() || self.nearest_point_index.is_some()
    }

    fn apply(&self, waypoint: &mut Waypoint) {
        if let Some(lat) = self.lat {
            waypoint.lat = lat;
        }
        if let Some(lng) = self.lng {
            waypoint.lng = lng;
        }
        if let Some(elevation) = self.elevation {
            waypoint.elevation = elevation;
        }
        if let Some(name) = &self.name {
            waypoint.name = name.clone();
        }
        if let Some(description) = &self.description {
            waypoint.description = description.clone();
        }
        if let Some(kind) = self.kind {
            waypoint.kind = kind;
        }
        if let Some(index) = self.nearest_point_index {
            waypoint.nearest_point_index = Some(index);
        }
    }
}

/// Along-route distance in kilometers to a waypoint at `position` anchored on
/// segment `nearest_point_index`
///
/// Unanchored waypoints and routes with fewer than 2 points measure 0. An
/// index past the last segment (left behind by point deletions) counts the
/// whole route up to the final point.
pub fn distance_from_start_km(
    position: Coordinate,
    nearest_point_index: Option<usize>,
    points: &[RoutePoint],
) -> f64 {
    let Some(index) = nearest_point_index else {
        return 0.0;
    };
    if points.len() < 2 {
        return 0.0;
    }

    let last = points.len() - 1;
    let k = index.min(last);

    let complete = geomath::polyline_length(&points[..=k]);
    let partial = if k < last {
        let start = points[k].coordinate();
        let projection =
            geomath::project_onto_segment(position, start, points[k + 1].coordinate());
        geomath::distance_meters(start, projection.point)
    } else {
        0.0
    };

    (complete + partial) / 1000.0
}

/// Append a new waypoint, computing its initial distance
pub fn add_waypoint(waypoints: &[Waypoint], data: NewWaypoint, points: &[RoutePoint]) -> Vec<Waypoint> {
    let mut result = Vec::with_capacity(waypoints.len() + 1);
    result.extend_from_slice(waypoints);
    result.push(data.build(points));
    result
}

/// Merge `patch` into the waypoint with `id`
///
/// The distance is only recomputed when the patch touches the position or
/// the anchor. Unknown ids leave the list unchanged.
pub fn update_waypoint(
    waypoints: &[Waypoint],
    id: WaypointId,
    patch: &WaypointPatch,
    points: &[RoutePoint],
) -> Vec<Waypoint> {
    waypoints
        .iter()
        .map(|w| {
            if w.id != id {
                return w.clone();
            }
            let mut updated = w.clone();
            patch.apply(&mut updated);
            if patch.changes_position() {
                updated = updated.with_recomputed_distance(points);
            }
            updated
        })
        .collect()
}

/// Remove the waypoint with `id`, if present
pub fn delete_waypoint(waypoints: &[Waypoint], id: WaypointId) -> Vec<Waypoint> {
    waypoints.iter().filter(|w| w.id != id).cloned().collect()
}

/// Re-anchor a waypoint to another segment and recompute its distance
pub fn move_waypoint_on_route(
    waypoints: &[Waypoint],
    id: WaypointId,
    nearest_point_index: usize,
    points: &[RoutePoint],
) -> Vec<Waypoint> {
    let patch = WaypointPatch {
        nearest_point_index: Some(nearest_point_index),
        ..Default::default()
    };
    update_waypoint(waypoints, id, &patch, points)
}

/// Recompute every waypoint's distance against the current route points
pub fn recalculate_all_distances(waypoints: &[Waypoint], points: &[RoutePoint]) -> Vec<Waypoint> {
    waypoints
        .iter()
        .cloned()
        .map(|w| w.with_recomputed_distance(points))
        .collect()
}

/// Anchor detached waypoints to their closest segment once the route has a line
///
/// Attached waypoints are returned as they are, stale index included. With
/// fewer than 2 points nothing can be anchored and the list is unchanged.
pub fn attach_detached(waypoints: &[Waypoint], points: &[RoutePoint]) -> Vec<Waypoint> {
    if points.len() < 2 {
        return waypoints.to_vec();
    }

    waypoints
        .iter()
        .cloned()
        .map(|mut w| {
            if w.nearest_point_index.is_none() {
                let closest = find_closest_point_on_route(w.coordinate(), points);
                w.nearest_point_index = Some(closest.nearest_point_index);
                w = w.with_recomputed_distance(points);
            }
            w
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Route;

    fn tokyo_route() -> Route {
        Route::from_points([
            Coordinate::new(35.6762, 139.6503),
            Coordinate::new(35.6595, 139.7005),
            Coordinate::new(35.6311, 139.7394),
        ])
    }

    #[test]
    fn test_distance_at_final_point() {
        let route = tokyo_route();
        let d = distance_from_start_km(Coordinate::new(35.6311, 139.7394), Some(2), route.points());
        assert!((d - 9.63).abs() < 0.1, "expected ~9.63 km, got {}", d);
    }

    #[test]
    fn test_distance_unanchored_is_zero() {
        let route = tokyo_route();
        assert_eq!(
            distance_from_start_km(Coordinate::new(35.66, 139.70), None, route.points()),
            0.0
        );
    }

    #[test]
    fn test_distance_short_route_is_zero() {
        let route = Route::new().add_point(Coordinate::new(35.0, 139.0));
        assert_eq!(
            distance_from_start_km(Coordinate::new(35.0, 139.0), Some(0), route.points()),
            0.0
        );
    }

    #[test]
    fn test_distance_partial_on_first_segment() {
        let route = tokyo_route();
        let midpoint = route.closest_point(Coordinate::new(35.668, 139.675)).coordinate;
        let d = distance_from_start_km(midpoint, Some(0), route.points());

        let first_segment_km = geomath::distance_meters(
            route.points()[0].coordinate(),
            route.points()[1].coordinate(),
        ) / 1000.0;
        assert!(d > 0.0 && d < first_segment_km);
    }

    #[test]
    fn test_distance_matches_vertex_either_side() {
        // A waypoint on the middle vertex measures the same from either segment
        let route = tokyo_route();
        let vertex = route.points()[1].coordinate();
        let end_of_first = distance_from_start_km(vertex, Some(0), route.points());
        let start_of_second = distance_from_start_km(vertex, Some(1), route.points());
        assert!((end_of_first - start_of_second).abs() < 1e-6);
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(WaypointKind::from_gpx_type("Restaurant"), WaypointKind::Food);
        assert_eq!(WaypointKind::from_gpx_type("rest area"), WaypointKind::Rest);
        assert_eq!(WaypointKind::from_gpx_type("viewpoint"), WaypointKind::Scenic);
        assert_eq!(WaypointKind::from_gpx_type("WARNING"), WaypointKind::Danger);
        assert_eq!(WaypointKind::from_gpx_type("information"), WaypointKind::Info);
        assert_eq!(WaypointKind::from_gpx_type("campsite"), WaypointKind::Pin);
        for kind in WaypointKind::all() {
            assert_eq!(WaypointKind::from_gpx_type(kind.as_str()), *kind);
        }
    }

    #[test]
    fn test_add_waypoint_assigns_id_and_distance() {
        let route = tokyo_route();
        let data = NewWaypoint::new("Shibuya", Coordinate::new(35.6595, 139.7005))
            .kind(WaypointKind::Food)
            .anchored_at(1);
        let waypoints = add_waypoint(&[], data, route.points());

        assert_eq!(waypoints.len(), 1);
        assert_eq!(waypoints[0].name, "Shibuya");
        assert_eq!(waypoints[0].kind, WaypointKind::Food);
        assert!(waypoints[0].distance_from_start > 4.0);
    }

    #[test]
    fn test_update_name_keeps_distance() {
        let route = tokyo_route();
        let waypoints = add_waypoint(
            &[],
            NewWaypoint::new("A", Coordinate::new(35.6311, 139.7394)).anchored_at(2),
            route.points(),
        );
        let id = waypoints[0].id();

        // Distances only refresh on positional changes, so a stale route is ignored here
        let shorter = Route::from_points([Coordinate::new(35.6762, 139.6503)]);
        let patch = WaypointPatch {
            name: Some("Renamed".into()),
            description: Some(Some("desc".into())),
            ..Default::default()
        };
        let updated = update_waypoint(&waypoints, id, &patch, shorter.points());

        assert_eq!(updated[0].name, "Renamed");
        assert_eq!(updated[0].description.as_deref(), Some("desc"));
        assert_eq!(updated[0].distance_from_start, waypoints[0].distance_from_start);
    }

    #[test]
    fn test_update_position_recomputes_distance() {
        let route = tokyo_route();
        let waypoints = add_waypoint(
            &[],
            NewWaypoint::new("A", Coordinate::new(35.6762, 139.6503)).anchored_at(0),
            route.points(),
        );
        assert!(waypoints[0].distance_from_start.abs() < 1e-9);

        let target = route.points()[2].coordinate();
        let updated = update_waypoint(
            &waypoints,
            waypoints[0].id(),
            &WaypointPatch::anchor(target, 2),
            route.points(),
        );
        assert!((updated[0].distance_from_start - 9.63).abs() < 0.1);
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let route = tokyo_route();
        let waypoints = add_waypoint(
            &[],
            NewWaypoint::new("A", Coordinate::new(35.6762, 139.6503)).anchored_at(0),
            route.points(),
        );
        let patch = WaypointPatch {
            name: Some("B".into()),
            ..Default::default()
        };
        assert_eq!(update_waypoint(&waypoints, WaypointId::next(), &patch, route.points()), waypoints);
    }

    #[test]
    fn test_delete_waypoint() {
        let route = tokyo_route();
        let mut waypoints = add_waypoint(&[], NewWaypoint::new("A", Coordinate::default()), route.points());
        waypoints = add_waypoint(&waypoints, NewWaypoint::new("B", Coordinate::default()), route.points());
        let first = waypoints[0].id();

        let remaining = delete_waypoint(&waypoints, first);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "B");

        assert_eq!(delete_waypoint(&remaining, first), remaining);
    }

    #[test]
    fn test_move_waypoint_on_route() {
        let route = tokyo_route();
        let position = route.points()[1].coordinate();
        let waypoints = add_waypoint(
            &[],
            NewWaypoint::new("A", position).anchored_at(1),
            route.points(),
        );
        let moved = move_waypoint_on_route(&waypoints, waypoints[0].id(), 0, route.points());

        assert_eq!(moved[0].nearest_point_index, Some(0));
        // Same vertex seen from the previous segment
        assert!((moved[0].distance_from_start - waypoints[0].distance_from_start).abs() < 1e-6);
    }

    #[test]
    fn test_recalculate_after_insert_before_anchor() {
        let route = tokyo_route();
        let waypoints = add_waypoint(
            &[],
            NewWaypoint::new("End", Coordinate::new(35.6311, 139.7394)).anchored_at(2),
            route.points(),
        );

        // A detour on the first segment lengthens the path to the waypoint
        let detour = route.insert_point(1, Coordinate::new(35.70, 139.68));
        let refreshed = recalculate_all_distances(&waypoints, detour.points());

        assert!(refreshed[0].distance_from_start > waypoints[0].distance_from_start);
        let expected = distance_from_start_km(
            refreshed[0].coordinate(),
            refreshed[0].nearest_point_index,
            detour.points(),
        );
        assert_eq!(refreshed[0].distance_from_start, expected);
    }

    #[test]
    fn test_attach_detached() {
        let single = Route::from_points([Coordinate::new(35.6762, 139.6503)]);
        let waypoints = add_waypoint(
            &[],
            NewWaypoint::new("Loose", Coordinate::new(35.64, 139.73)),
            single.points(),
        );
        let pinned = add_waypoint(
            &waypoints,
            NewWaypoint::new("Pinned", Coordinate::new(35.6762, 139.6503)).anchored_at(0),
            single.points(),
        );

        // Nothing to anchor to yet
        assert_eq!(attach_detached(&pinned, single.points()), pinned);

        let route = tokyo_route();
        let attached = attach_detached(&pinned, route.points());
        assert_eq!(attached[0].nearest_point_index, Some(1));
        assert!(attached[0].distance_from_start > 4.0);
        assert_eq!(attached[0].lat, 35.64);
        assert_eq!(attached[1].nearest_point_index, Some(0));
    }

    #[test]
    fn test_stale_index_past_end_is_clamped() {
        let route = tokyo_route();
        let d = distance_from_start_km(Coordinate::new(35.6311, 139.7394), Some(40), route.points());
        assert!((d - route.distance() / 1000.0).abs() < 1e-9);
    }
}
