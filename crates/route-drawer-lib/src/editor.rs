//! The single write surface over route, waypoints and history
//!
//! Every mutating call computes the new route and/or waypoint list, refreshes
//! waypoint distances when the route's points changed, then records one
//! history entry for the combined state. Calls that change nothing record
//! nothing. Dragging is the exception: intermediate frames update the live
//! state only, and the entry is recorded once when the drag ends.

use crate::geomath::Coordinate;
use crate::gpx_io::{self, ExportOptions, GpxDocument};
use crate::history::{EditorState, History};
use crate::markers::{self, DistanceMarker, MarkerInterval};
use crate::route::{NewPoint, PointId, PointPatch, Route, find_closest_point_on_route};
use crate::screen::{self, ScreenPoint, ScreenProjector};
use crate::waypoint::{self, NewWaypoint, Waypoint, WaypointId, WaypointPatch};
use crate::Result;
use std::collections::HashSet;

/// Editor tunables
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EditorConfig {
    /// Click radius around a waypoint marker, in pixels
    pub waypoint_hit_radius_px: f64,
    /// Click radius around the drawn route line, in pixels
    pub line_hit_radius_px: f64,
    pub marker_interval: MarkerInterval,
    /// `creator` attribute written on export
    pub gpx_creator: String,
    /// Track name written on export
    pub track_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let export = ExportOptions::default();
        Self {
            waypoint_hit_radius_px: 20.0,
            // Line width 4 px, with some slack
            line_hit_radius_px: 6.0,
            marker_interval: MarkerInterval::default(),
            gpx_creator: export.creator,
            track_name: export.track_name,
        }
    }
}

impl EditorConfig {
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            creator: self.gpx_creator.clone(),
            track_name: self.track_name.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum DragTarget {
    Point(PointId),
    Waypoint(WaypointId),
}

#[derive(Clone, Copy, Debug)]
struct DragSession {
    target: DragTarget,
    moved: bool,
}

/// Owns the live state and its undo log
#[derive(Debug)]
pub struct RouteEditor {
    state: EditorState,
    history: History,
    config: EditorConfig,
    drag: Option<DragSession>,
}

impl Default for RouteEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RouteEditor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            state: EditorState::empty(),
            history: History::new(),
            config,
            drag: None,
        }
    }

    #[inline]
    pub fn route(&self) -> &Route {
        &self.state.route
    }

    #[inline]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.state.waypoints
    }

    #[inline]
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    #[inline]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[inline]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EditorConfig {
        &mut self.config
    }

    /// False while dragging, since undo is ignored then
    pub fn can_undo(&self) -> bool {
        self.drag.is_none() && self.history.can_undo()
    }

    /// False while dragging, since redo is ignored then
    pub fn can_redo(&self) -> bool {
        self.drag.is_none() && self.history.can_redo()
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn record(&mut self) {
        self.history.record(self.state.clone());
        tracing::debug!(
            "Committed history entry {} ({} points, {} waypoints)",
            self.history.cursor(),
            self.state.route.len(),
            self.state.waypoints.len()
        );
    }

    /// Any edit made mid-drag releases the drag first, recording it on its own
    fn release_drag(&mut self) {
        if self.drag.is_some() {
            tracing::debug!("Edit during drag, ending the drag first");
            self.end_drag();
        }
    }

    /// Replace the route, refresh every waypoint against it, and record
    fn commit_route(&mut self, route: Route) -> bool {
        self.release_drag();
        if route == self.state.route {
            return false;
        }
        let waypoints = waypoint::attach_detached(&self.state.waypoints, route.points());
        self.state.waypoints = waypoint::recalculate_all_distances(&waypoints, route.points());
        self.state.route = route;
        self.record();
        true
    }

    /// Replace the waypoints and record
    fn commit_waypoints(&mut self, waypoints: Vec<Waypoint>) -> bool {
        self.release_drag();
        let waypoints = waypoint::attach_detached(&waypoints, self.state.route.points());
        if waypoints == self.state.waypoints {
            return false;
        }
        self.state.waypoints = waypoints;
        self.record();
        true
    }

    // Route points

    /// Append a point at the end of the route
    pub fn add_point(&mut self, point: impl Into<NewPoint>) -> PointId {
        let route = self.state.route.add_point(point);
        let id = route.points()[route.len() - 1].id();
        self.commit_route(route);
        id
    }

    /// Insert a point at `index` (`0..=len`)
    pub fn insert_point(&mut self, index: usize, point: impl Into<NewPoint>) -> PointId {
        let route = self.state.route.insert_point(index, point);
        let id = route.points()[index.min(route.len() - 1)].id();
        self.commit_route(route);
        id
    }

    /// Click on the route line: insert into the closest segment, or append
    /// while the route has no segments yet
    pub fn insert_point_on_line(&mut self, coordinate: Coordinate) -> PointId {
        if self.state.route.len() < 2 {
            return self.add_point(coordinate);
        }
        let index = self.state.route.find_closest_segment_index(coordinate);
        self.insert_point(index, coordinate)
    }

    pub fn update_point(&mut self, id: PointId, patch: &PointPatch) -> bool {
        let route = self.state.route.update_point(id, patch);
        self.commit_route(route)
    }

    /// Move a point as a single edit (not a drag)
    pub fn move_point(&mut self, id: PointId, coordinate: Coordinate) -> bool {
        let route = self.state.route.move_point(id, coordinate);
        self.commit_route(route)
    }

    pub fn delete_point(&mut self, id: PointId) -> bool {
        let route = self.state.route.delete_point(id);
        self.commit_route(route)
    }

    /// Delete several points as one edit
    pub fn delete_points(&mut self, ids: impl IntoIterator<Item = PointId>) -> bool {
        let ids: HashSet<PointId> = ids.into_iter().collect();
        if ids.is_empty() {
            return false;
        }
        let route = self.state.route.delete_multiple_points(&ids);
        self.commit_route(route)
    }

    /// Range deletion; returns how many points were removed
    pub fn delete_points_in_screen_rect(
        &mut self,
        corner_a: ScreenPoint,
        corner_b: ScreenPoint,
        projector: &impl ScreenProjector,
    ) -> usize {
        let selected = screen::points_in_screen_rect(self.state.route.points(), corner_a, corner_b, projector);
        let count = selected.len();
        if count > 0 {
            self.delete_points(selected);
        }
        count
    }

    // Waypoints

    /// Add a waypoint as given; it is anchored automatically if the route has
    /// a line and no anchor was supplied
    ///
    /// A blank name is replaced with [`gpx_io::DEFAULT_WAYPOINT_NAME`].
    pub fn add_waypoint(&mut self, data: NewWaypoint) -> WaypointId {
        let mut data = data;
        if data.name.trim().is_empty() {
            data.name = gpx_io::DEFAULT_WAYPOINT_NAME.to_string();
        }
        let waypoints = waypoint::add_waypoint(&self.state.waypoints, data, self.state.route.points());
        let id = waypoints[waypoints.len() - 1].id();
        self.commit_waypoints(waypoints);
        id
    }

    /// Add a waypoint at a clicked position, snapped onto the route line
    pub fn place_waypoint(&mut self, click: Coordinate, data: NewWaypoint) -> WaypointId {
        let mut data = data;
        let points = self.state.route.points();
        if points.len() >= 2 {
            let closest = find_closest_point_on_route(click, points);
            data.lat = closest.coordinate.lat;
            data.lng = closest.coordinate.lng;
            data.nearest_point_index = Some(closest.nearest_point_index);
        } else {
            data.lat = click.lat;
            data.lng = click.lng;
            data.nearest_point_index = None;
        }
        self.add_waypoint(data)
    }

    /// Merge `patch` into a waypoint; a patch that blanks the name is rejected
    pub fn update_waypoint(&mut self, id: WaypointId, patch: &WaypointPatch) -> bool {
        if patch.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            tracing::warn!("Ignoring update of waypoint {} to a blank name", id);
            return false;
        }
        let waypoints = waypoint::update_waypoint(&self.state.waypoints, id, patch, self.state.route.points());
        self.commit_waypoints(waypoints)
    }

    fn snapped_patch(&self, coordinate: Coordinate) -> WaypointPatch {
        let points = self.state.route.points();
        if points.len() < 2 {
            return WaypointPatch {
                lat: Some(coordinate.lat),
                lng: Some(coordinate.lng),
                ..Default::default()
            };
        }
        let closest = find_closest_point_on_route(coordinate, points);
        WaypointPatch::anchor(closest.coordinate, closest.nearest_point_index)
    }

    /// Move a waypoint to the route position closest to `coordinate`
    pub fn move_waypoint(&mut self, id: WaypointId, coordinate: Coordinate) -> bool {
        let patch = self.snapped_patch(coordinate);
        self.update_waypoint(id, &patch)
    }

    /// Re-anchor a waypoint to segment `nearest_point_index`
    pub fn move_waypoint_on_route(&mut self, id: WaypointId, nearest_point_index: usize) -> bool {
        let waypoints = waypoint::move_waypoint_on_route(
            &self.state.waypoints,
            id,
            nearest_point_index,
            self.state.route.points(),
        );
        self.commit_waypoints(waypoints)
    }

    pub fn delete_waypoint(&mut self, id: WaypointId) -> bool {
        let waypoints = waypoint::delete_waypoint(&self.state.waypoints, id);
        self.commit_waypoints(waypoints)
    }

    // Dragging

    fn begin_drag(&mut self, target: DragTarget) {
        if self.drag.is_some() {
            tracing::warn!("Drag started while another was active, ending it first");
            self.end_drag();
        }
        tracing::debug!("Begin drag of {:?}", target);
        self.drag = Some(DragSession { target, moved: false });
    }

    /// Start dragging a route point; false if the point does not exist
    pub fn begin_point_drag(&mut self, id: PointId) -> bool {
        if self.state.route.get(id).is_none() {
            return false;
        }
        self.begin_drag(DragTarget::Point(id));
        true
    }

    /// Start dragging a waypoint; false if the waypoint does not exist
    pub fn begin_waypoint_drag(&mut self, id: WaypointId) -> bool {
        if !self.state.waypoints.iter().any(|w| w.id() == id) {
            return false;
        }
        self.begin_drag(DragTarget::Waypoint(id));
        true
    }

    /// Apply one drag frame to the live state without recording history
    pub fn drag_to(&mut self, coordinate: Coordinate) -> bool {
        #[cfg(feature = "profiling")]
        profiling::scope!("RouteEditor::drag_to");

        let Some(session) = self.drag.as_mut() else {
            return false;
        };
        session.moved = true;
        let target = session.target;

        match target {
            DragTarget::Point(id) => {
                let route = self.state.route.move_point(id, coordinate);
                self.state.waypoints = waypoint::recalculate_all_distances(&self.state.waypoints, route.points());
                self.state.route = route;
            }
            DragTarget::Waypoint(id) => {
                let patch = self.snapped_patch(coordinate);
                self.state.waypoints =
                    waypoint::update_waypoint(&self.state.waypoints, id, &patch, self.state.route.points());
            }
        }
        true
    }

    /// Finish the drag, recording one entry if anything moved
    ///
    /// Returns false, and changes nothing, when no drag is active.
    pub fn end_drag(&mut self) -> bool {
        let Some(session) = self.drag.take() else {
            tracing::warn!("Ignoring drag end without an active drag");
            return false;
        };
        tracing::debug!("End drag of {:?}", session.target);
        if session.moved && self.state != *self.history.current() {
            self.record();
        }
        true
    }

    // History

    /// Step back one entry; ignored while dragging
    pub fn undo(&mut self) -> bool {
        if self.drag.is_some() {
            tracing::debug!("Ignoring undo during drag");
            return false;
        }
        match self.history.undo() {
            Some(state) => {
                self.state = state.clone();
                tracing::debug!("Undo to history entry {}", self.history.cursor());
                true
            }
            None => false,
        }
    }

    /// Step forward one entry; ignored while dragging
    pub fn redo(&mut self) -> bool {
        if self.drag.is_some() {
            tracing::debug!("Ignoring redo during drag");
            return false;
        }
        match self.history.redo() {
            Some(state) => {
                self.state = state.clone();
                tracing::debug!("Redo to history entry {}", self.history.cursor());
                true
            }
            None => false,
        }
    }

    /// Empty the route and waypoints and reset history; cannot be undone
    pub fn clear_route(&mut self) {
        self.state = EditorState::empty();
        self.history.reset();
        self.drag = None;
        tracing::debug!("Cleared route and history");
    }

    // Interchange

    /// Replace everything with the content of a GPX file
    ///
    /// On a parse error the current state and history are left untouched.
    pub fn import_gpx(&mut self, text: &str) -> Result<()> {
        let document = gpx_io::parse_gpx(text)?;
        self.load_document(document);
        Ok(())
    }

    /// Replace everything with already parsed GPX content as one history entry
    pub fn load_document(&mut self, document: GpxDocument) {
        let route = Route::from_points(document.route_points);
        let mut waypoints = Vec::with_capacity(document.waypoints.len());
        for data in document.waypoints {
            waypoints = waypoint::add_waypoint(&waypoints, data, route.points());
        }
        let waypoints = waypoint::attach_detached(&waypoints, route.points());

        self.clear_route();
        self.state = EditorState { route, waypoints };
        self.record();
        tracing::info!(
            "Loaded route with {} points and {} waypoints ({:.2} km)",
            self.state.route.len(),
            self.state.waypoints.len(),
            self.state.route.distance() / 1000.0
        );
    }

    /// Current state as GPX 1.1 text
    pub fn export_gpx(&self) -> Result<String> {
        gpx_io::to_gpx_string(&self.state.route, &self.state.waypoints, &self.config.export_options())
    }

    /// Distance markers for the configured interval
    pub fn distance_markers(&self) -> Vec<DistanceMarker> {
        self.config
            .marker_interval
            .resolve_km()
            .map(|km| markers::generate_distance_markers(self.state.route.points(), km))
            .unwrap_or_default()
    }

    // Hit testing

    pub fn is_near_existing_waypoint(&self, click: ScreenPoint, projector: &impl ScreenProjector) -> bool {
        screen::is_near_existing_waypoint(
            click,
            &self.state.waypoints,
            projector,
            self.config.waypoint_hit_radius_px,
        )
    }

    pub fn is_near_route_line(&self, click: ScreenPoint, projector: &impl ScreenProjector) -> bool {
        screen::is_near_route_line(click, self.state.route.points(), projector, self.config.line_hit_radius_px)
    }
}
