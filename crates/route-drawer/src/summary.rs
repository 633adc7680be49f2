use route_drawer_lib::markers::format_distance;
use route_drawer_lib::{DistanceMarker, RouteEditor, WaypointKind};
use serde::Serialize;
use std::fmt;

/// Waypoint as listed in a summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaypointSummary {
    pub name: String,
    pub kind: WaypointKind,
    pub distance_from_start_km: f64,
}

/// Overview of the loaded route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub points: usize,
    pub distance_km: f64,
    /// Ordered by distance from the start
    pub waypoints: Vec<WaypointSummary>,
    pub markers: Vec<DistanceMarker>,
}

impl RouteSummary {
    pub fn from_editor(editor: &RouteEditor) -> Self {
        let mut waypoints: Vec<WaypointSummary> = editor
            .waypoints()
            .iter()
            .map(|w| WaypointSummary {
                name: w.name.clone(),
                kind: w.kind,
                distance_from_start_km: w.distance_from_start,
            })
            .collect();
        waypoints.sort_by(|a, b| a.distance_from_start_km.total_cmp(&b.distance_from_start_km));

        Self {
            points: editor.route().len(),
            distance_km: editor.route().distance() / 1000.0,
            waypoints,
            markers: editor.distance_markers(),
        }
    }
}

impl fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Points:    {}", self.points)?;
        writeln!(f, "Distance:  {:.2} km", self.distance_km)?;
        writeln!(f, "Markers:   {}", self.markers.len())?;
        writeln!(f, "Waypoints: {}", self.waypoints.len())?;
        for w in &self.waypoints {
            writeln!(
                f,
                "  {:>8} km  [{}] {}",
                format!("{:.2}", w.distance_from_start_km),
                w.kind,
                w.name
            )?;
        }
        if let Some(last) = self.markers.last() {
            writeln!(f, "Last marker at {} km", format_distance(last.distance_km))?;
        }
        Ok(())
    }
}
