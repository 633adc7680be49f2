//! Route Drawer Library - Core State for Interactive Route Drawing
//!
//! This library holds everything behind an interactive route-drawing map tool
//! except the map widget itself: the ordered polyline being drawn, the named
//! waypoints attached along it, and a linear undo/redo log over both.
//!
//! # Architecture
//!
//! - **[`geomath`]**: Spherical distance, point-to-segment projection, polyline length
//! - **[`Route`]**: Ordered route points with a derived total length
//! - **[`waypoint`]**: Waypoints anchored to route segments with along-route distances
//! - **[`History`]**: Branch-discarding undo/redo log of [`EditorState`] snapshots
//! - **[`RouteEditor`]**: The single write surface; keeps route, waypoints and history consistent
//! - **[`gpx_io`]**: GPX text import/export
//! - **[`screen`]**: Pixel-space hit testing against a [`ScreenProjector`]
//! - **[`markers`]**: Evenly spaced distance markers along the route
//!
//! # Example
//!
//! ```
//! use route_drawer_lib::{Coordinate, EditorConfig, RouteEditor};
//!
//! let mut editor = RouteEditor::new(EditorConfig::default());
//! editor.add_point(Coordinate::new(35.0, 139.0));
//! editor.add_point(Coordinate::new(35.01, 139.01));
//! assert_eq!(editor.route().len(), 2);
//!
//! editor.undo();
//! assert_eq!(editor.route().len(), 1);
//! assert!(editor.can_redo());
//! ```

mod editor;
pub mod geomath;
pub mod gpx_io;
mod history;
pub mod markers;
mod route;
pub mod screen;
pub mod utils;
pub mod waypoint;

// Public API exports
pub use editor::{EditorConfig, RouteEditor};
pub use geomath::{Coordinate, Located};
pub use history::{EditorState, History};
pub use markers::{DistanceMarker, MarkerInterval};
pub use route::{ClosestPoint, NewPoint, PointId, PointPatch, Route, RoutePoint, find_closest_point_on_route};
pub use screen::{ScreenPoint, ScreenProjector, WebMercatorProjector};
pub use waypoint::{NewWaypoint, Waypoint, WaypointId, WaypointKind, WaypointPatch};

/// Error types for the route drawing core
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Exported GPX is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Empty route")]
    EmptyRoute,
}

pub type Result<T> = std::result::Result<T, RouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that all public types are accessible
        let _: fn(EditorConfig) -> RouteEditor = RouteEditor::new;
        let _: fn() -> EditorConfig = EditorConfig::default;
        let _: fn() -> History = History::new;
    }

    #[test]
    fn test_error_display() {
        assert_eq!(RouteError::EmptyRoute.to_string(), "Empty route");
    }
}
