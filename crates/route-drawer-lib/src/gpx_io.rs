//! GPX import and export
//!
//! Import collects track points (`trkpt`) followed by route points (`rtept`)
//! into a single drawing order and turns `wpt` elements into waypoints.
//! Export writes one track with one segment plus the waypoints. Ids are not
//! part of the format and are regenerated on import.

use crate::route::{NewPoint, Route};
use crate::waypoint::{NewWaypoint, Waypoint, WaypointKind};
use crate::{Result, RouteError};
use geo::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment};
use std::io::BufReader;
use std::path::Path;

/// Waypoint name used when a `wpt` has none
pub const DEFAULT_WAYPOINT_NAME: &str = "Waypoint";

/// Parsed GPX content, not yet attached to any editor state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GpxDocument {
    pub route_points: Vec<NewPoint>,
    pub waypoints: Vec<NewWaypoint>,
}

impl GpxDocument {
    fn from_gpx(gpx: Gpx) -> Self {
        let track_points = gpx
            .tracks
            .iter()
            .flat_map(|t| t.segments.iter())
            .flat_map(|s| s.points.iter());
        let route_points = gpx.routes.iter().flat_map(|r| r.points.iter());

        let route_points = track_points
            .chain(route_points)
            .filter_map(|p| {
                let point = p.point();
                if !point.x().is_finite() || !point.y().is_finite() {
                    tracing::warn!("Skipping GPX point with invalid coordinates");
                    return None;
                }
                Some(NewPoint {
                    lat: point.y(),
                    lng: point.x(),
                    elevation: p.elevation,
                })
            })
            .collect();

        let waypoints = gpx
            .waypoints
            .iter()
            .map(|w| {
                let point = w.point();
                NewWaypoint {
                    lat: point.y(),
                    lng: point.x(),
                    elevation: w.elevation,
                    name: w
                        .name
                        .clone()
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(|| DEFAULT_WAYPOINT_NAME.to_string()),
                    description: w.description.clone().filter(|d| !d.is_empty()),
                    kind: w
                        .type_
                        .as_deref()
                        .map(WaypointKind::from_gpx_type)
                        .unwrap_or_default(),
                    nearest_point_index: None,
                }
            })
            .collect();

        Self {
            route_points,
            waypoints,
        }
    }
}

/// Options for [`to_gpx_string`]
#[derive(Clone, Debug, PartialEq)]
pub struct ExportOptions {
    pub creator: String,
    pub track_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            creator: "GPX Route Creator".to_string(),
            track_name: "Route".to_string(),
        }
    }
}

/// Parse GPX text; malformed XML is rejected as a whole
pub fn parse_gpx(text: &str) -> Result<GpxDocument> {
    #[cfg(feature = "profiling")]
    profiling::scope!("gpx_io::parse_gpx");

    let gpx = gpx::read(text.as_bytes())?;
    let document = GpxDocument::from_gpx(gpx);
    tracing::info!(
        "Parsed GPX: {} route points, {} waypoints",
        document.route_points.len(),
        document.waypoints.len()
    );
    Ok(document)
}

/// Read and parse a GPX file
pub fn parse_gpx_file(path: impl AsRef<Path>) -> Result<GpxDocument> {
    let file = std::fs::File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    Ok(GpxDocument::from_gpx(gpx::read(reader)?))
}

fn to_gpx_waypoint(lat: f64, lng: f64, elevation: Option<f64>) -> gpx::Waypoint {
    let mut waypoint = gpx::Waypoint::new(Point::new(lng, lat));
    waypoint.elevation = elevation;
    waypoint
}

/// Serialize a route and its waypoints as GPX 1.1
///
/// Text content is escaped by the XML writer. An empty route has nothing to
/// export and is rejected with [`RouteError::EmptyRoute`].
pub fn to_gpx_string(route: &Route, waypoints: &[Waypoint], options: &ExportOptions) -> Result<String> {
    #[cfg(feature = "profiling")]
    profiling::scope!("gpx_io::to_gpx_string");

    if route.is_empty() {
        return Err(RouteError::EmptyRoute);
    }

    let mut segment = TrackSegment::new();
    segment.points = route
        .points()
        .iter()
        .map(|p| to_gpx_waypoint(p.lat, p.lng, p.elevation))
        .collect();

    let mut track = Track::new();
    track.name = Some(options.track_name.clone());
    track.segments.push(segment);

    let gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(options.creator.clone()),
        waypoints: waypoints
            .iter()
            .map(|w| {
                let mut waypoint = to_gpx_waypoint(w.lat, w.lng, w.elevation);
                waypoint.name = Some(w.name.clone());
                waypoint.description = w.description.clone();
                waypoint.type_ = Some(w.kind.as_str().to_string());
                waypoint
            })
            .collect(),
        tracks: vec![track],
        ..Default::default()
    };

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer)?;
    tracing::info!(
        "Exported GPX: {} route points, {} waypoints",
        route.len(),
        waypoints.len()
    );
    Ok(String::from_utf8(buffer)?)
}
