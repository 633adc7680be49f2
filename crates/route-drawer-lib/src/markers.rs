//! Distance markers placed at fixed intervals along the route

use crate::geomath::{self, Coordinate, Located};

/// Marker spacing setting
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkerInterval {
    /// Let the tool pick the spacing
    #[default]
    Auto,
    /// No markers
    Off,
    /// Fixed spacing in kilometers
    Km(f64),
}

impl MarkerInterval {
    /// Spacing used for [`MarkerInterval::Auto`]
    pub const AUTO_KM: f64 = 1.0;

    /// Smallest spacing accepted when parsing
    pub const MIN_KM: f64 = 0.01;

    /// Preset choices offered to the user
    pub fn presets() -> &'static [Self] {
        &[
            Self::Auto,
            Self::Off,
            Self::Km(1.0),
            Self::Km(5.0),
            Self::Km(10.0),
            Self::Km(20.0),
            Self::Km(50.0),
        ]
    }

    /// Spacing in kilometers, or `None` when markers are off
    pub fn resolve_km(&self) -> Option<f64> {
        match self {
            Self::Auto => Some(Self::AUTO_KM),
            Self::Off => None,
            Self::Km(km) => Some(*km),
        }
    }
}

impl std::str::FromStr for MarkerInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "off" => Ok(Self::Off),
            other => other
                .trim_end_matches("km")
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|km| km.is_finite() && *km >= Self::MIN_KM)
                .map(Self::Km)
                .ok_or_else(|| format!("invalid marker interval '{}'", s)),
        }
    }
}

/// A marker on the route at a round distance from the start
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceMarker {
    pub lat: f64,
    pub lng: f64,
    /// Distance from the start in kilometers
    pub distance_km: f64,
}

impl Located for DistanceMarker {
    fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Upper bound on the markers generated for one route
pub const MAX_MARKERS: usize = 10_000;

/// Markers at every multiple of `interval_km` strictly before the route's end
///
/// Spacings that would exceed [`MAX_MARKERS`] on this route produce none.
pub fn generate_distance_markers<P: Located>(points: &[P], interval_km: f64) -> Vec<DistanceMarker> {
    if points.len() < 2 || interval_km <= 0.0 || !interval_km.is_finite() {
        return Vec::new();
    }

    let interval_m = interval_km * 1000.0;
    let expected = geomath::polyline_length(points) / interval_m;
    if expected > MAX_MARKERS as f64 {
        tracing::warn!(
            "Marker interval {} km would place ~{:.0} markers, skipping",
            interval_km,
            expected
        );
        return Vec::new();
    }

    let mut markers = Vec::with_capacity(expected as usize);
    let mut step = 1usize;
    let mut segment_start_m = 0.0;

    for pair in points.windows(2) {
        let (a, b) = (pair[0].coordinate(), pair[1].coordinate());
        let segment_m = geomath::distance_meters(a, b);
        let segment_end_m = segment_start_m + segment_m;

        loop {
            let target_m = step as f64 * interval_m;
            if target_m >= segment_end_m {
                break;
            }
            let fraction = (target_m - segment_start_m) / segment_m;
            let position = geomath::intermediate_point(a, b, fraction);
            markers.push(DistanceMarker {
                lat: position.lat,
                lng: position.lng,
                distance_km: step as f64 * interval_km,
            });
            step += 1;
        }

        segment_start_m = segment_end_m;
    }

    markers
}

/// Keep markers inside a latitude/longitude box (edges included)
pub fn filter_markers_in_bounds(
    markers: &[DistanceMarker],
    south: f64,
    west: f64,
    north: f64,
    east: f64,
) -> Vec<DistanceMarker> {
    markers
        .iter()
        .filter(|m| m.lat >= south && m.lat <= north && m.lng >= west && m.lng <= east)
        .copied()
        .collect()
}

/// Marker label: as-is below 10 km, rounded to a whole number above
pub fn format_distance(distance_km: f64) -> String {
    if distance_km < 10.0 {
        format!("{}", distance_km)
    } else {
        format!("{}", distance_km.round())
    }
}
