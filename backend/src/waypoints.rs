use std::time::Duration;

use crate::{
    error::RouteError,
    geometry::{euclidean, interpolate},
    models::GeoPoint,
    provider::RoadSnapper,
};

/// Offset magnitudes as fractions of the origin-destination distance, one
/// snapping round each.
pub const DEFAULT_OFFSET_FRACTIONS: [f64; 2] = [0.1, 0.2];

/// Offset points produced per round: two anchors, two perpendicular sides.
pub const POINTS_PER_ROUND: usize = 4;

/// Below this many degrees an axis delta counts as zero.
const AXIS_EPSILON: f64 = 1e-9;

/// Direction of the perpendicular offset, expressed per unit of `d`.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Perpendicular {
    /// `(perp_slope * d, d)` for a line at least as steep as it is wide.
    Slope(f64),
    /// Flatter lines: the same direction scaled so the latitude step is `d`.
    /// Holds `(sign of perp_slope, 1 / |perp_slope|)`.
    Steep { lat_sign: f64, lng_ratio: f64 },
    /// Origin and destination share a longitude: offset along longitude only.
    Vertical,
    /// Origin and destination share a latitude: offset along latitude only.
    Horizontal,
}

impl Perpendicular {
    fn between(origin: GeoPoint, destination: GeoPoint) -> Self {
        let dlat = origin.lat - destination.lat;
        let dlng = origin.lng - destination.lng;
        if dlng.abs() < AXIS_EPSILON {
            Self::Vertical
        } else if dlat.abs() < AXIS_EPSILON {
            Self::Horizontal
        } else if dlng.abs() <= dlat.abs() {
            let slope = dlat / dlng;
            Self::Slope(-1.0 / slope)
        } else {
            // perp_slope = -dlng / dlat, so |perp_slope| > 1 here
            Self::Steep {
                lat_sign: -(dlng.signum() * dlat.signum()),
                lng_ratio: (dlat / dlng).abs(),
            }
        }
    }

    /// `(Δlat, Δlng)` to add or subtract from an anchor.
    fn offset(self, d: f64) -> (f64, f64) {
        match self {
            Self::Slope(perp_slope) => (perp_slope * d, d),
            Self::Steep {
                lat_sign,
                lng_ratio,
            } => (lat_sign * d, lng_ratio * d),
            Self::Vertical => (0.0, d),
            Self::Horizontal => (d, 0.0),
        }
    }
}

fn in_wgs84_range(point: GeoPoint) -> bool {
    (-90.0..=90.0).contains(&point.lat) && (-180.0..=180.0).contains(&point.lng)
}

/// Build the unsnapped offset points, one group of [`POINTS_PER_ROUND`] per
/// fraction.
///
/// Anchors are the quarter and three-quarter points of the segment. Each
/// round yields `[q1 + off, q1 - off, q3 + off, q3 - off]`.
pub fn offset_rounds(
    origin: GeoPoint,
    destination: GeoPoint,
    fractions: &[f64],
) -> Result<Vec<[GeoPoint; POINTS_PER_ROUND]>, RouteError> {
    let distance = euclidean(origin, destination);
    if distance < AXIS_EPSILON {
        return Err(RouteError::GeometryDegenerate(format!(
            "origin and destination coincide at ({}, {})",
            origin.lat, origin.lng
        )));
    }

    let anchors = interpolate(origin, destination, 3).points;
    let (near, far) = (anchors[0], anchors[2]);
    let perpendicular = Perpendicular::between(origin, destination);

    let rounds = fractions
        .iter()
        .map(|fraction| {
            let (dlat, dlng) = perpendicular.offset(distance * fraction);
            [
                GeoPoint::new(near.lat + dlat, near.lng + dlng),
                GeoPoint::new(near.lat - dlat, near.lng - dlng),
                GeoPoint::new(far.lat + dlat, far.lng + dlng),
                GeoPoint::new(far.lat - dlat, far.lng - dlng),
            ]
        })
        .collect::<Vec<_>>();

    if let Some(outside) = rounds.iter().flatten().find(|point| !in_wgs84_range(**point)) {
        return Err(RouteError::GeometryDegenerate(format!(
            "offset waypoint ({}, {}) falls outside valid coordinates",
            outside.lat, outside.lng
        )));
    }
    Ok(rounds)
}

/// Derive off-path waypoints and snap them onto routable roads.
///
/// The result holds [`POINTS_PER_ROUND`] points per offset fraction, rounds in
/// order. Order matters: waypoint pair combinations are chosen by index.
///
/// A snapping round that fails recoverably or exceeds `timeout` ends
/// derivation early: the rounds already snapped are returned, so waypoint
/// indices stay stable and the caller still routes what it has. A count
/// mismatch is never recovered.
pub async fn derive_waypoints(
    origin: GeoPoint,
    destination: GeoPoint,
    snapper: &dyn RoadSnapper,
    fractions: &[f64],
    timeout: Duration,
) -> Result<Vec<GeoPoint>, RouteError> {
    let rounds = offset_rounds(origin, destination, fractions)?;
    let mut waypoints = Vec::with_capacity(rounds.len() * POINTS_PER_ROUND);

    for (round, points) in rounds.iter().enumerate() {
        let snapped = match tokio::time::timeout(timeout, snapper.nearest_roads(points)).await {
            Ok(Ok(snapped)) => snapped,
            Ok(Err(err)) if err.is_recoverable() => {
                tracing::warn!(
                    "road snapping round {round} failed, keeping {} waypoints: {err}",
                    waypoints.len()
                );
                break;
            }
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                tracing::warn!(
                    "road snapping round {round} timed out after {timeout:?}, keeping {} waypoints",
                    waypoints.len()
                );
                break;
            }
        };
        if snapped.len() != points.len() {
            tracing::warn!(
                "road snapping round {round} returned {} points for {} inputs",
                snapped.len(),
                points.len()
            );
            return Err(RouteError::SnapCountMismatch {
                expected: points.len(),
                actual: snapped.len(),
            });
        }
        waypoints.extend(snapped);
    }

    tracing::debug!("derived {} waypoints", waypoints.len());
    Ok(waypoints)
}
