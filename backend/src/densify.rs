//! Turn a provider route's overview polyline into a dense point sequence
//! suitable for per-cell safety lookup.

use geo_types::Coord;
use rayon::prelude::*;

use crate::{
    error::RouteError,
    geometry::{euclidean, interpolate},
    models::{CandidateRoute, GeoPoint, PointRoute},
};

/// Google encoded polylines carry five decimal places.
pub const POLYLINE_PRECISION: u32 = 5;

/// Absorbs float error when a gap is an exact multiple of the target spacing.
const RATIO_EPSILON: f64 = 1e-9;

/// Smallest accepted target spacing, roughly 10 cm of latitude.
pub const MIN_TARGET_SPACING: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensifyConfig {
    /// A node is kept only if it lies further than this from the last kept node.
    pub min_node_spacing: f64,
    /// Approximate spacing of the filled-in points, in degrees.
    pub target_spacing: f64,
}

impl Default for DensifyConfig {
    fn default() -> Self {
        Self {
            min_node_spacing: 0.0002,
            target_spacing: 0.0004,
        }
    }
}

impl DensifyConfig {
    pub fn validate(&self) -> Result<(), RouteError> {
        if !self.target_spacing.is_finite() || self.target_spacing < MIN_TARGET_SPACING {
            return Err(RouteError::InvalidConfig(format!(
                "target spacing {} must be a finite number of at least {MIN_TARGET_SPACING} degrees",
                self.target_spacing
            )));
        }
        if !self.min_node_spacing.is_finite() || self.min_node_spacing < 0.0 {
            return Err(RouteError::InvalidConfig(format!(
                "minimum node spacing {} must be finite and non-negative",
                self.min_node_spacing
            )));
        }
        Ok(())
    }

    /// Points to insert across a gap of `distance` degrees.
    ///
    /// Deliberately one less than a fill to exact spacing would need.
    pub fn fill_count(&self, distance: f64) -> usize {
        let whole_steps = (distance / self.target_spacing + RATIO_EPSILON).floor();
        if whole_steps > 1.0 {
            whole_steps as usize - 1
        } else {
            0
        }
    }
}

/// Node-walk state. The final node is handled outside the walk.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Walk {
    SeekingFirst,
    Accumulating { last_kept: GeoPoint },
}

impl Walk {
    fn step(self, node: GeoPoint, out: &mut PointRoute, config: &DensifyConfig) -> Self {
        match self {
            Self::SeekingFirst => {
                out.push(node);
                Self::Accumulating { last_kept: node }
            }
            Self::Accumulating { last_kept } => {
                if euclidean(node, last_kept) > config.min_node_spacing {
                    fill_gap(last_kept, node, out, config);
                    out.push(node);
                    Self::Accumulating { last_kept: node }
                } else {
                    self
                }
            }
        }
    }
}

fn fill_gap(a: GeoPoint, b: GeoPoint, out: &mut PointRoute, config: &DensifyConfig) {
    let count = config.fill_count(euclidean(a, b));
    if count > 0 {
        for point in interpolate(a, b, count).points {
            out.push(point);
        }
    }
}

pub fn decode_polyline(encoded: &str) -> Result<Vec<GeoPoint>, RouteError> {
    let line = polyline::decode_polyline(encoded, POLYLINE_PRECISION)
        .map_err(|err| RouteError::MalformedRoute(format!("undecodable polyline: {err}")))?;
    Ok(line
        .into_iter()
        .map(|coord| GeoPoint::new(coord.y, coord.x))
        .collect())
}

pub fn encode_polyline(path: &[GeoPoint]) -> Result<String, RouteError> {
    let coords = path.iter().map(|point| Coord {
        x: point.lng,
        y: point.lat,
    });
    polyline::encode_coordinates(coords, POLYLINE_PRECISION)
        .map_err(|err| RouteError::MalformedRoute(format!("unencodable path: {err}")))
}

/// Densify an ordered node sequence.
///
/// Near-duplicate nodes are suppressed, gaps between kept nodes are filled
/// by interpolation, and the final node is always appended.
pub fn densify_nodes(nodes: &[GeoPoint], config: &DensifyConfig) -> Result<PointRoute, RouteError> {
    config.validate()?;
    let Some((&last, body)) = nodes.split_last() else {
        return Err(RouteError::MalformedRoute("route has no nodes".into()));
    };
    if body.is_empty() {
        return Err(RouteError::MalformedRoute(format!(
            "route has {} node, at least 2 required",
            nodes.len()
        )));
    }

    let (walk, mut route) = body.iter().fold(
        (Walk::SeekingFirst, PointRoute::with_capacity(nodes.len())),
        |(walk, mut route), &node| {
            let walk = walk.step(node, &mut route, config);
            (walk, route)
        },
    );

    if let Walk::Accumulating { last_kept } = walk {
        fill_gap(last_kept, last, &mut route, config);
    }
    route.push(last);
    Ok(route)
}

pub fn densify(route: &CandidateRoute, config: &DensifyConfig) -> Result<PointRoute, RouteError> {
    let nodes = decode_polyline(&route.overview_polyline)?;
    let points = densify_nodes(&nodes, config)?;
    tracing::debug!(
        "densified {}: {} nodes -> {} points",
        route.source,
        nodes.len(),
        points.len()
    );
    Ok(points)
}

/// Densify a candidate batch in parallel, preserving candidate order.
pub fn densify_all(
    routes: &[CandidateRoute],
    config: &DensifyConfig,
) -> Result<Vec<PointRoute>, RouteError> {
    routes.par_iter().map(|route| densify(route, config)).collect()
}
