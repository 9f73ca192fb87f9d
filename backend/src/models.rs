use std::fmt;

use serde::{Deserialize, Serialize};

pub use shared::{CandidateSummary, GeoPoint, SafestRouteRequest, SafestRouteResponse};

/// Which provider request produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateSource {
    /// The n-th alternative of the direct request.
    Alternative { rank: usize },
    /// Routed through a single derived waypoint.
    Waypoint { index: usize },
    /// Routed through a pair of derived waypoints.
    Combination { first: usize, second: usize },
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alternative { rank } => write!(f, "alternative#{rank}"),
            Self::Waypoint { index } => write!(f, "waypoint#{index}"),
            Self::Combination { first, second } => write!(f, "waypoints#{first}+{second}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub duration_s: u64,
}

/// One complete provider route, normalised at the assembler boundary so
/// downstream stages never look at the raw response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRoute {
    pub source: CandidateSource,
    pub legs: Vec<RouteLeg>,
    pub overview_polyline: String,
}

impl CandidateRoute {
    /// Total travel time across every leg.
    pub fn duration_s(&self) -> u64 {
        self.legs.iter().map(|leg| leg.duration_s).sum()
    }
}

/// Densified representation of a [`CandidateRoute`]; latitudes and
/// longitudes are index-aligned and hold at least two points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointRoute {
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
}

impl PointRoute {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            latitudes: Vec::with_capacity(capacity),
            longitudes: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, point: GeoPoint) {
        self.latitudes.push(point.lat);
        self.longitudes.push(point.lng);
    }

    pub fn len(&self) -> usize {
        self.latitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latitudes.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = GeoPoint> + '_ {
        self.latitudes
            .iter()
            .zip(&self.longitudes)
            .map(|(&lat, &lng)| GeoPoint { lat, lng })
    }

    pub fn first(&self) -> Option<GeoPoint> {
        self.points().next()
    }

    pub fn last(&self) -> Option<GeoPoint> {
        match (self.latitudes.last(), self.longitudes.last()) {
            (Some(&lat), Some(&lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        }
    }

    pub fn to_path(&self) -> Vec<GeoPoint> {
        self.points().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_sums_all_legs() {
        let route = CandidateRoute {
            source: CandidateSource::Combination { first: 0, second: 2 },
            legs: vec![
                RouteLeg { duration_s: 120 },
                RouteLeg { duration_s: 300 },
                RouteLeg { duration_s: 45 },
            ],
            overview_polyline: String::new(),
        };
        assert_eq!(route.duration_s(), 465);
    }

    #[test]
    fn source_display_names_the_request() {
        assert_eq!(CandidateSource::Alternative { rank: 1 }.to_string(), "alternative#1");
        assert_eq!(CandidateSource::Waypoint { index: 7 }.to_string(), "waypoint#7");
        assert_eq!(
            CandidateSource::Combination { first: 1, second: 3 }.to_string(),
            "waypoints#1+3"
        );
    }

    #[test]
    fn point_route_keeps_axes_aligned() {
        let mut route = PointRoute::with_capacity(2);
        route.push(GeoPoint::new(40.0, -75.0));
        route.push(GeoPoint::new(40.1, -75.1));
        assert_eq!(route.len(), 2);
        assert_eq!(route.first(), Some(GeoPoint::new(40.0, -75.0)));
        assert_eq!(route.last(), Some(GeoPoint::new(40.1, -75.1)));
        assert_eq!(route.latitudes, vec![40.0, 40.1]);
        assert_eq!(route.longitudes, vec![-75.0, -75.1]);
    }
}
