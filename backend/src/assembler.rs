use std::time::Duration;

use futures::{stream, StreamExt};

use crate::{
    error::RouteError,
    models::{CandidateRoute, CandidateSource, GeoPoint},
    provider::{DirectionsRequest, ProviderRoute, RoutingService},
};

/// Pairs first-round near/far offsets with the same-side second-round ones.
pub const DEFAULT_WAYPOINT_PAIRS: [(usize, usize); 4] = [(0, 2), (0, 3), (1, 2), (1, 3)];

#[derive(Debug, Clone, PartialEq)]
pub struct AssemblerConfig {
    /// Waypoint index pairs routed together, in request order.
    pub waypoint_pairs: Vec<(usize, usize)>,
    /// A call running longer than this only loses its own candidate.
    pub provider_timeout: Duration,
    pub max_concurrent_requests: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            waypoint_pairs: DEFAULT_WAYPOINT_PAIRS.to_vec(),
            provider_timeout: Duration::from_secs(10),
            max_concurrent_requests: 4,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Planned {
    Direct,
    Single(usize),
    Pair(usize, usize),
}

fn plan(
    origin: GeoPoint,
    destination: GeoPoint,
    waypoints: &[GeoPoint],
    pairs: &[(usize, usize)],
) -> Vec<(Planned, DirectionsRequest)> {
    let mut planned = Vec::with_capacity(1 + waypoints.len() + pairs.len());
    planned.push((Planned::Direct, DirectionsRequest::alternatives(origin, destination)));

    for (index, &waypoint) in waypoints.iter().enumerate() {
        planned.push((
            Planned::Single(index),
            DirectionsRequest::via(origin, destination, vec![waypoint]),
        ));
    }

    for &(first, second) in pairs {
        match (waypoints.get(first), waypoints.get(second)) {
            (Some(&a), Some(&b)) => planned.push((
                Planned::Pair(first, second),
                DirectionsRequest::via(origin, destination, vec![a, b]),
            )),
            _ => tracing::warn!(
                "waypoint pair ({first}, {second}) out of range for {} waypoints",
                waypoints.len()
            ),
        }
    }
    planned
}

fn into_candidates(planned: Planned, routes: Vec<ProviderRoute>) -> Vec<CandidateRoute> {
    let candidate = |source, route: ProviderRoute| CandidateRoute {
        source,
        legs: route.legs,
        overview_polyline: route.overview_polyline,
    };
    match planned {
        Planned::Direct => routes
            .into_iter()
            .enumerate()
            .map(|(rank, route)| candidate(CandidateSource::Alternative { rank }, route))
            .collect(),
        Planned::Single(index) => routes
            .into_iter()
            .take(1)
            .map(|route| candidate(CandidateSource::Waypoint { index }, route))
            .collect(),
        Planned::Pair(first, second) => routes
            .into_iter()
            .take(1)
            .map(|route| candidate(CandidateSource::Combination { first, second }, route))
            .collect(),
    }
}

/// Collect candidate routes: every direct alternative, one route per
/// waypoint, and one per configured waypoint pair.
///
/// Calls run with bounded concurrency and are reassembled in request order.
/// A provider failure, timeout or empty response drops only that candidate;
/// any other error aborts the batch.
pub async fn assemble_routes(
    origin: GeoPoint,
    destination: GeoPoint,
    waypoints: &[GeoPoint],
    routing: &dyn RoutingService,
    config: &AssemblerConfig,
) -> Result<Vec<CandidateRoute>, RouteError> {
    let planned = plan(origin, destination, waypoints, &config.waypoint_pairs);
    let timeout = config.provider_timeout;

    let replies: Vec<_> = stream::iter(planned)
        .map(move |(planned, request)| async move {
            let reply = tokio::time::timeout(timeout, routing.directions(&request)).await;
            (planned, reply)
        })
        .buffered(config.max_concurrent_requests.max(1))
        .collect()
        .await;

    let mut candidates = Vec::new();
    for (planned, reply) in replies {
        match reply {
            Ok(Ok(routes)) if routes.is_empty() => {
                tracing::warn!("skipping {planned:?}: provider returned no route");
            }
            Ok(Ok(routes)) => candidates.extend(into_candidates(planned, routes)),
            Ok(Err(err)) if err.is_recoverable() => {
                tracing::warn!("skipping {planned:?}: {err}");
            }
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                tracing::warn!("skipping {planned:?}: provider timed out after {timeout:?}");
            }
        }
    }

    tracing::info!(
        "assembled {} candidate routes from {} waypoints",
        candidates.len(),
        waypoints.len()
    );
    Ok(candidates)
}
