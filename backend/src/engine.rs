use std::sync::Arc;

use crate::{
    assembler::assemble_routes,
    config::SelectionConfig,
    densify::densify_all,
    error::RouteError,
    models::{CandidateRoute, CandidateSummary, GeoPoint, PointRoute},
    provider::{RoadSnapper, RoutingService},
    scoring::{safest_route, score_routes},
    waypoints::derive_waypoints,
    weights::SubregionWeights,
};

/// Outcome of one selection run. Candidates, point routes and scores are
/// index-aligned; `winner` indexes all three.
#[derive(Debug, Clone)]
pub struct RouteSelection {
    candidates: Vec<CandidateRoute>,
    point_routes: Vec<PointRoute>,
    scores: Vec<f64>,
    winner: usize,
}

impl RouteSelection {
    pub fn winner(&self) -> usize {
        self.winner
    }

    pub fn winning_candidate(&self) -> &CandidateRoute {
        &self.candidates[self.winner]
    }

    pub fn winning_point_route(&self) -> &PointRoute {
        &self.point_routes[self.winner]
    }

    pub fn candidate(&self, index: usize) -> Option<&CandidateRoute> {
        self.candidates.get(index)
    }

    pub fn point_route(&self, index: usize) -> Option<&PointRoute> {
        self.point_routes.get(index)
    }

    pub fn candidates(&self) -> &[CandidateRoute] {
        &self.candidates
    }

    pub fn point_routes(&self) -> &[PointRoute] {
        &self.point_routes
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn summaries(&self) -> Vec<CandidateSummary> {
        self.candidates
            .iter()
            .zip(&self.point_routes)
            .zip(&self.scores)
            .enumerate()
            .map(|(index, ((candidate, points), &score))| CandidateSummary {
                index,
                source: candidate.source.to_string(),
                duration_s: candidate.duration_s(),
                point_count: points.len(),
                score,
            })
            .collect()
    }
}

/// Densify, score and pick the safest of already assembled candidates.
pub fn rank_candidates(
    candidates: Vec<CandidateRoute>,
    weights: &SubregionWeights,
    config: &SelectionConfig,
) -> Result<RouteSelection, RouteError> {
    config.densify.validate()?;
    if candidates.len() < config.min_candidates {
        return Err(RouteError::InsufficientCandidates {
            found: candidates.len(),
            required: config.min_candidates,
        });
    }

    let point_routes = densify_all(&candidates, &config.densify)?;
    let scores = score_routes(&point_routes, &candidates, weights, &config.score_weights)?;
    let winner = safest_route(&scores).ok_or(RouteError::InsufficientCandidates {
        found: 0,
        required: config.min_candidates,
    })?;

    tracing::info!(
        "selected {} (score {:.4}) out of {} candidates",
        candidates[winner].source,
        scores[winner],
        candidates.len()
    );

    Ok(RouteSelection {
        candidates,
        point_routes,
        scores,
        winner,
    })
}

/// Full pipeline: derive waypoints, assemble candidates from the routing
/// provider, then densify, score and select.
pub async fn select_safest_route(
    origin: GeoPoint,
    destination: GeoPoint,
    weights: &SubregionWeights,
    routing: &dyn RoutingService,
    snapper: &dyn RoadSnapper,
    config: &SelectionConfig,
) -> Result<RouteSelection, RouteError> {
    let waypoints = derive_waypoints(
        origin,
        destination,
        snapper,
        &config.offset_fractions,
        config.assembler.provider_timeout,
    )
    .await?;
    let candidates =
        assemble_routes(origin, destination, &waypoints, routing, &config.assembler).await?;
    rank_candidates(candidates, weights, config)
}

/// Long-lived selection service: safety weights loaded once, shared
/// read-only across requests.
pub struct SafetyEngine {
    weights: Arc<SubregionWeights>,
    routing: Arc<dyn RoutingService>,
    snapper: Arc<dyn RoadSnapper>,
    config: SelectionConfig,
}

impl SafetyEngine {
    pub fn new(
        weights: Arc<SubregionWeights>,
        routing: Arc<dyn RoutingService>,
        snapper: Arc<dyn RoadSnapper>,
        config: SelectionConfig,
    ) -> Self {
        Self {
            weights,
            routing,
            snapper,
            config,
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub async fn select(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<RouteSelection, RouteError> {
        select_safest_route(
            origin,
            destination,
            &self.weights,
            self.routing.as_ref(),
            self.snapper.as_ref(),
            &self.config,
        )
        .await
    }
}
