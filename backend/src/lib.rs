pub mod assembler;
pub mod config;
pub mod densify;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod google;
pub mod gpx_export;
pub mod models;
pub mod provider;
pub mod scoring;
pub mod waypoints;
pub mod weights;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use shared::ApiError;

use crate::engine::SafetyEngine;
use crate::error::RouteError;
use crate::geometry::approximate_distance_km;
use crate::gpx_export::encode_route_as_gpx;
use crate::models::{SafestRouteRequest, SafestRouteResponse};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SafetyEngine>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/route", post(route_handler))
        .route("/api/health", get(|| async { "ok" }))
        .with_state(state)
}

async fn route_handler(
    State(state): State<AppState>,
    Json(req): Json<SafestRouteRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let selection = state
        .engine
        .select(req.origin, req.destination)
        .await
        .map_err(api_error)?;

    let path = selection.winning_point_route().to_path();
    let distance_km = approximate_distance_km(&path);
    let gpx_base64 = encode_route_as_gpx(selection.winning_point_route()).map_err(api_error)?;

    Ok(Json(SafestRouteResponse {
        winner: selection.winner(),
        candidates: selection.summaries(),
        path,
        distance_km,
        gpx_base64,
    }))
}

fn status_for(err: &RouteError) -> StatusCode {
    match err {
        RouteError::GeometryDegenerate(_) => StatusCode::BAD_REQUEST,
        RouteError::InsufficientCandidates { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RouteError::ProviderUnavailable(_)
        | RouteError::SnapCountMismatch { .. }
        | RouteError::MalformedRoute(_) => StatusCode::BAD_GATEWAY,
        RouteError::UnscoredCell { .. }
        | RouteError::ScoreAlignment { .. }
        | RouteError::InvalidConfig(_)
        | RouteError::Gpx(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: RouteError) -> (StatusCode, Json<ApiError>) {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("route selection failed: {err}");
    } else {
        tracing::debug!("route selection rejected: {err}");
    }
    (
        status,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}
