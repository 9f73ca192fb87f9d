use crate::{
    error::RouteError,
    models::{CandidateRoute, PointRoute},
    weights::{CellKey, SubregionWeights},
};

/// Coefficients of the route score
/// `safety * avg + duration * avg * (duration_s / mean_duration_s)`.
///
/// Both terms carry the route's mean safety weight, so travel time scales a
/// route's own risk rather than adding an independent penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub safety: f64,
    pub duration: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            safety: 0.9,
            duration: 0.1,
        }
    }
}

pub fn extract_duration(route: &CandidateRoute) -> Result<u64, RouteError> {
    if route.legs.is_empty() {
        return Err(RouteError::MalformedRoute(format!(
            "{} has no legs",
            route.source
        )));
    }
    Ok(route.duration_s())
}

pub fn average_duration(routes: &[CandidateRoute]) -> Result<f64, RouteError> {
    if routes.is_empty() {
        return Err(RouteError::InsufficientCandidates {
            found: 0,
            required: 1,
        });
    }
    let total = routes
        .iter()
        .map(extract_duration)
        .sum::<Result<u64, _>>()?;
    Ok(total as f64 / routes.len() as f64)
}

/// Mean safety weight over every point of a route.
pub fn mean_safety(route: &PointRoute, weights: &SubregionWeights) -> Result<f64, RouteError> {
    if route.is_empty() {
        return Err(RouteError::MalformedRoute("point route is empty".into()));
    }
    let mut sum = 0.0;
    for point in route.points() {
        let key = CellKey::containing(point);
        let weight = weights.get(key).ok_or(RouteError::UnscoredCell {
            lat: key.lat(),
            lng: key.lng(),
        })?;
        sum += weight;
    }
    Ok(sum / route.len() as f64)
}

/// Score every route; lower is safer. `point_routes[i]` must be the
/// densified form of `candidates[i]`.
///
/// Any unscored cell aborts the whole run.
pub fn score_routes(
    point_routes: &[PointRoute],
    candidates: &[CandidateRoute],
    weights: &SubregionWeights,
    coefficients: &ScoreWeights,
) -> Result<Vec<f64>, RouteError> {
    if point_routes.len() != candidates.len() {
        return Err(RouteError::ScoreAlignment {
            point_routes: point_routes.len(),
            candidates: candidates.len(),
        });
    }

    let mean_duration = average_duration(candidates)?;
    point_routes
        .iter()
        .zip(candidates)
        .map(|(points, candidate)| {
            let avg = mean_safety(points, weights)?;
            let duration = extract_duration(candidate)? as f64;
            let relative = if mean_duration > 0.0 {
                duration / mean_duration
            } else {
                1.0
            };
            let score = coefficients.safety * avg + coefficients.duration * avg * relative;
            tracing::debug!(
                "{}: mean safety {avg:.4}, {duration}s, score {score:.4}",
                candidate.source
            );
            Ok(score)
        })
        .collect()
}

/// Index of the lowest score; ties go to the lowest index.
pub fn safest_route(scores: &[f64]) -> Option<usize> {
    let (&first, rest) = scores.split_first()?;
    let (winner, _) = rest
        .iter()
        .enumerate()
        .fold((0, first), |(best, best_score), (offset, &score)| {
            if score < best_score {
                (offset + 1, score)
            } else {
                (best, best_score)
            }
        });
    Some(winner)
}
