//! Seams to the mapping provider.
//!
//! The engine only talks to routing and road snapping through these traits,
//! which lets tests swap in canned responses and keeps the HTTP clients in
//! [`crate::google`] replaceable.

use async_trait::async_trait;

use crate::{
    error::RouteError,
    models::{GeoPoint, RouteLeg},
};

/// A walking directions query. `waypoints` is empty for the direct request.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsRequest {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub alternatives: bool,
    pub waypoints: Vec<GeoPoint>,
}

impl DirectionsRequest {
    pub fn alternatives(origin: GeoPoint, destination: GeoPoint) -> Self {
        Self {
            origin,
            destination,
            alternatives: true,
            waypoints: Vec::new(),
        }
    }

    pub fn via(origin: GeoPoint, destination: GeoPoint, waypoints: Vec<GeoPoint>) -> Self {
        Self {
            origin,
            destination,
            alternatives: false,
            waypoints,
        }
    }
}

/// A route as returned by the provider, already reduced to legs and the
/// overview polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRoute {
    pub legs: Vec<RouteLeg>,
    pub overview_polyline: String,
}

/// Routing collaborator.
///
/// # Contract
/// - Transport failures and provider-side errors are
///   [`RouteError::ProviderUnavailable`]
/// - A route whose legs lack a duration is [`RouteError::MalformedRoute`]
/// - An empty list means the provider found no route
#[async_trait]
pub trait RoutingService: Send + Sync {
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<Vec<ProviderRoute>, RouteError>;
}

/// Road-snapping collaborator.
///
/// # Contract
/// Returns one routable point per input, in input order. Callers must treat
/// any other length as a data inconsistency.
#[async_trait]
pub trait RoadSnapper: Send + Sync {
    async fn nearest_roads(&self, points: &[GeoPoint]) -> Result<Vec<GeoPoint>, RouteError>;
}

#[cfg(test)]
pub(crate) mod mock {
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
        time::Duration,
    };

    use super::*;

    /// Snaps every point onto itself.
    pub struct IdentitySnapper;

    #[async_trait]
    impl RoadSnapper for IdentitySnapper {
        async fn nearest_roads(&self, points: &[GeoPoint]) -> Result<Vec<GeoPoint>, RouteError> {
            Ok(points.to_vec())
        }
    }

    /// Drops the last snapped point, breaking the one-per-input contract.
    pub struct ShortSnapper;

    #[async_trait]
    impl RoadSnapper for ShortSnapper {
        async fn nearest_roads(&self, points: &[GeoPoint]) -> Result<Vec<GeoPoint>, RouteError> {
            Ok(points[..points.len().saturating_sub(1)].to_vec())
        }
    }

    /// Snaps in place for the first `healthy_rounds` calls, then reports the
    /// provider as unavailable.
    pub struct FlakySnapper {
        healthy_rounds: usize,
        calls: AtomicUsize,
    }

    impl FlakySnapper {
        pub fn new(healthy_rounds: usize) -> Self {
            Self {
                healthy_rounds,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RoadSnapper for FlakySnapper {
        async fn nearest_roads(&self, points: &[GeoPoint]) -> Result<Vec<GeoPoint>, RouteError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.healthy_rounds {
                Ok(points.to_vec())
            } else {
                Err(RouteError::ProviderUnavailable("roads api down".into()))
            }
        }
    }

    /// Never answers.
    pub struct HangingSnapper;

    #[async_trait]
    impl RoadSnapper for HangingSnapper {
        async fn nearest_roads(&self, _points: &[GeoPoint]) -> Result<Vec<GeoPoint>, RouteError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    #[derive(Clone)]
    pub enum Reply {
        Routes(Vec<ProviderRoute>),
        Fail,
        Hang,
    }

    /// Answers by number of waypoints in the request, with per-waypoint
    /// overrides. Records every request it receives.
    pub struct ScriptedRouting {
        pub direct: Reply,
        pub via: Reply,
        pub overrides: HashMap<usize, Reply>,
        pub seen: Mutex<Vec<DirectionsRequest>>,
        waypoint_order: Mutex<Vec<GeoPoint>>,
    }

    impl ScriptedRouting {
        pub fn new(direct: Reply, via: Reply) -> Self {
            Self {
                direct,
                via,
                overrides: HashMap::new(),
                seen: Mutex::new(Vec::new()),
                waypoint_order: Mutex::new(Vec::new()),
            }
        }

        /// Override the reply for the n-th distinct single-waypoint request.
        pub fn with_override(mut self, nth_waypoint: usize, reply: Reply) -> Self {
            self.overrides.insert(nth_waypoint, reply);
            self
        }

        pub fn requests(&self) -> Vec<DirectionsRequest> {
            self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl RoutingService for ScriptedRouting {
        async fn directions(
            &self,
            request: &DirectionsRequest,
        ) -> Result<Vec<ProviderRoute>, RouteError> {
            self.seen.lock().unwrap().push(request.clone());
            let reply = match request.waypoints.as_slice() {
                [] => self.direct.clone(),
                [single] => {
                    let mut order = self.waypoint_order.lock().unwrap();
                    let position = match order.iter().position(|p| p == single) {
                        Some(position) => position,
                        None => {
                            order.push(*single);
                            order.len() - 1
                        }
                    };
                    self.overrides.get(&position).cloned().unwrap_or_else(|| self.via.clone())
                }
                _ => self.via.clone(),
            };
            match reply {
                Reply::Routes(routes) => Ok(routes),
                Reply::Fail => Err(RouteError::ProviderUnavailable("scripted failure".into())),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    pub fn provider_route(durations: &[u64], polyline: &str) -> ProviderRoute {
        ProviderRoute {
            legs: durations
                .iter()
                .map(|&duration_s| RouteLeg { duration_s })
                .collect(),
            overview_polyline: polyline.to_string(),
        }
    }
}
