//! Google Maps Directions and Roads clients.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::RouteError,
    models::{GeoPoint, RouteLeg},
    provider::{DirectionsRequest, ProviderRoute, RoadSnapper, RoutingService},
};

pub const DEFAULT_DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";
pub const DEFAULT_ROADS_URL: &str = "https://roads.googleapis.com/v1/nearestRoads";

/// HTTP client for both Google collaborators, sharing one connection pool.
#[derive(Clone)]
pub struct GoogleMapsClient {
    client: Client,
    api_key: String,
    directions_url: String,
    roads_url: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<WireRoute>,
}

#[derive(Debug, Deserialize)]
struct WireRoute {
    #[serde(default)]
    legs: Vec<WireLeg>,
    overview_polyline: Option<WirePolyline>,
}

#[derive(Debug, Deserialize)]
struct WireLeg {
    duration: Option<WireValue>,
}

#[derive(Debug, Deserialize)]
struct WireValue {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct WirePolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NearestRoadsResponse {
    #[serde(default)]
    snapped_points: Vec<SnappedPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnappedPoint {
    location: LatLngLiteral,
    original_index: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct LatLngLiteral {
    latitude: f64,
    longitude: f64,
}

fn format_point(point: GeoPoint) -> String {
    format!("{},{}", point.lat, point.lng)
}

fn format_points(points: &[GeoPoint]) -> String {
    points
        .iter()
        .map(|&point| format_point(point))
        .collect::<Vec<_>>()
        .join("|")
}

fn unavailable(err: reqwest::Error) -> RouteError {
    RouteError::ProviderUnavailable(err.to_string())
}

fn routes_from_response(response: DirectionsResponse) -> Result<Vec<ProviderRoute>, RouteError> {
    match response.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" | "NOT_FOUND" => return Ok(Vec::new()),
        status => {
            return Err(RouteError::ProviderUnavailable(format!(
                "directions status {status}: {}",
                response.error_message.unwrap_or_default()
            )));
        }
    }

    response
        .routes
        .into_iter()
        .map(|route| {
            let legs = route
                .legs
                .into_iter()
                .map(|leg| {
                    leg.duration
                        .map(|duration| RouteLeg {
                            duration_s: duration.value,
                        })
                        .ok_or_else(|| RouteError::MalformedRoute("leg without duration".into()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if legs.is_empty() {
                return Err(RouteError::MalformedRoute("route without legs".into()));
            }
            let overview_polyline = route
                .overview_polyline
                .map(|polyline| polyline.points)
                .ok_or_else(|| RouteError::MalformedRoute("route without overview polyline".into()))?;
            Ok(ProviderRoute {
                legs,
                overview_polyline,
            })
        })
        .collect()
}

/// First snapped point per input, in input order. Inputs the service could
/// not snap are left out, so the result may be shorter than `count`.
fn snapped_in_order(response: NearestRoadsResponse, count: usize) -> Vec<GeoPoint> {
    let mut slots: Vec<Option<GeoPoint>> = vec![None; count];
    for (position, snapped) in response.snapped_points.into_iter().enumerate() {
        let index = snapped.original_index.unwrap_or(position);
        match slots.get_mut(index) {
            Some(slot) if slot.is_none() => {
                *slot = Some(GeoPoint::new(
                    snapped.location.latitude,
                    snapped.location.longitude,
                ));
            }
            _ => {}
        }
    }
    slots.into_iter().flatten().collect()
}

impl GoogleMapsClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, RouteError> {
        Self::with_endpoints(api_key, timeout, DEFAULT_DIRECTIONS_URL, DEFAULT_ROADS_URL)
    }

    pub fn with_endpoints(
        api_key: impl Into<String>,
        timeout: Duration,
        directions_url: impl Into<String>,
        roads_url: impl Into<String>,
    ) -> Result<Self, RouteError> {
        let client = Client::builder().timeout(timeout).build().map_err(unavailable)?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            directions_url: directions_url.into(),
            roads_url: roads_url.into(),
        })
    }
}

#[async_trait]
impl RoutingService for GoogleMapsClient {
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<Vec<ProviderRoute>, RouteError> {
        let mut query = vec![
            ("origin", format_point(request.origin)),
            ("destination", format_point(request.destination)),
            ("mode", "walking".to_string()),
            ("key", self.api_key.clone()),
        ];
        if request.alternatives {
            query.push(("alternatives", "true".to_string()));
        }
        if !request.waypoints.is_empty() {
            query.push(("waypoints", format_points(&request.waypoints)));
        }

        let response: DirectionsResponse = self
            .client
            .get(&self.directions_url)
            .query(&query)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?
            .json()
            .await
            .map_err(unavailable)?;
        routes_from_response(response)
    }
}

#[async_trait]
impl RoadSnapper for GoogleMapsClient {
    async fn nearest_roads(&self, points: &[GeoPoint]) -> Result<Vec<GeoPoint>, RouteError> {
        let response: NearestRoadsResponse = self
            .client
            .get(&self.roads_url)
            .query(&[("points", format_points(points)), ("key", self.api_key.clone())])
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?
            .json()
            .await
            .map_err(unavailable)?;
        Ok(snapped_in_order(response, points.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_directions_with_multi_leg_routes() {
        let response: DirectionsResponse = serde_json::from_str(
            r#"{
                "status": "OK",
                "routes": [
                    {"legs": [{"duration": {"value": 300, "text": "5 mins"}},
                              {"duration": {"value": 420, "text": "7 mins"}}],
                     "overview_polyline": {"points": "_p~iF~ps|U_ulLnnqC"}}
                ]
            }"#,
        )
        .unwrap();
        let routes = routes_from_response(response).unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(
            routes[0].legs,
            vec![RouteLeg { duration_s: 300 }, RouteLeg { duration_s: 420 }]
        );
        assert_eq!(routes[0].overview_polyline, "_p~iF~ps|U_ulLnnqC");
    }

    #[test]
    fn zero_results_is_an_empty_list() {
        let response: DirectionsResponse =
            serde_json::from_str(r#"{"status": "ZERO_RESULTS", "routes": []}"#).unwrap();
        assert!(routes_from_response(response).unwrap().is_empty());
    }

    #[test]
    fn denied_request_is_provider_unavailable() {
        let response: DirectionsResponse = serde_json::from_str(
            r#"{"status": "REQUEST_DENIED", "error_message": "bad key", "routes": []}"#,
        )
        .unwrap();
        let err = routes_from_response(response).unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("bad key"));
    }

    #[test]
    fn leg_without_duration_is_malformed() {
        let response: DirectionsResponse = serde_json::from_str(
            r#"{"status": "OK", "routes": [
                {"legs": [{}], "overview_polyline": {"points": "_p~iF~ps|U"}}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(
            routes_from_response(response),
            Err(RouteError::MalformedRoute(_))
        ));
    }

    #[test]
    fn snapped_points_follow_original_index() {
        let response: NearestRoadsResponse = serde_json::from_str(
            r#"{"snappedPoints": [
                {"location": {"latitude": 2.0, "longitude": 20.0}, "originalIndex": 1, "placeId": "b"},
                {"location": {"latitude": 1.0, "longitude": 10.0}, "originalIndex": 0, "placeId": "a"},
                {"location": {"latitude": 1.5, "longitude": 15.0}, "originalIndex": 0, "placeId": "a2"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            snapped_in_order(response, 2),
            vec![GeoPoint::new(1.0, 10.0), GeoPoint::new(2.0, 20.0)]
        );
    }

    #[test]
    fn unsnapped_inputs_shorten_the_result() {
        let response: NearestRoadsResponse = serde_json::from_str(
            r#"{"snappedPoints": [
                {"location": {"latitude": 1.0, "longitude": 10.0}, "originalIndex": 0}
            ]}"#,
        )
        .unwrap();
        assert_eq!(snapped_in_order(response, 4).len(), 1);
    }

    #[test]
    fn waypoints_are_pipe_separated() {
        let points = [GeoPoint::new(40.5, -75.25), GeoPoint::new(40.75, -75.5)];
        assert_eq!(format_points(&points), "40.5,-75.25|40.75,-75.5");
    }
}
