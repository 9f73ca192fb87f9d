use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};

use crate::error::RouteError;
use crate::models::{GeoPoint, PointRoute};

/// Serialise a densified route as a single-track GPX 1.1 document, base64
/// encoded for embedding in JSON.
pub fn encode_route_as_gpx(route: &PointRoute) -> Result<String, RouteError> {
    let mut gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some("safewalk".into()),
        ..Default::default()
    };
    let mut track = Track {
        name: Some("safest route".into()),
        ..Default::default()
    };

    let mut segment = TrackSegment::new();
    segment.points.extend(route.points().map(to_waypoint));
    track.segments.push(segment);
    gpx.tracks.push(track);

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer)?;
    Ok(BASE64.encode(buffer))
}

fn to_waypoint(point: GeoPoint) -> Waypoint {
    Waypoint::new(Point::new(point.lng, point.lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_every_point_as_track_point() {
        let mut route = PointRoute::default();
        route.push(GeoPoint::new(39.95, -75.16));
        route.push(GeoPoint::new(39.951, -75.161));

        let encoded = encode_route_as_gpx(&route).unwrap();
        let xml = String::from_utf8(BASE64.decode(encoded).unwrap()).unwrap();
        assert_eq!(xml.matches("<trkpt").count(), 2);
        assert!(xml.contains("safewalk"));
    }
}
