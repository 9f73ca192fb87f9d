use crate::models::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Result of [`interpolate`]: the intermediate points plus the full
/// per-axis coordinate lists with both endpoints included.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolated {
    pub points: Vec<GeoPoint>,
    pub lats: Vec<f64>,
    pub lngs: Vec<f64>,
}

/// Emit `count` evenly spaced points strictly between `a` and `b`.
///
/// Point `i` (1-based) sits at `i / (count + 1)` along the segment, so the
/// output is exactly reproducible for identical inputs. `lats`/`lngs` hold
/// `count + 2` entries, starting with `a` and ending with `b`.
pub fn interpolate(a: GeoPoint, b: GeoPoint, count: usize) -> Interpolated {
    let mut points = Vec::with_capacity(count);
    let mut lats = Vec::with_capacity(count + 2);
    let mut lngs = Vec::with_capacity(count + 2);
    lats.push(a.lat);
    lngs.push(a.lng);

    let steps = (count + 1) as f64;
    for i in 1..=count {
        let point = a.interpolate(b, i as f64 / steps);
        points.push(point);
        lats.push(point.lat);
        lngs.push(point.lng);
    }

    lats.push(b.lat);
    lngs.push(b.lng);
    Interpolated { points, lats, lngs }
}

/// Straight-line distance in raw degree space. Only meaningful for short
/// urban distances; used for thresholds, never reported to users.
pub fn euclidean(a: GeoPoint, b: GeoPoint) -> f64 {
    let dlat = a.lat - b.lat;
    let dlng = a.lng - b.lng;
    (dlat * dlat + dlng * dlng).sqrt()
}

pub fn approximate_distance_km(path: &[GeoPoint]) -> f64 {
    path.windows(2).map(|w| haversine_km(w[0], w[1])).sum()
}

pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlng = (dlng / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlng * sin_dlng;
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_zero_points_keeps_endpoints() {
        let a = GeoPoint::new(40.0, -75.0);
        let b = GeoPoint::new(40.01, -75.02);
        let out = interpolate(a, b, 0);
        assert!(out.points.is_empty());
        assert_eq!(out.lats, vec![40.0, 40.01]);
        assert_eq!(out.lngs, vec![-75.0, -75.02]);
    }

    #[test]
    fn test_interpolate_quarters() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(4.0, 8.0);
        let out = interpolate(a, b, 3);
        assert_eq!(
            out.points,
            vec![
                GeoPoint::new(1.0, 2.0),
                GeoPoint::new(2.0, 4.0),
                GeoPoint::new(3.0, 6.0),
            ]
        );
        assert_eq!(out.lats, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(out.lngs, vec![0.0, 2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_euclidean_is_degree_space() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0003, 0.0004);
        assert!((euclidean(a, b) - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn test_haversine_same_point() {
        let point = GeoPoint::new(45.0, 5.0);
        assert_eq!(haversine_km(point, point), 0.0);
    }

    #[test]
    fn test_approximate_distance_single_point() {
        let path = vec![GeoPoint::new(45.0, 5.0)];
        assert_eq!(approximate_distance_km(&path), 0.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn city_point() -> impl Strategy<Value = GeoPoint> {
            (-60.0..=60.0, -170.0..=170.0).prop_map(|(lat, lng)| GeoPoint { lat, lng })
        }

        proptest! {
            #[test]
            fn prop_interpolate_lengths(a in city_point(), b in city_point(), n in 0usize..64) {
                let out = interpolate(a, b, n);
                prop_assert_eq!(out.points.len(), n);
                prop_assert_eq!(out.lats.len(), n + 2);
                prop_assert_eq!(out.lngs.len(), n + 2);
            }

            #[test]
            fn prop_interpolate_endpoints_exact(a in city_point(), b in city_point(), n in 0usize..64) {
                let out = interpolate(a, b, n);
                prop_assert_eq!(out.lats[0], a.lat);
                prop_assert_eq!(out.lngs[0], a.lng);
                prop_assert_eq!(out.lats[n + 1], b.lat);
                prop_assert_eq!(out.lngs[n + 1], b.lng);
            }

            #[test]
            fn prop_interpolate_even_spacing(a in city_point(), b in city_point(), n in 2usize..32) {
                let out = interpolate(a, b, n);
                let step_lat = out.lats[1] - out.lats[0];
                let step_lng = out.lngs[1] - out.lngs[0];
                for w in out.points.windows(2) {
                    prop_assert!(((w[1].lat - w[0].lat) - step_lat).abs() < 1e-9);
                    prop_assert!(((w[1].lng - w[0].lng) - step_lng).abs() < 1e-9);
                }
            }

            #[test]
            fn prop_interpolate_deterministic(a in city_point(), b in city_point(), n in 0usize..32) {
                prop_assert_eq!(interpolate(a, b, n), interpolate(a, b, n));
            }

            #[test]
            fn prop_haversine_symmetric(a in city_point(), b in city_point()) {
                prop_assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-10);
            }
        }
    }
}
