use geo::{Bearing, Haversine, Point};

/// Bearing difference (degrees) below which a vertex is treated as lying on the line through
/// its neighbours
pub const COLLINEAR_THRESHOLD_DEGREES: f64 = 0.01;

/// Drop vertices that add no shape to a ring: consecutive repeats, and vertices on the
/// great-circle path from their predecessor to their successor.
///
/// The first and last vertices are always kept.
pub fn simplify_ring(points: &[Point<f64>]) -> Vec<Point<f64>> {
    let mut distinct = points.to_vec();
    distinct.dedup();
    if distinct.len() < 3 {
        return distinct;
    }

    let mut kept = vec![distinct[0]];
    for window in distinct.windows(3) {
        let (prev, point, next) = (window[0], window[1], window[2]);
        let turn = bearing_delta(
            Haversine::bearing(prev, point),
            Haversine::bearing(prev, next),
        );
        if turn > COLLINEAR_THRESHOLD_DEGREES {
            kept.push(point);
        }
    }
    kept.push(distinct[distinct.len() - 1]);
    kept
}

fn bearing_delta(a: f64, b: f64) -> f64 {
    let delta = (a - b).abs() % 360.0;
    delta.min(360.0 - delta)
}

/// Centroid of a closed ring as the normalized mean of its vertices on the unit sphere.
///
/// The ring is simplified first; the closing vertex is part of the mean. Suited to small,
/// roughly convex shapes; this is not an area-weighted centroid.
pub fn polygon_centroid(points: &[Point<f64>]) -> Point<f64> {
    let ring = simplify_ring(points);
    if ring.is_empty() {
        return Point::new(0.0, 0.0);
    }

    let (mut x, mut y, mut z) = (0.0, 0.0, 0.0);
    for p in &ring {
        let (lat, lon) = (p.y().to_radians(), p.x().to_radians());
        x += lat.cos() * lon.cos();
        y += lat.cos() * lon.sin();
        z += lat.sin();
    }
    let n = ring.len() as f64;
    let (x, y, z) = (x / n, y / n, z / n);

    let lon = y.atan2(x);
    let lat = z.atan2(x.hypot(y));
    Point::new(lon.to_degrees(), lat.to_degrees())
}
