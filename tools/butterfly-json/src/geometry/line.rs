use geo::{Distance, Haversine, Point};

/// Point halfway along a line by great-circle distance.
///
/// Falls back to the plain mean of the points when the line has fewer than two points or no
/// length at all.
pub fn line_centroid(points: &[Point<f64>]) -> Point<f64> {
    if points.len() >= 2 {
        let segments: Vec<(Point<f64>, Point<f64>, f64)> = points
            .windows(2)
            .map(|w| (w[0], w[1], Haversine::distance(w[0], w[1])))
            .collect();

        let half = segments.iter().map(|(_, _, d)| d).sum::<f64>() / 2.0;
        let mut travelled = 0.0;

        for (from, to, distance) in segments {
            if travelled + distance > half {
                let ratio = (half - travelled) / distance;
                return Point::new(
                    from.x() + (to.x() - from.x()) * ratio,
                    from.y() + (to.y() - from.y()) * ratio,
                );
            }
            travelled += distance;
        }
    }

    mean(points)
}

fn mean(points: &[Point<f64>]) -> Point<f64> {
    if points.is_empty() {
        return Point::new(0.0, 0.0);
    }
    let n = points.len() as f64;
    let (x, y) = points
        .iter()
        .fold((0.0, 0.0), |(x, y), p| (x + p.x(), y + p.y()));
    Point::new(x / n, y / n)
}
