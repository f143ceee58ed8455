//! Polygon measures and line-boundary intersection.
//!
//! Cell boundaries are closed simple polygons given as counter-clockwise or
//! clockwise vertex loops; everything here is orientation-agnostic unless
//! noted. These are the measures the division engine triggers on (area), the
//! anchors it constrains paths through (centroid, random interior point),
//! and the crossing computations the directed-cut variants use.

use rand::Rng;
use thiserror::Error;

use super::point::Point2;

/// Polygons with |signed area| below this are treated as degenerate.
pub const DEGENERATE_AREA: f64 = 1e-12;

/// Maximum rejection-sampling attempts before falling back to the centroid
/// when drawing a uniform interior point.
const MAX_SAMPLE_ATTEMPTS: usize = 128;

/// Errors from polygon measure computations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PolygonError {
    /// Fewer than three vertices were supplied.
    #[error("polygon needs at least 3 vertices, found {found}")]
    TooFewVertices {
        /// Number of vertices supplied.
        found: usize,
    },
    /// The polygon's area is numerically zero, so area-weighted quantities
    /// (centroid, interior sampling) are undefined.
    #[error("polygon is degenerate: |area| below {DEGENERATE_AREA}")]
    Degenerate,
}

/// Signed area of the polygon via the shoelace formula.
///
/// Positive for counter-clockwise loops, negative for clockwise ones.
#[must_use]
pub fn signed_area(polygon: &[Point2]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        twice += a.cross(b);
    }
    0.5 * twice
}

/// Absolute area of the polygon.
///
/// # Examples
///
/// ```rust
/// use cytokinesis::geometry::point::Point2;
/// use cytokinesis::geometry::polygon::area;
///
/// let square = [
///     Point2::new(0.0, 0.0),
///     Point2::new(2.0, 0.0),
///     Point2::new(2.0, 2.0),
///     Point2::new(0.0, 2.0),
/// ];
/// assert_eq!(area(&square), 4.0);
/// ```
#[must_use]
pub fn area(polygon: &[Point2]) -> f64 {
    signed_area(polygon).abs()
}

/// Area-weighted centroid (center of mass of the enclosed region).
///
/// # Errors
///
/// Returns [`PolygonError`] for loops with fewer than three vertices or
/// numerically zero area.
pub fn centroid(polygon: &[Point2]) -> Result<Point2, PolygonError> {
    let n = polygon.len();
    if n < 3 {
        return Err(PolygonError::TooFewVertices { found: n });
    }
    let a = signed_area(polygon);
    if a.abs() < DEGENERATE_AREA {
        return Err(PolygonError::Degenerate);
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let p = polygon[i];
        let q = polygon[(i + 1) % n];
        let w = p.cross(q);
        cx += (p.x + q.x) * w;
        cy += (p.y + q.y) * w;
    }
    let scale = 1.0 / (6.0 * a);
    Ok(Point2::new(cx * scale, cy * scale))
}

/// Even-odd (crossing number) point-in-polygon test.
///
/// Points exactly on the boundary may land on either side; the division
/// engine never depends on boundary classification.
#[must_use]
pub fn contains(polygon: &[Point2], p: Point2) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Draws a uniform random interior point by rejection sampling in the
/// bounding box.
///
/// The loop is bounded: after `MAX_SAMPLE_ATTEMPTS` misses (pathologically
/// thin polygons) the centroid is returned instead. Replays with the same
/// RNG stream are bit-identical.
///
/// # Errors
///
/// Returns [`PolygonError`] for degenerate polygons.
pub fn sample_interior<R: Rng + ?Sized>(
    polygon: &[Point2],
    rng: &mut R,
) -> Result<Point2, PolygonError> {
    let com = centroid(polygon)?;
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in polygon {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    for _ in 0..MAX_SAMPLE_ATTEMPTS {
        let candidate = Point2::new(
            rng.random_range(min_x..=max_x),
            rng.random_range(min_y..=max_y),
        );
        if contains(polygon, candidate) {
            return Ok(candidate);
        }
    }
    Ok(com)
}

/// Intersection of the infinite line `origin + t * direction` with the
/// segment `a -> b`.
///
/// Returns `(t, s)` where `t` is the line parameter and `s in [0, 1]` the
/// segment parameter, or `None` when the line and segment are (numerically)
/// parallel or the intersection falls outside the segment.
#[must_use]
pub fn line_segment_intersection(
    origin: Point2,
    direction: Point2,
    a: Point2,
    b: Point2,
) -> Option<(f64, f64)> {
    let e = b - a;
    let denom = direction.cross(e);
    if denom.abs() < f64::EPSILON {
        return None;
    }
    let ao = a - origin;
    let t = ao.cross(e) / denom;
    let s = ao.cross(direction) / denom;
    if (0.0..=1.0).contains(&s) {
        Some((t, s))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn unit_square() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn signed_area_orientation() {
        let ccw = unit_square();
        let cw: Vec<_> = ccw.iter().rev().copied().collect();
        assert_relative_eq!(signed_area(&ccw), 1.0);
        assert_relative_eq!(signed_area(&cw), -1.0);
        assert_relative_eq!(area(&cw), 1.0);
    }

    #[test]
    fn centroid_of_square() {
        let c = centroid(&unit_square()).unwrap();
        assert_relative_eq!(c.x, 0.5);
        assert_relative_eq!(c.y, 0.5);
    }

    #[test]
    fn centroid_rejects_degenerate_input() {
        assert_eq!(
            centroid(&[Point2::ORIGIN, Point2::new(1.0, 0.0)]),
            Err(PolygonError::TooFewVertices { found: 2 })
        );
        // Three collinear points enclose no area.
        let line = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
        ];
        assert_eq!(centroid(&line), Err(PolygonError::Degenerate));
    }

    #[test]
    fn containment() {
        let square = unit_square();
        assert!(contains(&square, Point2::new(0.5, 0.5)));
        assert!(contains(&square, Point2::new(0.01, 0.99)));
        assert!(!contains(&square, Point2::new(1.5, 0.5)));
        assert!(!contains(&square, Point2::new(-0.1, 0.5)));
    }

    #[test]
    fn interior_samples_land_inside_and_replay() {
        let square = unit_square();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let p = sample_interior(&square, &mut rng).unwrap();
            assert!(contains(&square, p));
        }

        // Same seed, same stream of points.
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(
                sample_interior(&square, &mut a).unwrap(),
                sample_interior(&square, &mut b).unwrap()
            );
        }
    }

    #[test]
    fn line_crosses_segment() {
        let a = Point2::new(1.0, -1.0);
        let b = Point2::new(1.0, 1.0);
        let hit = line_segment_intersection(Point2::ORIGIN, Point2::new(1.0, 0.0), a, b).unwrap();
        assert_relative_eq!(hit.0, 1.0);
        assert_relative_eq!(hit.1, 0.5);

        // Parallel line misses.
        assert!(
            line_segment_intersection(Point2::ORIGIN, Point2::new(0.0, 1.0), a, b).is_none()
        );

        // Intersection outside the segment misses.
        let c = Point2::new(1.0, 2.0);
        let d = Point2::new(1.0, 3.0);
        assert!(
            line_segment_intersection(Point2::ORIGIN, Point2::new(1.0, 0.0), c, d).is_none()
        );
    }
}
