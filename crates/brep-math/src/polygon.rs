//! 2D polygon predicates used by loop assembly, seam repair, and triangulation.

use crate::Point2;

/// Twice the signed area of the triangle `(a, b, c)`.
///
/// Positive for counter-clockwise orientation.
pub fn signed_area2(a: Point2, b: Point2, c: Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Signed area of a closed polygon (positive if counter-clockwise).
pub fn polygon_signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Even-odd point-in-polygon test against a closed polygon.
///
/// Points exactly on an edge may classify either way; callers needing an
/// on-boundary distinction should test [`point_segment_distance`] first.
pub fn point_in_polygon(p: Point2, polygon: &[Point2]) -> bool {
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
            let x_cross = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Distance from point `p` to the segment `[a, b]`.
pub fn point_segment_distance(p: Point2, a: Point2, b: Point2) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-30 {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + t * ab)).length()
}

/// Whether segments `[a1, a2]` and `[b1, b2]` properly intersect (crossing at a
/// single interior point). Shared endpoints do not count.
pub fn segments_properly_intersect(a1: Point2, a2: Point2, b1: Point2, b2: Point2) -> bool {
    let d1 = signed_area2(b1, b2, a1);
    let d2 = signed_area2(b1, b2, a2);
    let d3 = signed_area2(a1, a2, b1);
    let d4 = signed_area2(a1, a2, b2);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// Whether a closed polygon is simple (no two non-adjacent edges cross).
///
/// O(n^2); used on per-face loop polygons, which stay small.
pub fn polygon_is_simple(points: &[Point2]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let a1 = points[i];
        let a2 = points[(i + 1) % n];
        for j in i + 1..n {
            // Skip adjacent edges (they share an endpoint)
            if j == i || (j + 1) % n == i || (i + 1) % n == j {
                continue;
            }
            let b1 = points[j];
            let b2 = points[(j + 1) % n];
            if segments_properly_intersect(a1, a2, b1, b2) {
                return false;
            }
        }
    }
    true
}
