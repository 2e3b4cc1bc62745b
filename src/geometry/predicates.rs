// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Planar geometric predicates used by triangulation, hole bridging and
//! face containment tests

use nalgebra::Point2;

/// Twice the signed area of triangle (a, b, c); positive when the turn
/// a → b → c is to the left
pub fn orient2d(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Signed area of a closed loop.
///
/// Outer loops are negative and holes positive: the square
/// (0,0), (4,0), (4,4), (0,4) has area -16.
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut sum = 0.0;
    for i in 0..n {
        let p = &points[i];
        let q = &points[(i + 1) % n];
        sum += (p.y + q.y) * (q.x - p.x);
    }
    sum / 2.0
}

/// +1.0 when the loop turns left (negative [`signed_area`]), -1.0 otherwise.
///
/// Multiplying [`orient2d`] by this sign makes "convex" mean positive for
/// either winding.
pub fn loop_orientation(points: &[Point2<f64>]) -> f64 {
    if signed_area(points) <= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Inclusive point-in-triangle test for a triangle wound according to `orientation`
pub fn point_in_triangle(
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
    p: &Point2<f64>,
    orientation: f64,
) -> bool {
    orient2d(a, b, p) * orientation >= 0.0
        && orient2d(b, c, p) * orientation >= 0.0
        && orient2d(c, a, p) * orientation >= 0.0
}

fn within_span(a: &Point2<f64>, b: &Point2<f64>, p: &Point2<f64>) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Whether segments a-b and c-d cross or touch
pub fn segments_intersect(
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
    d: &Point2<f64>,
) -> bool {
    let d1 = orient2d(a, b, c);
    let d2 = orient2d(a, b, d);
    let d3 = orient2d(c, d, a);
    let d4 = orient2d(c, d, b);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && within_span(a, b, c))
        || (d2 == 0.0 && within_span(a, b, d))
        || (d3 == 0.0 && within_span(c, d, a))
        || (d4 == 0.0 && within_span(c, d, b))
}

/// Winding number of `loop_points` around `p` (counter-clockwise positive)
pub fn winding_number(p: &Point2<f64>, loop_points: &[Point2<f64>]) -> i32 {
    let n = loop_points.len();
    let mut winding = 0;
    for i in 0..n {
        let a = &loop_points[i];
        let b = &loop_points[(i + 1) % n];
        if a.y <= p.y {
            if b.y > p.y && orient2d(a, b, p) > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && orient2d(a, b, p) < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// Whether `p` lies strictly inside the interior angle at `vertex` of a loop
/// with the given orientation, where `prev` and `next` are its neighbours
pub fn internal_to_angle(
    prev: &Point2<f64>,
    vertex: &Point2<f64>,
    next: &Point2<f64>,
    p: &Point2<f64>,
    orientation: f64,
) -> bool {
    let (prev, next) = if orientation >= 0.0 {
        (prev, next)
    } else {
        (next, prev)
    };

    let convex = orient2d(prev, vertex, next) >= 0.0;
    let d1 = orient2d(prev, vertex, p);
    let d2 = orient2d(vertex, next, p);

    if convex {
        d1 > 0.0 && d2 > 0.0
    } else {
        d1 > 0.0 || d2 > 0.0
    }
}

/// Distance from `p` to segment a-b
pub fn distance_to_segment(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let length_sq = ab.norm_squared();
    if length_sq == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / length_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Position of a point relative to a polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    Inside,
    Boundary,
    Outside,
}

/// Classify `p` against a polygon loop, treating points within `tolerance`
/// of an edge as on the boundary
pub fn classify_in_polygon(p: &Point2<f64>, loop_points: &[Point2<f64>], tolerance: f64) -> Containment {
    let n = loop_points.len();
    for i in 0..n {
        if distance_to_segment(p, &loop_points[i], &loop_points[(i + 1) % n]) <= tolerance {
            return Containment::Boundary;
        }
    }

    if winding_number(p, loop_points) != 0 {
        Containment::Inside
    } else {
        Containment::Outside
    }
}

/// Pick a point strictly inside a simple polygon.
///
/// Takes the first convex corner; if no vertex intrudes into the triangle it
/// forms with its neighbours, that triangle's centroid is inside the polygon,
/// otherwise the midpoint between the corner and the nearest intruding vertex is.
pub fn interior_point(loop_points: &[Point2<f64>]) -> Option<Point2<f64>> {
    let n = loop_points.len();
    if n < 3 {
        return None;
    }
    let orientation = loop_orientation(loop_points);

    for i in 0..n {
        let prev = &loop_points[(i + n - 1) % n];
        let vertex = &loop_points[i];
        let next = &loop_points[(i + 1) % n];

        if orient2d(prev, vertex, next) * orientation <= 0.0 {
            continue;
        }

        let intruder = loop_points
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i && *j != (i + n - 1) % n && *j != (i + 1) % n)
            .filter(|(_, q)| {
                *q != prev
                    && *q != next
                    && *q != vertex
                    && point_in_triangle(prev, vertex, next, q, orientation)
            })
            .map(|(_, q)| q)
            .min_by(|a, b| (*a - vertex).norm().total_cmp(&(*b - vertex).norm()));

        let candidate = match intruder {
            None => Point2::from((prev.coords + vertex.coords + next.coords) / 3.0),
            Some(q) => nalgebra::center(vertex, q),
        };

        if winding_number(&candidate, loop_points) != 0 {
            return Some(candidate);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2<f64>> {
        coords.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    #[test]
    fn test_signed_area_convention() {
        let outer = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let hole = pts(&[(1.0, 1.0), (1.0, 2.0), (2.0, 2.0), (2.0, 1.0)]);
        assert_eq!(signed_area(&outer), -16.0);
        assert_eq!(signed_area(&hole), 1.0);
        assert_eq!(loop_orientation(&outer), 1.0);
        assert_eq!(loop_orientation(&hole), -1.0);
    }

    #[test]
    fn test_segments_intersect() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 2.0);
        assert!(segments_intersect(&a, &b, &Point2::new(0.0, 2.0), &Point2::new(2.0, 0.0)));
        assert!(!segments_intersect(&a, &b, &Point2::new(3.0, 0.0), &Point2::new(3.0, 5.0)));
        // Touching at an endpoint counts
        assert!(segments_intersect(&a, &b, &Point2::new(1.0, 1.0), &Point2::new(5.0, 0.0)));
    }

    #[test]
    fn test_winding_number_and_containment() {
        let square = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        assert_eq!(winding_number(&Point2::new(2.0, 2.0), &square), 1);
        assert_eq!(winding_number(&Point2::new(5.0, 2.0), &square), 0);

        let reversed: Vec<_> = square.iter().rev().cloned().collect();
        assert_eq!(winding_number(&Point2::new(2.0, 2.0), &reversed), -1);

        assert_eq!(
            classify_in_polygon(&Point2::new(4.0, 1.0), &square, 1e-9),
            Containment::Boundary
        );
        assert_eq!(
            classify_in_polygon(&Point2::new(1.0, 1.0), &square, 1e-9),
            Containment::Inside
        );
    }

    #[test]
    fn test_internal_to_angle() {
        // Convex corner at the origin of a left-turning square
        let prev = Point2::new(0.0, 4.0);
        let vertex = Point2::new(0.0, 0.0);
        let next = Point2::new(4.0, 0.0);
        assert!(internal_to_angle(&prev, &vertex, &next, &Point2::new(1.0, 1.0), 1.0));
        assert!(!internal_to_angle(&prev, &vertex, &next, &Point2::new(-1.0, 1.0), 1.0));

        // The same corner walked the other way round is reflex
        assert!(!internal_to_angle(&next, &vertex, &prev, &Point2::new(1.0, 1.0), 1.0));
        assert!(internal_to_angle(&next, &vertex, &prev, &Point2::new(-1.0, 1.0), 1.0));

        // Flipping the orientation sign restores the convex reading
        assert!(internal_to_angle(&next, &vertex, &prev, &Point2::new(1.0, 1.0), -1.0));
        assert!(!internal_to_angle(&next, &vertex, &prev, &Point2::new(-1.0, 1.0), -1.0));
    }

    #[test]
    fn test_interior_point_of_concave_polygon() {
        // U shape: the centroid of the first ear would land in the notch
        let u = pts(&[
            (0.0, 0.0),
            (3.0, 0.0),
            (3.0, 3.0),
            (2.0, 3.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 3.0),
            (0.0, 3.0),
        ]);
        let p = interior_point(&u).unwrap();
        assert_eq!(classify_in_polygon(&p, &u, 1e-9), Containment::Inside);
    }
}
