// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Diagonal search and loop splitting for loops ear clipping cannot finish

use super::arena::LoopArena;
use crate::geometry::predicates::{internal_to_angle, segments_intersect, winding_number};

/// Shortest valid diagonal from the first vertex (in loop order) that has one.
///
/// A diagonal must leave both endpoints through their interior angles,
/// cross no loop edge away from its endpoints and have its midpoint inside
/// the loop.
pub(crate) fn find_diagonal(arena: &LoopArena, begin: usize, orientation: f64) -> Option<(usize, usize)> {
    let ids = arena.loop_ids(begin);
    let points = arena.loop_points(begin);

    for &v1 in &ids {
        let p1 = arena.position(v1);
        let mut candidates: Vec<(f64, usize)> = ids
            .iter()
            .copied()
            .filter(|&v2| v2 != v1 && v2 != arena.prev(v1) && v2 != arena.next(v1))
            .filter(|&v2| arena.position(v2) != p1)
            .map(|v2| ((arena.position(v2) - p1).norm(), v2))
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for (_, v2) in candidates {
            if is_valid_diagonal(arena, &ids, &points, v1, v2, orientation) {
                return Some((v1, v2));
            }
        }
    }

    None
}

fn is_valid_diagonal(
    arena: &LoopArena,
    ids: &[usize],
    points: &[nalgebra::Point2<f64>],
    v1: usize,
    v2: usize,
    orientation: f64,
) -> bool {
    let a = arena.position(v1);
    let b = arena.position(v2);

    let leaves_inward = |from: usize, towards: &nalgebra::Point2<f64>| {
        internal_to_angle(
            arena.position(arena.prev(from)),
            arena.position(from),
            arena.position(arena.next(from)),
            towards,
            orientation,
        )
    };
    if !leaves_inward(v1, b) || !leaves_inward(v2, a) {
        return false;
    }

    for &e in ids {
        let c = arena.position(e);
        let d = arena.position(arena.next(e));
        let touches = c == a || c == b || d == a || d == b;
        if !touches && segments_intersect(a, b, c, d) {
            return false;
        }
    }

    let midpoint = nalgebra::center(a, b);
    f64::from(winding_number(&midpoint, points)) * orientation == 1.0
}

/// Split the loop along diagonal `v1`-`v2` into two loops, returning their
/// starting nodes. Both endpoints are duplicated so each loop owns its nodes.
pub(crate) fn split_loop(arena: &mut LoopArena, v1: usize, v2: usize) -> (usize, usize) {
    let c1 = arena.duplicate(v1);
    let c2 = arena.duplicate(v2);

    let after_v1 = arena.next(v1);
    let before_v2 = arena.prev(v2);

    arena[c1].next = after_v1;
    arena[after_v1].prev = c1;
    arena[c2].prev = before_v2;
    arena[before_v2].next = c2;
    arena[c1].prev = c2;
    arena[c2].next = c1;

    arena[v1].next = v2;
    arena[v2].prev = v1;

    (v1, c1)
}
