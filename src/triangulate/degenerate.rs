// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Removal of zero-width spikes left behind when ear clipping stalls

use super::arena::LoopArena;
use super::Triangle;
use crate::geometry::predicates::internal_to_angle;

/// Collapse spikes where the loop revisits a position after one or two
/// steps, emitting the zero-area triangles that close them.
///
/// Returns the new loop start and size.
pub(crate) fn collapse_degeneracies(
    arena: &mut LoopArena,
    mut begin: usize,
    mut remaining: usize,
    orientation: f64,
    triangles: &mut Vec<Triangle>,
) -> (usize, usize) {
    let mut v = begin;

    loop {
        if remaining < 4 {
            break;
        }

        let n1 = arena.next(v);
        let n2 = arena.next(n1);

        let remove = if arena.position(v) == arena.position(n1) {
            true
        } else if arena.position(v) == arena.position(n2) {
            let n3 = arena.next(n2);
            if arena.position(n1) == arena.position(n3) {
                true
            } else {
                // Spikes pointing into the polygon are real slits
                !internal_to_angle(
                    arena.position(arena.prev(v)),
                    arena.position(v),
                    arena.position(n3),
                    arena.position(n1),
                    orientation,
                )
            }
        } else {
            false
        };

        if remove {
            triangles.push(Triangle::new(arena[v].index, arena[n1].index, arena[n2].index));
            if n1 == begin {
                begin = n2;
            }
            arena.unlink(n1);
            remaining -= 1;
        } else {
            v = arena.next(v);
            if v == begin {
                break;
            }
        }
    }

    (begin, remaining)
}
