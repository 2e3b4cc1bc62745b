// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bridging hole loops into an outer loop
//!
//! Each hole is joined to the outer loop by a zero-width corridor: the hole's
//! connection vertex and the outer attachment vertex both appear twice in
//! the merged loop.

use crate::error::{BridgeError, DegenerateInputError};
use crate::geometry::predicates::{internal_to_angle, loop_orientation, segments_intersect, signed_area};
use log::trace;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// A single simple loop of `(loop, vertex)` references into the input loops
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedLoop {
    pub vertices: Vec<(usize, usize)>,
}

impl MergedLoop {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Resolve the references to coordinates
    pub fn points(&self, loops: &[Vec<Point2<f64>>]) -> Vec<Point2<f64>> {
        self.vertices
            .iter()
            .map(|&(l, v)| loops[l][v])
            .collect()
    }
}

/// Attachment candidate ordered by distance to the hole
#[derive(Debug, Clone, Copy)]
struct Attachment {
    distance: f64,
    position: usize,
}

impl PartialEq for Attachment {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Attachment {}

impl PartialOrd for Attachment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Attachment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.position.cmp(&other.position))
    }
}

/// Sort key of a vertex along the sweep axis, ties broken by the other axis
fn sweep_key(p: &Point2<f64>, axis: usize) -> (f64, f64) {
    (p[axis], p[1 - axis])
}

fn cmp_key(a: (f64, f64), b: (f64, f64)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1))
}

/// Splice the `holes` loops into the `outer` loop.
///
/// Holes are bridged in sweep order, each to the nearest outer vertex at or
/// before its minimum that sees it without crossing the current loop.
pub fn incorporate_holes(
    loops: &[Vec<Point2<f64>>],
    outer: usize,
    holes: &[usize],
) -> Result<MergedLoop, BridgeError> {
    if let Some(&index) = std::iter::once(&outer)
        .chain(holes)
        .find(|&&i| i >= loops.len())
    {
        return Err(BridgeError::InvalidLoopIndex { index });
    }

    let mut current: Vec<(usize, usize)> = (0..loops[outer].len()).map(|i| (outer, i)).collect();
    if holes.is_empty() {
        return Ok(MergedLoop { vertices: current });
    }

    let orientation = loop_orientation(&loops[outer]);
    let at = |r: (usize, usize)| &loops[r.0][r.1];

    let axis = {
        let (mut min, mut max) = (Point2::new(f64::INFINITY, f64::INFINITY), Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY));
        for p in holes.iter().flat_map(|&h| loops[h].iter()) {
            min = min.inf(p);
            max = max.sup(p);
        }
        if max.x - min.x >= max.y - min.y {
            0
        } else {
            1
        }
    };

    let mut ordered: Vec<(usize, usize)> = holes
        .iter()
        .filter(|&&h| !loops[h].is_empty())
        .map(|&h| {
            let lowest = (0..loops[h].len())
                .min_by(|&a, &b| cmp_key(sweep_key(&loops[h][a], axis), sweep_key(&loops[h][b], axis)))
                .unwrap_or(0);
            (h, lowest)
        })
        .collect();
    ordered.sort_by(|&a, &b| cmp_key(sweep_key(at(a), axis), sweep_key(at(b), axis)));

    for (hole, lowest) in ordered {
        let target = at((hole, lowest));

        let mut heap: BinaryHeap<Reverse<Attachment>> = current
            .iter()
            .enumerate()
            .filter(|&(_, &r)| at(r)[axis] <= target[axis])
            .map(|(position, &r)| {
                Reverse(Attachment {
                    distance: (at(r) - target).norm(),
                    position,
                })
            })
            .collect();

        let len = current.len();
        let mut attachment = None;
        while let Some(Reverse(candidate)) = heap.pop() {
            let j = candidate.position;
            let c = at(current[j]);
            let prev = at(current[(j + len - 1) % len]);
            let next = at(current[(j + 1) % len]);

            if !internal_to_angle(prev, c, next, target, orientation) {
                trace!("hole {} rejects vertex {}: outside its angle", hole, j);
                continue;
            }
            if c != target && bridge_crosses(&current, at, c, target) {
                trace!("hole {} rejects vertex {}: bridge crosses the loop", hole, j);
                continue;
            }
            attachment = Some(j);
            break;
        }

        let Some(j) = attachment else {
            return Err(BridgeError::NoAttachment { hole });
        };

        let n = loops[hole].len();
        let mut corridor: Vec<(usize, usize)> = (0..n).map(|k| (hole, (lowest + k) % n)).collect();
        corridor.push((hole, lowest));
        corridor.push(current[j]);
        current.splice(j + 1..j + 1, corridor);
    }

    Ok(MergedLoop { vertices: current })
}

/// Whether segment `c`-`target` crosses an edge of the loop not ending at `c`
fn bridge_crosses<'a>(
    current: &[(usize, usize)],
    at: impl Fn((usize, usize)) -> &'a Point2<f64>,
    c: &Point2<f64>,
    target: &Point2<f64>,
) -> bool {
    let len = current.len();
    (0..len).any(|k| {
        let a = at(current[k]);
        let b = at(current[(k + 1) % len]);
        a != c && b != c && segments_intersect(target, c, a, b)
    })
}

/// Sort loops into one outer loop and its holes and bridge them.
///
/// Loops with negative signed area are outer loops, positive ones holes.
/// Only a single outer loop per batch is supported.
pub fn merge_polygons_and_holes(loops: &[Vec<Point2<f64>>]) -> Result<Vec<MergedLoop>, BridgeError> {
    if loops.is_empty() {
        return Ok(Vec::new());
    }

    let mut outers = Vec::new();
    let mut holes = Vec::new();
    for (i, points) in loops.iter().enumerate() {
        let area = signed_area(points);
        if area < 0.0 {
            outers.push(i);
        } else if area > 0.0 {
            holes.push(i);
        } else {
            return Err(DegenerateInputError::ZeroArea {
                what: format!("loop {}", i),
            }
            .into());
        }
    }

    match outers.as_slice() {
        [outer] => Ok(vec![incorporate_holes(loops, *outer, &holes)?]),
        [] => Err(BridgeError::NoOuterLoop { count: loops.len() }),
        _ => Err(BridgeError::MultipleOuterLoops {
            count: outers.len(),
        }),
    }
}
