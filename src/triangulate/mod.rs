// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polygon triangulation
//!
//! Simple loops are triangulated by scored ear clipping. When no ear can be
//! clipped the loop is cleaned of zero-width spikes, and if that is not
//! enough it is split along a diagonal and each half is triangulated on its
//! own. Loops with holes are first bridged into a single loop by
//! [`incorporate_holes`].

mod arena;
mod degenerate;
mod ear;
mod holes;
mod split;

pub use holes::{incorporate_holes, merge_polygons_and_holes, MergedLoop};

use crate::config::KernelConfig;
use crate::error::{DegenerateInputError, TriangulationError};
use crate::geometry::predicates::{loop_orientation, signed_area};
use arena::LoopArena;
use ear::EarClipper;
use log::{debug, warn};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Triangle as three indices into the triangulated point list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(a: usize, b: usize, c: usize) -> Self {
        Self { indices: [a, b, c] }
    }

    /// Signed area in the point list's frame, with the same sign
    /// convention as [`signed_area`]
    pub fn signed_area(&self, points: &[Point2<f64>]) -> f64 {
        signed_area(&self.indices.map(|i| points[i]))
    }
}

/// Ear-clipping triangulator
#[derive(Debug, Clone, Default)]
pub struct Triangulator {
    config: KernelConfig,
}

impl Triangulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: KernelConfig) -> Self {
        Self { config }
    }

    /// Triangulate a simple polygon given in either winding.
    ///
    /// Triangles keep the loop's winding. Fewer than three points give no
    /// triangles.
    pub fn triangulate(&self, points: &[Point2<f64>]) -> Result<Vec<Triangle>, TriangulationError> {
        let n = points.len();
        if n < 3 {
            return Ok(Vec::new());
        }
        if let Some(index) = points.iter().position(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(DegenerateInputError::NonFinite { index }.into());
        }
        if n == 3 {
            return Ok(vec![Triangle::new(0, 1, 2)]);
        }
        if signed_area(points) == 0.0 {
            return Err(DegenerateInputError::ZeroArea {
                what: format!("polygon of {} vertices", n),
            }
            .into());
        }

        let orientation = loop_orientation(points);
        let (mut arena, begin) = LoopArena::from_points(points);
        let mut triangles = Vec::with_capacity(n - 2);
        let mut pending = vec![(begin, n)];

        while let Some((begin, remaining)) = pending.pop() {
            let (begin, remaining) = EarClipper::new(
                &mut arena,
                orientation,
                self.config.ear_quality_threshold,
                self.config.lookahead_weight,
            )
            .clip(begin, remaining, &mut triangles);

            let (begin, remaining) = if remaining > 3 {
                debug!("ear clipping stalled with {} vertices left, collapsing spikes", remaining);
                degenerate::collapse_degeneracies(&mut arena, begin, remaining, orientation, &mut triangles)
            } else {
                (begin, remaining)
            };

            if remaining > 3 {
                let Some((v1, v2)) = split::find_diagonal(&arena, begin, orientation) else {
                    return Err(TriangulationError::NoDiagonal { remaining });
                };
                warn!(
                    "splitting a loop of {} vertices along diagonal {}-{}",
                    remaining, arena[v1].index, arena[v2].index
                );
                let (first, second) = split::split_loop(&mut arena, v1, v2);
                pending.push((first, arena.loop_len(first)));
                pending.push((second, arena.loop_len(second)));
                continue;
            }

            if remaining == 3 {
                let second = arena.next(begin);
                let third = arena.next(second);
                triangles.push(Triangle::new(
                    arena[begin].index,
                    arena[second].index,
                    arena[third].index,
                ));
            }
        }

        Ok(triangles)
    }
}
