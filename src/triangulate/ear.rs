// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scored ear clipping
//!
//! Ears are taken best-first from a max-heap. After each clip the clipper
//! keeps working locally from the better neighbour while that neighbour is
//! a good enough ear, and only goes back to the heap once it is not.

use super::arena::LoopArena;
use super::Triangle;
use crate::geometry::predicates::{orient2d, point_in_triangle};
use nalgebra::Point2;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry; stale once the node's generation moves on
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f64,
    node: usize,
    generation: u32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.node.cmp(&self.node))
            .then_with(|| self.generation.cmp(&other.generation))
    }
}

/// Quality of triangle (p, v, n) as an ear at `v`.
///
/// Ranges from 0 for slivers up to 1 for an equilateral triangle; reflex
/// corners score slightly below zero.
pub(crate) fn ear_quality(p: &Point2<f64>, v: &Point2<f64>, n: &Point2<f64>, orientation: f64) -> f64 {
    if orient2d(p, v, n) * orientation <= 0.0 {
        return -1e-5;
    }

    let a = (n - v).norm();
    let b = (p - n).norm();
    let c = (v - p).norm();
    if a < 1e-10 || b < 1e-10 || c < 1e-10 {
        return 0.0;
    }

    ((a + b) / c).min((a + c) / b).min((b + c) / a).max(1.0) - 1.0
}

pub(crate) struct EarClipper<'a> {
    arena: &'a mut LoopArena,
    /// Reflex vertices of the loop; may hold stale entries between clips
    reflex: Vec<usize>,
    orientation: f64,
    quality_threshold: f64,
    lookahead_weight: f64,
}

impl<'a> EarClipper<'a> {
    pub fn new(
        arena: &'a mut LoopArena,
        orientation: f64,
        quality_threshold: f64,
        lookahead_weight: f64,
    ) -> Self {
        Self {
            arena,
            reflex: Vec::new(),
            orientation,
            quality_threshold,
            lookahead_weight,
        }
    }

    fn is_convex(&self, id: usize) -> bool {
        let arena = &*self.arena;
        orient2d(
            arena.position(arena.prev(id)),
            arena.position(id),
            arena.position(arena.next(id)),
        ) * self.orientation
            > 0.0
    }

    /// Refresh convexity and score of `id` from its current neighbours
    fn recompute(&mut self, id: usize) {
        let arena = &*self.arena;
        let v = id;
        let p = arena.prev(v);
        let n = arena.next(v);
        let sgn = self.orientation;

        let own = ear_quality(arena.position(p), arena.position(v), arena.position(n), sgn);
        let ahead = ear_quality(
            arena.position(p),
            arena.position(n),
            arena.position(arena.next(n)),
            sgn,
        );
        let behind = ear_quality(
            arena.position(arena.prev(p)),
            arena.position(p),
            arena.position(n),
            sgn,
        );

        let score = own + ahead.max(behind) * self.lookahead_weight;
        let convex = self.is_convex(v);

        let node = &mut self.arena[v];
        let was_convex = node.convex;
        node.score = score;
        node.convex = convex;
        node.failed = false;
        node.generation = node.generation.wrapping_add(1);
        if was_convex && !convex {
            self.reflex.push(v);
        }
    }

    /// Score every vertex of the loop at `begin` and collect its reflex
    /// vertices, returning the loop's node ids
    fn prepare(&mut self, begin: usize) -> Vec<usize> {
        let ids = self.arena.loop_ids(begin);
        for &id in &ids {
            self.recompute(id);
        }
        self.reflex = ids.iter().copied().filter(|&id| !self.arena[id].convex).collect();
        ids
    }

    fn is_candidate(&self, id: usize) -> bool {
        let node = &self.arena[id];
        node.live && node.convex && !node.failed
    }

    fn candidate(&self, id: usize) -> Candidate {
        let node = &self.arena[id];
        Candidate {
            score: node.score,
            node: id,
            generation: node.generation,
        }
    }

    fn update(&mut self, id: usize, heap: &mut BinaryHeap<Candidate>) {
        self.recompute(id);
        if self.is_candidate(id) {
            heap.push(self.candidate(id));
        }
    }

    /// Whether no reflex vertex of the loop lies inside triangle (prev, v, next)
    pub fn is_clipable(&self, v: usize) -> bool {
        let arena = &*self.arena;
        let p = arena.prev(v);
        let n = arena.next(v);
        let (pp, pv, pn) = (arena.position(p), arena.position(v), arena.position(n));

        for &t in &self.reflex {
            let node = &arena[t];
            if !node.live || node.convex || t == p || t == v || t == n {
                continue;
            }
            let pt = arena.position(t);
            if pt != pp && pt != pn {
                if pt == pv {
                    let after = arena.position(arena.next(t));
                    let before = arena.position(arena.prev(t));
                    if after == pp && before == pn {
                        return false;
                    }
                    if after != pp && before != pn && point_in_triangle(pp, pv, pn, pt, self.orientation) {
                        return false;
                    }
                } else if point_in_triangle(pp, pv, pn, pt, self.orientation) {
                    return false;
                }
            }
        }

        true
    }

    /// Clip ears from the loop at `begin` until three vertices remain or no
    /// ear can be found, returning the new loop start and size
    pub fn clip(
        mut self,
        mut begin: usize,
        mut remaining: usize,
        triangles: &mut Vec<Triangle>,
    ) -> (usize, usize) {
        let ids = self.prepare(begin);
        let mut heap = BinaryHeap::with_capacity(ids.len());
        for &id in &ids {
            if self.is_candidate(id) {
                heap.push(self.candidate(id));
            }
        }

        while remaining > 3 {
            let Some(top) = heap.pop() else {
                break;
            };
            if !self.is_candidate(top.node) || self.arena[top.node].generation != top.generation {
                continue;
            }
            if !self.is_clipable(top.node) {
                self.arena[top.node].failed = true;
                continue;
            }

            let mut v = top.node;
            loop {
                let p = self.arena.prev(v);
                let n = self.arena.next(v);
                triangles.push(Triangle::new(
                    self.arena[p].index,
                    self.arena[v].index,
                    self.arena[n].index,
                ));

                if begin == v {
                    begin = n;
                }
                self.arena.unlink(v);
                remaining -= 1;
                if remaining == 3 {
                    break;
                }

                self.update(p, &mut heap);
                self.update(n, &mut heap);
                let arena = &*self.arena;
                self.reflex.retain(|&t| arena[t].live && !arena[t].convex);

                let (first, second) = if self.arena[p].score > self.arena[n].score {
                    (p, n)
                } else {
                    (n, p)
                };
                let threshold = self.quality_threshold;
                let greedy = [first, second].into_iter().find(|&u| {
                    self.arena[u].score > threshold && self.is_candidate(u) && self.is_clipable(u)
                });

                match greedy {
                    Some(u) => v = u,
                    None => break,
                }
            }
        }

        (begin, remaining)
    }
}
