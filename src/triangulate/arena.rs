// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Index-based storage for circular doubly linked vertex loops

use nalgebra::Point2;
use std::ops::{Index, IndexMut};

/// One vertex of a loop being clipped
#[derive(Debug, Clone)]
pub(crate) struct VertexInfo {
    pub position: Point2<f64>,
    /// Index into the caller's point list
    pub index: usize,
    pub prev: usize,
    pub next: usize,
    pub convex: bool,
    pub score: f64,
    /// Failed the ear test; cleared when the score is recomputed
    pub failed: bool,
    /// Bumped on every recompute so stale heap entries can be skipped
    pub generation: u32,
    pub live: bool,
}

impl VertexInfo {
    fn new(position: Point2<f64>, index: usize) -> Self {
        Self {
            position,
            index,
            prev: 0,
            next: 0,
            convex: false,
            score: 0.0,
            failed: false,
            generation: 0,
            live: true,
        }
    }
}

/// Slots for loop vertices; removed vertices go to a free list
#[derive(Debug, Default)]
pub(crate) struct LoopArena {
    nodes: Vec<VertexInfo>,
    free: Vec<usize>,
}

impl LoopArena {
    /// Link `points` into one loop, returning its first node
    pub fn from_points(points: &[Point2<f64>]) -> (Self, usize) {
        let n = points.len();
        let mut nodes: Vec<VertexInfo> = points
            .iter()
            .enumerate()
            .map(|(i, &p)| VertexInfo::new(p, i))
            .collect();
        for (i, node) in nodes.iter_mut().enumerate() {
            node.prev = (i + n - 1) % n;
            node.next = (i + 1) % n;
        }

        (
            Self {
                nodes,
                free: Vec::new(),
            },
            0,
        )
    }

    fn alloc(&mut self, info: VertexInfo) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = info;
                slot
            }
            None => {
                self.nodes.push(info);
                self.nodes.len() - 1
            }
        }
    }

    /// Copy of node `id` in a fresh slot, not yet linked anywhere
    pub fn duplicate(&mut self, id: usize) -> usize {
        let mut copy = self.nodes[id].clone();
        copy.live = true;
        copy.failed = false;
        self.alloc(copy)
    }

    /// Splice `id` out of its loop and release its slot
    pub fn unlink(&mut self, id: usize) {
        let VertexInfo { prev, next, .. } = self.nodes[id];
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.nodes[id].live = false;
        self.free.push(id);
    }

    pub fn next(&self, id: usize) -> usize {
        self.nodes[id].next
    }

    pub fn prev(&self, id: usize) -> usize {
        self.nodes[id].prev
    }

    pub fn position(&self, id: usize) -> &Point2<f64> {
        &self.nodes[id].position
    }

    /// Nodes of the loop through `begin`, in order
    pub fn loop_ids(&self, begin: usize) -> Vec<usize> {
        let mut ids = vec![begin];
        let mut current = self.next(begin);
        while current != begin {
            ids.push(current);
            current = self.next(current);
        }
        ids
    }

    pub fn loop_len(&self, begin: usize) -> usize {
        self.loop_ids(begin).len()
    }

    pub fn loop_points(&self, begin: usize) -> Vec<Point2<f64>> {
        self.loop_ids(begin)
            .into_iter()
            .map(|id| self.nodes[id].position)
            .collect()
    }
}

impl Index<usize> for LoopArena {
    type Output = VertexInfo;

    fn index(&self, id: usize) -> &VertexInfo {
        &self.nodes[id]
    }
}

impl IndexMut<usize> for LoopArena {
    fn index_mut(&mut self, id: usize) -> &mut VertexInfo {
        &mut self.nodes[id]
    }
}
