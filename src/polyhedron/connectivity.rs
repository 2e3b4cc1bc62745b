// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Builds adjacency and manifold partitioning from a vertex/face soup

use super::{Edge, Face, Polyhedron, Vertex};
use crate::config::KernelConfig;
use crate::error::{DegenerateInputError, TopologyError};
use crate::geometry::{BoundingBox, Plane, SpatialIndex};
use ahash::AHashMap;
use log::debug;
use nalgebra::Point3;
use std::collections::VecDeque;

/// Turns vertex positions and face index loops into a [`Polyhedron`]
pub struct ConnectivityBuilder<'a> {
    positions: &'a [Point3<f64>],
    faces: &'a [Vec<usize>],
    config: KernelConfig,
}

impl<'a> ConnectivityBuilder<'a> {
    pub fn new(positions: &'a [Point3<f64>], faces: &'a [Vec<usize>]) -> Self {
        Self {
            positions,
            faces,
            config: KernelConfig::default(),
        }
    }

    pub fn with_config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Polyhedron, TopologyError> {
        self.validate()?;

        let (edges, edge_lookup) = self.collect_edges();
        let vertex_to_edge = self.vertex_edges(&edges);
        let vertex_to_face = self.vertex_faces();
        let face_edges = self.resolve_corners(&vertex_to_edge, &edge_lookup)?;
        let edge_to_face = self.link_edge_faces(&edges, &face_edges)?;

        let face_manifold = Self::partition_manifolds(self.faces.len(), &face_edges, &edge_to_face);
        let manifold_count = face_manifold.iter().map(|&m| m + 1).max().unwrap_or(0);

        let mut manifold_is_closed = vec![true; manifold_count];
        for (face, edges) in face_edges.iter().enumerate() {
            let open = edges
                .iter()
                .any(|&e| edge_to_face[e].iter().flatten().count() != 2);
            if open {
                manifold_is_closed[face_manifold[face]] = false;
            }
        }

        let mut faces = Vec::with_capacity(self.faces.len());
        for (i, (loop_vertices, edges)) in self.faces.iter().zip(face_edges).enumerate() {
            let points: Vec<Point3<f64>> = loop_vertices.iter().map(|&v| self.positions[v]).collect();
            let plane = Plane::from_loop(&points)
                .ok_or(DegenerateInputError::ZeroLengthNormal { face: i })?;
            faces.push(Face::new(
                loop_vertices.clone(),
                edges,
                plane,
                self.positions,
                face_manifold[i],
            ));
        }

        let mut poly = Polyhedron {
            vertices: self.positions.iter().map(|&p| Vertex::new(p)).collect(),
            edges,
            faces,
            vertex_to_edge,
            vertex_to_face,
            edge_to_face,
            manifold_is_closed,
            manifold_is_negative: vec![false; manifold_count],
            aabb: BoundingBox::empty(),
            index: SpatialIndex::build(&[], &[], self.config.epsilon),
            config: self.config,
        };
        poly.rebuild_bounds();

        debug!(
            "built polyhedron: {} vertices, {} edges, {} faces, {} manifolds ({} closed)",
            poly.vertices.len(),
            poly.edges.len(),
            poly.faces.len(),
            manifold_count,
            poly.manifold_is_closed.iter().filter(|&&c| c).count()
        );

        Ok(poly)
    }

    fn validate(&self) -> Result<(), TopologyError> {
        if let Some(index) = self
            .positions
            .iter()
            .position(|p| !p.iter().all(|c| c.is_finite()))
        {
            return Err(DegenerateInputError::NonFinite { index }.into());
        }

        let count = self.positions.len();
        for (face, vertices) in self.faces.iter().enumerate() {
            if vertices.len() < 3 {
                return Err(TopologyError::DegenerateFace {
                    face,
                    corners: vertices.len(),
                });
            }
            if let Some(&vertex) = vertices.iter().find(|&&v| v >= count) {
                return Err(TopologyError::VertexOutOfRange {
                    face,
                    vertex,
                    count,
                });
            }
            for (i, &vertex) in vertices.iter().enumerate() {
                if vertex == vertices[(i + 1) % vertices.len()] {
                    return Err(TopologyError::DanglingEdge { face, vertex });
                }
            }
        }

        Ok(())
    }

    /// Deduplicate edges by unordered vertex pair
    fn collect_edges(&self) -> (Vec<Edge>, AHashMap<(usize, usize), usize>) {
        let mut edges = Vec::new();
        let mut lookup: AHashMap<(usize, usize), usize> = AHashMap::new();

        for vertices in self.faces {
            for (i, &a) in vertices.iter().enumerate() {
                let b = vertices[(i + 1) % vertices.len()];
                let edge = Edge::new(a, b);
                lookup.entry(edge.key()).or_insert_with(|| {
                    edges.push(edge);
                    edges.len() - 1
                });
            }
        }

        (edges, lookup)
    }

    fn vertex_edges(&self, edges: &[Edge]) -> Vec<Vec<usize>> {
        let mut vertex_to_edge = vec![Vec::new(); self.positions.len()];
        for (id, edge) in edges.iter().enumerate() {
            vertex_to_edge[edge.v1].push(id);
            vertex_to_edge[edge.v2].push(id);
        }
        for list in vertex_to_edge.iter_mut() {
            list.sort_unstable();
        }
        vertex_to_edge
    }

    fn vertex_faces(&self) -> Vec<Vec<usize>> {
        let mut vertex_to_face = vec![Vec::new(); self.positions.len()];
        for (face, vertices) in self.faces.iter().enumerate() {
            for &v in vertices {
                vertex_to_face[v].push(face);
            }
        }
        for list in vertex_to_face.iter_mut() {
            list.sort_unstable();
            list.dedup();
        }
        vertex_to_face
    }

    /// Resolve each corner to the single edge shared by its two endpoints
    fn resolve_corners(
        &self,
        vertex_to_edge: &[Vec<usize>],
        edge_lookup: &AHashMap<(usize, usize), usize>,
    ) -> Result<Vec<Vec<usize>>, TopologyError> {
        let mut face_edges = Vec::with_capacity(self.faces.len());

        for (face, vertices) in self.faces.iter().enumerate() {
            let mut edges = Vec::with_capacity(vertices.len());
            for (corner, &a) in vertices.iter().enumerate() {
                let b = vertices[(corner + 1) % vertices.len()];
                let key = (a.min(b), a.max(b));

                let shared = sorted_intersection(&vertex_to_edge[a], &vertex_to_edge[b]);
                let resolved = match shared.as_slice() {
                    [single] if edge_lookup.get(&key) == Some(single) => *single,
                    _ => {
                        return Err(TopologyError::AmbiguousCorner {
                            face,
                            corner,
                            matches: shared.len(),
                        })
                    }
                };
                edges.push(resolved);
            }
            face_edges.push(edges);
        }

        Ok(face_edges)
    }

    /// Record incident faces per edge, forward traversals in even slots and
    /// backward traversals in odd slots
    fn link_edge_faces(
        &self,
        edges: &[Edge],
        face_edges: &[Vec<usize>],
    ) -> Result<Vec<Vec<Option<usize>>>, TopologyError> {
        let mut edge_to_face: Vec<Vec<Option<usize>>> = vec![Vec::new(); edges.len()];

        for (face, vertices) in self.faces.iter().enumerate() {
            for (corner, &e) in face_edges[face].iter().enumerate() {
                let from = vertices[corner];
                let to = vertices[(corner + 1) % vertices.len()];
                let parity = if edges[e].is_forward(from, to) { 0 } else { 1 };

                let slots = &mut edge_to_face[e];
                let free = (0..slots.len()).find(|&k| k % 2 == parity && slots[k].is_none());
                match free {
                    Some(k) => slots[k] = Some(face),
                    None => {
                        slots.extend([None, None]);
                        let k = slots.len() - 2 + parity;
                        slots[k] = Some(face);
                    }
                }
            }
        }

        for (e, slots) in edge_to_face.iter().enumerate() {
            let faces = slots.iter().flatten().count();
            if faces > 2 {
                return Err(TopologyError::NonManifoldEdge {
                    v1: edges[e].v1,
                    v2: edges[e].v2,
                    faces,
                });
            }
        }

        Ok(edge_to_face)
    }

    /// Label edge-connected face components in order of their lowest face
    fn partition_manifolds(
        face_count: usize,
        face_edges: &[Vec<usize>],
        edge_to_face: &[Vec<Option<usize>>],
    ) -> Vec<usize> {
        let mut manifold = vec![usize::MAX; face_count];
        let mut next_id = 0;

        for seed in 0..face_count {
            if manifold[seed] != usize::MAX {
                continue;
            }

            manifold[seed] = next_id;
            let mut queue = VecDeque::from([seed]);
            while let Some(face) = queue.pop_front() {
                for &e in &face_edges[face] {
                    for &neighbour in edge_to_face[e].iter().flatten() {
                        if manifold[neighbour] == usize::MAX {
                            manifold[neighbour] = next_id;
                            queue.push_back(neighbour);
                        }
                    }
                }
            }
            next_id += 1;
        }

        manifold
    }
}

fn sorted_intersection(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut result = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                result.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    result
}
